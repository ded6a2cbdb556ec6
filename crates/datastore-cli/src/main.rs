//! Command-line front end for the measurement data store.
//!
//! # Usage
//!
//! Publish a scalar and read it back:
//! ```bash
//! datastore publish-scalar Voltage 3.3 --step-id <step> --units V
//! datastore read --service-location localhost:50051 --data-source <source>
//! ```
//!
//! Settings come from `<config dir>/datastore/config.toml` (or `--config`),
//! then `DATASTORE_*` environment variables, then `--host`/`--port`.

#[cfg(not(test))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use datastore_client::{ClientConfig, DataStoreClient, MeasurementOptions, MetadataStoreClient};
use datastore_core::records::Moniker;
use datastore_core::{Scalar, ScalarValue};
use logging::{OutputFormat, TracingConfig};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "datastore")]
#[command(about = "Publish, read and query measurement data", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults to the per-user config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured host
    #[arg(long, global = true)]
    host: Option<String>,

    /// Override the configured port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Compact)]
    log_format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Publish one scalar measurement
    PublishScalar {
        /// Measurement name
        name: String,

        /// Value; parsed as bool, then integer, then float, else kept as text
        value: String,

        /// Step the measurement belongs to
        #[arg(long)]
        step_id: String,

        /// Unit description
        #[arg(long, default_value = "")]
        units: String,

        /// Free-form notes stored with the measurement
        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Read the value behind a moniker
    Read {
        /// Service holding the data (host:port or URL)
        #[arg(long)]
        service_location: String,

        /// Data source identifier
        #[arg(long)]
        data_source: String,

        /// Instance within the data source
        #[arg(long, default_value_t = 0)]
        data_instance: i64,
    },

    /// Query published measurements with an OData expression
    QueryMeasurements {
        /// OData query, e.g. "$filter=name eq 'Voltage'"
        #[arg(default_value = "")]
        query: String,
    },

    /// Query published conditions with an OData expression
    QueryConditions {
        /// OData query
        #[arg(default_value = "")]
        query: String,
    },

    /// Register an extension schema from a file
    RegisterSchema {
        /// Path to the schema file
        path: PathBuf,
    },

    /// List registered extension schemas
    ListSchemas,
}

/// Parse a command-line value into the narrowest scalar kind that accepts it.
fn parse_scalar(text: &str) -> ScalarValue {
    if let Ok(b) = text.parse::<bool>() {
        return ScalarValue::Bool(b);
    }
    if let Ok(i) = text.parse::<i32>() {
        return ScalarValue::Int32(i);
    }
    if let Ok(f) = text.parse::<f64>() {
        return ScalarValue::Float64(f);
    }
    ScalarValue::String(text.to_string())
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ClientConfig::load().context("Failed to load config")?,
    };
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.to_lowercase();
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(command: Commands, config: &ClientConfig) -> Result<()> {
    match command {
        Commands::PublishScalar {
            name,
            value,
            step_id,
            units,
            notes,
        } => {
            let client = DataStoreClient::from_config(config)?;
            let scalar = Scalar::new(parse_scalar(&value), units);
            let options = MeasurementOptions {
                notes,
                ..Default::default()
            };
            let published = client
                .publish_measurement(&name, scalar, &step_id, options)
                .await?;
            info!(measurement_id = %published.id, "Published measurement");
            print_json(&published)
        }
        Commands::Read {
            service_location,
            data_source,
            data_instance,
        } => {
            let client = DataStoreClient::from_config(config)?;
            let moniker = Moniker::new(service_location, data_source, data_instance);
            let value = client.read_data(&moniker).await?;
            print_json(&value)
        }
        Commands::QueryMeasurements { query } => {
            let client = DataStoreClient::from_config(config)?;
            print_json(&client.query_measurements(&query).await?)
        }
        Commands::QueryConditions { query } => {
            let client = DataStoreClient::from_config(config)?;
            print_json(&client.query_conditions(&query).await?)
        }
        Commands::RegisterSchema { path } => {
            let client = MetadataStoreClient::from_config(config)?;
            let schema_id = client.register_schema_from_file(&path).await?;
            info!(%schema_id, path = %path.display(), "Registered schema");
            println!("{schema_id}");
            Ok(())
        }
        Commands::ListSchemas => {
            let client = MetadataStoreClient::from_config(config)?;
            print_json(&client.list_schemas().await?)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let level = logging::parse_log_level(&config.log_level)?;
    logging::init(&TracingConfig::new(level).with_format(cli.log_format))?;

    run(cli.command, &config).await
}
