//! Typed client for the measurement data and metadata stores.
//!
//! [`DataStoreClient`] publishes native values (scalars, vectors,
//! waveforms, spectra, XY data) and reads them back through the monikers
//! the service hands out. [`MetadataStoreClient`] manages the entities
//! measurements refer to. Both talk gRPC through the [`service`] traits,
//! which tests replace with in-process mocks.
//!
//! # Example
//!
//! ```no_run
//! use datastore_client::{ClientConfig, DataStoreClient, MeasurementOptions};
//! use datastore_core::Scalar;
//!
//! # async fn run() -> datastore_client::Result<()> {
//! let config = ClientConfig::load().map_err(|e| {
//!     datastore_client::ClientError::InvalidConfig(e.to_string())
//! })?;
//! let client = DataStoreClient::from_config(&config)?;
//!
//! let published = client
//!     .publish_measurement(
//!         "Voltage",
//!         Scalar::new(3.3, "V"),
//!         "4f1e0d2c-0000-0000-0000-000000000001",
//!         MeasurementOptions::default(),
//!     )
//!     .await?;
//! let voltage: Scalar = client.read_data_as(&published).await?;
//! println!("{voltage:?}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod config;
pub mod connection;
pub mod data;
pub mod error;
pub mod metadata;
pub mod moniker;
pub mod service;
pub mod state;
pub mod timestamp;

pub use config::ClientConfig;
pub use data::{BatchMeasurementOptions, DataStoreClient, MeasurementOptions};
pub use error::{ClientError, Result};
pub use metadata::MetadataStoreClient;
pub use moniker::MonikerSource;
