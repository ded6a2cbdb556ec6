//! Client configuration using Figment.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! 1. Built-in defaults (`localhost:50051`, TLS chosen by host, auth on)
//! 2. A TOML file (optional; missing files are skipped)
//! 3. Environment variables prefixed with `DATASTORE_`
//!
//! ```no_run
//! use datastore_client::config::ClientConfig;
//!
//! let config = ClientConfig::load_from("datastore.toml")?;
//! config.validate()?;
//! println!("Data store at {}", config.address());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::connection::{normalize_url, ChannelConfig, DEFAULT_GRPC_PORT};
use crate::error::{ClientError, Result};

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DATASTORE_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Connection and authentication settings for the data store clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Host name or address of the data store services.
    pub host: String,
    /// gRPC port of the data store services.
    pub port: u16,
    /// Use plaintext even for remote hosts.
    pub use_insecure_channel: bool,
    /// Skip the bearer-token interceptor entirely.
    pub disable_auth: bool,
    /// Fixed JWT to send instead of asking the token provider.
    pub jwt_token: Option<String>,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let channel = ChannelConfig::default();
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_GRPC_PORT,
            use_insecure_channel: false,
            disable_auth: false,
            jwt_token: None,
            connect_timeout_ms: duration_ms(channel.connect_timeout),
            request_timeout_ms: duration_ms(channel.request_timeout),
            log_level: "info".to_string(),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Per-user configuration file, `<config dir>/datastore/config.toml`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("datastore").join("config.toml"))
    }

    /// Load from the per-user file (if any) and the environment.
    pub fn load() -> std::result::Result<Self, figment::Error> {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => Self::figment(None).extract(),
        }
    }

    /// Load from a specific file path and the environment.
    ///
    /// Environment variables override the file, e.g.
    /// `DATASTORE_HOST=store.example.com` or `DATASTORE_DISABLE_AUTH=true`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> std::result::Result<Self, figment::Error> {
        Self::figment(Some(path.as_ref())).extract()
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ClientError::InvalidConfig(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.port == 0 {
            return Err(ClientError::InvalidConfig("port must be non-zero".into()));
        }

        if self.connect_timeout_ms == 0 || self.request_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "timeouts must be greater than zero".into(),
            ));
        }

        normalize_url(&self.address())?;
        Ok(())
    }

    /// `host:port` address of the data store services.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Transport settings derived from the configured timeouts.
    #[must_use]
    pub fn channel_config(&self) -> ChannelConfig {
        ChannelConfig {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            ..ChannelConfig::default()
        }
    }
}
