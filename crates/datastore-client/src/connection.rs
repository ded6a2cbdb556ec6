//! Service address normalization and channel construction.
//!
//! Addresses may be given as bare `host:port`, with an `http`/`https`
//! scheme, or without a port; [`normalize_url`] turns all of these into a
//! URL the transport can dial. Moniker service locations are reduced to a
//! `host:port` key by [`service_location_key`] so that equivalent spellings
//! share one cached connection.

use std::net::IpAddr;
use std::time::Duration;

use thiserror::Error;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use url::Url;

/// Default gRPC port of the data store services.
pub const DEFAULT_GRPC_PORT: u16 = 50051;

/// Address validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Input was empty or whitespace-only
    #[error("Address cannot be empty")]
    EmptyInput,
    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// No host was found in the URL
    #[error("URL must include a host")]
    MissingHost,
    /// Port could not be set
    #[error("Invalid port: {0}")]
    InvalidPort(String),
    /// Only http and https are accepted
    #[error("Unsupported scheme '{0}' (use http or https)")]
    UnsupportedScheme(String),
}

/// Normalize a service address.
///
/// - Adds `http://` scheme if missing
/// - Adds default port (50051) if missing
/// - Trims whitespace
///
/// ```
/// use datastore_client::connection::normalize_url;
///
/// let url = normalize_url("192.168.1.100:50051")?;
/// assert_eq!(url.as_str(), "http://192.168.1.100:50051/");
///
/// let url = normalize_url("https://store.example.com")?;
/// assert_eq!(url.as_str(), "https://store.example.com:50051/");
/// # Ok::<(), datastore_client::connection::AddressError>(())
/// ```
pub fn normalize_url(input: &str) -> Result<Url, AddressError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(AddressError::EmptyInput);
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| AddressError::InvalidUrl(e.to_string()))?;

    let scheme = url.scheme().to_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(AddressError::UnsupportedScheme(scheme));
    }

    if url.host().is_none() {
        return Err(AddressError::MissingHost);
    }

    if url.port().is_none() {
        url.set_port(Some(DEFAULT_GRPC_PORT))
            .map_err(|()| AddressError::InvalidPort("Cannot set port on this URL".to_string()))?;
    }

    Ok(url)
}

/// `host:port` key of a service location, independent of scheme and path.
pub fn service_location_key(location: &str) -> Result<String, AddressError> {
    let url = normalize_url(location)?;
    let host = url.host_str().ok_or(AddressError::MissingHost)?;
    let port = url.port().unwrap_or(DEFAULT_GRPC_PORT);
    Ok(format!("{host}:{port}"))
}

/// Whether `host` names this machine (`localhost` or a loopback address).
#[must_use]
pub fn is_local_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}

/// gRPC channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Connection timeout (how long to wait for initial connection)
    pub connect_timeout: Duration,
    /// Request timeout (default timeout for individual RPC calls)
    pub request_timeout: Duration,
    /// HTTP/2 keepalive interval (how often to send keepalive pings)
    pub keepalive_interval: Duration,
    /// Keepalive timeout (how long to wait for keepalive response)
    pub keepalive_timeout: Duration,
    /// Whether to send keepalive pings even when idle
    pub keepalive_while_idle: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            keepalive_interval: Duration::from_secs(10),
            keepalive_timeout: Duration::from_secs(60),
            keepalive_while_idle: true,
        }
    }
}

/// Target of a channel: the normalized URL plus whether to use TLS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelTarget {
    /// Normalized service URL.
    pub url: Url,
    /// Dial with TLS.
    pub tls: bool,
}

impl ChannelTarget {
    /// Resolve `address` into a target.
    ///
    /// Local hosts and `insecure` always use plaintext; an explicit
    /// `https` scheme or any remote host uses TLS.
    pub fn resolve(address: &str, insecure: bool) -> Result<Self, AddressError> {
        let mut url = normalize_url(address)?;
        let local = url.host_str().is_some_and(is_local_host);
        let tls = !insecure && !local;
        let scheme = if tls { "https" } else { "http" };
        if url.scheme() != scheme {
            url.set_scheme(scheme)
                .map_err(|()| AddressError::UnsupportedScheme(url.scheme().to_string()))?;
        }
        Ok(Self { url, tls })
    }
}

/// Build a lazily connecting channel for `target`.
///
/// No connection is attempted until the first request, so constructing a
/// client never blocks on the network.
pub fn lazy_channel(
    target: &ChannelTarget,
    config: &ChannelConfig,
) -> Result<Channel, tonic::transport::Error> {
    let mut endpoint = Endpoint::from_shared(target.url.to_string())?
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .http2_keep_alive_interval(config.keepalive_interval)
        .keep_alive_timeout(config.keepalive_timeout)
        .keep_alive_while_idle(config.keepalive_while_idle);

    if target.tls {
        endpoint = endpoint.tls_config(ClientTlsConfig::new())?;
    }

    tracing::debug!(url = %target.url, tls = target.tls, "Creating gRPC channel");
    Ok(endpoint.connect_lazy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bare_host_port() {
        let url = normalize_url("127.0.0.1:50051").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:50051/");
    }

    #[test]
    fn test_normalize_adds_default_port() {
        let url = normalize_url("http://localhost").unwrap();
        assert_eq!(url.as_str(), "http://localhost:50051/");
    }

    #[test]
    fn test_normalize_ipv6() {
        let url = normalize_url("[::1]:8080").unwrap();
        assert_eq!(url.as_str(), "http://[::1]:8080/");
    }

    #[test]
    fn test_normalize_empty_input() {
        assert_eq!(normalize_url("   ").unwrap_err(), AddressError::EmptyInput);
    }

    #[test]
    fn test_normalize_unsupported_scheme() {
        let err = normalize_url("ftp://example.com").unwrap_err();
        assert!(matches!(err, AddressError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_location_key_ignores_scheme_and_path() {
        let a = service_location_key("http://localhost:50051").unwrap();
        let b = service_location_key("localhost:50051").unwrap();
        let c = service_location_key("https://localhost:50051/some/path").unwrap();
        assert_eq!(a, "localhost:50051");
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(service_location_key("store.local").unwrap(), "store.local:50051");
    }

    #[test]
    fn test_local_hosts() {
        assert!(is_local_host("localhost"));
        assert!(is_local_host("127.0.0.1"));
        assert!(is_local_host("[::1]"));
        assert!(!is_local_host("10.0.0.5"));
        assert!(!is_local_host("store.example.com"));
    }

    #[test]
    fn test_target_tls_selection() {
        let local = ChannelTarget::resolve("localhost:50051", false).unwrap();
        assert!(!local.tls);
        assert_eq!(local.url.scheme(), "http");

        let remote = ChannelTarget::resolve("store.example.com", false).unwrap();
        assert!(remote.tls);
        assert_eq!(remote.url.as_str(), "https://store.example.com:50051/");

        let forced = ChannelTarget::resolve("https://store.example.com", true).unwrap();
        assert!(!forced.tls);
        assert_eq!(forced.url.scheme(), "http");
    }

    #[tokio::test]
    async fn test_lazy_channel_does_not_dial() {
        let target = ChannelTarget::resolve("localhost:1", false).unwrap();
        assert!(lazy_channel(&target, &ChannelConfig::default()).is_ok());
    }
}
