//! Client error types.

use datastore_core::BinaryTime;
use datastore_proto::convert::ConversionError;
use thiserror::Error;

use crate::auth::AuthError;
use crate::connection::AddressError;

/// Result type alias using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the data store clients.
#[derive(Error, Debug)]
pub enum ClientError {
    /// A value could not be converted to or from its wire form.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A read returned a different kind than the caller asked for.
    #[error("Expected type {expected}, got {actual}")]
    ExpectedTypeMismatch {
        /// What the caller asked for.
        expected: &'static str,
        /// What the service returned.
        actual: String,
    },

    /// A waveform's own start time disagrees with the explicit timestamp.
    #[error(
        "The timestamp of the waveform ({waveform_t0}) does not match the timestamp \
         provided to the publish call ({timestamp})"
    )]
    TimestampConflict {
        /// The waveform's t0.
        waveform_t0: BinaryTime,
        /// The explicitly supplied timestamp.
        timestamp: BinaryTime,
    },

    /// The client was closed; no further operations are accepted.
    #[error("The client has been closed")]
    ClientClosed,

    /// A published record carries no moniker to read from.
    #[error("{0} must have a Moniker to read data")]
    MissingMoniker(&'static str),

    /// A service address could not be parsed.
    #[error("Invalid service address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// gRPC transport error (connection failed, TLS error, etc.).
    #[error("gRPC transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// gRPC status error (server returned an error).
    #[error("gRPC status error: {0}")]
    RpcStatus(#[from] tonic::Status),

    /// No authentication token could be obtained.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A schema file could not be read.
    #[error("Failed to read schema file {path}: {source}")]
    SchemaFile {
        /// File that was requested.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON metadata document could not be read.
    #[error("Failed to read metadata file {path}: {source}")]
    MetadataFile {
        /// File that was requested.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
