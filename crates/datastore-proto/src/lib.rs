//! Protocol buffer definitions and conversions for the measurement data store.
//!
//! This crate contains:
//! - Generated protobuf types and gRPC clients for the data store, metadata
//!   store and moniker services (`proto/ni/**`)
//! - Publish converters mapping native [`datastore_core::Value`]s onto request payloads
//! - Read converters reconstructing native values from `google.protobuf.Any`
//! - Record conversions between proto messages and `datastore-core` types
//!
//! # Architecture
//!
//! The proto types are kept separate from domain types to:
//! - Avoid transport-layer coupling in domain code
//! - Keep dispatch tables keyed by stable strings on both sides
//! - Provide clear boundaries for type conversions

pub mod convert;

/// Generated protobuf types, one module per proto package.
#[allow(missing_docs, clippy::all)]
pub mod ni {
    pub mod protobuf {
        pub mod types {
            tonic::include_proto!("ni.protobuf.types");
        }
    }

    pub mod datamonikers {
        pub mod v1 {
            tonic::include_proto!("ni.datamonikers.v1");
        }
    }

    pub mod measurements {
        pub mod data {
            pub mod v1 {
                tonic::include_proto!("ni.measurements.data.v1");
            }
        }

        pub mod metadata {
            pub mod v1 {
                tonic::include_proto!("ni.measurements.metadata.v1");
            }
        }
    }
}

// Short aliases for the packages used throughout the client.
pub use ni::datamonikers::v1 as monikers;
pub use ni::measurements::data::v1 as data;
pub use ni::measurements::metadata::v1 as metadata;
pub use ni::protobuf::types;

/// Prefix used when packing messages into `google.protobuf.Any`.
pub const TYPE_URL_PREFIX: &str = "type.googleapis.com/";

/// Fully qualified wire type identifiers of every value message.
pub mod type_names {
    /// `ni.protobuf.types.Scalar`
    pub const SCALAR: &str = "ni.protobuf.types.Scalar";
    /// `ni.protobuf.types.Vector`
    pub const VECTOR: &str = "ni.protobuf.types.Vector";
    /// `ni.protobuf.types.DoubleAnalogWaveform`
    pub const DOUBLE_ANALOG_WAVEFORM: &str = "ni.protobuf.types.DoubleAnalogWaveform";
    /// `ni.protobuf.types.I16AnalogWaveform`
    pub const I16_ANALOG_WAVEFORM: &str = "ni.protobuf.types.I16AnalogWaveform";
    /// `ni.protobuf.types.DoubleComplexWaveform`
    pub const DOUBLE_COMPLEX_WAVEFORM: &str = "ni.protobuf.types.DoubleComplexWaveform";
    /// `ni.protobuf.types.I16ComplexWaveform`
    pub const I16_COMPLEX_WAVEFORM: &str = "ni.protobuf.types.I16ComplexWaveform";
    /// `ni.protobuf.types.DoubleSpectrum`
    pub const DOUBLE_SPECTRUM: &str = "ni.protobuf.types.DoubleSpectrum";
    /// `ni.protobuf.types.DigitalWaveform`
    pub const DIGITAL_WAVEFORM: &str = "ni.protobuf.types.DigitalWaveform";
    /// `ni.protobuf.types.DoubleXYData`
    pub const DOUBLE_XY_DATA: &str = "ni.protobuf.types.DoubleXYData";
}

/// Type identifier of an `Any`: everything after the last `/` of its URL.
#[must_use]
pub fn type_name_of(any: &prost_types::Any) -> &str {
    any.type_url
        .rsplit_once('/')
        .map_or(any.type_url.as_str(), |(_, name)| name)
}

/// Pack a message into an `Any` under the given wire type identifier.
pub fn pack<M: prost::Message>(message: &M, type_name: &str) -> prost_types::Any {
    prost_types::Any {
        type_url: format!("{TYPE_URL_PREFIX}{type_name}"),
        value: message.encode_to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_name_strips_url_prefix() {
        let any = pack(&types::Scalar::default(), type_names::SCALAR);
        assert_eq!(any.type_url, "type.googleapis.com/ni.protobuf.types.Scalar");
        assert_eq!(type_name_of(&any), type_names::SCALAR);

        let bare = prost_types::Any {
            type_url: "ni.protobuf.types.Vector".into(),
            value: vec![],
        };
        assert_eq!(type_name_of(&bare), type_names::VECTOR);
    }
}
