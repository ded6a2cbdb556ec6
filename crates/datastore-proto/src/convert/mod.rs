//! Conversions between proto messages and `datastore-core` types.
//!
//! - [`publish`]: native [`Value`](datastore_core::Value) -> request payloads
//! - [`read`]: `google.protobuf.Any` -> native value
//! - [`waveform`]: per-message waveform, spectrum and XY conversions used by both
//! - [`records`] / [`metadata`]: service records both ways

pub mod metadata;
pub mod publish;
pub mod read;
pub mod records;
pub mod waveform;

use crate::types;
use datastore_core::value::DType;
use datastore_core::waveform::{ExtendedProperties, WaveformError, UNIT_DESCRIPTION};
use datastore_core::{BinaryTime, PropertyValue};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while converting between native values and wire messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// No publish converter is registered for the value's kind, or the kind
    /// is not accepted by the requested publish operation.
    #[error("Unsupported value type: {0}")]
    UnsupportedValueType(String),

    /// A batch sequence held an element that is not a uniform primitive.
    #[error("Unsupported iterable element type: {0}")]
    UnsupportedIterableElementType(String),

    /// A batch or vector publish was given no elements.
    #[error("Cannot publish an empty sequence")]
    EmptySequence,

    /// The container kind is supported but its element type is not.
    #[error("Unsupported dtype {dtype} for {type_name}")]
    UnsupportedDType {
        /// Identity string of the container.
        type_name: &'static str,
        /// Offending element type.
        dtype: DType,
    },

    /// No read converter is registered for the wire type identifier.
    #[error("Unsupported data type: {0}")]
    UnsupportedWireType(String),

    /// The envelope's type does not match the converter or its bytes do not decode.
    #[error("Failed to unpack Any with type '{type_name}': {reason}")]
    UnpackFailure {
        /// Type identifier carried by the envelope.
        type_name: String,
        /// What went wrong.
        reason: String,
    },

    /// The message decoded but its payload oneof was empty.
    #[error("Could not determine the data type of '{0}'")]
    MissingPayload(&'static str),

    /// The wire type is recognised but cannot be converted yet.
    #[error("Reading {0} is not yet supported")]
    NotYetSupported(&'static str),

    /// A buffer does not divide into the declared shape.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),

    /// A wire integer does not fit the native sample type.
    #[error("Value {value} is out of range for {target}")]
    ValueOutOfRange {
        /// Wire value.
        value: i64,
        /// Native element type.
        target: DType,
    },
}

impl From<WaveformError> for ConversionError {
    fn from(err: WaveformError) -> Self {
        match err {
            WaveformError::InvalidShape(msg) => ConversionError::InvalidShape(msg),
        }
    }
}

/// Trait for converting proto types to domain types
pub trait ToDomain<T> {
    /// Convert, consuming the proto message.
    fn to_domain(self) -> T;
}

/// Fallible counterpart of [`ToDomain`] for messages whose contents may not
/// fit the native type.
pub trait TryToDomain<T> {
    /// Convert, consuming the proto message.
    fn try_to_domain(self) -> Result<T, ConversionError>;
}

// BinaryTime <-> PrecisionTimestamp

impl From<BinaryTime> for types::PrecisionTimestamp {
    fn from(time: BinaryTime) -> Self {
        types::PrecisionTimestamp {
            seconds: time.seconds,
            fractional_seconds: time.fractional_seconds,
        }
    }
}

impl ToDomain<BinaryTime> for types::PrecisionTimestamp {
    fn to_domain(self) -> BinaryTime {
        BinaryTime::new(self.seconds, self.fractional_seconds)
    }
}

// Attributes

impl From<&PropertyValue> for types::AttributeValue {
    fn from(value: &PropertyValue) -> Self {
        use types::attribute_value::Attribute;
        let attribute = match value {
            PropertyValue::Bool(v) => Attribute::BoolValue(*v),
            PropertyValue::Int32(v) => Attribute::IntegerValue(*v),
            PropertyValue::Float64(v) => Attribute::DoubleValue(*v),
            PropertyValue::String(v) => Attribute::StringValue(v.clone()),
        };
        types::AttributeValue {
            attribute: Some(attribute),
        }
    }
}

impl ToDomain<Option<PropertyValue>> for types::AttributeValue {
    fn to_domain(self) -> Option<PropertyValue> {
        use types::attribute_value::Attribute;
        Some(match self.attribute? {
            Attribute::BoolValue(v) => PropertyValue::Bool(v),
            Attribute::IntegerValue(v) => PropertyValue::Int32(v),
            Attribute::DoubleValue(v) => PropertyValue::Float64(v),
            Attribute::StringValue(v) => PropertyValue::String(v),
        })
    }
}

pub(crate) fn attributes_to_proto(
    properties: &ExtendedProperties,
) -> HashMap<String, types::AttributeValue> {
    properties
        .iter()
        .map(|(key, value)| (key.clone(), value.into()))
        .collect()
}

/// Attributes with an empty oneof are dropped.
pub(crate) fn attributes_from_proto(
    attributes: HashMap<String, types::AttributeValue>,
) -> ExtendedProperties {
    attributes
        .into_iter()
        .filter_map(|(key, value)| value.to_domain().map(|v| (key, v)))
        .collect()
}

pub(crate) fn units_attribute(units: &str) -> HashMap<String, types::AttributeValue> {
    string_attributes(&[(UNIT_DESCRIPTION, units)])
}

pub(crate) fn string_attributes(pairs: &[(&str, &str)]) -> HashMap<String, types::AttributeValue> {
    pairs
        .iter()
        .map(|(key, value)| {
            (
                (*key).to_string(),
                types::AttributeValue::from(&PropertyValue::String((*value).to_string())),
            )
        })
        .collect()
}

/// String attribute lookup; missing or non-string attributes read as empty.
pub(crate) fn string_attribute(
    attributes: &HashMap<String, types::AttributeValue>,
    key: &str,
) -> String {
    match attributes.get(key).and_then(|a| a.attribute.as_ref()) {
        Some(types::attribute_value::Attribute::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}
