//! Publish converters: native values -> request payloads.
//!
//! One [`PublishConverter`] is registered per [`Value`] kind, keyed by
//! [`Value::type_name`]. Each converter builds the payload for the four publish
//! flavours (condition, condition batch, measurement, measurement batch);
//! flavours a kind does not support fall through to the trait's default and
//! fail with [`ConversionError::UnsupportedValueType`].
//!
//! `Value::Sequence` has no converter. The batch entry points turn a sequence
//! into a unitless `Vector` before dispatch, so a sequence passed to a single
//! publish is a registry miss.

use super::{units_attribute, ConversionError};
use crate::data::{publish_condition_request, publish_measurement_request};
use crate::types;
use datastore_core::value::type_names;
use datastore_core::waveform::{AnyAnalogWaveform, AnyComplexWaveform, AnySpectrum};
use datastore_core::{ScalarValue, Value, Vector, VectorValues};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;

type Result<T> = std::result::Result<T, ConversionError>;

fn unsupported(value: &Value) -> ConversionError {
    ConversionError::UnsupportedValueType(value.type_name().to_string())
}

/// Builds request payloads for one native value kind.
pub trait PublishConverter: Send + Sync {
    /// Identity string of the kind this converter handles.
    fn type_name(&self) -> &'static str;

    /// Payload of a single condition publish.
    fn condition_value(&self, value: &Value) -> Result<publish_condition_request::Value> {
        Err(unsupported(value))
    }

    /// Values of a condition batch publish.
    fn condition_batch_values(&self, value: &Value) -> Result<types::Vector> {
        Err(unsupported(value))
    }

    /// Payload of a single measurement publish.
    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        Err(unsupported(value))
    }

    /// Values of a measurement batch publish.
    fn measurement_batch_values(&self, value: &Value) -> Result<types::Vector> {
        Err(unsupported(value))
    }
}

fn scalar_payload(value: &ScalarValue) -> types::scalar::Value {
    use types::scalar::Value as Payload;
    match value {
        ScalarValue::Bool(v) => Payload::BoolValue(*v),
        ScalarValue::Int32(v) => Payload::Sint32Value(*v),
        ScalarValue::Float64(v) => Payload::DoubleValue(*v),
        ScalarValue::String(v) => Payload::StringValue(v.clone()),
    }
}

/// Bare `bool`, `i32`, `f64` and `String`: sent as a unitless scalar.
struct PrimitiveConverter {
    type_name: &'static str,
}

impl PrimitiveConverter {
    fn scalar(&self, value: &Value) -> Result<types::Scalar> {
        let payload = match value {
            Value::Bool(v) => ScalarValue::Bool(*v),
            Value::Int32(v) => ScalarValue::Int32(*v),
            Value::Float64(v) => ScalarValue::Float64(*v),
            Value::String(v) => ScalarValue::String(v.clone()),
            other => return Err(unsupported(other)),
        };
        Ok(types::Scalar {
            attributes: HashMap::new(),
            value: Some(scalar_payload(&payload)),
        })
    }
}

impl PublishConverter for PrimitiveConverter {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn condition_value(&self, value: &Value) -> Result<publish_condition_request::Value> {
        Ok(publish_condition_request::Value::Scalar(self.scalar(value)?))
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        Ok(publish_measurement_request::Value::Scalar(self.scalar(value)?))
    }
}

struct ScalarConverter;

impl ScalarConverter {
    fn scalar(value: &Value) -> Result<types::Scalar> {
        match value {
            Value::Scalar(scalar) => Ok(types::Scalar {
                attributes: units_attribute(&scalar.units),
                value: Some(scalar_payload(&scalar.value)),
            }),
            other => Err(unsupported(other)),
        }
    }
}

impl PublishConverter for ScalarConverter {
    fn type_name(&self) -> &'static str {
        type_names::SCALAR
    }

    fn condition_value(&self, value: &Value) -> Result<publish_condition_request::Value> {
        Ok(publish_condition_request::Value::Scalar(Self::scalar(value)?))
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        Ok(publish_measurement_request::Value::Scalar(Self::scalar(value)?))
    }
}

/// Wire vector for a native vector. Empty vectors are rejected.
pub fn vector_to_proto(vector: &Vector) -> Result<types::Vector> {
    use types::vector::Value as Payload;
    if vector.is_empty() {
        return Err(ConversionError::EmptySequence);
    }
    let payload = match &vector.values {
        VectorValues::Bool(v) => Payload::BoolArray(types::BoolArray { values: v.clone() }),
        VectorValues::Int32(v) => Payload::Sint32Array(types::Int32Array { values: v.clone() }),
        VectorValues::Float64(v) => Payload::DoubleArray(types::DoubleArray { values: v.clone() }),
        VectorValues::String(v) => Payload::StringArray(types::StringArray { values: v.clone() }),
    };
    Ok(types::Vector {
        attributes: units_attribute(&vector.units),
        value: Some(payload),
    })
}

struct VectorConverter;

impl VectorConverter {
    fn vector(value: &Value) -> Result<types::Vector> {
        match value {
            Value::Vector(vector) => vector_to_proto(vector),
            other => Err(unsupported(other)),
        }
    }
}

impl PublishConverter for VectorConverter {
    fn type_name(&self) -> &'static str {
        type_names::VECTOR
    }

    fn condition_batch_values(&self, value: &Value) -> Result<types::Vector> {
        Self::vector(value)
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        Ok(publish_measurement_request::Value::Vector(Self::vector(value)?))
    }

    fn measurement_batch_values(&self, value: &Value) -> Result<types::Vector> {
        Self::vector(value)
    }
}

struct AnalogWaveformConverter;

impl PublishConverter for AnalogWaveformConverter {
    fn type_name(&self) -> &'static str {
        type_names::ANALOG_WAVEFORM
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        use publish_measurement_request::Value as Payload;
        match value {
            Value::AnalogWaveform(AnyAnalogWaveform::Float64(w)) => {
                Ok(Payload::DoubleAnalogWaveform(w.into()))
            }
            Value::AnalogWaveform(AnyAnalogWaveform::Int16(w)) => {
                Ok(Payload::I16AnalogWaveform(w.into()))
            }
            Value::AnalogWaveform(other) => Err(ConversionError::UnsupportedDType {
                type_name: type_names::ANALOG_WAVEFORM,
                dtype: other.dtype(),
            }),
            other => Err(unsupported(other)),
        }
    }
}

struct ComplexWaveformConverter;

impl PublishConverter for ComplexWaveformConverter {
    fn type_name(&self) -> &'static str {
        type_names::COMPLEX_WAVEFORM
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        use publish_measurement_request::Value as Payload;
        match value {
            Value::ComplexWaveform(AnyComplexWaveform::Float64(w)) => {
                Ok(Payload::DoubleComplexWaveform(w.into()))
            }
            Value::ComplexWaveform(AnyComplexWaveform::Int16(w)) => {
                Ok(Payload::I16ComplexWaveform(w.into()))
            }
            other => Err(unsupported(other)),
        }
    }
}

struct DigitalWaveformConverter;

impl PublishConverter for DigitalWaveformConverter {
    fn type_name(&self) -> &'static str {
        type_names::DIGITAL_WAVEFORM
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        match value {
            Value::DigitalWaveform(w) => {
                Ok(publish_measurement_request::Value::DigitalWaveform(
                    w.try_into()?,
                ))
            }
            other => Err(unsupported(other)),
        }
    }
}

struct SpectrumConverter;

impl PublishConverter for SpectrumConverter {
    fn type_name(&self) -> &'static str {
        type_names::SPECTRUM
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        match value {
            Value::Spectrum(AnySpectrum::Float64(s)) => {
                Ok(publish_measurement_request::Value::DoubleSpectrum(s.into()))
            }
            Value::Spectrum(other) => Err(ConversionError::UnsupportedDType {
                type_name: type_names::SPECTRUM,
                dtype: other.dtype(),
            }),
            other => Err(unsupported(other)),
        }
    }
}

struct XyDataConverter;

impl PublishConverter for XyDataConverter {
    fn type_name(&self) -> &'static str {
        type_names::XY_DATA
    }

    fn measurement_value(&self, value: &Value) -> Result<publish_measurement_request::Value> {
        match value {
            Value::XyData(xy) => Ok(publish_measurement_request::Value::XyData(xy.into())),
            other => Err(unsupported(other)),
        }
    }
}

static PUBLISH_CONVERTERS: Lazy<HashMap<&'static str, Box<dyn PublishConverter>>> =
    Lazy::new(|| {
        let converters: Vec<Box<dyn PublishConverter>> = vec![
            Box::new(PrimitiveConverter { type_name: type_names::BOOL }),
            Box::new(PrimitiveConverter { type_name: type_names::INT32 }),
            Box::new(PrimitiveConverter { type_name: type_names::FLOAT64 }),
            Box::new(PrimitiveConverter { type_name: type_names::STRING }),
            Box::new(ScalarConverter),
            Box::new(VectorConverter),
            Box::new(AnalogWaveformConverter),
            Box::new(ComplexWaveformConverter),
            Box::new(DigitalWaveformConverter),
            Box::new(SpectrumConverter),
            Box::new(XyDataConverter),
        ];
        converters
            .into_iter()
            .map(|converter| (converter.type_name(), converter))
            .collect()
    });

/// Look up the converter for a value's kind.
pub fn converter_for(value: &Value) -> Result<&'static dyn PublishConverter> {
    PUBLISH_CONVERTERS
        .get(value.type_name())
        .map(|converter| converter.as_ref())
        .ok_or_else(|| unsupported(value))
}

/// Convert a plain sequence into a unitless vector.
///
/// Every element must be the same primitive kind (`bool`, `i32`, `f64` or
/// `String`); anything else, including a nested sequence, is rejected.
pub fn sequence_to_vector(items: &[Value]) -> Result<Vector> {
    fn uniform<T>(items: &[Value], pick: impl Fn(&Value) -> Option<T>) -> Result<Vec<T>> {
        items
            .iter()
            .map(|item| {
                pick(item).ok_or_else(|| {
                    ConversionError::UnsupportedIterableElementType(item.describe())
                })
            })
            .collect()
    }

    let first = items.first().ok_or(ConversionError::EmptySequence)?;
    let values = match first {
        Value::Bool(_) => VectorValues::Bool(uniform(items, |v| match v {
            Value::Bool(b) => Some(*b),
            _ => None,
        })?),
        Value::Int32(_) => VectorValues::Int32(uniform(items, |v| match v {
            Value::Int32(i) => Some(*i),
            _ => None,
        })?),
        Value::Float64(_) => VectorValues::Float64(uniform(items, |v| match v {
            Value::Float64(f) => Some(*f),
            _ => None,
        })?),
        Value::String(_) => VectorValues::String(uniform(items, |v| match v {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })?),
        other => {
            return Err(ConversionError::UnsupportedIterableElementType(
                other.describe(),
            ))
        }
    };
    Ok(Vector::new(values, ""))
}

fn batch_input(value: &Value) -> Result<Cow<'_, Value>> {
    match value {
        Value::Sequence(items) => Ok(Cow::Owned(Value::Vector(sequence_to_vector(items)?))),
        other => Ok(Cow::Borrowed(other)),
    }
}

/// Payload for `PublishCondition`.
pub fn condition_value(value: &Value) -> Result<publish_condition_request::Value> {
    converter_for(value)?.condition_value(value)
}

/// `scalar_values` for `PublishConditionBatch`.
pub fn condition_batch_values(value: &Value) -> Result<types::Vector> {
    let value = batch_input(value)?;
    converter_for(&value)?.condition_batch_values(&value)
}

/// Payload for `PublishMeasurement`.
pub fn measurement_value(value: &Value) -> Result<publish_measurement_request::Value> {
    converter_for(value)?.measurement_value(value)
}

/// `scalar_values` for `PublishMeasurementBatch`.
pub fn measurement_batch_values(value: &Value) -> Result<types::Vector> {
    let value = batch_input(value)?;
    converter_for(&value)?.measurement_batch_values(&value)
}
