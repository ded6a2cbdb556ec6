//! Read converters: `google.protobuf.Any` -> native values.
//!
//! The registry is keyed by wire type identifier (the part of the `Any`'s
//! type URL after the last `/`) and is built once on first use.

use super::{string_attribute, ConversionError, ToDomain, TryToDomain};
use crate::{type_name_of, type_names, types};
use datastore_core::waveform::{
    AnalogWaveform, ComplexWaveform, DigitalWaveform, Spectrum, UNIT_DESCRIPTION,
};
use datastore_core::{Scalar, ScalarValue, Value, Vector, VectorValues};
use once_cell::sync::Lazy;
use prost::Message;
use prost_types::Any;
use std::collections::HashMap;
use std::marker::PhantomData;

type Result<T> = std::result::Result<T, ConversionError>;

/// Reconstructs a native value from one wire message type.
pub trait ReadConverter: Send + Sync {
    /// Wire type identifier this converter accepts.
    fn wire_type_name(&self) -> &'static str;

    /// Unpack and convert. The envelope's type must match [`Self::wire_type_name`].
    fn to_value(&self, any: &Any) -> Result<Value>;
}

/// Decodes `M` and hands it to a conversion function.
struct MessageConverter<M> {
    wire_type_name: &'static str,
    convert: fn(M) -> Result<Value>,
    _message: PhantomData<fn() -> M>,
}

impl<M> MessageConverter<M> {
    fn boxed(wire_type_name: &'static str, convert: fn(M) -> Result<Value>) -> Box<Self> {
        Box::new(Self {
            wire_type_name,
            convert,
            _message: PhantomData,
        })
    }
}

impl<M: Message + Default> ReadConverter for MessageConverter<M> {
    fn wire_type_name(&self) -> &'static str {
        self.wire_type_name
    }

    fn to_value(&self, any: &Any) -> Result<Value> {
        let actual = type_name_of(any);
        if actual != self.wire_type_name {
            return Err(ConversionError::UnpackFailure {
                type_name: actual.to_string(),
                reason: format!("expected {}", self.wire_type_name),
            });
        }
        let message = M::decode(any.value.as_slice()).map_err(|err| {
            ConversionError::UnpackFailure {
                type_name: actual.to_string(),
                reason: err.to_string(),
            }
        })?;
        (self.convert)(message)
    }
}

fn scalar_from_proto(message: types::Scalar) -> Result<Value> {
    use types::scalar::Value as Payload;
    let units = string_attribute(&message.attributes, UNIT_DESCRIPTION);
    let value = match message
        .value
        .ok_or(ConversionError::MissingPayload(type_names::SCALAR))?
    {
        Payload::BoolValue(v) => ScalarValue::Bool(v),
        Payload::Sint32Value(v) => ScalarValue::Int32(v),
        Payload::DoubleValue(v) => ScalarValue::Float64(v),
        Payload::StringValue(v) => ScalarValue::String(v),
    };
    Ok(Value::Scalar(Scalar { value, units }))
}

fn vector_from_proto(message: types::Vector) -> Result<Value> {
    use types::vector::Value as Payload;
    let units = string_attribute(&message.attributes, UNIT_DESCRIPTION);
    let values = match message
        .value
        .ok_or(ConversionError::MissingPayload(type_names::VECTOR))?
    {
        Payload::BoolArray(a) => VectorValues::Bool(a.values),
        Payload::Sint32Array(a) => VectorValues::Int32(a.values),
        Payload::DoubleArray(a) => VectorValues::Float64(a.values),
        Payload::StringArray(a) => VectorValues::String(a.values),
    };
    Ok(Value::Vector(Vector { values, units }))
}

fn double_analog_from_proto(message: types::DoubleAnalogWaveform) -> Result<Value> {
    let waveform: AnalogWaveform<f64> = message.to_domain();
    Ok(waveform.into())
}

fn i16_analog_from_proto(message: types::I16AnalogWaveform) -> Result<Value> {
    let waveform: AnalogWaveform<i16> = message.try_to_domain()?;
    Ok(waveform.into())
}

fn double_complex_from_proto(message: types::DoubleComplexWaveform) -> Result<Value> {
    let waveform: ComplexWaveform<f64> = message.try_to_domain()?;
    Ok(waveform.into())
}

fn i16_complex_from_proto(message: types::I16ComplexWaveform) -> Result<Value> {
    let waveform: ComplexWaveform<i16> = message.try_to_domain()?;
    Ok(waveform.into())
}

fn spectrum_from_proto(message: types::DoubleSpectrum) -> Result<Value> {
    let spectrum: Spectrum<f64> = message.to_domain();
    Ok(spectrum.into())
}

fn digital_from_proto(message: types::DigitalWaveform) -> Result<Value> {
    let waveform: DigitalWaveform = message.try_to_domain()?;
    Ok(waveform.into())
}

// Decoded first so malformed bytes still surface as an unpack failure.
fn xy_data_from_proto(_message: types::DoubleXyData) -> Result<Value> {
    Err(ConversionError::NotYetSupported(type_names::DOUBLE_XY_DATA))
}

static READ_CONVERTERS: Lazy<HashMap<&'static str, Box<dyn ReadConverter>>> = Lazy::new(|| {
    let converters: Vec<Box<dyn ReadConverter>> = vec![
        MessageConverter::boxed(type_names::SCALAR, scalar_from_proto),
        MessageConverter::boxed(type_names::VECTOR, vector_from_proto),
        MessageConverter::boxed(type_names::DOUBLE_ANALOG_WAVEFORM, double_analog_from_proto),
        MessageConverter::boxed(type_names::I16_ANALOG_WAVEFORM, i16_analog_from_proto),
        MessageConverter::boxed(type_names::DOUBLE_COMPLEX_WAVEFORM, double_complex_from_proto),
        MessageConverter::boxed(type_names::I16_COMPLEX_WAVEFORM, i16_complex_from_proto),
        MessageConverter::boxed(type_names::DOUBLE_SPECTRUM, spectrum_from_proto),
        MessageConverter::boxed(type_names::DIGITAL_WAVEFORM, digital_from_proto),
        MessageConverter::boxed(type_names::DOUBLE_XY_DATA, xy_data_from_proto),
    ];
    converters
        .into_iter()
        .map(|converter| (converter.wire_type_name(), converter))
        .collect()
});

/// Look up the converter for an envelope's wire type identifier.
pub fn converter_for(any: &Any) -> Result<&'static dyn ReadConverter> {
    let type_name = type_name_of(any);
    READ_CONVERTERS
        .get(type_name)
        .map(|converter| converter.as_ref())
        .ok_or_else(|| ConversionError::UnsupportedWireType(type_name.to_string()))
}

/// Reconstruct the native value carried by an envelope.
pub fn from_any(any: &Any) -> Result<Value> {
    let converter = converter_for(any)?;
    tracing::trace!(
        type_name = converter.wire_type_name(),
        bytes = any.value.len(),
        "Unpacking value"
    );
    converter.to_value(any)
}
