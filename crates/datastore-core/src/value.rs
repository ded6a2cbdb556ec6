//! The closed set of values the data store accepts and returns.
//!
//! [`Value`] is the single entry point for publish and read. Each variant has a
//! stable identity string ([`Value::type_name`]) used as the key of the
//! publish converter registry, and a [`DType`] where the container is generic
//! over its sample type.

use crate::time::BinaryTime;
use crate::waveform::{
    AnalogWaveform, AnyAnalogWaveform, AnyComplexWaveform, AnySpectrum, ComplexWaveform,
    DigitalWaveform, Spectrum, XyData,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity strings for every [`Value`] kind.
pub mod type_names {
    /// `bool`
    pub const BOOL: &str = "bool";
    /// `i32`
    pub const INT32: &str = "i32";
    /// `f64`
    pub const FLOAT64: &str = "f64";
    /// `String`
    pub const STRING: &str = "alloc::string::String";
    /// [`super::Scalar`]
    pub const SCALAR: &str = "datastore_core::value::Scalar";
    /// [`super::Vector`]
    pub const VECTOR: &str = "datastore_core::value::Vector";
    /// [`crate::waveform::AnalogWaveform`]
    pub const ANALOG_WAVEFORM: &str = "datastore_core::waveform::AnalogWaveform";
    /// [`crate::waveform::ComplexWaveform`]
    pub const COMPLEX_WAVEFORM: &str = "datastore_core::waveform::ComplexWaveform";
    /// [`crate::waveform::DigitalWaveform`]
    pub const DIGITAL_WAVEFORM: &str = "datastore_core::waveform::DigitalWaveform";
    /// [`crate::waveform::Spectrum`]
    pub const SPECTRUM: &str = "datastore_core::waveform::Spectrum";
    /// [`crate::waveform::XyData`]
    pub const XY_DATA: &str = "datastore_core::waveform::XyData";
    /// An ordered sequence of values.
    pub const SEQUENCE: &str = "alloc::vec::Vec";
}

/// Element type of a generic container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// Boolean
    Bool,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 16-bit integer
    Int16,
    /// Signed 32-bit integer
    Int32,
    /// 32-bit float
    Float32,
    /// 64-bit float
    Float64,
    /// Complex with 16-bit integer parts
    ComplexInt16,
    /// Complex with 64-bit float parts
    ComplexFloat64,
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DType::Bool => "bool",
            DType::UInt8 => "uint8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::ComplexInt16 => "complex_int16",
            DType::ComplexFloat64 => "complex128",
        };
        write!(f, "{label}")
    }
}

/// A single attribute value attached to scalars, vectors and waveforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Boolean attribute
    Bool(bool),
    /// Integer attribute
    Int32(i32),
    /// Floating point attribute
    Float64(f64),
    /// String attribute
    String(String),
}

/// Payload of a [`Scalar`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// Boolean scalar
    Bool(bool),
    /// Integer scalar
    Int32(i32),
    /// Floating point scalar
    Float64(f64),
    /// String scalar
    String(String),
}

/// One value with a unit description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scalar {
    /// The value.
    pub value: ScalarValue,
    /// Unit description, empty when unitless.
    pub units: String,
}

impl Scalar {
    /// Scalar with units.
    pub fn new(value: impl Into<ScalarValue>, units: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            units: units.into(),
        }
    }

    /// Unitless scalar.
    pub fn unitless(value: impl Into<ScalarValue>) -> Self {
        Self::new(value, "")
    }
}

/// Payload of a [`Vector`]. All elements share one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VectorValues {
    /// Boolean elements
    Bool(Vec<bool>),
    /// Integer elements
    Int32(Vec<i32>),
    /// Floating point elements
    Float64(Vec<f64>),
    /// String elements
    String(Vec<String>),
}

impl VectorValues {
    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Bool(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// True when there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A homogeneous list of values with a unit description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    /// The elements.
    pub values: VectorValues,
    /// Unit description, empty when unitless.
    pub units: String,
}

impl Vector {
    /// Vector with units.
    pub fn new(values: impl Into<VectorValues>, units: impl Into<String>) -> Self {
        Self {
            values: values.into(),
            units: units.into(),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Any value that can be published to or read from the data store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Bare boolean
    Bool(bool),
    /// Bare 32-bit integer
    Int32(i32),
    /// Bare 64-bit float
    Float64(f64),
    /// Bare string
    String(String),
    /// Scalar with units
    Scalar(Scalar),
    /// Vector with units
    Vector(Vector),
    /// Analog waveform
    AnalogWaveform(AnyAnalogWaveform),
    /// Complex waveform
    ComplexWaveform(AnyComplexWaveform),
    /// Digital waveform
    DigitalWaveform(DigitalWaveform),
    /// Spectrum
    Spectrum(AnySpectrum),
    /// XY data
    XyData(XyData<f64>),
    /// Ordered sequence, accepted by the batch publish operations
    Sequence(Vec<Value>),
}

impl Value {
    /// Stable identity string of this value's kind.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => type_names::BOOL,
            Value::Int32(_) => type_names::INT32,
            Value::Float64(_) => type_names::FLOAT64,
            Value::String(_) => type_names::STRING,
            Value::Scalar(_) => type_names::SCALAR,
            Value::Vector(_) => type_names::VECTOR,
            Value::AnalogWaveform(_) => type_names::ANALOG_WAVEFORM,
            Value::ComplexWaveform(_) => type_names::COMPLEX_WAVEFORM,
            Value::DigitalWaveform(_) => type_names::DIGITAL_WAVEFORM,
            Value::Spectrum(_) => type_names::SPECTRUM,
            Value::XyData(_) => type_names::XY_DATA,
            Value::Sequence(_) => type_names::SEQUENCE,
        }
    }

    /// Element type for generic containers, `None` otherwise.
    #[must_use]
    pub fn dtype(&self) -> Option<DType> {
        match self {
            Value::AnalogWaveform(w) => Some(w.dtype()),
            Value::ComplexWaveform(w) => Some(w.dtype()),
            Value::DigitalWaveform(_) => Some(DType::UInt8),
            Value::Spectrum(s) => Some(s.dtype()),
            Value::XyData(_) => Some(DType::Float64),
            _ => None,
        }
    }

    /// Identity string qualified with the element type where one exists.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.dtype() {
            Some(dtype) => format!("{}<{}>", self.type_name(), dtype),
            None => self.type_name().to_string(),
        }
    }

    /// True for analog, complex and digital waveforms.
    #[must_use]
    pub fn is_waveform(&self) -> bool {
        matches!(
            self,
            Value::AnalogWaveform(_) | Value::ComplexWaveform(_) | Value::DigitalWaveform(_)
        )
    }

    /// Start time of a waveform, when one is set to something other than the epoch.
    #[must_use]
    pub fn waveform_t0(&self) -> Option<BinaryTime> {
        let timing = match self {
            Value::AnalogWaveform(w) => w.timing(),
            Value::ComplexWaveform(w) => w.timing(),
            Value::DigitalWaveform(w) => w.timing,
            _ => None,
        };
        timing.map(|t| t.t0).filter(|t0| !t0.is_epoch())
    }
}

macro_rules! impl_into {
    ($target:ident: $($ty:ty => $variant:path),* $(,)?) => {
        $(
            impl From<$ty> for $target {
                fn from(value: $ty) -> Self {
                    $variant(value.into())
                }
            }
        )*
    };
}

impl_into!(ScalarValue:
    bool => ScalarValue::Bool,
    i32 => ScalarValue::Int32,
    f64 => ScalarValue::Float64,
    String => ScalarValue::String,
    &str => ScalarValue::String,
);

impl_into!(VectorValues:
    Vec<bool> => VectorValues::Bool,
    Vec<i32> => VectorValues::Int32,
    Vec<f64> => VectorValues::Float64,
    Vec<String> => VectorValues::String,
);

impl_into!(Value:
    bool => Value::Bool,
    i32 => Value::Int32,
    f64 => Value::Float64,
    String => Value::String,
    &str => Value::String,
    Scalar => Value::Scalar,
    Vector => Value::Vector,
    AnyAnalogWaveform => Value::AnalogWaveform,
    AnyComplexWaveform => Value::ComplexWaveform,
    DigitalWaveform => Value::DigitalWaveform,
    AnySpectrum => Value::Spectrum,
    XyData<f64> => Value::XyData,
);

impl_into!(AnyAnalogWaveform:
    AnalogWaveform<f64> => AnyAnalogWaveform::Float64,
    AnalogWaveform<i16> => AnyAnalogWaveform::Int16,
    AnalogWaveform<i32> => AnyAnalogWaveform::Int32,
);

impl_into!(AnyComplexWaveform:
    ComplexWaveform<f64> => AnyComplexWaveform::Float64,
    ComplexWaveform<i16> => AnyComplexWaveform::Int16,
);

impl_into!(AnySpectrum:
    Spectrum<f64> => AnySpectrum::Float64,
    Spectrum<f32> => AnySpectrum::Float32,
);

impl_into!(Value:
    AnalogWaveform<f64> => Value::AnalogWaveform,
    AnalogWaveform<i16> => Value::AnalogWaveform,
    AnalogWaveform<i32> => Value::AnalogWaveform,
    ComplexWaveform<f64> => Value::ComplexWaveform,
    ComplexWaveform<i16> => Value::ComplexWaveform,
    Spectrum<f64> => Value::Spectrum,
    Spectrum<f32> => Value::Spectrum,
);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }
}

/// Typed extraction from a [`Value`].
///
/// Used by the read path to assert the caller's expected type.
pub trait FromValue: Sized {
    /// Description of the expected kind, in [`Value::describe`] form.
    const EXPECTED: &'static str;

    /// Extract, handing the value back unchanged on mismatch.
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "datastore_core::value::Value";

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

macro_rules! impl_from_value {
    ($($ty:ty, $expected:expr, $pattern:pat => $out:expr;)*) => {
        $(
            impl FromValue for $ty {
                const EXPECTED: &'static str = $expected;

                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        $pattern => Ok($out),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_from_value! {
    bool, "bool", Value::Bool(v) => v;
    i32, "i32", Value::Int32(v) => v;
    f64, "f64", Value::Float64(v) => v;
    String, "alloc::string::String", Value::String(v) => v;
    Scalar, "datastore_core::value::Scalar", Value::Scalar(v) => v;
    Vector, "datastore_core::value::Vector", Value::Vector(v) => v;
    AnyAnalogWaveform, "datastore_core::waveform::AnalogWaveform", Value::AnalogWaveform(v) => v;
    AnalogWaveform<f64>, "datastore_core::waveform::AnalogWaveform<float64>",
        Value::AnalogWaveform(AnyAnalogWaveform::Float64(v)) => v;
    AnalogWaveform<i16>, "datastore_core::waveform::AnalogWaveform<int16>",
        Value::AnalogWaveform(AnyAnalogWaveform::Int16(v)) => v;
    AnalogWaveform<i32>, "datastore_core::waveform::AnalogWaveform<int32>",
        Value::AnalogWaveform(AnyAnalogWaveform::Int32(v)) => v;
    AnyComplexWaveform, "datastore_core::waveform::ComplexWaveform", Value::ComplexWaveform(v) => v;
    ComplexWaveform<f64>, "datastore_core::waveform::ComplexWaveform<complex128>",
        Value::ComplexWaveform(AnyComplexWaveform::Float64(v)) => v;
    ComplexWaveform<i16>, "datastore_core::waveform::ComplexWaveform<complex_int16>",
        Value::ComplexWaveform(AnyComplexWaveform::Int16(v)) => v;
    DigitalWaveform, "datastore_core::waveform::DigitalWaveform", Value::DigitalWaveform(v) => v;
    AnySpectrum, "datastore_core::waveform::Spectrum", Value::Spectrum(v) => v;
    Spectrum<f64>, "datastore_core::waveform::Spectrum<float64>",
        Value::Spectrum(AnySpectrum::Float64(v)) => v;
    XyData<f64>, "datastore_core::waveform::XyData<float64>", Value::XyData(v) => v;
    Vec<Value>, "alloc::vec::Vec", Value::Sequence(v) => v;
}
