//! `datastore-core`
//!
//! Native value types shared by the data store client crates.
//!
//! This crate has no knowledge of protobuf or gRPC. It defines the values a
//! caller publishes and reads back, the waveform containers, the NI binary
//! time representation, and the record types returned by the data and
//! metadata services.
//!
//! ## Key Types
//!
//! - [`Value`]: Every publishable/readable value, tagged by kind and dtype
//! - [`BinaryTime`]: Seconds since 1904-01-01 UTC with 2^-64 fractional precision
//! - [`waveform::AnalogWaveform`], [`waveform::ComplexWaveform`],
//!   [`waveform::DigitalWaveform`], [`waveform::Spectrum`], [`waveform::XyData`]
//! - [`records`] and [`metadata`]: Records returned by the services

pub mod metadata;
pub mod records;
pub mod time;
pub mod value;
pub mod waveform;

pub use time::BinaryTime;
pub use value::{DType, FromValue, PropertyValue, Scalar, ScalarValue, Value, Vector, VectorValues};
pub use waveform::{
    AnalogWaveform, AnyAnalogWaveform, AnyComplexWaveform, AnySpectrum, DigitalWaveform,
    ExtendedProperties, Spectrum, Timing, WaveformError, XyData,
};
