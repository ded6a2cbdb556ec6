//! Waveform, spectrum and XY containers.
//!
//! Each container owns its samples, an optional [`Timing`] and a bag of
//! [`ExtendedProperties`]. Units are stored in the properties under
//! [`UNIT_DESCRIPTION`], matching how the data store keeps them on the wire.

use crate::time::BinaryTime;
use crate::value::{DType, PropertyValue};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Property key holding a waveform's unit description.
pub const UNIT_DESCRIPTION: &str = "NI_UnitDescription";

/// Arbitrary key/value metadata carried alongside a waveform.
pub type ExtendedProperties = BTreeMap<String, PropertyValue>;

/// Errors raised when constructing a container with inconsistent data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaveformError {
    /// Sample buffer does not divide evenly into the declared shape.
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
}

/// Start time and sample interval of a regularly sampled waveform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    /// Time of the first sample.
    pub t0: BinaryTime,
    /// Seconds between samples.
    pub sample_interval: f64,
}

impl Timing {
    /// Timing with both a start time and an interval.
    #[must_use]
    pub fn new(t0: BinaryTime, sample_interval: f64) -> Self {
        Self { t0, sample_interval }
    }

    /// Timing with an interval but no absolute start time.
    #[must_use]
    pub fn with_interval(sample_interval: f64) -> Self {
        Self {
            t0: BinaryTime::default(),
            sample_interval,
        }
    }
}

fn units_of(properties: &ExtendedProperties) -> &str {
    match properties.get(UNIT_DESCRIPTION) {
        Some(PropertyValue::String(units)) => units,
        _ => "",
    }
}

fn set_units_in(properties: &mut ExtendedProperties, units: impl Into<String>) {
    properties.insert(UNIT_DESCRIPTION.to_string(), PropertyValue::String(units.into()));
}

macro_rules! impl_timed {
    ($ty:ident $(<$param:ident>)?) => {
        impl$(<$param>)? $ty$(<$param>)? {
            /// Attach timing information.
            #[must_use]
            pub fn with_timing(mut self, timing: Timing) -> Self {
                self.timing = Some(timing);
                self
            }

            /// Start time, if timing is present and t0 is not the epoch.
            #[must_use]
            pub fn t0(&self) -> Option<BinaryTime> {
                self.timing.map(|t| t.t0).filter(|t0| !t0.is_epoch())
            }

            /// Unit description, empty when unset.
            #[must_use]
            pub fn units(&self) -> &str {
                units_of(&self.extended_properties)
            }

            /// Set the unit description.
            pub fn set_units(&mut self, units: impl Into<String>) {
                set_units_in(&mut self.extended_properties, units);
            }
        }
    };
}

/// Real-valued sampled waveform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalogWaveform<T> {
    /// Samples in acquisition order.
    pub samples: Vec<T>,
    /// Sampling information, `None` when the waveform is untimed.
    pub timing: Option<Timing>,
    /// Free-form metadata, including units.
    pub extended_properties: ExtendedProperties,
}

impl<T> AnalogWaveform<T> {
    /// Untimed waveform over the given samples.
    #[must_use]
    pub fn new(samples: Vec<T>) -> Self {
        Self {
            samples,
            timing: None,
            extended_properties: ExtendedProperties::new(),
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl_timed!(AnalogWaveform<T>);

/// Complex-valued sampled waveform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplexWaveform<T> {
    /// Samples in acquisition order.
    pub samples: Vec<Complex<T>>,
    /// Sampling information, `None` when the waveform is untimed.
    pub timing: Option<Timing>,
    /// Free-form metadata, including units.
    pub extended_properties: ExtendedProperties,
}

impl<T> ComplexWaveform<T> {
    /// Untimed waveform over the given samples.
    #[must_use]
    pub fn new(samples: Vec<Complex<T>>) -> Self {
        Self {
            samples,
            timing: None,
            extended_properties: ExtendedProperties::new(),
        }
    }

    /// Number of samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl_timed!(ComplexWaveform<T>);

/// Multi-line digital waveform.
///
/// `data` holds `sample_count * signal_count` line states in sample-major
/// order: the first `signal_count` bytes are every line's state at sample 0.
/// States are stored as raw bytes; boolean lines are stored as 0 or 1.
///
/// The wire message carries bytes only, so a waveform built with
/// [`from_bools`](Self::from_bools) reads back as 0/1 byte states. Use
/// [`to_bools`](Self::to_bools) to view them as booleans again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DigitalWaveform {
    /// Line states, sample-major.
    pub data: Vec<u8>,
    /// Number of digital lines per sample.
    pub signal_count: usize,
    /// Sampling information, `None` when the waveform is untimed.
    pub timing: Option<Timing>,
    /// Free-form metadata.
    pub extended_properties: ExtendedProperties,
}

impl DigitalWaveform {
    /// Build from flat sample-major states.
    pub fn from_states(data: Vec<u8>, signal_count: usize) -> Result<Self, WaveformError> {
        if signal_count == 0 && !data.is_empty() {
            return Err(WaveformError::InvalidShape(format!(
                "{} digital states with zero signals",
                data.len()
            )));
        }
        if signal_count != 0 && data.len() % signal_count != 0 {
            return Err(WaveformError::InvalidShape(format!(
                "{} digital states is not a multiple of {} signals",
                data.len(),
                signal_count
            )));
        }
        Ok(Self {
            data,
            signal_count,
            timing: None,
            extended_properties: ExtendedProperties::new(),
        })
    }

    /// Build from boolean line states, stored as 0/1.
    pub fn from_bools(states: &[bool], signal_count: usize) -> Result<Self, WaveformError> {
        Self::from_states(states.iter().map(|&s| u8::from(s)).collect(), signal_count)
    }

    /// Line states as booleans; any non-zero state is `true`.
    #[must_use]
    pub fn to_bools(&self) -> Vec<bool> {
        self.data.iter().map(|&s| s != 0).collect()
    }

    /// Number of samples.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        if self.signal_count == 0 {
            0
        } else {
            self.data.len() / self.signal_count
        }
    }

    /// States of every line at one sample.
    #[must_use]
    pub fn sample(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.signal_count)?;
        self.data.get(start..start + self.signal_count)
    }

    /// Attach timing information.
    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Start time, if timing is present and t0 is not the epoch.
    #[must_use]
    pub fn t0(&self) -> Option<BinaryTime> {
        self.timing.map(|t| t.t0).filter(|t0| !t0.is_epoch())
    }
}

/// Frequency-domain data over a regular frequency axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Spectrum<T> {
    /// Magnitudes, one per frequency bin.
    pub data: Vec<T>,
    /// Frequency of the first bin in Hz.
    pub start_frequency: f64,
    /// Spacing between bins in Hz.
    pub frequency_increment: f64,
    /// Free-form metadata, including units.
    pub extended_properties: ExtendedProperties,
}

impl<T> Spectrum<T> {
    /// Spectrum starting at `start_frequency` with `frequency_increment` spacing.
    #[must_use]
    pub fn new(data: Vec<T>, start_frequency: f64, frequency_increment: f64) -> Self {
        Self {
            data,
            start_frequency,
            frequency_increment,
            extended_properties: ExtendedProperties::new(),
        }
    }

    /// Unit description, empty when unset.
    #[must_use]
    pub fn units(&self) -> &str {
        units_of(&self.extended_properties)
    }

    /// Set the unit description.
    pub fn set_units(&mut self, units: impl Into<String>) {
        set_units_in(&mut self.extended_properties, units);
    }
}

/// Paired X/Y samples with independent units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XyData<T> {
    /// X coordinates.
    pub x_data: Vec<T>,
    /// Y coordinates, same length as `x_data`.
    pub y_data: Vec<T>,
    /// Units of the X axis.
    pub x_units: String,
    /// Units of the Y axis.
    pub y_units: String,
}

impl<T> XyData<T> {
    /// Pair two equally long coordinate arrays.
    pub fn new(x_data: Vec<T>, y_data: Vec<T>) -> Result<Self, WaveformError> {
        if x_data.len() != y_data.len() {
            return Err(WaveformError::InvalidShape(format!(
                "x has {} points but y has {}",
                x_data.len(),
                y_data.len()
            )));
        }
        Ok(Self {
            x_data,
            y_data,
            x_units: String::new(),
            y_units: String::new(),
        })
    }

    /// Set both axis units.
    #[must_use]
    pub fn with_units(mut self, x_units: impl Into<String>, y_units: impl Into<String>) -> Self {
        self.x_units = x_units.into();
        self.y_units = y_units.into();
        self
    }
}

/// Analog waveform of any supported sample type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnyAnalogWaveform {
    /// 64-bit float samples.
    Float64(AnalogWaveform<f64>),
    /// 16-bit integer samples.
    Int16(AnalogWaveform<i16>),
    /// 32-bit integer samples. Not publishable.
    Int32(AnalogWaveform<i32>),
}

impl AnyAnalogWaveform {
    /// Sample type.
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Float64(_) => DType::Float64,
            Self::Int16(_) => DType::Int16,
            Self::Int32(_) => DType::Int32,
        }
    }

    /// Timing shared by every variant.
    #[must_use]
    pub fn timing(&self) -> Option<Timing> {
        match self {
            Self::Float64(w) => w.timing,
            Self::Int16(w) => w.timing,
            Self::Int32(w) => w.timing,
        }
    }
}

/// Complex waveform of any supported sample type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnyComplexWaveform {
    /// Complex 64-bit float samples.
    Float64(ComplexWaveform<f64>),
    /// Complex 16-bit integer samples.
    Int16(ComplexWaveform<i16>),
}

impl AnyComplexWaveform {
    /// Sample type.
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Float64(_) => DType::ComplexFloat64,
            Self::Int16(_) => DType::ComplexInt16,
        }
    }

    /// Timing shared by every variant.
    #[must_use]
    pub fn timing(&self) -> Option<Timing> {
        match self {
            Self::Float64(w) => w.timing,
            Self::Int16(w) => w.timing,
        }
    }
}

/// Spectrum of any supported sample type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnySpectrum {
    /// 64-bit float bins.
    Float64(Spectrum<f64>),
    /// 32-bit float bins. Not publishable.
    Float32(Spectrum<f32>),
}

impl AnySpectrum {
    /// Bin type.
    #[must_use]
    pub fn dtype(&self) -> DType {
        match self {
            Self::Float64(_) => DType::Float64,
            Self::Float32(_) => DType::Float32,
        }
    }
}
