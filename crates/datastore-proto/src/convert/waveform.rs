//! Waveform, spectrum and XY message conversions.
//!
//! Timing maps onto the `t0`/`dt` pair: an untimed waveform is sent with no
//! `t0` and `dt == 0`, and a message with either field set reads back as timed.
//! Complex samples are interleaved `[re0, im0, re1, im1, ...]`.

use super::{
    attributes_from_proto, attributes_to_proto, string_attributes, ConversionError, ToDomain,
    TryToDomain,
};
use crate::types;
use datastore_core::value::DType;
use datastore_core::waveform::{
    AnalogWaveform, ComplexWaveform, DigitalWaveform, Spectrum, Timing, XyData,
};
use num_complex::Complex;

/// Attribute key for the X axis units of XY data.
pub const X_UNIT_DESCRIPTION: &str = "NI_UnitDescription_X";
/// Attribute key for the Y axis units of XY data.
pub const Y_UNIT_DESCRIPTION: &str = "NI_UnitDescription_Y";

fn timing_to_proto(timing: Option<Timing>) -> (Option<types::PrecisionTimestamp>, f64) {
    match timing {
        Some(t) => (Some(t.t0.into()), t.sample_interval),
        None => (None, 0.0),
    }
}

fn timing_from_proto(t0: Option<types::PrecisionTimestamp>, dt: f64) -> Option<Timing> {
    if t0.is_none() && dt == 0.0 {
        return None;
    }
    Some(Timing {
        t0: t0.map(ToDomain::to_domain).unwrap_or_default(),
        sample_interval: dt,
    })
}

fn narrow_i16(value: i32) -> Result<i16, ConversionError> {
    i16::try_from(value).map_err(|_| ConversionError::ValueOutOfRange {
        value: i64::from(value),
        target: DType::Int16,
    })
}

fn interleave<T: Copy, W>(samples: &[Complex<T>], widen: impl Fn(T) -> W) -> Vec<W> {
    samples
        .iter()
        .flat_map(|c| [widen(c.re), widen(c.im)])
        .collect()
}

fn deinterleave<W: Copy, T>(
    y_data: &[W],
    narrow: impl Fn(W) -> Result<T, ConversionError>,
) -> Result<Vec<Complex<T>>, ConversionError> {
    if y_data.len() % 2 != 0 {
        return Err(ConversionError::InvalidShape(format!(
            "interleaved complex data has odd length {}",
            y_data.len()
        )));
    }
    y_data
        .chunks_exact(2)
        .map(|pair| Ok(Complex::new(narrow(pair[0])?, narrow(pair[1])?)))
        .collect()
}

// Analog

impl From<&AnalogWaveform<f64>> for types::DoubleAnalogWaveform {
    fn from(waveform: &AnalogWaveform<f64>) -> Self {
        let (t0, dt) = timing_to_proto(waveform.timing);
        types::DoubleAnalogWaveform {
            t0,
            dt,
            y_data: waveform.samples.clone(),
            attributes: attributes_to_proto(&waveform.extended_properties),
        }
    }
}

impl ToDomain<AnalogWaveform<f64>> for types::DoubleAnalogWaveform {
    fn to_domain(self) -> AnalogWaveform<f64> {
        AnalogWaveform {
            timing: timing_from_proto(self.t0, self.dt),
            samples: self.y_data,
            extended_properties: attributes_from_proto(self.attributes),
        }
    }
}

impl From<&AnalogWaveform<i16>> for types::I16AnalogWaveform {
    fn from(waveform: &AnalogWaveform<i16>) -> Self {
        let (t0, dt) = timing_to_proto(waveform.timing);
        types::I16AnalogWaveform {
            t0,
            dt,
            y_data: waveform.samples.iter().map(|&s| i32::from(s)).collect(),
            attributes: attributes_to_proto(&waveform.extended_properties),
        }
    }
}

impl TryToDomain<AnalogWaveform<i16>> for types::I16AnalogWaveform {
    fn try_to_domain(self) -> Result<AnalogWaveform<i16>, ConversionError> {
        Ok(AnalogWaveform {
            timing: timing_from_proto(self.t0, self.dt),
            samples: self
                .y_data
                .into_iter()
                .map(narrow_i16)
                .collect::<Result<_, _>>()?,
            extended_properties: attributes_from_proto(self.attributes),
        })
    }
}

// Complex

impl From<&ComplexWaveform<f64>> for types::DoubleComplexWaveform {
    fn from(waveform: &ComplexWaveform<f64>) -> Self {
        let (t0, dt) = timing_to_proto(waveform.timing);
        types::DoubleComplexWaveform {
            t0,
            dt,
            y_data: interleave(&waveform.samples, |v| v),
            attributes: attributes_to_proto(&waveform.extended_properties),
        }
    }
}

impl TryToDomain<ComplexWaveform<f64>> for types::DoubleComplexWaveform {
    fn try_to_domain(self) -> Result<ComplexWaveform<f64>, ConversionError> {
        Ok(ComplexWaveform {
            samples: deinterleave(&self.y_data, Ok)?,
            timing: timing_from_proto(self.t0, self.dt),
            extended_properties: attributes_from_proto(self.attributes),
        })
    }
}

impl From<&ComplexWaveform<i16>> for types::I16ComplexWaveform {
    fn from(waveform: &ComplexWaveform<i16>) -> Self {
        let (t0, dt) = timing_to_proto(waveform.timing);
        types::I16ComplexWaveform {
            t0,
            dt,
            y_data: interleave(&waveform.samples, i32::from),
            attributes: attributes_to_proto(&waveform.extended_properties),
        }
    }
}

impl TryToDomain<ComplexWaveform<i16>> for types::I16ComplexWaveform {
    fn try_to_domain(self) -> Result<ComplexWaveform<i16>, ConversionError> {
        Ok(ComplexWaveform {
            samples: deinterleave(&self.y_data, narrow_i16)?,
            timing: timing_from_proto(self.t0, self.dt),
            extended_properties: attributes_from_proto(self.attributes),
        })
    }
}

// Digital

impl TryFrom<&DigitalWaveform> for types::DigitalWaveform {
    type Error = ConversionError;

    fn try_from(waveform: &DigitalWaveform) -> Result<Self, ConversionError> {
        let signal_count = i32::try_from(waveform.signal_count).map_err(|_| {
            ConversionError::InvalidShape(format!(
                "signal count {} does not fit the wire format",
                waveform.signal_count
            ))
        })?;
        let (t0, dt) = timing_to_proto(waveform.timing);
        Ok(types::DigitalWaveform {
            t0,
            dt,
            y_data: waveform.data.clone(),
            signal_count,
            attributes: attributes_to_proto(&waveform.extended_properties),
        })
    }
}

impl TryToDomain<DigitalWaveform> for types::DigitalWaveform {
    fn try_to_domain(self) -> Result<DigitalWaveform, ConversionError> {
        let signal_count = usize::try_from(self.signal_count).map_err(|_| {
            ConversionError::InvalidShape(format!("negative signal count {}", self.signal_count))
        })?;
        let mut waveform = DigitalWaveform::from_states(self.y_data, signal_count)?;
        waveform.timing = timing_from_proto(self.t0, self.dt);
        waveform.extended_properties = attributes_from_proto(self.attributes);
        Ok(waveform)
    }
}

// Spectrum

impl From<&Spectrum<f64>> for types::DoubleSpectrum {
    fn from(spectrum: &Spectrum<f64>) -> Self {
        types::DoubleSpectrum {
            start_frequency: spectrum.start_frequency,
            frequency_increment: spectrum.frequency_increment,
            data: spectrum.data.clone(),
            attributes: attributes_to_proto(&spectrum.extended_properties),
        }
    }
}

impl ToDomain<Spectrum<f64>> for types::DoubleSpectrum {
    fn to_domain(self) -> Spectrum<f64> {
        Spectrum {
            data: self.data,
            start_frequency: self.start_frequency,
            frequency_increment: self.frequency_increment,
            extended_properties: attributes_from_proto(self.attributes),
        }
    }
}

// XY data

impl From<&XyData<f64>> for types::DoubleXyData {
    fn from(xy: &XyData<f64>) -> Self {
        types::DoubleXyData {
            x_data: xy.x_data.clone(),
            y_data: xy.y_data.clone(),
            attributes: string_attributes(&[
                (X_UNIT_DESCRIPTION, xy.x_units.as_str()),
                (Y_UNIT_DESCRIPTION, xy.y_units.as_str()),
            ]),
        }
    }
}
