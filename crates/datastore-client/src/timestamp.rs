//! Publish timestamp selection.

use datastore_core::{BinaryTime, Value};

use crate::error::{ClientError, Result};

/// Timestamp to send with a published measurement.
///
/// A waveform that carries its own start time is stamped with it; an
/// explicit timestamp must then agree exactly. Everything else uses the
/// explicit timestamp, or `now()` when there is none. Unset (epoch) values
/// on either side count as absent.
pub fn reconcile_publish_timestamp(
    value: &Value,
    explicit: Option<BinaryTime>,
    now: impl FnOnce() -> BinaryTime,
) -> Result<BinaryTime> {
    let explicit = explicit.filter(|t| !t.is_epoch());
    match (value.waveform_t0(), explicit) {
        (Some(t0), None) => Ok(t0),
        (Some(t0), Some(timestamp)) if t0 == timestamp => Ok(t0),
        (Some(t0), Some(timestamp)) => Err(ClientError::TimestampConflict {
            waveform_t0: t0,
            timestamp,
        }),
        (None, Some(timestamp)) => Ok(timestamp),
        (None, None) => Ok(now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datastore_core::{AnalogWaveform, AnyAnalogWaveform, Timing};

    const NOW: BinaryTime = BinaryTime::new(3_900_000_000, 0);

    fn waveform_at(t0: BinaryTime) -> Value {
        let waveform = AnalogWaveform::new(vec![1.0, 2.0]).with_timing(Timing::new(t0, 1e-3));
        Value::AnalogWaveform(AnyAnalogWaveform::Float64(waveform))
    }

    #[test]
    fn test_plain_value_uses_explicit_or_now() {
        let explicit = BinaryTime::new(3_800_000_000, 5);
        let value = Value::Float64(1.5);
        assert_eq!(reconcile_publish_timestamp(&value, None, || NOW).unwrap(), NOW);
        assert_eq!(
            reconcile_publish_timestamp(&value, Some(explicit), || NOW).unwrap(),
            explicit
        );
    }

    #[test]
    fn test_waveform_t0_used_without_explicit() {
        let t0 = BinaryTime::new(3_850_000_000, 1 << 63);
        let stamped = reconcile_publish_timestamp(&waveform_at(t0), None, || NOW).unwrap();
        assert_eq!(stamped, t0);
    }

    #[test]
    fn test_waveform_matching_explicit_is_accepted() {
        let t0 = BinaryTime::new(3_850_000_000, 42);
        let stamped = reconcile_publish_timestamp(&waveform_at(t0), Some(t0), || NOW).unwrap();
        assert_eq!(stamped, t0);
    }

    #[test]
    fn test_waveform_mismatched_explicit_is_rejected() {
        let t0 = BinaryTime::new(3_850_000_000, 42);
        let other = BinaryTime::new(3_850_000_001, 42);
        match reconcile_publish_timestamp(&waveform_at(t0), Some(other), || NOW) {
            Err(ClientError::TimestampConflict {
                waveform_t0,
                timestamp,
            }) => {
                assert_eq!(waveform_t0, t0);
                assert_eq!(timestamp, other);
            }
            other => panic!("expected TimestampConflict, got {other:?}"),
        }
    }

    #[test]
    fn test_waveform_without_t0_behaves_like_plain_value() {
        let untimed = Value::AnalogWaveform(AnyAnalogWaveform::Float64(AnalogWaveform::new(vec![
            1.0,
        ])));
        assert_eq!(reconcile_publish_timestamp(&untimed, None, || NOW).unwrap(), NOW);
        let epoch = waveform_at(BinaryTime::default());
        let explicit = BinaryTime::new(3_800_000_000, 0);
        assert_eq!(
            reconcile_publish_timestamp(&epoch, Some(explicit), || NOW).unwrap(),
            explicit
        );
    }
}
