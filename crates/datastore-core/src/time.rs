//! NI binary time.
//!
//! The data store represents every instant as a signed count of whole seconds
//! since 1904-01-01T00:00:00Z plus an unsigned fraction of a second measured in
//! units of 2^-64 s. [`BinaryTime`] carries that pair unchanged so values read
//! back from the wire compare equal to what was published.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds between the NI epoch (1904-01-01) and the Unix epoch (1970-01-01).
pub const NI_EPOCH_OFFSET_SECONDS: i64 = 2_082_844_800;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// An instant in NI binary time.
///
/// The default value (both fields zero) is the NI epoch itself and is treated
/// as "unset" wherever a waveform start time is inspected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BinaryTime {
    /// Whole seconds since 1904-01-01T00:00:00Z.
    pub seconds: i64,
    /// Fraction of a second in units of 2^-64 s.
    pub fractional_seconds: u64,
}

impl BinaryTime {
    /// Build a binary time from its raw wire fields.
    pub const fn new(seconds: i64, fractional_seconds: u64) -> Self {
        Self {
            seconds,
            fractional_seconds,
        }
    }

    /// The current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// True for the NI epoch, which stands in for "no start time".
    #[must_use]
    pub fn is_epoch(&self) -> bool {
        self.seconds == 0 && self.fractional_seconds == 0
    }

    /// Convert to a UTC datetime, rounding the fraction to the nearest nanosecond.
    ///
    /// Instants outside chrono's representable range saturate to its bounds.
    #[must_use]
    pub fn to_datetime(&self) -> DateTime<Utc> {
        let mut unix_seconds = self.seconds.saturating_sub(NI_EPOCH_OFFSET_SECONDS);
        let rounded =
            (u128::from(self.fractional_seconds) * NANOS_PER_SECOND + (1u128 << 63)) >> 64;
        let mut nanos = rounded as u32;
        if u128::from(nanos) >= NANOS_PER_SECOND {
            unix_seconds = unix_seconds.saturating_add(1);
            nanos = 0;
        }
        match Utc.timestamp_opt(unix_seconds, nanos).single() {
            Some(dt) => dt,
            None if unix_seconds < 0 => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

impl From<DateTime<Utc>> for BinaryTime {
    fn from(dt: DateTime<Utc>) -> Self {
        // Leap-second nanos (>= 1e9) collapse onto the last representable instant.
        let nanos = u128::from(dt.timestamp_subsec_nanos()).min(NANOS_PER_SECOND - 1);
        Self {
            seconds: dt.timestamp() + NI_EPOCH_OFFSET_SECONDS,
            fractional_seconds: ((nanos << 64) / NANOS_PER_SECOND) as u64,
        }
    }
}

impl From<BinaryTime> for DateTime<Utc> {
    fn from(time: BinaryTime) -> Self {
        time.to_datetime()
    }
}

impl fmt::Display for BinaryTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.to_datetime()
                .to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
        )
    }
}
