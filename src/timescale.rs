//! Conversion between UTC calendar time and continuous TAI seconds.
//!
//! All leap second bookkeeping happens here so arithmetic on [Time64](crate::Time64) values
//! is plain addition and subtraction.
#[cfg(feature = "hifitime")]
mod hifi;

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use typed_builder::TypedBuilder;

use crate::error::{Error, LeapsecError, Result};
use crate::leapsecs::{LeapsecTable, TAI_ZERO_UNIX_SECS};

#[cfg(feature = "hifitime")]
pub use hifi::HifiTimeScale;

pub(crate) const NANOS_PER_SEC: u32 = 1_000_000_000;

/// An instant on the TAI time scale as whole seconds since the TAI zero point
/// (Jan 1, 1972 00:00:00 TAI) plus a sub-second part.
///
/// Deserializing rejects a sub-second part of 1s or more rather than carrying it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTaiInstant")]
pub struct TaiInstant {
    seconds: i64,
    nanos: u32,
}

#[derive(Deserialize)]
struct RawTaiInstant {
    seconds: i64,
    nanos: u32,
}

impl TryFrom<RawTaiInstant> for TaiInstant {
    type Error = String;

    fn try_from(raw: RawTaiInstant) -> std::result::Result<Self, Self::Error> {
        if raw.nanos >= NANOS_PER_SEC {
            return Err(format!("TAI nanos must be < {NANOS_PER_SEC}; got {}", raw.nanos));
        }
        Ok(TaiInstant {
            seconds: raw.seconds,
            nanos: raw.nanos,
        })
    }
}

impl TaiInstant {
    /// Create an instant, carrying any whole seconds in `nanos` into `seconds`.
    ///
    /// The carry saturates at [i64::MAX] seconds.
    #[must_use]
    pub const fn new(seconds: i64, nanos: u32) -> Self {
        TaiInstant {
            seconds: seconds.saturating_add((nanos / NANOS_PER_SEC) as i64),
            nanos: nanos % NANOS_PER_SEC,
        }
    }

    /// Create an instant from a sub-second part given in microseconds.
    ///
    /// The carry saturates at [i64::MAX] seconds.
    #[must_use]
    pub const fn from_micros(seconds: i64, micros: u32) -> Self {
        let nanos = micros as u64 * 1_000;
        TaiInstant {
            seconds: seconds.saturating_add((nanos / NANOS_PER_SEC as u64) as i64),
            nanos: (nanos % NANOS_PER_SEC as u64) as u32,
        }
    }

    #[must_use]
    pub const fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Sub-second part in nanoseconds, always less than 1s.
    #[must_use]
    pub const fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Sub-second part as a fraction of a second in [0, 1).
    #[must_use]
    pub fn fraction(&self) -> f64 {
        f64::from(self.nanos) / f64::from(NANOS_PER_SEC)
    }
}

/// Converts between calendar timestamps and [TaiInstant]s.
///
/// Implementations own the leap second history; callers never adjust for leap seconds
/// themselves.
pub trait TimeScale {
    /// Convert a UTC calendar timestamp to TAI.
    ///
    /// # Errors
    /// Implementation specific, e.g., the time is outside the range of its leap second data.
    fn to_tai(&self, utc: &DateTime<Utc>) -> Result<TaiInstant>;

    /// Convert a TAI instant to a UTC calendar timestamp.
    ///
    /// # Errors
    /// Implementation specific. [Error::Unrepresentable] if the result is outside the range
    /// of a calendar timestamp.
    fn from_tai(&self, tai: TaiInstant) -> Result<DateTime<Utc>>;
}

/// [TimeScale] backed by a [LeapsecTable].
///
/// Times outside of the table are converted on a best-effort basis by default: before the
/// first record the first record's offset is used and after the table expiration the last
/// record's offset is used, in both cases logging a warning. Either case can instead be made
/// an error.
///
/// # Example
/// ```
/// use time64::{LeapsecTable, UtcTai};
///
/// let strict = UtcTai::builder()
///     .table(LeapsecTable::builtin())
///     .ignore_expired(false)
///     .build();
/// ```
#[derive(Clone, Debug, TypedBuilder)]
pub struct UtcTai {
    /// Leap second history. Defaults to the snapshot compiled into this crate.
    #[builder(default = LeapsecTable::builtin())]
    table: LeapsecTable,
    /// When false, times at or after the table expiration are [LeapsecError::Expired].
    #[builder(default = true)]
    ignore_expired: bool,
    /// When false, times before the first table record are [LeapsecError::OutOfRange].
    #[builder(default = true)]
    ignore_out_of_range: bool,
}

impl Default for UtcTai {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl UtcTai {
    #[must_use]
    pub fn table(&self) -> &LeapsecTable {
        &self.table
    }

    fn check_expired(&self, utc: i64) -> Result<()> {
        if !self.table.is_expired(utc) {
            return Ok(());
        }
        if !self.ignore_expired {
            return Err(LeapsecError::Expired.into());
        }
        warn!(
            utc_secs = utc,
            "time is after leap second table expiration; result may be off by missing leap seconds"
        );
        Ok(())
    }

    fn out_of_range(&self, err: LeapsecError) -> Result<i32> {
        if !self.ignore_out_of_range {
            return Err(err.into());
        }
        warn!("time is before the leap second table; using TAI - UTC of the first record");
        Ok(self.table.first_leaps())
    }
}

impl TimeScale for UtcTai {
    /// A chrono leap second (23:59:59 with nanoseconds >= 1s) maps to the TAI second between
    /// 23:59:59 and 00:00:00. A chrono leap second on any second the table has no insertion
    /// after is folded into the following second, with a warning.
    fn to_tai(&self, utc: &DateTime<Utc>) -> Result<TaiInstant> {
        let secs = utc.timestamp();
        let (leap, nanos) = match utc.timestamp_subsec_nanos() {
            n if n >= NANOS_PER_SEC => {
                if !self.table.is_leap_second_utc(secs) {
                    warn!(
                        utc_secs = secs,
                        "leap second not in leap second table; folding into the next second"
                    );
                }
                (1, n - NANOS_PER_SEC)
            }
            n => (0, n),
        };

        self.check_expired(secs)?;
        let leaps = match self.table.leaps_utc(secs) {
            Ok(leaps) => leaps,
            Err(err) => self.out_of_range(err)?,
        };

        let tai = TaiInstant::new(secs - TAI_ZERO_UNIX_SECS + i64::from(leaps) + leap, nanos);
        trace!(utc = %utc, leaps, tai = tai.seconds, "utc to tai");
        Ok(tai)
    }

    fn from_tai(&self, tai: TaiInstant) -> Result<DateTime<Utc>> {
        let (secs, nanos) = match self.table.leap_second_at_tai(tai.seconds) {
            Some(secs) => (secs, tai.nanos + NANOS_PER_SEC),
            None => {
                let leaps = match self.table.leaps_tai(tai.seconds) {
                    Ok(leaps) => leaps,
                    Err(err) => self.out_of_range(err)?,
                };
                let secs = tai
                    .seconds
                    .checked_sub(i64::from(leaps))
                    .and_then(|s| s.checked_add(TAI_ZERO_UNIX_SECS))
                    .ok_or(Error::Unrepresentable)?;
                (secs, tai.nanos)
            }
        };

        self.check_expired(secs)?;
        DateTime::from_timestamp(secs, nanos).ok_or(Error::Unrepresentable)
    }
}

/// Shared converter using the builtin leap second table and best-effort defaults.
pub(crate) fn default_scale() -> &'static UtcTai {
    static SCALE: OnceLock<UtcTai> = OnceLock::new();
    SCALE.get_or_init(UtcTai::default)
}
