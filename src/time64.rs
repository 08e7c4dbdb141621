//! ITS certificate `Time64` values and their wire encoding.
//!
//! Reference: ETSI TS 103 097, `Time64`.
use std::fmt::Display;
use std::io::{ErrorKind, Read, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::epoch::CertificateVersion;
use crate::timescale::{default_scale, TaiInstant, TimeScale};
use crate::{Error, Result};

/// Number of International Atomic Time (TAI) microseconds since a certificate version epoch.
///
/// The epoch is not part of the value; the same count means a different calendar time for
/// each [CertificateVersion] so the version must be provided for any calendar conversion.
/// Conversion from a calendar time is lossy, anything below a microsecond is truncated.
///
/// # Example
/// ```
/// use time64::{CertificateVersion, Time64};
///
/// let epoch = "2010-01-01T00:00:01.5Z".parse().unwrap();
/// let time = Time64::from_datetime(CertificateVersion::V1, &epoch).unwrap();
///
/// assert_eq!(time.elapsed_micros(), 1_500_000);
/// assert_eq!(time.to_bytes(), [0, 0, 0, 0, 0, 0x16, 0xe3, 0x60]);
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Time64(u64);

impl Time64 {
    /// Size of an encoded ``Time64``
    pub const LEN: usize = 8;
    /// Resolution of a ``Time64``
    pub const MICROS_PER_SEC: u64 = 1_000_000;

    /// Create from a raw number of elapsed microseconds.
    #[must_use]
    pub const fn from_elapsed(micros: u64) -> Self {
        Time64(micros)
    }

    /// Number of microseconds elapsed since the epoch.
    #[must_use]
    pub const fn elapsed_micros(self) -> u64 {
        self.0
    }

    /// Convert a calendar timestamp using the builtin leap second table.
    ///
    /// # Errors
    /// See [Time64::from_datetime_with].
    pub fn from_datetime(version: CertificateVersion, utc: &DateTime<Utc>) -> Result<Self> {
        Self::from_datetime_with(version, utc, default_scale())
    }

    /// Convert a calendar timestamp using `scale` for the UTC to TAI conversion.
    ///
    /// # Errors
    /// [Error::Underflow] if `utc` is before the epoch for `version`, [Error::Overflow] if the
    /// number of microseconds does not fit in 64 bits, or any error from `scale`.
    pub fn from_datetime_with(
        version: CertificateVersion,
        utc: &DateTime<Utc>,
        scale: &dyn TimeScale,
    ) -> Result<Self> {
        let tai = scale.to_tai(utc)?;
        let secs = tai
            .seconds()
            .checked_sub(version.epoch_base_seconds())
            .ok_or(Error::Underflow)?;
        let secs = u64::try_from(secs).map_err(|_| Error::Underflow)?;

        let micros = secs
            .checked_mul(Self::MICROS_PER_SEC)
            .and_then(|m| m.checked_add(u64::from(tai.nanos() / 1_000)))
            .ok_or(Error::Overflow)?;
        trace!(%version, micros, "time64 from {utc}");
        Ok(Time64(micros))
    }

    /// The current system time.
    ///
    /// # Errors
    /// See [Time64::from_datetime_with].
    pub fn now(version: CertificateVersion) -> Result<Self> {
        Self::from_datetime(version, &Utc::now())
    }

    /// Convert to a calendar timestamp using the builtin leap second table.
    ///
    /// # Errors
    /// See [Time64::to_datetime_with].
    pub fn to_datetime(self, version: CertificateVersion) -> Result<DateTime<Utc>> {
        self.to_datetime_with(version, default_scale())
    }

    /// Convert to a calendar timestamp, interpreting this value relative to the epoch for
    /// `version` and using `scale` for the TAI to UTC conversion.
    ///
    /// # Errors
    /// [Error::Unrepresentable] if the time is too far in the future for a calendar
    /// timestamp, or any error from `scale`.
    pub fn to_datetime_with(
        self,
        version: CertificateVersion,
        scale: &dyn TimeScale,
    ) -> Result<DateTime<Utc>> {
        let secs = i64::try_from(self.0 / Self::MICROS_PER_SEC)
            .ok()
            .and_then(|s| s.checked_add(version.epoch_base_seconds()))
            .ok_or(Error::Unrepresentable)?;
        // remainder is microseconds, always < 1_000_000
        let micros = (self.0 % Self::MICROS_PER_SEC) as u32;

        scale.from_tai(TaiInstant::from_micros(secs, micros))
    }

    /// Big-endian wire bytes.
    #[must_use]
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Decode from the first [Time64::LEN] bytes of `buf`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `buf` is too short.
    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        match buf.first_chunk::<8>() {
            Some(bytes) => Ok(Time64(u64::from_be_bytes(*bytes))),
            None => Err(Error::NotEnoughData {
                actual: buf.len(),
                minimum: Self::LEN,
            }),
        }
    }

    /// Write exactly [Time64::LEN] bytes to `w`.
    ///
    /// # Errors
    /// Any ``std::io::Error`` writing
    pub fn encode<W: Write>(&self, mut w: W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Read exactly [Time64::LEN] bytes from `r`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `r` ends before all bytes are read, otherwise any
    /// ``std::io::Error`` reading.
    pub fn decode<R: Read>(mut r: R) -> Result<Self> {
        let mut buf = [0u8; Self::LEN];
        let mut actual = 0;
        while actual < Self::LEN {
            match r.read(&mut buf[actual..]) {
                Ok(0) => {
                    return Err(Error::NotEnoughData {
                        actual,
                        minimum: Self::LEN,
                    })
                }
                Ok(n) => actual += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(Time64(u64::from_be_bytes(buf)))
    }

    /// Display including the calendar time for `version`.
    #[must_use]
    pub fn verbose(self, version: CertificateVersion) -> Verbose {
        Verbose {
            time: self,
            version,
        }
    }
}

impl From<u64> for Time64 {
    fn from(micros: u64) -> Self {
        Time64(micros)
    }
}

impl From<Time64> for u64 {
    fn from(time: Time64) -> u64 {
        time.0
    }
}

impl TryFrom<u128> for Time64 {
    type Error = Error;

    fn try_from(micros: u128) -> Result<Self> {
        u64::try_from(micros)
            .map(Time64)
            .map_err(|_| Error::Overflow)
    }
}

impl TryFrom<i128> for Time64 {
    type Error = Error;

    fn try_from(micros: i128) -> Result<Self> {
        if micros < 0 {
            return Err(Error::Underflow);
        }
        u64::try_from(micros)
            .map(Time64)
            .map_err(|_| Error::Overflow)
    }
}

impl TryFrom<i64> for Time64 {
    type Error = Error;

    fn try_from(micros: i64) -> Result<Self> {
        u64::try_from(micros)
            .map(Time64)
            .map_err(|_| Error::Underflow)
    }
}

impl Display for Time64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Time64 [{}]", self.0)
    }
}

/// Verbose [Time64] display. See [Time64::verbose].
#[derive(Clone, Copy, Debug)]
pub struct Verbose {
    time: Time64,
    version: CertificateVersion,
}

impl Display for Verbose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.time.to_datetime(self.version) {
            Ok(dt) => write!(
                f,
                "Time64 [{} ({})]",
                dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                self.time.0
            ),
            Err(_) => write!(f, "Time64 [<unrepresentable> ({})]", self.time.0),
        }
    }
}
