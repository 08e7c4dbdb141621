//! Certificate version epochs.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timescale::{TaiInstant, TimeScale};
use crate::{Error, Result};

/// Certificate format generation. Each version counts [Time64](crate::Time64) from a
/// different epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CertificateVersion {
    /// Epoch of Jan 1, 2010 00:00:00 UTC
    V1,
    /// Epoch of Jan 1, 2004 00:00:00 UTC
    V2,
}

impl CertificateVersion {
    /// TAI seconds from the TAI zero point to Jan 1, 2010 UTC
    pub const V1_EPOCH_SECS: i64 = 1_199_232_034;
    /// TAI seconds from the TAI zero point to Jan 1, 2004 UTC
    pub const V2_EPOCH_SECS: i64 = 1_009_843_232;

    /// Seconds since the TAI zero point at which elapsed time for this version is zero.
    #[must_use]
    pub const fn epoch_base_seconds(self) -> i64 {
        match self {
            Self::V1 => Self::V1_EPOCH_SECS,
            Self::V2 => Self::V2_EPOCH_SECS,
        }
    }

    /// The epoch as a UTC calendar timestamp using `scale`.
    ///
    /// # Errors
    /// Any error produced by `scale`.
    pub fn epoch(self, scale: &dyn TimeScale) -> Result<DateTime<Utc>> {
        scale.from_tai(TaiInstant::new(self.epoch_base_seconds(), 0))
    }
}

impl TryFrom<u8> for CertificateVersion {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            _ => Err(Error::UnsupportedVersion(tag)),
        }
    }
}

impl From<CertificateVersion> for u8 {
    fn from(version: CertificateVersion) -> u8 {
        match version {
            CertificateVersion::V1 => 1,
            CertificateVersion::V2 => 2,
        }
    }
}

impl Display for CertificateVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", u8::from(*self))
    }
}
