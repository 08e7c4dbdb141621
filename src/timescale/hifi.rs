use chrono::{DateTime, Utc};
use hifitime::{Duration, Epoch};

use super::{TaiInstant, TimeScale, NANOS_PER_SEC};
use crate::error::{Error, Result};

/// Seconds between the hifitime TAI reference (Jan 1, 1900 TAI) and the TAI zero point
const J1900_TAI_ZERO_SECS: i128 = 2_272_060_800;
const NANOS: i128 = NANOS_PER_SEC as i128;

/// [TimeScale] using the leap second list embedded in [hifitime].
///
/// Unlike [UtcTai](super::UtcTai) the leap second data cannot be pinned or replaced, and
/// chrono leap seconds are folded into the following second.
#[derive(Clone, Copy, Debug, Default)]
pub struct HifiTimeScale;

impl TimeScale for HifiTimeScale {
    fn to_tai(&self, utc: &DateTime<Utc>) -> Result<TaiInstant> {
        let unix = i128::from(utc.timestamp()) * NANOS + i128::from(utc.timestamp_subsec_nanos());
        let epoch = Epoch::from_unix_duration(Duration::from_total_nanoseconds(unix));

        let nanos = epoch.to_tai_duration().total_nanoseconds() - J1900_TAI_ZERO_SECS * NANOS;
        let seconds = i64::try_from(nanos.div_euclid(NANOS)).map_err(|_| Error::Unrepresentable)?;
        let nanos = u32::try_from(nanos.rem_euclid(NANOS)).map_err(|_| Error::Unrepresentable)?;
        Ok(TaiInstant::new(seconds, nanos))
    }

    fn from_tai(&self, tai: TaiInstant) -> Result<DateTime<Utc>> {
        let nanos = (i128::from(tai.seconds()) + J1900_TAI_ZERO_SECS) * NANOS
            + i128::from(tai.nanos());
        let epoch = Epoch::from_tai_duration(Duration::from_total_nanoseconds(nanos));

        let unix = epoch.to_unix_duration().total_nanoseconds();
        let secs = i64::try_from(unix.div_euclid(NANOS)).map_err(|_| Error::Unrepresentable)?;
        let nanos = u32::try_from(unix.rem_euclid(NANOS)).map_err(|_| Error::Unrepresentable)?;
        DateTime::from_timestamp(secs, nanos).ok_or(Error::Unrepresentable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timescale::UtcTai;

    #[test]
    fn test_matches_utctai() {
        let hifi = HifiTimeScale;
        let table = UtcTai::default();

        for time in [
            "2004-01-01T00:00:00Z",
            "2010-01-01T00:00:00Z",
            "2017-01-01T00:00:00.123456Z",
        ] {
            let time: DateTime<Utc> = DateTime::parse_from_rfc3339(time).unwrap().into();
            let tai = hifi.to_tai(&time).unwrap();

            assert_eq!(tai, table.to_tai(&time).unwrap(), "time={time}");
            assert_eq!(hifi.from_tai(tai).unwrap(), time);
        }
    }
}
