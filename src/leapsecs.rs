//! TAI - UTC leap second history.
//!
//! Reference: [IERS Leap_Second.dat](https://hpiers.obspm.fr/iers/bul/bulc/Leap_Second.dat)
use std::{fs, path::Path, str::FromStr};

use chrono::{DateTime, FixedOffset, Utc};
use tracing::debug;

use crate::error::{LeapsecError, Result};

/// Unix seconds at Jan 1, 1972 UTC. TAI seconds are counted from the TAI instant with the
/// same calendar label, where TAI - UTC was already 10s.
pub const TAI_ZERO_UNIX_SECS: i64 = 63_072_000;

/// (UTC unix seconds the record takes effect, TAI - UTC seconds)
const BUILTIN: [(i64, i32); 28] = [
    (63_072_000, 10),    // 1972-01-01
    (78_796_800, 11),    // 1972-07-01
    (94_694_400, 12),    // 1973-01-01
    (126_230_400, 13),   // 1974-01-01
    (157_766_400, 14),   // 1975-01-01
    (189_302_400, 15),   // 1976-01-01
    (220_924_800, 16),   // 1977-01-01
    (252_460_800, 17),   // 1978-01-01
    (283_996_800, 18),   // 1979-01-01
    (315_532_800, 19),   // 1980-01-01
    (362_793_600, 20),   // 1981-07-01
    (394_329_600, 21),   // 1982-07-01
    (425_865_600, 22),   // 1983-07-01
    (489_024_000, 23),   // 1985-07-01
    (567_993_600, 24),   // 1988-01-01
    (631_152_000, 25),   // 1990-01-01
    (662_688_000, 26),   // 1991-01-01
    (709_948_800, 27),   // 1992-07-01
    (741_484_800, 28),   // 1993-07-01
    (773_020_800, 29),   // 1994-07-01
    (820_454_400, 30),   // 1996-01-01
    (867_715_200, 31),   // 1997-07-01
    (915_148_800, 32),   // 1999-01-01
    (1_136_073_600, 33), // 2006-01-01
    (1_230_768_000, 34), // 2009-01-01
    (1_341_100_800, 35), // 2012-07-01
    (1_435_708_800, 36), // 2015-07-01
    (1_483_228_800, 37), // 2017-01-01
];

/// Expiration of the builtin snapshot, 28 June 2026.
const BUILTIN_EXPIRATION: i64 = 1_782_604_800;

/// Table of TAI - UTC offsets as published by the IERS.
///
/// Records are indexed by both the UTC and TAI second at which they take effect so lookups
/// can be made from either time scale.
#[derive(Clone, Debug, PartialEq)]
pub struct LeapsecTable {
    expiration: Option<DateTime<Utc>>,
    leaps: Vec<i32>,
    utc: Vec<i64>,
    tai: Vec<i64>,
}

impl LeapsecTable {
    /// The table compiled into this crate. Its last record is Jan 1, 2017 (TAI - UTC = 37s).
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (utc, leaps) in BUILTIN {
            table.push(utc, leaps);
        }
        table.expiration = DateTime::from_timestamp(BUILTIN_EXPIRATION, 0);
        table
    }

    /// Load a table from an IERS `Leap_Second.dat` file.
    ///
    /// # Errors
    /// [Error::Io](crate::Error::Io) if the file cannot be read, or
    /// [LeapsecError::Parse] if the content is not valid.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let table: Self = content.parse()?;
        debug!(
            path = %path.as_ref().display(),
            records = table.leaps.len(),
            "loaded leap second table"
        );
        Ok(table)
    }

    /// The date after which the table may be missing announced leap seconds.
    #[must_use]
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.expiration
    }

    /// True if the UTC unix second `utc` is at or after the table expiration.
    #[must_use]
    pub fn is_expired(&self, utc: i64) -> bool {
        self.expiration.is_some_and(|expr| utc >= expr.timestamp())
    }

    /// TAI - UTC of the first record, used for best-effort conversion of times before the
    /// table begins.
    #[must_use]
    pub fn first_leaps(&self) -> i32 {
        self.leaps[0]
    }

    /// Returns TAI - UTC in seconds at the provided UTC unix second.
    ///
    /// # Errors
    /// [LeapsecError::OutOfRange] if `utc` is before the first record.
    pub fn leaps_utc(&self, utc: i64) -> std::result::Result<i32, LeapsecError> {
        Self::find_leaps(&self.utc, utc).map(|idx| self.leaps[idx])
    }

    /// Returns TAI - UTC in seconds at the provided TAI second.
    ///
    /// An inserted leap second resolves to the offset in effect before the insertion.
    ///
    /// # Errors
    /// [LeapsecError::OutOfRange] if `tai` is before the first record.
    pub fn leaps_tai(&self, tai: i64) -> std::result::Result<i32, LeapsecError> {
        Self::find_leaps(&self.tai, tai).map(|idx| self.leaps[idx])
    }

    /// If the TAI second `tai` is an inserted leap second returns the UTC unix second it is
    /// labeled with, i.e., the 23:59:59 preceding the insertion.
    #[must_use]
    pub fn leap_second_at_tai(&self, tai: i64) -> Option<i64> {
        (1..self.tai.len())
            .find(|&idx| self.tai[idx] - 1 == tai)
            .map(|idx| self.utc[idx] - 1)
    }

    /// True if a leap second was inserted after the UTC unix second `utc`, i.e., `utc` is the
    /// 23:59:59 that a 23:59:60 follows.
    #[must_use]
    pub fn is_leap_second_utc(&self, utc: i64) -> bool {
        (1..self.utc.len()).any(|idx| self.utc[idx] - 1 == utc)
    }

    fn empty() -> Self {
        LeapsecTable {
            expiration: None,
            leaps: Vec::new(),
            utc: Vec::new(),
            tai: Vec::new(),
        }
    }

    fn push(&mut self, utc: i64, leaps: i32) {
        self.leaps.push(leaps);
        self.utc.push(utc);
        self.tai.push(utc - TAI_ZERO_UNIX_SECS + i64::from(leaps));
    }

    fn find_leaps(times: &[i64], time: i64) -> std::result::Result<usize, LeapsecError> {
        match times.partition_point(|t| *t <= time) {
            0 => Err(LeapsecError::OutOfRange),
            idx => Ok(idx - 1),
        }
    }

    fn parse_expiration(line: &str) -> Option<DateTime<Utc>> {
        let parts: Vec<&str> = line.split("File expires on ").collect();
        if parts.len() != 2 {
            return None;
        }
        let timestr = format!("{} 00:00:00 +0000", parts[1].trim());
        match DateTime::parse_from_str(&timestr, "%d %B %Y %H:%M:%S %z") {
            Ok(dt) => Some(dt.into()),
            Err(_) => None,
        }
    }

    /// Parse out UTC timestamp from date and TAI-UTC seconds.
    fn parse_record(line: &str) -> std::result::Result<(i64, i32), String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() != 5 {
            return Err("not enough components".to_string());
        }

        let timestr = &format!("{}-{:0>2}-{:0>2}T00:00:00Z", parts[3], parts[2], parts[1]);
        let dt: DateTime<FixedOffset> = match DateTime::parse_from_rfc3339(timestr) {
            Ok(dt) => dt,
            Err(_) => return Err("failed to parse date string".to_string()),
        };

        Ok((
            dt.timestamp(),
            parts[4]
                .parse::<i32>()
                .map_err(|_| format!("failed to parse leap secs {}", parts[4]))?,
        ))
    }
}

impl Default for LeapsecTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FromStr for LeapsecTable {
    type Err = LeapsecError;

    /// Parse the IERS `Leap_Second.dat` format.
    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let mut prev = None;
        let mut table = LeapsecTable::empty();
        for (lineno, line) in content.lines().enumerate().map(|(i, z)| (i + 1, z.trim())) {
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                if table.expiration.is_none() {
                    table.expiration = Self::parse_expiration(line);
                }
                continue;
            }

            match Self::parse_record(line) {
                Ok((timestamp, leaps)) => {
                    if let Some((prev_timestamp, prev_leaps)) = prev {
                        if timestamp <= prev_timestamp {
                            return Err(LeapsecError::Parse(format!(
                                "records out of order at line={lineno}"
                            )));
                        }
                        if leaps.checked_sub(prev_leaps) != Some(1) {
                            return Err(LeapsecError::Parse(format!(
                                "records more that 1s apart at line={lineno}"
                            )));
                        }
                    }
                    prev = Some((timestamp, leaps));
                    table.push(timestamp, leaps);
                }
                Err(err) => {
                    return Err(LeapsecError::Parse(format!(
                        "invalid record at line={lineno}: {err}"
                    )))
                }
            }
        }

        if table.leaps.is_empty() {
            return Err(LeapsecError::Parse("no leap second records".to_string()));
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAT: &str = "
#
#
#  File expires on 28 June 2025
#
#
#    MJD        Date        TAI-UTC (s)
#           day month year
#    ---    --------------   ------
#
    41317.0    1  1 1972       10
    41499.0    1  7 1972       11
    41683.0    1  1 1973       12";

    #[test]
    fn test_parse_record() {
        let line = "41317.0    1  1 1972       10\n";

        assert_eq!(Ok((63_072_000, 10)), LeapsecTable::parse_record(line));
    }

    #[test]
    fn test_from_str() {
        let table: LeapsecTable = DAT.parse().unwrap();

        assert_eq!(table.leaps, vec![10, 11, 12]);
        assert_eq!(table.utc, vec![63_072_000, 78_796_800, 94_694_400]);
        assert_eq!(table.tai, vec![10, 15_724_811, 31_622_412]);

        let expected: DateTime<Utc> = DateTime::parse_from_rfc3339("2025-06-28T00:00:00Z")
            .unwrap()
            .into();
        assert_eq!(Some(expected), table.expiration());
    }

    #[test]
    fn test_from_str_rejects_gaps() {
        let dat = "
    41317.0    1  1 1972       10
    41683.0    1  1 1973       12";
        let err = dat.parse::<LeapsecTable>().unwrap_err();

        assert!(matches!(err, LeapsecError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_from_str_rejects_extreme_leaps() {
        let dat = "
    41317.0    1  1 1972       10
    41499.0    1  7 1972       -2147483648";
        let err = dat.parse::<LeapsecTable>().unwrap_err();

        assert!(matches!(err, LeapsecError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_from_str_rejects_out_of_order() {
        let dat = "
    41499.0    1  7 1972       10
    41317.0    1  1 1972       11";
        let err = dat.parse::<LeapsecTable>().unwrap_err();

        assert!(matches!(err, LeapsecError::Parse(_)), "got {err:?}");

        let dat = "
    41317.0    1  1 1972       10
    41317.0    1  1 1972       11";
        let err = dat.parse::<LeapsecTable>().unwrap_err();

        assert!(matches!(err, LeapsecError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_from_str_rejects_empty() {
        let err = "# nothing here\n".parse::<LeapsecTable>().unwrap_err();

        assert!(matches!(err, LeapsecError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_leaps_utc() {
        let table = LeapsecTable::builtin();

        assert!(matches!(
            table.leaps_utc(TAI_ZERO_UNIX_SECS - 1),
            Err(LeapsecError::OutOfRange)
        ));
        assert_eq!(table.leaps_utc(TAI_ZERO_UNIX_SECS).unwrap(), 10);
        // 2004-01-01
        assert_eq!(table.leaps_utc(1_072_915_200).unwrap(), 32);
        // 2016-12-31T23:59:59
        assert_eq!(table.leaps_utc(1_483_228_799).unwrap(), 36);
        assert_eq!(table.leaps_utc(1_483_228_800).unwrap(), 37);
    }

    #[test]
    fn test_leaps_tai() {
        let table = LeapsecTable::builtin();

        assert!(matches!(table.leaps_tai(9), Err(LeapsecError::OutOfRange)));
        assert_eq!(table.leaps_tai(10).unwrap(), 10);
        // TAI second of the leap second inserted at the end of 2016
        assert_eq!(table.leaps_tai(1_420_156_836).unwrap(), 36);
        assert_eq!(table.leaps_tai(1_420_156_837).unwrap(), 37);
    }

    #[test]
    fn test_leap_second_at_tai() {
        let table = LeapsecTable::builtin();

        assert_eq!(table.leap_second_at_tai(1_420_156_836), Some(1_483_228_799));
        assert_eq!(table.leap_second_at_tai(1_420_156_835), None);
        assert_eq!(table.leap_second_at_tai(1_420_156_837), None);
        // the first record is the start of the table, not an insertion
        assert_eq!(table.leap_second_at_tai(9), None);
    }

    #[test]
    fn test_is_leap_second_utc() {
        let table = LeapsecTable::builtin();

        assert!(table.is_leap_second_utc(1_483_228_799));
        assert!(!table.is_leap_second_utc(1_483_228_800));
        // 2015-03-01T23:59:59, no leap second that day
        assert!(!table.is_leap_second_utc(1_425_254_399));
    }

    #[test]
    fn test_builtin_expiration() {
        let table = LeapsecTable::builtin();

        assert!(!table.is_expired(1_483_228_800));
        assert!(table.is_expired(BUILTIN_EXPIRATION));
    }
}
