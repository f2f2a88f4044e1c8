use crate::error;
use crate::Result;
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use snafu::ensure;
use std::str::FromStr;

/// A point in time, stored as milliseconds since the Unix epoch
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeInstance(i64);

impl TimeInstance {
    /// Smallest representable instance (-262144-01-01T00:00:00Z)
    pub const MIN: TimeInstance = TimeInstance(-8_334_632_851_200_000);
    /// Largest representable instance (+262143-12-31T23:59:59.999Z)
    pub const MAX: TimeInstance = TimeInstance(8_210_298_412_799_999);

    pub fn from_millis(millis: i64) -> Result<Self> {
        ensure!(
            (Self::MIN.0..=Self::MAX.0).contains(&millis),
            error::TimeInstanceOutOfBounds {
                min: Self::MIN.0,
                max: Self::MAX.0,
                is: millis
            }
        );
        Ok(Self(millis))
    }

    pub const fn from_millis_unchecked(millis: i64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub const fn inner(self) -> i64 {
        self.0
    }

    pub fn as_utc_date_time(self) -> Option<DateTime<Utc>> {
        match Utc.timestamp_millis_opt(self.0) {
            LocalResult::Single(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_rfc3339(self) -> String {
        self.as_utc_date_time()
            .map_or_else(|| self.0.to_string(), |dt| dt.to_rfc3339())
    }

    pub fn checked_add_millis(self, millis: i64) -> Option<Self> {
        let sum = self.0.checked_add(millis)?;
        Self::from_millis(sum).ok()
    }
}

impl From<DateTime<Utc>> for TimeInstance {
    fn from(date_time: DateTime<Utc>) -> Self {
        Self(date_time.timestamp_millis())
    }
}

impl From<NaiveDateTime> for TimeInstance {
    fn from(date_time: NaiveDateTime) -> Self {
        Self(date_time.timestamp_millis())
    }
}

/// Parses calendar instants of decreasing granularity: RFC 3339,
/// `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d`, `%Y-%m` and `%Y`
impl FromStr for TimeInstance {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc).into());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(dt.into());
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(date.and_hms_opt(0, 0, 0).expect("midnight is valid").into());
        }
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
            return Ok(date.and_hms_opt(0, 0, 0).expect("midnight is valid").into());
        }
        if let Ok(year) = s.parse::<i32>() {
            if let Some(date) = NaiveDate::from_ymd_opt(year, 1, 1) {
                return Ok(date.and_hms_opt(0, 0, 0).expect("midnight is valid").into());
            }
        }
        Err(crate::error::Error::TimeParse { input: s.into() })
    }
}

impl std::fmt::Display for TimeInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_granularities() {
        let full: TimeInstance = "2010-06-15T12:30:00Z".parse().unwrap();
        assert_eq!(full.as_rfc3339(), "2010-06-15T12:30:00+00:00");

        let day: TimeInstance = "2010-06-15".parse().unwrap();
        assert_eq!(day.as_rfc3339(), "2010-06-15T00:00:00+00:00");

        let month: TimeInstance = "2010-06".parse().unwrap();
        assert_eq!(month.as_rfc3339(), "2010-06-01T00:00:00+00:00");

        let year: TimeInstance = "2010".parse().unwrap();
        assert_eq!(year.as_rfc3339(), "2010-01-01T00:00:00+00:00");

        assert!("June 2010".parse::<TimeInstance>().is_err());
    }

    #[test]
    fn bounds() {
        assert!(TimeInstance::from_millis(0).is_ok());
        assert!(TimeInstance::from_millis(i64::MAX).is_err());
    }
}
