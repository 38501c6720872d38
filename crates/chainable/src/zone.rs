//! Reference time zone used to turn instants into calendar days.
//!
//! One zone is configured for the whole process; there are no per-call
//! overrides.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::fmt;
use std::str::FromStr;

use crate::error::{ChainError, Result};

/// IANA time zone that defines where a calendar day starts and ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceZone {
    tz: Tz,
}

impl Default for ReferenceZone {
    fn default() -> Self {
        Self::utc()
    }
}

impl ReferenceZone {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    /// Parse an IANA zone name such as `America/New_York`
    pub fn parse(name: &str) -> Result<Self> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|e| ChainError::Config(format!("invalid time zone {}: {}", name, e)))
    }

    pub fn name(&self) -> &'static str {
        self.tz.name()
    }

    /// Calendar day of `instant` in this zone
    pub fn to_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Today in this zone, read from the system clock
    pub fn today(&self) -> NaiveDate {
        self.to_date(Utc::now())
    }
}

impl FromStr for ReferenceZone {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReferenceZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_is_utc() {
        assert_eq!(ReferenceZone::default().name(), "UTC");
    }

    #[test]
    fn test_parse_rejects_unknown_zone() {
        assert!(ReferenceZone::parse("Mars/Olympus_Mons").is_err());
        assert!("America/New_York".parse::<ReferenceZone>().is_ok());
    }

    #[test]
    fn test_day_depends_on_zone() {
        // 02:30 UTC is still the previous evening in New York
        let instant = Utc.with_ymd_and_hms(2024, 3, 10, 2, 30, 0).unwrap();
        let utc = ReferenceZone::utc();
        let eastern = ReferenceZone::parse("America/New_York").unwrap();

        assert_eq!(utc.to_date(instant), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(eastern.to_date(instant), NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
    }
}
