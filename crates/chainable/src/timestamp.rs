//! Raw timestamp values as handed over by a date source.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ChainError, Result};
use crate::zone::ReferenceZone;

/// Latest year a timestamp may fall in; RFC 3339 text cannot go past it
pub const MAX_YEAR: i32 = 9999;

/// A timestamp value read from one column of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// Seconds since the Unix epoch
    Epoch(i64),
    /// RFC 3339 instant or `YYYY-MM-DD` day
    Text(String),
    /// UTC instant; serialized as RFC 3339 text
    Instant(DateTime<Utc>),
    /// Calendar day; serialized as `YYYY-MM-DD` text
    Date(NaiveDate),
}

impl RawTimestamp {
    /// Calendar day of this value in `zone`.
    ///
    /// A plain date is taken as already being a calendar day and is not
    /// shifted. Days outside years 0 to `MAX_YEAR` are rejected; they come
    /// from corrupt values such as millisecond epochs and would otherwise
    /// hide the current chain. `column` is only used to describe a failure.
    pub fn to_date(&self, column: &str, zone: &ReferenceZone) -> Result<NaiveDate> {
        let day = self.convert(column, zone)?;
        if !(0..=MAX_YEAR).contains(&day.year()) {
            return Err(self.malformed(column));
        }
        Ok(day)
    }

    fn convert(&self, column: &str, zone: &ReferenceZone) -> Result<NaiveDate> {
        match self {
            RawTimestamp::Instant(instant) => Ok(zone.to_date(*instant)),
            RawTimestamp::Date(day) => Ok(*day),
            RawTimestamp::Epoch(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|instant| zone.to_date(instant))
                .ok_or_else(|| self.malformed(column)),
            RawTimestamp::Text(text) => {
                parse_text(text.trim(), zone).ok_or_else(|| self.malformed(column))
            }
        }
    }

    fn malformed(&self, column: &str) -> ChainError {
        ChainError::MalformedTimestamp {
            column: column.to_string(),
            value: self.to_string(),
        }
    }
}

fn parse_text(text: &str, zone: &ReferenceZone) -> Option<NaiveDate> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(zone.to_date(instant.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

impl fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawTimestamp::Epoch(secs) => write!(f, "epoch:{}", secs),
            RawTimestamp::Text(text) => write!(f, "{:?}", text),
            RawTimestamp::Instant(instant) => write!(f, "{}", instant.to_rfc3339()),
            RawTimestamp::Date(day) => write!(f, "{}", day),
        }
    }
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        RawTimestamp::Instant(instant)
    }
}

impl From<NaiveDate> for RawTimestamp {
    fn from(day: NaiveDate) -> Self {
        RawTimestamp::Date(day)
    }
}

impl From<i64> for RawTimestamp {
    fn from(secs: i64) -> Self {
        RawTimestamp::Epoch(secs)
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        RawTimestamp::Text(text.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(text: String) -> Self {
        RawTimestamp::Text(text)
    }
}
