//! Timestamp normalization
//!
//! STH reports `recvTime` in UTC using a literal `T` date/time separator and a
//! trailing `Z`, with or without fractional seconds. Samples are charted in a
//! fixed local timezone.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// `recvTime` with milliseconds, after separator cleanup
const FRACTIONAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// `recvTime` without fractional seconds, after separator cleanup
const WHOLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Errors from timestamp normalization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    /// None of the accepted shapes matched
    #[error("Unrecognized timestamp: {0:?}")]
    Unrecognized(String),
}

/// Converts upstream UTC timestamps into a display timezone
#[derive(Debug, Clone, Copy)]
pub struct TimeNormalizer {
    tz: Tz,
}

impl TimeNormalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// The display timezone
    pub fn tz(&self) -> Tz {
        self.tz
    }

    /// Parse one timestamp and convert it to the display timezone.
    ///
    /// Tries the fractional-second shape, then the whole-second shape, both
    /// read as UTC. A full RFC 3339 string with an explicit offset is
    /// accepted as a last resort.
    pub fn normalize(&self, raw: &str) -> Result<DateTime<Tz>, TimeError> {
        let raw = raw.trim();
        let cleaned = raw.replace('T', " ").replace('Z', "");

        let naive = NaiveDateTime::parse_from_str(&cleaned, FRACTIONAL_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&cleaned, WHOLE_FORMAT));

        match naive {
            Ok(naive) => Ok(Utc.from_utc_datetime(&naive).with_timezone(&self.tz)),
            Err(_) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&self.tz))
                .map_err(|_| TimeError::Unrecognized(raw.to_string())),
        }
    }

    /// Normalize a batch, keeping one result per input
    pub fn normalize_all<S: AsRef<str>>(&self, raw: &[S]) -> Vec<Result<DateTime<Tz>, TimeError>> {
        raw.iter().map(|s| self.normalize(s.as_ref())).collect()
    }
}
