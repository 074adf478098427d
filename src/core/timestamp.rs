//! Timestamp formatting utilities
//!
//! The line prefix always uses a short local `HH:MM:SS` clock. [`TimeFormat`] covers the
//! longer formats selectable through configuration.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timestamp format selectable through `Config::time_format`
///
/// # Examples
///
/// ```
/// use spectral_logger::TimeFormat;
/// use chrono::Utc;
///
/// let stamp = TimeFormat::Iso.format(&Utc::now());
/// assert!(stamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFormat {
    /// ISO 8601 in UTC with milliseconds: `2025-01-08T10:30:45.123Z`
    #[default]
    Iso,

    /// Unix timestamp in seconds: `1736332245`
    Unix,

    /// Local wall-clock time: `2025-01-08 11:30:45`
    Locale,
}

impl TimeFormat {
    /// Format any chrono timestamp according to this format
    #[must_use]
    pub fn format<Tz: TimeZone>(&self, datetime: &DateTime<Tz>) -> String {
        match self {
            TimeFormat::Iso => datetime
                .with_timezone(&Utc)
                .format("%Y-%m-%dT%H:%M:%S%.3fZ")
                .to_string(),
            TimeFormat::Unix => datetime.timestamp().to_string(),
            TimeFormat::Locale => datetime
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        }
    }

    /// Format the current time
    #[must_use]
    pub fn now(&self) -> String {
        self.format(&Utc::now())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::Iso => "iso",
            TimeFormat::Unix => "unix",
            TimeFormat::Locale => "locale",
        }
    }
}

impl fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iso" => Ok(TimeFormat::Iso),
            "unix" => Ok(TimeFormat::Unix),
            "locale" => Ok(TimeFormat::Locale),
            _ => Err(format!("unknown time format '{}'", s)),
        }
    }
}

/// Short `HH:MM:SS` clock used in the line prefix
pub fn short_timestamp<Tz: TimeZone>(datetime: &DateTime<Tz>) -> String
where
    Tz::Offset: fmt::Display,
{
    datetime.format("%H:%M:%S").to_string()
}

/// Short clock for the current local time
pub fn short_timestamp_now() -> String {
    short_timestamp(&Local::now())
}
