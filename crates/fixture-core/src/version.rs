//! Explicit cell versions.
//!
//! A column may pin the timestamp its cells are written at. The textual form
//! is fixed to `YYYY-MM-DD HH:MM:SS ±HH:MM`; anything else is rejected.

use chrono::{DateTime, FixedOffset, TimeZone};
use serde::de::{self, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// chrono format string equivalent to the accepted pattern.
pub const VERSION_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Shape of the accepted pattern: `d` is an ASCII digit, `s` is `+` or `-`,
/// every other byte must match literally.
const VERSION_SHAPE: &[u8] = b"dddd-dd-dd dd:dd:dd sdd:dd";

/// A point in time with a fixed UTC offset, parsed from a fixture's `version` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(DateTime<FixedOffset>);

/// Error returned when a version string does not match the accepted pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{input}': {reason} (expected 'YYYY-MM-DD HH:MM:SS +HH:MM')")]
pub struct VersionParseError {
    input: String,
    reason: String,
}

impl Version {
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// Timestamp in microseconds at the granularity the store accepts.
    pub fn timestamp_micros(&self) -> i64 {
        timestamp_micros(&self.0)
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fail = |reason: &str| VersionParseError {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let bytes = s.as_bytes();
        if bytes.len() != VERSION_SHAPE.len() {
            return Err(fail("wrong length"));
        }
        for (i, (&b, &shape)) in bytes.iter().zip(VERSION_SHAPE).enumerate() {
            let ok = match shape {
                b'd' => b.is_ascii_digit(),
                b's' => b == b'+' || b == b'-',
                literal => b == literal,
            };
            if !ok {
                return Err(fail(&format!("unexpected character at position {i}")));
            }
        }

        DateTime::parse_from_str(s, VERSION_FORMAT)
            .map(Version)
            .map_err(|e| fail(&e.to_string()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(VERSION_FORMAT))
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Convert a point in time to store microseconds, truncated to whole milliseconds.
///
/// Tables created with default settings reject timestamps finer than a millisecond.
pub fn timestamp_micros<Tz: TimeZone>(time: &DateTime<Tz>) -> i64 {
    time.timestamp_millis() * 1000
}
