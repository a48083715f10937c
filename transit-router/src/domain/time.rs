//! Transit time handling.
//!
//! Timetable times are measured in seconds since midnight of the service
//! day. Trips running past midnight keep counting (e.g. "25:10"), so a
//! time is a plain signed second count rather than a time of day.

use chrono::Duration;
use std::fmt;
use std::ops::{Add, Sub};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Latest hour accepted by the parser; services may run into the next day.
const MAX_HOUR: i32 = 47;

/// A time on the service day, in seconds since midnight.
///
/// # Examples
///
/// ```
/// use transit_router::domain::TransitTime;
/// use chrono::Duration;
///
/// let t = TransitTime::parse("10:20").unwrap();
/// assert_eq!(t.secs(), 10 * 3600 + 20 * 60);
/// assert_eq!((t + Duration::minutes(45)).to_string(), "11:05");
///
/// // After midnight the hour keeps counting
/// assert_eq!(TransitTime::parse("25:10").unwrap().to_string(), "25:10");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransitTime(i32);

impl TransitTime {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: TransitTime = TransitTime(0);

    /// Create a time from seconds since midnight.
    pub const fn from_secs(secs: i32) -> Self {
        Self(secs)
    }

    /// Create a time from hours, minutes and seconds.
    pub const fn hms(hour: i32, minute: i32, second: i32) -> Self {
        Self(hour * 3600 + minute * 60 + second)
    }

    /// Parse a time from "HH:MM" or "HH:MM:SS".
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_router::domain::TransitTime;
    ///
    /// assert!(TransitTime::parse("00:00").is_ok());
    /// assert!(TransitTime::parse("23:59:30").is_ok());
    /// assert!(TransitTime::parse("26:15").is_ok());
    ///
    /// assert!(TransitTime::parse("1430").is_err());
    /// assert!(TransitTime::parse("14:3").is_err());
    /// assert!(TransitTime::parse("14:60").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 && bytes.len() != 8 {
            return Err(TimeError::new("expected HH:MM or HH:MM:SS format"));
        }
        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > MAX_HOUR {
            return Err(TimeError::new("hour must be 0-47"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let second = if bytes.len() == 8 {
            if bytes[5] != b':' {
                return Err(TimeError::new("expected colon at position 5"));
            }
            let second = parse_two_digits(&bytes[6..8])
                .ok_or_else(|| TimeError::new("invalid second digits"))?;
            if second > 59 {
                return Err(TimeError::new("second must be 0-59"));
            }
            second
        } else {
            0
        };

        Ok(Self::hms(hour, minute, second))
    }

    /// Returns seconds since midnight.
    pub fn secs(self) -> i32 {
        self.0
    }

    /// Returns the duration from `other` to `self`, negative if `other` is later.
    pub fn duration_since(self, other: Self) -> Duration {
        Duration::seconds(i64::from(self.0) - i64::from(other.0))
    }
}

/// Clamp a duration to whole seconds that fit a `TransitTime`.
fn whole_secs(duration: Duration) -> i32 {
    duration
        .num_seconds()
        .clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl Add<Duration> for TransitTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(whole_secs(rhs)))
    }
}

impl Sub<Duration> for TransitTime {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_sub(whole_secs(rhs)))
    }
}

impl fmt::Debug for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransitTime({self})")
    }
}

impl fmt::Display for TransitTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let secs = self.0.unsigned_abs();
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if s == 0 {
            write!(f, "{sign}{h:02}:{m:02}")
        } else {
            write!(f, "{sign}{h:02}:{m:02}:{s:02}")
        }
    }
}

/// Parse two ASCII digit bytes.
fn parse_two_digits(bytes: &[u8]) -> Option<i32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some((d1 * 10 + d2) as i32)
}
