//! Pickup time handling.
//!
//! Manifests carry the pickup date and time in separate columns, written in
//! whatever format the ship agent prefers. This module parses those into a
//! single local date-time that trips and passengers are matched on.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Error returned when parsing an invalid pickup date or time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid pickup time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];
const CLOCK_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

/// The scheduled pickup of a passenger or trip, in harbour local time.
///
/// Seconds are discarded on construction so two manifests that disagree
/// only on seconds still describe the same pickup.
///
/// # Examples
///
/// ```
/// use trip_tracker::domain::PickupTime;
///
/// let t = PickupTime::parse("2024-06-01 09:00").unwrap();
/// assert_eq!(t.to_string(), "2024-06-01 09:00");
///
/// let same = PickupTime::from_parts("01.06.2024", "9:00 AM").unwrap();
/// assert_eq!(t, same);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PickupTime(NaiveDateTime);

impl PickupTime {
    /// Create a pickup time, truncating to the minute.
    pub fn new(datetime: NaiveDateTime) -> Self {
        let time = datetime.time();
        let truncated = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Self(datetime.date().and_time(truncated))
    }

    /// Parse a combined `date time` string.
    ///
    /// The date part accepts `YYYY-MM-DD`, `DD.MM.YYYY`, `DD/MM/YYYY` and
    /// `YYYY/MM/DD`; the time part accepts 24-hour `HH:MM[:SS]` or
    /// 12-hour `h:mm[:ss] AM/PM`. An ISO `T` separator is also accepted.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let s = s.trim();
        let (date, time) = match s.split_once('T') {
            Some((d, t)) if !d.contains(' ') => (d, t),
            _ => s
                .split_once(char::is_whitespace)
                .ok_or_else(|| TimeError::new("expected a date and a time"))?,
        };
        Self::from_parts(date, time)
    }

    /// Parse a pickup time from separate date and time cells.
    pub fn from_parts(date: &str, time: &str) -> Result<Self, TimeError> {
        let date = parse_date(date)?;
        let time = parse_clock(time)?;
        Ok(Self::new(date.and_time(time)))
    }

    /// Returns the underlying date-time.
    pub fn to_datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// Returns the date component.
    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    /// Time remaining from `now` until this pickup.
    ///
    /// Negative once the pickup has passed.
    pub fn time_until(&self, now: NaiveDateTime) -> Duration {
        self.0.signed_duration_since(now)
    }
}

impl fmt::Debug for PickupTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PickupTime({})", self)
    }
}

impl fmt::Display for PickupTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M"))
    }
}

impl Serialize for PickupTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PickupTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PickupTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, TimeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TimeError::new("missing date"));
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| TimeError::new("unrecognised date format"))
}

fn parse_clock(s: &str) -> Result<NaiveTime, TimeError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(TimeError::new("missing time"));
    }

    let lower = s.to_ascii_lowercase();
    let meridiem = if lower.ends_with("am") {
        Some(false)
    } else if lower.ends_with("pm") {
        Some(true)
    } else {
        None
    };

    let Some(is_pm) = meridiem else {
        return CLOCK_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(s, fmt).ok())
            .ok_or_else(|| TimeError::new("unrecognised time format"));
    };

    let clock = s[..s.len() - 2].trim_end();
    let twelve = CLOCK_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(clock, fmt).ok())
        .filter(|t| (1..=12).contains(&t.hour()))
        .ok_or_else(|| TimeError::new("unrecognised 12-hour time"))?;

    let hour = twelve.hour() % 12 + if is_pm { 12 } else { 0 };
    NaiveTime::from_hms_opt(hour, twelve.minute(), 0).ok_or_else(|| TimeError::new("hour out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> PickupTime {
        PickupTime::new(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
        )
    }

    #[test]
    fn parses_iso_date_and_clock() {
        assert_eq!(PickupTime::parse("2024-06-01 09:00").unwrap(), at(2024, 6, 1, 9, 0));
        assert_eq!(PickupTime::parse("2024-06-01 09:00:45").unwrap(), at(2024, 6, 1, 9, 0));
        assert_eq!(PickupTime::parse("2024-06-01T17:15").unwrap(), at(2024, 6, 1, 17, 15));
    }

    #[test]
    fn parses_european_dates() {
        assert_eq!(PickupTime::from_parts("01.06.2024", "09:00").unwrap(), at(2024, 6, 1, 9, 0));
        assert_eq!(PickupTime::from_parts("01/06/2024", "23:59").unwrap(), at(2024, 6, 1, 23, 59));
    }

    #[test]
    fn parses_twelve_hour_clock() {
        assert_eq!(PickupTime::from_parts("2024-06-01", "9:30 PM").unwrap(), at(2024, 6, 1, 21, 30));
        assert_eq!(PickupTime::from_parts("2024-06-01", "12:05am").unwrap(), at(2024, 6, 1, 0, 5));
        assert_eq!(PickupTime::from_parts("2024-06-01", "12:05 pm").unwrap(), at(2024, 6, 1, 12, 5));
        assert_eq!(PickupTime::parse("2024-06-01 9:30 AM").unwrap(), at(2024, 6, 1, 9, 30));
    }

    #[test]
    fn rejects_garbage() {
        assert!(PickupTime::parse("").is_err());
        assert!(PickupTime::parse("2024-06-01").is_err());
        assert!(PickupTime::from_parts("tomorrow", "09:00").is_err());
        assert!(PickupTime::from_parts("2024-06-01", "25:00").is_err());
        assert!(PickupTime::from_parts("2024-06-01", "").is_err());
    }

    #[test]
    fn time_until_is_signed() {
        let pickup = at(2024, 6, 1, 9, 0);
        let before = at(2024, 6, 1, 7, 30).to_datetime();
        let after = at(2024, 6, 1, 10, 0).to_datetime();

        assert_eq!(pickup.time_until(before), Duration::minutes(90));
        assert_eq!(pickup.time_until(after), Duration::minutes(-60));
    }

    #[test]
    fn serde_uses_display_format() {
        let t = at(2024, 6, 1, 9, 0);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"2024-06-01 09:00\"");
        let back: PickupTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
