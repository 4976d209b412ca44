//! Whole-day value type
//!
//! A `CalendarDay` names one day in a fixed reference zone (UTC), so two
//! devices in different time zones agree on which day an instant belongs to.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One whole day, independent of the time of day it was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarDay(NaiveDate);

impl CalendarDay {
    /// Build from a calendar date. Returns `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub const fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Truncate an instant in any zone to its day in the reference zone
    pub fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self(instant.with_timezone(&Utc).date_naive())
    }

    /// The current day in the reference zone
    pub fn today() -> Self {
        Self::from_instant(&Utc::now())
    }

    /// The instant this day starts at
    pub fn to_instant(&self) -> DateTime<Utc> {
        self.0.and_time(chrono::NaiveTime::MIN).and_utc()
    }

    pub const fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    pub fn subtract_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Signed number of days from `self` to `other`
    pub fn days_until(&self, other: CalendarDay) -> i64 {
        (other.0 - self.0).num_days()
    }
}

impl From<NaiveDate> for CalendarDay {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for CalendarDay {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_any_instant_in_a_day_maps_to_that_day() {
        let morning = Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2025, 3, 9, 23, 59, 59).unwrap();
        assert_eq!(CalendarDay::from_instant(&morning), day(2025, 3, 9));
        assert_eq!(CalendarDay::from_instant(&night), day(2025, 3, 9));
    }

    #[test]
    fn test_local_offset_is_normalized_to_reference_zone() {
        // 01:30 on March 10 at UTC+5 is still March 9 in UTC.
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();
        assert_eq!(CalendarDay::from_instant(&local), day(2025, 3, 9));
    }

    #[test]
    fn test_instant_round_trip() {
        let d = day(2024, 2, 29);
        assert_eq!(CalendarDay::from_instant(&d.to_instant()), d);
    }

    #[test]
    fn test_day_arithmetic() {
        let d = day(2024, 2, 28);
        assert_eq!(d.add_days(1), day(2024, 2, 29));
        assert_eq!(d.add_days(2), day(2024, 3, 1));
        assert_eq!(day(2025, 1, 1).subtract_days(1), day(2024, 12, 31));
        assert_eq!(day(2025, 1, 1).days_until(day(2025, 2, 1)), 31);
        assert_eq!(day(2025, 2, 1).days_until(day(2025, 1, 1)), -31);
    }

    #[test]
    fn test_parse_and_display() {
        let d: CalendarDay = "2025-04-15".parse().unwrap();
        assert_eq!(d, day(2025, 4, 15));
        assert_eq!(d.to_string(), "2025-04-15");
        assert!("2025-02-30".parse::<CalendarDay>().is_err());
    }
}
