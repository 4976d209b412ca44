//! Recurrence units and anchored calendar periods
//!
//! A [`Period`] says how often something recurs ("every 2 weeks"). A
//! [`CalendarPeriod`] is one concrete instance of it, anchored at a goal's
//! start date. Monthly instances are always computed from the anchor, never
//! from the previous instance, so a goal anchored on the 31st lands on the
//! last day of short months and returns to the 31st afterwards.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::day::CalendarDay;

/// Coarseness of a recurrence, ordered `None < Day < Week < Month`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodScope {
    /// Non-recurring
    #[default]
    None,
    Day,
    Week,
    Month,
}

impl fmt::Display for PeriodScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Day => write!(f, "day"),
            Self::Week => write!(f, "week"),
            Self::Month => write!(f, "month"),
        }
    }
}

/// A recurrence unit: `multiplier` units of `scope`
///
/// Ordering is lexicographic on (scope, multiplier). It answers "is this
/// coarser than that", not "is this longer": 5 weeks still sorts below 1 month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Period {
    pub scope: PeriodScope,
    pub multiplier: u32,
}

impl Period {
    pub const fn new(scope: PeriodScope, multiplier: u32) -> Self {
        Self { scope, multiplier }
    }

    /// The non-recurring period
    pub const fn none() -> Self {
        Self::new(PeriodScope::None, 1)
    }

    pub const fn days(multiplier: u32) -> Self {
        Self::new(PeriodScope::Day, multiplier)
    }

    pub const fn weeks(multiplier: u32) -> Self {
        Self::new(PeriodScope::Week, multiplier)
    }

    pub const fn months(multiplier: u32) -> Self {
        Self::new(PeriodScope::Month, multiplier)
    }

    pub fn is_recurring(&self) -> bool {
        self.scope != PeriodScope::None
    }

    /// Whether concrete calendar periods can be derived from this period
    pub fn is_steppable(&self) -> bool {
        self.is_recurring() && self.multiplier >= 1
    }
}

impl Default for Period {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.scope, self.multiplier) {
            (PeriodScope::None, _) => write!(f, "none"),
            (scope, 1) => write!(f, "1 {}", scope),
            (scope, n) => write!(f, "{} {}s", n, scope),
        }
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    /// Accepts "none", "daily", "weekly", "monthly" or a count with a unit
    /// suffix: "3d", "2w", "1m", "2 weeks".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "none" | "once" => return Ok(Self::none()),
            "daily" => return Ok(Self::days(1)),
            "weekly" => return Ok(Self::weeks(1)),
            "biweekly" => return Ok(Self::weeks(2)),
            "monthly" => return Ok(Self::months(1)),
            _ => {}
        }

        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| PeriodParseError::InvalidFormat(s.clone()))?;
        let (count, unit) = s.split_at(split);
        let unit = unit.trim_start();
        let multiplier: u32 = count
            .parse()
            .map_err(|_| PeriodParseError::InvalidFormat(s.clone()))?;
        if multiplier == 0 {
            return Err(PeriodParseError::ZeroMultiplier);
        }

        let scope = match unit {
            "d" | "day" | "days" => PeriodScope::Day,
            "w" | "week" | "weeks" => PeriodScope::Week,
            "m" | "month" | "months" => PeriodScope::Month,
            _ => return Err(PeriodParseError::InvalidFormat(s.clone())),
        };
        Ok(Self::new(scope, multiplier))
    }
}

/// Error type for period parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    InvalidFormat(String),
    ZeroMultiplier,
}

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(f, "Invalid period format: {}", s),
            Self::ZeroMultiplier => write!(f, "Period multiplier must be at least 1"),
        }
    }
}

impl std::error::Error for PeriodParseError {}

/// One anchored instance of a recurring [`Period`]: `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarPeriod {
    anchor: CalendarDay,
    period: Period,
    start: CalendarDay,
    end: CalendarDay,
    bounding_end: Option<CalendarDay>,
}

impl CalendarPeriod {
    /// Build the instance that starts on `instance_start`.
    ///
    /// Returns `None` for non-recurring periods, a zero multiplier, or a date
    /// outside chrono's range. `bounding_end` (exclusive) clips `end` when it
    /// falls earlier.
    pub fn new(
        anchor: CalendarDay,
        period: Period,
        instance_start: CalendarDay,
        bounding_end: Option<CalendarDay>,
    ) -> Option<Self> {
        if !period.is_steppable() {
            return None;
        }
        let unclipped = unclipped_end(anchor, period, instance_start)?;
        let end = match bounding_end {
            Some(bound) if bound < unclipped => bound.max(instance_start),
            _ => unclipped,
        };

        Some(Self {
            anchor,
            period,
            start: instance_start,
            end,
            bounding_end,
        })
    }

    /// Find the instance that contains `day`.
    ///
    /// Returns `None` when `day` is at or past `bounding_end`, or when the
    /// period cannot be stepped.
    pub fn containing(
        anchor: CalendarDay,
        period: Period,
        day: CalendarDay,
        bounding_end: Option<CalendarDay>,
    ) -> Option<Self> {
        if !period.is_steppable() || bounding_end.is_some_and(|bound| day >= bound) {
            return None;
        }

        let start = match period.scope {
            PeriodScope::Day | PeriodScope::Week => {
                let length = fixed_length_days(period);
                let index = anchor.days_until(day).div_euclid(length);
                anchor.add_days(index * length)
            }
            PeriodScope::Month => {
                let step = i64::from(period.multiplier);
                let mut offset = months_between(anchor, day).div_euclid(step) * step;
                let mut start = add_months(anchor, offset)?;
                if start > day {
                    offset -= step;
                    start = add_months(anchor, offset)?;
                }
                start
            }
            PeriodScope::None => return None,
        };

        Self::new(anchor, period, start, bounding_end)
    }

    pub fn start(&self) -> CalendarDay {
        self.start
    }

    /// Exclusive end
    pub fn end(&self) -> CalendarDay {
        self.end
    }

    /// The last day inside the period (the boundary day)
    pub fn last_day(&self) -> CalendarDay {
        self.end.subtract_days(1)
    }

    pub fn anchor(&self) -> CalendarDay {
        self.anchor
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn bounding_end(&self) -> Option<CalendarDay> {
        self.bounding_end
    }

    pub fn contains(&self, day: CalendarDay) -> bool {
        day >= self.start && day < self.end
    }

    pub fn day_count(&self) -> i64 {
        self.start.days_until(self.end)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The following instance, starting where this one ends.
    ///
    /// `None` once the bounding end has been reached.
    pub fn next(&self) -> Option<Self> {
        if self.bounding_end.is_some_and(|bound| self.end >= bound) {
            return None;
        }
        Self::new(self.anchor, self.period, self.end, self.bounding_end)
    }

    /// The preceding instance, ending where this one starts
    pub fn previous(&self) -> Option<Self> {
        let start = match self.period.scope {
            PeriodScope::Day | PeriodScope::Week => {
                self.start.subtract_days(fixed_length_days(self.period))
            }
            PeriodScope::Month => {
                let offset =
                    months_between(self.anchor, self.start) - i64::from(self.period.multiplier);
                add_months(self.anchor, offset)?
            }
            PeriodScope::None => return None,
        };
        Self::new(self.anchor, self.period, start, self.bounding_end)
    }
}

impl fmt::Display for CalendarPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.last_day())
    }
}

fn fixed_length_days(period: Period) -> i64 {
    let unit = match period.scope {
        PeriodScope::Week => 7,
        _ => 1,
    };
    unit * i64::from(period.multiplier)
}

fn unclipped_end(anchor: CalendarDay, period: Period, start: CalendarDay) -> Option<CalendarDay> {
    match period.scope {
        PeriodScope::Day | PeriodScope::Week => Some(start.add_days(fixed_length_days(period))),
        PeriodScope::Month => {
            let offset = months_between(anchor, start) + i64::from(period.multiplier);
            add_months(anchor, offset)
        }
        PeriodScope::None => None,
    }
}

/// Whole calendar months from `from`'s month to `to`'s month, ignoring the day
fn months_between(from: CalendarDay, to: CalendarDay) -> i64 {
    let (a, b) = (from.date(), to.date());
    i64::from(b.year() - a.year()) * 12 + i64::from(b.month()) - i64::from(a.month())
}

/// Add months to the anchor, clamping the day to the target month's length
fn add_months(anchor: CalendarDay, months: i64) -> Option<CalendarDay> {
    let date: NaiveDate = anchor.date();
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    let shifted = if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    };
    shifted.map(CalendarDay::from_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, d).unwrap()
    }

    fn monthly_from(anchor: CalendarDay) -> CalendarPeriod {
        CalendarPeriod::new(anchor, Period::months(1), anchor, None).unwrap()
    }

    #[test]
    fn test_scope_ordering() {
        assert!(PeriodScope::None < PeriodScope::Day);
        assert!(PeriodScope::Day < PeriodScope::Week);
        assert!(PeriodScope::Week < PeriodScope::Month);
    }

    #[test]
    fn test_period_ordering_is_lexicographic() {
        assert!(Period::weeks(5) < Period::months(1));
        assert!(Period::weeks(1) < Period::weeks(2));
        assert!(Period::days(30) < Period::weeks(1));
        assert!(Period::none() < Period::days(1));
    }

    #[test]
    fn test_non_recurring_or_zero_multiplier_yields_nothing() {
        let anchor = day(2025, 1, 1);
        assert!(CalendarPeriod::new(anchor, Period::none(), anchor, None).is_none());
        assert!(CalendarPeriod::new(anchor, Period::months(0), anchor, None).is_none());
        assert!(CalendarPeriod::containing(anchor, Period::days(0), anchor, None).is_none());
    }

    #[test]
    fn test_day_and_week_ends() {
        let anchor = day(2025, 1, 1);
        let three_days = CalendarPeriod::new(anchor, Period::days(3), anchor, None).unwrap();
        assert_eq!(three_days.end(), day(2025, 1, 4));
        assert_eq!(three_days.day_count(), 3);

        let two_weeks = CalendarPeriod::new(anchor, Period::weeks(2), anchor, None).unwrap();
        assert_eq!(two_weeks.end(), day(2025, 1, 15));
        assert_eq!(two_weeks.last_day(), day(2025, 1, 14));
    }

    #[test]
    fn test_month_end_anchored_on_31st_clamps_and_recovers() {
        let jan = monthly_from(day(2025, 1, 31));
        let feb = jan.next().unwrap();
        let mar = feb.next().unwrap();
        let apr = mar.next().unwrap();
        let may = apr.next().unwrap();

        assert_eq!(feb.start(), day(2025, 2, 28));
        assert_eq!(mar.start(), day(2025, 3, 31));
        assert_eq!(apr.start(), day(2025, 4, 30));
        assert_eq!(may.start(), day(2025, 5, 31));
    }

    #[test]
    fn test_month_anchor_in_leap_year() {
        let jan = monthly_from(day(2024, 1, 31));
        let feb = jan.next().unwrap();
        assert_eq!(feb.start(), day(2024, 2, 29));
        assert_eq!(feb.next().unwrap().start(), day(2024, 3, 31));
    }

    #[test]
    fn test_monthly_anchor_does_not_drift_over_many_steps() {
        let mut current = monthly_from(day(2023, 1, 31));
        for _ in 0..24 {
            current = current.next().unwrap();
        }
        assert_eq!(current.start(), day(2025, 1, 31));
    }

    #[test]
    fn test_multi_month_periods() {
        let anchor = day(2025, 1, 31);
        let quarter = CalendarPeriod::new(anchor, Period::months(3), anchor, None).unwrap();
        assert_eq!(quarter.end(), day(2025, 4, 30));
        assert_eq!(quarter.next().unwrap().end(), day(2025, 7, 31));
    }

    #[test]
    fn test_previous_inverts_next() {
        let anchor = day(2025, 1, 31);
        for period in [Period::days(3), Period::weeks(2), Period::months(1), Period::months(2)] {
            let mut p = CalendarPeriod::new(anchor, period, anchor, None).unwrap();
            for _ in 0..14 {
                let next = p.next().unwrap();
                assert_eq!(next.previous().unwrap(), p, "period {}", period);
                assert_eq!(p.previous().unwrap().next().unwrap(), p, "period {}", period);
                p = next;
            }
        }
    }

    #[test]
    fn test_bounding_end_clips_and_stops_iteration() {
        let anchor = day(2025, 1, 1);
        let bound = Some(day(2025, 2, 10));
        let jan = CalendarPeriod::new(anchor, Period::months(1), anchor, bound).unwrap();
        assert_eq!(jan.end(), day(2025, 2, 1));

        let feb = jan.next().unwrap();
        assert_eq!(feb.start(), day(2025, 2, 1));
        assert_eq!(feb.end(), day(2025, 2, 10));
        assert!(feb.next().is_none());
    }

    #[test]
    fn test_containing_finds_the_right_instance() {
        let anchor = day(2025, 1, 31);
        let p = CalendarPeriod::containing(anchor, Period::months(1), day(2025, 3, 1), None).unwrap();
        assert_eq!(p.start(), day(2025, 2, 28));
        assert_eq!(p.end(), day(2025, 3, 31));

        let w = CalendarPeriod::containing(day(2025, 1, 1), Period::weeks(1), day(2025, 1, 20), None)
            .unwrap();
        assert_eq!(w.start(), day(2025, 1, 15));
        assert!(w.contains(day(2025, 1, 21)));
        assert!(!w.contains(day(2025, 1, 22)));
    }

    #[test]
    fn test_containing_before_anchor_and_past_bound() {
        let anchor = day(2025, 3, 15);
        let before = CalendarPeriod::containing(anchor, Period::months(1), day(2025, 3, 1), None).unwrap();
        assert_eq!(before.start(), day(2025, 2, 15));
        assert_eq!(before.end(), anchor);

        let bound = Some(day(2025, 4, 1));
        assert!(CalendarPeriod::containing(anchor, Period::months(1), day(2025, 4, 1), bound).is_none());
    }

    #[test]
    fn test_parse_period() {
        assert_eq!("monthly".parse::<Period>().unwrap(), Period::months(1));
        assert_eq!("2w".parse::<Period>().unwrap(), Period::weeks(2));
        assert_eq!("10days".parse::<Period>().unwrap(), Period::days(10));
        assert_eq!("10 days".parse::<Period>().unwrap(), Period::days(10));
        assert_eq!("none".parse::<Period>().unwrap(), Period::none());
        assert_eq!("0m".parse::<Period>(), Err(PeriodParseError::ZeroMultiplier));
        assert!("3y".parse::<Period>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Period::months(1).to_string(), "1 month");
        assert_eq!(Period::weeks(2).to_string(), "2 weeks");
        assert_eq!(Period::none().to_string(), "none");
        for period in [Period::days(3), Period::weeks(2), Period::months(1), Period::none()] {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
        }
        let p = monthly_from(day(2025, 1, 1));
        assert_eq!(p.to_string(), "2025-01-01..2025-01-31");
    }
}
