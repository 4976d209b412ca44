//! Budget goal model
//!
//! A goal is an amount of money available per period (or once, for
//! non-recurring goals), paid out in installments at the pay frequency.
//! Goals form a tree through `parent_goal_id`; a parent sees the spending of
//! all its descendants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::day::CalendarDay;
use super::ids::GoalId;
use super::money::Money;
use super::period::{CalendarPeriod, Period};

/// A budget goal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    /// Amount available per period
    pub amount: Money,
    /// How often the goal recurs; `PeriodScope::None` for a one-off goal
    pub period: Period,
    /// How often installments of `amount` become available within a period
    pub pay_frequency: Period,
    pub start: CalendarDay,
    /// Last day of the goal (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<CalendarDay>,
    #[serde(default)]
    pub archived: bool,
    /// Whether leftover balances roll into the next period
    #[serde(default)]
    pub carry_over_balance: bool,
    #[serde(default)]
    pub adjust_month_amount_automatically: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_goal_id: Option<GoalId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    /// Create a goal paid out once per period
    pub fn new(name: impl Into<String>, amount: Money, period: Period, start: CalendarDay) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            name: name.into(),
            amount,
            period,
            pay_frequency: period,
            start,
            end: None,
            archived: false,
            carry_over_balance: false,
            adjust_month_amount_automatically: false,
            parent_goal_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a monthly goal paid out daily
    pub fn monthly(name: impl Into<String>, amount: Money, start: CalendarDay) -> Self {
        let mut goal = Self::new(name, amount, Period::months(1), start);
        goal.pay_frequency = Period::days(1);
        goal
    }

    pub fn with_pay_frequency(mut self, pay_frequency: Period) -> Self {
        self.pay_frequency = pay_frequency;
        self
    }

    pub fn with_end(mut self, end: CalendarDay) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_carry_over(mut self, enabled: bool) -> Self {
        self.carry_over_balance = enabled;
        self
    }

    pub fn with_parent(mut self, parent: GoalId) -> Self {
        self.parent_goal_id = Some(parent);
        self
    }

    pub fn is_recurring(&self) -> bool {
        self.period.is_recurring()
    }

    /// Exclusive upper bound for period iteration (the day after `end`)
    pub fn bounding_end(&self) -> Option<CalendarDay> {
        self.end.map(|end| end.add_days(1))
    }

    /// The first period instance, or `None` for non-recurring goals
    pub fn first_period(&self) -> Option<CalendarPeriod> {
        CalendarPeriod::new(self.start, self.period, self.start, self.bounding_end())
    }

    /// The period instance containing `day`
    pub fn period_containing(&self, day: CalendarDay) -> Option<CalendarPeriod> {
        if day < self.start {
            return None;
        }
        CalendarPeriod::containing(self.start, self.period, day, self.bounding_end())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Check the model invariants
    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.name.trim().is_empty() {
            return Err(GoalValidationError::EmptyName);
        }
        if self.amount.is_negative() {
            return Err(GoalValidationError::NegativeAmount(self.amount));
        }
        if let Some(end) = self.end {
            if end < self.start {
                return Err(GoalValidationError::EndBeforeStart {
                    start: self.start,
                    end,
                });
            }
        }
        if self.period.multiplier == 0 || self.pay_frequency.multiplier == 0 {
            return Err(GoalValidationError::ZeroMultiplier);
        }

        if self.is_recurring() {
            if !self.pay_frequency.is_recurring() {
                return Err(GoalValidationError::MissingPayFrequency);
            }
            if self.pay_frequency > self.period {
                return Err(GoalValidationError::PayFrequencyTooCoarse {
                    period: self.period,
                    pay_frequency: self.pay_frequency,
                });
            }
        } else if self.pay_frequency.is_recurring() && self.end.is_none() {
            return Err(GoalValidationError::InstallmentsWithoutEnd);
        }

        if self.parent_goal_id == Some(self.id) {
            return Err(GoalValidationError::OwnParent);
        }

        Ok(())
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} / {})", self.name, self.amount, self.period)
    }
}

/// Validation errors for goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyName,
    NegativeAmount(Money),
    EndBeforeStart { start: CalendarDay, end: CalendarDay },
    ZeroMultiplier,
    MissingPayFrequency,
    PayFrequencyTooCoarse { period: Period, pay_frequency: Period },
    InstallmentsWithoutEnd,
    OwnParent,
}

impl fmt::Display for GoalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Goal name cannot be empty"),
            Self::NegativeAmount(amount) => write!(f, "Goal amount cannot be negative: {}", amount),
            Self::EndBeforeStart { start, end } => {
                write!(f, "Goal ends ({}) before it starts ({})", end, start)
            }
            Self::ZeroMultiplier => write!(f, "Period multipliers must be at least 1"),
            Self::MissingPayFrequency => {
                write!(f, "Recurring goals need a recurring pay frequency")
            }
            Self::PayFrequencyTooCoarse {
                period,
                pay_frequency,
            } => write!(
                f,
                "Pay frequency ({}) is longer than the goal period ({})",
                pay_frequency, period
            ),
            Self::InstallmentsWithoutEnd => {
                write!(f, "A one-off goal paid in installments needs an end date")
            }
            Self::OwnParent => write!(f, "A goal cannot be its own parent"),
        }
    }
}

impl std::error::Error for GoalValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_goal_is_valid_and_recurring() {
        let goal = Goal::monthly("Groceries", Money::from_cents(40000), day(2025, 1, 1));
        assert!(goal.is_recurring());
        assert!(goal.validate().is_ok());
        assert_eq!(goal.first_period().unwrap().end(), day(2025, 2, 1));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let goal = Goal::monthly("Trip", Money::from_cents(100), day(2025, 3, 1))
            .with_end(day(2025, 2, 1));
        assert!(matches!(
            goal.validate(),
            Err(GoalValidationError::EndBeforeStart { .. })
        ));
    }

    #[test]
    fn test_pay_frequency_coarser_than_period_rejected() {
        let goal = Goal::new("Lunch", Money::from_cents(5000), Period::weeks(1), day(2025, 1, 1))
            .with_pay_frequency(Period::months(1));
        assert!(matches!(
            goal.validate(),
            Err(GoalValidationError::PayFrequencyTooCoarse { .. })
        ));

        let ok = Goal::new("Rent", Money::from_cents(5000), Period::months(1), day(2025, 1, 1))
            .with_pay_frequency(Period::weeks(2));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_one_off_installments_need_end() {
        let goal = Goal::new("Gift", Money::from_cents(5000), Period::none(), day(2025, 1, 1))
            .with_pay_frequency(Period::weeks(1));
        assert_eq!(goal.validate(), Err(GoalValidationError::InstallmentsWithoutEnd));
        assert!(goal.with_end(day(2025, 2, 1)).validate().is_ok());
    }

    #[test]
    fn test_own_parent_rejected() {
        let mut goal = Goal::monthly("Loop", Money::from_cents(1), day(2025, 1, 1));
        goal.parent_goal_id = Some(goal.id);
        assert_eq!(goal.validate(), Err(GoalValidationError::OwnParent));
    }

    #[test]
    fn test_period_containing_respects_start_and_end() {
        let goal = Goal::monthly("Fuel", Money::from_cents(100), day(2025, 1, 15))
            .with_end(day(2025, 3, 20));
        assert!(goal.period_containing(day(2025, 1, 14)).is_none());
        let feb = goal.period_containing(day(2025, 2, 20)).unwrap();
        assert_eq!(feb.start(), day(2025, 2, 15));
        let last = goal.period_containing(day(2025, 3, 20)).unwrap();
        assert_eq!(last.end(), day(2025, 3, 21));
        assert!(goal.period_containing(day(2025, 3, 21)).is_none());
    }

    #[test]
    fn test_serialization_omits_empty_optionals() {
        let goal = Goal::monthly("Coffee", Money::from_cents(3000), day(2025, 1, 1));
        let json = serde_json::to_value(&goal).unwrap();
        assert!(json.get("end").is_none());
        assert!(json.get("parent_goal_id").is_none());
        let back: Goal = serde_json::from_value(json).unwrap();
        assert_eq!(back, goal);
    }
}
