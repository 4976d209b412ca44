//! Balance adjustments
//!
//! Normal adjustments are entered by the user and add `amount_per_day` on
//! every day of their inclusive range. Carry-over adjustments are owned by the
//! reconciliation service: one single-day row per completed period, dated the
//! day after the period's boundary, holding that period's closing balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::day::CalendarDay;
use super::ids::{AdjustmentId, GoalId};
use super::money::Money;

/// Whether a carry-over row counts toward balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarryOverState {
    /// The leftover rolls into the next period
    Active,
    /// Kept with its amount so it can be re-enabled, but contributes nothing
    Disabled,
}

impl CarryOverState {
    pub fn for_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Active
        } else {
            Self::Disabled
        }
    }
}

/// What kind of adjustment a row is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdjustmentKind {
    Normal,
    CarryOver { state: CarryOverState },
}

impl AdjustmentKind {
    pub fn is_carry_over(&self) -> bool {
        matches!(self, Self::CarryOver { .. })
    }

    pub fn carry_over_state(&self) -> Option<CarryOverState> {
        match self {
            Self::Normal => None,
            Self::CarryOver { state } => Some(*state),
        }
    }

    /// Whether rows of this kind count toward a balance
    pub fn contributes(&self) -> bool {
        match self {
            Self::Normal => true,
            Self::CarryOver { state } => *state == CarryOverState::Active,
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Adjustment"),
            Self::CarryOver {
                state: CarryOverState::Active,
            } => write!(f, "Carry-over"),
            Self::CarryOver {
                state: CarryOverState::Disabled,
            } => write!(f, "Carry-over (disabled)"),
        }
    }
}

/// A dated modifier of a goal's balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub id: AdjustmentId,
    pub goal_id: GoalId,
    pub amount_per_day: Money,
    pub first_day_effective: CalendarDay,
    pub last_day_effective: CalendarDay,
    pub kind: AdjustmentKind,
    pub date_created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
}

impl Adjustment {
    /// Create a user adjustment over an inclusive day range
    pub fn normal(
        goal_id: GoalId,
        amount_per_day: Money,
        first_day_effective: CalendarDay,
        last_day_effective: CalendarDay,
    ) -> Self {
        Self {
            id: AdjustmentId::new(),
            goal_id,
            amount_per_day,
            first_day_effective,
            last_day_effective,
            kind: AdjustmentKind::Normal,
            date_created: Utc::now(),
            short_description: None,
        }
    }

    /// Create a single-day carry-over row
    pub fn carry_over(goal_id: GoalId, day: CalendarDay, amount: Money, state: CarryOverState) -> Self {
        Self {
            id: AdjustmentId::new(),
            goal_id,
            amount_per_day: amount,
            first_day_effective: day,
            last_day_effective: day,
            kind: AdjustmentKind::CarryOver { state },
            date_created: Utc::now(),
            short_description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.short_description = Some(description.into());
        self
    }

    pub fn is_carry_over(&self) -> bool {
        self.kind.is_carry_over()
    }

    /// The day a carry-over row is dated on
    pub fn day(&self) -> CalendarDay {
        self.first_day_effective
    }

    /// Total contribution to a balance over the inclusive window `[from, to]`
    pub fn contribution_between(&self, from: CalendarDay, to: CalendarDay) -> Money {
        if !self.kind.contributes() {
            return Money::zero();
        }
        let first = self.first_day_effective.max(from);
        let last = self.last_day_effective.min(to);
        if first > last {
            return Money::zero();
        }
        self.amount_per_day.times(first.days_until(last) + 1)
    }

    pub fn validate(&self) -> Result<(), AdjustmentValidationError> {
        if self.first_day_effective > self.last_day_effective {
            return Err(AdjustmentValidationError::InvertedRange {
                first: self.first_day_effective,
                last: self.last_day_effective,
            });
        }
        match self.kind {
            AdjustmentKind::Normal if self.amount_per_day.is_zero() => {
                Err(AdjustmentValidationError::ZeroAmount)
            }
            AdjustmentKind::CarryOver { .. }
                if self.first_day_effective != self.last_day_effective =>
            {
                Err(AdjustmentValidationError::MultiDayCarryOver)
            }
            _ => Ok(()),
        }
    }
}

/// Validation errors for adjustments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentValidationError {
    InvertedRange { first: CalendarDay, last: CalendarDay },
    ZeroAmount,
    MultiDayCarryOver,
}

impl fmt::Display for AdjustmentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedRange { first, last } => {
                write!(f, "Adjustment ends ({}) before it starts ({})", last, first)
            }
            Self::ZeroAmount => write!(f, "Adjustment amount cannot be zero"),
            Self::MultiDayCarryOver => write!(f, "Carry-over adjustments cover exactly one day"),
        }
    }
}

impl std::error::Error for AdjustmentValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_disabled_carry_over_contributes_nothing() {
        let goal = GoalId::new();
        let disabled = Adjustment::carry_over(
            goal,
            day(2025, 2, 1),
            Money::from_cents(500),
            CarryOverState::Disabled,
        );
        assert_eq!(
            disabled.contribution_between(day(2025, 2, 1), day(2025, 2, 28)),
            Money::zero()
        );

        let active = Adjustment {
            kind: AdjustmentKind::CarryOver {
                state: CarryOverState::Active,
            },
            ..disabled
        };
        assert_eq!(
            active.contribution_between(day(2025, 2, 1), day(2025, 2, 28)),
            Money::from_cents(500)
        );
    }

    #[test]
    fn test_normal_contribution_clips_to_window() {
        let adj = Adjustment::normal(
            GoalId::new(),
            Money::from_cents(100),
            day(2025, 1, 28),
            day(2025, 2, 3),
        );
        assert_eq!(
            adj.contribution_between(day(2025, 2, 1), day(2025, 2, 28)).cents(),
            300
        );
        assert_eq!(
            adj.contribution_between(day(2025, 3, 1), day(2025, 3, 31)),
            Money::zero()
        );
    }

    #[test]
    fn test_validation() {
        let goal = GoalId::new();
        let zero = Adjustment::normal(goal, Money::zero(), day(2025, 1, 1), day(2025, 1, 1));
        assert_eq!(zero.validate(), Err(AdjustmentValidationError::ZeroAmount));

        let inverted = Adjustment::normal(goal, Money::from_cents(1), day(2025, 1, 2), day(2025, 1, 1));
        assert!(matches!(
            inverted.validate(),
            Err(AdjustmentValidationError::InvertedRange { .. })
        ));

        let zero_carry = Adjustment::carry_over(goal, day(2025, 2, 1), Money::zero(), CarryOverState::Active);
        assert!(zero_carry.validate().is_ok());

        let mut stretched = zero_carry.clone();
        stretched.last_day_effective = day(2025, 2, 2);
        assert_eq!(
            stretched.validate(),
            Err(AdjustmentValidationError::MultiDayCarryOver)
        );
    }

    #[test]
    fn test_kind_serialization_is_tagged() {
        let kind = AdjustmentKind::CarryOver {
            state: CarryOverState::Disabled,
        };
        let json = serde_json::to_string(&kind).unwrap();
        assert_eq!(json, r#"{"type":"carry_over","state":"disabled"}"#);
        let normal = serde_json::to_string(&AdjustmentKind::Normal).unwrap();
        assert_eq!(normal, r#"{"type":"normal"}"#);
    }
}
