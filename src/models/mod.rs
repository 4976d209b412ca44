//! Core data models for daily-budget
//!
//! Days, recurrence periods, goals, expenses and adjustments. Everything here
//! is plain data plus invariant checks; persistence lives in `storage` and
//! the reconciliation logic in `services`.

pub mod adjustment;
pub mod day;
pub mod expense;
pub mod goal;
pub mod ids;
pub mod money;
pub mod period;

pub use adjustment::{Adjustment, AdjustmentKind, AdjustmentValidationError, CarryOverState};
pub use day::CalendarDay;
pub use expense::{Expense, ExpenseValidationError};
pub use goal::{Goal, GoalValidationError};
pub use ids::{AdjustmentId, ExpenseId, GoalId};
pub use money::Money;
pub use period::{CalendarPeriod, Period, PeriodParseError, PeriodScope};
