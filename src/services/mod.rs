//! Service layer for daily-budget
//!
//! Business logic on top of the storage layer: goal and ledger management,
//! balance calculation and carry-over reconciliation.

pub mod balance;
pub mod carry_over;
pub mod controller;
pub mod goal;
pub mod ledger;

pub use balance::{BalanceCalculator, CarryOverPolicy, LedgerBalanceCalculator};
pub use carry_over::{completed_periods, CarryOverChanges, CarryOverService, Clock, WriteLock};
pub use controller::CarryOverController;
pub use goal::GoalService;
pub use ledger::LedgerService;
