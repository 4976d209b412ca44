//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for goals and their ledgers.

pub mod goal;
pub mod ledger;

pub use goal::{format_goal_details, format_goal_list, GoalSummary};
pub use ledger::{format_adjustment_list, format_expense_list};
