//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod adjust;
pub mod carryover;
pub mod expense;
pub mod goal;

pub use adjust::{handle_adjust_command, AdjustCommands};
pub use carryover::{handle_carryover_command, CarryOverCommands};
pub use expense::{handle_expense_command, ExpenseCommands};
pub use goal::{handle_goal_command, GoalCommands};

use std::sync::mpsc;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{CalendarDay, Goal, GoalId, Money, Period};
use crate::services::{CarryOverChanges, CarryOverController, GoalService};
use crate::storage::Storage;

pub(crate) fn parse_money(input: &str) -> BudgetResult<Money> {
    Money::parse(input).map_err(|e| {
        BudgetError::Validation(format!(
            "Invalid amount: '{}'. Use a format like '12.50' or '12'. Error: {}",
            input, e
        ))
    })
}

pub fn parse_day(input: &str) -> BudgetResult<CalendarDay> {
    input.parse().map_err(|e| {
        BudgetError::Validation(format!("Invalid date: '{}'. Use YYYY-MM-DD. Error: {}", input, e))
    })
}

pub(crate) fn parse_period(input: &str) -> BudgetResult<Period> {
    input.parse().map_err(|e| {
        BudgetError::Validation(format!(
            "Invalid period: '{}'. Use e.g. 'monthly', 'weekly', '2w', '10d' or 'none'. Error: {}",
            input, e
        ))
    })
}

/// Resolve a goal by name or ID, failing with `NotFound`
pub fn resolve_goal(storage: &Storage, identifier: &str) -> BudgetResult<Goal> {
    GoalService::new(storage)
        .find(identifier)?
        .ok_or_else(|| BudgetError::goal_not_found(identifier))
}

/// Block until a controller completion arrives
pub(crate) fn wait_for<T>(rx: &mpsc::Receiver<Option<T>>, what: &str) -> BudgetResult<T> {
    match rx.recv() {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(BudgetError::Reconciliation(format!(
            "{} failed; see the log file for details",
            what
        ))),
        Err(_) => Err(BudgetError::Reconciliation(format!(
            "{} was dropped before completing",
            what
        ))),
    }
}

/// Reconcile a goal and every ancestor, since ancestors see its spending
pub(crate) fn reconcile_lineage(
    storage: &Storage,
    controller: &CarryOverController,
    goal_id: GoalId,
) -> BudgetResult<CarryOverChanges> {
    let service = GoalService::new(storage);
    let mut lineage = vec![service.require(goal_id)?];
    lineage.extend(service.ancestors(goal_id)?);

    let (tx, rx) = mpsc::channel();
    for goal in &lineage {
        let tx = tx.clone();
        controller.update_carry_over_adjustments(goal.id, move |changes| {
            let _ = tx.send(changes);
        });
    }
    drop(tx);

    let mut total = CarryOverChanges::default();
    for _ in &lineage {
        total.extend(wait_for(&rx, "Carry-over update")?);
    }
    Ok(total)
}

/// One-line summary of a reconciliation
pub(crate) fn describe_changes(changes: &CarryOverChanges) -> String {
    if changes.is_empty() {
        return "Carry-over rows already up to date".to_string();
    }
    format!(
        "Carry-over rows: {} inserted, {} updated, {} deleted",
        changes.inserted.len(),
        changes.updated.len(),
        changes.deleted.len()
    )
}
