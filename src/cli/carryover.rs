//! Carry-over CLI commands
//!
//! Run reconciliation on demand. Every request goes through the controller's
//! worker pool; the command blocks until its completion arrives.

use std::sync::{mpsc, Arc};

use clap::Subcommand;

use crate::error::BudgetResult;
use crate::services::{CarryOverChanges, CarryOverController, GoalService};
use crate::storage::Storage;

use super::{describe_changes, parse_day, resolve_goal, wait_for};

/// Carry-over subcommands
#[derive(Subcommand)]
pub enum CarryOverCommands {
    /// Bring carry-over rows in line with current balances
    Sync {
        /// Goal name or ID; every active goal when omitted
        goal: Option<String>,
    },
    /// Activate the carry-over of the period ending on a day
    Enable {
        /// Goal name or ID
        goal: String,
        /// Last day of the period whose leftover should carry (YYYY-MM-DD)
        day: String,
    },
    /// Reconcile after an import; new rows start disabled
    ImportFixup {
        /// Goal name or ID
        goal: String,
    },
}

pub fn handle_carryover_command(
    storage: &Arc<Storage>,
    controller: &CarryOverController,
    cmd: CarryOverCommands,
) -> BudgetResult<()> {
    match cmd {
        CarryOverCommands::Sync { goal } => {
            let goals = match goal {
                Some(goal) => vec![resolve_goal(storage, &goal)?],
                None => GoalService::new(storage).list(false)?,
            };

            let (tx, rx) = mpsc::channel();
            for goal in &goals {
                let tx = tx.clone();
                controller.update_carry_over_adjustments(goal.id, move |changes| {
                    let _ = tx.send(changes);
                });
            }
            drop(tx);

            let mut total = CarryOverChanges::default();
            for _ in &goals {
                total.extend(wait_for(&rx, "Carry-over sync")?);
            }
            println!("Synced {} goal(s)", goals.len());
            println!("{}", describe_changes(&total));
        }

        CarryOverCommands::Enable { goal, day } => {
            let goal = resolve_goal(storage, &goal)?;
            let day = parse_day(&day)?;
            let (tx, rx) = mpsc::channel();
            controller.enable_carry_over_adjustment_for_day(goal.id, day, move |id| {
                let _ = tx.send(id);
            });
            let id = wait_for(&rx, "Enabling carry-over")?;
            println!("Enabled carry-over from {} into {} for {}", day, day.add_days(1), goal.name);
            println!("  Adjustment: {}", id);
        }

        CarryOverCommands::ImportFixup { goal } => {
            let goal = resolve_goal(storage, &goal)?;
            let (tx, rx) = mpsc::channel();
            controller.perform_post_import_tasks(goal.id, move |changes| {
                let _ = tx.send(changes);
            });
            let changes = wait_for(&rx, "Post-import reconciliation")?;
            println!("{}", describe_changes(&changes));
        }
    }

    Ok(())
}
