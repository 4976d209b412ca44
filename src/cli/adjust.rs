//! Adjustment CLI commands

use std::sync::Arc;

use clap::Subcommand;

use crate::display::ledger::format_adjustment_list;
use crate::error::BudgetResult;
use crate::services::{CarryOverController, LedgerService};
use crate::storage::Storage;

use super::{describe_changes, parse_day, parse_money, reconcile_lineage, resolve_goal};

/// Adjustment subcommands
#[derive(Subcommand)]
pub enum AdjustCommands {
    /// Add or remove money from a goal over a range of days
    Add {
        /// Goal name or ID
        goal: String,
        /// Amount per day (e.g., "5.00" or "-2.50")
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// First day (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        from: Option<String>,
        /// Last day (YYYY-MM-DD, defaults to the first day)
        #[arg(long)]
        to: Option<String>,
        /// Short note
        #[arg(short = 'm', long)]
        note: Option<String>,
    },
    /// List a goal's adjustments, carry-over rows included
    List {
        /// Goal name or ID
        goal: String,
    },
}

pub fn handle_adjust_command(
    storage: &Arc<Storage>,
    controller: &CarryOverController,
    cmd: AdjustCommands,
) -> BudgetResult<()> {
    let ledger = LedgerService::new(storage);

    match cmd {
        AdjustCommands::Add {
            goal,
            amount,
            from,
            to,
            note,
        } => {
            let goal = resolve_goal(storage, &goal)?;
            let first = match from {
                Some(from) => parse_day(&from)?,
                None => controller.service().today(),
            };
            let last = to.as_deref().map(parse_day).transpose()?.unwrap_or(first);

            let adjustment = ledger.add_adjustment(
                goal.id,
                parse_money(&amount)?,
                first,
                last,
                note.as_deref(),
            )?;
            println!(
                "Added {} per day to {} from {} to {}",
                adjustment.amount_per_day,
                goal.name,
                adjustment.first_day_effective,
                adjustment.last_day_effective
            );

            let changes = reconcile_lineage(storage, controller, goal.id)?;
            println!("{}", describe_changes(&changes));
        }

        AdjustCommands::List { goal } => {
            let goal = resolve_goal(storage, &goal)?;
            print!("{}", format_adjustment_list(&ledger.list_adjustments(goal.id)?));
        }
    }

    Ok(())
}
