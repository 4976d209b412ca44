//! Expense CLI commands

use std::sync::Arc;

use clap::Subcommand;

use crate::display::ledger::format_expense_list;
use crate::error::BudgetResult;
use crate::services::{CarryOverController, LedgerService};
use crate::storage::Storage;

use super::{describe_changes, parse_day, parse_money, reconcile_lineage, resolve_goal};

/// Expense subcommands
#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Record an expense against a goal
    Add {
        /// Goal name or ID
        goal: String,
        /// Amount spent (e.g., "12.50"); negative for a refund
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
        /// Description
        #[arg(short = 'm', long, default_value = "")]
        description: String,
    },
    /// List a goal's expenses
    List {
        /// Goal name or ID
        goal: String,
    },
}

pub fn handle_expense_command(
    storage: &Arc<Storage>,
    controller: &CarryOverController,
    cmd: ExpenseCommands,
) -> BudgetResult<()> {
    let ledger = LedgerService::new(storage);

    match cmd {
        ExpenseCommands::Add {
            goal,
            amount,
            date,
            description,
        } => {
            let goal = resolve_goal(storage, &goal)?;
            let date = match date {
                Some(date) => parse_day(&date)?,
                None => controller.service().today(),
            };
            let expense = ledger.add_expense(goal.id, parse_money(&amount)?, date, &description)?;
            println!("Recorded {} on {} for {}", expense.amount, expense.date, goal.name);

            let changes = reconcile_lineage(storage, controller, goal.id)?;
            println!("{}", describe_changes(&changes));
        }

        ExpenseCommands::List { goal } => {
            let goal = resolve_goal(storage, &goal)?;
            print!("{}", format_expense_list(&ledger.list_expenses(goal.id)?));
        }
    }

    Ok(())
}
