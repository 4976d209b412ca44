//! Goal CLI commands

use std::sync::{mpsc, Arc};

use clap::{Subcommand, ValueEnum};

use crate::display::goal::{format_goal_details, format_goal_list, GoalSummary};
use crate::error::BudgetResult;
use crate::models::{Goal, GoalId};
use crate::services::{
    BalanceCalculator, CarryOverController, CarryOverPolicy, GoalService, LedgerBalanceCalculator,
};
use crate::storage::Storage;

use super::{
    describe_changes, parse_day, parse_money, parse_period, reconcile_lineage, resolve_goal,
    wait_for,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Goal subcommands
#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a new goal
    Add {
        /// Goal name
        name: String,
        /// Amount available per period (e.g., "300.00")
        amount: String,
        /// Recurrence: monthly, weekly, biweekly, daily, 2w, 10d, none
        #[arg(short, long, default_value = "monthly")]
        period: String,
        /// How often installments are paid out within a period (defaults to the period)
        #[arg(long)]
        pay: Option<String>,
        /// First day of the goal (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,
        /// Last day of the goal (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
        /// Roll leftover balances into the next period
        #[arg(long)]
        carry_over: bool,
        /// Parent goal name or ID
        #[arg(long)]
        parent: Option<String>,
    },
    /// List goals with today's balances
    List {
        /// Show archived goals
        #[arg(short, long)]
        all: bool,
    },
    /// Show goal details
    Show {
        /// Goal name or ID
        goal: String,
    },
    /// Move a goal under another goal, or to the top level
    Move {
        /// Goal name or ID
        goal: String,
        /// New parent name or ID; omit for top level
        #[arg(long)]
        parent: Option<String>,
    },
    /// Archive a goal
    Archive {
        /// Goal name or ID
        goal: String,
    },
    /// Turn carry-over of leftover balances on or off
    CarryOver {
        /// Goal name or ID
        goal: String,
        #[arg(value_enum)]
        state: Toggle,
    },
}

/// Handle a goal command
pub fn handle_goal_command(
    storage: &Arc<Storage>,
    controller: &CarryOverController,
    cmd: GoalCommands,
) -> BudgetResult<()> {
    let service = GoalService::new(storage);
    let today = controller.service().today();

    match cmd {
        GoalCommands::Add {
            name,
            amount,
            period,
            pay,
            start,
            end,
            carry_over,
            parent,
        } => {
            let period = parse_period(&period)?;
            let start = start.as_deref().map(parse_day).transpose()?.unwrap_or(today);
            let mut goal = Goal::new(name, parse_money(&amount)?, period, start).with_carry_over(carry_over);
            if let Some(pay) = pay {
                goal = goal.with_pay_frequency(parse_period(&pay)?);
            }
            if let Some(end) = end {
                goal = goal.with_end(parse_day(&end)?);
            }
            if let Some(parent) = parent {
                goal = goal.with_parent(resolve_goal(storage, &parent)?.id);
            }

            let goal = service.create(goal)?;
            println!("Created goal: {}", goal.name);
            println!("  Amount: {} per {}", goal.amount, goal.period);
            println!("  Start:  {}", goal.start);
            println!("  ID:     {}", goal.id);

            let changes = reconcile_lineage(storage, controller, goal.id)?;
            println!("{}", describe_changes(&changes));
        }

        GoalCommands::List { all } => {
            let goals = service.list(all)?;
            let calculator = LedgerBalanceCalculator::new(Arc::clone(storage));
            let mut summaries = Vec::with_capacity(goals.len());
            for (goal, depth) in tree_order(goals) {
                let balance = calculator.closing_balance(&goal, today, CarryOverPolicy::Include)?;
                summaries.push(GoalSummary {
                    goal,
                    balance,
                    depth,
                });
            }
            print!("{}", format_goal_list(&summaries));
        }

        GoalCommands::Show { goal } => {
            let goal = resolve_goal(storage, &goal)?;
            let calculator = LedgerBalanceCalculator::new(Arc::clone(storage));
            let balance = calculator.closing_balance(&goal, today, CarryOverPolicy::Include)?;
            let parent = match goal.parent_goal_id {
                Some(id) => service.get(id)?,
                None => None,
            };
            let children = service.children(goal.id)?;
            let summary = GoalSummary {
                goal,
                balance,
                depth: 0,
            };
            print!("{}", format_goal_details(&summary, parent.as_ref(), &children));
        }

        GoalCommands::Move { goal, parent } => {
            let goal = resolve_goal(storage, &goal)?;
            let parent_id = match parent {
                Some(parent) => Some(resolve_goal(storage, &parent)?.id),
                None => None,
            };
            let old_parent = goal.parent_goal_id;
            let moved = service.set_parent(goal.id, parent_id)?;

            for affected in [old_parent, parent_id].into_iter().flatten() {
                let changes = reconcile_lineage(storage, controller, affected)?;
                tracing::debug!(goal = %affected, changes = changes.len(), "reparent reconciled");
            }
            println!("Moved goal: {}", moved.name);
        }

        GoalCommands::Archive { goal } => {
            let goal = resolve_goal(storage, &goal)?;
            let archived = service.archive(goal.id)?;
            println!("Archived goal: {}", archived.name);
        }

        GoalCommands::CarryOver { goal, state } => {
            let goal = resolve_goal(storage, &goal)?;
            let (tx, rx) = mpsc::channel();
            controller.set_carry_over_balance(goal.id, state == Toggle::On, move |changes| {
                let _ = tx.send(changes);
            });
            let changes = wait_for(&rx, "Carry-over toggle")?;
            println!(
                "Carry-over {} for {}",
                if state == Toggle::On { "enabled" } else { "disabled" },
                goal.name
            );
            println!("{}", describe_changes(&changes));
        }
    }

    Ok(())
}

/// Order goals parent-before-children with their depth.
///
/// Goals whose parent is not in `goals` are listed at the top level.
fn tree_order(goals: Vec<Goal>) -> Vec<(Goal, usize)> {
    let ids: Vec<GoalId> = goals.iter().map(|g| g.id).collect();
    let (mut pending, roots): (Vec<_>, Vec<_>) = goals
        .into_iter()
        .partition(|g| g.parent_goal_id.is_some_and(|p| ids.contains(&p)));

    let mut ordered = Vec::with_capacity(ids.len());
    let mut stack: Vec<(Goal, usize)> = roots.into_iter().rev().map(|g| (g, 0)).collect();
    while let Some((goal, depth)) = stack.pop() {
        let (children, rest): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|g| g.parent_goal_id == Some(goal.id));
        pending = rest;
        stack.extend(children.into_iter().rev().map(|g| (g, depth + 1)));
        ordered.push((goal, depth));
    }
    // cycles leave goals unreachable from any root
    ordered.extend(pending.into_iter().map(|g| (g, 0)));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalendarDay, Money};

    #[test]
    fn test_tree_order_nests_children() {
        let start = CalendarDay::from_ymd(2025, 1, 1).unwrap();
        let home = Goal::monthly("Home", Money::from_cents(100), start);
        let food = Goal::monthly("Food", Money::from_cents(100), start).with_parent(home.id);
        let travel = Goal::monthly("Travel", Money::from_cents(100), start);
        let snacks = Goal::monthly("Snacks", Money::from_cents(100), start).with_parent(food.id);

        let ordered: Vec<_> = tree_order(vec![snacks, travel, food, home])
            .into_iter()
            .map(|(g, depth)| (g.name, depth))
            .collect();

        assert_eq!(
            ordered,
            vec![
                ("Travel".to_string(), 0),
                ("Home".to_string(), 0),
                ("Food".to_string(), 1),
                ("Snacks".to_string(), 2),
            ]
        );
    }
}
