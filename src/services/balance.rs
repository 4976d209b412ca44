//! Balance calculation
//!
//! [`BalanceCalculator`] is the seam reconciliation depends on: given a goal
//! and a day it yields the closing balance of that day. The ledger-backed
//! implementation derives balances from the goal's allowance, the expenses and
//! adjustments of the goal's subtree, and optionally its carry-over rows.

use std::sync::Arc;

use rayon::prelude::*;

use crate::error::BudgetResult;
use crate::models::{CalendarDay, CalendarPeriod, Goal, Money, Period};
use crate::storage::Storage;

/// Whether carry-over rows count toward a computed balance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarryOverPolicy {
    /// Count the goal's active carry-over rows
    Include,
    /// Ignore every carry-over row
    Exclude,
}

/// Computes closing balances. Calls may run concurrently on any thread.
pub trait BalanceCalculator: Send + Sync {
    /// The balance through and including `day` within the goal's current window
    fn closing_balance(
        &self,
        goal: &Goal,
        day: CalendarDay,
        policy: CarryOverPolicy,
    ) -> BudgetResult<Money>;

    /// Closing balances for many days, computed in parallel.
    ///
    /// Results are in the order of `days`. One failed day fails the batch.
    fn closing_balances(
        &self,
        goal: &Goal,
        days: &[CalendarDay],
        policy: CarryOverPolicy,
    ) -> BudgetResult<Vec<Money>> {
        days.par_iter()
            .map(|&day| self.closing_balance(goal, day, policy))
            .collect()
    }
}

/// Balance calculator backed by the stored ledger
pub struct LedgerBalanceCalculator {
    storage: Arc<Storage>,
}

impl LedgerBalanceCalculator {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// First day of the window containing `day`, and the allowance earned by then
    fn window_and_allowance(&self, goal: &Goal, day: CalendarDay) -> (CalendarDay, Money) {
        match goal.period_containing(day) {
            Some(period) => {
                let allowance = allowance(goal.amount, goal.pay_frequency, period.start(), period.end(), day);
                (period.start(), allowance)
            }
            None => {
                let allowance = match goal.bounding_end() {
                    Some(bound) => allowance(goal.amount, goal.pay_frequency, goal.start, bound, day),
                    None => goal.amount,
                };
                (goal.start, allowance)
            }
        }
    }
}

impl BalanceCalculator for LedgerBalanceCalculator {
    fn closing_balance(
        &self,
        goal: &Goal,
        day: CalendarDay,
        policy: CarryOverPolicy,
    ) -> BudgetResult<Money> {
        if day < goal.start {
            return Ok(Money::zero());
        }
        let day = goal.end.map_or(day, |end| day.min(end));

        let (window_start, allowance) = self.window_and_allowance(goal, day);
        let subtree = self.storage.goals.subtree_ids(goal.id)?;

        let spent = self.storage.expenses.total_between(&subtree, window_start, day)?;
        let adjusted = self
            .storage
            .adjustments
            .normal_total_between(&subtree, window_start, day)?;
        let carried = match policy {
            CarryOverPolicy::Include => self
                .storage
                .adjustments
                .active_carry_over_total_between(goal.id, window_start, day)?,
            CarryOverPolicy::Exclude => Money::zero(),
        };

        let balance = allowance - spent + adjusted + carried;
        tracing::trace!(goal = %goal.id, %day, %balance, "closing balance");
        Ok(balance)
    }
}

/// Share of `amount` paid out by `day` over `[start, end)` in installments of
/// `pay_frequency`. A non-recurring pay frequency pays everything up front.
fn allowance(
    amount: Money,
    pay_frequency: Period,
    start: CalendarDay,
    end: CalendarDay,
    day: CalendarDay,
) -> Money {
    if !pay_frequency.is_recurring() {
        return amount;
    }

    let (mut paid, mut total) = (0u32, 0u32);
    let mut installment = CalendarPeriod::new(start, pay_frequency, start, Some(end));
    while let Some(current) = installment.filter(|p| !p.is_empty()) {
        total += 1;
        if current.start() <= day {
            paid += 1;
        }
        installment = current.next();
    }
    amount.prorate(paid, total)
}
