//! Ledger service
//!
//! Records expenses and user adjustments against goals. Carry-over rows are
//! owned by reconciliation and cannot be created here.

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Adjustment, CalendarDay, Expense, GoalId, Money};
use crate::storage::Storage;

pub struct LedgerService<'a> {
    storage: &'a Storage,
}

impl<'a> LedgerService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    fn require_goal(&self, goal_id: GoalId) -> BudgetResult<()> {
        match self.storage.goals.get(goal_id)? {
            Some(_) => Ok(()),
            None => Err(BudgetError::goal_not_found(goal_id.to_string())),
        }
    }

    /// Record a spend against a goal
    pub fn add_expense(
        &self,
        goal_id: GoalId,
        amount: Money,
        date: CalendarDay,
        description: &str,
    ) -> BudgetResult<Expense> {
        self.require_goal(goal_id)?;
        let expense = Expense::new(goal_id, amount, date).with_description(description.trim());
        expense
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        self.storage.expenses.upsert(expense.clone())?;
        self.storage.expenses.save()?;
        self.storage
            .log_create(EntityType::Expense, expense.id.to_string(), &expense)?;
        Ok(expense)
    }

    pub fn list_expenses(&self, goal_id: GoalId) -> BudgetResult<Vec<Expense>> {
        self.storage.expenses.get_by_goal(goal_id)
    }

    /// Add `amount_per_day` to the goal on every day of `[first, last]`
    pub fn add_adjustment(
        &self,
        goal_id: GoalId,
        amount_per_day: Money,
        first: CalendarDay,
        last: CalendarDay,
        description: Option<&str>,
    ) -> BudgetResult<Adjustment> {
        self.require_goal(goal_id)?;
        let mut adjustment = Adjustment::normal(goal_id, amount_per_day, first, last);
        if let Some(text) = description.map(str::trim).filter(|t| !t.is_empty()) {
            adjustment = adjustment.with_description(text);
        }
        adjustment
            .validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        self.storage.adjustments.upsert(adjustment.clone())?;
        self.storage.adjustments.save()?;
        self.storage
            .log_create(EntityType::Adjustment, adjustment.id.to_string(), &adjustment)?;
        Ok(adjustment)
    }

    /// All adjustments of a goal, carry-over rows included
    pub fn list_adjustments(&self, goal_id: GoalId) -> BudgetResult<Vec<Adjustment>> {
        self.storage.adjustments.get_by_goal(goal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BudgetPaths;
    use crate::models::{AdjustmentKind, Goal};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, Goal) {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(BudgetPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        let goal = Goal::monthly("Food", Money::from_cents(30000), day(1));
        storage.goals.upsert(goal.clone()).unwrap();
        (temp_dir, storage, goal)
    }

    fn day(d: u32) -> CalendarDay {
        CalendarDay::from_ymd(2025, 1, d).unwrap()
    }

    #[test]
    fn test_add_and_list_expenses() {
        let (_temp, storage, goal) = setup();
        let ledger = LedgerService::new(&storage);

        ledger
            .add_expense(goal.id, Money::from_cents(1250), day(3), " lunch ")
            .unwrap();
        let expenses = ledger.list_expenses(goal.id).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].description, "lunch");

        assert!(ledger
            .add_expense(goal.id, Money::zero(), day(3), "")
            .unwrap_err()
            .is_validation());
        assert!(ledger
            .add_expense(GoalId::new(), Money::from_cents(1), day(3), "")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_adjustments_are_normal_and_validated() {
        let (_temp, storage, goal) = setup();
        let ledger = LedgerService::new(&storage);

        let added = ledger
            .add_adjustment(goal.id, Money::from_cents(500), day(1), day(7), Some("bonus"))
            .unwrap();
        assert_eq!(added.kind, AdjustmentKind::Normal);
        assert_eq!(added.short_description.as_deref(), Some("bonus"));

        let inverted = ledger.add_adjustment(goal.id, Money::from_cents(5), day(7), day(1), None);
        assert!(inverted.unwrap_err().is_validation());
        assert_eq!(ledger.list_adjustments(goal.id).unwrap().len(), 1);
    }
}
