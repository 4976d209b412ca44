//! Expense repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{CalendarDay, Expense, ExpenseId, GoalId, Money};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct ExpenseData {
    #[serde(default)]
    expenses: Vec<Expense>,
}

pub struct ExpenseRepository {
    path: PathBuf,
    expenses: RwLock<HashMap<ExpenseId, Expense>>,
}

impl ExpenseRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            expenses: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: ExpenseData = read_json(&self.path)?;
        let mut expenses = write_guard(&self.expenses)?;
        expenses.clear();
        expenses.extend(file_data.expenses.into_iter().map(|e| (e.id, e)));
        Ok(())
    }

    pub fn save(&self) -> Result<(), BudgetError> {
        let mut list: Vec<_> = read_guard(&self.expenses)?.values().cloned().collect();
        list.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        write_json_atomic(&self.path, &ExpenseData { expenses: list })
    }

    pub fn get(&self, id: ExpenseId) -> Result<Option<Expense>, BudgetError> {
        Ok(read_guard(&self.expenses)?.get(&id).cloned())
    }

    /// Expenses of one goal, by date
    pub fn get_by_goal(&self, goal_id: GoalId) -> Result<Vec<Expense>, BudgetError> {
        let expenses = read_guard(&self.expenses)?;
        let mut list: Vec<_> = expenses
            .values()
            .filter(|e| e.goal_id == goal_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(list)
    }

    /// Total spent by any of `goal_ids` within the inclusive window
    pub fn total_between(
        &self,
        goal_ids: &[GoalId],
        from: CalendarDay,
        to: CalendarDay,
    ) -> Result<Money, BudgetError> {
        let expenses = read_guard(&self.expenses)?;
        Ok(expenses
            .values()
            .filter(|e| goal_ids.contains(&e.goal_id) && e.date >= from && e.date <= to)
            .map(|e| e.amount)
            .sum())
    }

    pub fn upsert(&self, expense: Expense) -> Result<(), BudgetError> {
        write_guard(&self.expenses)?.insert(expense.id, expense);
        Ok(())
    }

    pub fn delete(&self, id: ExpenseId) -> Result<bool, BudgetError> {
        Ok(write_guard(&self.expenses)?.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> CalendarDay {
        CalendarDay::from_ymd(2025, 1, d).unwrap()
    }

    #[test]
    fn test_total_between_filters_goal_and_window() {
        let repo = ExpenseRepository::new(PathBuf::from("unused.json"));
        let food = GoalId::new();
        let fuel = GoalId::new();
        repo.upsert(Expense::new(food, Money::from_cents(100), day(1))).unwrap();
        repo.upsert(Expense::new(food, Money::from_cents(200), day(10))).unwrap();
        repo.upsert(Expense::new(food, Money::from_cents(400), day(20))).unwrap();
        repo.upsert(Expense::new(fuel, Money::from_cents(800), day(10))).unwrap();

        assert_eq!(repo.total_between(&[food], day(1), day(10)).unwrap().cents(), 300);
        assert_eq!(repo.total_between(&[food, fuel], day(5), day(31)).unwrap().cents(), 1400);
        assert_eq!(repo.get_by_goal(food).unwrap().len(), 3);
    }
}
