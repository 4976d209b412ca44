//! Expense model
//!
//! A single spend recorded against a goal on one day.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::day::CalendarDay;
use super::ids::{ExpenseId, GoalId};
use super::money::Money;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub goal_id: GoalId,
    /// Amount spent; refunds are negative
    pub amount: Money,
    pub date: CalendarDay,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(goal_id: GoalId, amount: Money, date: CalendarDay) -> Self {
        Self {
            id: ExpenseId::new(),
            goal_id,
            amount,
            date,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> Result<(), ExpenseValidationError> {
        if self.amount.is_zero() {
            return Err(ExpenseValidationError::ZeroAmount);
        }
        Ok(())
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.description.is_empty() {
            write!(f, "{} {}", self.date, self.amount)
        } else {
            write!(f, "{} {} {}", self.date, self.amount, self.description)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpenseValidationError {
    ZeroAmount,
}

impl fmt::Display for ExpenseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroAmount => write!(f, "Expense amount cannot be zero"),
        }
    }
}

impl std::error::Error for ExpenseValidationError {}
