//! Custom error types for daily-budget
//!
//! This module defines the error hierarchy for the application using thiserror
//! for ergonomic error definitions. Every reconciliation abort path funnels
//! through one of these variants.

use thiserror::Error;

/// The main error type for daily-budget operations
#[derive(Error, Debug)]
pub enum BudgetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// The balance calculator could not produce a value
    #[error("Balance computation failed for {day}: {reason}")]
    Computation { day: String, reason: String },

    /// An expected unique row was missing or duplicated
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Carry-over reconciliation errors that are not one of the above
    #[error("Reconciliation error: {0}")]
    Reconciliation(String),

    /// Storage errors (including failed commits)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BudgetError {
    /// Create a "not found" error for goals
    pub fn goal_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Goal",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for adjustments
    pub fn adjustment_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Adjustment",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for expenses
    pub fn expense_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Expense",
            identifier: identifier.into(),
        }
    }

    /// Create a computation error for a specific day
    pub fn computation(day: impl ToString, reason: impl Into<String>) -> Self {
        Self::Computation {
            day: day.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this error came from the balance calculator
    pub fn is_computation(&self) -> bool {
        matches!(self, Self::Computation { .. })
    }
}

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for daily-budget operations
pub type BudgetResult<T> = Result<T, BudgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BudgetError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_not_found_error() {
        let err = BudgetError::goal_not_found("Groceries");
        assert_eq!(err.to_string(), "Goal not found: Groceries");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_computation_error() {
        let err = BudgetError::computation("2025-02-01", "missing goal");
        assert_eq!(
            err.to_string(),
            "Balance computation failed for 2025-02-01: missing goal"
        );
        assert!(err.is_computation());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let budget_err: BudgetError = io_err.into();
        assert!(matches!(budget_err, BudgetError::Io(_)));
    }
}
