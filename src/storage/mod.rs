//! Storage layer for daily-budget
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation. Each repository keeps its rows in memory behind an `RwLock` so
//! balance computations on many worker threads can read concurrently.

pub mod adjustments;
pub mod expenses;
pub mod file_io;
pub mod goals;

pub use adjustments::{AdjustmentContext, AdjustmentRepository, CommittedChange};
pub use expenses::ExpenseRepository;
pub use file_io::{read_json, write_json_atomic};
pub use goals::GoalRepository;

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};

pub(crate) fn read_guard<T>(lock: &RwLock<T>) -> BudgetResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))
}

pub(crate) fn write_guard<T>(lock: &RwLock<T>) -> BudgetResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: BudgetPaths,
    pub goals: GoalRepository,
    pub adjustments: AdjustmentRepository,
    pub expenses: ExpenseRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: BudgetPaths) -> BudgetResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            goals: GoalRepository::new(paths.goals_file()),
            adjustments: AdjustmentRepository::new(paths.adjustments_file()),
            expenses: ExpenseRepository::new(paths.expenses_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    pub fn paths(&self) -> &BudgetPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> BudgetResult<()> {
        self.goals.load()?;
        self.adjustments.load()?;
        self.expenses.load()?;
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> BudgetResult<()> {
        self.goals.save()?;
        self.adjustments.save()?;
        self.expenses.save()?;
        Ok(())
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        before: &T,
        after: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::update(entity_type, entity_id, before, after))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalendarDay, Goal, Money};
    use tempfile::TempDir;

    #[test]
    fn test_storage_creation_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths.clone()).unwrap();
        assert!(temp_dir.path().join("data").exists());

        let goal = Goal::monthly("Food", Money::from_cents(30000), CalendarDay::from_ymd(2025, 1, 1).unwrap());
        storage.goals.upsert(goal.clone()).unwrap();
        storage.save_all().unwrap();
        storage
            .log_create(EntityType::Goal, goal.id.to_string(), &goal)
            .unwrap();

        let reopened = Storage::new(paths).unwrap();
        reopened.load_all().unwrap();
        assert_eq!(reopened.goals.get(goal.id).unwrap(), Some(goal));
        assert_eq!(reopened.audit().read_all().unwrap().len(), 1);
    }
}
