//! Background carry-over reconciliation
//!
//! [`CarryOverController`] runs [`CarryOverService`] operations on a bounded
//! rayon pool. Each request's per-day balance fan-out runs nested on the same
//! pool. Completions are invoked on the worker thread with `Some(result)` on
//! success and `None` on failure; the failure itself is logged here.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::settings::Settings;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{AdjustmentId, CalendarDay, GoalId};
use crate::storage::Storage;

use super::balance::{BalanceCalculator, LedgerBalanceCalculator};
use super::carry_over::{CarryOverChanges, CarryOverService, Clock, WriteLock};

pub struct CarryOverController {
    service: Arc<CarryOverService>,
    pool: ThreadPool,
}

impl CarryOverController {
    /// Controller over the stored ledger, with its own write lock
    pub fn new(storage: Arc<Storage>, settings: &Settings) -> BudgetResult<Self> {
        let calculator = Arc::new(LedgerBalanceCalculator::new(Arc::clone(&storage)));
        let service = CarryOverService::new(storage, calculator, WriteLock::new(), Clock::System);
        Self::with_service(service, settings.worker_threads)
    }

    /// Controller over a prepared service. `worker_threads == 0` sizes the
    /// pool to the number of cores.
    pub fn with_service(service: CarryOverService, worker_threads: usize) -> BudgetResult<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(|i| format!("carry-over-{}", i))
            .build()
            .map_err(|e| BudgetError::Config(format!("Failed to start worker pool: {}", e)))?;

        tracing::debug!(threads = pool.current_num_threads(), "carry-over pool started");
        Ok(Self {
            service: Arc::new(service),
            pool,
        })
    }

    /// Build a controller whose calculator is supplied by the caller
    pub fn with_calculator(
        storage: Arc<Storage>,
        calculator: Arc<dyn BalanceCalculator>,
        write_lock: WriteLock,
        clock: Clock,
        worker_threads: usize,
    ) -> BudgetResult<Self> {
        Self::with_service(
            CarryOverService::new(storage, calculator, write_lock, clock),
            worker_threads,
        )
    }

    pub fn service(&self) -> &CarryOverService {
        &self.service
    }

    pub fn update_carry_over_adjustments<F>(&self, goal_id: GoalId, completion: F)
    where
        F: FnOnce(Option<CarryOverChanges>) + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        self.pool.spawn(move || {
            let result = service.update_carry_over_adjustments(goal_id);
            completion(report("update", goal_id, result));
        });
    }

    pub fn enable_carry_over_adjustment_for_day<F>(
        &self,
        goal_id: GoalId,
        day: CalendarDay,
        completion: F,
    ) where
        F: FnOnce(Option<AdjustmentId>) + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        self.pool.spawn(move || {
            let result = service.enable_carry_over_adjustment_for_day(goal_id, day);
            completion(report("enable", goal_id, result));
        });
    }

    pub fn perform_post_import_tasks<F>(&self, goal_id: GoalId, completion: F)
    where
        F: FnOnce(Option<CarryOverChanges>) + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        self.pool.spawn(move || {
            let result = service.perform_post_import_tasks(goal_id);
            completion(report("post-import", goal_id, result));
        });
    }

    /// Toggle the goal's carry-over flag and rebuild its rows on the pool
    pub fn set_carry_over_balance<F>(&self, goal_id: GoalId, enabled: bool, completion: F)
    where
        F: FnOnce(Option<CarryOverChanges>) + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        self.pool.spawn(move || {
            let result = service.set_carry_over_balance(goal_id, enabled);
            completion(report("toggle", goal_id, result));
        });
    }
}

fn report<T>(operation: &str, goal_id: GoalId, result: BudgetResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::error!(operation, goal = %goal_id, error = %e, "carry-over reconciliation failed");
            None
        }
    }
}
