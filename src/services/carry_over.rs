//! Carry-over reconciliation
//!
//! A recurring goal owns one carry-over row per completed period, dated the
//! first day of the following period and holding the leftover of the period
//! it closes. This service derives that desired set, diffs it against the
//! persisted rows and commits the minimal set of inserts, updates and deletes.
//!
//! Balances come from the calculator with carry-over rows excluded; the row
//! amounts are then chained here, so row `k` holds the raw closing balance of
//! period `k` plus row `k - 1` when that row is active. A row never feeds its
//! own amount, and a second run over unchanged data writes nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::audit::{AuditEntry, ChangeSource, EntityType};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    Adjustment, AdjustmentId, AdjustmentKind, CalendarDay, CalendarPeriod, CarryOverState, Goal,
    GoalId, Money,
};
use crate::storage::{CommittedChange, Storage};

use super::balance::{BalanceCalculator, CarryOverPolicy};

/// Process-wide lock serializing the write phase of every reconciliation.
///
/// Clones share the same lock.
#[derive(Debug, Clone, Default)]
pub struct WriteLock(Arc<Mutex<()>>);

impl WriteLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self) -> BudgetResult<MutexGuard<'_, ()>> {
        self.0
            .lock()
            .map_err(|e| BudgetError::Storage(format!("Carry-over write lock poisoned: {}", e)))
    }
}

/// Source of "today"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    System,
    Fixed(CalendarDay),
}

impl Clock {
    pub fn today(&self) -> CalendarDay {
        match self {
            Clock::System => CalendarDay::today(),
            Clock::Fixed(day) => *day,
        }
    }
}

/// Ids of the rows a reconciliation touched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarryOverChanges {
    pub updated: BTreeSet<AdjustmentId>,
    pub deleted: BTreeSet<AdjustmentId>,
    pub inserted: BTreeSet<AdjustmentId>,
}

impl CarryOverChanges {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.deleted.is_empty() && self.inserted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.updated.len() + self.deleted.len() + self.inserted.len()
    }

    /// Fold in the changes of another reconciliation
    pub fn extend(&mut self, other: CarryOverChanges) {
        self.updated.extend(other.updated);
        self.deleted.extend(other.deleted);
        self.inserted.extend(other.inserted);
    }

    fn record(&mut self, change: &CommittedChange) {
        match change {
            CommittedChange::Inserted(row) => self.inserted.insert(row.id),
            CommittedChange::Updated { after, .. } => self.updated.insert(after.id),
            CommittedChange::Deleted(row) => self.deleted.insert(row.id),
        };
    }
}

/// The periods whose closing balance carries into a following period.
///
/// Walks from the goal's start and stops at the period containing `today`.
/// The final period of a goal with an end date carries nowhere and is never
/// included.
pub fn completed_periods(goal: &Goal, today: CalendarDay) -> Vec<CalendarPeriod> {
    let mut completed = Vec::new();
    let mut current = goal.first_period();
    while let Some(period) = current {
        if period.end() > today {
            break;
        }
        let next = period.next();
        if next.is_none() {
            break;
        }
        completed.push(period);
        current = next;
    }
    completed
}

/// Staged result of diffing desired rows against persisted ones
#[derive(Debug, Default, PartialEq, Eq)]
struct CarryOverPlan {
    updates: Vec<Adjustment>,
    deletes: Vec<AdjustmentId>,
    inserts: Vec<Adjustment>,
}

/// Diff the desired carry-over rows against the persisted ones.
///
/// `desired` pairs each carry-over day with the raw closing balance of the
/// period it closes, oldest first. Existing rows keep their state; new rows
/// get `new_row_state`.
fn plan_carry_over_changes(
    goal_id: GoalId,
    desired: &[(CalendarDay, Money)],
    persisted: Vec<Adjustment>,
    new_row_state: CarryOverState,
) -> CarryOverPlan {
    let mut plan = CarryOverPlan::default();

    let mut by_day: BTreeMap<CalendarDay, Vec<Adjustment>> = BTreeMap::new();
    for row in persisted {
        by_day.entry(row.day()).or_default().push(row);
    }
    let mut kept: BTreeMap<CalendarDay, Adjustment> = BTreeMap::new();
    for (day, mut rows) in by_day {
        let keep_at = rows
            .iter()
            .position(|r| r.kind.carry_over_state() == Some(CarryOverState::Active))
            .unwrap_or(0);
        let keeper = rows.remove(keep_at);
        plan.deletes.extend(rows.into_iter().map(|r| r.id));
        kept.insert(day, keeper);
    }

    let mut carried_in = Money::zero();
    for &(day, raw) in desired {
        let amount = raw + carried_in;
        let state = match kept.remove(&day) {
            Some(mut row) => {
                let state = row.kind.carry_over_state().unwrap_or(new_row_state);
                if row.amount_per_day != amount || row.last_day_effective != day {
                    row.amount_per_day = amount;
                    row.last_day_effective = day;
                    plan.updates.push(row);
                }
                state
            }
            None => {
                plan.inserts
                    .push(Adjustment::carry_over(goal_id, day, amount, new_row_state));
                new_row_state
            }
        };
        carried_in = match state {
            CarryOverState::Active => amount,
            CarryOverState::Disabled => Money::zero(),
        };
    }

    plan.deletes.extend(kept.into_values().map(|r| r.id));
    plan
}

/// Keeps a goal's carry-over rows in step with its computed balances
pub struct CarryOverService {
    storage: Arc<Storage>,
    calculator: Arc<dyn BalanceCalculator>,
    write_lock: WriteLock,
    clock: Clock,
}

impl CarryOverService {
    pub fn new(
        storage: Arc<Storage>,
        calculator: Arc<dyn BalanceCalculator>,
        write_lock: WriteLock,
        clock: Clock,
    ) -> Self {
        Self {
            storage,
            calculator,
            write_lock,
            clock,
        }
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn write_lock(&self) -> &WriteLock {
        &self.write_lock
    }

    pub fn today(&self) -> CalendarDay {
        self.clock.today()
    }

    fn goal(&self, goal_id: GoalId) -> BudgetResult<Goal> {
        self.storage
            .goals
            .get(goal_id)?
            .ok_or_else(|| BudgetError::goal_not_found(goal_id.to_string()))
    }

    /// Bring the goal's carry-over rows in line with its balances
    pub fn update_carry_over_adjustments(&self, goal_id: GoalId) -> BudgetResult<CarryOverChanges> {
        let goal = self.goal(goal_id)?;
        let state = CarryOverState::for_enabled(goal.carry_over_balance);
        self.reconcile(&goal, state, false)
    }

    /// Reconcile after an import; rows created here start disabled
    pub fn perform_post_import_tasks(&self, goal_id: GoalId) -> BudgetResult<CarryOverChanges> {
        let goal = self.goal(goal_id)?;
        self.reconcile(&goal, CarryOverState::Disabled, false)
    }

    /// Activate the disabled row that carries the period ending on `day`.
    ///
    /// `day` is the last day of the closing period; the row is dated the day
    /// after. Later rows are re-chained so they include the newly active one.
    pub fn enable_carry_over_adjustment_for_day(
        &self,
        goal_id: GoalId,
        day: CalendarDay,
    ) -> BudgetResult<AdjustmentId> {
        let goal = self.goal(goal_id)?;
        if !goal.is_recurring() {
            return Err(BudgetError::Validation(format!(
                "Goal '{}' is not recurring and has no carry-over",
                goal.name
            )));
        }

        self.update_carry_over_adjustments(goal_id)?;

        let row_day = day.add_days(1);
        let enabled = {
            let _guard = self.write_lock.acquire()?;
            let _span = tracing::debug_span!("carry_over_write", goal = %goal_id).entered();
            let mut ctx = self.storage.adjustments.context();
            let candidates: Vec<_> = ctx
                .fetch_carry_overs(goal_id)?
                .into_iter()
                .filter(|r| {
                    r.day() == row_day
                        && r.kind.carry_over_state() == Some(CarryOverState::Disabled)
                })
                .collect();

            let mut row = match <[Adjustment; 1]>::try_from(candidates) {
                Ok([row]) => row,
                Err(rows) => {
                    return Err(BudgetError::InvariantViolation(format!(
                        "expected one disabled carry-over on {} for goal '{}', found {}",
                        row_day,
                        goal.name,
                        rows.len()
                    )))
                }
            };
            row.kind = AdjustmentKind::CarryOver {
                state: CarryOverState::Active,
            };
            let id = row.id;
            ctx.update(row);
            let committed = ctx.save()?;
            self.audit(&committed);
            id
        };

        self.update_carry_over_adjustments(goal_id)?;
        tracing::info!(goal = %goal_id, adjustment = %enabled, %row_day, "carry-over enabled");
        Ok(enabled)
    }

    /// Save the goal's carry-over flag and rebuild its rows with the new
    /// default state. Disabling never flips rows; it replaces them.
    ///
    /// Balances are computed before anything is written. The flag and the
    /// rebuilt rows are committed under the write lock; if the rows fail to
    /// commit, the previous goal is restored.
    pub fn set_carry_over_balance(
        &self,
        goal_id: GoalId,
        enabled: bool,
    ) -> BudgetResult<CarryOverChanges> {
        let before = self.goal(goal_id)?;
        let mut goal = before.clone();
        goal.carry_over_balance = enabled;
        goal.touch();

        let desired = self.desired_rows(&goal)?;

        let changes = {
            let _guard = self.write_lock.acquire()?;
            let _span = tracing::debug_span!("carry_over_write", goal = %goal.id).entered();

            self.storage.goals.upsert(goal.clone())?;
            if let Err(e) = self.storage.goals.save() {
                self.restore_goal(&before);
                return Err(e);
            }

            match self.commit(&goal, &desired, CarryOverState::for_enabled(enabled), true) {
                Ok(changes) => changes,
                Err(e) => {
                    self.restore_goal(&before);
                    return Err(e);
                }
            }
        };

        if let Err(e) = self
            .storage
            .log_update(EntityType::Goal, goal.id.to_string(), &before, &goal)
        {
            tracing::warn!(goal = %goal.id, error = %e, "failed to audit carry-over toggle");
        }
        Ok(changes)
    }

    fn restore_goal(&self, before: &Goal) {
        let restored = self
            .storage
            .goals
            .upsert(before.clone())
            .and_then(|()| self.storage.goals.save());
        if let Err(e) = restored {
            tracing::error!(goal = %before.id, error = %e, "failed to restore goal after aborted toggle");
        }
    }

    /// Raw closing balance of each completed period, keyed by the day its
    /// carry-over row is dated. Empty for non-recurring goals.
    fn desired_rows(&self, goal: &Goal) -> BudgetResult<Vec<(CalendarDay, Money)>> {
        if !goal.is_recurring() {
            return Ok(Vec::new());
        }
        let periods = completed_periods(goal, self.today());
        let last_days: Vec<_> = periods.iter().map(CalendarPeriod::last_day).collect();
        let balances = self
            .calculator
            .closing_balances(goal, &last_days, CarryOverPolicy::Exclude)?;
        Ok(periods
            .iter()
            .map(CalendarPeriod::end)
            .zip(balances)
            .collect())
    }

    /// Compute every balance, then diff and commit under the write lock.
    fn reconcile(
        &self,
        goal: &Goal,
        new_row_state: CarryOverState,
        replace_existing: bool,
    ) -> BudgetResult<CarryOverChanges> {
        let desired = self.desired_rows(goal)?;

        let _guard = self.write_lock.acquire()?;
        let _span = tracing::debug_span!("carry_over_write", goal = %goal.id).entered();
        self.commit(goal, &desired, new_row_state, replace_existing)
    }

    /// Diff `desired` against the persisted rows and commit in one batch.
    /// The caller holds the write lock.
    ///
    /// With `replace_existing` every persisted row is deleted and the desired
    /// set inserted fresh, in the same commit.
    fn commit(
        &self,
        goal: &Goal,
        desired: &[(CalendarDay, Money)],
        new_row_state: CarryOverState,
        replace_existing: bool,
    ) -> BudgetResult<CarryOverChanges> {
        let mut ctx = self.storage.adjustments.context();
        let persisted = ctx.fetch_carry_overs(goal.id)?;

        let plan = if replace_existing {
            let mut plan = plan_carry_over_changes(goal.id, desired, Vec::new(), new_row_state);
            plan.deletes = persisted.into_iter().map(|r| r.id).collect();
            plan
        } else {
            plan_carry_over_changes(goal.id, desired, persisted, new_row_state)
        };

        for id in plan.deletes {
            ctx.delete(id);
        }
        for row in plan.updates {
            ctx.update(row);
        }
        for row in plan.inserts {
            ctx.insert(row);
        }

        if !ctx.has_changes() {
            tracing::debug!(goal = %goal.id, "carry-over rows already up to date");
            return Ok(CarryOverChanges::default());
        }

        let committed = ctx.save()?;
        self.audit(&committed);

        let mut changes = CarryOverChanges::default();
        for change in &committed {
            changes.record(change);
        }
        tracing::info!(
            goal = %goal.id,
            inserted = changes.inserted.len(),
            updated = changes.updated.len(),
            deleted = changes.deleted.len(),
            "carry-over rows reconciled"
        );
        Ok(changes)
    }

    /// Record committed changes. The commit already happened, so a failed
    /// audit write is logged rather than returned.
    fn audit(&self, committed: &[CommittedChange]) {
        let entries: Vec<_> = committed
            .iter()
            .map(|change| {
                let entry = match change {
                    CommittedChange::Inserted(row) => {
                        AuditEntry::create(EntityType::Adjustment, row.id.to_string(), row)
                    }
                    CommittedChange::Updated { before, after } => {
                        AuditEntry::update(EntityType::Adjustment, after.id.to_string(), before, after)
                    }
                    CommittedChange::Deleted(row) => {
                        AuditEntry::delete(EntityType::Adjustment, row.id.to_string(), row)
                    }
                };
                entry.from_source(ChangeSource::Reconciliation)
            })
            .collect();

        if let Err(e) = self.storage.audit().log_batch(&entries) {
            tracing::warn!(error = %e, "failed to audit carry-over changes");
        }
    }
}
