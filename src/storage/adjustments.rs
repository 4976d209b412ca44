//! Adjustment repository for JSON storage
//!
//! Normal adjustments are edited one at a time through `upsert`/`delete`.
//! Carry-over rows are only ever written through an [`AdjustmentContext`],
//! which stages a batch of changes and commits them as one file write.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{BudgetError, BudgetResult};
use crate::models::{Adjustment, AdjustmentId, CalendarDay, GoalId, Money};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct AdjustmentData {
    #[serde(default)]
    adjustments: Vec<Adjustment>,
}

impl AdjustmentData {
    fn from_map(map: &HashMap<AdjustmentId, Adjustment>) -> Self {
        let mut adjustments: Vec<_> = map.values().cloned().collect();
        sort_rows(&mut adjustments);
        Self { adjustments }
    }
}

fn sort_rows(rows: &mut [Adjustment]) {
    rows.sort_by(|a, b| {
        a.first_day_effective
            .cmp(&b.first_day_effective)
            .then(a.date_created.cmp(&b.date_created))
            .then(a.id.cmp(&b.id))
    });
}

/// Repository for adjustment persistence
pub struct AdjustmentRepository {
    path: PathBuf,
    adjustments: RwLock<HashMap<AdjustmentId, Adjustment>>,
}

impl AdjustmentRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            adjustments: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> BudgetResult<()> {
        let file_data: AdjustmentData = read_json(&self.path)?;
        let mut adjustments = write_guard(&self.adjustments)?;
        adjustments.clear();
        adjustments.extend(file_data.adjustments.into_iter().map(|a| (a.id, a)));
        Ok(())
    }

    pub fn save(&self) -> BudgetResult<()> {
        let adjustments = read_guard(&self.adjustments)?;
        write_json_atomic(&self.path, &AdjustmentData::from_map(&adjustments))
    }

    pub fn get(&self, id: AdjustmentId) -> BudgetResult<Option<Adjustment>> {
        Ok(read_guard(&self.adjustments)?.get(&id).cloned())
    }

    /// Every row of a goal, oldest effective day first
    pub fn get_by_goal(&self, goal_id: GoalId) -> BudgetResult<Vec<Adjustment>> {
        let adjustments = read_guard(&self.adjustments)?;
        let mut rows: Vec<_> = adjustments
            .values()
            .filter(|a| a.goal_id == goal_id)
            .cloned()
            .collect();
        sort_rows(&mut rows);
        Ok(rows)
    }

    /// Sum of Normal adjustments of `goal_ids` over the inclusive window
    pub fn normal_total_between(
        &self,
        goal_ids: &[GoalId],
        from: CalendarDay,
        to: CalendarDay,
    ) -> BudgetResult<Money> {
        let adjustments = read_guard(&self.adjustments)?;
        Ok(adjustments
            .values()
            .filter(|a| !a.is_carry_over() && goal_ids.contains(&a.goal_id))
            .map(|a| a.contribution_between(from, to))
            .sum())
    }

    /// Sum of the goal's active carry-over rows dated within the inclusive window
    pub fn active_carry_over_total_between(
        &self,
        goal_id: GoalId,
        from: CalendarDay,
        to: CalendarDay,
    ) -> BudgetResult<Money> {
        let adjustments = read_guard(&self.adjustments)?;
        Ok(adjustments
            .values()
            .filter(|a| a.is_carry_over() && a.goal_id == goal_id)
            .map(|a| a.contribution_between(from, to))
            .sum())
    }

    pub fn upsert(&self, adjustment: Adjustment) -> BudgetResult<()> {
        write_guard(&self.adjustments)?.insert(adjustment.id, adjustment);
        Ok(())
    }

    pub fn delete(&self, id: AdjustmentId) -> BudgetResult<bool> {
        Ok(write_guard(&self.adjustments)?.remove(&id).is_some())
    }

    /// Open a fresh context for a batch of staged writes
    pub fn context(&self) -> AdjustmentContext<'_> {
        AdjustmentContext {
            repo: self,
            staged: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
enum StagedChange {
    Insert(Adjustment),
    Update(Adjustment),
    Delete(AdjustmentId),
}

/// A change that a successful [`AdjustmentContext::save`] made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommittedChange {
    Inserted(Adjustment),
    Updated { before: Adjustment, after: Adjustment },
    Deleted(Adjustment),
}

/// Staged writes against the adjustment store.
///
/// Reads see committed state only. Nothing is visible to other readers until
/// [`save`](Self::save) succeeds; dropping the context discards the batch.
pub struct AdjustmentContext<'a> {
    repo: &'a AdjustmentRepository,
    staged: Vec<StagedChange>,
}

impl<'a> AdjustmentContext<'a> {
    /// Persisted carry-over rows of a goal, oldest first
    pub fn fetch_carry_overs(&self, goal_id: GoalId) -> BudgetResult<Vec<Adjustment>> {
        let adjustments = read_guard(&self.repo.adjustments)?;
        let mut rows: Vec<_> = adjustments
            .values()
            .filter(|a| a.goal_id == goal_id && a.is_carry_over())
            .cloned()
            .collect();
        sort_rows(&mut rows);
        Ok(rows)
    }

    /// Resolve an id against committed state
    pub fn get(&self, id: AdjustmentId) -> BudgetResult<Option<Adjustment>> {
        self.repo.get(id)
    }

    pub fn insert(&mut self, adjustment: Adjustment) {
        self.staged.push(StagedChange::Insert(adjustment));
    }

    pub fn update(&mut self, adjustment: Adjustment) {
        self.staged.push(StagedChange::Update(adjustment));
    }

    pub fn delete(&mut self, id: AdjustmentId) {
        self.staged.push(StagedChange::Delete(id));
    }

    pub fn has_changes(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Apply every staged change and write the file.
    ///
    /// All or nothing: if any change no longer applies or the write fails,
    /// the in-memory map is restored and no change is visible.
    pub fn save(mut self) -> BudgetResult<Vec<CommittedChange>> {
        let staged = std::mem::take(&mut self.staged);
        if staged.is_empty() {
            return Ok(Vec::new());
        }

        let mut adjustments = write_guard(&self.repo.adjustments)?;
        let snapshot = adjustments.clone();

        let committed = match apply_staged(&mut adjustments, staged) {
            Ok(committed) => committed,
            Err(e) => {
                *adjustments = snapshot;
                return Err(e);
            }
        };

        if let Err(e) = write_json_atomic(&self.repo.path, &AdjustmentData::from_map(&adjustments)) {
            *adjustments = snapshot;
            tracing::warn!(error = %e, "adjustment commit failed, rolled back");
            return Err(e);
        }

        tracing::debug!(changes = committed.len(), "adjustment context saved");
        Ok(committed)
    }

    /// Discard every staged change
    pub fn rollback(mut self) {
        self.staged.clear();
    }
}

impl Drop for AdjustmentContext<'_> {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            tracing::debug!(discarded = self.staged.len(), "adjustment context dropped unsaved");
        }
    }
}

fn apply_staged(
    adjustments: &mut HashMap<AdjustmentId, Adjustment>,
    staged: Vec<StagedChange>,
) -> BudgetResult<Vec<CommittedChange>> {
    let mut committed = Vec::with_capacity(staged.len());
    for change in staged {
        match change {
            StagedChange::Insert(row) => {
                if adjustments.contains_key(&row.id) {
                    return Err(BudgetError::Storage(format!(
                        "Adjustment {} already exists",
                        row.id
                    )));
                }
                adjustments.insert(row.id, row.clone());
                committed.push(CommittedChange::Inserted(row));
            }
            StagedChange::Update(row) => {
                let before = adjustments
                    .insert(row.id, row.clone())
                    .ok_or_else(|| BudgetError::adjustment_not_found(row.id.to_string()))?;
                committed.push(CommittedChange::Updated { before, after: row });
            }
            StagedChange::Delete(id) => {
                let removed = adjustments
                    .remove(&id)
                    .ok_or_else(|| BudgetError::adjustment_not_found(id.to_string()))?;
                committed.push(CommittedChange::Deleted(removed));
            }
        }
    }
    Ok(committed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CarryOverState;
    use std::fs;
    use tempfile::TempDir;

    fn day(m: u32, d: u32) -> CalendarDay {
        CalendarDay::from_ymd(2025, m, d).unwrap()
    }

    fn carry_over(goal_id: GoalId, m: u32, cents: i64) -> Adjustment {
        Adjustment::carry_over(goal_id, day(m, 1), Money::from_cents(cents), CarryOverState::Active)
    }

    #[test]
    fn test_context_save_persists_batch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("adjustments.json");
        let repo = AdjustmentRepository::new(path.clone());
        let goal_id = GoalId::new();
        let kept = carry_over(goal_id, 2, 100);
        let gone = carry_over(goal_id, 3, 200);
        repo.upsert(kept.clone()).unwrap();
        repo.upsert(gone.clone()).unwrap();

        let mut ctx = repo.context();
        let mut changed = kept.clone();
        changed.amount_per_day = Money::from_cents(150);
        ctx.update(changed.clone());
        ctx.delete(gone.id);
        let added = carry_over(goal_id, 4, 300);
        ctx.insert(added.clone());
        let committed = ctx.save().unwrap();

        assert_eq!(committed.len(), 3);
        let reloaded = AdjustmentRepository::new(path);
        reloaded.load().unwrap();
        let rows = reloaded.get_by_goal(goal_id).unwrap();
        assert_eq!(rows, vec![changed, added]);
    }

    #[test]
    fn test_dropped_context_changes_nothing() {
        let repo = AdjustmentRepository::new(PathBuf::from("unused.json"));
        let goal_id = GoalId::new();
        {
            let mut ctx = repo.context();
            ctx.insert(carry_over(goal_id, 2, 100));
            assert!(ctx.has_changes());
        }
        let ctx = repo.context();
        assert!(ctx.fetch_carry_overs(goal_id).unwrap().is_empty());
        ctx.rollback();
    }

    #[test]
    fn test_failed_write_restores_memory() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");
        fs::write(&data_dir, "").unwrap();
        let repo = AdjustmentRepository::new(data_dir.join("adjustments.json"));
        let goal_id = GoalId::new();
        let existing = carry_over(goal_id, 2, 100);
        repo.upsert(existing.clone()).unwrap();

        let mut ctx = repo.context();
        ctx.delete(existing.id);
        ctx.insert(carry_over(goal_id, 3, 200));
        assert!(ctx.save().is_err());

        assert_eq!(repo.get_by_goal(goal_id).unwrap(), vec![existing]);
    }

    #[test]
    fn test_stale_update_aborts_whole_batch() {
        let repo = AdjustmentRepository::new(PathBuf::from("unused.json"));
        let goal_id = GoalId::new();
        let mut ctx = repo.context();
        ctx.insert(carry_over(goal_id, 2, 100));
        ctx.update(carry_over(goal_id, 3, 200));

        let err = ctx.save().unwrap_err();
        assert!(err.is_not_found());
        assert!(repo.get_by_goal(goal_id).unwrap().is_empty());
    }

    #[test]
    fn test_totals_respect_kind_and_state() {
        let repo = AdjustmentRepository::new(PathBuf::from("unused.json"));
        let goal_id = GoalId::new();
        let child_id = GoalId::new();
        repo.upsert(Adjustment::normal(goal_id, Money::from_cents(10), day(1, 1), day(1, 10)))
            .unwrap();
        repo.upsert(Adjustment::normal(child_id, Money::from_cents(-5), day(1, 5), day(1, 5)))
            .unwrap();
        repo.upsert(carry_over(goal_id, 1, 700)).unwrap();
        repo.upsert(Adjustment::carry_over(
            goal_id,
            day(1, 2),
            Money::from_cents(900),
            CarryOverState::Disabled,
        ))
        .unwrap();

        let normal = repo
            .normal_total_between(&[goal_id, child_id], day(1, 1), day(1, 5))
            .unwrap();
        assert_eq!(normal.cents(), 45);
        let carried = repo
            .active_carry_over_total_between(goal_id, day(1, 1), day(1, 31))
            .unwrap();
        assert_eq!(carried.cents(), 700);
    }
}
