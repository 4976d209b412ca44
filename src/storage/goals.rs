//! Goal repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::BudgetError;
use crate::models::{Goal, GoalId};

use super::file_io::{read_json, write_json_atomic};
use super::{read_guard, write_guard};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct GoalData {
    #[serde(default)]
    goals: Vec<Goal>,
}

/// Repository for goal persistence
pub struct GoalRepository {
    path: PathBuf,
    goals: RwLock<HashMap<GoalId, Goal>>,
}

impl GoalRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            goals: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), BudgetError> {
        let file_data: GoalData = read_json(&self.path)?;
        let mut goals = write_guard(&self.goals)?;
        goals.clear();
        goals.extend(file_data.goals.into_iter().map(|g| (g.id, g)));
        Ok(())
    }

    pub fn save(&self) -> Result<(), BudgetError> {
        let file_data = GoalData {
            goals: self.get_all()?,
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: GoalId) -> Result<Option<Goal>, BudgetError> {
        Ok(read_guard(&self.goals)?.get(&id).cloned())
    }

    /// Case-insensitive lookup by name
    pub fn get_by_name(&self, name: &str) -> Result<Option<Goal>, BudgetError> {
        let goals = read_guard(&self.goals)?;
        Ok(goals
            .values()
            .find(|g| g.name.eq_ignore_ascii_case(name.trim()))
            .cloned())
    }

    /// All goals, oldest first
    pub fn get_all(&self) -> Result<Vec<Goal>, BudgetError> {
        let goals = read_guard(&self.goals)?;
        let mut list: Vec<_> = goals.values().cloned().collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(list)
    }

    /// Direct children of a goal
    pub fn children(&self, parent: GoalId) -> Result<Vec<Goal>, BudgetError> {
        let goals = read_guard(&self.goals)?;
        let mut list: Vec<_> = goals
            .values()
            .filter(|g| g.parent_goal_id == Some(parent))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(list)
    }

    /// The goal and every goal below it in the tree.
    ///
    /// A corrupted parent chain with a cycle is walked only once per goal.
    pub fn subtree_ids(&self, root: GoalId) -> Result<Vec<GoalId>, BudgetError> {
        let goals = read_guard(&self.goals)?;
        let mut ids = vec![root];
        let mut cursor = 0;
        while cursor < ids.len() {
            let parent = ids[cursor];
            for goal in goals.values() {
                if goal.parent_goal_id == Some(parent) && !ids.contains(&goal.id) {
                    ids.push(goal.id);
                }
            }
            cursor += 1;
        }
        Ok(ids)
    }

    pub fn upsert(&self, goal: Goal) -> Result<(), BudgetError> {
        write_guard(&self.goals)?.insert(goal.id, goal);
        Ok(())
    }

    pub fn delete(&self, id: GoalId) -> Result<bool, BudgetError> {
        Ok(write_guard(&self.goals)?.remove(&id).is_some())
    }

    pub fn count(&self) -> Result<usize, BudgetError> {
        Ok(read_guard(&self.goals)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalendarDay, Money};
    use tempfile::TempDir;

    fn goal(name: &str) -> Goal {
        Goal::monthly(name, Money::from_cents(1000), CalendarDay::from_ymd(2025, 1, 1).unwrap())
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("goals.json");
        let repo = GoalRepository::new(path.clone());
        let food = goal("Food");
        repo.upsert(food.clone()).unwrap();
        repo.save().unwrap();

        let reloaded = GoalRepository::new(path);
        reloaded.load().unwrap();
        assert_eq!(reloaded.get(food.id).unwrap(), Some(food));
        assert!(reloaded.get_by_name("food").unwrap().is_some());
    }

    #[test]
    fn test_subtree_walks_all_descendants() {
        let repo = GoalRepository::new(PathBuf::from("unused.json"));
        let root = goal("Household");
        let child = goal("Groceries").with_parent(root.id);
        let grandchild = goal("Snacks").with_parent(child.id);
        let unrelated = goal("Travel");
        for g in [&root, &child, &grandchild, &unrelated] {
            repo.upsert(g.clone()).unwrap();
        }

        let ids = repo.subtree_ids(root.id).unwrap();
        assert_eq!(ids.len(), 3);
        assert!(ids.contains(&grandchild.id));
        assert!(!ids.contains(&unrelated.id));
        assert_eq!(repo.children(root.id).unwrap().len(), 1);
    }

    #[test]
    fn test_subtree_survives_cycle() {
        let repo = GoalRepository::new(PathBuf::from("unused.json"));
        let mut a = goal("A");
        let b = goal("B").with_parent(a.id);
        a.parent_goal_id = Some(b.id);
        repo.upsert(a.clone()).unwrap();
        repo.upsert(b.clone()).unwrap();

        let ids = repo.subtree_ids(a.id).unwrap();
        assert_eq!(ids, vec![a.id, b.id]);
    }
}
