//! Goal service
//!
//! CRUD for budget goals and navigation of the goal tree.

use crate::audit::EntityType;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Goal, GoalId};
use crate::storage::Storage;

/// Service for goal management
pub struct GoalService<'a> {
    storage: &'a Storage,
}

impl<'a> GoalService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Validate and store a new goal
    pub fn create(&self, mut goal: Goal) -> BudgetResult<Goal> {
        goal.name = goal.name.trim().to_string();
        goal.validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        if self.storage.goals.get_by_name(&goal.name)?.is_some() {
            return Err(BudgetError::Validation(format!(
                "A goal named '{}' already exists",
                goal.name
            )));
        }
        if let Some(parent_id) = goal.parent_goal_id {
            self.require(parent_id)?;
        }

        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;
        self.storage
            .log_create(EntityType::Goal, goal.id.to_string(), &goal)?;

        tracing::info!(goal = %goal.id, name = %goal.name, "goal created");
        Ok(goal)
    }

    pub fn get(&self, id: GoalId) -> BudgetResult<Option<Goal>> {
        self.storage.goals.get(id)
    }

    /// Get a goal or fail with `NotFound`
    pub fn require(&self, id: GoalId) -> BudgetResult<Goal> {
        self.storage
            .goals
            .get(id)?
            .ok_or_else(|| BudgetError::goal_not_found(id.to_string()))
    }

    /// Find a goal by name or ID string
    pub fn find(&self, identifier: &str) -> BudgetResult<Option<Goal>> {
        if let Some(goal) = self.storage.goals.get_by_name(identifier)? {
            return Ok(Some(goal));
        }
        match identifier.parse::<GoalId>() {
            Ok(id) => self.storage.goals.get(id),
            Err(_) => Ok(None),
        }
    }

    pub fn list(&self, include_archived: bool) -> BudgetResult<Vec<Goal>> {
        let goals = self.storage.goals.get_all()?;
        Ok(goals
            .into_iter()
            .filter(|g| include_archived || !g.archived)
            .collect())
    }

    pub fn children(&self, id: GoalId) -> BudgetResult<Vec<Goal>> {
        self.storage.goals.children(id)
    }

    /// Parent first, root last
    pub fn ancestors(&self, id: GoalId) -> BudgetResult<Vec<Goal>> {
        let mut ancestors: Vec<Goal> = Vec::new();
        let mut next = self.require(id)?.parent_goal_id;
        while let Some(parent_id) = next {
            if parent_id == id || ancestors.iter().any(|g| g.id == parent_id) {
                tracing::warn!(goal = %id, "goal hierarchy contains a cycle");
                break;
            }
            let Some(parent) = self.storage.goals.get(parent_id)? else {
                break;
            };
            next = parent.parent_goal_id;
            ancestors.push(parent);
        }
        Ok(ancestors)
    }

    /// Every goal below `id`, breadth first
    pub fn descendants(&self, id: GoalId) -> BudgetResult<Vec<Goal>> {
        let ids = self.storage.goals.subtree_ids(id)?;
        let mut goals = Vec::with_capacity(ids.len().saturating_sub(1));
        for child_id in ids.into_iter().skip(1) {
            if let Some(goal) = self.storage.goals.get(child_id)? {
                goals.push(goal);
            }
        }
        Ok(goals)
    }

    /// Move a goal under a new parent, or to the top level with `None`
    pub fn set_parent(&self, id: GoalId, parent: Option<GoalId>) -> BudgetResult<Goal> {
        let mut goal = self.require(id)?;
        if let Some(parent_id) = parent {
            self.require(parent_id)?;
            if self.storage.goals.subtree_ids(id)?.contains(&parent_id) {
                return Err(BudgetError::Validation(format!(
                    "Cannot move '{}' under one of its own descendants",
                    goal.name
                )));
            }
        }

        let before = goal.clone();
        goal.parent_goal_id = parent;
        self.save_update(&before, goal)
    }

    /// Replace a goal's stored fields after validation
    pub fn update(&self, goal: Goal) -> BudgetResult<Goal> {
        let before = self.require(goal.id)?;
        goal.validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;
        if let Some(other) = self.storage.goals.get_by_name(&goal.name)? {
            if other.id != goal.id {
                return Err(BudgetError::Validation(format!(
                    "A goal named '{}' already exists",
                    goal.name
                )));
            }
        }
        self.save_update(&before, goal)
    }

    /// Archive a goal (soft delete). Its history stays in every balance.
    pub fn archive(&self, id: GoalId) -> BudgetResult<Goal> {
        let mut goal = self.require(id)?;
        if goal.archived {
            return Err(BudgetError::Validation(format!(
                "Goal '{}' is already archived",
                goal.name
            )));
        }
        let before = goal.clone();
        goal.archived = true;
        self.save_update(&before, goal)
    }

    fn save_update(&self, before: &Goal, mut goal: Goal) -> BudgetResult<Goal> {
        goal.touch();
        self.storage.goals.upsert(goal.clone())?;
        self.storage.goals.save()?;
        self.storage
            .log_update(EntityType::Goal, goal.id.to_string(), before, &goal)?;
        Ok(goal)
    }
}
