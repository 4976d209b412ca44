//! Audit entry data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Goal,
    Adjustment,
    Expense,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Goal => write!(f, "Goal"),
            EntityType::Adjustment => write!(f, "Adjustment"),
            EntityType::Expense => write!(f, "Expense"),
        }
    }
}

/// Who made a change: the user directly, or carry-over reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    #[default]
    User,
    Reconciliation,
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub entity_type: EntityType,
    pub entity_id: String,
    #[serde(default)]
    pub source: ChangeSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    fn build(
        operation: Operation,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        before: Option<serde_json::Value>,
        after: Option<serde_json::Value>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id: entity_id.into(),
            source: ChangeSource::User,
            before,
            after,
            diff_summary: None,
        }
    }

    pub fn create<T: Serialize>(entity_type: EntityType, entity_id: impl Into<String>, entity: &T) -> Self {
        Self::build(
            Operation::Create,
            entity_type,
            entity_id,
            None,
            serde_json::to_value(entity).ok(),
        )
    }

    /// An update entry; the diff summary is derived from the two values
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        before: &T,
        after: &T,
    ) -> Self {
        let before = serde_json::to_value(before).ok();
        let after = serde_json::to_value(after).ok();
        let diff_summary = match (&before, &after) {
            (Some(b), Some(a)) => super::diff::generate_diff(b, a),
            _ => None,
        };
        Self {
            diff_summary,
            ..Self::build(Operation::Update, entity_type, entity_id, before, after)
        }
    }

    pub fn delete<T: Serialize>(entity_type: EntityType, entity_id: impl Into<String>, entity: &T) -> Self {
        Self::build(
            Operation::Delete,
            entity_type,
            entity_id,
            serde_json::to_value(entity).ok(),
            None,
        )
    }

    pub fn from_source(mut self, source: ChangeSource) -> Self {
        self.source = source;
        self
    }

    /// One-line rendering for `daily-budget audit`-style output
    pub fn format_human_readable(&self) -> String {
        let mut line = format!(
            "{} {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.operation,
            self.entity_type,
            self.entity_id
        );
        if self.source == ChangeSource::Reconciliation {
            line.push_str(" [reconciliation]");
        }
        if let Some(diff) = &self.diff_summary {
            line.push_str(": ");
            line.push_str(diff);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_entry() {
        let entry = AuditEntry::create(EntityType::Goal, "goal-1", &json!({"name": "Food"}));
        assert_eq!(entry.operation, Operation::Create);
        assert!(entry.before.is_none());
        assert!(entry.after.is_some());
        assert_eq!(entry.source, ChangeSource::User);
    }

    #[test]
    fn test_update_entry_carries_diff() {
        let entry = AuditEntry::update(
            EntityType::Adjustment,
            "adj-1",
            &json!({"amount_per_day": 100}),
            &json!({"amount_per_day": 250}),
        )
        .from_source(ChangeSource::Reconciliation);

        assert_eq!(entry.diff_summary.as_deref(), Some("amount_per_day: 100 -> 250"));
        let formatted = entry.format_human_readable();
        assert!(formatted.contains("UPDATE Adjustment adj-1 [reconciliation]"));
        assert!(formatted.ends_with("amount_per_day: 100 -> 250"));
    }

    #[test]
    fn test_delete_entry() {
        let entry = AuditEntry::delete(EntityType::Expense, "exp-1", &json!({"amount": 5}));
        assert!(entry.before.is_some());
        assert!(entry.after.is_none());
    }

    #[test]
    fn test_source_defaults_when_missing() {
        let raw = r#"{"timestamp":"2025-01-01T00:00:00Z","operation":"create","entity_type":"goal","entity_id":"goal-1"}"#;
        let entry: AuditEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.source, ChangeSource::User);
    }
}
