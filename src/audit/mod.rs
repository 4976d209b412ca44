//! Audit logging for daily-budget
//!
//! Records every create, update and delete with before/after values in an
//! append-only JSONL file. Carry-over rows written by reconciliation are
//! tagged with [`ChangeSource::Reconciliation`] so they can be told apart from
//! user edits.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, ChangeSource, EntityType, Operation};
pub use logger::AuditLogger;
