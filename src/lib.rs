//! daily-budget - daily spending against recurring, hierarchical budget goals
//!
//! This library provides the core of the `daily-budget` application: calendar
//! period arithmetic for recurring goals, ledger-backed balance calculation
//! and the carry-over reconciliation that rolls each completed period's
//! leftover into the next.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `logging`: `tracing` subscriber setup
//! - `models`: Days, periods, goals, expenses and adjustments
//! - `storage`: JSON file storage layer
//! - `services`: Business logic, balance calculation and reconciliation
//! - `audit`: Audit logging system
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use daily_budget::config::{paths::BudgetPaths, settings::Settings};
//! use daily_budget::services::CarryOverController;
//! use daily_budget::storage::Storage;
//!
//! let paths = BudgetPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Arc::new(Storage::new(paths)?);
//! storage.load_all()?;
//! let controller = CarryOverController::new(Arc::clone(&storage), &settings)?;
//! controller.update_carry_over_adjustments(goal_id, |changes| {
//!     println!("{:?}", changes);
//! });
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;

pub use error::{BudgetError, BudgetResult};
