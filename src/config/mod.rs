//! Configuration module for daily-budget
//!
//! - Path resolution for data, settings and logs
//! - User settings persistence

pub mod paths;
pub mod settings;

pub use paths::BudgetPaths;
pub use settings::Settings;
