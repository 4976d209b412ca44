//! Diagnostic logging via `tracing`
//!
//! Events go to `daily-budget.log` in the base directory so they never mix
//! with command output. `RUST_LOG` overrides the configured level.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{BudgetError, BudgetResult};

/// Log files larger than this are truncated on startup
const MAX_LOG_SIZE: u64 = 5 * 1024 * 1024;

/// Initialize the global subscriber writing to `log_path`.
///
/// Fails if the file cannot be opened or a subscriber is already installed.
pub fn init_logging(log_path: &Path, level: &str) -> BudgetResult<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let oversized = fs::metadata(log_path).is_ok_and(|meta| meta.len() > MAX_LOG_SIZE);
    let file = OpenOptions::new()
        .create(true)
        .append(!oversized)
        .write(true)
        .truncate(oversized)
        .open(log_path)
        .map_err(|e| BudgetError::Io(format!("Failed to open log file: {}", e)))?;

    let default_filter = format!("daily_budget={level}");
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()
        .map_err(|e| BudgetError::Config(format!("Failed to install log subscriber: {}", e)))?;

    tracing::info!(log_path = %log_path.display(), "logging initialized");
    Ok(())
}
