use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use daily_budget::cli::{
    handle_adjust_command, handle_carryover_command, handle_expense_command, handle_goal_command,
    parse_day, resolve_goal,
};
use daily_budget::config::{paths::BudgetPaths, settings::Settings};
use daily_budget::logging::init_logging;
use daily_budget::services::{
    BalanceCalculator, CarryOverController, CarryOverPolicy, LedgerBalanceCalculator,
};
use daily_budget::storage::Storage;

#[derive(Parser)]
#[command(
    name = "daily-budget",
    version,
    about = "Daily spending budgets with recurring goals and carry-over",
    long_about = "daily-budget tracks daily spending against hierarchical, recurring \
                  budget goals. Leftover balances of completed periods can carry into \
                  the next period."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Goal management commands
    #[command(subcommand)]
    Goal(daily_budget::cli::GoalCommands),

    /// Expense commands
    #[command(subcommand)]
    Expense(daily_budget::cli::ExpenseCommands),

    /// Balance adjustment commands
    #[command(subcommand, alias = "adjustment")]
    Adjust(daily_budget::cli::AdjustCommands),

    /// Carry-over reconciliation commands
    #[command(subcommand, name = "carryover")]
    CarryOver(daily_budget::cli::CarryOverCommands),

    /// Show a goal's balance on a day
    Balance {
        /// Goal name or ID
        goal: String,
        /// Day (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = BudgetPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    paths.ensure_directories()?;
    if let Err(e) = init_logging(&paths.log_file(), &settings.log_level) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    let storage = Arc::new(Storage::new(paths.clone())?);
    storage.load_all()?;
    let controller = CarryOverController::new(Arc::clone(&storage), &settings)?;

    match cli.command {
        Some(Commands::Goal(cmd)) => handle_goal_command(&storage, &controller, cmd)?,
        Some(Commands::Expense(cmd)) => handle_expense_command(&storage, &controller, cmd)?,
        Some(Commands::Adjust(cmd)) => handle_adjust_command(&storage, &controller, cmd)?,
        Some(Commands::CarryOver(cmd)) => handle_carryover_command(&storage, &controller, cmd)?,
        Some(Commands::Balance { goal, date }) => {
            let goal = resolve_goal(&storage, &goal)?;
            let day = match date {
                Some(date) => parse_day(&date)?,
                None => controller.service().today(),
            };
            let calculator = LedgerBalanceCalculator::new(Arc::clone(&storage));
            let balance = calculator.closing_balance(&goal, day, CarryOverPolicy::Include)?;
            println!("{} on {}: {}", goal.name, day, balance);
        }
        Some(Commands::Audit { limit }) => {
            let entries = storage.audit().read_recent(limit)?;
            if entries.is_empty() {
                println!("No audit entries.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        Some(Commands::Config) => {
            println!("daily-budget Configuration");
            println!("==========================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Log file:        {}", paths.log_file().display());
            println!();
            println!("Settings:");
            println!("  Worker threads: {}", settings.worker_threads);
            println!("  Log level:      {}", settings.log_level);
        }
        None => {
            println!("daily-budget - daily spending against recurring goals");
            println!();
            println!("Run 'daily-budget --help' for usage information.");
        }
    }

    Ok(())
}
