//! Medication reminder engine.
//!
//! Turns a medication's dosing schedules into the concrete instants at which
//! a reminder is due. The same crate runs on the phone and on the companion
//! device; given the same schedule snapshot both produce identical output.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod materialize;
pub mod models;
pub mod reconcile;
pub mod recurrence;
pub mod refresh;
pub mod snapshot;

pub use error::{AppError, EngineError};
pub use materialize::{compute_range, compute_range_for_schedules, next_reminder, DaySchedule};
pub use models::{Medication, ReminderInstant, ReminderRecord, Schedule, ScheduleType};
pub use reconcile::{reconcile, ReconcilePlan};
pub use recurrence::compute_day;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` wins over the default
/// filter. Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Binary entry point.
pub fn run() {
    init_tracing();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let cli = cli::Cli::parse();
    match cli::execute(cli) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
