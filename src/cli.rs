//! Command-line entry.
//!
//! Usage:
//!   medreminder materialize <snapshot.json> [--from <YYYY-MM-DD>] [--days <n>]
//!   medreminder refresh [<YYYY-MM-DD>] [--database <path>]
//!
//! `materialize` prints the reminders of a schedule snapshot and their
//! fingerprint as JSON, so a companion build can be checked against the phone
//! from a shell. `refresh` runs the daily refresh against the reminder store.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config;
use crate::db;
use crate::error::AppError;
use crate::materialize::{compute_range_for_schedules, flatten};
use crate::refresh::{refresh_all, RefreshError, RefreshPolicy};
use crate::snapshot::{fingerprint, format_time, ScheduleSnapshot};

#[derive(Debug, Parser)]
#[command(name = "medreminder")]
#[command(version)]
#[command(about = "Turn medication schedules into reminder instants", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Expand a schedule snapshot and print its reminders
    Materialize {
        /// Snapshot JSON file
        snapshot: PathBuf,

        /// First day (defaults to today)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Days to expand (defaults to MEDREMINDER_HORIZON_DAYS, else 7)
        #[arg(short, long)]
        days: Option<u32>,
    },

    /// Refresh every medication in the reminder store
    Refresh {
        /// Day treated as today (defaults to today)
        date: Option<NaiveDate>,

        /// Reminder store (defaults to the app data directory)
        #[arg(long, env = config::DATABASE_ENV)]
        database: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
pub struct MaterializedReport {
    pub medication_id: String,
    pub medication: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total: usize,
    /// `YYYY-MM-DD` to `HH:mm` list.
    pub reminders: BTreeMap<NaiveDate, Vec<String>>,
    pub fingerprint: String,
}

/// Parse a full argument list (program name first) and run it.
pub fn run_with_args<I, T>(args: I) -> Result<String, AppError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    execute(cli)
}

/// Run a parsed command and render its output as pretty JSON.
pub fn execute(cli: Cli) -> Result<String, AppError> {
    match cli.command {
        Command::Materialize { snapshot, from, days } => {
            let policy = days.map(RefreshPolicy::new).unwrap_or_else(RefreshPolicy::from_env);
            let json = std::fs::read_to_string(&snapshot).map_err(|source| AppError::Io {
                path: snapshot.display().to_string(),
                source,
            })?;
            let report = materialize_snapshot(&json, from.unwrap_or_else(today), &policy)?;
            Ok(serde_json::to_string_pretty(&report)?)
        }
        Command::Refresh { date, database } => {
            let path = database.unwrap_or_else(config::database_path);
            let conn = db::open_database(&path).map_err(RefreshError::from)?;
            let report = refresh_all(&conn, &RefreshPolicy::from_env(), date.unwrap_or_else(today))?;
            Ok(serde_json::to_string_pretty(&report)?)
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Expand a snapshot over the policy window starting at `from`.
pub fn materialize_snapshot(
    json: &str,
    from: NaiveDate,
    policy: &RefreshPolicy,
) -> Result<MaterializedReport, AppError> {
    let (medication, schedules) = ScheduleSnapshot::from_json(json)?.to_models()?;
    let (start, end) = policy.window(from);
    let by_day = compute_range_for_schedules(&medication, &schedules, start, end)?;

    tracing::debug!(
        medication = %medication.id,
        schedules = schedules.len(),
        days = by_day.len(),
        "Materialized snapshot"
    );

    Ok(MaterializedReport {
        medication_id: medication.id.to_string(),
        medication: medication.name.clone(),
        from: start,
        to: end,
        total: flatten(&by_day).len(),
        fingerprint: fingerprint(&by_day),
        reminders: by_day
            .into_iter()
            .map(|(date, times)| (date, times.into_iter().map(format_time).collect()))
            .collect(),
    })
}
