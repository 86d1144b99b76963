//! Engine and entry-point errors.
//!
//! Bad stored values (a malformed time, an unknown weekday) are not errors
//! here: they are dropped at the snapshot boundary. What remains are
//! programmer errors, such as handing the engine a schedule that belongs to a
//! different medication.

use thiserror::Error;
use uuid::Uuid;

use crate::refresh::RefreshError;
use crate::snapshot::SnapshotError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Schedule {schedule_id} belongs to medication {owner}, not {medication_id}")]
    ScheduleMismatch {
        schedule_id: Uuid,
        owner: Uuid,
        medication_id: Uuid,
    },

    #[error("Reminder {record_id} belongs to medication {owner}, not {medication_id}")]
    RecordMismatch {
        record_id: Uuid,
        owner: Uuid,
        medication_id: Uuid,
    },
}

/// Errors surfaced by the command-line entry point.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Cli(#[from] clap::Error),

    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Refresh error: {0}")]
    Refresh(#[from] RefreshError),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}
