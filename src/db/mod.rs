pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

use crate::snapshot::SnapshotError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Stored record unreadable: {0}")]
    Record(#[from] SnapshotError),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}
