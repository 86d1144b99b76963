//! Refresh policy: how the engine is re-run over time.
//!
//! Each refresh materializes a rolling window starting today and reconciles
//! it against what the store holds for the same window. Days before today
//! are never touched, so missed reminders stay as history.

use chrono::{Days, NaiveDate};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{self, DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS};
use crate::db::{self, DatabaseError};
use crate::error::EngineError;
use crate::materialize::{compute_range_for_schedules, flatten};
use crate::models::{Medication, ReminderRecord, Schedule};
use crate::reconcile::{reconcile, PlanSummary, ReconcilePlan};

#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RefreshPolicy {
    /// Days materialized per refresh, today included.
    pub horizon_days: u32,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl RefreshPolicy {
    pub fn new(horizon_days: u32) -> Self {
        Self {
            horizon_days: horizon_days.clamp(1, MAX_HORIZON_DAYS),
        }
    }

    /// Policy with the horizon taken from `MEDREMINDER_HORIZON_DAYS`.
    pub fn from_env() -> Self {
        let raw = std::env::var(config::HORIZON_ENV).ok();
        Self::new(config::parse_horizon(raw.as_deref()))
    }

    /// Inclusive `(start, end)` days covered by a refresh run on `today`.
    pub fn window(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let span = u64::from(self.horizon_days.max(1) - 1);
        let end = today.checked_add_days(Days::new(span)).unwrap_or(NaiveDate::MAX);
        (today, end)
    }

    /// Reconcile plan for one medication, without touching storage.
    /// `persisted` should be the medication's records inside [`Self::window`].
    pub fn plan(
        &self,
        medication: &Medication,
        schedules: &[Schedule],
        persisted: &[ReminderRecord],
        today: NaiveDate,
    ) -> Result<ReconcilePlan, EngineError> {
        let (start, end) = self.window(today);
        let by_day = compute_range_for_schedules(medication, schedules, start, end)?;
        reconcile(medication.id, flatten(&by_day), persisted)
    }
}

/// Outcome of refreshing every medication in the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub medications: usize,
    pub totals: PlanSummary,
    /// Medications whose refresh failed, with the reason. Other
    /// medications are still refreshed.
    pub failures: Vec<(Uuid, String)>,
}

/// Refresh one medication: load, plan, apply in one transaction.
pub fn refresh_medication(
    conn: &Connection,
    policy: &RefreshPolicy,
    medication_id: &Uuid,
    today: NaiveDate,
) -> Result<PlanSummary, RefreshError> {
    let medication = db::get_medication(conn, medication_id)?;
    refresh_loaded(conn, policy, &medication, today)
}

fn refresh_loaded(
    conn: &Connection,
    policy: &RefreshPolicy,
    medication: &Medication,
    today: NaiveDate,
) -> Result<PlanSummary, RefreshError> {
    let schedules = db::get_schedules_for_medication(conn, &medication.id)?;
    let (start, end) = policy.window(today);
    let persisted = db::get_reminders_in_window(conn, &medication.id, start, end)?;

    let plan = policy.plan(medication, &schedules, &persisted, today)?;
    if plan.is_empty() {
        tracing::debug!(medication = %medication.id, "Reminders already up to date");
        return Ok(plan.summary());
    }

    let summary = db::apply_plan(conn, &medication.id, &plan)?;
    tracing::info!(
        medication = %medication.id,
        name = %medication.name,
        inserted = summary.inserted,
        deleted = summary.deleted,
        %start,
        %end,
        "Refreshed reminders"
    );
    Ok(summary)
}

/// Refresh every medication. A failure on one medication is recorded in
/// the report and does not stop the others.
pub fn refresh_all(
    conn: &Connection,
    policy: &RefreshPolicy,
    today: NaiveDate,
) -> Result<RefreshReport, RefreshError> {
    let medications = db::list_medications(conn)?;
    let mut report = RefreshReport::default();

    for medication in &medications {
        match refresh_loaded(conn, policy, medication, today) {
            Ok(summary) => {
                report.medications += 1;
                report.totals += summary;
            }
            Err(e) => {
                tracing::error!(medication = %medication.id, error = %e, "Refresh failed");
                report.failures.push((medication.id, e.to_string()));
            }
        }
    }

    tracing::info!(
        medications = report.medications,
        inserted = report.totals.inserted,
        deleted = report.totals.deleted,
        failures = report.failures.len(),
        "Refresh complete"
    );
    Ok(report)
}
