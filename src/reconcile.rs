//! Reminder reconciler: diffs freshly materialized instants against what
//! the store already holds for one medication.
//!
//! Taken reminders are history. They are never deleted and never inserted a
//! second time, even when the schedule that produced them is gone.
//! Nothing here writes: the caller applies the plan in one transaction.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{ReminderInstant, ReminderRecord};

/// What the store has to do to match a materialized set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    /// Instants with no stored record, ascending.
    pub to_insert: Vec<ReminderInstant>,
    /// Untaken records that are no longer materialized, or duplicates.
    pub to_delete: Vec<ReminderRecord>,
    /// Everything else, every taken record included.
    pub unchanged: Vec<ReminderRecord>,
}

/// Counts only, for logs and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub inserted: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl ReconcilePlan {
    /// True when applying the plan would not touch the store.
    pub fn is_empty(&self) -> bool {
        self.to_insert.is_empty() && self.to_delete.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            inserted: self.to_insert.len(),
            deleted: self.to_delete.len(),
            unchanged: self.unchanged.len(),
        }
    }
}

impl std::ops::AddAssign for PlanSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.inserted += rhs.inserted;
        self.deleted += rhs.deleted;
        self.unchanged += rhs.unchanged;
    }
}

/// Split `persisted` and `materialized` into insert / delete / unchanged.
///
/// `persisted` must hold only records of `medication_id` and should cover the
/// same window as `materialized`; records outside it would be read as stale.
pub fn reconcile(
    medication_id: Uuid,
    materialized: impl IntoIterator<Item = ReminderInstant>,
    persisted: &[ReminderRecord],
) -> Result<ReconcilePlan, EngineError> {
    if let Some(foreign) = persisted.iter().find(|r| r.medication_id != medication_id) {
        return Err(EngineError::RecordMismatch {
            record_id: foreign.id,
            owner: foreign.medication_id,
            medication_id,
        });
    }

    let wanted: BTreeSet<ReminderInstant> = materialized.into_iter().collect();

    // Taken records claim their timestamp first so an untaken twin is
    // treated as a duplicate rather than the survivor.
    let mut claimed: HashSet<ReminderInstant> = persisted
        .iter()
        .filter(|r| r.is_taken)
        .map(ReminderRecord::instant)
        .collect();

    let mut plan = ReconcilePlan::default();

    for record in persisted {
        if record.is_taken {
            plan.unchanged.push(record.clone());
            continue;
        }
        let instant = record.instant();
        if wanted.contains(&instant) && claimed.insert(instant) {
            plan.unchanged.push(record.clone());
        } else {
            plan.to_delete.push(record.clone());
        }
    }

    plan.to_insert = wanted
        .into_iter()
        .filter(|instant| !claimed.contains(instant))
        .collect();

    tracing::debug!(
        medication = %medication_id,
        insert = plan.to_insert.len(),
        delete = plan.to_delete.len(),
        unchanged = plan.unchanged.len(),
        "Reconciled reminders"
    );

    Ok(plan)
}
