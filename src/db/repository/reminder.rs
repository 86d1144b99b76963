use chrono::{Days, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::config::TIMESTAMP_FORMAT;
use crate::db::DatabaseError;
use crate::models::ReminderRecord;
use crate::reconcile::{PlanSummary, ReconcilePlan};

pub fn insert_reminder(conn: &Connection, reminder: &ReminderRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO reminders (id, medication_id, scheduled_at, is_taken, taken_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            reminder.id.to_string(),
            reminder.medication_id.to_string(),
            format_timestamp(reminder.scheduled_at),
            reminder.is_taken as i32,
            reminder.taken_at.map(format_timestamp),
        ],
    )?;
    Ok(())
}

/// Reminders of one medication due on any day in `[start, end]`, ascending.
pub fn get_reminders_in_window(
    conn: &Connection,
    medication_id: &Uuid,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<ReminderRecord>, DatabaseError> {
    let lower = format_timestamp(start.and_time(chrono::NaiveTime::MIN));
    let upper = end
        .checked_add_days(Days::new(1))
        .map(|next| format_timestamp(next.and_time(chrono::NaiveTime::MIN)));

    let mut stmt = conn.prepare(
        "SELECT id, medication_id, scheduled_at, is_taken, taken_at
         FROM reminders
         WHERE medication_id = ?1 AND scheduled_at >= ?2 AND (?3 IS NULL OR scheduled_at < ?3)
         ORDER BY scheduled_at, rowid",
    )?;
    let rows = stmt.query_map(
        params![medication_id.to_string(), lower, upper],
        reminder_row_from_rusqlite,
    )?;

    let mut reminders = Vec::new();
    for row in rows {
        reminders.push(reminder_from_row(row?)?);
    }
    Ok(reminders)
}

/// Mark a reminder taken. Taking an already-taken reminder keeps the
/// original `taken_at`.
pub fn mark_taken(conn: &Connection, id: &Uuid, taken_at: NaiveDateTime) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE reminders SET is_taken = 1, taken_at = COALESCE(taken_at, ?2) WHERE id = ?1",
        params![id.to_string(), format_timestamp(taken_at)],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Reminder".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

/// Apply a reconcile plan in one transaction.
///
/// Deletes are restricted to untaken rows, so a reminder taken after the
/// plan was computed survives. Returns what was actually written.
pub fn apply_plan(
    conn: &Connection,
    medication_id: &Uuid,
    plan: &ReconcilePlan,
) -> Result<PlanSummary, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    let mut summary = PlanSummary {
        unchanged: plan.unchanged.len(),
        ..PlanSummary::default()
    };

    for record in &plan.to_delete {
        summary.deleted += tx.execute(
            "DELETE FROM reminders WHERE id = ?1 AND medication_id = ?2 AND is_taken = 0",
            params![record.id.to_string(), medication_id.to_string()],
        )?;
    }

    for instant in &plan.to_insert {
        let record = ReminderRecord::pending(*medication_id, *instant);
        tx.execute(
            "INSERT INTO reminders (id, medication_id, scheduled_at, is_taken, taken_at)
             VALUES (?1, ?2, ?3, 0, NULL)",
            params![
                record.id.to_string(),
                record.medication_id.to_string(),
                format_timestamp(record.scheduled_at),
            ],
        )?;
        summary.inserted += 1;
    }

    tx.commit()?;
    Ok(summary)
}

fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

struct ReminderRow {
    id: String,
    medication_id: String,
    scheduled_at: String,
    is_taken: i32,
    taken_at: Option<String>,
}

fn reminder_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ReminderRow, rusqlite::Error> {
    Ok(ReminderRow {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        scheduled_at: row.get(2)?,
        is_taken: row.get(3)?,
        taken_at: row.get(4)?,
    })
}

fn reminder_from_row(row: ReminderRow) -> Result<ReminderRecord, DatabaseError> {
    Ok(ReminderRecord {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        medication_id: Uuid::parse_str(&row.medication_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        scheduled_at: NaiveDateTime::parse_from_str(&row.scheduled_at, TIMESTAMP_FORMAT)
            .map_err(|e| DatabaseError::ConstraintViolation(format!("scheduled_at: {e}")))?,
        is_taken: row.is_taken != 0,
        taken_at: row
            .taken_at
            .and_then(|s| NaiveDateTime::parse_from_str(&s, TIMESTAMP_FORMAT).ok()),
    })
}
