use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Schedule;
use crate::snapshot::{format_time_list, ScheduleRecord, ScheduleSnapshot};

use super::medication::get_medication;

pub fn insert_schedule(conn: &Connection, schedule: &Schedule) -> Result<(), DatabaseError> {
    let record = ScheduleRecord::from_model(schedule);
    conn.execute(
        "INSERT INTO schedules (id, medication_id, schedule_type, specific_times, days_of_week,
         interval_hours, interval_minutes, interval_start_time, interval_end_time, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            record.id,
            record.medication_id,
            record.schedule_type,
            format_time_list(&schedule.specific_times),
            record.days_of_week,
            record.interval_hours,
            record.interval_minutes,
            record.interval_start_time,
            record.interval_end_time,
            record.is_active as i32,
        ],
    )?;
    Ok(())
}

/// Every schedule of a medication, active or not, in insertion order.
/// Rows that cannot be decoded are logged and skipped.
pub fn get_schedules_for_medication(
    conn: &Connection,
    medication_id: &Uuid,
) -> Result<Vec<Schedule>, DatabaseError> {
    let records = get_schedule_records(conn, medication_id)?;
    let mut schedules = Vec::with_capacity(records.len());
    for record in records {
        match record.to_model() {
            Ok(schedule) => schedules.push(schedule),
            Err(e) => tracing::warn!(id = %record.id, error = %e, "Skipping unreadable schedule"),
        }
    }
    Ok(schedules)
}

pub fn set_schedule_active(conn: &Connection, id: &Uuid, active: bool) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE schedules SET is_active = ?2 WHERE id = ?1",
        params![id.to_string(), active as i32],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Schedule".into(),
            id: id.to_string(),
        });
    }
    Ok(())
}

pub fn delete_schedule(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM schedules WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

/// The medication and its raw schedule rows, ready to send to the companion.
/// Rows are passed through undecoded so the companion applies the same
/// skip rules.
pub fn load_snapshot(conn: &Connection, medication_id: &Uuid) -> Result<ScheduleSnapshot, DatabaseError> {
    let medication = get_medication(conn, medication_id)?;
    let mut snapshot = ScheduleSnapshot::from_models(&medication, &[]);
    snapshot.schedules = get_schedule_records(conn, medication_id)?;
    Ok(snapshot)
}

fn get_schedule_records(
    conn: &Connection,
    medication_id: &Uuid,
) -> Result<Vec<ScheduleRecord>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, medication_id, schedule_type, specific_times, days_of_week,
         interval_hours, interval_minutes, interval_start_time, interval_end_time, is_active
         FROM schedules WHERE medication_id = ?1 ORDER BY rowid",
    )?;
    let rows = stmt.query_map(params![medication_id.to_string()], schedule_record_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn schedule_record_from_row(row: &rusqlite::Row<'_>) -> Result<ScheduleRecord, rusqlite::Error> {
    let specific_times: Option<String> = row.get(3)?;
    Ok(ScheduleRecord {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        schedule_type: row.get(2)?,
        specific_times: specific_times
            .map(|joined| {
                joined
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default(),
        days_of_week: row.get(4)?,
        interval_hours: row.get(5)?,
        interval_minutes: row.get(6)?,
        interval_start_time: row.get(7)?,
        interval_end_time: row.get(8)?,
        is_active: row.get::<_, i32>(9)? != 0,
    })
}
