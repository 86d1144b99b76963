use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::Medication;
use crate::snapshot::MedicationRecord;

pub fn insert_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    let record = MedicationRecord::from_model(med);
    conn.execute(
        "INSERT INTO medications (id, name, start_date, end_date) VALUES (?1, ?2, ?3, ?4)",
        params![record.id, record.name, record.start_date, record.end_date],
    )?;
    Ok(())
}

/// Replace name and active window of an existing medication.
pub fn update_medication(conn: &Connection, med: &Medication) -> Result<(), DatabaseError> {
    let record = MedicationRecord::from_model(med);
    let rows = conn.execute(
        "UPDATE medications SET name = ?2, start_date = ?3, end_date = ?4 WHERE id = ?1",
        params![record.id, record.name, record.start_date, record.end_date],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Medication".into(),
            id: record.id,
        });
    }
    Ok(())
}

pub fn get_medication(conn: &Connection, id: &Uuid) -> Result<Medication, DatabaseError> {
    let record = conn
        .query_row(
            "SELECT id, name, start_date, end_date FROM medications WHERE id = ?1",
            params![id.to_string()],
            medication_record_from_row,
        )
        .optional()?
        .ok_or_else(|| DatabaseError::NotFound {
            entity_type: "Medication".into(),
            id: id.to_string(),
        })?;
    Ok(record.to_model()?)
}

/// All medications, ordered by name. Rows with an unreadable id are
/// logged and skipped.
pub fn list_medications(conn: &Connection) -> Result<Vec<Medication>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, start_date, end_date FROM medications ORDER BY name, id",
    )?;
    let rows = stmt.query_map([], medication_record_from_row)?;

    let mut meds = Vec::new();
    for row in rows {
        let record = row?;
        match record.to_model() {
            Ok(med) => meds.push(med),
            Err(e) => tracing::warn!(id = %record.id, error = %e, "Skipping unreadable medication"),
        }
    }
    Ok(meds)
}

/// Deletes the medication with its schedules and reminders.
pub fn delete_medication_cascade(conn: &Connection, id: &Uuid) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM medications WHERE id = ?1", params![id.to_string()])?;
    Ok(())
}

fn medication_record_from_row(row: &rusqlite::Row<'_>) -> Result<MedicationRecord, rusqlite::Error> {
    Ok(MedicationRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
    })
}
