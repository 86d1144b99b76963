//! Schedule snapshots: the string-encoded form in which medications and
//! schedules are stored and synced to the companion device.
//!
//! Dates travel as `dd/MM/yyyy`, times as `HH:mm`, weekdays as a CSV of
//! 1 (Monday) to 7 (Sunday). Inside the crate everything is typed; this module
//! is the only place strings are parsed or produced.
//!
//! Parsing is lenient per entry: a malformed time, date or weekday is logged
//! and dropped, and the rest of the record is kept. Only an unusable id or an
//! unknown schedule type rejects a record.
//!
//! Both devices run the engine independently on the same snapshot. The
//! [`fingerprint`] of the materialized output lets them confirm they agree
//! without exchanging reminder lists.

use base64::Engine;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{DATE_FORMAT, TIME_FORMAT};
use crate::materialize::DaySchedule;
use crate::models::schedule::normalize_weekdays;
use crate::models::{Medication, Schedule, ScheduleType};

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Invalid id for {field}: {value}")]
    InvalidId { field: String, value: String },

    #[error("Snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ═══════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════

/// Medication as stored or synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// Schedule as stored or synced. Numeric fields are signed so that a
/// corrupted negative value can be read and ignored instead of failing the
/// whole snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    pub id: String,
    pub medication_id: String,
    pub schedule_type: String,
    #[serde(default)]
    pub specific_times: Vec<String>,
    #[serde(default)]
    pub days_of_week: Option<String>,
    #[serde(default)]
    pub interval_hours: i64,
    #[serde(default)]
    pub interval_minutes: i64,
    #[serde(default)]
    pub interval_start_time: Option<String>,
    #[serde(default)]
    pub interval_end_time: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// One medication and all of its schedules: the unit synced between devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub medication: MedicationRecord,
    #[serde(default)]
    pub schedules: Vec<ScheduleRecord>,
}

// ═══════════════════════════════════════════
// Record <-> model
// ═══════════════════════════════════════════

impl MedicationRecord {
    pub fn from_model(med: &Medication) -> Self {
        Self {
            id: med.id.to_string(),
            name: med.name.clone(),
            start_date: med.start_date.map(format_date),
            end_date: med.end_date.map(format_date),
        }
    }

    pub fn to_model(&self) -> Result<Medication, SnapshotError> {
        Ok(Medication {
            id: parse_id("medication.id", &self.id)?,
            name: self.name.clone(),
            start_date: self.start_date.as_deref().and_then(parse_date),
            end_date: self.end_date.as_deref().and_then(parse_date),
        })
    }
}

impl ScheduleRecord {
    pub fn from_model(schedule: &Schedule) -> Self {
        Self {
            id: schedule.id.to_string(),
            medication_id: schedule.medication_id.to_string(),
            schedule_type: schedule.schedule_type.as_str().to_string(),
            specific_times: schedule.specific_times.iter().map(|t| format_time(*t)).collect(),
            days_of_week: if schedule.days_of_week.is_empty() {
                None
            } else {
                Some(format_weekdays(&schedule.days_of_week))
            },
            interval_hours: i64::from(schedule.interval_hours),
            interval_minutes: i64::from(schedule.interval_minutes),
            interval_start_time: schedule.interval_start_time.map(format_time),
            interval_end_time: schedule.interval_end_time.map(format_time),
            is_active: schedule.is_active,
        }
    }

    pub fn to_model(&self) -> Result<Schedule, SnapshotError> {
        let schedule_type: ScheduleType = self.schedule_type.trim().parse()?;
        Ok(Schedule {
            id: parse_id("schedule.id", &self.id)?,
            medication_id: parse_id("schedule.medication_id", &self.medication_id)?,
            schedule_type,
            specific_times: self
                .specific_times
                .iter()
                .filter_map(|raw| parse_time(raw))
                .collect(),
            days_of_week: self
                .days_of_week
                .as_deref()
                .map(parse_weekdays)
                .unwrap_or_default(),
            interval_hours: non_negative("interval_hours", self.interval_hours),
            interval_minutes: non_negative("interval_minutes", self.interval_minutes),
            interval_start_time: self.interval_start_time.as_deref().and_then(parse_time),
            interval_end_time: self.interval_end_time.as_deref().and_then(parse_time),
            is_active: self.is_active,
        })
    }
}

impl ScheduleSnapshot {
    pub fn from_models(medication: &Medication, schedules: &[Schedule]) -> Self {
        Self {
            medication: MedicationRecord::from_model(medication),
            schedules: schedules.iter().map(ScheduleRecord::from_model).collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Typed medication plus every schedule that could be read.
    ///
    /// A bad medication record fails the snapshot. A bad schedule, or one
    /// that names a different medication, is logged and left out.
    pub fn to_models(&self) -> Result<(Medication, Vec<Schedule>), SnapshotError> {
        let medication = self.medication.to_model()?;
        let mut schedules = Vec::with_capacity(self.schedules.len());

        for record in &self.schedules {
            match record.to_model() {
                Ok(schedule) if schedule.medication_id == medication.id => schedules.push(schedule),
                Ok(schedule) => {
                    tracing::warn!(
                        schedule = %schedule.id,
                        owner = %schedule.medication_id,
                        medication = %medication.id,
                        "Schedule in snapshot belongs to another medication, skipping"
                    );
                }
                Err(e) => {
                    tracing::warn!(schedule = %record.id, error = %e, "Unreadable schedule, skipping");
                }
            }
        }

        Ok((medication, schedules))
    }
}

// ═══════════════════════════════════════════
// Lenient field parsers
// ═══════════════════════════════════════════

fn parse_id(field: &str, raw: &str) -> Result<Uuid, SnapshotError> {
    Uuid::parse_str(raw.trim()).map_err(|_| SnapshotError::InvalidId {
        field: field.into(),
        value: raw.into(),
    })
}

fn non_negative(field: &str, value: i64) -> u32 {
    match u32::try_from(value) {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!(field, value, "Out-of-range interval value, using 0");
            0
        }
    }
}

/// `dd/MM/yyyy`. Blank means absent; anything else unparseable is logged.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Skipping malformed date");
            None
        }
    }
}

/// `HH:mm`. Blank means absent; anything else unparseable is logged.
pub fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveTime::parse_from_str(raw, TIME_FORMAT) {
        Ok(time) => Some(time),
        Err(e) => {
            tracing::warn!(value = raw, error = %e, "Skipping malformed time");
            None
        }
    }
}

/// Comma-joined `HH:mm` list, the storage form of `specific_times`.
/// Order is preserved, malformed entries dropped.
pub fn parse_time_list(raw: &str) -> Vec<NaiveTime> {
    raw.split(',').filter_map(parse_time).collect()
}

/// CSV of weekday numbers, 1 = Monday through 7 = Sunday.
pub fn parse_weekdays(raw: &str) -> Vec<Weekday> {
    let days = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).filter_map(|s| {
        let day = s.parse::<u8>().ok().and_then(weekday_from_number);
        if day.is_none() {
            tracing::warn!(value = s, "Skipping invalid weekday number");
        }
        day
    });
    normalize_weekdays(days)
}

fn weekday_from_number(n: u8) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn format_time_list(times: &[NaiveTime]) -> String {
    times.iter().map(|t| format_time(*t)).collect::<Vec<_>>().join(",")
}

pub fn format_weekdays(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| d.number_from_monday().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

// ═══════════════════════════════════════════
// Cross-device agreement
// ═══════════════════════════════════════════

/// SHA-256 over the canonical `YYYY-MM-DD HH:MM` line rendering of a
/// materialized schedule, base64 encoded. Equal schedules give equal
/// fingerprints on any device.
pub fn fingerprint(by_day: &DaySchedule) -> String {
    let mut hasher = Sha256::new();
    for (date, times) in by_day {
        for time in times {
            hasher.update(format!("{} {}\n", date.format("%Y-%m-%d"), format_time(*time)));
        }
    }
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// Whether a companion's fingerprint matches what this device materialized.
pub fn agrees_with(by_day: &DaySchedule, remote_fingerprint: &str) -> bool {
    fingerprint(by_day) == remote_fingerprint.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materialize::compute_range_for_schedules;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn schedule_record(med_id: &str, kind: &str) -> ScheduleRecord {
        ScheduleRecord {
            id: Uuid::new_v4().to_string(),
            medication_id: med_id.into(),
            schedule_type: kind.into(),
            specific_times: vec![],
            days_of_week: None,
            interval_hours: 0,
            interval_minutes: 0,
            interval_start_time: None,
            interval_end_time: None,
            is_active: true,
        }
    }

    // ───────────────────────────────────────
    // Field parsers
    // ───────────────────────────────────────

    #[test]
    fn date_uses_day_month_year() {
        assert_eq!(parse_date("05/03/2025"), Some(d(2025, 3, 5)));
        assert_eq!(parse_date(" 31/12/2024 "), Some(d(2024, 12, 31)));
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2025-03-05"), None);
        assert_eq!(parse_date("31/02/2025"), None);
    }

    #[test]
    fn time_parses_hours_and_minutes() {
        assert_eq!(parse_time("08:00"), Some(t(8, 0)));
        assert_eq!(parse_time("23:59"), Some(t(23, 59)));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("noon"), None);
    }

    #[test]
    fn time_list_keeps_order_and_skips_garbage() {
        assert_eq!(parse_time_list("21:00,bad,09:00"), vec![t(21, 0), t(9, 0)]);
        assert!(parse_time_list("").is_empty());
    }

    #[test]
    fn weekdays_skip_invalid_numbers() {
        assert_eq!(
            parse_weekdays("7, 1,9,x,3,1"),
            vec![Weekday::Mon, Weekday::Wed, Weekday::Sun]
        );
        assert!(parse_weekdays("").is_empty());
    }

    #[test]
    fn formatters_match_parsers() {
        assert_eq!(format_date(d(2025, 3, 5)), "05/03/2025");
        assert_eq!(format_time(t(7, 5)), "07:05");
        assert_eq!(format_time_list(&[t(9, 0), t(21, 0)]), "09:00,21:00");
        assert_eq!(format_weekdays(&[Weekday::Mon, Weekday::Sun]), "1,7");
    }

    // ───────────────────────────────────────
    // Records
    // ───────────────────────────────────────

    #[test]
    fn schedule_record_drops_bad_entries_only() {
        let med = Uuid::new_v4().to_string();
        let mut rec = schedule_record(&med, "CUSTOM_ALARMS");
        rec.specific_times = vec!["09:00".into(), "25:61".into(), "21:00".into()];
        rec.days_of_week = Some("1,8".into());
        let schedule = rec.to_model().unwrap();
        assert_eq!(schedule.specific_times, vec![t(9, 0), t(21, 0)]);
        assert_eq!(schedule.days_of_week, vec![Weekday::Mon]);
    }

    #[test]
    fn daily_with_only_invalid_weekdays_runs_every_day() {
        let med = Medication::new("Metformin");
        let mut rec = schedule_record(&med.id.to_string(), "DAILY");
        rec.specific_times = vec!["08:00".into()];
        rec.days_of_week = Some("8".into());
        let schedule = rec.to_model().unwrap();
        assert!(schedule.days_of_week.is_empty());

        let out = compute_range_for_schedules(&med, &[schedule], d(2025, 6, 2), d(2025, 6, 8)).unwrap();
        assert_eq!(out.len(), 7);
        assert!(out.values().all(|times| times == &vec![t(8, 0)]));
    }

    #[test]
    fn negative_interval_reads_as_zero() {
        let med = Uuid::new_v4().to_string();
        let mut rec = schedule_record(&med, "INTERVAL");
        rec.interval_hours = -4;
        rec.interval_minutes = 30;
        let schedule = rec.to_model().unwrap();
        assert_eq!(schedule.interval_total_minutes(), 30);
    }

    #[test]
    fn unknown_type_rejects_record() {
        let med = Uuid::new_v4().to_string();
        let rec = schedule_record(&med, "MONTHLY");
        assert!(matches!(rec.to_model(), Err(SnapshotError::InvalidEnum { .. })));
    }

    #[test]
    fn bad_medication_id_rejects_record() {
        let rec = MedicationRecord {
            id: "not-a-uuid".into(),
            name: "X".into(),
            start_date: None,
            end_date: None,
        };
        assert!(matches!(rec.to_model(), Err(SnapshotError::InvalidId { .. })));
    }

    #[test]
    fn malformed_window_date_reads_as_unbounded() {
        let rec = MedicationRecord {
            id: Uuid::new_v4().to_string(),
            name: "X".into(),
            start_date: Some("yesterday".into()),
            end_date: Some("30/06/2025".into()),
        };
        let med = rec.to_model().unwrap();
        assert_eq!(med.start_date, None);
        assert_eq!(med.end_date, Some(d(2025, 6, 30)));
    }

    #[test]
    fn snapshot_skips_unreadable_and_foreign_schedules() {
        let med = Medication::new("Metformin");
        let good = Schedule::daily(med.id, t(8, 0));
        let mut snapshot = ScheduleSnapshot::from_models(&med, &[good.clone()]);
        snapshot.schedules.push(schedule_record(&med.id.to_string(), "YEARLY"));
        snapshot.schedules.push(schedule_record(&Uuid::new_v4().to_string(), "DAILY"));

        let (parsed_med, schedules) = snapshot.to_models().unwrap();
        assert_eq!(parsed_med, med);
        assert_eq!(schedules, vec![good]);
    }

    #[test]
    fn snapshot_json_uses_string_encodings() {
        let med = Medication::new("Metformin").with_window(Some(d(2025, 6, 1)), None);
        let s = Schedule::custom_alarms(med.id, vec![t(9, 0), t(21, 0)]).on_days([Weekday::Mon, Weekday::Fri]);
        let json = ScheduleSnapshot::from_models(&med, &[s]).to_json().unwrap();
        assert!(json.contains("\"start_date\":\"01/06/2025\""));
        assert!(json.contains("\"specific_times\":[\"09:00\",\"21:00\"]"));
        assert!(json.contains("\"days_of_week\":\"1,5\""));
        assert!(json.contains("\"schedule_type\":\"CUSTOM_ALARMS\""));
    }

    #[test]
    fn snapshot_json_tolerates_missing_optional_fields() {
        let med_id = Uuid::new_v4();
        let json = format!(
            r#"{{"medication":{{"id":"{med_id}"}},
                "schedules":[{{"id":"{}","medication_id":"{med_id}","schedule_type":"DAILY","specific_times":["08:00"]}}]}}"#,
            Uuid::new_v4()
        );
        let (med, schedules) = ScheduleSnapshot::from_json(&json).unwrap().to_models().unwrap();
        assert_eq!(med.id, med_id);
        assert_eq!(schedules.len(), 1);
        assert!(schedules[0].is_active);
        assert_eq!(schedules[0].specific_times, vec![t(8, 0)]);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            ScheduleSnapshot::from_json("{not json"),
            Err(SnapshotError::Json(_))
        ));
    }

    // ───────────────────────────────────────
    // Fingerprint
    // ───────────────────────────────────────

    #[test]
    fn both_devices_agree_on_synced_snapshot() {
        let med = Medication::new("Metformin");
        let schedules = vec![
            Schedule::custom_alarms(med.id, vec![t(21, 0), t(9, 0)]),
            Schedule::interval(med.id, 6, 0, Some(t(6, 0)), Some(t(22, 0))),
        ];
        let wire = ScheduleSnapshot::from_models(&med, &schedules).to_json().unwrap();

        let primary = compute_range_for_schedules(&med, &schedules, d(2025, 6, 1), d(2025, 6, 14)).unwrap();

        let (c_med, c_schedules) = ScheduleSnapshot::from_json(&wire).unwrap().to_models().unwrap();
        let companion =
            compute_range_for_schedules(&c_med, &c_schedules, d(2025, 6, 1), d(2025, 6, 14)).unwrap();

        assert_eq!(primary, companion);
        assert!(agrees_with(&companion, &fingerprint(&primary)));
    }

    #[test]
    fn fingerprint_changes_with_schedule() {
        let med = Medication::new("Metformin");
        let a = compute_range_for_schedules(&med, &[Schedule::daily(med.id, t(8, 0))], d(2025, 6, 1), d(2025, 6, 3)).unwrap();
        let b = compute_range_for_schedules(&med, &[Schedule::daily(med.id, t(8, 30))], d(2025, 6, 1), d(2025, 6, 3)).unwrap();
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
