//! Recurrence engine: one schedule, one calendar day, the times a dose is due.
//!
//! Pure and deterministic. The phone and the companion device both call
//! into this module with the same schedule snapshot and must get identical
//! output, so nothing here reads the clock, the locale, or any shared state.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::config::{MAX_INTERVAL_ITERATIONS, MINUTES_PER_DAY};
use crate::error::EngineError;
use crate::models::{Medication, ReminderInstant, Schedule, ScheduleType};

const SECONDS_PER_DAY: u32 = MINUTES_PER_DAY * 60;

// ═══════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════

/// Times of day at which `schedule` is due on `date`, ascending, no repeats.
///
/// Returns an empty list when the medication is outside its active window
/// on `date`, whatever the schedule type. Fails only when `schedule` does
/// not belong to `medication`.
pub fn compute_day(
    medication: &Medication,
    schedule: &Schedule,
    date: NaiveDate,
) -> Result<Vec<NaiveTime>, EngineError> {
    ensure_schedule_owner(medication, schedule)?;

    if !medication.is_active_on(date) {
        tracing::debug!(
            medication = %medication.id,
            %date,
            "Medication inactive on date, no reminders"
        );
        return Ok(Vec::new());
    }

    let mut times = match schedule.schedule_type {
        ScheduleType::Daily => daily_times(schedule, date),
        ScheduleType::CustomAlarms => schedule.specific_times.clone(),
        ScheduleType::Interval => interval_times(schedule),
        ScheduleType::Weekly => {
            // Known gap: weekly schedules are stored and synced but never
            // expanded into reminders.
            tracing::debug!(schedule = %schedule.id, "Weekly schedules are not expanded");
            Vec::new()
        }
        ScheduleType::AsNeeded => Vec::new(),
    };

    times.sort_unstable();
    times.dedup();
    Ok(times)
}

/// Same as [`compute_day`], combined with `date` into full instants.
pub fn compute_day_instants(
    medication: &Medication,
    schedule: &Schedule,
    date: NaiveDate,
) -> Result<Vec<ReminderInstant>, EngineError> {
    Ok(compute_day(medication, schedule, date)?
        .into_iter()
        .map(|time| ReminderInstant::new(date, time))
        .collect())
}

pub(crate) fn ensure_schedule_owner(
    medication: &Medication,
    schedule: &Schedule,
) -> Result<(), EngineError> {
    if schedule.medication_id != medication.id {
        return Err(EngineError::ScheduleMismatch {
            schedule_id: schedule.id,
            owner: schedule.medication_id,
            medication_id: medication.id,
        });
    }
    Ok(())
}

// ═══════════════════════════════════════════
// Per-type expansion
// ═══════════════════════════════════════════

/// First stored time only (list order, not time order), gated by weekday.
fn daily_times(schedule: &Schedule, date: NaiveDate) -> Vec<NaiveTime> {
    if !schedule.runs_on(date.weekday()) {
        return Vec::new();
    }
    schedule.specific_times.first().copied().into_iter().collect()
}

/// Walk the daily window in absolute seconds since midnight. A step past
/// the end of the day simply leaves the window, so there is no wraparound
/// to detect.
fn interval_times(schedule: &Schedule) -> Vec<NaiveTime> {
    let step_minutes = schedule.interval_total_minutes();
    if step_minutes == 0 {
        return Vec::new();
    }
    let step = step_minutes.saturating_mul(60);

    let start = schedule
        .interval_start_time
        .map(|t| t.num_seconds_from_midnight())
        .unwrap_or(0);
    let end = schedule
        .interval_end_time
        .map(|t| t.num_seconds_from_midnight())
        .unwrap_or(SECONDS_PER_DAY - 1);

    let mut times = Vec::new();
    let mut current = start;
    let mut iterations = 0;

    while current <= end && current < SECONDS_PER_DAY {
        if iterations >= MAX_INTERVAL_ITERATIONS {
            tracing::warn!(
                schedule = %schedule.id,
                step_minutes,
                "Interval expansion hit iteration ceiling, truncating"
            );
            break;
        }
        if let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(current, 0) {
            times.push(time);
        }
        iterations += 1;
        current = current.saturating_add(step);
    }

    times
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
