//! Period materializer: walks a date range one calendar day at a time and
//! collects what the recurrence engine produces for each day.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::EngineError;
use crate::models::{Medication, ReminderInstant, Schedule};
use crate::recurrence::{compute_day, ensure_schedule_owner};

/// Materialized reminders, keyed by day. Each day's times are ascending and
/// distinct; days with nothing due are absent.
pub type DaySchedule = BTreeMap<NaiveDate, Vec<NaiveTime>>;

/// Reminder times of one schedule for every day in `[start, end]`.
///
/// An inverted range yields an empty map.
pub fn compute_range(
    medication: &Medication,
    schedule: &Schedule,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DaySchedule, EngineError> {
    ensure_schedule_owner(medication, schedule)?;
    materialize(medication, &[schedule], start, end)
}

/// Union of every schedule's reminders for one medication over `[start, end]`.
///
/// Inactive schedules, and kinds that never generate reminders, are skipped
/// here, unlike [`compute_range`] which expands whatever it is given. Overlapping schedules that emit the same
/// time on the same day produce a single entry.
pub fn compute_range_for_schedules(
    medication: &Medication,
    schedules: &[Schedule],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DaySchedule, EngineError> {
    for schedule in schedules {
        ensure_schedule_owner(medication, schedule)?;
    }
    let active: Vec<&Schedule> = schedules
        .iter()
        .filter(|s| s.is_active && s.schedule_type.generates_reminders())
        .collect();
    materialize(medication, &active, start, end)
}

fn materialize(
    medication: &Medication,
    schedules: &[&Schedule],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<DaySchedule, EngineError> {
    let mut by_day = DaySchedule::new();

    if start > end {
        tracing::debug!(%start, %end, "Inverted range, nothing to materialize");
        return Ok(by_day);
    }
    if !medication.active_window_overlaps(start, end) {
        tracing::debug!(
            medication = %medication.id,
            %start,
            %end,
            "Range outside active window"
        );
        return Ok(by_day);
    }

    for date in days_inclusive(start, end) {
        for schedule in schedules {
            let times = compute_day(medication, schedule, date)?;
            if !times.is_empty() {
                by_day.entry(date).or_default().extend(times);
            }
        }
    }

    for times in by_day.values_mut() {
        times.sort_unstable();
        times.dedup();
    }

    Ok(by_day)
}

/// All instants of a [`DaySchedule`] in ascending order.
pub fn flatten(by_day: &DaySchedule) -> Vec<ReminderInstant> {
    by_day
        .iter()
        .flat_map(|(date, times)| times.iter().map(|time| ReminderInstant::new(*date, *time)))
        .collect()
}

/// First reminder strictly after `after`, looking at most `lookahead_days`
/// calendar days ahead (the day of `after` included).
pub fn next_reminder(
    medication: &Medication,
    schedules: &[Schedule],
    after: NaiveDateTime,
    lookahead_days: u32,
) -> Result<Option<ReminderInstant>, EngineError> {
    if lookahead_days == 0 {
        return Ok(None);
    }
    let start = after.date();
    let end = start
        .checked_add_days(Days::new(u64::from(lookahead_days) - 1))
        .unwrap_or(NaiveDate::MAX);

    let by_day = compute_range_for_schedules(medication, schedules, start, end)?;
    Ok(flatten(&by_day)
        .into_iter()
        .find(|instant| instant.timestamp() > after))
}

/// Every date from `start` to `end`, both included.
pub(crate) fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |date| *date <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScheduleType;
    use chrono::Weekday;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn range_covers_every_day_inclusive() {
        let m = Medication::new("Vitamin D");
        let s = Schedule::daily(m.id, t(8, 0));
        let out = compute_range(&m, &s, d(2025, 6, 1), d(2025, 6, 7)).unwrap();
        assert_eq!(out.len(), 7);
        assert!(out.values().all(|times| times == &vec![t(8, 0)]));
        assert!(out.contains_key(&d(2025, 6, 1)));
        assert!(out.contains_key(&d(2025, 6, 7)));
    }

    #[test]
    fn range_crosses_month_boundary() {
        let m = Medication::new("Vitamin D");
        let s = Schedule::daily(m.id, t(8, 0));
        let out = compute_range(&m, &s, d(2025, 2, 27), d(2025, 3, 2)).unwrap();
        let days: Vec<_> = out.keys().copied().collect();
        assert_eq!(days, vec![d(2025, 2, 27), d(2025, 2, 28), d(2025, 3, 1), d(2025, 3, 2)]);
    }

    #[test]
    fn range_clips_to_active_window() {
        let m = Medication::new("Amoxicillin").with_window(Some(d(2025, 6, 3)), Some(d(2025, 6, 5)));
        let s = Schedule::custom_alarms(m.id, vec![t(8, 0), t(20, 0)]);
        let out = compute_range(&m, &s, d(2025, 6, 1), d(2025, 6, 10)).unwrap();
        let days: Vec<_> = out.keys().copied().collect();
        assert_eq!(days, vec![d(2025, 6, 3), d(2025, 6, 4), d(2025, 6, 5)]);
    }

    #[test]
    fn range_outside_window_is_empty() {
        let m = Medication::new("Amoxicillin").with_window(Some(d(2025, 7, 1)), None);
        let s = Schedule::daily(m.id, t(8, 0));
        assert!(compute_range(&m, &s, d(2025, 6, 1), d(2025, 6, 30)).unwrap().is_empty());
    }

    #[test]
    fn inverted_range_is_empty() {
        let m = Medication::new("Vitamin D");
        let s = Schedule::daily(m.id, t(8, 0));
        assert!(compute_range(&m, &s, d(2025, 6, 7), d(2025, 6, 1)).unwrap().is_empty());
    }

    #[test]
    fn weekday_gated_days_are_absent() {
        let m = Medication::new("Methotrexate");
        let s = Schedule::daily(m.id, t(9, 0)).on_days([Weekday::Sat]);
        // 2025-06-02 Monday .. 2025-06-08 Sunday
        let out = compute_range(&m, &s, d(2025, 6, 2), d(2025, 6, 8)).unwrap();
        assert_eq!(out.keys().copied().collect::<Vec<_>>(), vec![d(2025, 6, 7)]);
    }

    #[test]
    fn range_is_idempotent() {
        let m = Medication::new("Ibuprofen");
        let s = Schedule::interval(m.id, 3, 15, Some(t(6, 0)), Some(t(23, 0)));
        let a = compute_range(&m, &s, d(2025, 1, 1), d(2025, 1, 31)).unwrap();
        let b = compute_range(&m, &s, d(2025, 1, 1), d(2025, 1, 31)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn overlapping_schedules_merge_by_value() {
        let m = Medication::new("Metformin");
        let schedules = vec![
            Schedule::daily(m.id, t(8, 0)),
            Schedule::custom_alarms(m.id, vec![t(20, 0), t(8, 0)]),
        ];
        let out = compute_range_for_schedules(&m, &schedules, d(2025, 6, 2), d(2025, 6, 2)).unwrap();
        assert_eq!(out[&d(2025, 6, 2)], vec![t(8, 0), t(20, 0)]);
    }

    #[test]
    fn inactive_schedules_are_skipped_when_aggregating() {
        let m = Medication::new("Metformin");
        let mut paused = Schedule::daily(m.id, t(12, 0));
        paused.is_active = false;
        let schedules = vec![Schedule::daily(m.id, t(8, 0)), paused];
        let out = compute_range_for_schedules(&m, &schedules, d(2025, 6, 2), d(2025, 6, 2)).unwrap();
        assert_eq!(out[&d(2025, 6, 2)], vec![t(8, 0)]);
    }

    #[test]
    fn as_needed_only_medication_materializes_nothing() {
        let m = Medication::new("Paracetamol");
        let s = Schedule::new(m.id, ScheduleType::AsNeeded);
        assert!(compute_range(&m, &s, d(2025, 6, 1), d(2025, 6, 30)).unwrap().is_empty());
    }

    #[test]
    fn weekly_schedules_are_skipped_when_aggregating() {
        let m = Medication::new("Alendronate");
        let weekly = Schedule::new(m.id, ScheduleType::Weekly);
        assert!(!weekly.schedule_type.generates_reminders());
        let schedules = vec![weekly, Schedule::new(m.id, ScheduleType::AsNeeded)];
        let out = compute_range_for_schedules(&m, &schedules, d(2025, 6, 2), d(2025, 6, 8)).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn flatten_orders_by_day_then_time() {
        let m = Medication::new("Metformin");
        let s = Schedule::custom_alarms(m.id, vec![t(20, 0), t(8, 0)]);
        let out = compute_range(&m, &s, d(2025, 6, 1), d(2025, 6, 2)).unwrap();
        let flat = flatten(&out);
        assert_eq!(
            flat,
            vec![
                ReminderInstant::new(d(2025, 6, 1), t(8, 0)),
                ReminderInstant::new(d(2025, 6, 1), t(20, 0)),
                ReminderInstant::new(d(2025, 6, 2), t(8, 0)),
                ReminderInstant::new(d(2025, 6, 2), t(20, 0)),
            ]
        );
    }

    #[test]
    fn next_reminder_skips_past_times_today() {
        let m = Medication::new("Metformin");
        let schedules = vec![Schedule::custom_alarms(m.id, vec![t(8, 0), t(20, 0)])];
        let now = d(2025, 6, 2).and_time(t(9, 30));
        let next = next_reminder(&m, &schedules, now, 2).unwrap();
        assert_eq!(next, Some(ReminderInstant::new(d(2025, 6, 2), t(20, 0))));
    }

    #[test]
    fn next_reminder_rolls_to_next_day() {
        let m = Medication::new("Metformin");
        let schedules = vec![Schedule::daily(m.id, t(8, 0))];
        let now = d(2025, 6, 2).and_time(t(8, 0));
        let next = next_reminder(&m, &schedules, now, 2).unwrap().unwrap();
        assert_eq!(next.date(), d(2025, 6, 3));
        assert_eq!(next.time(), t(8, 0));
        assert_eq!(next, ReminderInstant::from(d(2025, 6, 3).and_time(t(8, 0))));
    }

    #[test]
    fn next_reminder_none_after_end_date() {
        let m = Medication::new("Amoxicillin").with_window(None, Some(d(2025, 6, 2)));
        let schedules = vec![Schedule::daily(m.id, t(8, 0))];
        let now = d(2025, 6, 2).and_time(t(9, 0));
        assert_eq!(next_reminder(&m, &schedules, now, 30).unwrap(), None);
    }
}
