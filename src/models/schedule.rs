use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ScheduleType;

/// One dosing rule for a medication. Which fields matter depends on
/// `schedule_type`; the rest are carried but ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub schedule_type: ScheduleType,
    /// DAILY uses the first entry only, CUSTOM_ALARMS uses all of them.
    /// List order is preserved as stored.
    pub specific_times: Vec<NaiveTime>,
    /// Empty means every day. Kept in Monday..Sunday order without repeats.
    pub days_of_week: Vec<Weekday>,
    pub interval_hours: u32,
    pub interval_minutes: u32,
    /// Defaults to start of day when absent.
    pub interval_start_time: Option<NaiveTime>,
    /// Defaults to end of day when absent.
    pub interval_end_time: Option<NaiveTime>,
    pub is_active: bool,
}

impl Schedule {
    /// A schedule of the given type with every type-specific field empty.
    pub fn new(medication_id: Uuid, schedule_type: ScheduleType) -> Self {
        Self {
            id: Uuid::new_v4(),
            medication_id,
            schedule_type,
            specific_times: Vec::new(),
            days_of_week: Vec::new(),
            interval_hours: 0,
            interval_minutes: 0,
            interval_start_time: None,
            interval_end_time: None,
            is_active: true,
        }
    }

    pub fn daily(medication_id: Uuid, time: NaiveTime) -> Self {
        Self {
            specific_times: vec![time],
            ..Self::new(medication_id, ScheduleType::Daily)
        }
    }

    pub fn custom_alarms(medication_id: Uuid, times: Vec<NaiveTime>) -> Self {
        Self {
            specific_times: times,
            ..Self::new(medication_id, ScheduleType::CustomAlarms)
        }
    }

    pub fn interval(
        medication_id: Uuid,
        hours: u32,
        minutes: u32,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
    ) -> Self {
        Self {
            interval_hours: hours,
            interval_minutes: minutes,
            interval_start_time: start,
            interval_end_time: end,
            ..Self::new(medication_id, ScheduleType::Interval)
        }
    }

    /// Restrict the schedule to the given weekdays, normalised to
    /// Monday..Sunday order with duplicates removed.
    pub fn on_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.days_of_week = normalize_weekdays(days);
        self
    }

    /// Interval length in minutes. Saturates rather than overflowing on
    /// absurd stored values.
    pub fn interval_total_minutes(&self) -> u32 {
        self.interval_hours
            .saturating_mul(60)
            .saturating_add(self.interval_minutes)
    }

    /// True when no weekday restriction applies or `day` is listed.
    pub fn runs_on(&self, day: Weekday) -> bool {
        self.days_of_week.is_empty() || self.days_of_week.contains(&day)
    }
}

/// Sort weekdays Monday first and drop repeats.
pub fn normalize_weekdays(days: impl IntoIterator<Item = Weekday>) -> Vec<Weekday> {
    let mut out: Vec<Weekday> = days.into_iter().collect();
    out.sort_by_key(|d| d.number_from_monday());
    out.dedup();
    out
}
