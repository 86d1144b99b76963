use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A concrete (date, time) at which a dose is due. Has no identity until it
/// is matched against a stored record; two instants are the same reminder iff
/// their values are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReminderInstant(NaiveDateTime);

impl ReminderInstant {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self(date.and_time(time))
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.0.time()
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for ReminderInstant {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

/// A reminder as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub scheduled_at: NaiveDateTime,
    pub is_taken: bool,
    pub taken_at: Option<NaiveDateTime>,
}

impl ReminderRecord {
    /// A fresh, untaken record for a materialized instant.
    pub fn pending(medication_id: Uuid, instant: ReminderInstant) -> Self {
        Self {
            id: Uuid::new_v4(),
            medication_id,
            scheduled_at: instant.timestamp(),
            is_taken: false,
            taken_at: None,
        }
    }

    pub fn instant(&self) -> ReminderInstant {
        ReminderInstant::from(self.scheduled_at)
    }
}
