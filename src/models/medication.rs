use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medication as seen by the reminder engine. Only the active window
/// matters for scheduling; `name` is carried for logs and display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    /// First day doses are due (inclusive). `None` means no lower bound.
    pub start_date: Option<NaiveDate>,
    /// Last day doses are due (inclusive). `None` means no upper bound.
    pub end_date: Option<NaiveDate>,
}

impl Medication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_window(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// False when `date` falls before the start date or after the end date.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        if self.start_date.is_some_and(|start| start > date) {
            return false;
        }
        if self.end_date.is_some_and(|end| end < date) {
            return false;
        }
        true
    }

    /// False when the whole `[from, to]` range lies outside the active window.
    pub fn active_window_overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        if self.start_date.is_some_and(|start| start > to) {
            return false;
        }
        if self.end_date.is_some_and(|end| end < from) {
            return false;
        }
        true
    }
}
