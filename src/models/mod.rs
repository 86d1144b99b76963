pub mod enums;
pub mod medication;
pub mod reminder;
pub mod schedule;

pub use enums::ScheduleType;
pub use medication::Medication;
pub use reminder::{ReminderInstant, ReminderRecord};
pub use schedule::Schedule;
