//! Repository layer: entity-scoped database operations.
//!
//! Medications and schedules are stored in their string-encoded snapshot
//! form and decoded through the same lenient path the companion device uses.

mod medication;
mod reminder;
mod schedule;

pub use medication::*;
pub use reminder::*;
pub use schedule::*;
