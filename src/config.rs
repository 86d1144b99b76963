use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedReminder";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minutes in a day; also the most doses an interval schedule can emit.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Backstop for the interval walk. Unreachable with a positive step, kept
/// in case a stored interval is ever corrupted into something degenerate.
pub const MAX_INTERVAL_ITERATIONS: u32 = MINUTES_PER_DAY;

/// Days ahead a refresh materializes, today included.
pub const DEFAULT_HORIZON_DAYS: u32 = 7;
pub const MAX_HORIZON_DAYS: u32 = 90;

/// Environment variable overriding the refresh horizon.
pub const HORIZON_ENV: &str = "MEDREMINDER_HORIZON_DAYS";

/// Environment variable overriding the reminder store location.
pub const DATABASE_ENV: &str = "MEDREMINDER_DB";

/// Stored date format for medication start/end dates (dd/MM/yyyy).
pub const DATE_FORMAT: &str = "%d/%m/%Y";
/// Stored time-of-day format (HH:mm).
pub const TIME_FORMAT: &str = "%H:%M";
/// Stored reminder timestamp format.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Get the application data directory
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the reminder store database.
pub fn database_path() -> PathBuf {
    app_data_dir().join("reminders.db")
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,medreminder_lib=info"
}

/// Parse a horizon override, clamping to `1..=MAX_HORIZON_DAYS`.
/// Garbage falls back to the default.
pub fn parse_horizon(raw: Option<&str>) -> u32 {
    match raw.map(str::trim).and_then(|s| s.parse::<u32>().ok()) {
        Some(days) => days.clamp(1, MAX_HORIZON_DAYS),
        None => DEFAULT_HORIZON_DAYS,
    }
}
