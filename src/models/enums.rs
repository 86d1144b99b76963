use serde::{Deserialize, Serialize};

use crate::snapshot::SnapshotError;

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = SnapshotError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(SnapshotError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ScheduleType {
    Daily => "DAILY",
    CustomAlarms => "CUSTOM_ALARMS",
    Interval => "INTERVAL",
    Weekly => "WEEKLY",
    AsNeeded => "AS_NEEDED",
});

impl ScheduleType {
    /// Whether this kind of schedule ever produces proactive reminders.
    /// WEEKLY has no expansion rule yet and yields nothing.
    pub fn generates_reminders(&self) -> bool {
        !matches!(self, Self::Weekly | Self::AsNeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn schedule_type_round_trip() {
        for (variant, s) in [
            (ScheduleType::Daily, "DAILY"),
            (ScheduleType::CustomAlarms, "CUSTOM_ALARMS"),
            (ScheduleType::Interval, "INTERVAL"),
            (ScheduleType::Weekly, "WEEKLY"),
            (ScheduleType::AsNeeded, "AS_NEEDED"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ScheduleType::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_schedule_type_returns_error() {
        assert!(ScheduleType::from_str("daily").is_err());
        assert!(ScheduleType::from_str("MONTHLY").is_err());
        assert!(ScheduleType::from_str("").is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ScheduleType::CustomAlarms).unwrap();
        assert_eq!(json, "\"CUSTOM_ALARMS\"");
        let parsed: ScheduleType = serde_json::from_str("\"AS_NEEDED\"").unwrap();
        assert_eq!(parsed, ScheduleType::AsNeeded);
    }

    #[test]
    fn weekly_and_as_needed_are_silent() {
        assert!(!ScheduleType::AsNeeded.generates_reminders());
        assert!(!ScheduleType::Weekly.generates_reminders());
        assert!(ScheduleType::Daily.generates_reminders());
        assert!(ScheduleType::CustomAlarms.generates_reminders());
        assert!(ScheduleType::Interval.generates_reminders());
    }
}
