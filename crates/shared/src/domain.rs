use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::UnknownAction;

macro_rules! uuid_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

uuid_newtype!(NotificationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Assistant,
    Autonomous,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Assistant => "assistant",
            Mode::Autonomous => "autonomous",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assistant" => Ok(Mode::Assistant),
            "autonomous" => Ok(Mode::Autonomous),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    Info,
    Success,
    Error,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 3] = [
        NotificationCategory::Success,
        NotificationCategory::Error,
        NotificationCategory::Info,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealmState {
    Unsynced,
    Synced,
    Anchored,
}

/// Ordered by severity: `Green < Yellow < Red`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Integrity {
    #[default]
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalBand {
    Strong,
    Fair,
    Weak,
}

impl SignalBand {
    pub fn from_strength(strength: f64) -> Self {
        if strength > 80.0 {
            SignalBand::Strong
        } else if strength > 40.0 {
            SignalBand::Fair
        } else {
            SignalBand::Weak
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// Buttons on the action panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Scan,
    AutoPatch,
    Trigger,
    ActivityLog,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Scan => "SCAN",
            Action::AutoPatch => "AUTO-PATCH",
            Action::Trigger => "TRIGGER",
            Action::ActivityLog => "ACTIVITY_LOG",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Action {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('_', "-");
        match normalized.as_str() {
            "SCAN" => Ok(Action::Scan),
            "AUTO-PATCH" => Ok(Action::AutoPatch),
            "TRIGGER" => Ok(Action::Trigger),
            "ACTIVITY-LOG" => Ok(Action::ActivityLog),
            _ => Err(UnknownAction(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_labels_case_insensitively() {
        assert_eq!("scan".parse::<Action>().expect("scan"), Action::Scan);
        assert_eq!(
            "auto_patch".parse::<Action>().expect("auto patch"),
            Action::AutoPatch
        );
        assert_eq!(
            "ACTIVITY_LOG".parse::<Action>().expect("activity log"),
            Action::ActivityLog
        );
        assert!("launch".parse::<Action>().is_err());
    }

    #[test]
    fn signal_band_thresholds_are_exclusive() {
        assert_eq!(SignalBand::from_strength(80.5), SignalBand::Strong);
        assert_eq!(SignalBand::from_strength(80.0), SignalBand::Fair);
        assert_eq!(SignalBand::from_strength(40.0), SignalBand::Weak);
    }

    #[test]
    fn notification_ids_round_trip_through_display() {
        let id = NotificationId::random();
        let parsed: NotificationId = id.to_string().parse().expect("uuid");
        assert_eq!(parsed, id);
    }
}
