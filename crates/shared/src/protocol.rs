use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Integrity, LogLevel, Mode, NotificationCategory, NotificationId, RealmState, SignalBand,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationPayload {
    pub id: NotificationId,
    pub text: String,
    pub category: NotificationCategory,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Expired,
    Dismissed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HudSnapshot {
    pub power: f64,
    pub stability: f64,
    pub flow_loops: u8,
    pub integrity: Integrity,
    pub connection_strength: f64,
    pub signal: SignalBand,
    pub energy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealmStatus {
    pub name: String,
    pub state: RealmState,
    pub anchor: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Everything a view needs to animate the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum NodeEvent {
    WhisperAppended {
        index: usize,
        text: String,
    },
    RevealStarted {
        text: String,
    },
    CharRevealed {
        ch: char,
        cursor: usize,
    },
    RevealCompleted {
        text: String,
    },
    NotificationRaised {
        notification: NotificationPayload,
    },
    NotificationRemoved {
        id: NotificationId,
        reason: RemovalReason,
    },
    ModeChanged {
        mode: Mode,
    },
    CommandOutput {
        line: String,
    },
    ActivityLogged {
        entry: LogEntry,
    },
    HudUpdated {
        hud: HudSnapshot,
    },
    RealmsUpdated {
        realms: Vec<RealmStatus>,
    },
}
