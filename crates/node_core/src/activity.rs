use std::sync::Arc;

use shared::{
    domain::LogLevel,
    protocol::{LogEntry, NodeEvent},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

/// Ordered activity log shared by the command tray and the dashboard.
#[derive(Clone)]
pub struct ActivityLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    events: broadcast::Sender<NodeEvent>,
}

impl ActivityLog {
    pub fn new(events: broadcast::Sender<NodeEvent>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            events,
        }
    }

    pub async fn record(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message);
        match level {
            LogLevel::Info => info!(target: "activity", "{}", entry.message),
            LogLevel::Warning | LogLevel::Error => {
                warn!(target: "activity", level = ?level, "{}", entry.message)
            }
        }
        self.entries.lock().await.push(entry.clone());
        let _ = self.events.send(NodeEvent::ActivityLogged { entry });
    }

    pub async fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().await.clone()
    }
}
