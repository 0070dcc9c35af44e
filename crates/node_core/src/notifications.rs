//! Transient toast notifications, each expiring on its own timer.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::{
    domain::{NotificationCategory, NotificationId},
    error::ConfigError,
    protocol::{NodeEvent, NotificationPayload, RemovalReason},
};
use tokio::{
    sync::{broadcast, Mutex},
    time::Instant,
};
use tracing::debug;

use crate::timer::TimerHandle;

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: NotificationId,
    pub text: String,
    pub category: NotificationCategory,
    pub created_at: DateTime<Utc>,
    born: Instant,
}

impl Notification {
    fn new(text: String, category: NotificationCategory) -> Self {
        Self {
            id: NotificationId::random(),
            text,
            category,
            created_at: Utc::now(),
            born: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.born.elapsed()
    }

    pub fn payload(&self) -> NotificationPayload {
        NotificationPayload {
            id: self.id,
            text: self.text.clone(),
            category: self.category,
            created_at: self.created_at,
        }
    }
}

#[derive(Default)]
struct Board {
    active: Vec<Notification>,
    timers: HashMap<NotificationId, TimerHandle>,
}

impl Board {
    fn remove(&mut self, id: NotificationId) -> bool {
        let before = self.active.len();
        self.active.retain(|notification| notification.id != id);
        self.active.len() != before
    }
}

#[derive(Clone)]
pub struct NotificationCenter {
    ttl: Duration,
    board: Arc<Mutex<Board>>,
    events: broadcast::Sender<NodeEvent>,
}

impl NotificationCenter {
    pub fn new(ttl: Duration, events: broadcast::Sender<NodeEvent>) -> Result<Self, ConfigError> {
        if ttl.is_zero() {
            return Err(ConfigError::NonPositiveTtl);
        }
        Ok(Self {
            ttl,
            board: Arc::new(Mutex::new(Board::default())),
            events,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(
        &self,
        text: impl Into<String>,
        category: NotificationCategory,
    ) -> NotificationId {
        let notification = Notification::new(text.into(), category);
        let id = notification.id;
        let payload = notification.payload();
        let deadline = notification.born + self.ttl;

        let mut board = self.board.lock().await;
        board.active.push(notification);
        let timer = TimerHandle::spawn(expire_after(
            Arc::downgrade(&self.board),
            id,
            deadline,
            self.events.clone(),
        ));
        board.timers.insert(id, timer);
        debug!(%id, category = ?category, "notification raised");
        let _ = self.events.send(NodeEvent::NotificationRaised {
            notification: payload,
        });

        id
    }

    /// Removes a notification before it expires. Unknown, expired, or already
    /// dismissed ids are a no-op and return `false`.
    pub async fn dismiss(&self, id: NotificationId) -> bool {
        let mut board = self.board.lock().await;
        board.timers.remove(&id);
        let removed = board.remove(id);
        if removed {
            debug!(%id, "notification dismissed");
            let _ = self.events.send(NodeEvent::NotificationRemoved {
                id,
                reason: RemovalReason::Dismissed,
            });
        }
        removed
    }

    /// Notifications younger than the ttl, oldest first.
    pub async fn active(&self) -> Vec<Notification> {
        let board = self.board.lock().await;
        board
            .active
            .iter()
            .filter(|notification| notification.age() < self.ttl)
            .cloned()
            .collect()
    }

    /// Drops every notification and cancels its expiry timer.
    pub async fn clear(&self) -> usize {
        let mut board = self.board.lock().await;
        board.timers.clear();
        let cleared = board.active.len();
        board.active.clear();
        cleared
    }

    pub async fn pending_timers(&self) -> usize {
        self.board.lock().await.timers.len()
    }
}

async fn expire_after(
    board: Weak<Mutex<Board>>,
    id: NotificationId,
    deadline: Instant,
    events: broadcast::Sender<NodeEvent>,
) {
    // Counted from creation, not from when this task is first polled.
    tokio::time::sleep_until(deadline).await;
    let Some(shared) = board.upgrade() else {
        return;
    };

    let mut board = shared.lock().await;
    if let Some(own) = board.timers.remove(&id) {
        own.detach();
    }
    if board.remove(id) {
        debug!(%id, "notification expired");
        let _ = events.send(NodeEvent::NotificationRemoved {
            id,
            reason: RemovalReason::Expired,
        });
    }
}

#[cfg(test)]
#[path = "tests/notifications_tests.rs"]
mod tests;
