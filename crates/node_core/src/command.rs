//! The command tray: records what was typed and answers with a canned
//! acknowledgement after a delay. Nothing is ever executed.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Action, LogLevel},
    error::ConfigError,
    protocol::NodeEvent,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinSet,
};
use tracing::debug;

use crate::activity::ActivityLog;

pub struct CommandTray {
    ack_delay: Duration,
    output: Arc<Mutex<Vec<String>>>,
    acks: Mutex<JoinSet<()>>,
    activity: ActivityLog,
    events: broadcast::Sender<NodeEvent>,
}

impl CommandTray {
    pub fn new(
        ack_delay: Duration,
        activity: ActivityLog,
        events: broadcast::Sender<NodeEvent>,
    ) -> Result<Self, ConfigError> {
        if ack_delay.is_zero() {
            return Err(ConfigError::NonPositivePeriod {
                field: "command_ack_delay_ms",
            });
        }
        Ok(Self {
            ack_delay,
            output: Arc::new(Mutex::new(Vec::new())),
            acks: Mutex::new(JoinSet::new()),
            activity,
            events,
        })
    }

    /// Returns false when the command is blank and nothing was recorded.
    pub async fn invoke(&self, command: &str) -> bool {
        let command = command.trim();
        if command.is_empty() {
            return false;
        }

        self.activity
            .record(
                LogLevel::Info,
                format!("[USER]: Issued command - {command}"),
            )
            .await;
        push_line(&self.output, &self.events, format!("> {command}")).await;

        let ack = format!("[NODE]: Command \"{command}\" executed. Result: Success.");
        let output = Arc::clone(&self.output);
        let events = self.events.clone();
        let delay = self.ack_delay;

        let mut acks = self.acks.lock().await;
        while acks.try_join_next().is_some() {}
        acks.spawn(async move {
            tokio::time::sleep(delay).await;
            push_line(&output, &events, ack).await;
        });
        debug!(pending = acks.len(), "command: acknowledgement scheduled");
        true
    }

    pub async fn trigger(&self, action: Action) {
        self.activity
            .record(
                LogLevel::Info,
                format!("[NODE]: Triggered action - {}", action.label()),
            )
            .await;
    }

    /// Clears the output and drops every acknowledgement still in flight.
    pub async fn close(&self) {
        self.cancel_pending().await;
        self.output.lock().await.clear();
    }

    pub async fn cancel_pending(&self) {
        self.acks.lock().await.shutdown().await;
    }

    pub async fn output(&self) -> Vec<String> {
        self.output.lock().await.clone()
    }

    pub async fn pending_acks(&self) -> usize {
        let mut acks = self.acks.lock().await;
        while acks.try_join_next().is_some() {}
        acks.len()
    }
}

async fn push_line(
    output: &Mutex<Vec<String>>,
    events: &broadcast::Sender<NodeEvent>,
    line: String,
) {
    output.lock().await.push(line.clone());
    let _ = events.send(NodeEvent::CommandOutput { line });
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;
