//! The append-only whisper log and its single-writer / many-reader split.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<String>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends and returns the index of the new entry.
    pub fn push(&mut self, entry: impl Into<String>) -> usize {
        self.entries.push(entry.into());
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Length and newest entry of the log, published on every append.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogHead {
    pub len: usize,
    pub latest: Option<Arc<str>>,
}

pub fn message_log() -> (LogWriter, LogReader) {
    let log = Arc::new(RwLock::new(MessageLog::new()));
    let (head_tx, head_rx) = watch::channel(LogHead::default());
    (
        LogWriter {
            log: Arc::clone(&log),
            head: head_tx,
        },
        LogReader { log, head: head_rx },
    )
}

/// Sole writer of the log. Not `Clone`.
#[derive(Debug)]
pub struct LogWriter {
    log: Arc<RwLock<MessageLog>>,
    head: watch::Sender<LogHead>,
}

impl LogWriter {
    pub async fn append(&mut self, entry: impl Into<String>) -> usize {
        let entry: String = entry.into();
        let latest: Arc<str> = Arc::from(entry.as_str());
        let (index, len) = {
            let mut log = self.log.write().await;
            let index = log.push(entry);
            (index, log.len())
        };
        self.head.send_replace(LogHead {
            len,
            latest: Some(latest),
        });
        index
    }

    pub fn reader(&self) -> LogReader {
        LogReader {
            log: Arc::clone(&self.log),
            head: self.head.subscribe(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogReader {
    log: Arc<RwLock<MessageLog>>,
    head: watch::Receiver<LogHead>,
}

impl LogReader {
    pub fn head(&self) -> LogHead {
        self.head.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.head.borrow().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub async fn snapshot(&self) -> Vec<String> {
        self.log.read().await.entries().to_vec()
    }

    /// Waits for the next append and returns the new head. Errors once the
    /// writer is gone.
    pub async fn changed(&mut self) -> Result<LogHead, watch::error::RecvError> {
        self.head.changed().await?;
        Ok(self.head.borrow_and_update().clone())
    }

    /// Marks the current head as seen so `changed` only reports later appends.
    pub fn mark_seen(&mut self) -> LogHead {
        self.head.borrow_and_update().clone()
    }
}
