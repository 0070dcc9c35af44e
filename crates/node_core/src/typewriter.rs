//! Reveals the newest whisper one character per tick.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{domain::Mode, protocol::NodeEvent};
use tokio::{
    sync::{broadcast, watch, Mutex},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, trace};

use crate::{log::LogReader, timer::TimerHandle};

/// Cursor into the current target plus the text revealed so far. The revealed
/// text is always a prefix of the target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevealState {
    target: String,
    units: Vec<char>,
    cursor: usize,
    revealed: String,
}

impl RevealState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandons any reveal in progress and starts over on `target`.
    pub fn retarget(&mut self, target: &str) {
        self.target = target.to_string();
        self.units = target.chars().collect();
        self.cursor = 0;
        self.revealed.clear();
    }

    pub fn advance(&mut self) -> Option<char> {
        let unit = *self.units.get(self.cursor)?;
        self.revealed.push(unit);
        self.cursor += 1;
        Some(unit)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor == self.units.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn revealed(&self) -> &str {
        &self.revealed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealCadence {
    pub assistant: Duration,
    pub autonomous: Duration,
}

impl RevealCadence {
    pub fn for_mode(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Assistant => self.assistant,
            Mode::Autonomous => self.autonomous,
        }
    }
}

pub struct TypewriterHandle {
    timer: TimerHandle,
    state: Arc<Mutex<RevealState>>,
    ticking: Arc<AtomicBool>,
}

impl TypewriterHandle {
    pub async fn state(&self) -> RevealState {
        self.state.lock().await.clone()
    }

    pub async fn revealed(&self) -> String {
        self.state.lock().await.revealed().to_string()
    }

    /// Whether the reveal ticker is currently running.
    pub fn is_ticking(&self) -> bool {
        self.ticking.load(Ordering::SeqCst)
    }

    pub async fn stop(self) {
        self.timer.cancel().await;
        self.ticking.store(false, Ordering::SeqCst);
    }
}

/// Starts rendering whispers appended after this call. Entries already in the
/// log are history and are not replayed.
pub fn spawn_typewriter(
    mut reader: LogReader,
    mode: watch::Receiver<Mode>,
    cadence: RevealCadence,
    events: broadcast::Sender<NodeEvent>,
) -> TypewriterHandle {
    reader.mark_seen();
    let state = Arc::new(Mutex::new(RevealState::new()));
    let ticking = Arc::new(AtomicBool::new(false));
    let timer = TimerHandle::spawn(run_typewriter(
        reader,
        mode,
        cadence,
        Arc::clone(&state),
        Arc::clone(&ticking),
        events,
    ));
    TypewriterHandle {
        timer,
        state,
        ticking,
    }
}

async fn run_typewriter(
    mut reader: LogReader,
    mode: watch::Receiver<Mode>,
    cadence: RevealCadence,
    state: Arc<Mutex<RevealState>>,
    ticking: Arc<AtomicBool>,
    events: broadcast::Sender<NodeEvent>,
) {
    while let Ok(head) = reader.changed().await {
        let mut target = head.latest;

        'reveal: while let Some(text) = target.take() {
            let done = {
                let mut state = state.lock().await;
                state.retarget(&text);
                state.is_complete()
            };
            debug!(len = text.chars().count(), "typewriter: reveal started");
            let _ = events.send(NodeEvent::RevealStarted {
                text: text.to_string(),
            });
            if done {
                let _ = events.send(NodeEvent::RevealCompleted {
                    text: text.to_string(),
                });
                break;
            }

            let period = cadence.for_mode(*mode.borrow());
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticking.store(true, Ordering::SeqCst);

            loop {
                tokio::select! {
                    biased;
                    changed = reader.changed() => {
                        ticking.store(false, Ordering::SeqCst);
                        match changed {
                            Ok(head) => {
                                debug!("typewriter: newer whisper arrived, abandoning reveal");
                                target = head.latest;
                                continue 'reveal;
                            }
                            Err(_) => return,
                        }
                    }
                    _ = ticker.tick() => {
                        let (unit, cursor, complete) = {
                            let mut state = state.lock().await;
                            let unit = state.advance();
                            (unit, state.cursor(), state.is_complete())
                        };
                        if let Some(ch) = unit {
                            trace!(cursor, "typewriter: revealed unit");
                            let _ = events.send(NodeEvent::CharRevealed { ch, cursor });
                        }
                        if complete {
                            ticking.store(false, Ordering::SeqCst);
                            let _ = events.send(NodeEvent::RevealCompleted {
                                text: text.to_string(),
                            });
                            break 'reveal;
                        }
                    }
                }
            }
        }
    }
    ticking.store(false, Ordering::SeqCst);
}

#[cfg(test)]
#[path = "tests/typewriter_tests.rs"]
mod tests;
