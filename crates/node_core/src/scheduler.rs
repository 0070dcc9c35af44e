//! Ambient whisper generation: one random whisper per tick, sometimes a toast.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::{
    domain::{Mode, NotificationCategory},
    error::ConfigError,
    protocol::NodeEvent,
};
use tokio::{
    sync::{broadcast, Mutex},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    entropy::Entropy, log::LogWriter, notifications::NotificationCenter, pool::MessageCatalog,
    timer::TimerHandle,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastDraft {
    pub text: String,
    pub category: NotificationCategory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub whisper: String,
    pub toast: Option<ToastDraft>,
}

pub struct AmbientScheduler {
    catalog: Arc<MessageCatalog>,
    mode: Mode,
    toast_probability: f64,
    entropy: Box<dyn Entropy>,
}

impl AmbientScheduler {
    pub fn new(
        catalog: Arc<MessageCatalog>,
        mode: Mode,
        toast_probability: f64,
        entropy: Box<dyn Entropy>,
    ) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&toast_probability) {
            return Err(ConfigError::ProbabilityOutOfRange {
                value: toast_probability,
            });
        }
        Ok(Self {
            catalog,
            mode,
            toast_probability,
            entropy,
        })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Draw order: whisper, toast roll, toast category, toast text.
    pub fn tick(&mut self) -> TickOutcome {
        let whisper = self
            .catalog
            .whispers(self.mode)
            .pick(self.entropy.as_mut())
            .to_string();

        let toast = if self.entropy.unit() < self.toast_probability {
            let category =
                NotificationCategory::ALL[self.entropy.index(NotificationCategory::ALL.len())];
            let text = self.catalog.toasts.pick(self.entropy.as_mut()).to_string();
            Some(ToastDraft { text, category })
        } else {
            None
        };

        TickOutcome { whisper, toast }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhisperPeriods {
    pub assistant: Duration,
    pub autonomous: Duration,
}

impl WhisperPeriods {
    pub fn for_mode(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Assistant => self.assistant,
            Mode::Autonomous => self.autonomous,
        }
    }
}

/// Owns the scheduler's periodic timer. At most one tick stream runs at a time.
pub struct AmbientLoop {
    scheduler: Arc<Mutex<AmbientScheduler>>,
    writer: Arc<Mutex<LogWriter>>,
    notifications: NotificationCenter,
    periods: WhisperPeriods,
    events: broadcast::Sender<NodeEvent>,
    timer: Mutex<Option<TimerHandle>>,
    live: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl AmbientLoop {
    pub fn new(
        scheduler: AmbientScheduler,
        writer: LogWriter,
        notifications: NotificationCenter,
        periods: WhisperPeriods,
        events: broadcast::Sender<NodeEvent>,
    ) -> Result<Self, ConfigError> {
        if periods.assistant.is_zero() {
            return Err(ConfigError::NonPositivePeriod {
                field: "assistant_whisper_period_ms",
            });
        }
        if periods.autonomous.is_zero() {
            return Err(ConfigError::NonPositivePeriod {
                field: "autonomous_whisper_period_ms",
            });
        }
        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            writer: Arc::new(Mutex::new(writer)),
            notifications,
            periods,
            events,
            timer: Mutex::new(None),
            live: Arc::new(AtomicUsize::new(0)),
            closed: AtomicBool::new(false),
        })
    }

    pub async fn start(&self) -> bool {
        let mode = self.scheduler.lock().await.mode();
        self.install(mode).await
    }

    /// Cancels the running tick stream, then installs one for `mode`.
    /// Returns false once the loop is closed.
    pub async fn switch_mode(&self, mode: Mode) -> bool {
        self.install(mode).await
    }

    async fn install(&self, mode: Mode) -> bool {
        let mut timer = self.timer.lock().await;
        if self.is_closed() {
            return false;
        }
        if let Some(previous) = timer.take() {
            previous.cancel().await;
        }
        self.scheduler.lock().await.set_mode(mode);

        let period = self.periods.for_mode(mode);
        *timer = Some(TimerHandle::spawn(run_ticks(
            Arc::clone(&self.scheduler),
            Arc::clone(&self.writer),
            self.notifications.clone(),
            period,
            self.events.clone(),
            Arc::clone(&self.live),
        )));
        info!(
            mode = mode.label(),
            period_ms = period.as_millis() as u64,
            "ambient: tick stream installed"
        );
        true
    }

    /// Cancels future ticks. Notifications already raised keep their own
    /// expiry timers.
    pub async fn stop(&self) -> bool {
        let previous = self.timer.lock().await.take();
        match previous {
            Some(timer) => {
                timer.cancel().await;
                info!("ambient: tick stream stopped");
                true
            }
            None => false,
        }
    }

    /// Stops the tick stream for good: later starts and mode switches are
    /// refused.
    pub async fn close(&self) {
        let previous = {
            let mut timer = self.timer.lock().await;
            self.closed.store(true, Ordering::SeqCst);
            timer.take()
        };
        if let Some(timer) = previous {
            timer.cancel().await;
            info!("ambient: tick stream closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn is_running(&self) -> bool {
        self.timer.lock().await.is_some()
    }

    pub async fn mode(&self) -> Mode {
        self.scheduler.lock().await.mode()
    }

    /// Number of tick streams currently alive.
    pub fn live_tick_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

struct LiveGuard(Arc<AtomicUsize>);

impl LiveGuard {
    fn enter(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn run_ticks(
    scheduler: Arc<Mutex<AmbientScheduler>>,
    writer: Arc<Mutex<LogWriter>>,
    notifications: NotificationCenter,
    period: Duration,
    events: broadcast::Sender<NodeEvent>,
    live: Arc<AtomicUsize>,
) {
    let _live = LiveGuard::enter(live);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let outcome = scheduler.lock().await.tick();
        let index = writer.lock().await.append(outcome.whisper.clone()).await;
        debug!(index, "ambient: whisper appended");
        let _ = events.send(NodeEvent::WhisperAppended {
            index,
            text: outcome.whisper,
        });

        if let Some(toast) = outcome.toast {
            notifications.create(toast.text, toast.category).await;
        }
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
