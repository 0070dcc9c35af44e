pub mod activity;
pub mod advancer;
pub mod command;
pub mod config;
pub mod dashboard;
pub mod entropy;
pub mod log;
pub mod notifications;
pub mod pool;
pub mod presence;
pub mod scheduler;
pub mod timer;
pub mod typewriter;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use shared::{
    domain::{Action, Mode, NotificationCategory, NotificationId},
    error::ConfigError,
    protocol::{HudSnapshot, LogEntry, NodeEvent, RealmStatus},
};
use tokio::sync::{broadcast, watch, Mutex};
use tracing::info;

pub use crate::{
    activity::ActivityLog,
    command::CommandTray,
    config::NodeConfig,
    dashboard::{Dashboard, DashboardCadence, DashboardUpdate},
    entropy::{Entropy, EntropySet, ScriptedEntropy, SeededEntropy},
    log::{LogHead, LogReader},
    notifications::{Notification, NotificationCenter},
    presence::{ModeControl, PresenceMonitor},
    scheduler::{AmbientLoop, AmbientScheduler},
    timer::TimerHandle,
    typewriter::{RevealCadence, TypewriterHandle},
};

use crate::{
    advancer::Cyclic, dashboard::spawn_dashboard, log::message_log, scheduler::WhisperPeriods,
    typewriter::spawn_typewriter,
};

/// Applies a mode change everywhere it matters: the ambient tick stream, the
/// typewriter cadence and the event stream.
#[derive(Clone)]
struct ModeSwitch {
    ambient: Arc<AmbientLoop>,
    mode: Arc<watch::Sender<Mode>>,
    events: broadcast::Sender<NodeEvent>,
}

#[async_trait]
impl ModeControl for ModeSwitch {
    fn current(&self) -> Mode {
        *self.mode.borrow()
    }

    async fn apply(&self, mode: Mode) -> bool {
        if self.current() == mode {
            return false;
        }
        if !self.ambient.switch_mode(mode).await {
            return false;
        }
        self.mode.send_replace(mode);
        info!(mode = mode.label(), "node: mode changed");
        let _ = self.events.send(NodeEvent::ModeChanged { mode });
        true
    }
}

/// The running node: every timer it owns is cancelled by `shutdown` or when
/// the runtime is dropped. After `shutdown` no operation starts a new one.
pub struct NodeRuntime {
    events: broadcast::Sender<NodeEvent>,
    log: LogReader,
    modes: ModeSwitch,
    typewriter: Mutex<Option<TypewriterHandle>>,
    notifications: NotificationCenter,
    dashboard: Arc<Mutex<Dashboard>>,
    dashboard_clock: Mutex<Option<TimerHandle>>,
    activity: ActivityLog,
    tray: CommandTray,
    presence: Mutex<Option<PresenceMonitor>>,
    closed: AtomicBool,
}

impl NodeRuntime {
    pub async fn start(config: NodeConfig) -> Result<Self, ConfigError> {
        Self::start_with_entropy(config, EntropySet::from_os()).await
    }

    pub async fn start_with_entropy(
        config: NodeConfig,
        entropy: EntropySet,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalog = Arc::new(config.catalog()?);
        let (events, _) = broadcast::channel(1024);

        let (writer, log) = message_log();
        let notifications = NotificationCenter::new(config.notification_ttl(), events.clone())?;
        let scheduler = AmbientScheduler::new(
            Arc::clone(&catalog),
            config.initial_mode,
            config.notification_probability,
            entropy.scheduler,
        )?;
        let ambient = AmbientLoop::new(
            scheduler,
            writer,
            notifications.clone(),
            WhisperPeriods {
                assistant: config.whisper_period(Mode::Assistant),
                autonomous: config.whisper_period(Mode::Autonomous),
            },
            events.clone(),
        )?;
        let cadence = config.dashboard_cadence();
        let dashboard = Dashboard::new(
            &config.realms,
            cadence,
            catalog.log.clone(),
            entropy.dashboard,
        )?;
        let activity = ActivityLog::new(events.clone());
        let tray = CommandTray::new(config.command_ack_delay(), activity.clone(), events.clone())?;

        let (mode_tx, mode_rx) = watch::channel(config.initial_mode);
        let modes = ModeSwitch {
            ambient: Arc::new(ambient),
            mode: Arc::new(mode_tx),
            events: events.clone(),
        };

        let typewriter = spawn_typewriter(
            log.clone(),
            mode_rx,
            RevealCadence {
                assistant: config.reveal_period(Mode::Assistant),
                autonomous: config.reveal_period(Mode::Autonomous),
            },
            events.clone(),
        );
        modes.ambient.start().await;
        let dashboard = Arc::new(Mutex::new(dashboard));
        let dashboard_clock = spawn_dashboard(
            Arc::clone(&dashboard),
            cadence.base_tick(),
            activity.clone(),
            events.clone(),
        );
        let presence = config
            .idle_timeout()
            .map(|timeout| PresenceMonitor::spawn(timeout, Arc::new(modes.clone())));

        info!(
            mode = config.initial_mode.label(),
            realms = config.realms.len(),
            "node: runtime started"
        );

        Ok(Self {
            events,
            log,
            modes,
            typewriter: Mutex::new(Some(typewriter)),
            notifications,
            dashboard,
            dashboard_clock: Mutex::new(Some(dashboard_clock)),
            activity,
            tray,
            presence: Mutex::new(presence),
            closed: AtomicBool::new(false),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<NodeEvent> {
        self.events.subscribe()
    }

    pub fn log(&self) -> LogReader {
        self.log.clone()
    }

    /// Text revealed so far for the whisper currently being typed.
    pub async fn revealed(&self) -> String {
        match self.typewriter.lock().await.as_ref() {
            Some(typewriter) => typewriter.revealed().await,
            None => String::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.modes.current()
    }

    /// An explicit choice also ends any idle handover, so away detection
    /// starts counting again from now.
    pub async fn switch_mode(&self, mode: Mode) -> bool {
        let switched = self.modes.apply(mode).await;
        if let Some(presence) = self.presence.lock().await.as_ref() {
            presence.reset();
        }
        switched
    }

    /// Returns the mode in effect afterwards.
    pub async fn toggle_mode(&self) -> Mode {
        self.switch_mode(self.mode().successor()).await;
        self.mode()
    }

    /// Stops producing whispers. A later mode change starts them again.
    pub async fn stop_ambient(&self) -> bool {
        self.modes.ambient.stop().await
    }

    /// `None` once the runtime is shut down.
    pub async fn notify(
        &self,
        text: impl Into<String>,
        category: NotificationCategory,
    ) -> Option<NotificationId> {
        if self.is_closed() {
            return None;
        }
        Some(self.notifications.create(text, category).await)
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.notifications.active().await
    }

    pub async fn dismiss(&self, id: NotificationId) -> bool {
        self.notifications.dismiss(id).await
    }

    pub async fn invoke(&self, command: &str) -> bool {
        if self.is_closed() {
            return false;
        }
        self.touch().await;
        self.tray.invoke(command).await
    }

    pub async fn trigger(&self, action: Action) {
        if self.is_closed() {
            return;
        }
        self.touch().await;
        self.tray.trigger(action).await;
    }

    pub async fn close_tray(&self) {
        self.tray.close().await;
    }

    pub async fn command_output(&self) -> Vec<String> {
        self.tray.output().await
    }

    pub async fn activity(&self) -> Vec<LogEntry> {
        self.activity.entries().await
    }

    pub async fn hud(&self) -> HudSnapshot {
        self.dashboard.lock().await.hud()
    }

    pub async fn realms(&self) -> Vec<RealmStatus> {
        self.dashboard.lock().await.realms()
    }

    /// Records user activity for away detection.
    pub async fn touch(&self) {
        if let Some(presence) = self.presence.lock().await.as_ref() {
            presence.touch();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Cancels every timer the node owns. Safe to call more than once.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(presence) = self.presence.lock().await.take() {
            presence.stop().await;
        }
        self.modes.ambient.close().await;
        if let Some(typewriter) = self.typewriter.lock().await.take() {
            typewriter.stop().await;
        }
        if let Some(clock) = self.dashboard_clock.lock().await.take() {
            clock.cancel().await;
        }
        self.tray.cancel_pending().await;
        let cleared = self.notifications.clear().await;
        info!(notifications = cleared, "node: runtime shut down");
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
