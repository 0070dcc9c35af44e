//! HUD gauges and realm states, all driven from one clock.
//!
//! Every indicator used to poll on its own timer. Here a single base tick
//! (the gcd of the configured refresh periods) fans out to per-indicator
//! rules, so cancelling the dashboard is one handle.

use std::{sync::Arc, time::Duration};

use shared::{
    domain::{Integrity, LogLevel, RealmState, SignalBand},
    error::ConfigError,
    protocol::{HudSnapshot, LogEntry, NodeEvent, RealmStatus},
};
use tokio::{
    sync::{broadcast, Mutex},
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::{
    activity::ActivityLog,
    advancer::{integrity_from_draw, jitter, Cyclic, FlowLoops},
    config::RealmConfig,
    entropy::Entropy,
    pool::MessagePool,
    timer::TimerHandle,
};

const POWER_SPAN: f64 = 10.0;
const STABILITY_SPAN: f64 = 5.0;
const CONNECTION_SPAN: f64 = 20.0;
const ENERGY_SPAN: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HudState {
    pub power: f64,
    pub stability: f64,
    pub flow_loops: FlowLoops,
    pub integrity: Integrity,
    pub connection_strength: f64,
    pub energy: f64,
}

impl Default for HudState {
    fn default() -> Self {
        Self {
            power: 75.0,
            stability: 92.0,
            flow_loops: FlowLoops::new(7),
            integrity: Integrity::Green,
            connection_strength: 75.0,
            energy: 85.0,
        }
    }
}

impl HudState {
    pub fn snapshot(&self) -> HudSnapshot {
        HudSnapshot {
            power: self.power,
            stability: self.stability,
            flow_loops: self.flow_loops.value(),
            integrity: self.integrity,
            connection_strength: self.connection_strength,
            signal: SignalBand::from_strength(self.connection_strength),
            energy: self.energy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Realm {
    pub name: String,
    pub state: RealmState,
    pub anchor: bool,
}

impl Realm {
    fn status(&self) -> RealmStatus {
        RealmStatus {
            name: self.name.clone(),
            state: self.state,
            anchor: self.anchor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCadence {
    pub hud: Duration,
    pub realms: Duration,
    pub energy: Duration,
}

impl DashboardCadence {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, period) in [
            ("hud_refresh_ms", self.hud),
            ("realm_cycle_ms", self.realms),
            ("energy_refresh_ms", self.energy),
        ] {
            if period.as_millis() == 0 {
                return Err(ConfigError::NonPositivePeriod { field });
            }
        }
        Ok(())
    }

    pub fn base_tick(&self) -> Duration {
        let base = [self.realms, self.energy]
            .iter()
            .fold(millis(self.hud), |acc, period| gcd(acc, millis(*period)));
        Duration::from_millis(base.max(1))
    }

    fn fires(&self, period: Duration, tick: u64) -> bool {
        let every = (millis(period) / millis(self.base_tick())).max(1);
        tick % every == 0
    }
}

fn millis(period: Duration) -> u64 {
    period.as_millis() as u64
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// What changed on one clock tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardUpdate {
    pub hud: Option<HudSnapshot>,
    pub realms: Option<Vec<RealmStatus>>,
    pub alert: Option<LogEntry>,
}

pub struct Dashboard {
    hud: HudState,
    realms: Vec<Realm>,
    cadence: DashboardCadence,
    log_pool: MessagePool,
    entropy: Box<dyn Entropy>,
    ticks: u64,
}

impl Dashboard {
    pub fn new(
        realms: &[RealmConfig],
        cadence: DashboardCadence,
        log_pool: MessagePool,
        entropy: Box<dyn Entropy>,
    ) -> Result<Self, ConfigError> {
        cadence.validate()?;
        if realms.iter().any(|realm| realm.name.trim().is_empty()) {
            return Err(ConfigError::EmptyRealmName);
        }
        Ok(Self {
            hud: HudState::default(),
            realms: realms
                .iter()
                .map(|realm| Realm {
                    name: realm.name.clone(),
                    state: realm.state,
                    anchor: realm.anchor,
                })
                .collect(),
            cadence,
            log_pool,
            entropy,
            ticks: 0,
        })
    }

    pub fn cadence(&self) -> DashboardCadence {
        self.cadence
    }

    pub fn hud(&self) -> HudSnapshot {
        self.hud.snapshot()
    }

    pub fn realms(&self) -> Vec<RealmStatus> {
        self.realms.iter().map(Realm::status).collect()
    }

    /// Advances the clock by one base tick and applies every rule that is due.
    pub fn tick(&mut self) -> DashboardUpdate {
        self.ticks += 1;
        let mut update = DashboardUpdate::default();
        let mut hud_changed = false;

        if self.cadence.fires(self.cadence.hud, self.ticks) {
            update.alert = self.refresh_gauges();
            hud_changed = true;
        }
        if self.cadence.fires(self.cadence.energy, self.ticks) {
            self.hud.energy = jitter(self.hud.energy, self.entropy.unit(), ENERGY_SPAN);
            hud_changed = true;
        }
        if self.cadence.fires(self.cadence.realms, self.ticks) {
            for realm in &mut self.realms {
                realm.state = realm.state.successor();
            }
            update.realms = Some(self.realms());
        }
        if hud_changed {
            update.hud = Some(self.hud.snapshot());
        }

        update
    }

    fn refresh_gauges(&mut self) -> Option<LogEntry> {
        let previous = self.hud.integrity;
        self.hud.power = jitter(self.hud.power, self.entropy.unit(), POWER_SPAN);
        self.hud.stability = jitter(self.hud.stability, self.entropy.unit(), STABILITY_SPAN);
        self.hud.flow_loops = self.hud.flow_loops.successor();
        self.hud.integrity = integrity_from_draw(self.entropy.unit());
        self.hud.connection_strength = jitter(
            self.hud.connection_strength,
            self.entropy.unit(),
            CONNECTION_SPAN,
        );

        // Only a move to a more severe state gets a log line.
        if self.hud.integrity <= previous {
            return None;
        }
        let (level, label) = match self.hud.integrity {
            Integrity::Green => return None,
            Integrity::Yellow => (LogLevel::Warning, "YELLOW"),
            Integrity::Red => (LogLevel::Error, "RED"),
        };
        let line = self.log_pool.pick(self.entropy.as_mut());
        Some(LogEntry::new(
            level,
            format!("[NODE]: Integrity {label} - {line}"),
        ))
    }
}

pub fn spawn_dashboard(
    dashboard: Arc<Mutex<Dashboard>>,
    base_tick: Duration,
    activity: ActivityLog,
    events: broadcast::Sender<NodeEvent>,
) -> TimerHandle {
    TimerHandle::spawn(async move {
        let mut ticker = interval_at(Instant::now() + base_tick, base_tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let update = dashboard.lock().await.tick();
            if let Some(hud) = update.hud {
                debug!(power = hud.power, integrity = ?hud.integrity, "dashboard: hud refreshed");
                let _ = events.send(NodeEvent::HudUpdated { hud });
            }
            if let Some(realms) = update.realms {
                let _ = events.send(NodeEvent::RealmsUpdated { realms });
            }
            if let Some(alert) = update.alert {
                activity.record(alert.level, alert.message).await;
            }
        }
    })
}

#[cfg(test)]
#[path = "tests/dashboard_tests.rs"]
mod tests;
