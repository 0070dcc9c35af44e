use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use shared::{
    domain::{Mode, RealmState},
    error::ConfigError,
};

use crate::{
    dashboard::DashboardCadence,
    pool::{MessageCatalog, MessagePool},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub initial_mode: Mode,
    pub assistant_whisper_period_ms: u64,
    pub autonomous_whisper_period_ms: u64,
    pub assistant_reveal_period_ms: u64,
    pub autonomous_reveal_period_ms: u64,
    pub notification_ttl_ms: u64,
    pub notification_probability: f64,
    pub command_ack_delay_ms: u64,
    pub hud_refresh_ms: u64,
    pub realm_cycle_ms: u64,
    pub energy_refresh_ms: u64,
    /// Idle time before switching to autonomous mode; `None` disables it.
    pub idle_timeout_ms: Option<u64>,
    pub pools: PoolConfig,
    pub realms: Vec<RealmConfig>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            initial_mode: Mode::Assistant,
            assistant_whisper_period_ms: 5_000,
            autonomous_whisper_period_ms: 3_000,
            assistant_reveal_period_ms: 40,
            autonomous_reveal_period_ms: 80,
            notification_ttl_ms: 5_000,
            notification_probability: 0.3,
            command_ack_delay_ms: 1_000,
            hud_refresh_ms: 2_000,
            realm_cycle_ms: 3_000,
            energy_refresh_ms: 1_500,
            idle_timeout_ms: Some(10_000),
            pools: PoolConfig::default(),
            realms: default_realms(),
        }
    }
}

/// Replacement message lists; absent lists keep the built-in pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub assistant: Option<Vec<String>>,
    pub autonomous: Option<Vec<String>>,
    pub toasts: Option<Vec<String>>,
    pub log: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RealmConfig {
    pub name: String,
    pub state: RealmState,
    #[serde(default)]
    pub anchor: bool,
}

impl RealmConfig {
    fn new(name: &str, state: RealmState, anchor: bool) -> Self {
        Self {
            name: name.to_string(),
            state,
            anchor,
        }
    }
}

fn default_realms() -> Vec<RealmConfig> {
    vec![
        RealmConfig::new("GhostMansion", RealmState::Synced, false),
        RealmConfig::new("The Hollow", RealmState::Unsynced, false),
        RealmConfig::new("Eden.EXE", RealmState::Anchored, true),
        RealmConfig::new("Quantum Nexus", RealmState::Unsynced, false),
        RealmConfig::new("Aetherium", RealmState::Synced, false),
        RealmConfig::new("Starlight Citadel", RealmState::Unsynced, false),
    ]
}

impl NodeConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw).context("failed to parse node config")?;
        config.validate().context("invalid node config")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("assistant_whisper_period_ms", self.assistant_whisper_period_ms),
            ("autonomous_whisper_period_ms", self.autonomous_whisper_period_ms),
            ("assistant_reveal_period_ms", self.assistant_reveal_period_ms),
            ("autonomous_reveal_period_ms", self.autonomous_reveal_period_ms),
            ("command_ack_delay_ms", self.command_ack_delay_ms),
            ("hud_refresh_ms", self.hud_refresh_ms),
            ("realm_cycle_ms", self.realm_cycle_ms),
            ("energy_refresh_ms", self.energy_refresh_ms),
            ("idle_timeout_ms", self.idle_timeout_ms.unwrap_or(1)),
        ];
        if let Some(&(field, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NonPositivePeriod { field });
        }
        if self.notification_ttl_ms == 0 {
            return Err(ConfigError::NonPositiveTtl);
        }
        if !(0.0..=1.0).contains(&self.notification_probability) {
            return Err(ConfigError::ProbabilityOutOfRange {
                value: self.notification_probability,
            });
        }
        if self.realms.iter().any(|realm| realm.name.trim().is_empty()) {
            return Err(ConfigError::EmptyRealmName);
        }
        self.catalog().map(|_| ())
    }

    pub fn catalog(&self) -> Result<MessageCatalog, ConfigError> {
        let builtin = MessageCatalog::builtin();
        Ok(MessageCatalog {
            assistant: override_pool(builtin.assistant, &self.pools.assistant)?,
            autonomous: override_pool(builtin.autonomous, &self.pools.autonomous)?,
            toasts: override_pool(builtin.toasts, &self.pools.toasts)?,
            log: override_pool(builtin.log, &self.pools.log)?,
        })
    }

    pub fn whisper_period(&self, mode: Mode) -> Duration {
        Duration::from_millis(match mode {
            Mode::Assistant => self.assistant_whisper_period_ms,
            Mode::Autonomous => self.autonomous_whisper_period_ms,
        })
    }

    pub fn reveal_period(&self, mode: Mode) -> Duration {
        Duration::from_millis(match mode {
            Mode::Assistant => self.assistant_reveal_period_ms,
            Mode::Autonomous => self.autonomous_reveal_period_ms,
        })
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn command_ack_delay(&self) -> Duration {
        Duration::from_millis(self.command_ack_delay_ms)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }

    pub fn dashboard_cadence(&self) -> DashboardCadence {
        DashboardCadence {
            hud: Duration::from_millis(self.hud_refresh_ms),
            realms: Duration::from_millis(self.realm_cycle_ms),
            energy: Duration::from_millis(self.energy_refresh_ms),
        }
    }
}

fn override_pool(
    builtin: MessagePool,
    replacement: &Option<Vec<String>>,
) -> Result<MessagePool, ConfigError> {
    match replacement {
        Some(entries) => MessagePool::new(builtin.name(), entries.iter().cloned()),
        None => Ok(builtin),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
