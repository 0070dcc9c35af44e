use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use node_core::NodeConfig;
use tracing::warn;

const DEFAULT_CONFIG_FILE: &str = "node.toml";

/// Loads the node config: built-in defaults, then `node.toml` (or the file
/// given on the command line), then `NODE__*` environment overrides.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<NodeConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file '{}'", path.display()))?;
            parse(&raw).with_context(|| format!("in config file '{}'", path.display()))?
        }
        None => match read_optional(Path::new(DEFAULT_CONFIG_FILE))? {
            Some(raw) => parse(&raw).with_context(|| format!("in '{DEFAULT_CONFIG_FILE}'"))?,
            None => NodeConfig::default(),
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate().context("invalid node config")?;
    Ok(config)
}

/// A missing file is `None`; any other read failure is an error.
fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error)
            .with_context(|| format!("failed to read config file '{}'", path.display())),
    }
}

fn parse(raw: &str) -> anyhow::Result<NodeConfig> {
    toml::from_str(raw).context("failed to parse node config")
}

pub fn apply_env_overrides(config: &mut NodeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("NODE__INITIAL_MODE") {
        match v.parse() {
            Ok(mode) => config.initial_mode = mode,
            Err(error) => warn!(%error, "ignoring NODE__INITIAL_MODE"),
        }
    }

    let periods: [(&str, &mut u64); 9] = [
        (
            "NODE__ASSISTANT_WHISPER_PERIOD_MS",
            &mut config.assistant_whisper_period_ms,
        ),
        (
            "NODE__AUTONOMOUS_WHISPER_PERIOD_MS",
            &mut config.autonomous_whisper_period_ms,
        ),
        (
            "NODE__ASSISTANT_REVEAL_PERIOD_MS",
            &mut config.assistant_reveal_period_ms,
        ),
        (
            "NODE__AUTONOMOUS_REVEAL_PERIOD_MS",
            &mut config.autonomous_reveal_period_ms,
        ),
        ("NODE__NOTIFICATION_TTL_MS", &mut config.notification_ttl_ms),
        ("NODE__COMMAND_ACK_DELAY_MS", &mut config.command_ack_delay_ms),
        ("NODE__HUD_REFRESH_MS", &mut config.hud_refresh_ms),
        ("NODE__REALM_CYCLE_MS", &mut config.realm_cycle_ms),
        ("NODE__ENERGY_REFRESH_MS", &mut config.energy_refresh_ms),
    ];
    for (key, slot) in periods {
        if let Some(v) = lookup(key) {
            match v.trim().parse::<u64>() {
                Ok(parsed) => *slot = parsed,
                Err(error) => warn!(key, %error, "ignoring non-numeric override"),
            }
        }
    }

    if let Some(v) = lookup("NODE__NOTIFICATION_PROBABILITY") {
        match v.trim().parse::<f64>() {
            Ok(parsed) => config.notification_probability = parsed,
            Err(error) => warn!(%error, "ignoring NODE__NOTIFICATION_PROBABILITY"),
        }
    }

    if let Some(v) = lookup("NODE__IDLE_TIMEOUT_MS") {
        let v = v.trim();
        if v.eq_ignore_ascii_case("off") {
            config.idle_timeout_ms = None;
        } else {
            match v.parse::<u64>() {
                Ok(parsed) => config.idle_timeout_ms = Some(parsed),
                Err(error) => warn!(%error, "ignoring NODE__IDLE_TIMEOUT_MS"),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
