use std::sync::Arc;

use shared::{domain::Mode, error::ConfigError};

use crate::entropy::Entropy;

pub const ASSISTANT_WHISPERS: &[&str] = &[
    "Awaiting your command, Architect.",
    "Ready to assist.",
    "Scanning system flows.",
    "Neural pathways online.",
    "Connection established.",
];

pub const AUTONOMOUS_WHISPERS: &[&str] = &[
    "System autonomy engaged.",
    "Observing environment...",
    "Analyzing anomalies.",
    "Initiating self-optimization.",
    "Guardians protocol active.",
];

pub const TOAST_MESSAGES: &[&str] = &[
    "Flow patched successfully.",
    "Error: Connection interrupted.",
    "Information: New update available.",
    "Success: Task completed.",
    "Warning: Temporal distortion detected!",
    "Info: System diagnostics initiated...",
];

pub const LOG_MESSAGES: &[&str] = &[
    "Scanning flows...",
    "Weak point detected.",
    "Patching initiated...",
    "Realm Sync: Online.",
    "Guardians are watching.",
    "Flow integrity confirmed.",
    "Neural link stabilized.",
    "Quantum entanglement calibrated.",
    "A temporal anomaly detected.",
    "System optimization in progress...",
];

/// Immutable, non-empty list of canned messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePool {
    name: String,
    entries: Arc<[String]>,
}

impl MessagePool {
    pub fn new<I, S>(name: impl Into<String>, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        if entries.is_empty() {
            return Err(ConfigError::EmptyPool { pool: name });
        }
        Ok(Self {
            name,
            entries: entries.into(),
        })
    }

    pub fn pick(&self, entropy: &mut dyn Entropy) -> &str {
        let index = entropy.index(self.entries.len());
        &self.entries[index]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|entry| entry == text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCatalog {
    pub assistant: MessagePool,
    pub autonomous: MessagePool,
    pub toasts: MessagePool,
    pub log: MessagePool,
}

impl MessageCatalog {
    pub fn builtin() -> Self {
        Self {
            assistant: builtin_pool("assistant", ASSISTANT_WHISPERS),
            autonomous: builtin_pool("autonomous", AUTONOMOUS_WHISPERS),
            toasts: builtin_pool("toasts", TOAST_MESSAGES),
            log: builtin_pool("log", LOG_MESSAGES),
        }
    }

    pub fn whispers(&self, mode: Mode) -> &MessagePool {
        match mode {
            Mode::Assistant => &self.assistant,
            Mode::Autonomous => &self.autonomous,
        }
    }
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_pool(name: &str, entries: &[&str]) -> MessagePool {
    MessagePool {
        name: name.to_string(),
        entries: entries.iter().map(|entry| entry.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::ScriptedEntropy;

    #[test]
    fn empty_pool_is_rejected_at_construction() {
        let err = MessagePool::new("whispers", Vec::<String>::new()).expect_err("empty");
        assert_eq!(
            err,
            ConfigError::EmptyPool {
                pool: "whispers".into()
            }
        );
    }

    #[test]
    fn pick_follows_the_entropy_draw() {
        let pool = MessagePool::new("test", ["A", "BB"]).expect("pool");
        let mut entropy = ScriptedEntropy::new([0.0, 0.5, 0.49]);
        assert_eq!(pool.pick(&mut entropy), "A");
        assert_eq!(pool.pick(&mut entropy), "BB");
        assert_eq!(pool.pick(&mut entropy), "A");
    }

    #[test]
    fn catalog_selects_whispers_by_mode() {
        let catalog = MessageCatalog::builtin();
        assert_eq!(catalog.whispers(Mode::Assistant).name(), "assistant");
        assert_eq!(catalog.whispers(Mode::Autonomous).name(), "autonomous");
        assert!(catalog.toasts.contains("Success: Task completed."));
    }
}
