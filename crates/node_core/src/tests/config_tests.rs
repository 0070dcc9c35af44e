use super::*;

#[test]
fn defaults_match_the_dashboard_cadence() {
    let config = NodeConfig::default();
    assert_eq!(config.whisper_period(Mode::Assistant), Duration::from_secs(5));
    assert_eq!(config.whisper_period(Mode::Autonomous), Duration::from_secs(3));
    assert_eq!(config.reveal_period(Mode::Assistant), Duration::from_millis(40));
    assert_eq!(config.reveal_period(Mode::Autonomous), Duration::from_millis(80));
    assert_eq!(config.notification_ttl(), Duration::from_secs(5));
    assert_eq!(config.command_ack_delay(), Duration::from_secs(1));
    assert_eq!(config.realms.len(), 6);
    assert!(config.validate().is_ok());
}

#[test]
fn zero_period_is_rejected_with_field_name() {
    let config = NodeConfig {
        autonomous_reveal_period_ms: 0,
        ..NodeConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::NonPositivePeriod {
            field: "autonomous_reveal_period_ms"
        })
    );
}

#[test]
fn zero_ttl_and_bad_probability_are_rejected() {
    let config = NodeConfig {
        notification_ttl_ms: 0,
        ..NodeConfig::default()
    };
    assert_eq!(config.validate(), Err(ConfigError::NonPositiveTtl));

    let config = NodeConfig {
        notification_probability: 1.5,
        ..NodeConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::ProbabilityOutOfRange { value: 1.5 })
    );
}

#[test]
fn empty_pool_override_fails_validation() {
    let config = NodeConfig {
        pools: PoolConfig {
            toasts: Some(Vec::new()),
            ..PoolConfig::default()
        },
        ..NodeConfig::default()
    };
    assert_eq!(
        config.validate(),
        Err(ConfigError::EmptyPool {
            pool: "toasts".into()
        })
    );
}

#[test]
fn disabled_idle_timeout_is_valid() {
    let config = NodeConfig {
        idle_timeout_ms: None,
        ..NodeConfig::default()
    };
    assert!(config.validate().is_ok());
    assert_eq!(config.idle_timeout(), None);
}

#[test]
fn parses_partial_toml_on_top_of_defaults() {
    let config = NodeConfig::from_toml_str(
        r#"
initial_mode = "autonomous"
assistant_whisper_period_ms = 1000

[pools]
assistant = ["A", "BB"]

[[realms]]
name = "Eden.EXE"
state = "anchored"
anchor = true
"#,
    )
    .expect("parse");

    assert_eq!(config.initial_mode, Mode::Autonomous);
    assert_eq!(config.whisper_period(Mode::Assistant), Duration::from_secs(1));
    assert_eq!(config.autonomous_whisper_period_ms, 3_000);
    assert_eq!(
        config.catalog().expect("catalog").assistant.entries(),
        &["A".to_string(), "BB".to_string()]
    );
    assert_eq!(config.realms.len(), 1);
}

#[test]
fn toml_with_empty_pool_is_an_error() {
    let err = NodeConfig::from_toml_str("[pools]\nlog = []\n").expect_err("empty log pool");
    assert!(format!("{err:#}").contains("must contain at least one entry"));
}
