use thiserror::Error;

/// Rejected configuration, reported before any timer is started.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("message pool '{pool}' must contain at least one entry")]
    EmptyPool { pool: String },
    #[error("{field} must be a positive duration")]
    NonPositivePeriod { field: &'static str },
    #[error("notification ttl must be a positive duration")]
    NonPositiveTtl,
    #[error("notification probability {value} is outside [0, 1]")]
    ProbabilityOutOfRange { value: f64 },
    #[error("realm names must not be blank")]
    EmptyRealmName,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}'")]
pub struct UnknownAction(pub String);
