//! Error types for configuration and settings loading
//!
//! Runtime transitions never fail; they log and return `false`. Only
//! construction-time problems are reported as errors.

use thiserror::Error;

/// Invalid tuning values rejected when the state machine is built
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_level must be at least 1")]
    MaxLevelZero,

    #[error("rounds_per_level must be at least 1")]
    RoundsPerLevelZero,

    #[error("failure_limit must be at least 1")]
    FailureLimitZero,

    #[error("{name} range is inverted ({min} > {max})")]
    InvertedRange { name: &'static str, min: f32, max: f32 },

    #[error("{name} must be finite and non-negative (got {value})")]
    InvalidValue { name: &'static str, value: f32 },

    #[error("accuracy thresholds must be descending (perfect >= great >= good)")]
    AccuracyThresholdOrder,

    #[error("reflex thresholds must be ascending (high <= medium <= low)")]
    ReflexThresholdOrder,
}

/// Failure to read or parse a settings document
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    Invalid(#[from] ConfigError),
}
