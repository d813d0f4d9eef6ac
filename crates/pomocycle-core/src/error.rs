//! Core error types for pomocycle-core.
//!
//! Errors are split by concern: configuration validation, tick scheduling,
//! and the engine-level [`CoreError`] that wraps both.

use thiserror::Error;

use crate::timer::Phase;

/// Core error type for pomocycle-core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    /// Consecutive zero-length phases kept expiring without end.
    #[error(
        "Degenerate configuration: {transitions} consecutive phases expired immediately, timer stopped"
    )]
    DegenerateConfiguration { transitions: usize },

    /// The periodic tick source could not be scheduled.
    #[error("Tick source error: {0}")]
    TickSource(#[from] TickError),

    /// The async timer runtime is no longer accepting commands.
    #[error("Timer runtime has shut down")]
    RuntimeClosed,
}

/// Configuration validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A phase duration was negative.
    #[error("duration for {phase} must not be negative (got {value} ms)")]
    NegativeDuration { phase: Phase, value: i64 },

    /// The long-break cadence was zero or negative.
    #[error("long_break_every must be at least 1 (got {0})")]
    ZeroCadence(i64),
}

/// Tick scheduling errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TickError {
    /// No async runtime is available to drive the interval.
    #[error("no tokio runtime available to schedule ticks")]
    NoRuntime,

    /// The tick interval is zero.
    #[error("tick interval must be greater than zero")]
    ZeroInterval,

    /// The scheduler refused the registration.
    #[error("failed to schedule ticks: {0}")]
    Rejected(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_core_error() {
        let err: CoreError = ConfigError::ZeroCadence(0).into();
        assert!(matches!(err, CoreError::InvalidConfiguration(_)));
        assert_eq!(
            err.to_string(),
            "Invalid configuration: long_break_every must be at least 1 (got 0)"
        );
    }

    #[test]
    fn negative_duration_names_the_phase() {
        let err = ConfigError::NegativeDuration {
            phase: Phase::ShortBreak,
            value: -5,
        };
        assert_eq!(
            err.to_string(),
            "duration for SHORT_BREAK must not be negative (got -5 ms)"
        );
    }
}
