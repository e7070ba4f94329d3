//! Error types for Ballista.

use thiserror::Error;

/// Top-level error type for Ballista operations.
#[derive(Debug, Error)]
pub enum BallistaError {
    /// Invalid tuning or template values
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected configuration values.
///
/// Solver failure is not represented here: an unreachable target is an
/// expected outcome and is reported through the solver's result type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Minimum flight time must be strictly positive
    #[error("minimum flight time must be > 0, got {0}")]
    NonPositiveMinFlightTime(f32),

    /// Flight time bounds are inverted
    #[error("flight time range is inverted: min {min} > max {max}")]
    InvertedFlightTimeRange {
        /// Configured minimum
        min: f32,
        /// Configured maximum
        max: f32,
    },

    /// The solver needs at least one iteration
    #[error("solver needs at least one iteration")]
    ZeroIterations,

    /// Flight time step must be strictly positive
    #[error("time adjust step must be > 0, got {0}")]
    NonPositiveTimeStep(f32),

    /// Seed factor must not be negative
    #[error("time per distance unit must be >= 0, got {0}")]
    NegativeTimePerDistance(f32),

    /// A projectile template field is out of range
    #[error("invalid projectile template: {0}")]
    InvalidTemplate(String),
}

/// Result type alias for Ballista operations.
pub type BallistaResult<T> = Result<T, BallistaError>;
