use thiserror::Error;

/// Rejected run configuration. Raised before any integration step is taken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("step_size must be positive and finite, got {0}")]
    NonPositiveStepSize(f64),
    #[error("max_iterations must be at least 1")]
    ZeroIterationBudget,
    #[error("divergence_threshold must be positive, got {0}")]
    InvalidDivergenceThreshold(f64),
    #[error("initial_state must be finite, got {0:?}")]
    NonFiniteInitialState([f64; 3]),
    #[error("vector field must be three-dimensional, got dimension {0}")]
    DimensionMismatch(usize),
    #[error("unknown integration scheme '{0}' (expected 'rk4' or 'euler')")]
    UnknownScheme(String),
}
