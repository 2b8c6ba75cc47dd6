//! Error types for the ecosystem engine.

use thiserror::Error;

/// A parameter set that cannot describe a meaningful ecosystem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("{name} must be non-negative, got {value}")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must lie in [0, 1], got {value}")]
    NotAFraction { name: &'static str, value: f64 },

    /// Peak seasonal capacity per tree lower than the off-season base.
    #[error("peak carrying capacity per tree ({peak}) is below the base value ({base})")]
    CapacityBoundsInverted { base: f64, peak: f64 },

    /// The logistic curve would decline instead of grow.
    #[error("human carrying capacity ({capacity}) must exceed the initial population ({initial})")]
    HumanCapacityTooSmall { initial: f64, capacity: f64 },
}

/// Why the integrator gave up on a run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegratorFailure {
    #[error("state became non-finite")]
    NonFinite,

    #[error("step size {step:e} fell below the minimum {minimum:e}")]
    StepSizeUnderflow { step: f64, minimum: f64 },

    #[error("step budget of {0} attempts exhausted")]
    StepBudgetExhausted(usize),
}

/// Errors surfaced by a simulation or scenario comparison.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid parameters: {0}")]
    Parameters(#[from] ParameterError),

    #[error("invalid settings: {0}")]
    Settings(String),

    #[error("invalid initial state: {0}")]
    InitialState(String),

    /// Fatal; the partial trajectory is discarded.
    #[error("integrator failed at t = {time}: {reason}")]
    Integrator { time: f64, reason: IntegratorFailure },

    #[error("trajectories cannot be compared: {0}")]
    Mismatch(String),
}

impl SimulationError {
    pub(crate) fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    pub(crate) fn initial_state(msg: impl Into<String>) -> Self {
        Self::InitialState(msg.into())
    }
}
