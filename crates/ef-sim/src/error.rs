//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while configuring or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid model spec ({field}): {reason}")]
    InvalidSpec { field: &'static str, reason: String },

    #[error("Invalid solver options: {what}")]
    InvalidOptions { what: &'static str },

    #[error("Step limit exceeded: {steps} of max_steps={max_steps} used, stopped at t={t}")]
    StepLimitExceeded { max_steps: usize, t: f64, steps: usize },

    #[error("Non-finite {component} on step {step} (last valid t={t})")]
    NonFiniteState {
        t: f64,
        step: usize,
        component: &'static str,
    },

    #[error("Step size underflow at t={t} (h={h})")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("Results error: {0}")]
    Results(#[from] ef_results::ResultsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl From<ef_core::EfError> for SimError {
    fn from(e: ef_core::EfError) -> Self {
        SimError::InvalidSpec {
            field: e.what(),
            reason: e.to_string(),
        }
    }
}

impl SimError {
    /// Last valid simulation time, for errors raised while stepping.
    pub fn last_time(&self) -> Option<f64> {
        match self {
            SimError::StepLimitExceeded { t, .. }
            | SimError::NonFiniteState { t, .. }
            | SimError::StepSizeUnderflow { t, .. } => Some(*t),
            _ => None,
        }
    }
}
