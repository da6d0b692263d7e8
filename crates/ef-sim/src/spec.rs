//! Model description: parameters, initial state, horizon and tolerances.

use std::path::Path;

use ef_core::{Tolerances, ensure_finite, ensure_non_negative, ensure_positive};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Upper bound on the number of output samples one run may request.
pub const MAX_SAMPLES: usize = 10_000_000;

/// Immutable description of one SIR run.
///
/// Every field has a default, so a YAML file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelSpec {
    /// Initial susceptible count
    pub s0: f64,
    /// Initial infected count
    pub i0: f64,
    /// Initial recovered count
    pub r0: f64,
    /// Transmission rate (per contact pair per unit time)
    pub beta: f64,
    /// Recovery rate (per unit time)
    pub gamma: f64,
    pub t_start: f64,
    pub t_end: f64,
    /// Budget of attempted internal steps
    pub max_steps: usize,
    pub abs_tol: f64,
    pub rel_tol: f64,
    /// Spacing of output samples
    pub dt_out: f64,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            s0: 1_000_000.0,
            i0: 100.0,
            r0: 0.0,
            beta: 1e-6,
            gamma: 0.1,
            t_start: 0.0,
            t_end: 100.0,
            max_steps: 50_000,
            abs_tol: 1e-6,
            rel_tol: 1e-8,
            dt_out: 0.1,
        }
    }
}

impl ModelSpec {
    /// Reject anything that cannot describe a closed SIR population.
    pub fn validate(&self) -> SimResult<()> {
        ensure_non_negative(self.s0, "s0")?;
        ensure_non_negative(self.i0, "i0")?;
        ensure_non_negative(self.r0, "r0")?;
        ensure_non_negative(self.beta, "beta")?;
        ensure_non_negative(self.gamma, "gamma")?;
        ensure_finite(self.t_start, "t_start")?;
        ensure_finite(self.t_end, "t_end")?;
        if self.t_start >= self.t_end {
            return Err(SimError::InvalidSpec {
                field: "t_end",
                reason: format!(
                    "t_start ({}) must be less than t_end ({})",
                    self.t_start, self.t_end
                ),
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidSpec {
                field: "max_steps",
                reason: "max_steps must be positive".to_string(),
            });
        }
        ensure_positive(self.abs_tol, "abs_tol")?;
        ensure_positive(self.rel_tol, "rel_tol")?;
        ensure_positive(self.dt_out, "dt_out")?;
        if !self.horizon().is_finite() {
            return Err(SimError::InvalidSpec {
                field: "t_end",
                reason: "time horizon overflows".to_string(),
            });
        }
        let intervals = self.horizon() / self.dt_out;
        if !intervals.is_finite() || intervals >= MAX_SAMPLES as f64 {
            return Err(SimError::InvalidSpec {
                field: "dt_out",
                reason: format!(
                    "dt_out ({}) yields at least {MAX_SAMPLES} samples over the horizon",
                    self.dt_out
                ),
            });
        }
        if !(self.s0 + self.i0 + self.r0).is_finite() {
            return Err(SimError::InvalidSpec {
                field: "s0",
                reason: "total population overflows".to_string(),
            });
        }
        Ok(())
    }

    /// `S0 + I0 + R0`.
    pub fn total_population(&self) -> f64 {
        self.s0 + self.i0 + self.r0
    }

    pub fn horizon(&self) -> f64 {
        self.t_end - self.t_start
    }

    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            abs: self.abs_tol,
            rel: self.rel_tol,
        }
    }

    /// Basic reproduction number `beta * N / gamma` (infinite when `gamma == 0`).
    pub fn basic_reproduction_number(&self) -> f64 {
        if self.gamma == 0.0 {
            return f64::INFINITY;
        }
        self.beta * self.total_population() / self.gamma
    }

    /// Sample times: `t_start + k * dt_out` strictly before `t_end`, then
    /// `t_end` itself.
    ///
    /// Call only on a validated spec.
    pub fn output_times(&self) -> Vec<f64> {
        let guard = 1e-9 * self.dt_out;
        let intervals = (self.horizon() / self.dt_out) as usize;
        let mut times = Vec::with_capacity(intervals.min(MAX_SAMPLES).saturating_add(2));
        let mut k = 0usize;
        loop {
            let t = self.t_start + k as f64 * self.dt_out;
            if t >= self.t_end - guard {
                break;
            }
            times.push(t);
            k += 1;
        }
        times.push(self.t_end);
        times
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(content: &str) -> SimResult<Self> {
        let spec: ModelSpec = serde_yaml::from_str(content)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn load_yaml(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
