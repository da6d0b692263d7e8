//! SIR epidemic simulation with an in-process adaptive integrator.
//!
//! Provides:
//! - `ModelSpec`: parameters, initial state, horizon, tolerances (YAML loadable)
//! - `SirModel` on top of the generic `TransientModel` trait
//! - Embedded Runge-Kutta pairs (Dormand-Prince 5(4), Bogacki-Shampine 3(2))
//! - Adaptive step control with dense output at fixed sample times
//! - `run` entry points and a parallel parameter sweep

pub mod error;
pub mod integrator;
pub mod model;
pub mod sim;
pub mod sir;
pub mod spec;
pub mod stepper;
pub mod sweep;

// Internal modules
mod dense;

// Re-exports for public API
pub use ef_results::{Diagnostics, ResultSeries, Sample};
pub use error::{SimError, SimResult};
pub use integrator::{BogackiShampine32, DormandPrince54, Integrator, StepOutput};
pub use model::TransientModel;
pub use sim::{IntegratorType, SimOptions, SimProgress, run, run_with_options, run_with_progress};
pub use sir::{SirModel, SirState};
pub use spec::{MAX_SAMPLES, ModelSpec};
pub use stepper::{StepControl, StepStats, Trajectory, error_norm, integrate};
pub use sweep::{beta_sweep, run_sweep};
