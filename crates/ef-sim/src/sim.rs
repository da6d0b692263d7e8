//! Simulation runner and result recording.

use ef_core::relative_drift;
use ef_results::{Diagnostics, ResultSeries, Sample};
use tracing::{debug, warn};

use crate::error::{SimError, SimResult};
use crate::integrator::{BogackiShampine32, DormandPrince54, Integrator};
use crate::sir::{SirModel, SirState};
use crate::spec::ModelSpec;
use crate::stepper::{StepControl, Trajectory, integrate};

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// Dormand-Prince 5(4) (default, 6 rhs calls per step, 4th-order dense output).
    #[default]
    DormandPrince54,
    /// Bogacki-Shampine 3(2) (3 rhs calls per step, Hermite dense output).
    BogackiShampine32,
}

impl IntegratorType {
    pub fn name(self) -> &'static str {
        match self {
            IntegratorType::DormandPrince54 => DormandPrince54.name(),
            IntegratorType::BogackiShampine32 => BogackiShampine32.name(),
        }
    }
}

/// Solver options that are not part of the model itself.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Integrator type (default: Dormand-Prince 5(4))
    pub integrator: IntegratorType,
    /// First trial step; estimated from the problem when `None`
    pub initial_step: Option<f64>,
    /// Upper bound on the internal step
    pub max_step: Option<f64>,
    /// Safety factor applied to the optimal step estimate
    pub safety: f64,
    /// Smallest allowed step shrink factor
    pub min_factor: f64,
    /// Largest allowed step growth factor
    pub max_factor: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            integrator: IntegratorType::default(),
            initial_step: None,
            max_step: None,
            safety: 0.9,
            min_factor: 0.2,
            max_factor: 10.0,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if let Some(h) = self.initial_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(SimError::InvalidOptions {
                    what: "initial_step must be positive and finite",
                });
            }
        }
        if let Some(h) = self.max_step {
            if !(h.is_finite() && h > 0.0) {
                return Err(SimError::InvalidOptions {
                    what: "max_step must be positive and finite",
                });
            }
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(SimError::InvalidOptions {
                what: "safety must be in (0, 1]",
            });
        }
        if !(self.min_factor > 0.0 && self.min_factor < 1.0) {
            return Err(SimError::InvalidOptions {
                what: "min_factor must be in (0, 1)",
            });
        }
        if !(self.max_factor > 1.0 && self.max_factor.is_finite()) {
            return Err(SimError::InvalidOptions {
                what: "max_factor must be finite and greater than 1",
            });
        }
        Ok(())
    }

    fn step_control(&self, spec: &ModelSpec) -> StepControl {
        StepControl {
            tol: spec.tolerances(),
            max_steps: spec.max_steps,
            initial_step: self.initial_step,
            max_step: self.max_step,
            safety: self.safety,
            min_factor: self.min_factor,
            max_factor: self.max_factor,
            lower_bound: Some(-spec.abs_tol),
        }
    }
}

/// Progress snapshot, emitted after every accepted step.
#[derive(Clone, Debug)]
pub struct SimProgress {
    pub t: f64,
    pub t_start: f64,
    pub t_end: f64,
    pub fraction_complete: f64,
    /// Attempted steps so far
    pub step: usize,
    pub rejected: usize,
}

/// Run one SIR simulation with default solver options.
pub fn run(spec: &ModelSpec) -> SimResult<ResultSeries> {
    run_with_options(spec, &SimOptions::default())
}

pub fn run_with_options(spec: &ModelSpec, opts: &SimOptions) -> SimResult<ResultSeries> {
    run_with_progress(spec, opts, None)
}

/// Validate `spec`, integrate it and package the samples.
///
/// Any failure is returned as-is; no partial series is produced.
pub fn run_with_progress(
    spec: &ModelSpec,
    opts: &SimOptions,
    progress: Option<&mut dyn FnMut(&SimProgress)>,
) -> SimResult<ResultSeries> {
    spec.validate()?;
    opts.validate()?;

    let mut model = SirModel::from_spec(spec);
    let control = opts.step_control(spec);
    let times = spec.output_times();

    debug!(
        integrator = opts.integrator.name(),
        beta = spec.beta,
        gamma = spec.gamma,
        t_start = spec.t_start,
        t_end = spec.t_end,
        samples = times.len(),
        "starting SIR run"
    );

    let trajectory = match opts.integrator {
        IntegratorType::DormandPrince54 => integrate(
            &mut model,
            &DormandPrince54,
            &control,
            spec.t_start,
            spec.t_end,
            &times,
            progress,
        )?,
        IntegratorType::BogackiShampine32 => integrate(
            &mut model,
            &BogackiShampine32,
            &control,
            spec.t_start,
            spec.t_end,
            &times,
            progress,
        )?,
    };

    build_series(spec, trajectory)
}

fn build_series(spec: &ModelSpec, trajectory: Trajectory<SirState>) -> SimResult<ResultSeries> {
    let n0 = spec.total_population();
    let mut max_drift = 0.0_f64;
    let mut min_component = f64::INFINITY;

    let samples: Vec<Sample> = trajectory
        .samples
        .iter()
        .map(|(t, x)| {
            let sample = Sample::new(*t, x.s(), x.i(), x.r());
            max_drift = max_drift.max(relative_drift(sample.total(), n0, spec.abs_tol));
            min_component = min_component.min(sample.min_component());
            sample
        })
        .collect();

    let stats = trajectory.stats;
    let conservation_ok = max_drift <= spec.rel_tol;
    if !conservation_ok {
        warn!(
            max_drift,
            rel_tol = spec.rel_tol,
            "total population drifted beyond rel_tol"
        );
    }

    debug!(
        steps = stats.steps,
        accepted = stats.accepted,
        rejected = stats.rejected,
        rhs_evaluations = stats.rhs_evaluations,
        max_drift,
        "SIR run complete"
    );

    let diagnostics = Diagnostics {
        steps: stats.steps,
        accepted_steps: stats.accepted,
        rejected_steps: stats.rejected,
        rhs_evaluations: stats.rhs_evaluations,
        initial_population: n0,
        max_population_drift: max_drift,
        conservation_ok,
        min_component,
    };

    Ok(ResultSeries::new(samples, diagnostics)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.integrator, IntegratorType::DormandPrince54);
        assert_eq!(opts.safety, 0.9);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn sim_options_invalid() {
        let opts = SimOptions {
            max_step: Some(0.0),
            ..SimOptions::default()
        };
        assert!(matches!(
            run_with_options(&ModelSpec::default(), &opts),
            Err(SimError::InvalidOptions { .. })
        ));

        let opts = SimOptions {
            max_factor: 1.0,
            ..SimOptions::default()
        };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn invalid_spec_detected_before_stepping() {
        let spec = ModelSpec {
            s0: -1.0,
            ..ModelSpec::default()
        };
        let mut calls = 0;
        let mut cb = |_: &SimProgress| calls += 1;
        let err = run_with_progress(&spec, &SimOptions::default(), Some(&mut cb)).unwrap_err();
        assert!(matches!(err, SimError::InvalidSpec { field: "s0", .. }));
        assert_eq!(calls, 0);
    }

    #[test]
    fn diagnostics_are_populated() {
        let spec = ModelSpec {
            t_end: 10.0,
            ..ModelSpec::default()
        };
        let series = run(&spec).unwrap();
        let d = series.diagnostics();
        assert_eq!(d.steps, d.accepted_steps + d.rejected_steps);
        assert!(d.accepted_steps > 0);
        assert_eq!(d.initial_population, spec.total_population());
        assert!(d.conservation_ok);
        assert_eq!(d.min_component, 0.0);
    }

    #[test]
    fn drift_beyond_rel_tol_is_reported_not_raised() {
        // rel_tol below f64 resolution of N: round-off alone exceeds it
        let spec = ModelSpec {
            abs_tol: 1e-20,
            rel_tol: 1e-20,
            t_end: 5.0,
            ..ModelSpec::default()
        };
        let series = run(&spec).unwrap();
        let d = series.diagnostics();
        assert!(!d.conservation_ok);
        assert!(d.max_population_drift > spec.rel_tol);
        assert!(d.max_population_drift < 1e-10);
        assert_eq!(series.len(), 51);
    }

    #[test]
    fn zero_population_runs_flat() {
        let spec = ModelSpec {
            s0: 0.0,
            i0: 0.0,
            r0: 0.0,
            t_end: 1.0,
            ..ModelSpec::default()
        };
        let series = run(&spec).unwrap();
        assert_eq!(series.len(), 11);
        assert!(series.iter().all(|s| s.total() == 0.0));
    }

    #[test]
    fn integrator_names() {
        assert_eq!(IntegratorType::DormandPrince54.name(), "dopri54");
        assert_eq!(IntegratorType::BogackiShampine32.name(), "bs32");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_spec() -> impl Strategy<Value = ModelSpec> {
        (
            (0.0_f64..1e5, 0.0_f64..1e3, 0.0_f64..1e3),
            (0.0_f64..8.0, 0.01_f64..1.0),
            (1.0_f64..60.0, 0.1_f64..2.0),
            (-8.0_f64..-3.0, -10.0_f64..-5.0),
        )
            .prop_map(|((s0, i0, r0), (r_nought, gamma), (t_end, dt_out), (abs_exp, rel_exp))| {
                let n = s0 + i0 + r0;
                let beta = if n > 0.0 { r_nought * gamma / n } else { 0.0 };
                ModelSpec {
                    s0,
                    i0,
                    r0,
                    beta,
                    gamma,
                    t_start: 0.0,
                    t_end,
                    abs_tol: 10f64.powf(abs_exp),
                    rel_tol: 10f64.powf(rel_exp),
                    dt_out,
                    ..ModelSpec::default()
                }
            })
    }

    fn arb_integrator() -> impl Strategy<Value = IntegratorType> {
        prop_oneof![
            Just(IntegratorType::DormandPrince54),
            Just(IntegratorType::BogackiShampine32),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn population_conserved_and_non_negative(spec in arb_spec(), integrator in arb_integrator()) {
            let opts = SimOptions { integrator, ..SimOptions::default() };
            let series = run_with_options(&spec, &opts).unwrap();
            let n0 = spec.total_population();

            prop_assert_eq!(series.len(), spec.output_times().len());
            for s in &series {
                let drift = relative_drift(s.total(), n0, spec.abs_tol);
                prop_assert!(drift <= spec.rel_tol, "t={} drift={}", s.t, drift);
                prop_assert!(s.min_component() >= -spec.abs_tol, "t={} sample={:?}", s.t, s);
            }
            prop_assert!(series.diagnostics().conservation_ok);
        }
    }
}
