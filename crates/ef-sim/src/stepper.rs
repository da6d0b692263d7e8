//! Adaptive step-size driver.
//!
//! Advances a [`TransientModel`] with an embedded pair from `t_start` to
//! `t_end`, accepting or rejecting each trial step on a weighted RMS error
//! norm, and samples the trajectory at the requested output times.
//!
//! A step that passes the error test can still be rejected when its end point
//! or any sample it produces falls below [`StepControl::lower_bound`].

use ef_core::Tolerances;
use tracing::trace;

use crate::dense::interpolate;
use crate::error::{SimError, SimResult};
use crate::integrator::Integrator;
use crate::model::TransientModel;
use crate::sim::SimProgress;

/// Step-size controller settings.
#[derive(Clone, Debug)]
pub struct StepControl {
    pub tol: Tolerances,
    /// Budget of attempted steps (accepted + rejected).
    pub max_steps: usize,
    /// Fixed first trial step; estimated when `None`.
    pub initial_step: Option<f64>,
    /// Upper bound on any internal step.
    pub max_step: Option<f64>,
    pub safety: f64,
    pub min_factor: f64,
    pub max_factor: f64,
    /// Every component of an accepted state or sample stays at or above this.
    pub lower_bound: Option<f64>,
}

/// Step shrink after a bound violation.
const BOUND_SHRINK: f64 = 0.5;

/// Counters reported after a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepStats {
    pub steps: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub rhs_evaluations: usize,
}

/// States at the requested output times.
#[derive(Clone, Debug)]
pub struct Trajectory<S> {
    pub samples: Vec<(f64, S)>,
    pub stats: StepStats,
}

/// sqrt(mean((e_i / (abs + rel * max(|x_i|, |x_new_i|)))^2))
pub fn error_norm(error: &[f64], x: &[f64], x_new: &[f64], tol: Tolerances) -> f64 {
    if error.is_empty() {
        return 0.0;
    }
    let sum: f64 = error
        .iter()
        .zip(x.iter().zip(x_new))
        .map(|(e, (a, b))| {
            let r = e / tol.weight(a.abs().max(b.abs()));
            r * r
        })
        .sum();
    (sum / error.len() as f64).sqrt()
}

fn rms_scaled(v: &[f64], x: &[f64], tol: Tolerances) -> f64 {
    error_norm(v, x, x, tol)
}

fn below_bound(state: &[f64], bound: Option<f64>) -> bool {
    match bound {
        Some(b) => state.iter().any(|v| *v < b),
        None => false,
    }
}

fn check_finite<M: TransientModel>(
    model: &M,
    state: &M::State,
    t: f64,
    step: usize,
) -> SimResult<()> {
    match state.as_ref().iter().position(|v| !v.is_finite()) {
        Some(index) => Err(SimError::NonFiniteState {
            t,
            step,
            component: model.component_name(index),
        }),
        None => Ok(()),
    }
}

/// Starting step from the local scale of the solution and its first two
/// derivatives (Hairer, Nørsett & Wanner, Solving ODEs I, II.4).
#[allow(clippy::too_many_arguments)]
fn initial_step<M: TransientModel, I: Integrator>(
    model: &mut M,
    integrator: &I,
    t0: f64,
    x0: &M::State,
    f0: &M::State,
    span: f64,
    tol: Tolerances,
    stats: &mut StepStats,
) -> SimResult<f64> {
    let d0 = rms_scaled(x0.as_ref(), x0.as_ref(), tol);
    let d1 = rms_scaled(f0.as_ref(), x0.as_ref(), tol);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6
    } else {
        0.01 * d0 / d1
    }
    .min(span);

    let x1 = model.add(x0, &model.scale(f0, h0));
    let f1 = model.rhs(t0 + h0, &x1)?;
    stats.rhs_evaluations += 1;
    check_finite(model, &f1, t0, 0)?;

    let df = model.add(&f1, &model.scale(f0, -1.0));
    let d2 = rms_scaled(df.as_ref(), x0.as_ref(), tol) / h0;

    let dmax = d1.max(d2);
    let h1 = if dmax <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / dmax).powf(1.0 / integrator.order() as f64)
    };

    Ok((100.0 * h0).min(h1).min(span))
}

/// Integrate from `t_start` to `t_end`, returning the state at every entry of
/// `output_times`.
///
/// `output_times` must be ascending, start at `t_start` and end at `t_end`.
/// Fails without a partial result when the step budget runs out, a value
/// becomes non-finite, or the step size collapses.
pub fn integrate<M: TransientModel, I: Integrator>(
    model: &mut M,
    integrator: &I,
    control: &StepControl,
    t_start: f64,
    t_end: f64,
    output_times: &[f64],
    mut progress: Option<&mut dyn FnMut(&SimProgress)>,
) -> SimResult<Trajectory<M::State>> {
    let span = t_end - t_start;
    let tol = control.tol;
    let exponent = 1.0 / integrator.order() as f64;
    let h_max = control.max_step.unwrap_or(span).min(span);

    let mut stats = StepStats::default();
    let mut samples = Vec::with_capacity(output_times.len());

    let mut t = t_start;
    let mut x = model.initial_state();
    check_finite(model, &x, t, 0)?;
    let mut dxdt = model.rhs(t, &x)?;
    stats.rhs_evaluations += 1;
    check_finite(model, &dxdt, t, 0)?;

    let mut next_out = 0;
    while next_out < output_times.len() && output_times[next_out] <= t_start {
        samples.push((output_times[next_out], x.clone()));
        next_out += 1;
    }

    let mut h = match control.initial_step {
        Some(h0) => h0,
        None => initial_step(model, integrator, t, &x, &dxdt, span, tol, &mut stats)?,
    }
    .min(h_max);
    let mut last_rejected = false;

    while t < t_end {
        if stats.steps >= control.max_steps {
            return Err(SimError::StepLimitExceeded {
                max_steps: control.max_steps,
                t,
                steps: stats.steps,
            });
        }

        let h_min = 16.0 * f64::EPSILON * t.abs().max(span);
        if h < h_min {
            return Err(SimError::StepSizeUnderflow { t, h });
        }

        let remaining = t_end - t;
        let lands_on_end = h >= remaining;
        if lands_on_end {
            h = remaining;
        }

        stats.steps += 1;
        let out = integrator.step(model, t, &x, &dxdt, h)?;
        stats.rhs_evaluations += integrator.rhs_per_step();
        check_finite(model, &out.x_new, t, stats.steps)?;
        check_finite(model, &out.dxdt_new, t, stats.steps)?;
        check_finite(model, &out.error, t, stats.steps)?;

        let err = error_norm(out.error.as_ref(), x.as_ref(), out.x_new.as_ref(), tol);

        if err <= 1.0 {
            let t_new = if lands_on_end { t_end } else { t + h };

            let mut pending = Vec::new();
            let mut k = next_out;
            while k < output_times.len() && output_times[k] <= t_new {
                let t_out = output_times[k];
                let x_out = if t_out == t_new {
                    out.x_new.clone()
                } else {
                    interpolate(
                        model,
                        t,
                        &x,
                        &dxdt,
                        t_new,
                        &out.x_new,
                        &out.dxdt_new,
                        out.dense.as_ref(),
                        t_out,
                    )
                };
                pending.push((t_out, x_out));
                k += 1;
            }

            if below_bound(out.x_new.as_ref(), control.lower_bound)
                || pending
                    .iter()
                    .any(|(_, x_out)| below_bound(x_out.as_ref(), control.lower_bound))
            {
                stats.rejected += 1;
                trace!(t, h, "step rejected: state below lower bound");
                last_rejected = true;
                h *= BOUND_SHRINK;
                continue;
            }

            samples.extend(pending);
            next_out = k;

            t = t_new;
            x = out.x_new;
            dxdt = out.dxdt_new;
            stats.accepted += 1;

            if let Some(cb) = progress.as_mut() {
                cb(&SimProgress {
                    t,
                    t_start,
                    t_end,
                    fraction_complete: (t - t_start) / span,
                    step: stats.steps,
                    rejected: stats.rejected,
                });
            }

            let mut factor = if err == 0.0 {
                control.max_factor
            } else {
                (control.safety * err.powf(-exponent)).clamp(control.min_factor, control.max_factor)
            };
            if last_rejected {
                factor = factor.min(1.0);
            }
            last_rejected = false;
            h = (h * factor).min(h_max);
        } else {
            stats.rejected += 1;
            trace!(t, h, err, "step rejected");
            let factor = (control.safety * err.powf(-exponent)).max(control.min_factor);
            last_rejected = true;
            h *= factor;
        }
    }

    Ok(Trajectory { samples, stats })
}
