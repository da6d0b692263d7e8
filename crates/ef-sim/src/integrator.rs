//! Embedded Runge-Kutta pairs.
//!
//! Each pair advances the state by one trial step and returns an estimate of
//! the local error alongside the candidate. Both pairs here have the FSAL
//! property: the derivative at the end of an accepted step is the first stage
//! of the next one.

use crate::error::SimResult;
use crate::model::TransientModel;

/// Result of one trial step.
#[derive(Clone, Debug)]
pub struct StepOutput<S> {
    /// Candidate state at t + dt (higher-order solution).
    pub x_new: S,
    /// Difference between the two embedded solutions.
    pub error: S,
    /// Derivative at (t + dt, x_new).
    pub dxdt_new: S,
    /// Fourth-order correction added to the cubic Hermite interpolant, for
    /// pairs that carry their own continuous extension.
    pub dense: Option<S>,
}

/// Trait for adaptive time integrators.
pub trait Integrator {
    fn name(&self) -> &'static str;

    /// Order of the propagated solution; the step controller uses
    /// `err^(-1/order)`.
    fn order(&self) -> u32;

    /// Right-hand side evaluations per trial step, the reused first stage not
    /// counted.
    fn rhs_per_step(&self) -> usize;

    /// Advance from (t, x) by dt. `dxdt` is f(t, x), carried over from the
    /// previous accepted step.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dxdt: &M::State,
        dt: f64,
    ) -> SimResult<StepOutput<M::State>>;
}

/// x + dt * sum(coef_i * k_i), skipping zero coefficients.
fn combine<M: TransientModel>(
    model: &M,
    x: &M::State,
    dt: f64,
    terms: &[(f64, &M::State)],
) -> M::State {
    let mut acc = x.clone();
    for &(coef, k) in terms {
        if coef != 0.0 {
            acc = model.add(&acc, &model.scale(k, coef * dt));
        }
    }
    acc
}

/// dt * sum(coef_i * k_i).
fn weighted_sum<M: TransientModel>(
    model: &M,
    dt: f64,
    terms: &[(f64, &M::State)],
) -> M::State {
    let (first_coef, first) = terms[0];
    let acc = model.scale(first, first_coef * dt);
    combine(model, &acc, dt, &terms[1..])
}

/// Dormand-Prince 5(4), seven stages, FSAL.
#[derive(Clone, Debug, Default)]
pub struct DormandPrince54;

impl DormandPrince54 {
    const C2: f64 = 1.0 / 5.0;
    const C3: f64 = 3.0 / 10.0;
    const C4: f64 = 4.0 / 5.0;
    const C5: f64 = 8.0 / 9.0;

    const A21: f64 = 1.0 / 5.0;
    const A31: f64 = 3.0 / 40.0;
    const A32: f64 = 9.0 / 40.0;
    const A41: f64 = 44.0 / 45.0;
    const A42: f64 = -56.0 / 15.0;
    const A43: f64 = 32.0 / 9.0;
    const A51: f64 = 19372.0 / 6561.0;
    const A52: f64 = -25360.0 / 2187.0;
    const A53: f64 = 64448.0 / 6561.0;
    const A54: f64 = -212.0 / 729.0;
    const A61: f64 = 9017.0 / 3168.0;
    const A62: f64 = -355.0 / 33.0;
    const A63: f64 = 46732.0 / 5247.0;
    const A64: f64 = 49.0 / 176.0;
    const A65: f64 = -5103.0 / 18656.0;

    // 5th-order weights (also row 7 of the tableau)
    const B1: f64 = 35.0 / 384.0;
    const B3: f64 = 500.0 / 1113.0;
    const B4: f64 = 125.0 / 192.0;
    const B5: f64 = -2187.0 / 6784.0;
    const B6: f64 = 11.0 / 84.0;

    // b - b_hat
    const E1: f64 = 71.0 / 57600.0;
    const E3: f64 = -71.0 / 16695.0;
    const E4: f64 = 71.0 / 1920.0;
    const E5: f64 = -17253.0 / 339200.0;
    const E6: f64 = 22.0 / 525.0;
    const E7: f64 = -1.0 / 40.0;

    // continuous extension (Hairer & Wanner, DOPRI5 dense output)
    const D1: f64 = -12715105075.0 / 11282082432.0;
    const D3: f64 = 87487479700.0 / 32700410799.0;
    const D4: f64 = -10690763975.0 / 1880347072.0;
    const D5: f64 = 701980252875.0 / 199316789632.0;
    const D6: f64 = -1453857185.0 / 822651844.0;
    const D7: f64 = 69997945.0 / 29380423.0;
}

impl Integrator for DormandPrince54 {
    fn name(&self) -> &'static str {
        "dopri54"
    }

    fn order(&self) -> u32 {
        5
    }

    fn rhs_per_step(&self) -> usize {
        6
    }

    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dxdt: &M::State,
        dt: f64,
    ) -> SimResult<StepOutput<M::State>> {
        let k1 = dxdt;

        let x2 = combine(model, x, dt, &[(Self::A21, k1)]);
        let k2 = model.rhs(t + Self::C2 * dt, &x2)?;

        let x3 = combine(model, x, dt, &[(Self::A31, k1), (Self::A32, &k2)]);
        let k3 = model.rhs(t + Self::C3 * dt, &x3)?;

        let x4 = combine(
            model,
            x,
            dt,
            &[(Self::A41, k1), (Self::A42, &k2), (Self::A43, &k3)],
        );
        let k4 = model.rhs(t + Self::C4 * dt, &x4)?;

        let x5 = combine(
            model,
            x,
            dt,
            &[
                (Self::A51, k1),
                (Self::A52, &k2),
                (Self::A53, &k3),
                (Self::A54, &k4),
            ],
        );
        let k5 = model.rhs(t + Self::C5 * dt, &x5)?;

        let x6 = combine(
            model,
            x,
            dt,
            &[
                (Self::A61, k1),
                (Self::A62, &k2),
                (Self::A63, &k3),
                (Self::A64, &k4),
                (Self::A65, &k5),
            ],
        );
        let k6 = model.rhs(t + dt, &x6)?;

        let x_new = combine(
            model,
            x,
            dt,
            &[
                (Self::B1, k1),
                (Self::B3, &k3),
                (Self::B4, &k4),
                (Self::B5, &k5),
                (Self::B6, &k6),
            ],
        );
        let k7 = model.rhs(t + dt, &x_new)?;

        let error = weighted_sum(
            model,
            dt,
            &[
                (Self::E1, k1),
                (Self::E3, &k3),
                (Self::E4, &k4),
                (Self::E5, &k5),
                (Self::E6, &k6),
                (Self::E7, &k7),
            ],
        );

        let dense = weighted_sum(
            model,
            dt,
            &[
                (Self::D1, k1),
                (Self::D3, &k3),
                (Self::D4, &k4),
                (Self::D5, &k5),
                (Self::D6, &k6),
                (Self::D7, &k7),
            ],
        );

        Ok(StepOutput {
            x_new,
            error,
            dxdt_new: k7,
            dense: Some(dense),
        })
    }
}

/// Bogacki-Shampine 3(2), four stages, FSAL.
///
/// Cheaper per step than Dormand-Prince; suited to loose tolerances.
#[derive(Clone, Debug, Default)]
pub struct BogackiShampine32;

impl BogackiShampine32 {
    const C2: f64 = 1.0 / 2.0;
    const C3: f64 = 3.0 / 4.0;

    const A21: f64 = 1.0 / 2.0;
    const A32: f64 = 3.0 / 4.0;
    const B1: f64 = 2.0 / 9.0;
    const B2: f64 = 1.0 / 3.0;
    const B3: f64 = 4.0 / 9.0;

    const E1: f64 = 2.0 / 9.0 - 7.0 / 24.0;
    const E2: f64 = 1.0 / 3.0 - 1.0 / 4.0;
    const E3: f64 = 4.0 / 9.0 - 1.0 / 3.0;
    const E4: f64 = -1.0 / 8.0;
}

impl Integrator for BogackiShampine32 {
    fn name(&self) -> &'static str {
        "bs32"
    }

    fn order(&self) -> u32 {
        3
    }

    fn rhs_per_step(&self) -> usize {
        3
    }

    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dxdt: &M::State,
        dt: f64,
    ) -> SimResult<StepOutput<M::State>> {
        let k1 = dxdt;

        let x2 = combine(model, x, dt, &[(Self::A21, k1)]);
        let k2 = model.rhs(t + Self::C2 * dt, &x2)?;

        let x3 = combine(model, x, dt, &[(Self::A32, &k2)]);
        let k3 = model.rhs(t + Self::C3 * dt, &x3)?;

        let x_new = combine(
            model,
            x,
            dt,
            &[(Self::B1, k1), (Self::B2, &k2), (Self::B3, &k3)],
        );
        let k4 = model.rhs(t + dt, &x_new)?;

        let error = weighted_sum(
            model,
            dt,
            &[(Self::E1, k1), (Self::E2, &k2), (Self::E3, &k3), (Self::E4, &k4)],
        );

        Ok(StepOutput {
            x_new,
            error,
            dxdt_new: k4,
            dense: None,
        })
    }
}
