//! Dense output between accepted steps.

use crate::model::TransientModel;

/// Cubic Hermite interpolant through (t0, x0, f0) and (t1, x1, f1), evaluated
/// at `t` in [t0, t1], plus `theta^2 (1 - theta)^2 * correction` when the pair
/// supplies one.
///
/// Evaluated in nested form around `x0`, so a component that did not move
/// over the step comes back bit-for-bit unchanged. Being a linear combination
/// of states and derivatives, it preserves any linear invariant the model has
/// (for SIR, the total population).
#[allow(clippy::too_many_arguments)]
pub(crate) fn interpolate<M: TransientModel>(
    model: &M,
    t0: f64,
    x0: &M::State,
    f0: &M::State,
    t1: f64,
    x1: &M::State,
    f1: &M::State,
    correction: Option<&M::State>,
    t: f64,
) -> M::State {
    let h = t1 - t0;
    let th = (t - t0) / h;
    let th1 = 1.0 - th;

    let diff = model.add(x1, &model.scale(x0, -1.0));
    let slope0 = model.add(&model.scale(f0, h), &model.scale(&diff, -1.0));
    let slope1 = model.add(
        &model.add(&diff, &model.scale(f1, -h)),
        &model.scale(&slope0, -1.0),
    );

    let inner = match correction {
        Some(c) => model.add(&slope1, &model.scale(c, th1)),
        None => slope1,
    };
    let inner = model.add(&slope0, &model.scale(&inner, th));
    let inner = model.add(&diff, &model.scale(&inner, th1));
    model.add(x0, &model.scale(&inner, th))
}
