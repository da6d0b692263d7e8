//! The SIR compartment model.

use crate::error::SimResult;
use crate::model::TransientModel;
use crate::spec::ModelSpec;

const COMPONENT_NAMES: [&str; 3] = ["S", "I", "R"];

/// Compartment sizes `(S, I, R)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SirState(pub [f64; 3]);

impl SirState {
    pub fn new(s: f64, i: f64, r: f64) -> Self {
        Self([s, i, r])
    }

    pub fn s(&self) -> f64 {
        self.0[0]
    }

    pub fn i(&self) -> f64 {
        self.0[1]
    }

    pub fn r(&self) -> f64 {
        self.0[2]
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl AsRef<[f64]> for SirState {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

/// Closed-population SIR dynamics with constant rates:
///
/// ```text
/// dS/dt = -beta * S * I
/// dI/dt =  beta * S * I - gamma * I
/// dR/dt =  gamma * I
/// ```
#[derive(Clone, Debug)]
pub struct SirModel {
    pub beta: f64,
    pub gamma: f64,
    pub initial: SirState,
}

impl SirModel {
    pub fn from_spec(spec: &ModelSpec) -> Self {
        Self {
            beta: spec.beta,
            gamma: spec.gamma,
            initial: SirState::new(spec.s0, spec.i0, spec.r0),
        }
    }

    /// Derivative without the trait's `&mut` receiver.
    pub fn derivative(&self, x: &SirState) -> SirState {
        let infection = self.beta * x.s() * x.i();
        let recovery = self.gamma * x.i();
        SirState::new(-infection, infection - recovery, recovery)
    }
}

impl TransientModel for SirModel {
    type State = SirState;

    fn initial_state(&self) -> Self::State {
        self.initial
    }

    fn rhs(&mut self, _t: f64, x: &Self::State) -> SimResult<Self::State> {
        Ok(self.derivative(x))
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        SirState([a.0[0] + b.0[0], a.0[1] + b.0[1], a.0[2] + b.0[2]])
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        SirState([a.0[0] * scale, a.0[1] * scale, a.0[2] * scale])
    }

    fn component_name(&self, index: usize) -> &'static str {
        COMPONENT_NAMES.get(index).copied().unwrap_or("state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivative_sums_to_zero() {
        let model = SirModel::from_spec(&ModelSpec::default());
        let d = model.derivative(&model.initial);
        assert!((d.s() + 100.0).abs() < 1e-9);
        assert!((d.i() - 90.0).abs() < 1e-12);
        assert!((d.r() - 10.0).abs() < 1e-12);
        assert!(d.total().abs() < 1e-12);
    }

    #[test]
    fn no_infected_means_equilibrium() {
        let model = SirModel {
            beta: 0.5,
            gamma: 0.2,
            initial: SirState::new(10.0, 0.0, 5.0),
        };
        assert_eq!(model.derivative(&model.initial), SirState::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn component_names() {
        let model = SirModel::from_spec(&ModelSpec::default());
        assert_eq!(model.component_name(1), "I");
        assert_eq!(model.component_name(7), "state");
    }
}
