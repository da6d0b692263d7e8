//! Independent runs in parallel.

use ef_results::ResultSeries;
use rayon::prelude::*;

use crate::error::SimResult;
use crate::sim::{SimOptions, run_with_options};
use crate::spec::ModelSpec;

/// Run every spec on the rayon pool. Each run owns its model and step state;
/// results come back in input order.
pub fn run_sweep(specs: &[ModelSpec], opts: &SimOptions) -> Vec<SimResult<ResultSeries>> {
    specs
        .par_iter()
        .map(|spec| run_with_options(spec, opts))
        .collect()
}

/// Copies of `base` with `beta` replaced by each value.
pub fn beta_sweep(base: &ModelSpec, betas: &[f64]) -> Vec<ModelSpec> {
    betas
        .iter()
        .map(|&beta| ModelSpec {
            beta,
            ..base.clone()
        })
        .collect()
}
