//! Result data types.

use serde::{Deserialize, Serialize};

use crate::{ResultsError, ResultsResult};

/// One row of the output table: compartment sizes at time `t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl Sample {
    pub fn new(t: f64, susceptible: f64, infected: f64, recovered: f64) -> Self {
        Self {
            t,
            susceptible,
            infected,
            recovered,
        }
    }

    /// Total population `S + I + R`.
    pub fn total(&self) -> f64 {
        self.susceptible + self.infected + self.recovered
    }

    /// Smallest of the three compartments.
    pub fn min_component(&self) -> f64 {
        self.susceptible.min(self.infected).min(self.recovered)
    }

    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.t, self.susceptible, self.infected, self.recovered)
    }
}

/// Solver statistics attached to every completed run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    /// Attempted internal steps (accepted + rejected).
    pub steps: usize,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub rhs_evaluations: usize,
    /// `S0 + I0 + R0`.
    pub initial_population: f64,
    /// Largest relative deviation of `S + I + R` from the initial population
    /// over all output samples.
    pub max_population_drift: f64,
    /// `max_population_drift <= rel_tol`.
    pub conservation_ok: bool,
    /// Smallest compartment value seen at any output sample.
    pub min_component: f64,
}

/// Ordered, time-indexed output of one integration run.
///
/// Sample times are strictly increasing. The series cannot be modified once
/// built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSeries {
    samples: Vec<Sample>,
    diagnostics: Diagnostics,
}

impl ResultSeries {
    /// Build a series, checking that it is non-empty and that sample times are
    /// finite and strictly increasing.
    pub fn new(samples: Vec<Sample>, diagnostics: Diagnostics) -> ResultsResult<Self> {
        if samples.is_empty() {
            return Err(ResultsError::EmptySeries);
        }
        for (index, sample) in samples.iter().enumerate() {
            if !sample.t.is_finite() {
                return Err(ResultsError::NonFiniteTime { index });
            }
            if index > 0 {
                let prev = samples[index - 1].t;
                if sample.t <= prev {
                    return Err(ResultsError::NonIncreasingTime {
                        index,
                        prev,
                        t: sample.t,
                    });
                }
            }
        }
        Ok(Self {
            samples,
            diagnostics,
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> &Sample {
        &self.samples[0]
    }

    pub fn last(&self) -> &Sample {
        &self.samples[self.samples.len() - 1]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.t).collect()
    }

    pub fn susceptible(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.susceptible).collect()
    }

    pub fn infected(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.infected).collect()
    }

    pub fn recovered(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.recovered).collect()
    }

    /// Total population at every sample.
    pub fn totals(&self) -> Vec<f64> {
        self.samples.iter().map(Sample::total).collect()
    }

    /// Sample with the largest infected count (earliest one on ties).
    pub fn peak_infected(&self) -> &Sample {
        let mut peak = &self.samples[0];
        for sample in &self.samples[1..] {
            if sample.infected > peak.infected {
                peak = sample;
            }
        }
        peak
    }

    /// `(t, S, I, R)` tuples, the shape plotting libraries take directly.
    pub fn to_tuples(&self) -> Vec<(f64, f64, f64, f64)> {
        self.samples.iter().map(Sample::as_tuple).collect()
    }
}

impl<'a> IntoIterator for &'a ResultSeries {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
