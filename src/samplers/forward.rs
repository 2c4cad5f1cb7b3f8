//! Defines a simple forward sampler for Bayesian `Model`s
//!
//! Implementation of Koller & Friedman Algorithm 12.1 (pp 489)

use crate::cpd::Cpd;
use crate::dataset::Dataset;
use crate::model::BayesianNetwork;
use crate::util::Result;
use crate::variable::{Assignment, Variable};
use super::Sampler;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// A simple, stateless `Sampler` for Bayesian Models
pub struct ForwardSampler<'a> {

    /// The `BayesianNetwork` to sample
    model: &'a BayesianNetwork
}


impl<'a> ForwardSampler<'a> {

    pub fn new(model: &'a BayesianNetwork) -> Self {
        ForwardSampler { model }
    }

    /// Draw `n` records into a `Dataset` whose columns are the variables in topological order.
    /// The same `seed` always gives the same records.
    pub fn sample_dataset(&self, n: usize, seed: u64) -> Result<Dataset> {
        let mut rng = StdRng::seed_from_u64(seed);
        let variables: Vec<Variable> = self.model.distributions().values().map(|c| c.variable().clone()).collect();

        let rows: Vec<Vec<usize>> = (0..n).map(|_| {
            let a = self.sample(&mut rng);
            variables.iter().map(|v| a.get(v).cloned().unwrap_or(0)).collect()
        }).collect();

        debug!(records = n, seed, "sampled dataset");
        Dataset::new(variables, rows)
    }
}

/// Draw a state of the variable of `cpd`, its parents being set in `a`
fn sample_cpd<R: Rng + ?Sized>(cpd: &Cpd, a: &Assignment, rng: &mut R) -> usize {
    let parents: Vec<usize> = cpd.parents().iter().map(|p| a.get(p).cloned().unwrap_or(0)).collect();
    let row = cpd.row(&parents).unwrap_or_default();

    let u: f64 = rng.gen();
    let mut acc = 0.0;
    let mut last = 0;
    for (i, &p) in row.iter().enumerate() {
        if p > 0.0 {
            acc += p;
            last = i;
            if u < acc {
                return i;
            }
        }
    }

    // rounding left the cumulative sum just under one
    last
}

impl<'a> Sampler for ForwardSampler<'a> {

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Assignment {
        let mut a = Assignment::new();

        // we iterate in topological order, so the parents of each variable are already assigned
        for cpd in self.model.distributions().values() {
            let state = sample_cpd(cpd, &a, rng);
            a.set(cpd.variable(), state);
        }

        a
    }

}
