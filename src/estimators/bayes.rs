//! Bayesian parameter estimation with Dirichlet priors.

use crate::cpd::Cpd;
use crate::dataset::Dataset;
use crate::util::Result;
use super::{local_columns, Estimator};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A Dirichlet prior over each row of a CPD, expressed as the pseudo-count added to every cell
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Prior {

    /// `equivalent_sample_size / (q * r)` per cell, spread evenly over the whole table
    BDeu { equivalent_sample_size: f64 },

    /// One per cell
    K2,

    /// The given constant per cell
    Dirichlet(f64)

}

impl Prior {

    /// The pseudo-count of one cell in a table with `q` parent configurations and `r` states
    pub fn pseudo_count(&self, q: usize, r: usize) -> f64 {
        match *self {
            Prior::BDeu { equivalent_sample_size } => equivalent_sample_size / ((q * r) as f64),
            Prior::K2 => 1.0,
            Prior::Dirichlet(alpha) => alpha
        }
    }

}

/// The posterior mean estimate of a single CPD:
///
/// ```text
///   theta x|u = (M[u, x] + a) / (M[u] + r * a)
/// ```
///
/// where `a` is the pseudo-count of the prior. With a positive prior every row is strictly
/// positive, including rows of parent configurations absent from the data.
pub struct LocalBayesianEstimator {

    variable: String,

    parents: Vec<String>,

    prior: Prior

}

impl LocalBayesianEstimator {

    pub fn new(variable: &str, parents: &[String], prior: Prior) -> Self {
        LocalBayesianEstimator { variable: String::from(variable), parents: parents.to_vec(), prior }
    }

}

impl Estimator<Cpd> for LocalBayesianEstimator {

    /// # Errors
    /// * `BnetError::IncompatibleStructure` if the variable or a parent has no column in `data`
    /// * `BnetError::InvalidDistribution` if the prior is negative
    /// * `BnetError::TableTooLarge` if the conditional table would be too large to allocate
    fn estimate(&self, data: &Dataset) -> Result<Cpd> {
        let (child, var, cols, parents) = local_columns(data, &self.variable, &self.parents)?;

        let counts = data.parent_counts(child, &cols)?;
        let (q, r) = counts.dim();
        let alpha = self.prior.pseudo_count(q, r);
        debug!(variable = %self.variable, pseudo_count = alpha, "bayesian estimate");

        let (cpd, _) = Cpd::from_counts(var, parents, counts + alpha)?;
        Ok(cpd)
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::variable::Variable;

    fn data() -> Dataset {
        // X = 0 six times with Y = 0 four times; X = 1 never occurs
        let mut rows = vec![vec![0, 0]; 4];
        rows.extend(vec![vec![0, 1]; 2]);
        Dataset::new(vec![Variable::binary("X"), Variable::binary("Y")], rows).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn pseudo_counts() {
        assert_eq!(0.5, Prior::BDeu { equivalent_sample_size: 2.0 }.pseudo_count(2, 2));
        assert_eq!(1.0, Prior::K2.pseudo_count(7, 3));
        assert_eq!(0.25, Prior::Dirichlet(0.25).pseudo_count(1, 2));
    }

    #[test]
    fn k2_smoothing() {
        let parents = vec![String::from("X")];
        let cpd = LocalBayesianEstimator::new("Y", &parents, Prior::K2).estimate(&data()).unwrap();

        // (4 + 1) / (6 + 2), and uniform where X = 1 was never seen
        let rows = cpd.rows();
        assert!(close(5.0 / 8.0, rows[0][0]));
        assert!(close(3.0 / 8.0, rows[0][1]));
        assert!(close(0.5, rows[1][0]));
    }

    #[test]
    fn bdeu_smoothing() {
        let prior = Prior::BDeu { equivalent_sample_size: 4.0 };
        let cpd = LocalBayesianEstimator::new("X", &[], prior).estimate(&data()).unwrap();

        // a = 4 / 2 = 2: (6 + 2) / 10 and (0 + 2) / 10
        assert!(close(0.8, cpd.rows()[0][0]));
        assert!(close(0.2, cpd.rows()[0][1]));
    }

    #[test]
    fn zero_prior_is_maximum_likelihood() {
        let parents = vec![String::from("X")];
        let cpd = LocalBayesianEstimator::new("Y", &parents, Prior::Dirichlet(0.0)).estimate(&data()).unwrap();
        assert!(close(4.0 / 6.0, cpd.rows()[0][0]));
    }

}
