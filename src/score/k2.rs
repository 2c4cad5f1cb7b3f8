//! The K2 metric of Cooper & Herskovits.

use crate::dataset::Dataset;
use super::StructureScore;

use statrs::function::gamma::ln_gamma;

/// Log marginal likelihood under a Dirichlet prior with every pseudo-count equal to one:
///
/// `sum_j [ lgamma(r) - lgamma(N_j + r) + sum_k lgamma(N_jk + 1) ]`
#[derive(Clone, Copy, Debug, Default)]
pub struct K2Score;

impl StructureScore for K2Score {

    fn local_score(&self, data: &Dataset, child: usize, parents: &[usize]) -> f64 {
        let r = data.variables()[child].cardinality() as f64;
        let lg_r = ln_gamma(r);

        // unobserved configurations contribute exactly zero
        data.observed_parent_counts(child, parents)
            .values()
            .map(|row| {
                let n_j: f64 = row.iter().sum();
                lg_r - ln_gamma(n_j + r) + row.iter().map(|&n_jk| ln_gamma(n_jk + 1.0)).sum::<f64>()
            })
            .sum()
    }

}
