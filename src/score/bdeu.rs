//! The Bayesian Dirichlet equivalent uniform score.

use crate::dataset::Dataset;
use super::StructureScore;

use statrs::function::gamma::ln_gamma;

/// Log marginal likelihood under a Dirichlet prior spreading `equivalent_sample_size` pseudo-counts
/// uniformly over the table: `a_j = ess / q` per parent configuration and `a_jk = ess / (q r)` per
/// cell.
///
/// `sum_j [ lgamma(a_j) - lgamma(N_j + a_j) + sum_k (lgamma(N_jk + a_jk) - lgamma(a_jk)) ]`
#[derive(Clone, Copy, Debug)]
pub struct BDeuScore {
    equivalent_sample_size: f64
}

impl BDeuScore {

    pub fn new(equivalent_sample_size: f64) -> Self {
        BDeuScore { equivalent_sample_size }
    }

    pub fn equivalent_sample_size(&self) -> f64 {
        self.equivalent_sample_size
    }
}

impl StructureScore for BDeuScore {

    fn local_score(&self, data: &Dataset, child: usize, parents: &[usize]) -> f64 {
        let q = data.configurations(parents);
        let r = data.variables()[child].cardinality() as f64;

        let a_j = self.equivalent_sample_size / q;
        let a_jk = a_j / r;
        let (lg_a_j, lg_a_jk) = (ln_gamma(a_j), ln_gamma(a_jk));

        // unobserved configurations contribute exactly zero
        let mut score = 0.0;
        for row in data.observed_parent_counts(child, parents).values() {
            let n_j: f64 = row.iter().sum();

            score += lg_a_j - ln_gamma(n_j + a_j);
            score += row.iter().map(|&n_jk| ln_gamma(n_jk + a_jk) - lg_a_jk).sum::<f64>();
        }

        score
    }

}
