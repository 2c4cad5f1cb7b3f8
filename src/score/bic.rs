//! The Bayesian Information Criterion.

use crate::dataset::Dataset;
use super::StructureScore;

/// `BIC(X | Pa) = LL(X | Pa) - 0.5 * ln(N) * (|X| - 1) * q`, where `LL` is the log-likelihood of
/// the column under its maximum likelihood CPD and `q` the number of parent configurations
/// (observed or not).
#[derive(Clone, Copy, Debug, Default)]
pub struct BicScore;

impl StructureScore for BicScore {

    fn local_score(&self, data: &Dataset, child: usize, parents: &[usize]) -> f64 {
        let counts = data.observed_parent_counts(child, parents);
        let q = data.configurations(parents);
        let r = data.variables()[child].cardinality();

        let mut ll = 0.0;
        for row in counts.values() {
            let n_j: f64 = row.iter().sum();
            for &n_jk in row.iter().filter(|&&n| n > 0.0) {
                ll += n_jk * (n_jk / n_j).ln();
            }
        }

        let n = data.len() as f64;
        let free = r.saturating_sub(1) as f64 * q;

        ll - 0.5 * n.ln() * free
    }

}
