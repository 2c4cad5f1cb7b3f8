//! Decomposable scores of a `Dag` given a `Dataset`.
//!
//! Every score here is a sum over nodes of a local score that depends only on the node and its
//! parent set, and a higher score is always better. Structure search leans on this: a single
//! edge change only re-scores the node(s) whose parent set changed.

use crate::dag::Dag;
use crate::dataset::Dataset;
use crate::util::{BnetError, Result};

use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::{BTreeSet, HashMap};

mod bdeu;
mod bic;
mod k2;

pub use self::bdeu::BDeuScore;
pub use self::bic::BicScore;
pub use self::k2::K2Score;

/// A trait for scores that decompose over the nodes of a network.
pub trait StructureScore {

    /// The local score of column `child` of `data` given the parent columns `parents`
    fn local_score(&self, data: &Dataset, child: usize, parents: &[usize]) -> f64;

}

/// The closed set of supported scoring criteria
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ScoringMethod {
    /// Bayesian Information Criterion
    Bic,

    /// Cooper & Herskovits K2 metric (uniform Dirichlet prior, all pseudo-counts one)
    K2,

    /// Bayesian Dirichlet equivalent uniform
    Bdeu { equivalent_sample_size: f64 }
}

impl StructureScore for ScoringMethod {

    fn local_score(&self, data: &Dataset, child: usize, parents: &[usize]) -> f64 {
        match *self {
            ScoringMethod::Bic => BicScore.local_score(data, child, parents),
            ScoringMethod::K2 => K2Score.local_score(data, child, parents),
            ScoringMethod::Bdeu { equivalent_sample_size } => {
                BDeuScore::new(equivalent_sample_size).local_score(data, child, parents)
            }
        }
    }

}

/// Score a whole structure against a dataset.
///
/// # Errors
/// * `BnetError::EmptyDataset` if `data` has no records
/// * `BnetError::InvalidStructure` if `dag` has a directed cycle
/// * `BnetError::IncompatibleStructure` if a node of `dag` has no column in `data`
pub fn score(dag: &Dag, data: &Dataset, method: &ScoringMethod) -> Result<f64> {
    let mut cache = ScoreCache::new(data, *method, dag)?;
    dag.topological_order()?;
    Ok(cache.total(dag))
}

/// Memoizes local scores for one dataset and scoring method.
///
/// A cache is built per search, so concurrent searches never share one.
pub struct ScoreCache<'a> {

    /// The data being scored
    data: &'a Dataset,

    /// The criterion
    method: ScoringMethod,

    /// `columns[i]` is the dataset column of node `i`
    columns: Vec<usize>,

    /// Local scores keyed by node and sorted parent set
    cache: HashMap<(usize, Vec<usize>), f64>

}

impl<'a> ScoreCache<'a> {

    /// Create a cache scoring the nodes of `dag` against the matching columns of `data`
    ///
    /// # Errors
    /// * `BnetError::EmptyDataset` if `data` has no records
    /// * `BnetError::IncompatibleStructure` if a node of `dag` has no column in `data`
    pub fn new(data: &'a Dataset, method: ScoringMethod, dag: &Dag) -> Result<Self> {
        if data.is_empty() {
            return Err(BnetError::EmptyDataset);
        }

        let columns = dag.nodes()
                         .iter()
                         .map(|n| data.column_index(n).ok_or_else(|| BnetError::IncompatibleStructure(n.clone())))
                         .collect::<Result<Vec<usize>>>()?;

        Ok(ScoreCache { data, method, columns, cache: HashMap::new() })
    }

    /// The local score of `node` with the given parents (both as node indices)
    pub fn local_score(&mut self, node: usize, parents: &BTreeSet<usize>) -> f64 {
        let key = (node, parents.iter().cloned().collect::<Vec<usize>>());
        if let Some(&s) = self.cache.get(&key) {
            return s;
        }

        let child = self.columns[node];
        let cols: Vec<usize> = key.1.iter().map(|&p| self.columns[p]).collect();
        let s = self.method.local_score(self.data, child, &cols);
        debug!(node, parents = ?key.1, score = s, "local score");

        self.cache.insert(key, s);
        s
    }

    /// The sum of the local scores of every node of `dag`
    pub fn total(&mut self, dag: &Dag) -> f64 {
        (0..dag.num_nodes()).map(|i| self.local_score(i, dag.parents(i))).sum()
    }

    /// The number of distinct local scores computed so far
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
