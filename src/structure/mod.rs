//! Structure learning: recovering a `Dag` from a `Dataset`.
//!
//! Three strategies are provided: greedy score-based search (`HillClimbSearch`), constraint-based
//! search (`PcSearch`) and a fixed star topology (`NaiveBayes`). The `independence` module holds
//! the chi-squared tests the constraint-based search relies on, and the optional pruning of any
//! learned structure.

use crate::dag::Dag;
use crate::dataset::Dataset;
use crate::util::Result;

use tracing::warn;

mod hill_climb;
pub mod independence;
mod naive;
mod pc;

pub use self::hill_climb::HillClimbSearch;
pub use self::naive::NaiveBayes;
pub use self::pc::PcSearch;

/// A trait for the ability to learn the structure of a Bayesian network from data.
///
/// Learners hold only their configuration; all working state lives in the call, so one learner
/// can serve concurrent calls.
pub trait StructureLearner {

    /// Learn a `Dag` with one node per column of `data`, in column order
    fn learn(&self, data: &Dataset) -> Result<Dag>;

}

/// The columns of `data` that take more than one value. Single-valued columns cannot take part in
/// scoring or testing; each is reported and left as an isolated node.
pub(crate) fn informative_columns(data: &Dataset) -> Vec<usize> {
    (0..data.num_columns()).filter(|&c| {
        let keep = !data.is_degenerate(c);
        if !keep {
            warn!(variable = data.variables()[c].name(), "excluding single-valued variable from structure learning");
        }
        keep
    }).collect()
}

/// An edgeless `Dag` over the columns of `data`
pub(crate) fn empty_dag(data: &Dataset) -> Result<Dag> {
    let names: Vec<&str> = data.variables().iter().map(|v| v.name()).collect();
    Dag::new(&names)
}
