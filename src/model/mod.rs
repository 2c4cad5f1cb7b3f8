//! Defines a `Model`, a Bayesian (directed) graphical model representing the factorization of a
//! probability distribution P, together with the record of how it was learned.

use crate::config::TrainConfig;
use crate::structure::independence::EdgeTest;
use crate::util::Result;
use crate::variable::{Assignment, Variable};

use serde::{Deserialize, Serialize};

pub mod directed;
pub mod graph;

pub use self::directed::{BayesianNetwork, BayesianNetworkBuilder};
pub use self::graph::{NetworkGraph, WeightedEdge};

/// The `Model` trait represents a Probabilistic Graphical Model.
pub trait Model {

    /// Lookup a `Variable` in the `Model` based on the name
    fn lookup_variable(&self, name: &str) -> Option<&Variable>;


    /// Get all `Variable`s in the model.
    fn variables(&self) -> Vec<&Variable>;


    /// Get the number of `Variable`s in the the `Model`
    fn num_variables(&self) -> usize;


    /// Determine the probability of a full `Assignment` to the `Variable`s in the `Model`.
    ///
    /// Specifically, this computes ```P(zeta)```, where ```zeta``` is a full assignment.
    ///
    /// # Args
    /// * `assignment`: a full `Assignment` to the `Model`
    ///
    /// # Returns
    /// the probability of the `Assignment` given the `Model`
    fn probability(&self, assignment: &Assignment) -> Result<f64>;
}

/// What went into learning a model. Hand-built models carry the default (empty) metadata.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {

    /// The configuration the model was trained with
    pub config: Option<TrainConfig>,

    /// The number of training records
    pub num_records: usize,

    /// Score of the learned structure under the structure scoring criterion
    pub structure_score: Option<f64>,

    /// Score of the learned structure under the parameter scoring criterion
    pub parameter_score: Option<f64>,

    /// The independence test of every edge of the final structure
    pub edge_tests: Vec<EdgeTest>,

    /// Edges removed by pruning
    pub pruned_edges: Vec<EdgeTest>,

    /// Single-valued variables left out of structure learning
    pub excluded_variables: Vec<String>

}
