//! Defines an `Estimator`, which is used to estimate parameters of a `BayesianNetwork` from a
//! dataset.

use crate::cpd::Cpd;
use crate::dag::Dag;
use crate::dataset::Dataset;
use crate::model::BayesianNetwork;
use crate::util::{BnetError, Result};
use crate::variable::Variable;

use serde::{Deserialize, Serialize};
use tracing::info;

mod bayes;
mod mle;
pub use self::bayes::{LocalBayesianEstimator, Prior};
pub use self::mle::LocalMLEstimator;

/// A trait that represents the ability to estimate the parameters of some model (be it a
/// `BayesianNetwork` or just a local CPD).
pub trait Estimator<T> {

    /// Estimate the value of the parameters from the given dataset
    fn estimate(&self, data: &Dataset) -> Result<T>;

}

/// How the CPDs of a network are estimated
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EstimationMethod {
    /// Relative frequencies
    MaximumLikelihood,

    /// Posterior mean under a Dirichlet prior
    Bayesian(Prior)
}


/// The dataset columns of a node and its parents, with their `Variable`s
fn local_columns(data: &Dataset, variable: &str, parents: &[String]) -> Result<(usize, Variable, Vec<usize>, Vec<Variable>)> {
    let column = |name: &str| -> Result<(usize, Variable)> {
        data.column_index(name)
            .map(|c| (c, data.variables()[c].clone()))
            .ok_or_else(|| BnetError::IncompatibleStructure(String::from(name)))
    };

    let (child, var) = column(variable)?;
    let (cols, vars) = parents.iter()
                              .map(|p| column(p))
                              .collect::<Result<Vec<(usize, Variable)>>>()?
                              .into_iter()
                              .unzip();

    Ok((child, var, cols, vars))
}


/// An estimator for a whole `BayesianNetwork` with a fixed structure.
///
/// Based on the decomposability of the likelihood function, each CPD can be estimated separately
/// and therefore the `ModelEstimator` is really just a 'bag-o-local-estimators'
pub struct ModelEstimator<'a> {

    /// The structure for which to estimate the parameters
    dag: &'a Dag,

    /// How every local CPD is estimated
    method: EstimationMethod

}

impl<'a> ModelEstimator<'a> {

    pub fn new(dag: &'a Dag, method: EstimationMethod) -> Self {
        ModelEstimator { dag, method }
    }

}

impl<'a> Estimator<BayesianNetwork> for ModelEstimator<'a> {

    /// # Errors
    /// * `BnetError::EmptyDataset` if `data` has no records
    /// * `BnetError::IncompatibleStructure` if a node of the structure has no column in `data`
    /// * `BnetError::InvalidStructure` if the structure has a directed cycle
    /// * `BnetError::TableTooLarge` if a conditional table would be too large to allocate
    fn estimate(&self, data: &Dataset) -> Result<BayesianNetwork> {
        if data.is_empty() {
            return Err(BnetError::EmptyDataset);
        }

        let mut cpds = Vec::with_capacity(self.dag.num_nodes());
        for idx in self.dag.topological_order()? {
            let name = self.dag.name(idx);
            let parents: Vec<String> = self.dag.parents(idx).iter().map(|&p| String::from(self.dag.name(p))).collect();

            let cpd: Cpd = match self.method {
                EstimationMethod::MaximumLikelihood => LocalMLEstimator::new(name, &parents).estimate(data)?,
                EstimationMethod::Bayesian(prior) => LocalBayesianEstimator::new(name, &parents, prior).estimate(data)?
            };
            cpds.push(cpd);
        }

        info!(variables = cpds.len(), records = data.len(), method = ?self.method, "estimated parameters");

        BayesianNetwork::new(self.dag.clone(), cpds)
    }

}

/// Fit the CPDs of the structure `dag` to `data`
pub fn fit(dag: &Dag, data: &Dataset, method: EstimationMethod) -> Result<BayesianNetwork> {
    ModelEstimator::new(dag, method).estimate(data)
}
