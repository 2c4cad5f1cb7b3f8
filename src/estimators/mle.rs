/// Defines `Estimator`s that use Maximum Likelihood Estimation to estimate the value of parameters
/// given a dataset.

use crate::cpd::Cpd;
use crate::dataset::Dataset;
use crate::util::Result;
use super::{local_columns, Estimator};

use tracing::warn;

/// Defines the `LocalMLEstimator`, a Maximum Likelihood `Estimator` for the Conditional Probability
/// Distribution of a single variable in a Bayesian framework.
///
/// Implementation of the MLE Parameter Estimation scheme for conditional probability distributions
/// described in Koller & Friedman Section 17.2. A parent configuration that never occurs in the
/// data gets a uniform row.
pub struct LocalMLEstimator {

    /// The variable whose distribution is estimated
    variable: String,

    /// Its parents, in the order of the table axes
    parents: Vec<String>

}


impl LocalMLEstimator {

    /// Construct an ML estimator for `variable` given `parents`
    pub fn new(variable: &str, parents: &[String]) -> Self {
        LocalMLEstimator { variable: String::from(variable), parents: parents.to_vec() }
    }

}


impl Estimator<Cpd> for LocalMLEstimator {

    /// # Errors
    /// * `BnetError::IncompatibleStructure` if the variable or a parent has no column in `data`
    /// * `BnetError::TableTooLarge` if the conditional table would be too large to allocate
    fn estimate(&self, data: &Dataset) -> Result<Cpd> {
        let (child, var, cols, parents) = local_columns(data, &self.variable, &self.parents)?;

        // we estimate each parameter by using the sufficient statistics (see K&F Eq. 17.5):
        //                  M[u, x]     <-- each value in the table
        //      theta x|u = -------
        //                   M[u]       <-- sum of the row
        // where u is a configuration of the parents and x a state of the variable
        let counts = data.parent_counts(child, &cols)?;
        let (cpd, unseen) = Cpd::from_counts(var, parents, counts)?;

        if !unseen.is_empty() {
            warn!(
                variable = %self.variable,
                configurations = unseen.len(),
                "parent configurations never observed, using uniform rows"
            );
        }

        Ok(cpd)
    }
}
