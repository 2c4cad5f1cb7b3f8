//! Defines the interface to the inference engine and the results it returns

use crate::util::{BnetError, Result};

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

mod variable_elimination;

pub use self::variable_elimination::{EliminationOrder, VariableElimination};

/// Observed values: variable name to state label
pub type Evidence = BTreeMap<String, String>;


/// A posterior distribution over the states of a single variable
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distribution {

    /// The variable the distribution is over
    variable: String,

    /// The state labels, in domain order
    states: Vec<String>,

    /// The probability of each state
    probabilities: Vec<f64>

}

impl Distribution {

    /// # Errors
    /// * `BnetError::InvalidScope` if there is not one probability per state
    /// * `BnetError::InvalidDistribution` if the probabilities are negative or do not sum to one
    pub fn new(variable: &str, states: Vec<String>, probabilities: Vec<f64>) -> Result<Self> {
        if states.len() != probabilities.len() {
            return Err(BnetError::InvalidScope(format!("{} states, {} probabilities", states.len(), probabilities.len())));
        }

        let total: f64 = probabilities.iter().sum();
        if probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) || (1.0 - total).abs() > 1e-9 {
            return Err(BnetError::InvalidDistribution(String::from(variable)));
        }

        Ok(Distribution { variable: String::from(variable), states, probabilities })
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// The probability of the state labelled `state`, if it is in the domain
    pub fn probability(&self, state: &str) -> Option<f64> {
        self.states.iter().position(|s| s == state).map(|i| self.probabilities[i])
    }

    /// Shannon entropy, in nats
    pub fn entropy(&self) -> f64 {
        -self.probabilities.iter().filter(|&&p| p > 0.0).map(|p| p * p.ln()).sum::<f64>()
    }

    /// The most probable state. Ties go to the state first in domain order.
    pub fn argmax(&self) -> &str {
        let mut best = 0;
        for (i, &p) in self.probabilities.iter().enumerate() {
            if p > self.probabilities[best] {
                best = i;
            }
        }
        self.states.get(best).map_or("", |s| s.as_str())
    }

    /// Iterate over `(state, probability)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.states.iter().map(|s| s.as_str()).zip(self.probabilities.iter().cloned())
    }
}

impl fmt::Display for Distribution {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "P({})", self.variable)?;
        for (s, p) in self.iter() {
            write!(f, "  {}={:.4}", s, p)?;
        }
        Ok(())
    }

}


#[cfg(test)]
/// Fixtures for the inference engine. The networks are small enough for every expected value to
/// be worked out by hand.
pub(crate) mod tests {
    use super::*;
    use crate::init::Initialization;
    use crate::model::{BayesianNetwork, BayesianNetworkBuilder};
    use crate::variable::Variable;

    /// Evidence from `(name, state)` pairs
    pub fn evidence(pairs: &[(&str, &str)]) -> Evidence {
        pairs.iter().map(|(k, v)| (String::from(*k), String::from(*v))).collect()
    }

    /// The chain A -> B -> C over binary variables with states "0" and "1":
    ///
    /// ```text
    ///   P(A)     = [.6, .4]
    ///   P(B | A) = [[.7, .3], [.2, .8]]
    ///   P(C | B) = [[.9, .1], [.5, .5]]
    /// ```
    ///
    /// so that P(B) = [.5, .5], P(C) = [.7, .3], P(A | C = 0) = [.468, .232] / .7 and
    /// P(A | B = 0, C = 0) = [.84, .16].
    pub fn chain() -> BayesianNetwork {
        let a = Variable::discrete("A", 2);
        let b = Variable::discrete("B", 2);
        let c = Variable::discrete("C", 2);

        BayesianNetworkBuilder::new()
            .with_variable(&a, &[], Initialization::Binomial(0.6))
            .with_variable(&b, &["A"], Initialization::Rows(&[&[0.7, 0.3], &[0.2, 0.8]]))
            .with_variable(&c, &["B"], Initialization::Rows(&[&[0.9, 0.1], &[0.5, 0.5]]))
            .build()
            .unwrap()
    }

    /// A chain in which B is always "0" and C is "0" whenever B is, so C = "1" is impossible
    pub fn impossible_evidence() -> BayesianNetwork {
        let a = Variable::discrete("A", 2);
        let b = Variable::discrete("B", 2);
        let c = Variable::discrete("C", 2);

        BayesianNetworkBuilder::new()
            .with_variable(&a, &[], Initialization::Binomial(0.5))
            .with_variable(&b, &["A"], Initialization::Rows(&[&[1.0, 0.0], &[1.0, 0.0]]))
            .with_variable(&c, &["B"], Initialization::Rows(&[&[1.0, 0.0], &[0.5, 0.5]]))
            .build()
            .unwrap()
    }

    /// Koller & Friedman's student example, as modified in example 6d of [1], which gives
    /// P(I = 1 | D = 0, L = 1, S = 0) = 0.02919708.
    ///
    /// [1] https://www.uni-oldenburg.de/en/lcs/probabilistic-programming/webchurch-and-openbugs/
    pub fn student() -> BayesianNetwork {
        let d = Variable::discrete("D", 2);
        let i = Variable::discrete("I", 2);
        let g = Variable::discrete("G", 2);
        let s = Variable::discrete("S", 2);
        let l = Variable::discrete("L", 2);

        BayesianNetworkBuilder::new()
            .with_variable(&d, &[], Initialization::Binomial(0.6))
            .with_variable(&i, &[], Initialization::Binomial(0.7))
            .with_variable(&g, &["I", "D"], Initialization::Rows(&[&[0.3, 0.7], &[0.05, 0.95], &[0.9, 0.1], &[0.5, 0.5]]))
            .with_variable(&s, &["I"], Initialization::Rows(&[&[0.95, 0.05], &[0.2, 0.8]]))
            .with_variable(&l, &["G"], Initialization::Rows(&[&[0.9, 0.1], &[0.4, 0.6]]))
            .build()
            .unwrap()
    }

    #[test]
    fn distribution_accessors() {
        let states = vec![String::from("lo"), String::from("mid"), String::from("hi")];
        let d = Distribution::new("X", states, vec![0.25, 0.5, 0.25]).unwrap();

        assert_eq!("X", d.variable());
        assert_eq!(Some(0.5), d.probability("mid"));
        assert_eq!(None, d.probability("max"));
        assert_eq!("mid", d.argmax());
        assert!((d.entropy() - 1.5 * 2f64.ln()).abs() < 1e-12);
        assert_eq!("P(X)  lo=0.2500  mid=0.5000  hi=0.2500", d.to_string());
    }

    #[test]
    fn distribution_checks() {
        let states = vec![String::from("a"), String::from("b")];
        assert_eq!(
            Err(BnetError::InvalidDistribution(String::from("X"))),
            Distribution::new("X", states.clone(), vec![0.5, 0.6])
        );
        assert!(Distribution::new("X", states, vec![1.0]).is_err());
    }

    #[test]
    fn argmax_ties_go_first() {
        let states = vec![String::from("a"), String::from("b")];
        let d = Distribution::new("X", states, vec![0.5, 0.5]).unwrap();
        assert_eq!("a", d.argmax());
        assert_eq!(0.0, Distribution::new("Y", vec![String::from("y")], vec![1.0]).unwrap().entropy());
    }
}
