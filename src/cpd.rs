//! Defines a `Cpd`, the conditional probability table of one node of a Bayesian network.
//!
//! The table has one axis per parent (in parent order) followed by one axis for the node itself,
//! so each lane along the last axis is the distribution of the node for one parent configuration.

use crate::factor::{Factor, Table};
use crate::util::{BnetError, Result};
use crate::variable::Variable;

use itertools::Itertools;
use ndarray::prelude as nd;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Tolerance on the sum of each row of a `Cpd`
pub const ROW_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cpd {

    /// The `Variable` this table is the distribution of
    variable: Variable,

    /// The conditioning `Variable`s
    parents: Vec<Variable>,

    /// The probabilities, indexed `[parent_0, ..., parent_k, variable]`
    table: Table

}

impl Cpd {

    /// Create a new `Cpd`.
    ///
    /// # Errors
    /// * `BnetError::InvalidScope` if the shape of `table` does not match the `Variable`s
    /// * `BnetError::InvalidDistribution` if an entry is negative or a row does not sum to one
    pub fn new(variable: Variable, parents: Vec<Variable>, table: Table) -> Result<Self> {
        let cpd = Cpd { variable, parents, table };
        cpd.validate()?;
        Ok(cpd)
    }

    /// A `Cpd` that is uniform for every parent configuration
    pub fn uniform(variable: Variable, parents: Vec<Variable>) -> Self {
        let mut shape: Vec<usize> = parents.iter().map(|p| p.cardinality()).collect();
        shape.push(variable.cardinality());

        let val = 1. / (variable.cardinality().max(1) as f64);
        let table = Table::from_elem(nd::IxDyn(&shape), val);

        Cpd { variable, parents, table }
    }

    /// Build a `Cpd` from a `q x r` matrix of (possibly smoothed) counts, one row per parent
    /// configuration. Rows with no mass become uniform.
    ///
    /// # Returns
    /// the `Cpd`, and the indices of the rows that had no mass
    pub(crate) fn from_counts(variable: Variable, parents: Vec<Variable>, counts: nd::Array2<f64>) -> Result<(Self, Vec<usize>)> {
        let r = variable.cardinality();
        let mut empty = Vec::new();
        let mut probs = counts;

        for (j, mut row) in probs.outer_iter_mut().enumerate() {
            let total = row.sum();
            if total > 0.0 {
                row /= total;
            } else {
                empty.push(j);
                row.fill(1. / (r as f64));
            }
        }

        let mut shape: Vec<usize> = parents.iter().map(|p| p.cardinality()).collect();
        shape.push(r);

        let (data, _) = probs.into_raw_vec_and_offset();
        let table = Table::from_shape_vec(nd::IxDyn(&shape), data)
            .map_err(|e| BnetError::InvalidScope(e.to_string()))?;

        Ok((Cpd::new(variable, parents, table)?, empty))
    }

    /// The `Variable` this table is the distribution of
    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// The conditioning `Variable`s, in axis order
    pub fn parents(&self) -> &[Variable] {
        &self.parents
    }

    /// The names of the conditioning `Variable`s, in axis order
    pub fn parent_names(&self) -> Vec<&str> {
        self.parents.iter().map(|p| p.name()).collect()
    }

    /// The raw table, indexed `[parent_0, ..., parent_k, variable]`
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// The number of joint parent configurations (1 for a root node)
    pub fn num_configurations(&self) -> usize {
        self.parents.iter().map(|p| p.cardinality()).product()
    }

    /// The number of free parameters: `(|X| - 1) * q`
    pub fn free_parameters(&self) -> usize {
        (self.variable.cardinality().saturating_sub(1)) * self.num_configurations()
    }

    /// `P(variable = state | parents = parent_states)`, or `None` if an index is out of range
    pub fn probability(&self, state: usize, parent_states: &[usize]) -> Option<f64> {
        if parent_states.len() != self.parents.len() {
            return None;
        }
        let mut idx = parent_states.to_vec();
        idx.push(state);
        self.table.get(nd::IxDyn(&idx)).cloned()
    }

    /// The distribution of the variable given one parent configuration
    pub fn row(&self, parent_states: &[usize]) -> Option<Vec<f64>> {
        (0..self.variable.cardinality()).map(|s| self.probability(s, parent_states)).collect()
    }

    /// Every row of the table, parent configurations enumerated row-major (the last parent
    /// changes fastest)
    pub fn rows(&self) -> Vec<Vec<f64>> {
        let axis = nd::Axis(self.table.ndim() - 1);
        self.table.lanes(axis).into_iter().map(|lane| lane.to_vec()).collect()
    }

    /// Decode a parent configuration index into the state of each parent
    pub fn configuration(&self, mut j: usize) -> Vec<usize> {
        let mut states = vec![0; self.parents.len()];
        for (slot, p) in states.iter_mut().zip(self.parents.iter()).rev() {
            *slot = j % p.cardinality();
            j /= p.cardinality();
        }
        states
    }

    /// Convert to a `Factor` with scope `parents ++ [variable]`
    pub fn to_factor(&self) -> Factor {
        let mut scope = self.parents.clone();
        scope.push(self.variable.clone());
        Factor::TableFactor { scope, table: self.table.clone() }
    }

    /// Check the shape of the table and that every row is a probability distribution
    pub fn validate(&self) -> Result<()> {
        let mut shape: Vec<usize> = self.parents.iter().map(|p| p.cardinality()).collect();
        shape.push(self.variable.cardinality());

        if self.table.shape() != shape.as_slice() {
            return Err(BnetError::InvalidScope(format!(
                "table for '{}' has shape {:?}, expected {:?}", self.variable, self.table.shape(), shape
            )));
        }

        let names = self.parents.iter().chain(std::iter::once(&self.variable)).map(|v| v.name());
        if names.clone().unique().count() != self.parents.len() + 1 {
            return Err(BnetError::InvalidScope(format!("repeated variable in the table for '{}'", self.variable)));
        }

        if self.table.iter().any(|&v| v < 0.0 || !v.is_finite()) {
            return Err(BnetError::InvalidDistribution(String::from(self.variable.name())));
        }

        for row in self.rows() {
            let total: f64 = row.iter().sum();
            if (total - 1.0).abs() > ROW_TOLERANCE {
                return Err(BnetError::InvalidDistribution(String::from(self.variable.name())));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Cpd {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.parents.is_empty() {
            writeln!(f, "P({})", self.variable)?;
        } else {
            writeln!(f, "P({} | {})", self.variable, self.parent_names().join(", "))?;
        }

        for (j, row) in self.rows().iter().enumerate() {
            let config = self.configuration(j);
            let given = self.parents
                            .iter()
                            .zip(config.iter())
                            .map(|(p, &s)| format!("{}={}", p, p.state(s).unwrap_or("?")))
                            .join(", ");
            let probs = row.iter()
                           .enumerate()
                           .map(|(s, p)| format!("{}={:.4}", self.variable.state(s).unwrap_or("?"), p))
                           .join("  ");

            if given.is_empty() {
                writeln!(f, "  {}", probs)?;
            } else {
                writeln!(f, "  {} | {}", given, probs)?;
            }
        }

        Ok(())
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;

    #[test]
    fn conditional_table() {
        let i = Variable::binary("I");
        let s = Variable::binary("S");

        let cpd = Cpd::new(s.clone(), vec![i.clone()], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();

        assert_eq!("S", cpd.variable().name());
        assert_eq!(vec!["I"], cpd.parent_names());
        assert_eq!(2, cpd.num_configurations());
        assert_eq!(2, cpd.free_parameters());
        assert_eq!(Some(0.8), cpd.probability(1, &[1]));
        assert_eq!(None, cpd.probability(2, &[1]));
        assert_eq!(None, cpd.probability(0, &[]));
        assert_eq!(Some(vec![0.95, 0.05]), cpd.row(&[0]));
        assert_eq!(vec![vec![0.95, 0.05], vec![0.2, 0.8]], cpd.rows());

        let factor = cpd.to_factor();
        assert!((2.0 - factor.total()).abs() < 1e-12);
        assert_eq!(&[i, s], factor.scope());
    }

    #[test]
    fn rows_must_be_distributions() {
        let i = Variable::binary("I");
        let s = Variable::binary("S");

        let res = Cpd::new(s.clone(), vec![i.clone()], array![[0.5, 0.6], [0.2, 0.8]].into_dyn());
        assert_eq!(Err(BnetError::InvalidDistribution(String::from("S"))), res);

        let res = Cpd::new(s.clone(), vec![i.clone()], array![[1.5, -0.5], [0.2, 0.8]].into_dyn());
        assert_eq!(Err(BnetError::InvalidDistribution(String::from("S"))), res);

        match Cpd::new(s.clone(), vec![i], array![0.5, 0.5].into_dyn()) {
            Err(BnetError::InvalidScope(_)) => (),
            other => panic!("unexpected result {:?}", other)
        }

        match Cpd::new(s.clone(), vec![s], array![[1.0, 0.0], [0.0, 1.0]].into_dyn()) {
            Err(BnetError::InvalidScope(_)) => (),
            other => panic!("unexpected result {:?}", other)
        }
    }

    #[test]
    fn zeros_are_allowed() {
        let a = Variable::binary("A");
        let cpd = Cpd::new(a, vec![], array![1.0, 0.0].into_dyn()).unwrap();
        assert_eq!(Some(0.0), cpd.probability(1, &[]));
    }

    #[test]
    fn configurations_are_row_major() {
        let a = Variable::binary("A");
        let b = Variable::discrete("B", 3);
        let c = Variable::binary("C");
        let cpd = Cpd::uniform(c, vec![a, b]);

        assert_eq!(6, cpd.num_configurations());
        assert_eq!(vec![0, 0], cpd.configuration(0));
        assert_eq!(vec![0, 2], cpd.configuration(2));
        assert_eq!(vec![1, 0], cpd.configuration(3));
        assert_eq!(vec![1, 2], cpd.configuration(5));
        assert!(cpd.rows().iter().all(|r| r == &vec![0.5, 0.5]));
    }

    #[test]
    fn from_counts_fills_empty_rows() {
        let a = Variable::binary("A");
        let b = Variable::discrete("B", 3);
        let counts = array![[2.0, 1.0, 1.0], [0.0, 0.0, 0.0]];

        let (cpd, empty) = Cpd::from_counts(b, vec![a], counts).unwrap();
        assert_eq!(vec![1], empty);
        assert_eq!(Some(vec![0.5, 0.25, 0.25]), cpd.row(&[0]));
        let third = 1.0 / 3.0;
        assert_eq!(Some(vec![third, third, third]), cpd.row(&[1]));
    }

    #[test]
    fn display() {
        let i = Variable::new("I", &["low", "high"]);
        let s = Variable::new("S", &["bad", "good"]);
        let cpd = Cpd::new(s, vec![i], array![[0.95, 0.05], [0.2, 0.8]].into_dyn()).unwrap();

        let text = cpd.to_string();
        assert!(text.starts_with("P(S | I)"));
        assert!(text.contains("I=high | bad=0.2000  good=0.8000"));
    }

}
