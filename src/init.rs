//! Module containing initialization routines for the conditional tables of a hand-built network.

use crate::cpd::Cpd;
use crate::factor::Table;
use crate::util::{BnetError, Result};
use crate::variable::Variable;

use ndarray::prelude as nd;

/// Defines possible ways to initialize a `Variable`s CPD.
pub enum Initialization<'a> {
    /// A uniform distribution over all possibilities
    Uniform,

    /// Initialize the CPD as a Binomial distribution with parameter ```p``` (the probability of
    /// the first state). Note that this `Initialization` is valid only to a `Variable` with no
    /// parents.
    Binomial(f64),

    /// Initialize the CPD as a Multinomial distribution with parameters ```p_0, p_1...```.
    /// Note that this `Initialization` is valid only to a `Variable` with no parents.
    Multinomial(&'a [f64]),

    /// One distribution per parent configuration, enumerated row-major (the last parent changes
    /// fastest).
    Rows(&'a [&'a [f64]]),

    /// User defined table, indexed `[parent_0, ..., parent_k, variable]`
    Table(Table)
}


impl<'a> Initialization<'a> {

    /// Construct a CPD, initialized based on ```self```
    ///
    /// # Args
    /// * `var`: the `Variable` the CPD is a distribution of
    /// * `parents`: the conditioning `Variable`s, in axis order
    ///
    /// # Errors
    /// * `BnetError::InvalidScope` if the parameters do not fit the `Variable`s
    /// * `BnetError::InvalidDistribution` if the parameters are not a distribution
    pub fn build_cpd(self, var: Variable, parents: Vec<Variable>) -> Result<Cpd> {
        ///////////////////////////////////////////////////////////////////////////////
        // Check for errors
        match self {
            Initialization::Binomial(_) | Initialization::Multinomial(_) if !parents.is_empty() => {
                return Err(BnetError::InvalidScope(format!("'{}' has parents, a table is required", var)));
            },

            // A binomial distribution on a non-binary variable
            Initialization::Binomial(_) if var.cardinality() != 2 => {
                return Err(BnetError::InvalidScope(format!("'{}' is not binary", var)));
            },

            // A multinomial distribution with an incorrect number of parameters
            Initialization::Multinomial(ps) if ps.len() != var.cardinality() => {
                return Err(BnetError::InvalidScope(format!("'{}' has {} states", var, var.cardinality())));
            },

            _ => ()
        }

        ///////////////////////////////////////////////////////////////////////////////
        // now, build CPD
        let tbl = match self {
            Initialization::Uniform => return Ok(Cpd::uniform(var, parents)),
            Initialization::Binomial(p) => {
                nd::arr1(&[p, 1.0 - p]).into_dyn()
            },
            Initialization::Multinomial(p) => {
                nd::Array::from_iter(p.iter().cloned()).into_dyn()
            },
            Initialization::Rows(rows) => {
                let mut shape: Vec<usize> = parents.iter().map(|v| v.cardinality()).collect();
                shape.push(var.cardinality());

                let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().cloned()).collect();
                if rows.iter().any(|r| r.len() != var.cardinality()) {
                    return Err(BnetError::InvalidScope(format!("every row for '{}' needs {} entries", var, var.cardinality())));
                }

                Table::from_shape_vec(nd::IxDyn(&shape), flat)
                    .map_err(|_| BnetError::InvalidScope(format!("wrong number of rows for '{}'", var)))?
            },
            Initialization::Table(t) => t
        };

        Cpd::new(var, parents, tbl)
    }
}
