//! Definition of the factor module
//!
//! A `Factor` represents a relationship between some set of `Variable`s: a non-negative table
//! with one axis per `Variable` in its scope. `Factor`s are the working currency of variable
//! elimination.

use crate::util::{BnetError, Result};
use crate::variable::{Assignment, Variable};

use ndarray::prelude as nd;
use itertools::Itertools;

/// Alias f64 ndarray::Array as Table
pub type Table = nd::ArrayD<f64>;


#[derive(Clone, Debug)]
pub enum Factor {
    /// The empty, identity `Factor` with no scope. This type exists for dealing with arithmetic
    /// operations of `Factor`s
    Identity,

    /// A `Factor` over some scope of variables. Represented as a table as described in Koller
    /// & Friedman. An empty scope with a zero-dimensional table is a scalar `Factor`; reducing a
    /// `Factor` by a complete assignment yields one, which keeps the probability mass of the
    /// evidence around for normalization.
    TableFactor {
        /// The scope of the `Factor`
        scope: Vec<Variable>,

        /// The values of the `Factor` table.
        table: Table
    }
}


impl Factor {

    /// Get the identity factor
    pub fn identity() -> Self {
        Factor::Identity
    }


    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `BnetError::InvalidScope` if the table does not have one axis per `Variable`, with
    ///   matching cardinalities, or a `Variable` appears twice
    /// * `BnetError::InvalidDistribution` if the table has negative or non-finite values
    pub fn new(scope: Vec<Variable>, table: Table) -> Result<Self> {
        if scope.len() != table.ndim() {
            return Err(BnetError::InvalidScope(
                String::from("cardinality of scope must match number of table dimensions")
            ));
        }

        for (v, t) in scope.iter().map(|v| v.cardinality()).zip(table.shape().iter()) {
            if v != *t {
                return Err(BnetError::InvalidScope(String::from("dimensions do not match")));
            }
        }

        if scope.iter().map(|v| v.name()).unique().count() != scope.len() {
            return Err(BnetError::InvalidScope(String::from("a variable appears twice in the scope")));
        }

        // factors may not have negative values
        if table.iter().any(|&v| v < 0.0 || !v.is_finite()) {
            let name = scope.last().map(|v| String::from(v.name())).unwrap_or_default();
            return Err(BnetError::InvalidDistribution(name));
        }

        Ok(Factor::TableFactor { scope, table })
    }


    /// Create a scalar `Factor` with an empty scope
    pub fn scalar(value: f64) -> Self {
        Factor::TableFactor {
            scope: Vec::new(),
            table: nd::ArrayD::from_elem(nd::IxDyn(&[]), value)
        }
    }


    /// Check if the `Factor` is the identity `Factor`
    pub fn is_identity(&self) -> bool {
        matches!(self, Factor::Identity)
    }


    /// Retrieve the scope of the `Factor`.
    pub fn scope(&self) -> &[Variable] {
        match self {
            Factor::Identity => &[],
            Factor::TableFactor { scope, .. } => scope.as_slice()
        }
    }


    /// Check if `var` is in the scope of this `Factor`
    pub fn contains(&self, var: &Variable) -> bool {
        self.scope().iter().any(|v| v.name() == var.name())
    }


    /// Retrieve the table of the `Factor`, if it is not the identity
    pub fn table(&self) -> Option<&Table> {
        match self {
            Factor::Identity => None,
            Factor::TableFactor { table, .. } => Some(table)
        }
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope  may be a
    ///             superset  of the `Factor`s scope.
    ///
    /// # Returns
    /// the value of the assignment. The identity `Factor` has value 1 everywhere.
    ///
    /// # Errors
    /// * `BnetError::InvalidScope`, if assignment is not a complete assignment to the scope of
    ///   the `Factor` or assigns an out of range state
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        match self {
            Factor::Identity => Ok(1.0),
            Factor::TableFactor { scope, table, .. } => {
                let mut idxs = Vec::with_capacity(scope.len());
                for v in scope {
                    match assignment.get(v) {
                        Some(&i) if i < v.cardinality() => idxs.push(i),
                        Some(_) => return Err(BnetError::InvalidScope(format!("state out of range for '{}'", v))),
                        None => return Err(BnetError::InvalidScope(format!("missing assignment to '{}'", v)))
                    }
                }

                Ok(table[nd::IxDyn(&idxs)])
            }
        }
    }


    /// The sum of all entries of the `Factor`
    pub fn total(&self) -> f64 {
        match self {
            Factor::Identity => 1.0,
            Factor::TableFactor { table, .. } => table.sum()
        }
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1. Scopes need not intersect; the product of
    /// `Factor`s over disjoint scopes is their outer product.
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope()), ordered as self's scope followed
    /// by the `Variable`s only other has.
    pub fn product(&self, other: &Self) -> Self {
        // Factor::Identity is the multiplicative identity
        let (my_scope, my_table, other_scope, other_table) = match (self, other) {
            (Factor::Identity, _) => return other.clone(),
            (_, Factor::Identity) => return self.clone(),
            (Factor::TableFactor { scope: s1, table: t1, .. }, Factor::TableFactor { scope: s2, table: t2, .. }) => {
                (s1, t1, s2, t2)
            }
        };

        // We are computing a new factor Psi(X, Y, Z) = phi1(X, Y) * phi2(Y, Z).
        // See Koller & Friedman Definition 4.2
        let new_scope: Vec<Variable> = my_scope.iter()
                                               .chain(other_scope.iter())
                                               .unique_by(|v| v.name().to_string())
                                               .cloned()
                                               .collect();

        let axes = |scope: &[Variable]| -> Vec<usize> {
            scope.iter()
                 .map(|v| new_scope.iter().position(|n| n.name() == v.name()).unwrap_or(0))
                 .collect()
        };
        let my_axes = axes(my_scope);
        let other_axes = axes(other_scope);

        let new_shape: Vec<usize> = new_scope.iter().map(|v| v.cardinality()).collect();

        let mut i1 = vec![0; my_axes.len()];
        let mut i2 = vec![0; other_axes.len()];
        let tbl = Table::from_shape_fn(nd::IxDyn(&new_shape), |idx| {
            for (slot, &a) in i1.iter_mut().zip(my_axes.iter()) {
                *slot = idx[a];
            }
            for (slot, &a) in i2.iter_mut().zip(other_axes.iter()) {
                *slot = idx[a];
            }
            my_table[nd::IxDyn(&i1)] * other_table[nd::IxDyn(&i2)]
        });

        Factor::TableFactor { scope: new_scope, table: tbl }
    }


    /// Reduce the `Factor` to over the given partial assignment
    ///
    /// Defined in Koller & Friedman 4.2.3
    ///
    /// # Args
    /// assignment: a partial assignment to the `Factor`
    ///
    /// # Returns
    /// A new `Factor` reduced over the given assignment. A complete assignment leaves a scalar
    /// `Factor` holding the value of the assignment.
    pub fn reduce(&self, assignment: &Assignment) -> Self {
        match self {
            Factor::Identity => Factor::Identity,
            Factor::TableFactor { scope, table } => {
                if !scope.iter().any(|v| assignment.get(v).is_some()) {
                    // empty assignment (relative to scope)
                    return self.clone();
                }

                // reduce table based on assignment, from the last axis backwards so the remaining
                // axis indices stay valid
                let mut view = table.view();
                for (i, v) in scope.iter().enumerate().rev() {
                    if let Some(&val) = assignment.get(v) {
                        view = view.index_axis_move(nd::Axis(i), val);
                    }
                }

                let new_scope: Vec<Variable> = scope.iter()
                                                    .filter(|v| assignment.get(v).is_none())
                                                    .cloned()
                                                    .collect();

                Factor::TableFactor { scope: new_scope, table: view.to_owned() }
            }
        }
    }


    /// Marginalize the `Factor` over the given `Variable`
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Args
    /// other: the `Variable` over which to marginalize
    ///
    /// # Returns
    /// another `Factor`, marginalized over the given `Variable`. A `Variable` outside the scope
    /// leaves the `Factor` unchanged.
    pub fn marginalize(&self, other: &Variable) -> Self {
        match self {
            // the identity factor marginalized over anything is the identity
            Factor::Identity => Factor::Identity,

            Factor::TableFactor { scope, table, .. } => {
                if let Some(idx) = scope.iter().position(|v| v.name() == other.name()) {
                    let new_table = table.sum_axis(nd::Axis(idx));
                    let new_scope = scope.iter().filter(|v| v.name() != other.name()).cloned().collect();

                    Factor::TableFactor { scope: new_scope, table: new_table }
                } else {
                    self.clone()
                }
            }
        }
    }


    /// Normalize the `Factor` so its entries sum to one.
    ///
    /// # Errors
    /// * `BnetError::ZeroEvidenceLikelihood` if the `Factor` has no mass to normalize
    pub fn normalize(&self) -> Result<Self> {
        match self {
            Factor::Identity => Ok(Factor::Identity),
            Factor::TableFactor { scope, table, .. } => {
                let z = table.sum();
                if !(z > 0.0) || !z.is_finite() {
                    return Err(BnetError::ZeroEvidenceLikelihood);
                }

                Ok(Factor::TableFactor { scope: scope.clone(), table: table / z })
            }
        }
    }

}

// Unit tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::variable::all_assignments;
    use ndarray::array;

    fn assert_close(expected: f64, actual: f64) {
        assert!((expected - actual).abs() < 1e-12, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn identity() {
        let f = Factor::identity();
        assert!(f.is_identity());
        assert!(f.scope().is_empty());
        assert_close(1.0, f.value(&Assignment::new()).unwrap());
    }

    #[test]
    fn table_factor() {
        let vars = vec![Variable::binary("A"), Variable::discrete("B", 5), Variable::discrete("C", 3)];
        let mut table = Table::ones(vec![2, 5, 3]);
        table[nd::IxDyn(&[1, 1, 1])] = 5.;

        // assert table holds correct values
        let f = Factor::new(vars.clone(), table).unwrap();

        assert!(!f.is_identity());
        for assn in all_assignments(&vars) {
            let val = f.value(&assn).unwrap();
            let idx: Vec<usize> = vars.iter().map(|v| *assn.get(v).unwrap()).collect();
            if idx == vec![1, 1, 1] {
                assert_eq!(5., val);
            } else {
                assert_eq!(1., val);
            }
        }
    }

    #[test]
    fn table_factor_errs() {
        // mismatched number of dimensions
        let vars = vec![Variable::binary("A"), Variable::binary("B")];
        let f = Factor::new(vars.clone(), Table::ones(vec![2, 2, 2]));
        match f {
            Err(BnetError::InvalidScope(_)) => (),
            other => panic!("wrong result {:?}", other)
        };

        // wrong cardinality
        let f = Factor::new(vars.clone(), Table::ones(vec![2, 3]));
        match f {
            Err(BnetError::InvalidScope(_)) => (),
            other => panic!("wrong result {:?}", other)
        };

        // repeated variable
        let a = Variable::binary("A");
        let f = Factor::new(vec![a.clone(), a], Table::ones(vec![2, 2]));
        match f {
            Err(BnetError::InvalidScope(_)) => (),
            other => panic!("wrong result {:?}", other)
        };

        // negative entries
        let f = Factor::new(vars, array![[1., -1.], [0., 0.]].into_dyn());
        match f {
            Err(BnetError::InvalidDistribution(_)) => (),
            other => panic!("wrong result {:?}", other)
        };
    }

    #[test]
    fn value_incomplete_assignment() {
        let a = Variable::binary("A");
        let b = Variable::binary("B");
        let f = Factor::new(vec![a.clone(), b], Table::ones(vec![2, 2])).unwrap();

        let mut assn = Assignment::new();
        assn.set(&a, 0);
        match f.value(&assn) {
            Err(BnetError::InvalidScope(_)) => (),
            other => panic!("incorrect result {:?}", other)
        };
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 4.3
    fn product() {
        let a = Variable::discrete("A", 3);
        let b = Variable::binary("B");
        let c = Variable::binary("C");

        let tbl1 = array![[0.5, 0.8], [0.1, 0.], [0.3, 0.9]].into_dyn();
        let phi1 = Factor::new(vec![a.clone(), b.clone()], tbl1).unwrap();

        let tbl2 = array![[0.5, 0.7], [0.1, 0.2]].into_dyn();
        let phi2 = Factor::new(vec![b.clone(), c.clone()], tbl2).unwrap();

        let phi = phi1.product(&phi2);
        assert_eq!(&[a.clone(), b.clone(), c.clone()], phi.scope());

        let expected = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18]
        ).unwrap().into_dyn();

        for assn in all_assignments(&[a.clone(), b.clone(), c.clone()]) {
            let idx = vec![*assn.get(&a).unwrap(), *assn.get(&b).unwrap(), *assn.get(&c).unwrap()];
            assert_close(expected[nd::IxDyn(&idx)], phi.value(&assn).unwrap());
        }

        // multiplication is commutative up to the ordering of the scope
        let psi = phi2.product(&phi1);
        for assn in all_assignments(&[a, b, c]) {
            assert_close(phi.value(&assn).unwrap(), psi.value(&assn).unwrap());
        }
    }

    #[test]
    fn product_disjoint_and_identity() {
        let a = Variable::binary("A");
        let b = Variable::binary("B");

        let phi1 = Factor::new(vec![a.clone()], array![0.2, 0.8].into_dyn()).unwrap();
        let phi2 = Factor::new(vec![b.clone()], array![0.5, 1.5].into_dyn()).unwrap();

        let phi = phi1.product(&phi2);
        let mut assn = Assignment::new();
        assn.set(&a, 1);
        assn.set(&b, 1);
        assert_close(1.2, phi.value(&assn).unwrap());

        // scalars scale
        let scaled = Factor::scalar(0.5).product(&phi1);
        assert_eq!(&[a.clone()], scaled.scope());
        assert_close(0.4, scaled.value(&assn).unwrap());

        let same = phi1.product(&Factor::identity());
        assert_close(0.8, same.value(&assn).unwrap());
        let same = Factor::identity().product(&phi1);
        assert_close(0.8, same.value(&assn).unwrap());
    }

    fn kf_phi() -> (Variable, Variable, Variable, Factor) {
        let a = Variable::discrete("A", 3);
        let b = Variable::binary("B");
        let c = Variable::binary("C");

        let table = nd::Array::from_shape_vec(
            (3, 2, 2),
            vec![0.25, 0.35, 0.08, 0.16, 0.05, 0.07, 0., 0., 0.15, 0.21, 0.09, 0.18]
        ).unwrap().into_dyn();

        let phi = Factor::new(vec![a.clone(), b.clone(), c.clone()], table).unwrap();
        (a, b, c, phi)
    }

    #[test]
    /// Example take from Koller & Friedman Figure 4.5
    fn reduce_simple() {
        let (a, b, c, phi) = kf_phi();

        let mut assn = Assignment::new();
        assn.set(&c, 0);

        let expected = array![[0.25, 0.08], [0.05, 0.], [0.15, 0.09]].into_dyn();

        let reduced = phi.reduce(&assn);
        assert_eq!(&[a.clone(), b.clone()], reduced.scope());
        for asn in all_assignments(&[a.clone(), b.clone()]) {
            let idx = [*asn.get(&a).unwrap(), *asn.get(&b).unwrap()];
            assert_close(expected[nd::IxDyn(&idx)], reduced.value(&asn).unwrap());
        }
    }

    #[test]
    fn reduce_multiple() {
        let (a, b, c, phi) = kf_phi();

        let mut assn = Assignment::new();
        assn.set(&c, 0);
        assn.set(&a, 2);

        let reduced = phi.reduce(&assn);
        assert_eq!(&[b.clone()], reduced.scope());

        let table = reduced.table().unwrap();
        assert_close(0.15, table[nd::IxDyn(&[0])]);
        assert_close(0.09, table[nd::IxDyn(&[1])]);
    }

    #[test]
    fn reduce_empty_and_full() {
        let (a, b, c, phi) = kf_phi();

        let mut other = Assignment::new();
        other.set(&Variable::binary("Z"), 1);
        let reduced = phi.reduce(&other);
        assert_eq!(phi.scope(), reduced.scope());

        let mut full = Assignment::new();
        full.set(&a, 2);
        full.set(&b, 1);
        full.set(&c, 1);
        let reduced = phi.reduce(&full);
        assert!(reduced.scope().is_empty());
        assert_close(0.18, reduced.total());
    }

    #[test]
    /// Example taken from Koller & Friedman Figure 9.7
    fn marginalize() {
        let (a, b, c, phi) = kf_phi();

        let marginalized = phi.marginalize(&b);
        assert_eq!(&[a.clone(), c.clone()], marginalized.scope());

        let expected = array![[0.33, 0.51], [0.05, 0.07], [0.24, 0.39]].into_dyn();
        for assn in all_assignments(&[a.clone(), c.clone()]) {
            let idx = [*assn.get(&a).unwrap(), *assn.get(&c).unwrap()];
            assert_close(expected[nd::IxDyn(&idx)], marginalized.value(&assn).unwrap());
        }

        // marginalizing everything leaves the total mass
        let all = marginalized.marginalize(&a).marginalize(&c);
        assert!(all.scope().is_empty());
        assert_close(phi.total(), all.total());
    }

    #[test]
    fn normalize() {
        let a = Variable::binary("A");
        let phi = Factor::new(vec![a.clone()], array![1., 3.].into_dyn()).unwrap();
        let p = phi.normalize().unwrap();
        assert_close(1.0, p.total());

        let mut assn = Assignment::new();
        assn.set(&a, 1);
        assert_close(0.75, p.value(&assn).unwrap());

        let zero = Factor::new(vec![a], array![0., 0.].into_dyn()).unwrap();
        match zero.normalize() {
            Err(BnetError::ZeroEvidenceLikelihood) => (),
            other => panic!("expected zero likelihood, got {:?}", other)
        }
    }
}
