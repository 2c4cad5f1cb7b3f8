//! Defines an inference engine that answers conditional probability queries exactly, by variable
//! elimination.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 - Sum-Product-VE

use crate::factor::Factor;
use crate::model::{BayesianNetwork, Model};
use crate::util::{BnetError, Result};
use crate::variable::{Assignment, Variable};
use super::{Distribution, Evidence};

use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::{BTreeMap, BTreeSet};

/// The heuristic choosing which variable to eliminate next
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EliminationOrder {

    /// Children before parents
    #[default]
    ReverseTopological,

    /// The variable with the fewest neighbours in the current interaction graph, ties broken by
    /// reverse topological position
    MinNeighbors

}

/// Exact inference over a `BayesianNetwork`.
///
/// The engine only borrows the network, so any number of engines may query the same network
/// concurrently, and a failed query leaves it untouched.
pub struct VariableElimination<'a> {

    model: &'a BayesianNetwork,

    order: EliminationOrder

}


impl<'a> VariableElimination<'a> {

    pub fn new(model: &'a BayesianNetwork) -> Self {
        VariableElimination { model, order: EliminationOrder::default() }
    }

    pub fn with_order(mut self, order: EliminationOrder) -> Self {
        self.order = order;
        self
    }


    /// The posterior distribution of `target` given `evidence`. Empty evidence gives the marginal.
    ///
    /// # Errors
    /// * `BnetError::InvalidQuery` if the target is empty or is part of the evidence
    /// * `BnetError::UnknownVariable` if the target or an evidence variable is not in the model
    /// * `BnetError::UnknownState` if an evidence value is not in its variable's domain
    /// * `BnetError::ZeroEvidenceLikelihood` if the evidence has probability zero
    pub fn query(&self, target: &str, evidence: &Evidence) -> Result<Distribution> {
        let phi = self.query_joint(&[target], evidence)?;
        let var = self.variable(target)?;

        let probabilities: Vec<f64> = match phi.table() {
            Some(table) => table.iter().cloned().collect(),
            None => return Err(BnetError::InvalidQuery(format!("no factor left over '{}'", target)))
        };

        Distribution::new(target, var.states().to_vec(), probabilities)
    }


    /// The joint posterior of several targets, as a normalized `Factor` over them.
    ///
    /// # Errors
    /// as for `query`; repeating a target is an `InvalidQuery`
    pub fn query_joint(&self, targets: &[&str], evidence: &Evidence) -> Result<Factor> {
        if targets.is_empty() {
            return Err(BnetError::InvalidQuery(String::from("no target variable")));
        }

        let dag = self.model.dag();
        let mut target_idx = Vec::with_capacity(targets.len());
        for &t in targets {
            if t.is_empty() {
                return Err(BnetError::InvalidQuery(String::from("no target variable")));
            }
            if evidence.contains_key(t) {
                return Err(BnetError::InvalidQuery(format!("'{}' is both target and evidence", t)));
            }
            let idx = dag.index_of(t).ok_or_else(|| BnetError::UnknownVariable(String::from(t)))?;
            if target_idx.contains(&idx) {
                return Err(BnetError::InvalidQuery(format!("'{}' is requested twice", t)));
            }
            target_idx.push(idx);
        }

        let observed = self.assignment(evidence)?;
        let evidence_idx: Vec<usize> = evidence.keys().filter_map(|k| dag.index_of(k)).collect();

        // nodes that are not ancestors of the query or the evidence sum out to one
        let mut query_nodes = target_idx;
        query_nodes.extend(evidence_idx.iter().cloned());
        let relevant = dag.ancestors(&query_nodes);

        let phis: Vec<Factor> = self.model
            .distributions()
            .values()
            .filter(|cpd| dag.index_of(cpd.variable().name()).map_or(false, |i| relevant.contains(&i)))
            .map(|cpd| cpd.to_factor().reduce(&observed))
            .collect();

        // the model keeps its CPDs in topological order
        let hidden: Vec<(usize, Variable)> = self.model
            .distributions()
            .values()
            .enumerate()
            .map(|(pos, cpd)| (pos, cpd.variable()))
            .filter(|(_, v)| !targets.contains(&v.name()) && !evidence.contains_key(v.name()))
            .filter(|(_, v)| dag.index_of(v.name()).map_or(false, |i| relevant.contains(&i)))
            .map(|(pos, v)| (pos, v.clone()))
            .collect();

        debug!(
            targets = ?targets,
            evidence = evidence.len(),
            factors = phis.len(),
            eliminated = hidden.len(),
            "variable elimination"
        );

        let order = self.elimination_order(hidden, &phis);
        let phi_star = eliminate(phis, &order);

        // now we have an unnormalized distribution, whose total is the likelihood of the evidence
        phi_star.normalize()
    }


    /// The most probable state of `target` given `evidence`
    ///
    /// # Errors
    /// as for `query`
    pub fn map_query(&self, target: &str, evidence: &Evidence) -> Result<String> {
        self.query(target, evidence).map(|d| String::from(d.argmax()))
    }


    fn variable(&self, name: &str) -> Result<&Variable> {
        self.model.lookup_variable(name).ok_or_else(|| BnetError::UnknownVariable(String::from(name)))
    }


    /// Translate the evidence labels into state indices
    fn assignment(&self, evidence: &Evidence) -> Result<Assignment> {
        let mut assn = Assignment::new();
        for (name, state) in evidence.iter() {
            let var = self.variable(name)?;
            let idx = var.state_index(state).ok_or_else(|| BnetError::UnknownState {
                variable: name.clone(),
                state: state.clone()
            })?;
            assn.set(var, idx);
        }
        Ok(assn)
    }


    /// Order the hidden variables, each tagged with its topological position
    fn elimination_order(&self, mut hidden: Vec<(usize, Variable)>, phis: &[Factor]) -> Vec<Variable> {
        hidden.sort_by(|a, b| b.0.cmp(&a.0));

        match self.order {
            EliminationOrder::ReverseTopological => hidden.into_iter().map(|(_, v)| v).collect(),
            EliminationOrder::MinNeighbors => min_neighbors(hidden, phis)
        }
    }
}


/// Greedy ordering by the number of neighbours each variable has in the interaction graph of
/// `phis`, updated as variables are eliminated. `hidden` comes in reverse topological order, which
/// breaks ties.
fn min_neighbors(hidden: Vec<(usize, Variable)>, phis: &[Factor]) -> Vec<Variable> {
    let mut neighbours: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for f in phis.iter() {
        for v in f.scope() {
            let entry = neighbours.entry(String::from(v.name())).or_default();
            entry.extend(f.scope().iter().filter(|u| u.name() != v.name()).map(|u| String::from(u.name())));
        }
    }

    let mut remaining: Vec<Variable> = hidden.into_iter().map(|(_, v)| v).collect();
    let mut order = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let degree = |v: &Variable| neighbours.get(v.name()).map_or(0, |n| n.len());

        let mut best = 0;
        for (i, v) in remaining.iter().enumerate() {
            if degree(v) < degree(&remaining[best]) {
                best = i;
            }
        }
        let next = remaining.remove(best);

        // eliminating `next` connects all of its neighbours
        let nbrs = neighbours.remove(next.name()).unwrap_or_default();
        for n in nbrs.iter() {
            if let Some(set) = neighbours.get_mut(n) {
                set.remove(next.name());
                set.extend(nbrs.iter().filter(|&m| m != n).cloned());
            }
        }

        order.push(next);
    }

    order
}


/// Sum the variables of `order` out of the product of `phis`, one at a time
fn eliminate(mut phis: Vec<Factor>, order: &[Variable]) -> Factor {
    for var in order.iter() {
        let (phi_1prime, phi_2prime): (Vec<Factor>, Vec<Factor>) = phis.into_iter()
                                                                       .partition(|f| f.contains(var));

        // product step - multiply factors with var
        let psi = phi_1prime.into_iter()
                            .fold(Factor::identity(), |acc, phi| acc.product(&phi));

        // sum step - marginalize psi over var
        let tau = psi.marginalize(var);

        phis = phi_2prime;
        phis.push(tau);
    }

    // multiply together remaining phis
    phis.into_iter().fold(Factor::identity(), |acc, phi| acc.product(&phi))
}
