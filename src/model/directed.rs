//! Defines a `BayesianNetwork`, a directed model that represents the factorization of a
//! probability distribution P over discrete variables.

use crate::cpd::Cpd;
use crate::dag::Dag;
use crate::init::Initialization;
use crate::util::{BnetError, Result};
use crate::variable::{Assignment, Variable};
use super::graph::{NetworkGraph, WeightedEdge};
use super::{Model, ModelMetadata};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;
use std::fmt;


/// Represents a Bayesian Network - a Directed Probabilistic Graphical Model.
///
/// # Representation
/// The network holds its `Dag` and the Conditional Probability Distribution (CPD) of each
/// `Variable`. The parents of every CPD are exactly the parents of its node in the `Dag`. The CPDs
/// are held in a topological order of the `Dag` to faciliate efficient computations over the graph.
///
/// A `BayesianNetwork` is never modified once built, so it can be shared freely between threads
/// running queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BayesianNetwork {

    /// The structure of the network
    dag: Dag,

    /// The CPD of each `Variable`, keyed by name, in topological order
    cpds: IndexMap<String, Cpd>,

    /// How the network was learned
    metadata: ModelMetadata

}

impl BayesianNetwork {

    /// Assemble a network from a structure and one CPD per node.
    ///
    /// # Errors
    /// * `BnetError::InvalidStructure` if `dag` has a directed cycle
    /// * `BnetError::DuplicateVariable` if two CPDs are over the same `Variable`
    /// * `BnetError::UnknownVariable` if a CPD is over a `Variable` that is not a node of `dag`
    /// * `BnetError::IncompatibleStructure` if a node has no CPD, or the parents of a CPD are not
    ///   the parents of its node
    pub fn new(dag: Dag, cpds: Vec<Cpd>) -> Result<Self> {
        let mut by_name: IndexMap<String, Cpd> = IndexMap::with_capacity(cpds.len());
        for cpd in cpds {
            let name = String::from(cpd.variable().name());
            if dag.index_of(&name).is_none() {
                return Err(BnetError::UnknownVariable(name));
            }
            if by_name.insert(name.clone(), cpd).is_some() {
                return Err(BnetError::DuplicateVariable(name));
            }
        }

        let mut ordered = IndexMap::with_capacity(by_name.len());
        for idx in dag.topological_order()? {
            let name = dag.name(idx);
            let cpd = by_name.swap_remove(name)
                             .ok_or_else(|| BnetError::IncompatibleStructure(String::from(name)))?;
            ordered.insert(String::from(name), cpd);
        }

        let model = BayesianNetwork { dag, cpds: ordered, metadata: ModelMetadata::default() };
        model.check_consistency()?;
        Ok(model)
    }

    /// Attach metadata describing how the network was learned
    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    /// Get the CPD of the named `Variable`
    pub fn cpd(&self, name: &str) -> Option<&Cpd> {
        self.cpds.get(name)
    }

    /// Every CPD, keyed by variable name, in topological order
    pub fn distributions(&self) -> &IndexMap<String, Cpd> {
        &self.cpds
    }

    /// Get a topological order of the `BayesianNetwork`
    pub fn topological_order(&self) -> Vec<&str> {
        self.cpds.keys().map(|k| k.as_str()).collect()
    }

    /// The nodes and weighted edges of the network, for display.
    ///
    /// The weight of an edge is `-log10(p)` for the p-value of its independence test recorded when
    /// the network was learned, and 1 for an edge without a recorded test.
    pub fn graph(&self) -> NetworkGraph {
        let edges = self.dag.named_edges().into_iter().map(|(source, target)| {
            let weight = self.metadata
                             .edge_tests
                             .iter()
                             .find(|t| t.source == source && t.target == target)
                             .map_or(1.0, |t| t.weight());
            WeightedEdge { source, target, weight }
        }).collect();

        NetworkGraph { nodes: self.dag.nodes().to_vec(), edges }
    }

    /// Check that the structure and the CPDs agree, and every CPD is a distribution
    pub fn validate(&self) -> Result<()> {
        self.dag.validate()?;
        if self.cpds.len() != self.dag.num_nodes() {
            return Err(BnetError::IncompatibleStructure(String::from("node and table counts differ")));
        }
        for node in self.dag.nodes() {
            if !self.cpds.contains_key(node) {
                return Err(BnetError::IncompatibleStructure(node.clone()));
            }
        }
        self.check_consistency()
    }

    /// Serialize the network, CPDs and metadata to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Read a network written by `to_json`, checking it is still a valid network
    pub fn from_json(json: &str) -> Result<Self> {
        let model: BayesianNetwork = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Each CPD is conditioned on exactly the parents of its node, with the same `Variable`s
    fn check_consistency(&self) -> Result<()> {
        for (name, cpd) in self.cpds.iter() {
            if cpd.variable().name() != name {
                return Err(BnetError::IncompatibleStructure(name.clone()));
            }

            let expected: BTreeSet<&str> = self.dag.parent_names(name)?.into_iter().collect();
            let actual: BTreeSet<&str> = cpd.parent_names().into_iter().collect();
            if expected != actual || actual.len() != cpd.parents().len() {
                return Err(BnetError::IncompatibleStructure(name.clone()));
            }

            for p in cpd.parents() {
                if self.cpds.get(p.name()).map(|c| c.variable()) != Some(p) {
                    return Err(BnetError::IncompatibleStructure(String::from(p.name())));
                }
            }

            cpd.validate()?;
        }
        Ok(())
    }
}

impl Model for BayesianNetwork {

    fn lookup_variable(&self, name: &str) -> Option<&Variable> {
        self.cpds.get(name).map(|c| c.variable())
    }

    fn variables(&self) -> Vec<&Variable> {
        self.cpds.values().map(|c| c.variable()).collect()
    }

    fn num_variables(&self) -> usize {
        self.cpds.len()
    }

    /// Determine the probability of a full `Assignment` by the chain rule.
    fn probability(&self, assignment: &Assignment) -> Result<f64> {
        let state = |v: &Variable| -> Result<usize> {
            assignment.get(v)
                      .cloned()
                      .ok_or_else(|| BnetError::InvalidScope(format!("missing assignment to '{}'", v)))
        };

        let mut p = 1.0;
        for cpd in self.cpds.values() {
            let x = state(cpd.variable())?;
            let parents = cpd.parents().iter().map(|v| state(v)).collect::<Result<Vec<usize>>>()?;
            p *= cpd.probability(x, &parents)
                    .ok_or_else(|| BnetError::InvalidScope(format!("state out of range for '{}'", cpd.variable())))?;
        }
        Ok(p)
    }
}

impl fmt::Display for BayesianNetwork {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for cpd in self.cpds.values() {
            writeln!(f, "{}", cpd)?;
        }
        Ok(())
    }

}


/// An implementation of the [builder pattern] for creating a `BayesianNetwork` by hand.
///
/// Variables must be added in topological order: the parents of a `Variable` must already be in
/// the network.
///
/// [builder pattern]: https://en.wikipedia.org/wiki/Builder_pattern
#[derive(Default)]
pub struct BayesianNetworkBuilder {

    /// The CPDs added so far, in insertion order
    cpds: IndexMap<String, Cpd>,

    /// The error state of the builder
    err: Option<BnetError>

}


impl BayesianNetworkBuilder {

    /// Construct a new `BayesianNetworkBuilder` representing an empty `BayesianNetwork`
    pub fn new() -> Self {
        BayesianNetworkBuilder {
            cpds: IndexMap::new(),
            err: None
        }
    }


    /// Add a `Variable` to the `BayesianNetwork`.
    ///
    /// # Args
    /// * `var`: the variable to add to the model
    /// * `parents`: the names of the parent variables, in the axis order of the CPD. The parents
    ///   must already be in the model.
    /// * `init`: the initialization mechanism for the CPD of `var` in the model.
    pub fn with_variable(mut self, var: &Variable, parents: &[&str], init: Initialization) -> Self {
        ///////////////////////////////////////////////////////////////////////
        // 1) if we are in an error state, do nothing
        if self.err.is_some() {
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 2) Check for error conditions
        if let Some(missing) = parents.iter().find(|p| !self.cpds.contains_key(**p)) {
            self.err = Some(BnetError::MissingParent(String::from(*missing)));
            return self;
        }

        if self.cpds.contains_key(var.name()) {
            self.err = Some(BnetError::DuplicateVariable(String::from(var.name())));
            return self;
        }

        ///////////////////////////////////////////////////////////////////////
        // 3) Build the CPD based on the initialization
        let parent_vars: Vec<Variable> = parents.iter()
                                                .filter_map(|p| self.cpds.get(*p).map(|c| c.variable().clone()))
                                                .collect();

        match init.build_cpd(var.clone(), parent_vars) {
            Ok(cpd) => { self.cpds.insert(String::from(var.name()), cpd); },
            Err(e) => self.err = Some(e)
        }

        self
    }


    /// Complete building the model.
    ///
    /// # Returns
    /// the `BayesianNetwork`, or the first error generated during the building process
    pub fn build(self) -> Result<BayesianNetwork> {
        if let Some(e) = self.err {
            return Err(e);
        }

        let names: Vec<&str> = self.cpds.keys().map(|k| k.as_str()).collect();
        let mut dag = Dag::new(&names)?;
        for (i, cpd) in self.cpds.values().enumerate() {
            for p in cpd.parents() {
                let from = dag.require(p.name())?;
                dag.add_edge(from, i)?;
            }
        }

        BayesianNetwork::new(dag, self.cpds.into_values().collect())
    }
}
