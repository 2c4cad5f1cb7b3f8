//! Defines a `Dag`, the structure of a Bayesian network.
//!
//! Nodes are identified by name and by their index in insertion order. Edges are stored as the
//! parent set of each node; every editing operation refuses to introduce a directed cycle, so a
//! `Dag` built through this API always has a topological order.

use crate::util::{BnetError, Result};

use serde::{Deserialize, Serialize};

use std::collections::BTreeSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dag {

    /// The name of each node
    nodes: Vec<String>,

    /// `parents[i]` holds the indices of the nodes with an edge into node `i`
    parents: Vec<BTreeSet<usize>>

}

impl Dag {

    /// Construct an empty (edgeless) `Dag` over the given nodes.
    ///
    /// # Errors
    /// * `BnetError::DuplicateVariable` if a name is repeated
    pub fn new<S: AsRef<str>>(nodes: &[S]) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for n in nodes {
            if !seen.insert(n.as_ref()) {
                return Err(BnetError::DuplicateVariable(String::from(n.as_ref())));
            }
        }

        Ok(Dag {
            nodes: nodes.iter().map(|n| String::from(n.as_ref())).collect(),
            parents: nodes.iter().map(|_| BTreeSet::new()).collect()
        })
    }

    /// Construct a `Dag` over `nodes` with the given named edges `(parent, child)`.
    ///
    /// # Errors
    /// * `BnetError::UnknownVariable` if an edge names a node not in `nodes`
    /// * `BnetError::InvalidStructure` if the edges contain a directed cycle
    pub fn from_edges<S, T>(nodes: &[S], edges: &[(T, T)]) -> Result<Self>
        where S: AsRef<str>,
              T: AsRef<str>
    {
        let mut dag = Dag::new(nodes)?;
        for (from, to) in edges {
            let u = dag.require(from.as_ref())?;
            let v = dag.require(to.as_ref())?;
            dag.add_edge(u, v)?;
        }
        Ok(dag)
    }

    /// The names of the nodes, in index order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.parents.iter().map(|p| p.len()).sum()
    }

    /// Lookup the index of a node by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n == name)
    }

    /// Lookup the index of a node by name, failing with `BnetError::UnknownVariable`
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| BnetError::UnknownVariable(String::from(name)))
    }

    /// The name of node `idx`
    pub fn name(&self, idx: usize) -> &str {
        &self.nodes[idx]
    }

    /// The parent set of node `idx`
    pub fn parents(&self, idx: usize) -> &BTreeSet<usize> {
        &self.parents[idx]
    }

    /// The names of the parents of the named node, in index order
    pub fn parent_names(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.require(name)?;
        Ok(self.parents[idx].iter().map(|&p| self.nodes[p].as_str()).collect())
    }

    /// The children of node `idx`, in index order
    pub fn children(&self, idx: usize) -> Vec<usize> {
        (0..self.nodes.len()).filter(|&c| self.parents[c].contains(&idx)).collect()
    }

    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        self.parents[to].contains(&from)
    }

    /// All edges `(parent, child)`, ordered by parent index, then child index
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self.parents
                                                 .iter()
                                                 .enumerate()
                                                 .flat_map(|(c, ps)| ps.iter().map(move |&p| (p, c)))
                                                 .collect();
        edges.sort();
        edges
    }

    /// All edges as `(parent name, child name)` pairs
    pub fn named_edges(&self) -> Vec<(String, String)> {
        self.edges()
            .into_iter()
            .map(|(p, c)| (self.nodes[p].clone(), self.nodes[c].clone()))
            .collect()
    }

    /// Check if there is a directed path `from ~> to` (a node always reaches itself).
    pub fn has_path(&self, from: usize, to: usize) -> bool {
        self.reaches(from, to, None)
    }

    /// Check if adding the edge `from -> to` would close a directed cycle
    pub fn would_create_cycle(&self, from: usize, to: usize) -> bool {
        self.has_path(to, from)
    }

    /// Check if reversing the existing edge `from -> to` would close a directed cycle, which is
    /// the case when `to` is reachable from `from` along some other path.
    pub fn reversal_creates_cycle(&self, from: usize, to: usize) -> bool {
        self.reaches(from, to, Some((from, to)))
    }

    /// Add the edge `from -> to`.
    ///
    /// # Errors
    /// * `BnetError::InvalidStructure` if the edge is a self loop or would close a cycle. The
    ///   `Dag` is left unchanged.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<()> {
        if self.would_create_cycle(from, to) {
            return Err(BnetError::InvalidStructure(format!("{} -> {}", self.nodes[from], self.nodes[to])));
        }
        self.parents[to].insert(from);
        Ok(())
    }

    /// Remove the edge `from -> to`, returning whether it was present
    pub fn remove_edge(&mut self, from: usize, to: usize) -> bool {
        self.parents[to].remove(&from)
    }

    /// Replace the edge `from -> to` with `to -> from`.
    ///
    /// # Errors
    /// * `BnetError::InvalidStructure` if the edge is absent or the reversal would close a cycle.
    ///   The `Dag` is left unchanged.
    pub fn reverse_edge(&mut self, from: usize, to: usize) -> Result<()> {
        if !self.has_edge(from, to) || self.reversal_creates_cycle(from, to) {
            return Err(BnetError::InvalidStructure(format!("{} <- {}", self.nodes[from], self.nodes[to])));
        }
        self.parents[to].remove(&from);
        self.parents[from].insert(to);
        Ok(())
    }

    /// Compute a topological order of the nodes. Among the nodes ready at each step the lowest
    /// index comes first, so the order is deterministic.
    ///
    /// # Errors
    /// * `BnetError::InvalidStructure` if the graph has a directed cycle. This can only happen
    ///   to a `Dag` that was deserialized rather than built through the editing API.
    pub fn topological_order(&self) -> Result<Vec<usize>> {
        let n = self.nodes.len();
        let mut indegree: Vec<usize> = self.parents.iter().map(|p| p.len()).collect();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for child in self.children(next) {
                indegree[child] -= 1;
                if indegree[child] == 0 {
                    ready.insert(child);
                }
            }
        }

        if order.len() < n {
            // any node left over sits on (or downstream of) a cycle
            let stuck = (0..n).find(|i| !order.contains(i)).unwrap_or(0);
            return Err(BnetError::InvalidStructure(self.nodes[stuck].clone()));
        }

        Ok(order)
    }

    /// Check the structural invariants: parent indices in range, no self loops, no cycles.
    pub fn validate(&self) -> Result<()> {
        if self.parents.len() != self.nodes.len() {
            return Err(BnetError::InvalidStructure(String::from("parent sets do not match nodes")));
        }
        for (c, ps) in self.parents.iter().enumerate() {
            if ps.iter().any(|&p| p >= self.nodes.len() || p == c) {
                return Err(BnetError::InvalidStructure(self.nodes[c].clone()));
            }
        }
        self.topological_order().map(|_| ())
    }

    /// The ancestors of the given nodes, including the nodes themselves
    pub fn ancestors(&self, of: &[usize]) -> BTreeSet<usize> {
        let mut seen: BTreeSet<usize> = BTreeSet::new();
        let mut stack: Vec<usize> = of.to_vec();
        while let Some(v) = stack.pop() {
            if seen.insert(v) {
                stack.extend(self.parents[v].iter().cloned());
            }
        }
        seen
    }

    /// Depth first search backwards from `to` along parent links, optionally ignoring one edge
    fn reaches(&self, from: usize, to: usize, skip: Option<(usize, usize)>) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![to];

        while let Some(v) = stack.pop() {
            if v == from {
                return true;
            }
            if seen[v] {
                continue;
            }
            seen[v] = true;

            for &p in self.parents[v].iter() {
                if skip == Some((p, v)) {
                    continue;
                }
                stack.push(p);
            }
        }

        false
    }
}
