//! A plain view of the structure of a network, for rendering.

use serde::{Deserialize, Serialize};

/// A directed edge with a strength
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: String,
    pub target: String,
    pub weight: f64
}

/// The nodes and weighted edges of a `BayesianNetwork`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<WeightedEdge>
}

impl NetworkGraph {

    /// The edges into `node`
    pub fn incoming<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a WeightedEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == node)
    }

    /// The edges out of `node`
    pub fn outgoing<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a WeightedEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == node)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn neighbourhoods() {
        let edge = |s: &str, t: &str| WeightedEdge { source: s.into(), target: t.into(), weight: 1.0 };
        let graph = NetworkGraph {
            nodes: vec!["R".into(), "A".into(), "B".into()],
            edges: vec![edge("R", "A"), edge("R", "B")]
        };

        assert_eq!(2, graph.outgoing("R").count());
        assert_eq!(0, graph.incoming("R").count());
        assert_eq!(vec![&graph.edges[1]], graph.incoming("B").collect::<Vec<_>>());
    }

}
