//! The PC algorithm: constraint-based structure search.

use crate::dag::Dag;
use crate::dataset::Dataset;
use crate::util::{BnetError, Result};
use super::independence::chi_square;
use super::{empty_dag, informative_columns, StructureLearner};

use itertools::Itertools;
use tracing::{debug, info};

use std::collections::{BTreeMap, BTreeSet};

/// Constraint-based search (the "stable" PC variant).
///
/// Starting from the complete graph over the informative columns, the edge `x - y` is removed as
/// soon as a chi-squared test finds `x` independent of `y` given some subset of the neighbours of
/// `x` or of `y`. Subsets grow from size zero up to `max_cond_vars`, and the neighbourhoods used
/// at each size are a snapshot taken before any removal at that size, so the skeleton does not
/// depend on the order the pairs are visited in.
///
/// The skeleton is then oriented: first the v-structures `x -> z <- y` where `z` is not in the
/// separating set of `x` and `y`, then Meek's rules R1 to R3 until nothing changes. An orientation
/// that would close a directed cycle is skipped. Edges still undirected at the end point from the
/// lexically lower name to the higher one, or the other way if that would close a cycle.
#[derive(Clone, Debug)]
pub struct PcSearch {

    /// Significance level of the independence tests
    significance_alpha: f64,

    /// Largest conditioning set tried
    max_cond_vars: usize

}

/// A partially directed graph used while orienting the skeleton
struct Pdag {

    /// The oriented edges
    dag: Dag,

    /// Undirected edges, stored as `(low index, high index)`
    undirected: BTreeSet<(usize, usize)>

}

impl Pdag {

    fn key(a: usize, b: usize) -> (usize, usize) {
        if a < b { (a, b) } else { (b, a) }
    }

    fn is_undirected(&self, a: usize, b: usize) -> bool {
        self.undirected.contains(&Pdag::key(a, b))
    }

    fn adjacent(&self, a: usize, b: usize) -> bool {
        self.is_undirected(a, b) || self.dag.has_edge(a, b) || self.dag.has_edge(b, a)
    }

    /// Orient the undirected edge `a - b` as `a -> b`, unless that closes a cycle
    fn orient(&mut self, a: usize, b: usize) -> bool {
        if !self.is_undirected(a, b) || self.dag.add_edge(a, b).is_err() {
            return false;
        }
        self.undirected.remove(&Pdag::key(a, b));
        debug!(from = self.dag.name(a), to = self.dag.name(b), "oriented edge");
        true
    }

    fn neighbours(&self, a: usize) -> Vec<usize> {
        self.undirected
            .iter()
            .filter_map(|&(x, y)| if x == a { Some(y) } else if y == a { Some(x) } else { None })
            .collect()
    }

    /// Apply one round of Meek's rules, returning whether anything was oriented
    fn meek(&mut self) -> bool {
        let mut changed = false;
        let edges: Vec<(usize, usize)> = self.undirected.iter().cloned().collect();

        for (x, y) in edges {
            for (b, c) in [(x, y), (y, x)] {
                if !self.is_undirected(b, c) {
                    continue;
                }

                // R1: a -> b - c, a and c not adjacent
                let r1 = self.dag.parents(b).iter().any(|&a| a != c && !self.adjacent(a, c));

                // R2: b -> a -> c with b - c
                let r2 = self.dag.children(b).iter().any(|&a| self.dag.has_edge(a, c));

                // R3: b - a1 -> c, b - a2 -> c, b - c, a1 and a2 not adjacent
                let r3 = self.neighbours(b)
                             .into_iter()
                             .filter(|&a| a != c && self.dag.has_edge(a, c))
                             .tuple_combinations()
                             .any(|(a1, a2)| !self.adjacent(a1, a2));

                if (r1 || r2 || r3) && self.orient(b, c) {
                    changed = true;
                }
            }
        }

        changed
    }
}

impl PcSearch {

    pub fn new(significance_alpha: f64) -> Self {
        PcSearch { significance_alpha, max_cond_vars: 5 }
    }

    pub fn with_max_cond_vars(mut self, max_cond_vars: usize) -> Self {
        self.max_cond_vars = max_cond_vars;
        self
    }

    /// Learn the undirected skeleton and the separating set of every removed edge
    fn skeleton(&self, data: &Dataset) -> (BTreeSet<(usize, usize)>, BTreeMap<(usize, usize), Vec<usize>>) {
        let active = informative_columns(data);

        let mut adjacent: BTreeMap<usize, BTreeSet<usize>> = active.iter()
            .map(|&x| (x, active.iter().cloned().filter(|&y| y != x).collect()))
            .collect();
        let mut sepsets = BTreeMap::new();

        for size in 0..=self.max_cond_vars {
            let snapshot = adjacent.clone();
            let mut testable = false;

            let edges: Vec<(usize, usize)> = active.iter()
                                                   .tuple_combinations()
                                                   .map(|(&x, &y)| (x, y))
                                                   .filter(|(x, y)| adjacent[x].contains(y))
                                                   .collect();

            for (x, y) in edges {
                let from_x: Vec<usize> = snapshot[&x].iter().cloned().filter(|&n| n != y).collect();
                let from_y: Vec<usize> = snapshot[&y].iter().cloned().filter(|&n| n != x).collect();
                if from_x.len() < size && from_y.len() < size {
                    continue;
                }
                testable = true;

                let separating = from_x.into_iter()
                                       .combinations(size)
                                       .chain(from_y.into_iter().combinations(size))
                                       .find(|z| chi_square(data, x, y, z).independent(self.significance_alpha));

                if let Some(z) = separating {
                    debug!(
                        x = data.variables()[x].name(),
                        y = data.variables()[y].name(),
                        given = ?z.iter().map(|&c| data.variables()[c].name()).collect::<Vec<_>>(),
                        "removed edge"
                    );
                    if let Some(set) = adjacent.get_mut(&x) {
                        set.remove(&y);
                    }
                    if let Some(set) = adjacent.get_mut(&y) {
                        set.remove(&x);
                    }
                    sepsets.insert((x, y), z);
                }
            }

            if !testable {
                break;
            }
        }

        let skeleton = adjacent.iter()
                               .flat_map(|(&x, ys)| ys.iter().filter(move |&&y| x < y).map(move |&y| (x, y)))
                               .collect();
        (skeleton, sepsets)
    }
}

impl StructureLearner for PcSearch {

    fn learn(&self, data: &Dataset) -> Result<Dag> {
        if data.is_empty() {
            return Err(BnetError::EmptyDataset);
        }

        let (skeleton, sepsets) = self.skeleton(data);
        let mut pdag = Pdag { dag: empty_dag(data)?, undirected: skeleton };

        // v-structures x -> z <- y
        let n = data.num_columns();
        for z in 0..n {
            let nbrs = pdag.neighbours(z);
            for (&x, &y) in nbrs.iter().tuple_combinations() {
                if pdag.adjacent(x, y) {
                    continue;
                }
                let sepset = sepsets.get(&Pdag::key(x, y));
                if sepset.map_or(false, |s| !s.contains(&z)) {
                    pdag.orient(x, z);
                    pdag.orient(y, z);
                }
            }
        }

        while pdag.meek() {}

        // leftovers, in lexical order of names
        let mut rest: Vec<(usize, usize)> = pdag.undirected.iter().cloned().collect();
        rest.sort_by(|a, b| (pdag.dag.name(a.0), pdag.dag.name(a.1)).cmp(&(pdag.dag.name(b.0), pdag.dag.name(b.1))));
        for (a, b) in rest {
            let (lo, hi) = if pdag.dag.name(a) < pdag.dag.name(b) { (a, b) } else { (b, a) };
            if !pdag.orient(lo, hi) {
                pdag.orient(hi, lo);
            }
        }

        info!(edges = pdag.dag.num_edges(), removed = sepsets.len(), "pc search finished");

        Ok(pdag.dag)
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::structure::tests::{chain, collider, counted};

    #[test]
    fn chain_is_oriented_lexically() {
        let dag = PcSearch::new(0.05).learn(&chain()).unwrap();
        assert_eq!(vec![(0, 1), (1, 2)], dag.edges());
    }

    #[test]
    fn collider_is_found() {
        let dag = PcSearch::new(0.05).learn(&collider()).unwrap();
        assert_eq!(vec![(0, 1), (2, 1)], dag.edges());
    }

    #[test]
    fn independent_columns() {
        let data = counted(&["X", "Y"], &[([0, 0], 10), ([0, 1], 10), ([1, 0], 10), ([1, 1], 10)]);
        let dag = PcSearch::new(0.05).learn(&data).unwrap();
        assert_eq!(0, dag.num_edges());
    }

    #[test]
    fn no_conditioning() {
        // with unconditional tests only, A - C survives in the chain
        let dag = PcSearch::new(0.05).with_max_cond_vars(0).learn(&chain()).unwrap();
        assert_eq!(3, dag.num_edges());
        assert!(dag.validate().is_ok());
    }

    #[test]
    fn meek_rule_one() {
        // a collider A -> C <- B, with C -> D forced by R1
        let mut pdag = Pdag { dag: Dag::new(&["A", "B", "C", "D"]).unwrap(), undirected: BTreeSet::new() };
        pdag.dag.add_edge(0, 2).unwrap();
        pdag.dag.add_edge(1, 2).unwrap();
        pdag.undirected.insert((2, 3));

        assert!(pdag.meek());
        assert!(pdag.dag.has_edge(2, 3));
        assert!(pdag.undirected.is_empty());
        assert!(!pdag.meek());
    }

    #[test]
    fn meek_rule_two() {
        // A -> B -> C with A - C must become A -> C
        let mut pdag = Pdag { dag: Dag::new(&["A", "B", "C"]).unwrap(), undirected: BTreeSet::new() };
        pdag.dag.add_edge(0, 1).unwrap();
        pdag.dag.add_edge(1, 2).unwrap();
        pdag.undirected.insert((0, 2));

        assert!(pdag.meek());
        assert!(pdag.dag.has_edge(0, 2));
    }

    #[test]
    fn meek_rule_three() {
        // D - A, D - B, D - C, A -> C <- B, A and B not adjacent: D -> C
        let mut pdag = Pdag { dag: Dag::new(&["A", "B", "C", "D"]).unwrap(), undirected: BTreeSet::new() };
        pdag.dag.add_edge(0, 2).unwrap();
        pdag.dag.add_edge(1, 2).unwrap();
        pdag.undirected.extend([(0, 3), (1, 3), (2, 3)]);

        assert!(pdag.meek());
        assert!(pdag.dag.has_edge(3, 2));
        assert!(pdag.is_undirected(0, 3) && pdag.is_undirected(1, 3));
    }

}
