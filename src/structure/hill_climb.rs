//! Greedy hill climbing over DAG structures, with a tabu list.

use crate::dag::Dag;
use crate::dataset::Dataset;
use crate::score::{ScoreCache, ScoringMethod};
use crate::util::{BnetError, Result};
use super::{empty_dag, informative_columns, StructureLearner};

use tracing::{debug, info};

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One single-edge change to a `Dag`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Move {
    Add(usize, usize),
    Remove(usize, usize),
    Flip(usize, usize)
}

/// Greedy local search over structures.
///
/// Each iteration scores every legal edge addition, removal and reversal and applies the one that
/// improves the score the most. Only the node(s) whose parent set changes are re-scored. Candidates
/// are visited in lexical order of `(source name, target name)` and a move must beat the current
/// best strictly, so ties go to the lexically first edge and the search is reproducible.
///
/// The search stops when no move improves the score by at least `epsilon`, after `max_iter`
/// moves, or when the cancellation flag is raised. The structure is acyclic after every move.
#[derive(Clone, Debug)]
pub struct HillClimbSearch {

    /// The criterion to maximize
    scoring: ScoringMethod,

    /// Structure to start from, instead of the empty graph
    start: Option<Dag>,

    /// Edges that are always present
    fixed_edges: Vec<(String, String)>,

    /// Edges that are never added
    black_list: Vec<(String, String)>,

    /// Bound on the number of parents of any node
    max_indegree: Option<usize>,

    /// How many recent moves may not be undone
    tabu_length: usize,

    /// Smallest improvement worth a move
    epsilon: f64,

    /// Bound on the number of moves
    max_iter: usize,

    /// Raised by the caller to stop the search early
    cancel: Option<Arc<AtomicBool>>

}

impl HillClimbSearch {

    /// A search with the given criterion and default options
    pub fn new(scoring: ScoringMethod) -> Self {
        HillClimbSearch {
            scoring,
            start: None,
            fixed_edges: Vec::new(),
            black_list: Vec::new(),
            max_indegree: None,
            tabu_length: 100,
            epsilon: 1e-4,
            max_iter: 1_000_000,
            cancel: None
        }
    }

    /// Start from `dag` rather than the empty graph
    pub fn with_start(mut self, dag: Dag) -> Self {
        self.start = Some(dag);
        self
    }

    pub fn with_fixed_edges<S: AsRef<str>>(mut self, edges: &[(S, S)]) -> Self {
        self.fixed_edges = edges.iter().map(|(u, v)| (String::from(u.as_ref()), String::from(v.as_ref()))).collect();
        self
    }

    pub fn with_black_list<S: AsRef<str>>(mut self, edges: &[(S, S)]) -> Self {
        self.black_list = edges.iter().map(|(u, v)| (String::from(u.as_ref()), String::from(v.as_ref()))).collect();
        self
    }

    pub fn with_max_indegree(mut self, max_indegree: Option<usize>) -> Self {
        self.max_indegree = max_indegree;
        self
    }

    pub fn with_tabu_length(mut self, tabu_length: usize) -> Self {
        self.tabu_length = tabu_length;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Stop the search (keeping the current structure) once `flag` is set
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Resolve named edges against the nodes of `dag`
    fn resolve(dag: &Dag, edges: &[(String, String)]) -> Result<BTreeSet<(usize, usize)>> {
        edges.iter().map(|(u, v)| Ok((dag.require(u)?, dag.require(v)?))).collect()
    }

    /// The initial structure: the start graph (matched by name) plus the fixed edges
    fn initial(&self, data: &Dataset, fixed: &BTreeSet<(usize, usize)>) -> Result<Dag> {
        let mut dag = empty_dag(data)?;

        if let Some(start) = &self.start {
            for (u, v) in start.named_edges() {
                let from = dag.index_of(&u).ok_or_else(|| BnetError::IncompatibleStructure(u.clone()))?;
                let to = dag.index_of(&v).ok_or_else(|| BnetError::IncompatibleStructure(v.clone()))?;
                dag.add_edge(from, to)?;
            }
        }

        for &(u, v) in fixed {
            if !dag.has_edge(u, v) {
                dag.add_edge(u, v)?;
            }
        }

        Ok(dag)
    }

    fn cancelled(&self) -> bool {
        self.cancel.as_ref().map_or(false, |c| c.load(Ordering::Relaxed))
    }

    fn indegree_ok(&self, dag: &Dag, node: usize) -> bool {
        self.max_indegree.map_or(true, |k| dag.parents(node).len() < k)
    }

    /// Find the legal move with the largest score improvement
    fn best_move(
        &self,
        dag: &Dag,
        cache: &mut ScoreCache,
        pairs: &[(usize, usize)],
        fixed: &BTreeSet<(usize, usize)>,
        black_list: &BTreeSet<(usize, usize)>,
        tabu: &VecDeque<Move>
    ) -> Option<(Move, f64)> {
        let mut best: Option<(Move, f64)> = None;
        let mut consider = |m: Move, delta: f64| {
            if best.map_or(true, |(_, d)| delta > d) {
                best = Some((m, delta));
            }
        };

        for &(u, v) in pairs {
            if !dag.has_edge(u, v) && !dag.has_edge(v, u) {
                // addition
                if black_list.contains(&(u, v))
                    || tabu.contains(&Move::Remove(u, v))
                    || !self.indegree_ok(dag, v)
                    || dag.would_create_cycle(u, v)
                {
                    continue;
                }

                let old = dag.parents(v);
                let mut new = old.clone();
                new.insert(u);
                let delta = cache.local_score(v, &new) - cache.local_score(v, old);
                consider(Move::Add(u, v), delta);

            } else if dag.has_edge(u, v) && !fixed.contains(&(u, v)) {
                // removal
                let old_v = dag.parents(v);
                let mut new_v = old_v.clone();
                new_v.remove(&u);
                let removal = cache.local_score(v, &new_v) - cache.local_score(v, old_v);

                if !tabu.contains(&Move::Add(u, v)) {
                    consider(Move::Remove(u, v), removal);
                }

                // reversal
                if black_list.contains(&(v, u))
                    || tabu.contains(&Move::Flip(v, u))
                    || !self.indegree_ok(dag, u)
                    || dag.reversal_creates_cycle(u, v)
                {
                    continue;
                }

                let old_u = dag.parents(u);
                let mut new_u = old_u.clone();
                new_u.insert(v);
                let delta = removal + cache.local_score(u, &new_u) - cache.local_score(u, old_u);
                consider(Move::Flip(u, v), delta);
            }
        }

        best
    }
}

impl StructureLearner for HillClimbSearch {

    fn learn(&self, data: &Dataset) -> Result<Dag> {
        if data.is_empty() {
            return Err(BnetError::EmptyDataset);
        }

        let names = empty_dag(data)?;
        let fixed = Self::resolve(&names, &self.fixed_edges)?;
        let black_list = Self::resolve(&names, &self.black_list)?;

        let mut dag = self.initial(data, &fixed)?;
        let mut cache = ScoreCache::new(data, self.scoring, &dag)?;

        // every ordered pair of informative columns, in lexical order of names
        let active = informative_columns(data);
        let mut pairs: Vec<(usize, usize)> = active.iter()
                                                   .flat_map(|&u| active.iter().map(move |&v| (u, v)))
                                                   .filter(|(u, v)| u != v)
                                                   .collect();
        pairs.sort_by(|a, b| (dag.name(a.0), dag.name(a.1)).cmp(&(dag.name(b.0), dag.name(b.1))));

        let mut tabu: VecDeque<Move> = VecDeque::with_capacity(self.tabu_length);
        let mut iterations = 0;

        while iterations < self.max_iter {
            if self.cancelled() {
                info!(iterations, "structure search cancelled");
                break;
            }

            let (best, delta) = match self.best_move(&dag, &mut cache, &pairs, &fixed, &black_list, &tabu) {
                Some((m, d)) if d >= self.epsilon => (m, d),
                _ => break
            };

            match best {
                Move::Add(u, v) => dag.add_edge(u, v)?,
                Move::Remove(u, v) => { dag.remove_edge(u, v); },
                Move::Flip(u, v) => dag.reverse_edge(u, v)?
            }
            debug!(iteration = iterations, ?best, delta, "applied move");

            if self.tabu_length > 0 {
                if tabu.len() == self.tabu_length {
                    tabu.pop_front();
                }
                tabu.push_back(best);
            }
            iterations += 1;
        }

        info!(
            iterations,
            edges = dag.num_edges(),
            score = cache.total(&dag),
            scored = cache.len(),
            "hill climbing finished"
        );

        Ok(dag)
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::structure::tests::{chain, counted};
    use crate::variable::Variable;
    use proptest::prelude::*;

    fn skeleton(dag: &Dag) -> BTreeSet<(String, String)> {
        dag.named_edges()
           .into_iter()
           .map(|(u, v)| if u < v { (u, v) } else { (v, u) })
           .collect()
    }

    fn pair(u: &str, v: &str) -> (String, String) {
        (String::from(u), String::from(v))
    }

    #[test]
    fn recovers_chain_skeleton() {
        let data = chain();
        let dag = HillClimbSearch::new(ScoringMethod::Bic).learn(&data).unwrap();

        assert_eq!(2, dag.num_edges());
        let expected: BTreeSet<_> = vec![pair("A", "B"), pair("B", "C")].into_iter().collect();
        assert_eq!(expected, skeleton(&dag));
    }

    #[test]
    fn deterministic() {
        let data = chain();
        let search = HillClimbSearch::new(ScoringMethod::K2);
        assert_eq!(search.learn(&data).unwrap(), search.learn(&data).unwrap());
    }

    #[test]
    fn iteration_cap() {
        let data = chain();
        let dag = HillClimbSearch::new(ScoringMethod::Bic).with_max_iter(1).learn(&data).unwrap();
        assert_eq!(1, dag.num_edges());
        assert_eq!(BTreeSet::from([pair("A", "B")]), skeleton(&dag));
    }

    #[test]
    fn cancelled_search_returns_start() {
        let data = chain();
        let flag = Arc::new(AtomicBool::new(true));
        let start = Dag::from_edges(&["A", "B", "C"], &[("C", "A")]).unwrap();

        let dag = HillClimbSearch::new(ScoringMethod::Bic)
            .with_start(start.clone())
            .with_cancellation(flag)
            .learn(&data)
            .unwrap();
        assert_eq!(start, dag);
    }

    #[test]
    fn fixed_and_black_listed_edges() {
        let data = chain();
        let dag = HillClimbSearch::new(ScoringMethod::Bic)
            .with_fixed_edges(&[("C", "A")])
            .with_black_list(&[("A", "B"), ("B", "A")])
            .learn(&data)
            .unwrap();

        assert!(dag.has_edge(2, 0));
        assert!(!dag.has_edge(0, 1) && !dag.has_edge(1, 0));
    }

    #[test]
    fn indegree_bound() {
        let data = chain();
        let dag = HillClimbSearch::new(ScoringMethod::Bic).with_max_indegree(Some(0)).learn(&data).unwrap();
        assert_eq!(0, dag.num_edges());
    }

    #[test]
    fn unknown_edge_names() {
        let data = chain();
        let res = HillClimbSearch::new(ScoringMethod::Bic).with_black_list(&[("A", "Z")]).learn(&data);
        assert_eq!(Err(BnetError::UnknownVariable(String::from("Z"))), res);

        let start = Dag::from_edges(&["A", "Q"], &[("A", "Q")]).unwrap();
        let res = HillClimbSearch::new(ScoringMethod::Bic).with_start(start).learn(&data);
        assert_eq!(Err(BnetError::IncompatibleStructure(String::from("Q"))), res);
    }

    #[test]
    fn single_valued_columns_stay_isolated() {
        let data = counted(&["A", "B", "K"], &[([0, 0, 0], 40), ([1, 1, 0], 40), ([0, 1, 0], 5)]);
        let dag = HillClimbSearch::new(ScoringMethod::Bic).learn(&data).unwrap();

        assert_eq!(3, dag.num_nodes());
        assert_eq!(1, dag.num_edges());
        assert!(dag.parents(2).is_empty() && dag.children(2).is_empty());
    }

    #[test]
    fn empty_dataset() {
        let data = Dataset::new(vec![Variable::binary("A")], vec![]).unwrap();
        assert_eq!(Err(BnetError::EmptyDataset), HillClimbSearch::new(ScoringMethod::Bic).learn(&data));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn always_acyclic(rows in proptest::collection::vec((0usize..2, 0usize..2, 0usize..3, 0usize..2), 1..60)) {
            let vars = vec![
                Variable::binary("W"), Variable::binary("X"), Variable::discrete("Y", 3), Variable::binary("Z")
            ];
            let rows: Vec<Vec<usize>> = rows.into_iter().map(|(a, b, c, d)| vec![a, b, c, d]).collect();
            let data = Dataset::new(vars, rows).unwrap();

            for method in [ScoringMethod::Bic, ScoringMethod::K2, ScoringMethod::Bdeu { equivalent_sample_size: 5.0 }] {
                let dag = HillClimbSearch::new(method).learn(&data).unwrap();
                prop_assert!(dag.validate().is_ok());
                prop_assert_eq!(4, dag.num_nodes());
            }
        }
    }

}
