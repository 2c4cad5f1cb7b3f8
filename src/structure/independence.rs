//! Conditional independence testing with Pearson's chi-squared statistic.

use crate::dag::Dag;
use crate::dataset::Dataset;
use crate::util::{BnetError, Result};

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::{debug, info};

use std::collections::BTreeMap;

/// Smallest p-value used when converting to an edge weight
pub const MIN_P_VALUE: f64 = 1e-300;

/// The outcome of one chi-squared test
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64
}

impl ChiSquareResult {

    /// Check if the test fails to reject independence at level `alpha`
    pub fn independent(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// The observed cells and margins of one `x` by `y` contingency table
#[derive(Default)]
struct Stratum {
    n: f64,
    cells: BTreeMap<(usize, usize), f64>,
    rows: BTreeMap<usize, f64>,
    cols: BTreeMap<usize, f64>
}

impl Stratum {

    fn add(&mut self, i: usize, k: usize) {
        self.n += 1.0;
        *self.cells.entry((i, k)).or_insert(0.0) += 1.0;
        *self.rows.entry(i).or_insert(0.0) += 1.0;
        *self.cols.entry(k).or_insert(0.0) += 1.0;
    }

    /// `sum (O - E)^2 / E` over the cells with non-empty margins. Those cells have `sum O = sum E
    /// = n`, so this is `sum O^2 / E - n` and only the observed cells are visited.
    fn statistic(&self) -> f64 {
        let total: f64 = self.cells.iter().filter_map(|(&(i, k), &observed)| {
            let expected = self.rows.get(&i)? * self.cols.get(&k)? / self.n;
            Some(observed * observed / expected)
        }).sum();

        (total - self.n).max(0.0)
    }

    fn dof(&self) -> usize {
        self.rows.len().saturating_sub(1) * self.cols.len().saturating_sub(1)
    }
}

/// Test `x` independent of `y` given `z` (all dataset columns).
///
/// The records are split into one stratum per joint configuration of `z` that occurs in the data.
/// Within each stratum the rows and columns of the `x` by `y` contingency table with no records
/// are dropped, the table contributes `sum (O - E)^2 / E` to the statistic and
/// `(r' - 1)(c' - 1)` degrees of freedom. With no degrees of freedom at all the test has no power
/// and the p-value is one.
pub fn chi_square(data: &Dataset, x: usize, y: usize, z: &[usize]) -> ChiSquareResult {
    let (cx, cy) = (data.column(x), data.column(y));

    let mut strata: BTreeMap<Vec<usize>, Stratum> = BTreeMap::new();
    for r in 0..data.len() {
        let config: Vec<usize> = z.iter().map(|&c| data.column(c)[r]).collect();
        strata.entry(config).or_default().add(cx[r], cy[r]);
    }

    let statistic: f64 = strata.values().map(Stratum::statistic).sum();
    let dof: usize = strata.values().map(Stratum::dof).sum();

    let p_value = if dof == 0 {
        1.0
    } else {
        ChiSquared::new(dof as f64).map_or(1.0, |d| d.sf(statistic))
    };

    ChiSquareResult { statistic, dof, p_value }
}


/// The chi-squared test of one edge of a learned structure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeTest {
    pub source: String,
    pub target: String,
    pub statistic: f64,
    pub dof: usize,
    pub p_value: f64
}

impl EdgeTest {

    /// Strength of the edge: `-log10(p)`, with `p` clamped to `MIN_P_VALUE`
    pub fn weight(&self) -> f64 {
        -self.p_value.max(MIN_P_VALUE).log10()
    }
}

/// Test every edge `parent -> child` of `dag` for `child` independent of `parent` given the other
/// parents of `child`.
///
/// # Errors
/// * `BnetError::EmptyDataset` if `data` has no records
/// * `BnetError::IncompatibleStructure` if a node of `dag` has no column in `data`
pub fn test_edges(dag: &Dag, data: &Dataset) -> Result<Vec<EdgeTest>> {
    if data.is_empty() {
        return Err(BnetError::EmptyDataset);
    }

    let columns = dag.nodes()
                     .iter()
                     .map(|n| data.column_index(n).ok_or_else(|| BnetError::IncompatibleStructure(n.clone())))
                     .collect::<Result<Vec<usize>>>()?;

    let tests = dag.edges().into_iter().map(|(p, c)| {
        let given: Vec<usize> = dag.parents(c).iter().filter(|&&o| o != p).map(|&o| columns[o]).collect();
        let res = chi_square(data, columns[c], columns[p], &given);

        debug!(source = dag.name(p), target = dag.name(c), p_value = res.p_value, "edge test");

        EdgeTest {
            source: String::from(dag.name(p)),
            target: String::from(dag.name(c)),
            statistic: res.statistic,
            dof: res.dof,
            p_value: res.p_value
        }
    }).collect();

    Ok(tests)
}

/// Remove the edges of `dag` whose test has a p-value above `alpha`.
///
/// # Returns
/// the tests of the removed edges
pub fn prune(dag: &mut Dag, tests: &[EdgeTest], alpha: f64) -> Vec<EdgeTest> {
    let mut removed = Vec::new();

    for t in tests.iter().filter(|t| t.p_value > alpha) {
        if let (Some(u), Some(v)) = (dag.index_of(&t.source), dag.index_of(&t.target)) {
            if dag.remove_edge(u, v) {
                info!(source = %t.source, target = %t.target, p_value = t.p_value, "pruned edge");
                removed.push(t.clone());
            }
        }
    }

    removed
}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::structure::tests::{counted, wide};

    #[test]
    fn two_by_two() {
        let data = counted(&["X", "Y"], &[([0, 0], 10), ([0, 1], 20), ([1, 0], 30), ([1, 1], 40)]);
        let res = chi_square(&data, 0, 1, &[]);

        let expected = 4.0 / 12.0 + 4.0 / 18.0 + 4.0 / 28.0 + 4.0 / 42.0;
        assert!((expected - res.statistic).abs() < 1e-9);
        assert_eq!(1, res.dof);
        assert!(res.p_value > 0.37 && res.p_value < 0.38, "p = {}", res.p_value);
        assert!(res.independent(0.05));
    }

    #[test]
    fn exact_independence() {
        let data = counted(&["X", "Y"], &[([0, 0], 10), ([0, 1], 30), ([1, 0], 20), ([1, 1], 60)]);
        let res = chi_square(&data, 0, 1, &[]);
        assert!(res.statistic.abs() < 1e-9);
        assert!((1.0 - res.p_value).abs() < 1e-9);
    }

    #[test]
    fn conditioning_explains_dependence() {
        // X and Y are copies of Z, flipped 10% of the time each
        let data = counted(&["X", "Y", "Z"], &[
            ([0, 0, 0], 81), ([0, 1, 0], 9), ([1, 0, 0], 9), ([1, 1, 0], 1),
            ([1, 1, 1], 81), ([1, 0, 1], 9), ([0, 1, 1], 9), ([0, 0, 1], 1),
        ]);

        assert!(chi_square(&data, 0, 1, &[]).p_value < 1e-6);

        let res = chi_square(&data, 0, 1, &[2]);
        assert_eq!(2, res.dof);
        assert!(res.statistic.abs() < 1e-9);
        assert!(res.independent(0.05));
    }

    #[test]
    fn empty_margins_reduce_dof() {
        // Y never takes its second state: no degrees of freedom, no evidence against independence
        let data = counted(&["X", "Y"], &[([0, 0], 10), ([1, 0], 5)]);
        let res = chi_square(&data, 0, 1, &[]);
        assert_eq!(0, res.dof);
        assert_eq!(1.0, res.p_value);
    }

    #[test]
    fn many_conditioning_configurations() {
        // 40^5 conditioning configurations, of which only 40 occur
        let data = wide(7, 40, 50);
        let res = chi_square(&data, 0, 1, &[2, 3, 4, 5, 6]);
        assert_eq!(0, res.dof);
        assert_eq!(0.0, res.statistic);
        assert_eq!(1.0, res.p_value);

        // without conditioning, x and y determine each other: every observed cell contributes
        // n = 50 to sum O^2 / E
        let res = chi_square(&data, 0, 1, &[]);
        assert_eq!(39 * 39, res.dof);
        assert!((40.0 * 50.0 - 50.0 - res.statistic).abs() < 1e-9);
        assert!(res.p_value < 1e-6);
    }

    #[test]
    fn edge_tests_and_pruning() {
        // Y copies X; Z is independent noise
        let data = counted(&["X", "Y", "Z"], &[
            ([0, 0, 0], 25), ([0, 0, 1], 25), ([1, 1, 0], 25), ([1, 1, 1], 25),
        ]);
        let mut dag = Dag::from_edges(&["X", "Y", "Z"], &[("X", "Y"), ("X", "Z")]).unwrap();

        let tests = test_edges(&dag, &data).unwrap();
        assert_eq!(2, tests.len());
        assert_eq!(("X", "Y"), (tests[0].source.as_str(), tests[0].target.as_str()));
        assert!(tests[0].p_value < 1e-6);
        assert!(tests[0].weight() > 6.0);
        assert_eq!(1.0, tests[1].p_value);
        assert_eq!(0.0, tests[1].weight());

        let removed = prune(&mut dag, &tests, 0.05);
        assert_eq!(1, removed.len());
        assert_eq!("Z", removed[0].target);
        assert_eq!(vec![(0, 1)], dag.edges());
    }

    #[test]
    fn weights_are_clamped() {
        let t = EdgeTest { source: "A".into(), target: "B".into(), statistic: 1e6, dof: 1, p_value: 0.0 };
        assert!((300.0 - t.weight()).abs() < 1e-9);
    }

}
