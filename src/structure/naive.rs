//! A fixed star topology rooted at a designated variable.

use crate::dag::Dag;
use crate::dataset::Dataset;
use crate::util::{BnetError, Result};
use super::{empty_dag, informative_columns, StructureLearner};

use tracing::info;

/// The naive Bayes structure: one edge from the root to every other variable, so the root is the
/// class and every other variable a feature that depends on it alone. Single-valued features get
/// no edge.
#[derive(Clone, Debug)]
pub struct NaiveBayes {
    root: String
}

impl NaiveBayes {

    pub fn new(root: &str) -> Self {
        NaiveBayes { root: String::from(root) }
    }

    pub fn root(&self) -> &str {
        &self.root
    }
}

impl StructureLearner for NaiveBayes {

    /// # Errors
    /// * `BnetError::EmptyDataset` if `data` has no records
    /// * `BnetError::UnknownVariable` if the root is not a column of `data`
    /// * `BnetError::DegenerateData` if the root takes a single value
    fn learn(&self, data: &Dataset) -> Result<Dag> {
        if data.is_empty() {
            return Err(BnetError::EmptyDataset);
        }

        let root = data.column_index(&self.root)
                       .ok_or_else(|| BnetError::UnknownVariable(self.root.clone()))?;
        data.check_informative(root)?;

        let mut dag = empty_dag(data)?;
        for c in informative_columns(data).into_iter().filter(|&c| c != root) {
            dag.add_edge(root, c)?;
        }

        info!(root = %self.root, edges = dag.num_edges(), "naive structure built");
        Ok(dag)
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::structure::tests::counted;

    #[test]
    fn star() {
        let data = counted(&["A", "R", "B"], &[([0, 0, 1], 3), ([1, 1, 0], 2)]);
        let dag = NaiveBayes::new("R").learn(&data).unwrap();

        assert_eq!(
            vec![(String::from("R"), String::from("A")), (String::from("R"), String::from("B"))],
            dag.named_edges()
        );
    }

    #[test]
    fn errors() {
        let data = counted(&["A", "R"], &[([0, 1], 3), ([1, 1], 2)]);
        assert_eq!(Err(BnetError::UnknownVariable(String::from("Z"))), NaiveBayes::new("Z").learn(&data));
        assert_eq!(Err(BnetError::DegenerateData(String::from("R"))), NaiveBayes::new("R").learn(&data));
    }

    #[test]
    fn single_valued_features_are_skipped() {
        let data = counted(&["R", "A", "K"], &[([0, 0, 1], 3), ([1, 1, 1], 2)]);
        let dag = NaiveBayes::new("R").learn(&data).unwrap();
        assert_eq!(vec![(0, 1)], dag.edges());
    }

}
