//! Defines a `Dataset`: an ordered collection of complete, categorical records.
//!
//! Records are stored column-major as state indices into each column's `Variable`, which keeps
//! the counting passes performed by the scores, the estimators and the independence tests cheap.

use crate::util::{BnetError, Result};
use crate::variable::{Assignment, Variable};

use ndarray::prelude as nd;
use ndarray::ArrayD;

use std::collections::{BTreeMap, BTreeSet};

/// The largest number of entries a dense count table may have
pub const MAX_TABLE_ENTRIES: usize = 1 << 26;

#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {

    /// One `Variable` per column, in column order
    variables: Vec<Variable>,

    /// `columns[c][r]` is the state index of column `c` in record `r`
    columns: Vec<Vec<usize>>,

    /// The number of records
    len: usize

}

impl Dataset {

    /// Construct a `Dataset` from pre-encoded records.
    ///
    /// # Args
    /// * `variables`: one `Variable` per column
    /// * `rows`: the records, each holding one state index per column
    ///
    /// # Errors
    /// * `BnetError::DuplicateVariable` if two columns share a name
    /// * `BnetError::MalformedRecord` if a record does not have one value per column
    /// * `BnetError::UnknownState` if a value is outside its column's domain
    pub fn new(variables: Vec<Variable>, rows: Vec<Vec<usize>>) -> Result<Self> {
        check_unique(&variables)?;

        let mut columns: Vec<Vec<usize>> = variables.iter().map(|_| Vec::with_capacity(rows.len())).collect();

        for (r, row) in rows.iter().enumerate() {
            if row.len() != variables.len() {
                return Err(BnetError::MalformedRecord { row: r, expected: variables.len(), found: row.len() });
            }

            for (c, &val) in row.iter().enumerate() {
                if val >= variables[c].cardinality() {
                    return Err(BnetError::UnknownState {
                        variable: String::from(variables[c].name()),
                        state: val.to_string()
                    });
                }
                columns[c].push(val);
            }
        }

        Ok(Dataset { variables, columns, len: rows.len() })
    }

    /// Construct a `Dataset` from textual records. The domain of each column is the sorted set of
    /// distinct values observed in it.
    ///
    /// # Errors
    /// * `BnetError::DuplicateVariable` if two columns share a name
    /// * `BnetError::MalformedRecord` if a record does not have one value per column
    pub fn from_records<S, T>(names: &[S], records: &[Vec<T>]) -> Result<Self>
        where S: AsRef<str>,
              T: AsRef<str>
    {
        for (r, rec) in records.iter().enumerate() {
            if rec.len() != names.len() {
                return Err(BnetError::MalformedRecord { row: r, expected: names.len(), found: rec.len() });
            }
        }

        let variables: Vec<Variable> = names.iter().enumerate().map(|(c, name)| {
            let domain: BTreeSet<&str> = records.iter().map(|rec| rec[c].as_ref()).collect();
            let states: Vec<&str> = domain.into_iter().collect();
            Variable::new(name.as_ref(), &states)
        }).collect();

        check_unique(&variables)?;

        let columns: Vec<Vec<usize>> = variables.iter().enumerate().map(|(c, var)| {
            // every value was used to build the domain, so the lookup always succeeds
            records.iter()
                   .map(|rec| var.state_index(rec[c].as_ref()).unwrap_or(0))
                   .collect()
        }).collect();

        Ok(Dataset { variables, columns, len: records.len() })
    }

    /// The number of records
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of columns
    pub fn num_columns(&self) -> usize {
        self.variables.len()
    }

    /// The `Variable` of every column, in column order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Lookup the column of a `Variable` by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name() == name)
    }

    /// Lookup a `Variable` by name
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    /// The state indices of column `c`
    pub fn column(&self, c: usize) -> &[usize] {
        &self.columns[c]
    }

    /// Get record `r` as an `Assignment`
    pub fn record(&self, r: usize) -> Option<Assignment> {
        if r >= self.len {
            return None;
        }

        let mut assn = Assignment::new();
        for (v, col) in self.variables.iter().zip(self.columns.iter()) {
            assn.set(v, col[r]);
        }
        Some(assn)
    }

    /// Project the dataset onto the named columns, in the given order.
    ///
    /// # Errors
    /// * `BnetError::UnknownVariable` if a name is not a column of this dataset
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset> {
        let mut idxs = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.column_index(name.as_ref())
                          .ok_or_else(|| BnetError::UnknownVariable(String::from(name.as_ref())))?;
            idxs.push(idx);
        }

        let variables: Vec<Variable> = idxs.iter().map(|&i| self.variables[i].clone()).collect();
        check_unique(&variables)?;

        Ok(Dataset {
            variables,
            columns: idxs.iter().map(|&i| self.columns[i].clone()).collect(),
            len: self.len
        })
    }

    /// Keep only the first `n` columns
    pub fn head_columns(&self, n: usize) -> Dataset {
        let n = n.min(self.variables.len());
        Dataset {
            variables: self.variables[..n].to_vec(),
            columns: self.columns[..n].to_vec(),
            len: self.len
        }
    }

    /// Check if column `c` takes a single value (or none at all) across the records. Such a
    /// column has zero entropy and carries no information about any other column.
    pub fn is_degenerate(&self, c: usize) -> bool {
        match self.columns[c].first() {
            None => true,
            Some(&first) => self.columns[c].iter().all(|&v| v == first)
        }
    }

    /// Fail with `BnetError::DegenerateData` if column `c` is degenerate
    pub fn check_informative(&self, c: usize) -> Result<()> {
        if self.is_degenerate(c) {
            Err(BnetError::DegenerateData(String::from(self.variables[c].name())))
        } else {
            Ok(())
        }
    }

    /// The number of entries of a dense table with one axis per column of `cols`.
    ///
    /// # Errors
    /// * `BnetError::TableTooLarge` if the product overflows or exceeds `MAX_TABLE_ENTRIES`
    pub fn table_size(&self, cols: &[usize]) -> Result<usize> {
        cols.iter()
            .try_fold(1usize, |acc, &c| acc.checked_mul(self.variables[c].cardinality()))
            .filter(|&n| n <= MAX_TABLE_ENTRIES)
            .ok_or_else(|| {
                let names: Vec<&str> = cols.iter().map(|&c| self.variables[c].name()).collect();
                BnetError::TableTooLarge(format!("[{}]", names.join(", ")))
            })
    }

    /// The number of joint configurations of the given columns, observed or not. Computed in
    /// floating point, so it never overflows.
    pub fn configurations(&self, cols: &[usize]) -> f64 {
        cols.iter().map(|&c| self.variables[c].cardinality() as f64).product()
    }

    /// Joint counts over the given columns.
    ///
    /// # Returns
    /// a table with one axis per requested column (in the order requested) whose entry at
    /// `[x_0, x_1, ...]` is the number of records with those states.
    ///
    /// # Errors
    /// * `BnetError::TableTooLarge` if the table would be too large to allocate
    pub fn counts(&self, cols: &[usize]) -> Result<ArrayD<f64>> {
        self.table_size(cols)?;
        let shape: Vec<usize> = cols.iter().map(|&c| self.variables[c].cardinality()).collect();
        let mut table = ArrayD::<f64>::zeros(nd::IxDyn(&shape));

        let mut idx = vec![0; cols.len()];
        for r in 0..self.len {
            for (slot, &c) in idx.iter_mut().zip(cols.iter()) {
                *slot = self.columns[c][r];
            }
            table[nd::IxDyn(&idx)] += 1.0;
        }

        Ok(table)
    }

    /// Counts of `child` for each joint configuration of `parents`.
    ///
    /// # Returns
    /// a `q x r` table, where `q` is the number of parent configurations (enumerated row-major, the
    /// last parent changing fastest) and `r` the cardinality of `child`.
    ///
    /// # Errors
    /// * `BnetError::TableTooLarge` if the table would be too large to allocate
    pub fn parent_counts(&self, child: usize, parents: &[usize]) -> Result<nd::Array2<f64>> {
        let mut cols = parents.to_vec();
        cols.push(child);
        self.table_size(&cols)?;

        let r = self.variables[child].cardinality();
        let q: usize = parents.iter().map(|&p| self.variables[p].cardinality()).product();
        let mut table = nd::Array2::<f64>::zeros((q, r));

        for row in 0..self.len {
            let mut j = 0;
            for &p in parents {
                j = j * self.variables[p].cardinality() + self.columns[p][row];
            }
            table[[j, self.columns[child][row]]] += 1.0;
        }

        Ok(table)
    }

    /// Counts of `child` for the joint configurations of `parents` that occur in the records.
    ///
    /// Only observed configurations get a row, so the result stays proportional to the number of
    /// records however many configurations the parents have.
    ///
    /// # Returns
    /// a map from parent states (in the order of `parents`) to the counts of each state of `child`
    pub fn observed_parent_counts(&self, child: usize, parents: &[usize]) -> BTreeMap<Vec<usize>, Vec<f64>> {
        let r = self.variables[child].cardinality();
        let mut rows: BTreeMap<Vec<usize>, Vec<f64>> = BTreeMap::new();

        for row in 0..self.len {
            let config: Vec<usize> = parents.iter().map(|&p| self.columns[p][row]).collect();
            rows.entry(config).or_insert_with(|| vec![0.0; r])[self.columns[child][row]] += 1.0;
        }

        rows
    }
}

fn check_unique(variables: &[Variable]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for v in variables {
        if !seen.insert(v.name()) {
            return Err(BnetError::DuplicateVariable(String::from(v.name())));
        }
    }
    Ok(())
}


#[cfg(test)]
mod tests {

    use super::*;

    fn weather() -> Dataset {
        let names = ["Outlook", "Play"];
        let records = vec![
            vec!["sunny", "no"],
            vec!["sunny", "no"],
            vec!["rain", "yes"],
            vec!["overcast", "yes"],
            vec!["rain", "no"],
        ];
        Dataset::from_records(&names, &records).unwrap()
    }

    #[test]
    fn domains_are_sorted_distinct_values() {
        let data = weather();
        assert_eq!(5, data.len());
        assert_eq!(2, data.num_columns());

        let outlook = data.variable("Outlook").unwrap();
        assert_eq!(outlook.states(), &["overcast", "rain", "sunny"]);
        assert_eq!(data.column(0), &[2, 2, 1, 0, 1]);

        let rec = data.record(2).unwrap();
        assert_eq!(Some(&1), rec.get_by_name("Outlook"));
        assert_eq!(Some(&1), rec.get_by_name("Play"));
        assert!(data.record(5).is_none());
    }

    #[test]
    fn malformed_records() {
        let names = ["A", "B"];
        let records = vec![vec!["x", "y"], vec!["x"]];
        match Dataset::from_records(&names, &records) {
            Err(BnetError::MalformedRecord { row, expected, found }) => {
                assert_eq!((1, 2, 1), (row, expected, found));
            },
            other => panic!("unexpected result {:?}", other)
        }
    }

    #[test]
    fn duplicate_columns() {
        let names = ["A", "A"];
        let records = vec![vec!["x", "y"]];
        assert_eq!(
            Err(BnetError::DuplicateVariable(String::from("A"))),
            Dataset::from_records(&names, &records)
        );
    }

    #[test]
    fn encoded_values_are_checked() {
        let vars = vec![Variable::binary("A")];
        assert!(Dataset::new(vars.clone(), vec![vec![0], vec![1]]).is_ok());
        match Dataset::new(vars, vec![vec![2]]) {
            Err(BnetError::UnknownState { variable, .. }) => assert_eq!("A", variable),
            other => panic!("unexpected result {:?}", other)
        }
    }

    #[test]
    fn select_and_head() {
        let data = weather();
        let play = data.select(&["Play"]).unwrap();
        assert_eq!(1, play.num_columns());
        assert_eq!(data.column(1), play.column(0));

        assert_eq!(
            Err(BnetError::UnknownVariable(String::from("Wind"))),
            data.select(&["Wind"])
        );

        let head = data.head_columns(1);
        assert_eq!("Outlook", head.variables()[0].name());
        assert_eq!(2, data.head_columns(10).num_columns());
    }

    #[test]
    fn degenerate_columns() {
        let names = ["A", "B"];
        let records = vec![vec!["x", "1"], vec!["x", "2"]];
        let data = Dataset::from_records(&names, &records).unwrap();

        assert!(data.is_degenerate(0));
        assert!(!data.is_degenerate(1));
        assert_eq!(Err(BnetError::DegenerateData(String::from("A"))), data.check_informative(0));
        assert!(data.check_informative(1).is_ok());
    }

    #[test]
    fn counting() {
        let data = weather();

        let joint = data.counts(&[0, 1]).unwrap();
        assert_eq!(&[3, 2], joint.shape());
        assert_eq!(0.0, joint[nd::IxDyn(&[0, 0])]);
        assert_eq!(1.0, joint[nd::IxDyn(&[0, 1])]);
        assert_eq!(1.0, joint[nd::IxDyn(&[1, 0])]);
        assert_eq!(2.0, joint[nd::IxDyn(&[2, 0])]);
        assert_eq!(5.0, joint.sum());

        // Play given Outlook
        let cond = data.parent_counts(1, &[0]).unwrap();
        assert_eq!(&[3, 2], cond.shape());
        assert_eq!(cond[[2, 0]], 2.0);
        assert_eq!(cond[[1, 1]], 1.0);

        // no parents: a single configuration
        let marginal = data.parent_counts(1, &[]).unwrap();
        assert_eq!(&[1, 2], marginal.shape());
        assert_eq!(marginal[[0, 0]], 3.0);
        assert_eq!(marginal[[0, 1]], 2.0);

        // the sparse counts only hold the configurations that occur
        let observed = data.observed_parent_counts(1, &[0]);
        assert_eq!(3, observed.len());
        assert_eq!(Some(&vec![2.0, 0.0]), observed.get(&vec![2]));
        assert_eq!(Some(&vec![1.0, 1.0]), observed.get(&vec![1]));
        assert_eq!(6.0, data.configurations(&[0, 1]));
    }

    #[test]
    fn wide_tables_are_rejected() {
        let vars: Vec<Variable> = (0..21).map(|i| Variable::discrete(&format!("V{:02}", i), 10)).collect();
        let rows: Vec<Vec<usize>> = (0..3).map(|r| vec![r; 21]).collect();
        let data = Dataset::new(vars, rows).unwrap();
        let parents: Vec<usize> = (1..21).collect();

        match data.parent_counts(0, &parents) {
            Err(BnetError::TableTooLarge(msg)) => assert!(msg.contains("V20")),
            other => panic!("unexpected result {:?}", other)
        }
        assert!(data.counts(&parents).is_err());
        assert_eq!(1e21, data.configurations(&(0..21).collect::<Vec<usize>>()));

        // one row per distinct record
        let observed = data.observed_parent_counts(0, &parents);
        assert_eq!(3, observed.len());
        assert_eq!(Some(&vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]), observed.get(&vec![1; 20]));
    }

}
