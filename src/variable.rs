//! Definition of the variable module
//!
//! A `Variable` represents a discrete random variable in a Bayesian network. Its domain is an
//! ordered list of named states; everywhere else in the library a state is referred to by its
//! index into that list.

use serde::{Deserialize, Serialize};

use std::collections::BTreeMap;
use std::fmt;

/// A named, discrete random variable.
///
/// Identity is the name: two `Variable`s with the same name are expected to carry the same states.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Variable {

    /// The name of the `Variable`
    name: String,

    /// The labels of each state, in index order
    states: Vec<String>

}

impl Variable {

    /// Construct a new `Variable` with the given, ordered, state labels
    pub fn new<S: AsRef<str>>(name: &str, states: &[S]) -> Variable {
        Variable {
            name: String::from(name),
            states: states.iter().map(|s| String::from(s.as_ref())).collect()
        }
    }

    /// Construct a new binary `Variable` with states `"0"` and `"1"`
    pub fn binary(name: &str) -> Variable {
        Variable::new(name, &["0", "1"])
    }

    /// Construct a new `Variable` with `count` states labelled `"0"` through `"count - 1"`
    pub fn discrete(name: &str, count: usize) -> Variable {
        let states: Vec<String> = (0..count).map(|i| i.to_string()).collect();
        Variable::new(name, &states[..])
    }

    /// Get the name of the `Variable`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the state labels of the `Variable`
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// The number of states the `Variable` can take
    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    /// Lookup the index of a state label
    pub fn state_index(&self, state: &str) -> Option<usize> {
        self.states.iter().position(|s| s == state)
    }

    /// Lookup the label of a state index
    pub fn state(&self, idx: usize) -> Option<&str> {
        self.states.get(idx).map(|s| s.as_str())
    }
}

impl fmt::Display for Variable {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }

}


/// A (possibly partial) assignment of states to `Variable`s, keyed by variable name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Assignment {
    values: BTreeMap<String, usize>
}

impl Assignment {

    /// Construct an empty `Assignment`
    pub fn new() -> Self {
        Assignment { values: BTreeMap::new() }
    }

    /// Assign state `idx` to `var`, replacing any previous assignment
    pub fn set(&mut self, var: &Variable, idx: usize) {
        self.values.insert(String::from(var.name()), idx);
    }

    /// Get the state assigned to `var`, if any
    pub fn get(&self, var: &Variable) -> Option<&usize> {
        self.values.get(var.name())
    }

    /// Get the state assigned to the variable named `name`, if any
    pub fn get_by_name(&self, name: &str) -> Option<&usize> {
        self.values.get(name)
    }

    /// Check if the variable named `name` is assigned
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, state index)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &usize)> {
        self.values.iter()
    }
}


/// Iterator over every joint assignment to a scope, in row-major order (the last `Variable`
/// changes fastest). A scope with no `Variable`s has exactly one, empty, assignment.
pub struct AllAssignments<'a> {
    scope: &'a [Variable],
    current: Option<Vec<usize>>
}

impl<'a> Iterator for AllAssignments<'a> {
    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        let idx = self.current.take()?;

        let mut assn = Assignment::new();
        for (v, &i) in self.scope.iter().zip(idx.iter()) {
            assn.set(v, i);
        }

        // advance the odometer
        let mut next = idx;
        let mut pos = next.len();
        loop {
            if pos == 0 {
                // rolled over the most significant digit, we are done
                break;
            }
            pos -= 1;
            next[pos] += 1;
            if next[pos] < self.scope[pos].cardinality() {
                self.current = Some(next);
                break;
            }
            next[pos] = 0;
        }

        Some(assn)
    }
}

/// Enumerate all assignments to the given scope
pub fn all_assignments(scope: &[Variable]) -> AllAssignments<'_> {
    let current = if scope.iter().any(|v| v.cardinality() == 0) {
        None
    } else {
        Some(vec![0; scope.len()])
    };

    AllAssignments { scope, current }
}
