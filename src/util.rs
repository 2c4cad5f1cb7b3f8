//! Defines the `Error` type for the bnet library

use thiserror::Error;

use std::result;

pub type Result<T> = result::Result<T, BnetError>;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum BnetError {

    /// The graph handed to a scorer or model contains a directed cycle. The value is a variable
    /// on the cycle (or the edge that would have closed it).
    #[error("structure is not acyclic: cycle through '{0}'")]
    InvalidStructure(String),

    /// The dataset has no records
    #[error("dataset has no records")]
    EmptyDataset,

    /// A variable takes a single value in the data, so it carries no information
    #[error("variable '{0}' takes a single value in the data and cannot be scored")]
    DegenerateData(String),

    /// A node of the structure has no matching column in the dataset
    #[error("structure node '{0}' has no matching column in the dataset")]
    IncompatibleStructure(String),

    /// A malformed inference query (target unset, target among the evidence...)
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A name that does not belong to the model or dataset
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// A value outside the domain of a variable
    #[error("unknown state '{state}' for variable '{variable}'")]
    UnknownState { variable: String, state: String },

    /// The evidence has zero joint probability under the model
    #[error("evidence has zero probability under the model")]
    ZeroEvidenceLikelihood,

    /// An unrecognized or inconsistent training configuration
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A conditional probability table with negative entries or rows that do not sum to one
    #[error("invalid distribution for '{0}'")]
    InvalidDistribution(String),

    /// Represents an error where a certain constraint on a scope was not satisfied
    #[error("provided scope did not satisfy constraints: {0}")]
    InvalidScope(String),

    /// Represents an error where there was a parent variable expected, but not found
    #[error("parent '{0}' must be added to the model before its children")]
    MissingParent(String),

    /// Represents a variable that was present multiple times in a situation where it should only
    /// have been present once
    #[error("variable '{0}' was encountered twice")]
    DuplicateVariable(String),

    /// A record whose length does not match the number of columns
    #[error("record {row} has {found} values, expected {expected}")]
    MalformedRecord { row: usize, expected: usize, found: usize },

    /// A table over the given variables would have more entries than can be materialized
    #[error("table over {0} has too many entries")]
    TableTooLarge(String),

    /// A model could not be written or read
    #[error("serialization failed: {0}")]
    Serialization(String),

}

impl From<serde_json::Error> for BnetError {

    fn from(err: serde_json::Error) -> Self {
        BnetError::Serialization(err.to_string())
    }

}
