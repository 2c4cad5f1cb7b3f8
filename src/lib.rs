//! Discrete Bayesian networks: structure learning, parameter estimation and exact inference.

pub mod util;
pub mod variable;
pub mod dataset;
pub mod dag;
pub mod factor;
pub mod cpd;
pub mod init;
pub mod score;
pub mod structure;
pub mod estimators;
pub mod model;
pub mod inference;
pub mod samplers;
pub mod config;
pub mod pipeline;

pub use util::{Result, BnetError};
pub use config::TrainConfig;
pub use dataset::Dataset;
pub use inference::{Distribution, Evidence};
pub use model::{BayesianNetwork, NetworkGraph};
pub use pipeline::{get_distributions, get_graph, infer, train};
