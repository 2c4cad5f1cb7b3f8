//! The operations a front end drives: train a network from a dataset and a configuration, then
//! display and query it.

use crate::config::TrainConfig;
use crate::cpd::Cpd;
use crate::dataset::Dataset;
use crate::estimators::fit;
use crate::inference::{Distribution, Evidence, VariableElimination};
use crate::model::{BayesianNetwork, ModelMetadata, NetworkGraph};
use crate::score::score;
use crate::structure::independence::{prune, test_edges};
use crate::structure::StructureLearner;
use crate::util::{BnetError, Result};

use indexmap::IndexMap;
use tracing::info;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Learn a structure and its parameters from `data`.
///
/// The configuration is validated first. Every edge of the learned structure is then tested for
/// independence of its endpoints given the other parents of its child; with `prune` set, the
/// edges that fail are removed and the remaining edges tested again. The recorded tests give the
/// edge weights of `get_graph`.
///
/// # Errors
/// * `BnetError::InvalidConfiguration` if the configuration is inconsistent
/// * `BnetError::EmptyDataset` if `data` has no records
/// * whatever the structure learner reports, such as `BnetError::UnknownVariable` for a root
///   that is not a column
pub fn train(data: &Dataset, config: &TrainConfig) -> Result<BayesianNetwork> {
    let learner = config.learner()?;
    train_with(data, config, learner.as_ref())
}

/// As `train`, with a hill climbing search that returns its current structure as soon as
/// `cancel` is set
pub fn train_with_cancellation(data: &Dataset, config: &TrainConfig, cancel: Arc<AtomicBool>) -> Result<BayesianNetwork> {
    let learner = config.cancellable_learner(cancel)?;
    train_with(data, config, learner.as_ref())
}

fn train_with(data: &Dataset, config: &TrainConfig, learner: &dyn StructureLearner) -> Result<BayesianNetwork> {
    if data.is_empty() {
        return Err(BnetError::EmptyDataset);
    }

    info!(
        strategy = ?config.structure_strategy,
        scoring = ?config.structure_scoring,
        variables = data.num_columns(),
        records = data.len(),
        "training started"
    );

    let excluded_variables: Vec<String> = (0..data.num_columns())
        .filter(|&c| data.is_degenerate(c))
        .map(|c| String::from(data.variables()[c].name()))
        .collect();

    let mut dag = learner.learn(data)?;

    let mut edge_tests = test_edges(&dag, data)?;
    let mut pruned_edges = Vec::new();
    if config.prune {
        pruned_edges = prune(&mut dag, &edge_tests, config.significance_alpha);
        if !pruned_edges.is_empty() {
            edge_tests = test_edges(&dag, data)?;
        }
    }

    let model = fit(&dag, data, config.estimation_method())?;

    let structure_score = score(&dag, data, &config.structure_method())?;
    let parameter_score = score(&dag, data, &config.parameter_score_method())?;

    info!(
        edges = dag.num_edges(),
        pruned = pruned_edges.len(),
        structure_score,
        parameter_score,
        "training finished"
    );

    let metadata = ModelMetadata {
        config: Some(config.clone()),
        num_records: data.len(),
        structure_score: Some(structure_score),
        parameter_score: Some(parameter_score),
        edge_tests,
        pruned_edges,
        excluded_variables
    };

    Ok(model.with_metadata(metadata))
}

/// The CPD of every variable, in topological order
pub fn get_distributions(model: &BayesianNetwork) -> &IndexMap<String, Cpd> {
    model.distributions()
}

/// The nodes and weighted edges of the network
pub fn get_graph(model: &BayesianNetwork) -> NetworkGraph {
    model.graph()
}

/// The posterior distribution of `target` given `evidence`
///
/// # Errors
/// see `VariableElimination::query`
pub fn infer(model: &BayesianNetwork, target: &str, evidence: &Evidence) -> Result<Distribution> {
    VariableElimination::new(model).query(target, evidence)
}
