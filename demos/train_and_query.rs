//! Sample a dataset from the student network, learn a network back from it and query it.
//!
//! Run with `RUST_LOG=bnet=debug` to follow the search.

use bnet::config::{ParameterMethod, StructureStrategy};
use bnet::init::Initialization;
use bnet::model::BayesianNetworkBuilder;
use bnet::samplers::ForwardSampler;
use bnet::variable::Variable;
use bnet::{get_distributions, get_graph, infer, train, Evidence, TrainConfig};

use tracing_subscriber::EnvFilter;

fn main() -> bnet::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let difficulty = Variable::new("Difficulty", &["easy", "hard"]);
    let intelligence = Variable::new("Intelligence", &["low", "high"]);
    let grade = Variable::new("Grade", &["A", "B", "C"]);
    let sat = Variable::new("SAT", &["low", "high"]);
    let letter = Variable::new("Letter", &["weak", "strong"]);

    let truth = BayesianNetworkBuilder::new()
        .with_variable(&difficulty, &[], Initialization::Binomial(0.6))
        .with_variable(&intelligence, &[], Initialization::Binomial(0.7))
        .with_variable(&grade, &["Intelligence", "Difficulty"], Initialization::Rows(&[
            &[0.3, 0.4, 0.3], &[0.05, 0.25, 0.7], &[0.9, 0.08, 0.02], &[0.5, 0.3, 0.2]
        ]))
        .with_variable(&sat, &["Intelligence"], Initialization::Rows(&[&[0.95, 0.05], &[0.2, 0.8]]))
        .with_variable(&letter, &["Grade"], Initialization::Rows(&[&[0.1, 0.9], &[0.4, 0.6], &[0.99, 0.01]]))
        .build()?;

    let data = ForwardSampler::new(&truth).sample_dataset(5000, 17)?;

    for strategy in [StructureStrategy::HillClimb, StructureStrategy::Pc] {
        let config = TrainConfig {
            structure_strategy: strategy,
            parameter_method: ParameterMethod::Bayesian,
            prune: true,
            ..TrainConfig::default()
        };
        let model = train(&data, &config)?;

        println!("== {:?}", strategy);
        for edge in get_graph(&model).edges {
            println!("{} -> {} ({:.1})", edge.source, edge.target, edge.weight);
        }
        if let Some(cpd) = get_distributions(&model).get("Letter") {
            println!("{}", cpd);
        }

        let evidence: Evidence = [("Letter", "strong"), ("SAT", "high")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        println!("{}", infer(&model, "Intelligence", &evidence)?);
    }

    Ok(())
}
