//! Typed training configuration.
//!
//! Every option is a closed enum. Each accepts its descriptive name as well as the short codes
//! used by front ends (`hc`, `nb`, `ml`, ...) in any case. JSON is parsed through `FromStr`, so
//! both accept the same codes. Anything else is an `InvalidConfiguration` error rather than a
//! silent default.

use crate::estimators::{EstimationMethod, Prior};
use crate::score::ScoringMethod;
use crate::structure::{HillClimbSearch, NaiveBayes, PcSearch, StructureLearner};
use crate::util::{BnetError, Result};

use serde::{Deserialize, Serialize};

use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum StructureStrategy {
    HillClimb,

    Pc,

    NaiveRoot
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum StructureScoring {
    Bic,

    K2,

    Bdeu
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ParameterMethod {
    Mle,

    Bayesian
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ParameterScoring {
    Bic,

    Bdeu
}

fn unknown(kind: &str, code: &str) -> BnetError {
    BnetError::InvalidConfiguration(format!("unknown {} '{}'", kind, code))
}

macro_rules! parse_from_string {
    ($($option:ty),*) => {$(
        impl TryFrom<String> for $option {
            type Error = BnetError;

            fn try_from(code: String) -> Result<Self> {
                code.parse()
            }
        }
    )*};
}

parse_from_string!(StructureStrategy, StructureScoring, ParameterMethod, ParameterScoring);

impl FromStr for StructureStrategy {
    type Err = BnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hill_climb" | "hc" => Ok(StructureStrategy::HillClimb),
            "pc" => Ok(StructureStrategy::Pc),
            "naive_root" | "naive" | "nb" => Ok(StructureStrategy::NaiveRoot),
            _ => Err(unknown("structure strategy", s))
        }
    }
}

impl FromStr for StructureScoring {
    type Err = BnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bic" | "bicscore" => Ok(StructureScoring::Bic),
            "k2" | "k2score" => Ok(StructureScoring::K2),
            "bdeu" | "bdeuscore" => Ok(StructureScoring::Bdeu),
            _ => Err(unknown("structure scoring", s))
        }
    }
}

impl FromStr for ParameterMethod {
    type Err = BnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mle" | "ml" | "maximum_likelihood" => Ok(ParameterMethod::Mle),
            "bayesian" | "bayes" => Ok(ParameterMethod::Bayesian),
            _ => Err(unknown("parameter method", s))
        }
    }
}

impl FromStr for ParameterScoring {
    type Err = BnetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bic" | "bicscore" => Ok(ParameterScoring::Bic),
            "bdeu" | "bdeuscore" => Ok(ParameterScoring::Bdeu),
            _ => Err(unknown("parameter scoring", s))
        }
    }
}


/// Everything `train` needs to know
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    pub structure_strategy: StructureStrategy,
    pub structure_scoring: StructureScoring,
    pub parameter_method: ParameterMethod,
    pub parameter_scoring: ParameterScoring,

    /// Significance level of the independence tests
    pub significance_alpha: f64,

    /// Remove edges whose independence test is not significant
    pub prune: bool,

    /// The root of the naive structure; required by, and only by, `NaiveRoot`
    pub root_node: Option<String>,

    /// Prior strength of Bayesian estimation and of the BDeu score
    pub equivalent_sample_size: f64,

    pub max_iter: usize,
    pub max_indegree: Option<usize>,
    pub tabu_length: usize,
    pub epsilon: f64,
    pub max_cond_vars: usize
}

impl Default for TrainConfig {

    fn default() -> Self {
        TrainConfig {
            structure_strategy: StructureStrategy::HillClimb,
            structure_scoring: StructureScoring::Bic,
            parameter_method: ParameterMethod::Mle,
            parameter_scoring: ParameterScoring::Bic,
            significance_alpha: 0.05,
            prune: false,
            root_node: None,
            equivalent_sample_size: 5.0,
            max_iter: 1_000_000,
            max_indegree: None,
            tabu_length: 100,
            epsilon: 1e-4,
            max_cond_vars: 5
        }
    }

}

impl TrainConfig {

    /// A configuration for the naive structure rooted at `root`
    pub fn naive(root: &str) -> Self {
        TrainConfig {
            structure_strategy: StructureStrategy::NaiveRoot,
            root_node: Some(String::from(root)),
            ..TrainConfig::default()
        }
    }

    /// Parse and validate a JSON document. Missing fields take their default.
    ///
    /// # Errors
    /// * `BnetError::InvalidConfiguration` for unknown fields or codes, and for the problems
    ///   `validate` reports
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TrainConfig = serde_json::from_str(json)
            .map_err(|e| BnetError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the options are consistent
    pub fn validate(&self) -> Result<()> {
        match (self.structure_strategy, &self.root_node) {
            (StructureStrategy::NaiveRoot, None) => {
                return Err(BnetError::InvalidConfiguration(String::from("naive_root requires root_node")));
            },
            (StructureStrategy::HillClimb, Some(_)) | (StructureStrategy::Pc, Some(_)) => {
                return Err(BnetError::InvalidConfiguration(String::from("root_node is only used by naive_root")));
            },
            _ => ()
        }

        if !(self.significance_alpha > 0.0 && self.significance_alpha < 1.0) {
            return Err(BnetError::InvalidConfiguration(format!("significance_alpha {} not in (0, 1)", self.significance_alpha)));
        }

        if !(self.equivalent_sample_size > 0.0) || !self.equivalent_sample_size.is_finite() {
            return Err(BnetError::InvalidConfiguration(format!("equivalent_sample_size {} must be positive", self.equivalent_sample_size)));
        }

        if !(self.epsilon >= 0.0) {
            return Err(BnetError::InvalidConfiguration(format!("epsilon {} must not be negative", self.epsilon)));
        }

        Ok(())
    }

    /// The criterion structure search maximizes
    pub fn structure_method(&self) -> ScoringMethod {
        match self.structure_scoring {
            StructureScoring::Bic => ScoringMethod::Bic,
            StructureScoring::K2 => ScoringMethod::K2,
            StructureScoring::Bdeu => ScoringMethod::Bdeu { equivalent_sample_size: self.equivalent_sample_size }
        }
    }

    /// The criterion the fitted model is reported under, which also picks the prior of Bayesian
    /// estimation
    pub fn parameter_score_method(&self) -> ScoringMethod {
        match self.parameter_scoring {
            ParameterScoring::Bic => ScoringMethod::Bic,
            ParameterScoring::Bdeu => ScoringMethod::Bdeu { equivalent_sample_size: self.equivalent_sample_size }
        }
    }

    /// How CPDs are estimated. Bayesian estimation smooths with the BDeu prior under `bdeu`
    /// parameter scoring and with the K2 prior (one pseudo-count per cell) under `bic`.
    pub fn estimation_method(&self) -> EstimationMethod {
        match (self.parameter_method, self.parameter_scoring) {
            (ParameterMethod::Mle, _) => EstimationMethod::MaximumLikelihood,
            (ParameterMethod::Bayesian, ParameterScoring::Bdeu) => EstimationMethod::Bayesian(Prior::BDeu {
                equivalent_sample_size: self.equivalent_sample_size
            }),
            (ParameterMethod::Bayesian, ParameterScoring::Bic) => EstimationMethod::Bayesian(Prior::K2)
        }
    }

    /// The structure learner this configuration describes
    ///
    /// # Errors
    /// * `BnetError::InvalidConfiguration` if the configuration is not valid
    pub fn learner(&self) -> Result<Box<dyn StructureLearner>> {
        self.build_learner(None)
    }

    /// As `learner`, with a hill climbing search that stops early once `cancel` is set. The other
    /// strategies ignore the flag.
    pub fn cancellable_learner(&self, cancel: Arc<AtomicBool>) -> Result<Box<dyn StructureLearner>> {
        self.build_learner(Some(cancel))
    }

    fn build_learner(&self, cancel: Option<Arc<AtomicBool>>) -> Result<Box<dyn StructureLearner>> {
        self.validate()?;

        Ok(match self.structure_strategy {
            StructureStrategy::HillClimb => {
                let search = HillClimbSearch::new(self.structure_method())
                    .with_max_indegree(self.max_indegree)
                    .with_tabu_length(self.tabu_length)
                    .with_epsilon(self.epsilon)
                    .with_max_iter(self.max_iter);
                match cancel {
                    Some(flag) => Box::new(search.with_cancellation(flag)),
                    None => Box::new(search)
                }
            },
            StructureStrategy::Pc => Box::new(
                PcSearch::new(self.significance_alpha).with_max_cond_vars(self.max_cond_vars)
            ),
            StructureStrategy::NaiveRoot => {
                let root = self.root_node.as_deref().unwrap_or_default();
                Box::new(NaiveBayes::new(root))
            }
        })
    }
}
