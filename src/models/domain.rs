use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unknown option names fail fast here, at the boundary, rather than deep in
/// the fairness computation.
#[derive(Debug, Error)]
pub enum OptionParseError {
    #[error("unknown fairness measure: '{0}'")]
    Measure(String),

    #[error("unknown disparity calculation: '{0}'")]
    DisparityCalculation(String),

    #[error("unknown matcher algorithm: '{0}'")]
    Matcher(String),

    #[error("unknown performance metric: '{0}'")]
    Metric(String),
}

fn normalize(value: &str) -> String {
    value
        .trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect()
}

/// Group performance parity measures derived from the confusion matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairnessMeasure {
    AccuracyParity,
    TruePositiveRateParity,
    FalsePositiveRateParity,
    PositivePredictiveValueParity,
    NegativePredictiveValueParity,
}

impl FairnessMeasure {
    pub const ALL: [FairnessMeasure; 5] = [
        FairnessMeasure::AccuracyParity,
        FairnessMeasure::TruePositiveRateParity,
        FairnessMeasure::FalsePositiveRateParity,
        FairnessMeasure::PositivePredictiveValueParity,
        FairnessMeasure::NegativePredictiveValueParity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FairnessMeasure::AccuracyParity => "accuracy_parity",
            FairnessMeasure::TruePositiveRateParity => "true_positive_rate_parity",
            FairnessMeasure::FalsePositiveRateParity => "false_positive_rate_parity",
            FairnessMeasure::PositivePredictiveValueParity => "positive_predictive_value_parity",
            FairnessMeasure::NegativePredictiveValueParity => "negative_predictive_value_parity",
        }
    }

    /// The underlying performance rate name, without the `_parity` suffix
    pub fn performance_name(&self) -> &'static str {
        match self {
            FairnessMeasure::AccuracyParity => "accuracy",
            FairnessMeasure::TruePositiveRateParity => "true_positive_rate",
            FairnessMeasure::FalsePositiveRateParity => "false_positive_rate",
            FairnessMeasure::PositivePredictiveValueParity => "positive_predictive_value",
            FairnessMeasure::NegativePredictiveValueParity => "negative_predictive_value",
        }
    }

    /// Whether a larger value of the underlying rate is the desirable
    /// direction (false positive rate is the one we want low)
    pub fn higher_is_better(&self) -> bool {
        !matches!(self, FairnessMeasure::FalsePositiveRateParity)
    }
}

impl fmt::Display for FairnessMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FairnessMeasure {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "accuracyparity" | "accuracy" => Ok(FairnessMeasure::AccuracyParity),
            "truepositiverateparity" | "truepositiverate" => {
                Ok(FairnessMeasure::TruePositiveRateParity)
            }
            "falsepositiverateparity" | "falsepositiverate" => {
                Ok(FairnessMeasure::FalsePositiveRateParity)
            }
            "positivepredictivevalueparity" | "positivepredictivevalue" => {
                Ok(FairnessMeasure::PositivePredictiveValueParity)
            }
            "negativepredictivevalueparity" | "negativepredictivevalue" => {
                Ok(FairnessMeasure::NegativePredictiveValueParity)
            }
            _ => Err(OptionParseError::Measure(s.to_string())),
        }
    }
}

/// How a subgroup's rate is compared against the population mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisparityCalculation {
    SubtractionBased,
    DivisionBased,
}

impl DisparityCalculation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisparityCalculation::SubtractionBased => "subtraction_based",
            DisparityCalculation::DivisionBased => "division_based",
        }
    }
}

impl fmt::Display for DisparityCalculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisparityCalculation {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "subtractionbased" | "subtraction" | "distributionsubtraction" => {
                Ok(DisparityCalculation::SubtractionBased)
            }
            "divisionbased" | "division" | "distributiondivision" => {
                Ok(DisparityCalculation::DivisionBased)
            }
            _ => Err(OptionParseError::DisparityCalculation(s.to_string())),
        }
    }
}

/// Entity-matching classifiers whose score files this crate can audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherAlgorithm {
    Ditto,
    Mcan,
    DeepMatcher,
    HierMatcher,
    #[serde(rename = "non-neural")]
    NonNeural,
    #[serde(rename = "dt")]
    DecisionTree,
    #[serde(rename = "lg")]
    LogisticRegression,
    #[serde(rename = "ln")]
    LinearRegression,
    #[serde(rename = "nb")]
    NaiveBayes,
    #[serde(rename = "rf")]
    RandomForest,
    Svm,
}

impl MatcherAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatcherAlgorithm::Ditto => "ditto",
            MatcherAlgorithm::Mcan => "mcan",
            MatcherAlgorithm::DeepMatcher => "deepmatcher",
            MatcherAlgorithm::HierMatcher => "hiermatcher",
            MatcherAlgorithm::NonNeural => "non-neural",
            MatcherAlgorithm::DecisionTree => "dt",
            MatcherAlgorithm::LogisticRegression => "lg",
            MatcherAlgorithm::LinearRegression => "ln",
            MatcherAlgorithm::NaiveBayes => "nb",
            MatcherAlgorithm::RandomForest => "rf",
            MatcherAlgorithm::Svm => "svm",
        }
    }
}

impl fmt::Display for MatcherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatcherAlgorithm {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "ditto" => Ok(MatcherAlgorithm::Ditto),
            "mcan" => Ok(MatcherAlgorithm::Mcan),
            "deepmatcher" => Ok(MatcherAlgorithm::DeepMatcher),
            "hiermatcher" => Ok(MatcherAlgorithm::HierMatcher),
            "nonneural" => Ok(MatcherAlgorithm::NonNeural),
            "dt" | "dtmatcher" | "decisiontree" => Ok(MatcherAlgorithm::DecisionTree),
            "lg" | "logregmatcher" | "logisticregression" => {
                Ok(MatcherAlgorithm::LogisticRegression)
            }
            "ln" | "linregmatcher" | "linearregression" => Ok(MatcherAlgorithm::LinearRegression),
            "nb" | "nbmatcher" | "naivebayes" => Ok(MatcherAlgorithm::NaiveBayes),
            "rf" | "rfmatcher" | "randomforest" => Ok(MatcherAlgorithm::RandomForest),
            "svm" | "svmmatcher" => Ok(MatcherAlgorithm::Svm),
            _ => Err(OptionParseError::Matcher(s.to_string())),
        }
    }
}

/// Overall (non-grouped) performance metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMetric {
    Precision,
    Recall,
    F1,
}

impl PerformanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceMetric::Precision => "precision",
            PerformanceMetric::Recall => "recall",
            PerformanceMetric::F1 => "f1",
        }
    }
}

impl fmt::Display for PerformanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceMetric {
    type Err = OptionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "precision" => Ok(PerformanceMetric::Precision),
            "recall" => Ok(PerformanceMetric::Recall),
            "f1" => Ok(PerformanceMetric::F1),
            _ => Err(OptionParseError::Metric(s.to_string())),
        }
    }
}
