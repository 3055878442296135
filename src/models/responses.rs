use std::collections::BTreeMap;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::domain::{FairnessMeasure, MatcherAlgorithm};

/// One subgroup's fairness verdict for one measure.
///
/// `sens_attr` is a single attribute value for single fairness, or the
/// `a|b` combination key for pairwise fairness. `disparities` is the
/// absolute deviation from the population mean.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubgroupFinding {
    pub measure: FairnessMeasure,
    pub sens_attr: String,
    pub counts: usize,
    pub disparities: f64,
    pub is_fair: bool,
}

/// Findings grouped by measure, in deterministic measure order
pub type MeasureFindings = BTreeMap<FairnessMeasure, Vec<SubgroupFinding>>;

/// Fairness result sets for one classifier: single-attribute and
/// pairwise-attribute groupings run independently
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FairnessReport {
    pub single_fairness: MeasureFindings,
    pub pairwise_fairness: MeasureFindings,
}

/// Response for a multi-matcher fairness audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditResponse {
    pub dataset_id: String,
    pub sensitive_attribute: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub results: BTreeMap<MatcherAlgorithm, FairnessReport>,
}

/// A performance rate, or the undefined marker for zero-denominator groups
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Value(f64),
    Undefined,
}

impl MetricValue {
    pub fn from_option(value: Option<f64>) -> Self {
        match value {
            Some(v) => MetricValue::Value(v),
            None => MetricValue::Undefined,
        }
    }

    pub fn as_option(&self) -> Option<f64> {
        match self {
            MetricValue::Value(v) => Some(*v),
            MetricValue::Undefined => None,
        }
    }
}

impl Serialize for MetricValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetricValue::Value(v) => serializer.serialize_f64(*v),
            MetricValue::Undefined => serializer.serialize_str("-"),
        }
    }
}

impl<'de> Deserialize<'de> for MetricValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetricValueVisitor;

        impl<'de> Visitor<'de> for MetricValueVisitor {
            type Value = MetricValue;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a number or the string \"-\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(MetricValue::Value(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(MetricValue::Value(v as f64))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(MetricValue::Value(v as f64))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                if v == "-" {
                    Ok(MetricValue::Undefined)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(MetricValueVisitor)
    }
}

/// One matcher's per-group rates, aligned with `PerformanceTable::groups`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub matcher: MatcherAlgorithm,
    pub values: Vec<MetricValue>,
}

/// Per-matcher performance of one rate across the groups of a sensitive
/// attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceTable {
    pub measure: String,
    pub groups: Vec<String>,
    pub rows: Vec<PerformanceRow>,
}

/// One matcher-per-group assignment evaluated by the ensemble analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsemblePoint {
    pub disparity: f64,
    pub performance: f64,
    pub matchers: BTreeMap<String, MatcherAlgorithm>,
}

/// Ensemble chart for one measure: minimize disparity on one axis, optimize
/// worst-group performance on the other
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleChart {
    pub name: String,
    #[serde(rename = "xObj")]
    pub x_objective: String,
    #[serde(rename = "yObj")]
    pub y_objective: String,
    pub data: Vec<EnsemblePoint>,
}

/// Response for the performance command: per-measure tables plus ensemble
/// charts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceResponse {
    pub tables: BTreeMap<String, PerformanceTable>,
    pub charts: Vec<EnsembleChart>,
}

/// Overall precision / recall / F1 / accuracy of one prediction set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallPerformance {
    pub precision: MetricValue,
    pub recall: MetricValue,
    pub f1: MetricValue,
    pub accuracy: MetricValue,
}

/// Logical columns and row count of a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub columns: Vec<String>,
    pub rows: usize,
}

/// Distinct values of a sensitive attribute
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupList {
    pub groups: Vec<String>,
}

/// Row counts of a persisted dataset split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSummary {
    pub train_rows: usize,
    pub valid_rows: usize,
    pub test_rows: usize,
}

/// Raw rows in column order, for sample listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSlice {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Overall predicted-versus-actual outcome counts
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfusionMatrixReport {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

/// Match / non-match coverage for one group row (or the population total)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageRow {
    pub group: String,
    pub matches: usize,
    pub non_matches: usize,
    pub total: usize,
}

/// Why a group scored the way it did: outcome counts, coverage, and sample
/// misclassified pairs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationReport {
    pub confusion_matrix: ConfusionMatrixReport,
    pub coverage: Vec<CoverageRow>,
    pub samples: TableSlice,
}
