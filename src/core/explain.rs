use tracing::debug;

use crate::core::auditor::FairnessError;
use crate::core::metrics::GroupOutcomes;
use crate::models::table::PairTable;
use crate::models::{ConfusionMatrixReport, CoverageRow, ExplanationReport, TableSlice};

/// Drills into one group's outcomes under one classifier: overall confusion
/// counts, match coverage of the group versus the population, and sample
/// misclassified pairs from the group.
pub struct Explainer<'a> {
    test: &'a PairTable,
    sensitive_attribute: String,
}

impl<'a> Explainer<'a> {
    pub fn new(test: &'a PairTable, sensitive_attribute: impl Into<String>) -> Self {
        Self {
            test,
            sensitive_attribute: sensitive_attribute.into(),
        }
    }

    /// Group membership follows the `left_<attr>` column. Sample selection
    /// is deterministic: the first `max_samples` misclassified pairs of the
    /// group, in row order.
    pub fn explain(
        &self,
        decisions: &[bool],
        group: &str,
        max_samples: usize,
    ) -> Result<ExplanationReport, FairnessError> {
        let labels = self.test.labels()?;
        if labels.len() != decisions.len() {
            return Err(FairnessError::LengthMismatch {
                test: labels.len(),
                predictions: decisions.len(),
            });
        }

        let column = self
            .test
            .column(&format!("left_{}", self.sensitive_attribute))?;
        let in_group: Vec<bool> = column.iter().map(|value| value.trim() == group).collect();
        if !in_group.iter().any(|&member| member) {
            return Err(FairnessError::UnknownGroup(group.to_string()));
        }

        let overall =
            GroupOutcomes::from_pairs(labels.iter().copied().zip(decisions.iter().copied()));

        let group_matches = labels
            .iter()
            .zip(&in_group)
            .filter(|(label, member)| **label && **member)
            .count();
        let group_total = in_group.iter().filter(|&&member| member).count();
        let total_matches = labels.iter().filter(|&&label| label).count();

        let coverage = vec![
            CoverageRow {
                group: group.to_string(),
                matches: group_matches,
                non_matches: group_total - group_matches,
                total: group_total,
            },
            CoverageRow {
                group: "Total".to_string(),
                matches: total_matches,
                non_matches: labels.len() - total_matches,
                total: labels.len(),
            },
        ];

        let samples: Vec<Vec<String>> = self
            .test
            .rows()
            .iter()
            .enumerate()
            .filter(|(row, _)| in_group[*row] && labels[*row] != decisions[*row])
            .take(max_samples)
            .map(|(_, row)| row.clone())
            .collect();

        debug!(
            group = group,
            group_pairs = group_total,
            samples = samples.len(),
            "built group explanation"
        );

        Ok(ExplanationReport {
            confusion_matrix: ConfusionMatrixReport {
                true_positives: overall.true_positives,
                false_positives: overall.false_positives,
                true_negatives: overall.true_negatives,
                false_negatives: overall.false_negatives,
            },
            coverage,
            samples: TableSlice {
                columns: self.test.headers().to_vec(),
                rows: samples,
            },
        })
    }
}
