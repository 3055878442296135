use thiserror::Error;
use tracing::debug;

use crate::core::disparity;
use crate::core::metrics::GroupOutcomes;
use crate::core::subgroups::{FairnessScope, SubgroupIndex};
use crate::models::table::{PairTable, TableError};
use crate::models::{
    DisparityCalculation, FairnessMeasure, FairnessReport, MeasureFindings, SubgroupFinding,
};

/// Errors from the fairness computation
#[derive(Debug, Error)]
pub enum FairnessError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("prediction count {predictions} does not match test set size {test}")]
    LengthMismatch { test: usize, predictions: usize },

    #[error("no fairness measures requested")]
    NoMeasures,

    #[error("test set is empty")]
    EmptyTestSet,

    #[error("unknown group '{0}' for the sensitive attribute")]
    UnknownGroup(String),

    #[error("ensemble search space too large: {combinations} matcher assignments (limit {limit})")]
    EnsembleTooLarge { combinations: u128, limit: u128 },
}

/// Knobs of one fairness audit
#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub measures: Vec<FairnessMeasure>,
    pub disparity_calculation: DisparityCalculation,
    /// Fairness holds when the absolute disparity stays within this bound
    pub fairness_threshold: f64,
    /// Subgroups with fewer pairs than this are dropped from the findings
    pub group_acceptance_count: usize,
    /// Delimiter for multi-valued sensitive-attribute cells
    pub value_delimiter: Option<char>,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            measures: FairnessMeasure::ALL.to_vec(),
            disparity_calculation: DisparityCalculation::SubtractionBased,
            fairness_threshold: 0.2,
            group_acceptance_count: 1,
            value_delimiter: Some(','),
        }
    }
}

/// Computes per-subgroup parity findings for one classifier's decisions
/// against a labeled test split.
///
/// Single and pairwise scopes run independently and land in separate result
/// sets. Subgroups whose rate (or whose disparity, for a zero population
/// mean) is undefined carry no verdict and are left out of the findings.
pub struct FairnessAuditor<'a> {
    test: &'a PairTable,
    sensitive_attribute: String,
}

impl<'a> FairnessAuditor<'a> {
    pub fn new(test: &'a PairTable, sensitive_attribute: impl Into<String>) -> Self {
        Self {
            test,
            sensitive_attribute: sensitive_attribute.into(),
        }
    }

    /// Run the full audit: every requested measure, both scopes
    pub fn audit(
        &self,
        decisions: &[bool],
        options: &AuditOptions,
    ) -> Result<FairnessReport, FairnessError> {
        if options.measures.is_empty() {
            return Err(FairnessError::NoMeasures);
        }
        if self.test.is_empty() {
            return Err(FairnessError::EmptyTestSet);
        }

        let labels = self.test.labels()?;
        if labels.len() != decisions.len() {
            return Err(FairnessError::LengthMismatch {
                test: labels.len(),
                predictions: decisions.len(),
            });
        }

        Ok(FairnessReport {
            single_fairness: self.audit_scope(FairnessScope::Single, &labels, decisions, options)?,
            pairwise_fairness: self.audit_scope(
                FairnessScope::Pairwise,
                &labels,
                decisions,
                options,
            )?,
        })
    }

    fn audit_scope(
        &self,
        scope: FairnessScope,
        labels: &[bool],
        decisions: &[bool],
        options: &AuditOptions,
    ) -> Result<MeasureFindings, FairnessError> {
        let index = SubgroupIndex::build(
            self.test,
            &self.sensitive_attribute,
            scope,
            options.value_delimiter,
        )?;

        // Outcome counts are shared across measures; only the derived rate
        // differs per measure.
        let outcomes: Vec<(&str, usize, GroupOutcomes)> = index
            .iter()
            .map(|(key, rows)| {
                let mut group = GroupOutcomes::default();
                for &row in rows {
                    group.record(labels[row], decisions[row]);
                }
                (key, rows.len(), group)
            })
            .collect();

        let mut findings = MeasureFindings::new();
        for &measure in &options.measures {
            let rates: Vec<(&str, usize, Option<f64>)> = outcomes
                .iter()
                .map(|(key, count, group)| (*key, *count, measure.rate(group)))
                .collect();

            let mean = disparity::population_mean(rates.iter().filter_map(|(_, _, r)| *r));

            let mut rows = Vec::new();
            if let Some(mean) = mean {
                for (key, count, rate) in &rates {
                    let Some(rate) = rate else { continue };
                    let Some(deviation) =
                        disparity::disparity(*rate, mean, options.disparity_calculation)
                    else {
                        continue;
                    };
                    if *count < options.group_acceptance_count {
                        continue;
                    }

                    let deviation = deviation.abs();
                    rows.push(SubgroupFinding {
                        measure,
                        sens_attr: key.to_string(),
                        counts: *count,
                        disparities: deviation,
                        is_fair: deviation <= options.fairness_threshold,
                    });
                }
            }

            debug!(
                measure = %measure,
                scope = ?scope,
                subgroups = index.len(),
                findings = rows.len(),
                "computed fairness findings"
            );
            findings.insert(measure, rows);
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Same-value pairs: 10 per group, with the given number predicted
    /// correctly (labels alternate match / non-match)
    fn table_and_decisions(correct_per_group: &[(&str, usize)]) -> (PairTable, Vec<bool>) {
        let headers = vec![
            "id".to_string(),
            "left_race".to_string(),
            "right_race".to_string(),
            "label".to_string(),
        ];

        let mut rows = Vec::new();
        let mut decisions = Vec::new();
        let mut id = 0;
        for (group, correct) in correct_per_group {
            for i in 0..10 {
                let label = i % 2 == 0;
                rows.push(vec![
                    id.to_string(),
                    group.to_string(),
                    group.to_string(),
                    if label { "1" } else { "0" }.to_string(),
                ]);
                decisions.push(if i < *correct { label } else { !label });
                id += 1;
            }
        }

        (PairTable::new(headers, rows), decisions)
    }

    fn accuracy_only() -> AuditOptions {
        AuditOptions {
            measures: vec![FairnessMeasure::AccuracyParity],
            ..AuditOptions::default()
        }
    }

    #[test]
    fn test_equal_groups_have_zero_disparity() {
        let (table, decisions) = table_and_decisions(&[("a", 8), ("b", 8), ("c", 8)]);
        let auditor = FairnessAuditor::new(&table, "race");
        let report = auditor.audit(&decisions, &accuracy_only()).unwrap();

        let findings = &report.single_fairness[&FairnessMeasure::AccuracyParity];
        assert_eq!(findings.len(), 3);
        for finding in findings {
            assert!(finding.disparities.abs() < 1e-12);
            assert!(finding.is_fair);
        }
    }

    #[test]
    fn test_accuracy_example_point_nine_and_point_seven() {
        let (table, decisions) = table_and_decisions(&[("a", 9), ("b", 7)]);
        let auditor = FairnessAuditor::new(&table, "race");
        let report = auditor.audit(&decisions, &accuracy_only()).unwrap();

        let findings = &report.single_fairness[&FairnessMeasure::AccuracyParity];
        assert_eq!(findings.len(), 2);
        for finding in findings {
            assert!((finding.disparities - 0.1).abs() < 1e-12);
            assert!(finding.is_fair); // 0.1 <= default threshold 0.2
        }
    }

    #[test]
    fn test_disparities_are_reported_non_negative() {
        let (table, decisions) = table_and_decisions(&[("a", 10), ("b", 5), ("c", 2)]);
        let auditor = FairnessAuditor::new(&table, "race");

        for calculation in [
            DisparityCalculation::SubtractionBased,
            DisparityCalculation::DivisionBased,
        ] {
            let options = AuditOptions {
                disparity_calculation: calculation,
                ..accuracy_only()
            };
            let report = auditor.audit(&decisions, &options).unwrap();
            for findings in report.single_fairness.values() {
                for finding in findings {
                    assert!(finding.disparities >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_group_acceptance_count_excludes_small_groups() {
        let headers = vec![
            "id".to_string(),
            "left_race".to_string(),
            "right_race".to_string(),
            "label".to_string(),
        ];
        // Group "a" has three pairs, group "b" only one
        let rows = vec![
            vec!["0".into(), "a".into(), "a".into(), "1".into()],
            vec!["1".into(), "a".into(), "a".into(), "0".into()],
            vec!["2".into(), "a".into(), "a".into(), "1".into()],
            vec!["3".into(), "b".into(), "b".into(), "1".into()],
        ];
        let table = PairTable::new(headers, rows);
        let decisions = vec![true, false, true, true];

        let options = AuditOptions {
            group_acceptance_count: 2,
            ..accuracy_only()
        };
        let report = FairnessAuditor::new(&table, "race")
            .audit(&decisions, &options)
            .unwrap();

        let findings = &report.single_fairness[&FairnessMeasure::AccuracyParity];
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].sens_attr, "a");
    }

    #[test]
    fn test_threshold_controls_verdict() {
        let (table, decisions) = table_and_decisions(&[("a", 9), ("b", 7)]);
        let auditor = FairnessAuditor::new(&table, "race");

        let options = AuditOptions {
            fairness_threshold: 0.05,
            ..accuracy_only()
        };
        let report = auditor.audit(&decisions, &options).unwrap();
        for finding in &report.single_fairness[&FairnessMeasure::AccuracyParity] {
            assert!(!finding.is_fair);
        }
    }

    #[test]
    fn test_pairwise_findings_use_combination_keys() {
        let headers = vec![
            "id".to_string(),
            "left_race".to_string(),
            "right_race".to_string(),
            "label".to_string(),
        ];
        let rows = vec![
            vec!["0".into(), "a".into(), "b".into(), "1".into()],
            vec!["1".into(), "b".into(), "a".into(), "0".into()],
        ];
        let table = PairTable::new(headers, rows);
        let decisions = vec![true, false];

        let report = FairnessAuditor::new(&table, "race")
            .audit(&decisions, &accuracy_only())
            .unwrap();

        let findings = &report.pairwise_fairness[&FairnessMeasure::AccuracyParity];
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].sens_attr, "a|b");
        assert_eq!(findings[0].counts, 2);
    }

    #[test]
    fn test_undefined_rates_are_left_out() {
        let headers = vec![
            "id".to_string(),
            "left_race".to_string(),
            "right_race".to_string(),
            "label".to_string(),
        ];
        // Group "a" has only non-matches, so its TPR is undefined
        let rows = vec![
            vec!["0".into(), "a".into(), "a".into(), "0".into()],
            vec!["1".into(), "b".into(), "b".into(), "1".into()],
            vec!["2".into(), "b".into(), "b".into(), "1".into()],
        ];
        let table = PairTable::new(headers, rows);
        let decisions = vec![false, true, false];

        let options = AuditOptions {
            measures: vec![FairnessMeasure::TruePositiveRateParity],
            ..AuditOptions::default()
        };
        let report = FairnessAuditor::new(&table, "race")
            .audit(&decisions, &options)
            .unwrap();

        let findings = &report.single_fairness[&FairnessMeasure::TruePositiveRateParity];
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].sens_attr, "b");
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let (table, mut decisions) = table_and_decisions(&[("a", 8)]);
        decisions.pop();
        let result = FairnessAuditor::new(&table, "race").audit(&decisions, &accuracy_only());
        assert!(matches!(
            result,
            Err(FairnessError::LengthMismatch { test: 10, predictions: 9 })
        ));
    }

    #[test]
    fn test_no_measures_is_rejected() {
        let (table, decisions) = table_and_decisions(&[("a", 8)]);
        let options = AuditOptions {
            measures: Vec::new(),
            ..AuditOptions::default()
        };
        let result = FairnessAuditor::new(&table, "race").audit(&decisions, &options);
        assert!(matches!(result, Err(FairnessError::NoMeasures)));
    }
}
