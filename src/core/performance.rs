use std::collections::BTreeMap;

use tracing::debug;

use crate::core::auditor::FairnessError;
use crate::core::metrics::GroupOutcomes;
use crate::models::table::PairTable;
use crate::models::{
    EnsemblePoint, FairnessMeasure, MatcherAlgorithm, MetricValue, OverallPerformance,
    PerformanceRow, PerformanceTable,
};

/// Upper bound on matcher-per-group assignments the ensemble analyzer will
/// enumerate
pub const ENSEMBLE_COMBINATION_LIMIT: u128 = 1_000_000;

/// Per-group performance of several classifiers over one test split.
///
/// Groups follow the `left_<attr>` column of the test split, matching how
/// the comparison tables are presented.
pub struct PerformanceAnalyzer<'a> {
    test: &'a PairTable,
    sensitive_attribute: String,
}

impl<'a> PerformanceAnalyzer<'a> {
    pub fn new(test: &'a PairTable, sensitive_attribute: impl Into<String>) -> Self {
        Self {
            test,
            sensitive_attribute: sensitive_attribute.into(),
        }
    }

    /// Table of one rate per matcher and group; zero-denominator cells are
    /// the undefined marker
    pub fn group_table(
        &self,
        predictions: &BTreeMap<MatcherAlgorithm, Vec<bool>>,
        measure: FairnessMeasure,
    ) -> Result<PerformanceTable, FairnessError> {
        let labels = self.test.labels()?;
        let column = self
            .test
            .column(&format!("left_{}", self.sensitive_attribute))?;

        let groups: Vec<String> = self
            .test
            .distinct_values(&format!("left_{}", self.sensitive_attribute))?
            .into_iter()
            .collect();

        let mut rows = Vec::with_capacity(predictions.len());
        for (&matcher, decisions) in predictions {
            if decisions.len() != labels.len() {
                return Err(FairnessError::LengthMismatch {
                    test: labels.len(),
                    predictions: decisions.len(),
                });
            }

            let values = groups
                .iter()
                .map(|group| {
                    let outcomes = GroupOutcomes::from_pairs(
                        column
                            .iter()
                            .enumerate()
                            .filter(|(_, value)| value.trim() == group)
                            .map(|(row, _)| (labels[row], decisions[row])),
                    );
                    MetricValue::from_option(measure.rate(&outcomes))
                })
                .collect();

            rows.push(PerformanceRow { matcher, values });
        }

        debug!(
            measure = measure.performance_name(),
            groups = groups.len(),
            matchers = rows.len(),
            "built performance table"
        );

        Ok(PerformanceTable {
            measure: measure.performance_name().to_string(),
            groups,
            rows,
        })
    }

    /// Evaluate every assignment of one matcher per group.
    ///
    /// For each assignment the point carries the spread between the best and
    /// worst group rate and the worst rate itself; assignments touching an
    /// undefined cell are skipped.
    pub fn ensemble_frontier(
        table: &PerformanceTable,
    ) -> Result<Vec<EnsemblePoint>, FairnessError> {
        let group_count = table.groups.len();
        let matcher_count = table.rows.len();
        if group_count == 0 || matcher_count == 0 {
            return Ok(Vec::new());
        }

        let combinations = (matcher_count as u128)
            .checked_pow(group_count as u32)
            .unwrap_or(u128::MAX);
        if combinations > ENSEMBLE_COMBINATION_LIMIT {
            return Err(FairnessError::EnsembleTooLarge {
                combinations,
                limit: ENSEMBLE_COMBINATION_LIMIT,
            });
        }

        let mut assignment = vec![0usize; group_count];
        let mut points = Vec::new();
        loop {
            let mut rates = Vec::with_capacity(group_count);
            let mut matchers = BTreeMap::new();
            let mut defined = true;
            for (group_index, group) in table.groups.iter().enumerate() {
                let row = &table.rows[assignment[group_index]];
                match row.values[group_index] {
                    MetricValue::Value(rate) => {
                        rates.push(rate);
                        matchers.insert(group.clone(), row.matcher);
                    }
                    MetricValue::Undefined => {
                        defined = false;
                        break;
                    }
                }
            }

            if defined {
                let worst = rates.iter().cloned().fold(f64::INFINITY, f64::min);
                let best = rates.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                points.push(EnsemblePoint {
                    disparity: best - worst,
                    performance: worst,
                    matchers,
                });
            }

            // Mixed-radix increment over the assignment vector
            let mut position = 0;
            loop {
                if position == group_count {
                    return Ok(points);
                }
                assignment[position] += 1;
                if assignment[position] < matcher_count {
                    break;
                }
                assignment[position] = 0;
                position += 1;
            }
        }
    }

    /// Overall precision / recall / F1 / accuracy of one prediction set
    pub fn overall(labels: &[bool], decisions: &[bool]) -> Result<OverallPerformance, FairnessError> {
        if labels.len() != decisions.len() {
            return Err(FairnessError::LengthMismatch {
                test: labels.len(),
                predictions: decisions.len(),
            });
        }

        let outcomes =
            GroupOutcomes::from_pairs(labels.iter().copied().zip(decisions.iter().copied()));

        Ok(OverallPerformance {
            precision: MetricValue::from_option(outcomes.precision()),
            recall: MetricValue::from_option(outcomes.recall()),
            f1: MetricValue::from_option(outcomes.f1()),
            accuracy: MetricValue::from_option(outcomes.accuracy()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> PairTable {
        PairTable::new(
            vec![
                "id".to_string(),
                "left_venue".to_string(),
                "right_venue".to_string(),
                "label".to_string(),
            ],
            vec![
                vec!["0".into(), "vldb".into(), "vldb".into(), "1".into()],
                vec!["1".into(), "vldb".into(), "vldb".into(), "0".into()],
                vec!["2".into(), "sigmod".into(), "sigmod".into(), "1".into()],
                vec!["3".into(), "sigmod".into(), "sigmod".into(), "0".into()],
            ],
        )
    }

    #[test]
    fn test_group_table_accuracy() {
        let table = sample_table();
        let analyzer = PerformanceAnalyzer::new(&table, "venue");

        let mut predictions = BTreeMap::new();
        // Perfect on sigmod, half right on vldb
        predictions.insert(
            MatcherAlgorithm::Ditto,
            vec![true, true, true, false],
        );

        let result = analyzer
            .group_table(&predictions, FairnessMeasure::AccuracyParity)
            .unwrap();

        assert_eq!(result.groups, vec!["sigmod".to_string(), "vldb".to_string()]);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].values[0], MetricValue::Value(1.0));
        assert_eq!(result.rows[0].values[1], MetricValue::Value(0.5));
    }

    #[test]
    fn test_group_table_marks_undefined_cells() {
        let table = PairTable::new(
            vec![
                "id".to_string(),
                "left_venue".to_string(),
                "right_venue".to_string(),
                "label".to_string(),
            ],
            // vldb has no actual matches, so its TPR is undefined
            vec![
                vec!["0".into(), "vldb".into(), "vldb".into(), "0".into()],
                vec!["1".into(), "sigmod".into(), "sigmod".into(), "1".into()],
            ],
        );
        let analyzer = PerformanceAnalyzer::new(&table, "venue");

        let mut predictions = BTreeMap::new();
        predictions.insert(MatcherAlgorithm::Ditto, vec![false, true]);

        let result = analyzer
            .group_table(&predictions, FairnessMeasure::TruePositiveRateParity)
            .unwrap();

        assert_eq!(result.rows[0].values[0], MetricValue::Value(1.0)); // sigmod
        assert_eq!(result.rows[0].values[1], MetricValue::Undefined); // vldb
    }

    #[test]
    fn test_ensemble_frontier_enumerates_assignments() {
        let table = PerformanceTable {
            measure: "accuracy".to_string(),
            groups: vec!["a".to_string(), "b".to_string()],
            rows: vec![
                PerformanceRow {
                    matcher: MatcherAlgorithm::Ditto,
                    values: vec![MetricValue::Value(0.9), MetricValue::Value(0.6)],
                },
                PerformanceRow {
                    matcher: MatcherAlgorithm::Mcan,
                    values: vec![MetricValue::Value(0.7), MetricValue::Value(0.8)],
                },
            ],
        };

        let points = PerformanceAnalyzer::ensemble_frontier(&table).unwrap();
        assert_eq!(points.len(), 4); // 2 matchers ^ 2 groups

        // The ditto/mcan assignment hits 0.9 and 0.8
        let best = points
            .iter()
            .find(|p| {
                p.matchers["a"] == MatcherAlgorithm::Ditto
                    && p.matchers["b"] == MatcherAlgorithm::Mcan
            })
            .unwrap();
        assert!((best.performance - 0.8).abs() < 1e-12);
        assert!((best.disparity - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_ensemble_frontier_skips_undefined_cells() {
        let table = PerformanceTable {
            measure: "true_positive_rate".to_string(),
            groups: vec!["a".to_string()],
            rows: vec![
                PerformanceRow {
                    matcher: MatcherAlgorithm::Ditto,
                    values: vec![MetricValue::Undefined],
                },
                PerformanceRow {
                    matcher: MatcherAlgorithm::Mcan,
                    values: vec![MetricValue::Value(0.5)],
                },
            ],
        };

        let points = PerformanceAnalyzer::ensemble_frontier(&table).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].matchers["a"], MatcherAlgorithm::Mcan);
    }

    #[test]
    fn test_ensemble_frontier_rejects_oversized_search_space() {
        // 2 matchers over 21 groups is 2^21 assignments, past the limit
        let groups: Vec<String> = (0..21).map(|i| format!("group {}", i)).collect();
        let rows = vec![
            PerformanceRow {
                matcher: MatcherAlgorithm::Ditto,
                values: vec![MetricValue::Value(0.9); groups.len()],
            },
            PerformanceRow {
                matcher: MatcherAlgorithm::Mcan,
                values: vec![MetricValue::Value(0.8); groups.len()],
            },
        ];
        let table = PerformanceTable {
            measure: "accuracy".to_string(),
            groups,
            rows,
        };

        match PerformanceAnalyzer::ensemble_frontier(&table) {
            Err(FairnessError::EnsembleTooLarge { combinations, limit }) => {
                assert_eq!(combinations, 1 << 21);
                assert_eq!(limit, ENSEMBLE_COMBINATION_LIMIT);
            }
            other => panic!("expected EnsembleTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_overall_performance() {
        let labels = vec![true, true, false, false];
        let decisions = vec![true, false, true, false];
        let overall = PerformanceAnalyzer::overall(&labels, &decisions).unwrap();

        assert_eq!(overall.precision, MetricValue::Value(0.5));
        assert_eq!(overall.recall, MetricValue::Value(0.5));
        assert_eq!(overall.accuracy, MetricValue::Value(0.5));
        assert_eq!(overall.f1, MetricValue::Value(0.5));
    }
}
