use crate::models::FairnessMeasure;

/// Confusion-matrix outcome counts for one subgroup of record pairs.
///
/// A "positive" is a predicted match; the ground truth comes from the test
/// split's `label` column. All derived rates return `None` for
/// zero-denominator groups instead of a NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOutcomes {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl GroupOutcomes {
    /// Count one labeled pair against its predicted match decision
    pub fn record(&mut self, label: bool, decision: bool) {
        match (label, decision) {
            (true, true) => self.true_positives += 1,
            (false, true) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (true, false) => self.false_negatives += 1,
        }
    }

    pub fn from_pairs<I: IntoIterator<Item = (bool, bool)>>(pairs: I) -> Self {
        let mut outcomes = Self::default();
        for (label, decision) in pairs {
            outcomes.record(label, decision);
        }
        outcomes
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    fn rate(numerator: usize, denominator: usize) -> Option<f64> {
        if denominator == 0 {
            None
        } else {
            Some(numerator as f64 / denominator as f64)
        }
    }

    pub fn accuracy(&self) -> Option<f64> {
        Self::rate(self.true_positives + self.true_negatives, self.total())
    }

    pub fn true_positive_rate(&self) -> Option<f64> {
        Self::rate(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn false_positive_rate(&self) -> Option<f64> {
        Self::rate(self.false_positives, self.false_positives + self.true_negatives)
    }

    pub fn positive_predictive_value(&self) -> Option<f64> {
        Self::rate(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn negative_predictive_value(&self) -> Option<f64> {
        Self::rate(self.true_negatives, self.true_negatives + self.false_negatives)
    }

    pub fn precision(&self) -> Option<f64> {
        self.positive_predictive_value()
    }

    pub fn recall(&self) -> Option<f64> {
        self.true_positive_rate()
    }

    /// Harmonic mean of precision and recall; zero when both are zero
    pub fn f1(&self) -> Option<f64> {
        let precision = self.precision()?;
        let recall = self.recall()?;
        if precision + recall == 0.0 {
            Some(0.0)
        } else {
            Some(2.0 * precision * recall / (precision + recall))
        }
    }
}

impl FairnessMeasure {
    /// The underlying confusion-matrix rate this parity measure compares
    pub fn rate(&self, outcomes: &GroupOutcomes) -> Option<f64> {
        match self {
            FairnessMeasure::AccuracyParity => outcomes.accuracy(),
            FairnessMeasure::TruePositiveRateParity => outcomes.true_positive_rate(),
            FairnessMeasure::FalsePositiveRateParity => outcomes.false_positive_rate(),
            FairnessMeasure::PositivePredictiveValueParity => {
                outcomes.positive_predictive_value()
            }
            FairnessMeasure::NegativePredictiveValueParity => {
                outcomes.negative_predictive_value()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_outcomes() -> GroupOutcomes {
        // 6 TP, 2 FP, 8 TN, 4 FN
        GroupOutcomes {
            true_positives: 6,
            false_positives: 2,
            true_negatives: 8,
            false_negatives: 4,
        }
    }

    #[test]
    fn test_rates_from_known_counts() {
        let outcomes = sample_outcomes();
        assert_eq!(outcomes.total(), 20);
        assert_eq!(outcomes.accuracy(), Some(0.7));
        assert_eq!(outcomes.true_positive_rate(), Some(0.6));
        assert_eq!(outcomes.false_positive_rate(), Some(0.2));
        assert_eq!(outcomes.positive_predictive_value(), Some(0.75));
        assert_eq!(outcomes.negative_predictive_value(), Some(8.0 / 12.0));
    }

    #[test]
    fn test_zero_denominators_are_undefined() {
        // No actual positives: TPR has no denominator
        let outcomes = GroupOutcomes {
            true_positives: 0,
            false_positives: 1,
            true_negatives: 3,
            false_negatives: 0,
        };
        assert_eq!(outcomes.true_positive_rate(), None);

        // No predicted negatives: NPV has no denominator
        let outcomes = GroupOutcomes {
            true_positives: 2,
            false_positives: 1,
            true_negatives: 0,
            false_negatives: 0,
        };
        assert_eq!(outcomes.negative_predictive_value(), None);

        assert_eq!(GroupOutcomes::default().accuracy(), None);
    }

    #[test]
    fn test_from_pairs() {
        let outcomes = GroupOutcomes::from_pairs(vec![
            (true, true),
            (true, false),
            (false, false),
            (false, true),
        ]);
        assert_eq!(outcomes.true_positives, 1);
        assert_eq!(outcomes.false_negatives, 1);
        assert_eq!(outcomes.true_negatives, 1);
        assert_eq!(outcomes.false_positives, 1);
    }

    #[test]
    fn test_f1_harmonic_mean() {
        let outcomes = sample_outcomes();
        let precision = outcomes.precision().unwrap();
        let recall = outcomes.recall().unwrap();
        let expected = 2.0 * precision * recall / (precision + recall);
        assert!((outcomes.f1().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_measure_rate_dispatch() {
        let outcomes = sample_outcomes();
        assert_eq!(
            FairnessMeasure::AccuracyParity.rate(&outcomes),
            outcomes.accuracy()
        );
        assert_eq!(
            FairnessMeasure::FalsePositiveRateParity.rate(&outcomes),
            outcomes.false_positive_rate()
        );
    }
}
