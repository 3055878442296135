use crate::models::DisparityCalculation;

/// Mean of the defined subgroup rates; `None` when no subgroup has a
/// defined rate
pub fn population_mean<I: IntoIterator<Item = f64>>(rates: I) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for rate in rates {
        sum += rate;
        count += 1;
    }

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Signed deviation of one subgroup's rate from the population mean.
///
/// Subtraction-based disparity is the plain difference. Division-based
/// disparity is the ratio-deviation `rate / mean - 1`, so both modes carry
/// the same sign whenever the mean is positive; it is undefined for a zero
/// mean.
pub fn disparity(rate: f64, mean: f64, calculation: DisparityCalculation) -> Option<f64> {
    match calculation {
        DisparityCalculation::SubtractionBased => Some(rate - mean),
        DisparityCalculation::DivisionBased => {
            if mean == 0.0 {
                None
            } else {
                Some(rate / mean - 1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_mean() {
        assert_eq!(population_mean(vec![0.9, 0.7]), Some(0.8));
        assert_eq!(population_mean(Vec::new()), None);
    }

    #[test]
    fn test_subtraction_example_from_two_groups() {
        // Groups at 0.9 and 0.7 accuracy around a 0.8 mean deviate by 0.1 each
        let mean = population_mean(vec![0.9, 0.7]).unwrap();
        let high = disparity(0.9, mean, DisparityCalculation::SubtractionBased).unwrap();
        let low = disparity(0.7, mean, DisparityCalculation::SubtractionBased).unwrap();
        assert!((high - 0.1).abs() < 1e-12);
        assert!((low + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_modes_agree_on_sign_for_positive_mean() {
        let mean = 0.8;
        for rate in [0.95, 0.8, 0.4] {
            let sub = disparity(rate, mean, DisparityCalculation::SubtractionBased).unwrap();
            let div = disparity(rate, mean, DisparityCalculation::DivisionBased).unwrap();
            assert_eq!(sub > 0.0, div > 0.0);
            assert_eq!(sub < 0.0, div < 0.0);
        }
    }

    #[test]
    fn test_division_by_zero_mean_is_undefined() {
        assert_eq!(disparity(0.5, 0.0, DisparityCalculation::DivisionBased), None);
        assert!(disparity(0.5, 0.0, DisparityCalculation::SubtractionBased).is_some());
    }
}
