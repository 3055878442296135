use thiserror::Error;
use tracing::debug;

use crate::models::table::PairTable;

/// Errors that can occur when partitioning a dataset
#[derive(Debug, Error)]
pub enum SplitError {
    #[error("invalid split ratios: train={train}, valid={valid} (each must be non-negative and leave room for a test split)")]
    InvalidRatios { train: f64, valid: f64 },
}

/// Train / validation fractions; the test split takes the remainder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitRatios {
    pub train: f64,
    pub valid: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.70,
            valid: 0.15,
        }
    }
}

impl SplitRatios {
    pub fn validate(&self) -> Result<(), SplitError> {
        if self.train < 0.0 || self.valid < 0.0 || self.train + self.valid >= 1.0 {
            return Err(SplitError::InvalidRatios {
                train: self.train,
                valid: self.valid,
            });
        }
        Ok(())
    }
}

/// Train / validation / test partitions of one dataset
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: PairTable,
    pub valid: PairTable,
    pub test: PairTable,
}

/// Deterministic, order-preserving partition: the first `train` fraction of
/// rows, then the `valid` fraction, then the rest. No shuffling, so the same
/// file always yields the same splits.
pub fn split(table: &PairTable, ratios: SplitRatios) -> Result<DatasetSplits, SplitError> {
    ratios.validate()?;

    let total = table.len();
    let train_size = (total as f64 * ratios.train) as usize;
    let valid_size = (total as f64 * ratios.valid) as usize;

    let splits = DatasetSplits {
        train: table.slice(0..train_size),
        valid: table.slice(train_size..train_size + valid_size),
        test: table.slice(train_size + valid_size..total),
    };

    debug!(
        total = total,
        train = splits.train.len(),
        valid = splits.valid.len(),
        test = splits.test.len(),
        "partitioned dataset"
    );

    Ok(splits)
}
