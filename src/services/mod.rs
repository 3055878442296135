// Service exports
pub mod dataset;
pub mod predictions;
pub mod split;

pub use dataset::{DatasetError, DatasetStore};
pub use predictions::{PredictionError, PredictionStore, ScoreSet};
pub use split::{split, DatasetSplits, SplitError, SplitRatios};
