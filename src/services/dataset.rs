use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::config::StorageSettings;
use crate::models::table::{PairTable, TableError};
use crate::models::DatasetSummary;
use crate::services::split::DatasetSplits;

/// Errors that can occur when loading or persisting datasets
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset '{0}' not found")]
    NotFound(String),

    #[error("no test split for dataset '{0}'; run the split step first")]
    MissingTestSplit(String),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat-file store for uploaded datasets and their standard splits.
///
/// Datasets live as `<dataset_dir>/<id>.csv`; the standard train / valid /
/// test splits land under `<preprocess_dir>/standard/<id>/`.
pub struct DatasetStore {
    dataset_dir: PathBuf,
    preprocess_dir: PathBuf,
}

impl DatasetStore {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(dataset_dir: P, preprocess_dir: Q) -> Self {
        Self {
            dataset_dir: dataset_dir.as_ref().to_path_buf(),
            preprocess_dir: preprocess_dir.as_ref().to_path_buf(),
        }
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.dataset_dir, &settings.preprocess_dir)
    }

    pub fn dataset_path(&self, dataset_id: &str) -> PathBuf {
        self.dataset_dir.join(format!("{}.csv", dataset_id))
    }

    pub fn split_dir(&self, dataset_id: &str) -> PathBuf {
        self.preprocess_dir.join("standard").join(dataset_id)
    }

    /// Load a full dataset into memory
    pub fn load(&self, dataset_id: &str) -> Result<PairTable, DatasetError> {
        let path = self.dataset_path(dataset_id);
        if !path.is_file() {
            return Err(DatasetError::NotFound(dataset_id.to_string()));
        }

        let table = PairTable::from_path(&path)?;
        debug!(dataset = dataset_id, rows = table.len(), "loaded dataset");
        Ok(table)
    }

    /// Persist a dataset under the store's directory
    pub fn save(&self, dataset_id: &str, table: &PairTable) -> Result<(), DatasetError> {
        fs::create_dir_all(&self.dataset_dir)?;
        table.write_to_path(self.dataset_path(dataset_id))?;
        info!(dataset = dataset_id, rows = table.len(), "saved dataset");
        Ok(())
    }

    /// Logical columns (prefixes stripped, bookkeeping discarded) and row
    /// count
    pub fn summary(&self, dataset_id: &str) -> Result<DatasetSummary, DatasetError> {
        let table = self.load(dataset_id)?;
        Ok(DatasetSummary {
            columns: table.fields().into_iter().collect(),
            rows: table.len(),
        })
    }

    /// Distinct groups of a sensitive attribute, drawn from the left side
    pub fn groups(
        &self,
        dataset_id: &str,
        sensitive_attribute: &str,
    ) -> Result<Vec<String>, DatasetError> {
        let table = self.load(dataset_id)?;
        let values = table.distinct_values(&format!("left_{}", sensitive_attribute))?;
        Ok(values.into_iter().collect())
    }

    /// Write the standard train / valid / test splits
    pub fn persist_splits(
        &self,
        dataset_id: &str,
        splits: &DatasetSplits,
    ) -> Result<(), DatasetError> {
        let dir = self.split_dir(dataset_id);
        fs::create_dir_all(&dir)?;

        splits.train.write_to_path(dir.join("train.csv"))?;
        splits.valid.write_to_path(dir.join("valid.csv"))?;
        splits.test.write_to_path(dir.join("test.csv"))?;

        info!(
            dataset = dataset_id,
            train = splits.train.len(),
            valid = splits.valid.len(),
            test = splits.test.len(),
            "persisted standard splits"
        );
        Ok(())
    }

    /// Read back the persisted test split, the input of every audit
    pub fn load_test_split(&self, dataset_id: &str) -> Result<PairTable, DatasetError> {
        let path = self.split_dir(dataset_id).join("test.csv");
        if !path.is_file() {
            return Err(DatasetError::MissingTestSplit(dataset_id.to_string()));
        }
        Ok(PairTable::from_path(&path)?)
    }
}
