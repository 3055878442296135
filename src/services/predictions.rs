use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::models::MatcherAlgorithm;

/// Errors that can occur when reading matcher score files
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("no scores for matcher '{matcher}' on dataset '{dataset}'")]
    NotFound { matcher: String, dataset: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing column '{0}' in scores file")]
    MissingColumn(String),

    #[error("invalid score '{value}' in row {row}")]
    InvalidScore { row: usize, value: String },
}

/// Raw classifier scores for the test split, aligned by row index
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSet {
    scores: Vec<f64>,
}

impl ScoreSet {
    pub fn new(scores: Vec<f64>) -> Self {
        Self { scores }
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Threshold raw scores into binary match decisions
    pub fn decisions(&self, matching_threshold: f64) -> Vec<bool> {
        self.scores
            .iter()
            .map(|&score| score > matching_threshold)
            .collect()
    }
}

/// Flat-file store for per-matcher score files.
///
/// Scores live as `<scores_dir>/<dataset_id>/<matcher>/preds.csv` with a
/// single `scores` column, one row per test pair.
pub struct PredictionStore {
    scores_dir: PathBuf,
}

impl PredictionStore {
    pub fn new<P: AsRef<Path>>(scores_dir: P) -> Self {
        Self {
            scores_dir: scores_dir.as_ref().to_path_buf(),
        }
    }

    pub fn scores_path(&self, dataset_id: &str, matcher: MatcherAlgorithm) -> PathBuf {
        self.scores_dir
            .join(dataset_id)
            .join(matcher.as_str())
            .join("preds.csv")
    }

    pub fn load(
        &self,
        dataset_id: &str,
        matcher: MatcherAlgorithm,
    ) -> Result<ScoreSet, PredictionError> {
        let path = self.scores_path(dataset_id, matcher);
        if !path.is_file() {
            return Err(PredictionError::NotFound {
                matcher: matcher.to_string(),
                dataset: dataset_id.to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let column = reader
            .headers()?
            .iter()
            .position(|h| h == "scores")
            .ok_or_else(|| PredictionError::MissingColumn("scores".to_string()))?;

        let mut scores = Vec::new();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let value = record.get(column).unwrap_or("");
            let score = value
                .trim()
                .parse::<f64>()
                .map_err(|_| PredictionError::InvalidScore {
                    row: row + 1,
                    value: value.to_string(),
                })?;
            scores.push(score);
        }

        debug!(
            dataset = dataset_id,
            matcher = %matcher,
            rows = scores.len(),
            "loaded matcher scores"
        );
        Ok(ScoreSet::new(scores))
    }

    pub fn save(
        &self,
        dataset_id: &str,
        matcher: MatcherAlgorithm,
        scores: &ScoreSet,
    ) -> Result<(), PredictionError> {
        let path = self.scores_path(dataset_id, matcher);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["scores"])?;
        for score in scores.scores() {
            writer.write_record([score.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decisions_threshold_is_strict() {
        let scores = ScoreSet::new(vec![0.2, 0.5, 0.7]);
        assert_eq!(scores.decisions(0.5), vec![false, false, true]);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = PredictionStore::new(dir.path());

        let scores = ScoreSet::new(vec![0.1, 0.9, 0.42]);
        store.save("dblp", MatcherAlgorithm::Ditto, &scores).unwrap();

        let loaded = store.load("dblp", MatcherAlgorithm::Ditto).unwrap();
        assert_eq!(loaded, scores);
    }

    #[test]
    fn test_missing_scores() {
        let dir = tempfile::tempdir().unwrap();
        let store = PredictionStore::new(dir.path());
        assert!(matches!(
            store.load("dblp", MatcherAlgorithm::Mcan),
            Err(PredictionError::NotFound { .. })
        ));
    }

    #[test]
    fn test_invalid_score_reports_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = PredictionStore::new(dir.path());

        let path = store.scores_path("dblp", MatcherAlgorithm::Ditto);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "scores\n0.5\nhigh\n").unwrap();

        match store.load("dblp", MatcherAlgorithm::Ditto) {
            Err(PredictionError::InvalidScore { row, value }) => {
                assert_eq!(row, 2);
                assert_eq!(value, "high");
            }
            other => panic!("expected InvalidScore, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_scores_column() {
        let dir = tempfile::tempdir().unwrap();
        let store = PredictionStore::new(dir.path());

        let path = store.scores_path("dblp", MatcherAlgorithm::Ditto);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "probability\n0.5\n").unwrap();

        assert!(matches!(
            store.load("dblp", MatcherAlgorithm::Ditto),
            Err(PredictionError::MissingColumn(_))
        ));
    }
}
