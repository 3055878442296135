use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub split: SplitSettings,
    #[serde(default)]
    pub fairness: FairnessSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_dataset_dir")]
    pub dataset_dir: String,
    #[serde(default = "default_preprocess_dir")]
    pub preprocess_dir: String,
    #[serde(default = "default_scores_dir")]
    pub scores_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            dataset_dir: default_dataset_dir(),
            preprocess_dir: default_preprocess_dir(),
            scores_dir: default_scores_dir(),
        }
    }
}

fn default_dataset_dir() -> String { "./datasets".to_string() }
fn default_preprocess_dir() -> String { "./preprocess".to_string() }
fn default_scores_dir() -> String { "./scores".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct SplitSettings {
    #[serde(default = "default_train_ratio")]
    pub train_ratio: f64,
    #[serde(default = "default_valid_ratio")]
    pub valid_ratio: f64,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            train_ratio: default_train_ratio(),
            valid_ratio: default_valid_ratio(),
        }
    }
}

fn default_train_ratio() -> f64 { 0.70 }
fn default_valid_ratio() -> f64 { 0.15 }

#[derive(Debug, Clone, Deserialize)]
pub struct FairnessSettings {
    /// Score cutoff for turning raw matcher scores into match decisions
    #[serde(default = "default_matching_threshold")]
    pub matching_threshold: f64,
    /// Largest absolute disparity still considered fair
    #[serde(default = "default_fairness_threshold")]
    pub fairness_threshold: f64,
    /// Smallest subgroup size included in findings
    #[serde(default = "default_group_acceptance_count")]
    pub group_acceptance_count: usize,
    /// Delimiter for multi-valued sensitive-attribute cells
    #[serde(default = "default_value_delimiter")]
    pub value_delimiter: Option<char>,
}

impl Default for FairnessSettings {
    fn default() -> Self {
        Self {
            matching_threshold: default_matching_threshold(),
            fairness_threshold: default_fairness_threshold(),
            group_acceptance_count: default_group_acceptance_count(),
            value_delimiter: default_value_delimiter(),
        }
    }
}

fn default_matching_threshold() -> f64 { 0.5 }
fn default_fairness_threshold() -> f64 { 0.2 }
fn default_group_acceptance_count() -> usize { 1 }
fn default_value_delimiter() -> Option<char> { Some(',') }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with FAIRMATCH_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            // Local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // e.g., FAIRMATCH__FAIRNESS__FAIRNESS_THRESHOLD -> fairness.fairness_threshold
            .add_source(
                Environment::with_prefix("FAIRMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("FAIRMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Honor the bare dataset-directory variable that deployments already set
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    let mut builder = Config::builder().add_source(settings);

    if let Ok(dataset_dir) = std::env::var("DATASET_UPLOAD_PATH") {
        builder = builder.set_override("storage.dataset_dir", dataset_dir)?;
    }

    builder.build()
}
