use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use fairmatch::config::{LoggingSettings, Settings};
use fairmatch::core::{AuditOptions, Explainer, FairnessAuditor, PerformanceAnalyzer};
use fairmatch::models::{
    AuditResponse, DisparityCalculation, EnsembleChart, FairnessMeasure, GroupList,
    MatcherAlgorithm, PerformanceResponse, SplitSummary,
};
use fairmatch::services::{DatasetStore, PredictionStore, SplitRatios};

#[derive(Parser)]
#[command(name = "fairmatch", version, about = "Fairness auditing for entity-matching classifiers")]
struct Cli {
    /// Configuration file (defaults to config/default.toml plus environment)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Partition a dataset into train/valid/test and persist the standard splits
    Split {
        #[arg(long)]
        dataset: String,
    },
    /// Show the logical columns and row count of a dataset
    Columns {
        #[arg(long)]
        dataset: String,
    },
    /// List the distinct groups of a sensitive attribute
    Groups {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        sensitive_attribute: String,
    },
    /// Audit one or more matchers for fairness disparities
    Audit {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        sensitive_attribute: String,
        #[arg(long, value_delimiter = ',', required = true)]
        matchers: Vec<MatcherAlgorithm>,
        /// Fairness measures to evaluate (defaults to all)
        #[arg(long, value_delimiter = ',')]
        measures: Vec<FairnessMeasure>,
        #[arg(long, default_value = "subtraction_based")]
        disparity_calculation: DisparityCalculation,
        #[arg(long)]
        matching_threshold: Option<f64>,
        #[arg(long)]
        fairness_threshold: Option<f64>,
        #[arg(long)]
        group_acceptance_count: Option<usize>,
        /// Delimiter for multi-valued sensitive-attribute cells
        #[arg(long)]
        value_delimiter: Option<char>,
    },
    /// Per-group performance tables plus the matcher-ensemble frontier
    Performance {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        sensitive_attribute: String,
        #[arg(long, value_delimiter = ',', required = true)]
        matchers: Vec<MatcherAlgorithm>,
        /// Measures whose underlying rates to tabulate (defaults to all)
        #[arg(long, value_delimiter = ',')]
        measures: Vec<FairnessMeasure>,
        #[arg(long)]
        matching_threshold: Option<f64>,
    },
    /// Explain one group's outcomes under one matcher
    Explain {
        #[arg(long)]
        dataset: String,
        #[arg(long)]
        sensitive_attribute: String,
        #[arg(long)]
        matcher: MatcherAlgorithm,
        #[arg(long)]
        group: String,
        #[arg(long, default_value_t = 6)]
        samples: usize,
        #[arg(long)]
        matching_threshold: Option<f64>,
    },
}

fn init_logging(logging: &LoggingSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.level.clone()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

fn main() {
    // Load .env file if present
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&settings.logging);

    if let Err(e) = run(cli.command, &settings) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(command: Command, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let datasets = DatasetStore::from_settings(&settings.storage);
    let predictions = PredictionStore::new(&settings.storage.scores_dir);

    match command {
        Command::Split { dataset } => {
            let table = datasets.load(&dataset)?;
            let ratios = SplitRatios {
                train: settings.split.train_ratio,
                valid: settings.split.valid_ratio,
            };
            let splits = fairmatch::services::split(&table, ratios)?;
            datasets.persist_splits(&dataset, &splits)?;

            emit(&SplitSummary {
                train_rows: splits.train.len(),
                valid_rows: splits.valid.len(),
                test_rows: splits.test.len(),
            })
        }

        Command::Columns { dataset } => emit(&datasets.summary(&dataset)?),

        Command::Groups { dataset, sensitive_attribute } => {
            let groups = datasets.groups(&dataset, &sensitive_attribute)?;
            emit(&GroupList { groups })
        }

        Command::Audit {
            dataset,
            sensitive_attribute,
            matchers,
            measures,
            disparity_calculation,
            matching_threshold,
            fairness_threshold,
            group_acceptance_count,
            value_delimiter,
        } => {
            let test = datasets.load_test_split(&dataset)?;
            let matching_threshold =
                matching_threshold.unwrap_or(settings.fairness.matching_threshold);

            let options = AuditOptions {
                measures: resolve_measures(measures),
                disparity_calculation,
                fairness_threshold: fairness_threshold
                    .unwrap_or(settings.fairness.fairness_threshold),
                group_acceptance_count: group_acceptance_count
                    .unwrap_or(settings.fairness.group_acceptance_count),
                value_delimiter: value_delimiter.or(settings.fairness.value_delimiter),
            };

            let auditor = FairnessAuditor::new(&test, &sensitive_attribute);
            let mut results = BTreeMap::new();
            for matcher in dedup(matchers) {
                let scores = predictions.load(&dataset, matcher)?;
                let report = auditor.audit(&scores.decisions(matching_threshold), &options)?;
                results.insert(matcher, report);
            }

            info!(
                dataset = %dataset,
                matchers = results.len(),
                "fairness audit complete"
            );

            emit(&AuditResponse {
                dataset_id: dataset,
                sensitive_attribute,
                generated_at: chrono::Utc::now(),
                results,
            })
        }

        Command::Performance {
            dataset,
            sensitive_attribute,
            matchers,
            measures,
            matching_threshold,
        } => {
            let test = datasets.load_test_split(&dataset)?;
            let matching_threshold =
                matching_threshold.unwrap_or(settings.fairness.matching_threshold);

            let mut decision_sets = BTreeMap::new();
            for matcher in dedup(matchers) {
                let scores = predictions.load(&dataset, matcher)?;
                decision_sets.insert(matcher, scores.decisions(matching_threshold));
            }

            let analyzer = PerformanceAnalyzer::new(&test, &sensitive_attribute);
            let mut tables = BTreeMap::new();
            let mut charts = Vec::new();
            for measure in resolve_measures(measures) {
                let table = analyzer.group_table(&decision_sets, measure)?;
                let data = PerformanceAnalyzer::ensemble_frontier(&table)?;
                charts.push(EnsembleChart {
                    name: measure.performance_name().to_string(),
                    x_objective: "min".to_string(),
                    y_objective: if measure.higher_is_better() { "max" } else { "min" }
                        .to_string(),
                    data,
                });
                tables.insert(measure.performance_name().to_string(), table);
            }

            emit(&PerformanceResponse { tables, charts })
        }

        Command::Explain {
            dataset,
            sensitive_attribute,
            matcher,
            group,
            samples,
            matching_threshold,
        } => {
            let test = datasets.load_test_split(&dataset)?;
            let matching_threshold =
                matching_threshold.unwrap_or(settings.fairness.matching_threshold);
            let scores = predictions.load(&dataset, matcher)?;

            let explainer = Explainer::new(&test, &sensitive_attribute);
            let report =
                explainer.explain(&scores.decisions(matching_threshold), &group, samples)?;
            emit(&report)
        }
    }
}

fn resolve_measures(measures: Vec<FairnessMeasure>) -> Vec<FairnessMeasure> {
    if measures.is_empty() {
        FairnessMeasure::ALL.to_vec()
    } else {
        measures
    }
}

fn dedup(matchers: Vec<MatcherAlgorithm>) -> BTreeSet<MatcherAlgorithm> {
    matchers.into_iter().collect()
}

fn emit<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
