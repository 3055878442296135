//! Fairmatch - fairness auditing engine for entity-matching classifiers
//!
//! This library evaluates fairness disparities of entity-matching
//! (record-linkage) classifiers across sensitive demographic groups. It
//! computes per-group performance parity metrics over a labeled test split
//! and aggregates disparities for single-attribute and pairwise-attribute
//! subgroups.

pub mod config;
pub mod core;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use crate::core::{AuditOptions, FairnessAuditor, FairnessError, PerformanceAnalyzer};
pub use crate::models::{
    DisparityCalculation, FairnessMeasure, FairnessReport, MatcherAlgorithm, PairTable,
    SubgroupFinding,
};
