// Core fairness computation exports
pub mod auditor;
pub mod disparity;
pub mod explain;
pub mod metrics;
pub mod performance;
pub mod subgroups;

pub use auditor::{AuditOptions, FairnessAuditor, FairnessError};
pub use explain::Explainer;
pub use metrics::GroupOutcomes;
pub use performance::{PerformanceAnalyzer, ENSEMBLE_COMBINATION_LIMIT};
pub use subgroups::{FairnessScope, SubgroupIndex};
