// Model exports
pub mod domain;
pub mod responses;
pub mod table;

pub use domain::{DisparityCalculation, FairnessMeasure, MatcherAlgorithm, OptionParseError, PerformanceMetric};
pub use responses::{
    AuditResponse, ConfusionMatrixReport, CoverageRow, DatasetSummary, EnsembleChart,
    EnsemblePoint, ExplanationReport, FairnessReport, GroupList, MeasureFindings, MetricValue,
    OverallPerformance, PerformanceResponse, PerformanceRow, PerformanceTable, SplitSummary,
    SubgroupFinding, TableSlice,
};
pub use table::{PairTable, TableError};
