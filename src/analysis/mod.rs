//! Forecast accuracy analysis.
//!
//! The pure core of the crate: cohort filtering, belief estimation,
//! scoring, and oracle equivalence. Nothing here performs I/O.

pub mod estimator;
pub mod filter;
pub mod oracle;
pub mod pipeline;
pub mod report;
pub mod scoring;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::types::{AccuracyError, TopicSelector};

pub use estimator::ProbabilityEstimator;
pub use oracle::OracleEquivalence;
pub use pipeline::{Analyzer, CohortScores, MarketScore};
pub use report::{CohortReport, Diagnostics};
pub use scoring::ScoringRule;

/// Everything that selects and scores a cohort. Fixed for a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisConfig {
    pub topic: TopicSelector,
    pub estimator: ProbabilityEstimator,
    pub scoring_rule: ScoringRule,
    /// Only markets whose effective end time is at or before this instant.
    #[serde(default)]
    pub resolve_by: Option<DateTime<Utc>>,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AccuracyError> {
        if self.topic.name().trim().is_empty() {
            return Err(AccuracyError::Config("topic must not be empty".into()));
        }
        self.estimator.validate()
    }
}
