//! Textual cohort report.

use std::fmt;

use super::oracle::OracleEquivalence;
use super::pipeline::MarketScore;
use super::AnalysisConfig;
use crate::types::{Exclusion, ExclusionCounts};

/// Retrieval-side observations that do not affect the numbers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    pub markets_fetched: usize,
    /// Human-readable notes about result counts that look like a page cap.
    pub truncation_warnings: Vec<String>,
}

impl Diagnostics {
    pub fn truncation_suspected(&self) -> bool {
        !self.truncation_warnings.is_empty()
    }
}

/// Final result of an analysis run.
#[derive(Debug, Clone)]
pub struct CohortReport {
    pub config: AnalysisConfig,
    pub analyzed: usize,
    pub excluded: ExclusionCounts,
    pub mean_score: f64,
    /// Fraction of analysed markets that resolved YES.
    pub proportion_yes: f64,
    pub oracle: OracleEquivalence,
    pub market_scores: Vec<MarketScore>,
    pub diagnostics: Diagnostics,
}

impl fmt::Display for CohortReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Topic: {}", self.config.topic)?;
        writeln!(f, "Analyzing {}", self.config.estimator)?;
        if let Some(deadline) = self.config.resolve_by {
            writeln!(f, "Resolved by: {}", deadline.to_rfc3339())?;
        }
        writeln!(f, "Markets fetched: {}", self.diagnostics.markets_fetched)?;
        writeln!(f, "Number of markets analyzed: {}", self.analyzed)?;

        for reason in [
            Exclusion::OffTopic,
            Exclusion::Unresolved,
            Exclusion::AfterDeadline,
            Exclusion::NonBinary,
            Exclusion::NoQualifyingBets,
        ] {
            writeln!(f, "  Excluded ({reason}): {}", self.excluded.get(reason))?;
        }

        writeln!(
            f,
            "Average {} score: {:.6}",
            self.config.scoring_rule, self.mean_score
        )?;
        writeln!(
            f,
            "Proportion resolving YES: {:.1}%",
            self.proportion_yes * 100.0
        )?;
        writeln!(f, "{}", self.oracle)?;

        for warning in &self.diagnostics.truncation_warnings {
            writeln!(f, "WARNING: {warning}")?;
        }
        Ok(())
    }
}
