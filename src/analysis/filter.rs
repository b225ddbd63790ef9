//! Cohort selection.
//!
//! Keeps resolved markets under the configured topic that ended at or
//! before the optional resolution deadline. Everything else is counted,
//! not dropped silently.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::{AccuracyError, Exclusion, ExclusionCounts, Market, TopicSelector};

/// Topic and deadline constraints for the cohort.
#[derive(Debug, Clone)]
pub struct MarketFilter {
    pub topic: TopicSelector,
    pub resolve_by: Option<DateTime<Utc>>,
}

impl MarketFilter {
    pub fn new(topic: TopicSelector, resolve_by: Option<DateTime<Utc>>) -> Self {
        Self { topic, resolve_by }
    }

    /// Decide whether a single market belongs to the cohort.
    ///
    /// `Ok(None)` means keep. A market without any end time is fatal.
    pub fn classify(&self, market: &Market) -> Result<Option<Exclusion>, AccuracyError> {
        if !market.matches_topic(&self.topic) {
            return Ok(Some(Exclusion::OffTopic));
        }
        if !market.is_resolved {
            return Ok(Some(Exclusion::Unresolved));
        }

        let end = market.effective_end_time()?;
        if let Some(deadline) = self.resolve_by {
            if end > deadline {
                return Ok(Some(Exclusion::AfterDeadline));
            }
        }
        Ok(None)
    }

    /// Split `markets` into the cohort and per-reason exclusion counts.
    pub fn apply(
        &self,
        markets: Vec<Market>,
    ) -> Result<(Vec<Market>, ExclusionCounts), AccuracyError> {
        let mut kept = Vec::with_capacity(markets.len());
        let mut excluded = ExclusionCounts::default();

        for market in markets {
            match self.classify(&market)? {
                None => kept.push(market),
                Some(reason) => {
                    debug!(%market, %reason, "Market filtered out");
                    excluded.record(reason);
                }
            }
        }

        Ok((kept, excluded))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
