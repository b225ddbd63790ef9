//! Market collection.
//!
//! Pulls the market listing from a provider, narrows it to the cohort,
//! then fetches each cohort market's bets with bounded concurrency.
//! `buffered` keeps results in input order, so the fan-out never changes
//! what the pipeline sees.

use anyhow::{Context, Result};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::analysis::{Analyzer, CohortReport, Diagnostics};
use crate::platforms::MarketDataProvider;
use crate::types::{ExclusionCounts, Market};

/// Result counts that are a round multiple of this look like a page cap.
const ROUND_COUNT: usize = 100;

/// Whether a result count looks like the provider stopped at a page limit.
pub fn looks_truncated(count: usize) -> bool {
    count >= ROUND_COUNT && count % ROUND_COUNT == 0
}

/// A round count, or exactly the limit that was requested.
pub fn hits_limit(count: usize, limit: Option<usize>) -> bool {
    looks_truncated(count) || (count > 0 && limit == Some(count))
}

/// Cohort markets with their bets, plus what was filtered out on the way.
#[derive(Debug)]
pub struct Collected {
    pub cohort: Vec<Market>,
    pub excluded: ExclusionCounts,
    pub diagnostics: Diagnostics,
}

/// Drives a provider to assemble a cohort.
pub struct Collector<P> {
    provider: P,
    concurrency: usize,
    market_limit: Option<usize>,
    bet_limit: Option<usize>,
}

impl<P: MarketDataProvider> Collector<P> {
    pub fn new(provider: P, concurrency: usize) -> Self {
        Self {
            provider,
            concurrency: concurrency.max(1),
            market_limit: None,
            bet_limit: None,
        }
    }

    /// Record the page limits the provider was asked for, so counts equal
    /// to them are flagged as well.
    pub fn with_limits(mut self, market_limit: usize, bet_limit: usize) -> Self {
        self.market_limit = Some(market_limit);
        self.bet_limit = Some(bet_limit);
        self
    }

    /// List markets, filter them, and attach bets to the survivors.
    pub async fn collect(&self, analyzer: &Analyzer) -> Result<Collected> {
        let topic = &analyzer.config().topic;
        info!(%topic, "Fetching markets");

        let markets = self
            .provider
            .list_markets(topic)
            .await
            .context("Failed to list markets")?;

        let mut diagnostics = Diagnostics {
            markets_fetched: markets.len(),
            ..Diagnostics::default()
        };
        if hits_limit(markets.len(), self.market_limit) {
            let note = format!(
                "market listing returned exactly {} records; results may be truncated",
                markets.len()
            );
            warn!(count = markets.len(), "Market listing may be truncated");
            diagnostics.truncation_warnings.push(note);
        }

        let (cohort, excluded) = analyzer.filter().apply(markets)?;
        info!(
            fetched = diagnostics.markets_fetched,
            cohort = cohort.len(),
            excluded = excluded.total(),
            "Markets filtered"
        );

        let provider = &self.provider;
        let cohort: Vec<Market> = stream::iter(cohort)
            .map(|mut market| async move {
                let bets = provider
                    .list_bets(&market.id)
                    .await
                    .with_context(|| format!("Failed to fetch bets for market {}", market.id))?;
                debug!(market_id = %market.id, bets = bets.len(), "Bets fetched");
                market.bets = bets;
                Ok::<_, anyhow::Error>(market)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        for market in cohort
            .iter()
            .filter(|m| hits_limit(m.bets.len(), self.bet_limit))
        {
            warn!(market_id = %market.id, bets = market.bets.len(), "Bet history may be truncated");
            diagnostics.truncation_warnings.push(format!(
                "market {} returned exactly {} bets; history may be truncated",
                market.id,
                market.bets.len()
            ));
        }

        Ok(Collected {
            cohort,
            excluded,
            diagnostics,
        })
    }

    /// Collect, score, and summarise in one go.
    pub async fn run(&self, analyzer: &Analyzer) -> Result<CohortReport> {
        let collected = self.collect(analyzer).await?;
        let scores = analyzer.score_cohort(&collected.cohort, collected.excluded)?;
        let report = analyzer.summarize(scores, collected.diagnostics)?;
        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
