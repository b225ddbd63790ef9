//! Cohort scoring pipeline.
//!
//! filter → per-market binary check → estimate → score → mean → oracle.
//! Each market is scored independently, so shards of a cohort can be
//! scored separately and combined with [`CohortScores::merge`].

use tracing::{debug, info, warn};

use super::filter::MarketFilter;
use super::oracle::{self, OracleEquivalence};
use super::report::{CohortReport, Diagnostics};
use super::AnalysisConfig;
use crate::types::{AccuracyError, Exclusion, ExclusionCounts, Market, Outcome};

/// One scored market.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketScore {
    pub market_id: String,
    pub question: String,
    pub belief: f64,
    pub outcome: Outcome,
    pub score: f64,
}

/// Scores and exclusion counters for a cohort (or a shard of one).
#[derive(Debug, Clone, Default)]
pub struct CohortScores {
    pub scores: Vec<MarketScore>,
    pub excluded: ExclusionCounts,
}

impl CohortScores {
    /// Append another shard's results.
    pub fn merge(&mut self, other: CohortScores) {
        self.scores.extend(other.scores);
        self.excluded.merge(&other.excluded);
    }

    pub fn values(&self) -> Vec<f64> {
        self.scores.iter().map(|s| s.score).collect()
    }

    /// Fraction of scored markets that resolved YES.
    pub fn proportion_yes(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let yes = self
            .scores
            .iter()
            .filter(|s| s.outcome == Outcome::Yes)
            .count();
        Some(yes as f64 / self.scores.len() as f64)
    }
}

/// Runs the analysis for one immutable configuration.
pub struct Analyzer {
    config: AnalysisConfig,
    filter: MarketFilter,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, AccuracyError> {
        config.validate()?;
        let filter = MarketFilter::new(config.topic.clone(), config.resolve_by);
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn filter(&self) -> &MarketFilter {
        &self.filter
    }

    /// Score a single market that already passed the filter.
    ///
    /// The outer `Result` carries fatal faults; the inner one a counted
    /// exclusion.
    pub fn score_market(
        &self,
        market: &Market,
    ) -> Result<Result<MarketScore, Exclusion>, AccuracyError> {
        if !market.is_binary() {
            return Ok(Err(Exclusion::NonBinary));
        }
        let outcome = match &market.resolution {
            Some(o) => o.clone(),
            None => return Ok(Err(Exclusion::NonBinary)),
        };

        let belief = match self.config.estimator.estimate(market)? {
            Some(b) => b,
            None => return Ok(Err(Exclusion::NoQualifyingBets)),
        };

        let score = match self.config.scoring_rule.score(belief, &outcome) {
            Some(s) => s,
            None => return Ok(Err(Exclusion::NonBinary)),
        };

        if !score.is_finite() {
            warn!(
                market_id = %market.id,
                belief,
                %outcome,
                "Certain belief on the wrong side; score is unbounded"
            );
        }

        Ok(Ok(MarketScore {
            market_id: market.id.clone(),
            question: market.question.clone(),
            belief,
            outcome,
            score,
        }))
    }

    /// Filter and score a batch of markets.
    pub fn score_markets(&self, markets: Vec<Market>) -> Result<CohortScores, AccuracyError> {
        let (cohort, excluded) = self.filter.apply(markets)?;
        self.score_cohort(&cohort, excluded)
    }

    /// Score markets that already passed the filter, starting from the
    /// filter's exclusion counts.
    pub fn score_cohort(
        &self,
        cohort: &[Market],
        excluded: ExclusionCounts,
    ) -> Result<CohortScores, AccuracyError> {
        let mut result = CohortScores {
            scores: Vec::with_capacity(cohort.len()),
            excluded,
        };

        for market in cohort {
            match self.score_market(market)? {
                Ok(scored) => {
                    debug!(
                        market_id = %scored.market_id,
                        belief = scored.belief,
                        outcome = %scored.outcome,
                        score = scored.score,
                        "Market scored"
                    );
                    result.scores.push(scored);
                }
                Err(reason) => {
                    debug!(market_id = %market.id, %reason, "Market excluded");
                    result.excluded.record(reason);
                }
            }
        }

        Ok(result)
    }

    /// Reduce cohort scores to the final report.
    pub fn summarize(
        &self,
        cohort: CohortScores,
        diagnostics: Diagnostics,
    ) -> Result<CohortReport, AccuracyError> {
        let mean = oracle::mean_score(&cohort.values())?;
        let proportion_yes = cohort.proportion_yes().unwrap_or(0.0);
        let oracle = oracle::solve(self.config.scoring_rule, mean);

        match &oracle {
            OracleEquivalence::Equivalent { probability, .. } => info!(
                analyzed = cohort.scores.len(),
                mean_score = mean,
                oracle_probability = probability,
                "Cohort analysed"
            ),
            OracleEquivalence::NoBetterThanCoinFlip { .. } => info!(
                analyzed = cohort.scores.len(),
                mean_score = mean,
                "Cohort analysed; no better than a coin flip"
            ),
        }

        Ok(CohortReport {
            config: self.config.clone(),
            analyzed: cohort.scores.len(),
            excluded: cohort.excluded,
            mean_score: mean,
            proportion_yes,
            oracle,
            market_scores: cohort.scores,
            diagnostics,
        })
    }

    /// Full pipeline over an in-memory market collection.
    pub fn run(&self, markets: Vec<Market>) -> Result<CohortReport, AccuracyError> {
        let diagnostics = Diagnostics {
            markets_fetched: markets.len(),
            ..Diagnostics::default()
        };
        let cohort = self.score_markets(markets)?;
        self.summarize(cohort, diagnostics)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
