//! Probability estimation.
//!
//! Reduces a market's bet history to a single belief: what the market
//! "thought" the probability of YES was. Two strategies:
//!
//! - `TimeWeighted`: duration-weighted mean of the post-trade probability
//!   over the market's whole open interval.
//! - `Snapshot`: the post-trade probability of the last bet strictly before
//!   a point `fraction` of the way through the market's life.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use crate::types::{AccuracyError, Market};

/// Allowed deviation of the summed bet weights from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.02;

/// Belief estimation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbabilityEstimator {
    TimeWeighted,
    Snapshot { fraction: f64 },
}

impl ProbabilityEstimator {
    /// Reject a snapshot fraction outside [0, 1].
    pub fn validate(&self) -> Result<(), AccuracyError> {
        match *self {
            ProbabilityEstimator::Snapshot { fraction } if !(0.0..=1.0).contains(&fraction) => {
                Err(AccuracyError::InvalidFraction(fraction))
            }
            _ => Ok(()),
        }
    }

    /// Estimate the market's belief in YES.
    ///
    /// `Ok(None)` means the market has no qualifying bets and should be
    /// excluded from scoring. Errors are data-integrity faults.
    pub fn estimate(&self, market: &Market) -> Result<Option<f64>, AccuracyError> {
        market.ensure_bets_sorted()?;
        let end = market.effective_end_time()?;

        match *self {
            ProbabilityEstimator::TimeWeighted => time_weighted(market, end),
            ProbabilityEstimator::Snapshot { fraction } => Ok(snapshot(market, end, fraction)),
        }
    }
}

impl fmt::Display for ProbabilityEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbabilityEstimator::TimeWeighted => write!(f, "time-averaged probability"),
            ProbabilityEstimator::Snapshot { fraction } => write!(
                f,
                "probability {:.1}% of the way through each market's life",
                fraction * 100.0
            ),
        }
    }
}

fn millis(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64
}

/// Per-bet weights: each bet's probability holds until the next bet (or
/// `end` for the last one), normalised by the open interval.
fn bet_weights(market: &Market, end: DateTime<Utc>) -> Result<Vec<f64>, AccuracyError> {
    let open_length = millis(end) - millis(market.created_time);
    if open_length <= 0.0 {
        return Err(AccuracyError::EmptyInterval {
            market_id: market.id.clone(),
        });
    }

    let next_times = market
        .bets
        .iter()
        .skip(1)
        .map(|b| b.created_time)
        .chain(std::iter::once(end));

    Ok(market
        .bets
        .iter()
        .zip(next_times)
        .map(|(bet, next)| (millis(next) - millis(bet.created_time)) / open_length)
        .collect())
}

fn time_weighted(market: &Market, end: DateTime<Utc>) -> Result<Option<f64>, AccuracyError> {
    if market.bets.is_empty() {
        return Ok(None);
    }

    let weights = bet_weights(market, end)?;
    let total_weight: f64 = weights.iter().sum();

    if (total_weight - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(AccuracyError::WeightOutOfTolerance {
            market_id: market.id.clone(),
            total_weight,
        });
    }

    let weighted: f64 = market
        .bets
        .iter()
        .zip(&weights)
        .map(|(bet, w)| bet.prob_after * w)
        .sum();

    let belief = weighted / total_weight;
    debug!(market_id = %market.id, total_weight, belief, "Time-weighted belief");
    Ok(Some(belief))
}

fn snapshot(market: &Market, end: DateTime<Utc>, fraction: f64) -> Option<f64> {
    let probe = millis(market.created_time) * (1.0 - fraction) + millis(end) * fraction;

    let belief = market
        .bets
        .iter()
        .take_while(|b| millis(b.created_time) < probe)
        .last()
        .map(|b| b.prob_after);

    debug!(market_id = %market.id, probe, belief = ?belief, "Snapshot belief");
    belief
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
