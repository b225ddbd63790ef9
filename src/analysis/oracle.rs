//! Oracle equivalence.
//!
//! Inverts a scoring rule's expected-oracle function: given a cohort's mean
//! score S, find p* in (0.5, 1) such that an oracle that is right with
//! probability p* (and says so) would average S.

use std::fmt;
use tracing::debug;

use super::scoring::ScoringRule;
use crate::types::AccuracyError;

/// Initial bisection bracket.
const BRACKET: (f64, f64) = (0.501, 0.999);

/// Outermost bracket, used when the root lies outside `BRACKET`.
const OUTER_BRACKET: (f64, f64) = (0.5 + 1e-12, 1.0 - 1e-15);

const TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 200;

/// Result of inverting the expected-oracle function.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleEquivalence {
    /// The cohort scored as well as an oracle right with `probability`.
    Equivalent {
        probability: f64,
        /// The oracle's expected score at `probability`, for cross-checking.
        oracle_score: f64,
    },
    /// The cohort did no better than always saying 50%.
    NoBetterThanCoinFlip { mean_score: f64, coin_flip_score: f64 },
}

impl fmt::Display for OracleEquivalence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleEquivalence::Equivalent {
                probability,
                oracle_score,
            } => write!(
                f,
                "As good as an oracle that knows the answer with probability {probability:.6} \
                 (that oracle would average {oracle_score:.6})"
            ),
            OracleEquivalence::NoBetterThanCoinFlip {
                mean_score,
                coin_flip_score,
            } => write!(
                f,
                "Mean score {mean_score:.6} is no better than a coin flip ({coin_flip_score:.6}); \
                 no equivalent oracle"
            ),
        }
    }
}

/// Mean of a cohort's scores. An empty cohort has no mean.
pub fn mean_score(scores: &[f64]) -> Result<f64, AccuracyError> {
    if scores.is_empty() {
        return Err(AccuracyError::EmptyCohort);
    }
    Ok(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Find the oracle probability whose expected score equals `mean`.
pub fn solve(rule: ScoringRule, mean: f64) -> OracleEquivalence {
    let coin_flip = rule.coin_flip();
    if !rule.is_better(mean, coin_flip) {
        debug!(%rule, mean, coin_flip, "Cohort no better than coin flip");
        return OracleEquivalence::NoBetterThanCoinFlip {
            mean_score: mean,
            coin_flip_score: coin_flip,
        };
    }

    // At or beyond the best attainable score only a perfect oracle matches.
    if !rule.is_better(rule.best(), mean) {
        return OracleEquivalence::Equivalent {
            probability: 1.0,
            oracle_score: rule.oracle_expected(1.0),
        };
    }

    let residual = |p: f64| rule.oracle_expected(p) - mean;
    let (lo, hi) = if brackets_root(&residual, BRACKET) {
        BRACKET
    } else {
        OUTER_BRACKET
    };
    let probability = bisect(&residual, lo, hi);
    let oracle_score = rule.oracle_expected(probability);

    debug!(%rule, mean, probability, oracle_score, "Oracle equivalence solved");
    OracleEquivalence::Equivalent {
        probability,
        oracle_score,
    }
}

fn brackets_root(f: &impl Fn(f64) -> f64, (lo, hi): (f64, f64)) -> bool {
    f(lo) * f(hi) <= 0.0
}

/// Bisection on a bracket where `f` changes sign (monotone on (0.5, 1)).
/// If the root sits outside the bracket the nearer end is returned.
fn bisect(f: &impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    let f_lo = f(lo);
    if f_lo == 0.0 {
        return lo;
    }
    let lo_sign = f_lo.signum();

    for _ in 0..MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || (hi - lo) < TOLERANCE {
            return mid;
        }
        if f_mid.signum() == lo_sign {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
