//! Proper scoring rules.
//!
//! Log score rewards confidence on the right side without bound below
//! (higher is better, max 0). Brier is bounded in [0, 1] (lower is better,
//! 0 is perfect).

use serde::Deserialize;
use std::fmt;

use crate::types::Outcome;

/// The scoring rule used for an entire run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringRule {
    Log,
    Brier,
}

impl ScoringRule {
    /// Score a belief `p` (probability of YES) against a binary outcome.
    ///
    /// Returns `None` for a non-binary outcome. A log score of a belief of
    /// exactly 0 or 1 on the wrong side is `-inf`.
    pub fn score(&self, p: f64, outcome: &Outcome) -> Option<f64> {
        let p_outcome = match outcome {
            Outcome::Yes => p,
            Outcome::No => 1.0 - p,
            Outcome::Other(_) => return None,
        };
        Some(self.score_correct_side(p_outcome))
    }

    /// Score given the probability that was assigned to what happened.
    fn score_correct_side(&self, p_outcome: f64) -> f64 {
        match self {
            ScoringRule::Log => p_outcome.log2(),
            ScoringRule::Brier => (1.0 - p_outcome).powi(2),
        }
    }

    /// Expected score of an oracle that is right with probability `p` and
    /// always states `p` on the side it believes.
    pub fn oracle_expected(&self, p: f64) -> f64 {
        match self {
            ScoringRule::Log => xlog2x(p) + xlog2x(1.0 - p),
            ScoringRule::Brier => {
                p * self.score_correct_side(p) + (1.0 - p) * self.score_correct_side(1.0 - p)
            }
        }
    }

    /// Expected score of the least informative oracle (p = 0.5).
    pub fn coin_flip(&self) -> f64 {
        self.oracle_expected(0.5)
    }

    /// Best attainable score (a perfectly confident, always right forecaster).
    pub fn best(&self) -> f64 {
        match self {
            ScoringRule::Log => 0.0,
            ScoringRule::Brier => 0.0,
        }
    }

    /// Whether score `a` is strictly better than score `b` under this rule.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        match self {
            ScoringRule::Log => a > b,
            ScoringRule::Brier => a < b,
        }
    }
}

/// `x * log2(x)` with the `0 * log2(0) = 0` limit.
fn xlog2x(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else {
        x * x.log2()
    }
}

impl fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringRule::Log => write!(f, "log"),
            ScoringRule::Brier => write!(f, "Brier"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
