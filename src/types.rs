//! Shared types for market accuracy analysis.
//!
//! Markets and bets as the core sees them, after the provider layer has
//! translated platform JSON. Everything here is immutable once fetched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// A market resolution or the side a bet was placed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Yes,
    No,
    /// Anything else the platform reports: "MKT", "CANCEL", answer ids, ...
    Other(String),
}

impl Outcome {
    /// Whether this is one of the two binary sides.
    pub fn is_binary(&self) -> bool {
        matches!(self, Outcome::Yes | Outcome::No)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Yes => write!(f, "YES"),
            Outcome::No => write!(f, "NO"),
            Outcome::Other(s) => write!(f, "{s}"),
        }
    }
}

/// Platform outcome string (case-sensitive, as Manifold sends it).
impl From<&str> for Outcome {
    fn from(s: &str) -> Self {
        match s {
            "YES" => Outcome::Yes,
            "NO" => Outcome::No,
            other => Outcome::Other(other.to_string()),
        }
    }
}

impl std::str::FromStr for Outcome {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Outcome::from(s))
    }
}

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

/// Which markets make up the cohort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicSelector {
    /// Free-form market tag (e.g. `RussiaUkraine`).
    Tag(String),
    /// Topic group slug (e.g. `ukraine-russia`).
    Group(String),
}

impl TopicSelector {
    pub fn name(&self) -> &str {
        match self {
            TopicSelector::Tag(s) | TopicSelector::Group(s) => s,
        }
    }
}

impl fmt::Display for TopicSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicSelector::Tag(t) => write!(f, "tag '{t}'"),
            TopicSelector::Group(g) => write!(f, "group '{g}'"),
        }
    }
}

// ---------------------------------------------------------------------------
// Market & Bet
// ---------------------------------------------------------------------------

/// A single trade on a market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub created_time: DateTime<Utc>,
    /// Implied market probability right after this bet (0.0–1.0).
    pub prob_after: f64,
    pub outcome: Outcome,
}

/// A market with its full bet history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub question: String,
    /// Legacy free-form tags.
    pub tags: Vec<String>,
    /// Topic group slugs.
    pub group_slugs: Vec<String>,
    pub is_resolved: bool,
    /// `None` when the market has not resolved (or resolved to nothing).
    pub resolution: Option<Outcome>,
    pub created_time: DateTime<Utc>,
    pub close_time: Option<DateTime<Utc>>,
    pub resolution_time: Option<DateTime<Utc>>,
    /// Sorted ascending by `created_time`.
    pub bets: Vec<Bet>,
}

impl Market {
    /// When the market stopped carrying information: the earlier of close
    /// and resolution time.
    pub fn effective_end_time(&self) -> Result<DateTime<Utc>, AccuracyError> {
        match (self.close_time, self.resolution_time) {
            (Some(c), Some(r)) => Ok(c.min(r)),
            (Some(c), None) => Ok(c),
            (None, Some(r)) => Ok(r),
            (None, None) => Err(AccuracyError::MissingEndTime {
                market_id: self.id.clone(),
            }),
        }
    }

    /// Whether the market is tagged or grouped under `topic`.
    pub fn matches_topic(&self, topic: &TopicSelector) -> bool {
        match topic {
            TopicSelector::Tag(tag) => self.tags.iter().any(|t| t == tag),
            TopicSelector::Group(slug) => self.group_slugs.iter().any(|g| g == slug),
        }
    }

    /// Every bet is on YES or NO and the market resolved YES or NO.
    pub fn is_binary(&self) -> bool {
        let resolved_binary = self.resolution.as_ref().is_some_and(Outcome::is_binary);
        resolved_binary && self.bets.iter().all(|b| b.outcome.is_binary())
    }

    /// Check the ascending-timestamp precondition on `bets`.
    pub fn ensure_bets_sorted(&self) -> Result<(), AccuracyError> {
        if self
            .bets
            .windows(2)
            .any(|w| w[1].created_time < w[0].created_time)
        {
            return Err(AccuracyError::UnsortedBets {
                market_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Helper to build a test market with sensible defaults.
    #[cfg(test)]
    pub fn sample(id: &str) -> Self {
        use chrono::TimeZone;
        Market {
            id: id.to_string(),
            question: format!("Will {id} happen?"),
            tags: vec!["RussiaUkraine".to_string()],
            group_slugs: vec!["ukraine-russia".to_string()],
            is_resolved: true,
            resolution: Some(Outcome::Yes),
            created_time: Utc.timestamp_millis_opt(0).unwrap(),
            close_time: Some(Utc.timestamp_millis_opt(100).unwrap()),
            resolution_time: None,
            bets: Vec::new(),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolution = self
            .resolution
            .as_ref()
            .map(|o| o.to_string())
            .unwrap_or_else(|| "unresolved".to_string());
        write!(
            f,
            "[{}] {} ({} bets, {})",
            self.id,
            self.question,
            self.bets.len(),
            resolution,
        )
    }
}

// ---------------------------------------------------------------------------
// Exclusions
// ---------------------------------------------------------------------------

/// Why a market did not contribute a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exclusion {
    OffTopic,
    Unresolved,
    AfterDeadline,
    NonBinary,
    NoQualifyingBets,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::OffTopic => write!(f, "off topic"),
            Exclusion::Unresolved => write!(f, "unresolved"),
            Exclusion::AfterDeadline => write!(f, "resolved after deadline"),
            Exclusion::NonBinary => write!(f, "non-binary"),
            Exclusion::NoQualifyingBets => write!(f, "no qualifying bets"),
        }
    }
}

/// Per-reason exclusion counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExclusionCounts {
    pub off_topic: usize,
    pub unresolved: usize,
    pub after_deadline: usize,
    pub non_binary: usize,
    pub no_qualifying_bets: usize,
}

impl ExclusionCounts {
    pub fn record(&mut self, reason: Exclusion) {
        match reason {
            Exclusion::OffTopic => self.off_topic += 1,
            Exclusion::Unresolved => self.unresolved += 1,
            Exclusion::AfterDeadline => self.after_deadline += 1,
            Exclusion::NonBinary => self.non_binary += 1,
            Exclusion::NoQualifyingBets => self.no_qualifying_bets += 1,
        }
    }

    pub fn get(&self, reason: Exclusion) -> usize {
        match reason {
            Exclusion::OffTopic => self.off_topic,
            Exclusion::Unresolved => self.unresolved,
            Exclusion::AfterDeadline => self.after_deadline,
            Exclusion::NonBinary => self.non_binary,
            Exclusion::NoQualifyingBets => self.no_qualifying_bets,
        }
    }

    /// Sum two sets of counters (merging independently analysed shards).
    pub fn merge(&mut self, other: &ExclusionCounts) {
        self.off_topic += other.off_topic;
        self.unresolved += other.unresolved;
        self.after_deadline += other.after_deadline;
        self.non_binary += other.non_binary;
        self.no_qualifying_bets += other.no_qualifying_bets;
    }

    pub fn total(&self) -> usize {
        self.off_topic
            + self.unresolved
            + self.after_deadline
            + self.non_binary
            + self.no_qualifying_bets
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Faults that abort an analysis run.
#[derive(Debug, thiserror::Error)]
pub enum AccuracyError {
    #[error("Market {market_id} has neither a close nor a resolution time")]
    MissingEndTime { market_id: String },

    #[error("Market {market_id} bet weights sum to {total_weight:.4}, expected 1.0 ± 0.02")]
    WeightOutOfTolerance { market_id: String, total_weight: f64 },

    #[error("Market {market_id} bets are not sorted by timestamp")]
    UnsortedBets { market_id: String },

    #[error("Market {market_id} has a non-positive open interval")]
    EmptyInterval { market_id: String },

    #[error("No markets left to score; mean score is undefined")]
    EmptyCohort,

    #[error("Snapshot fraction must be within [0, 1], got {0}")]
    InvalidFraction(f64),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
