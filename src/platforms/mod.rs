//! Market data providers.
//!
//! Defines the read-only `MarketDataProvider` trait. The only
//! implementation is Manifold Markets.

pub mod manifold;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{Bet, Market, TopicSelector};

/// Read-only source of resolved markets and their bets.
///
/// `list_markets` may return markets with an empty `bets` list; the
/// collector fills them in through `list_bets`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch markets, narrowed to `topic` where the platform supports it.
    async fn list_markets(&self, topic: &TopicSelector) -> Result<Vec<Market>>;

    /// Fetch every bet on a market, sorted ascending by timestamp.
    async fn list_bets(&self, market_id: &str) -> Result<Vec<Bet>>;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
