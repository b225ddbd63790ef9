//! Mock provider for integration testing.
//!
//! Provides a deterministic `MarketDataProvider` that serves known markets
//! and bet histories from memory, with no external dependencies.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use market_accuracy::platforms::MarketDataProvider;
use market_accuracy::types::*;

/// A mock market data provider for deterministic testing.
pub struct MockProvider {
    markets: Vec<Market>,
    bets: HashMap<String, Vec<Bet>>,
    /// Market ids in the order their bets were requested.
    bet_requests: Arc<Mutex<Vec<String>>>,
    /// If set, all operations will return this error.
    force_error: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    /// Markets are served without bets; bets come from `list_bets`.
    pub fn new(markets: Vec<Market>) -> Self {
        let bets = markets
            .iter()
            .map(|m| (m.id.clone(), m.bets.clone()))
            .collect();
        let markets = markets
            .into_iter()
            .map(|mut m| {
                m.bets.clear();
                m
            })
            .collect();

        Self {
            markets,
            bets,
            bet_requests: Arc::new(Mutex::new(Vec::new())),
            force_error: Arc::new(Mutex::new(None)),
        }
    }

    /// Force all subsequent operations to return an error.
    pub fn set_error(&self, msg: &str) {
        *self.force_error.lock().unwrap() = Some(msg.to_string());
    }

    pub fn bet_requests(&self) -> Vec<String> {
        self.bet_requests.lock().unwrap().clone()
    }

    /// Shared handle to the request log, usable after the provider is moved.
    pub fn request_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.bet_requests)
    }

    fn check_error(&self) -> Result<()> {
        if let Some(msg) = self.force_error.lock().unwrap().as_ref() {
            return Err(anyhow!("{msg}"));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataProvider for MockProvider {
    async fn list_markets(&self, _topic: &TopicSelector) -> Result<Vec<Market>> {
        self.check_error()?;
        Ok(self.markets.clone())
    }

    async fn list_bets(&self, market_id: &str) -> Result<Vec<Bet>> {
        self.check_error()?;
        self.bet_requests.lock().unwrap().push(market_id.to_string());
        self.bets
            .get(market_id)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown market: {market_id}"))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap()
}

/// A resolved `RussiaUkraine` market open for `days` days, with bets at
/// `(day offset, probAfter)`.
pub fn market(id: &str, resolution: &str, days: i64, bets: &[(i64, f64)]) -> Market {
    let open = base_time();
    Market {
        id: id.to_string(),
        question: format!("Will {id} happen?"),
        tags: vec!["RussiaUkraine".to_string()],
        group_slugs: vec!["ukraine-russia".to_string()],
        is_resolved: true,
        resolution: Some(Outcome::from(resolution)),
        created_time: open,
        close_time: Some(open + Duration::days(days)),
        resolution_time: Some(open + Duration::days(days) + Duration::hours(1)),
        bets: bets
            .iter()
            .map(|&(day, p)| Bet {
                created_time: open + Duration::days(day),
                prob_after: p,
                outcome: Outcome::Yes,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_serves_markets_without_bets() {
        let provider = MockProvider::new(vec![market("a", "YES", 10, &[(0, 0.5)])]);
        let markets = provider
            .list_markets(&TopicSelector::Tag("RussiaUkraine".into()))
            .await
            .unwrap();
        assert_eq!(markets.len(), 1);
        assert!(markets[0].bets.is_empty());

        let bets = provider.list_bets("a").await.unwrap();
        assert_eq!(bets.len(), 1);
        assert_eq!(provider.bet_requests(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_mock_unknown_market() {
        let provider = MockProvider::new(Vec::new());
        assert!(provider.list_bets("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_forced_error() {
        let provider = MockProvider::new(vec![market("a", "YES", 10, &[])]);
        provider.set_error("API down");
        let err = provider
            .list_markets(&TopicSelector::Tag("RussiaUkraine".into()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API down"));
    }
}
