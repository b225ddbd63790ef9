//! Manifold Markets read-only integration.
//!
//! API docs: https://docs.manifold.markets/api
//! Base URL: https://api.manifold.markets/v0/
//! Auth: Not required for reads.
//! Pagination: market listings are a single page capped by `limit` (API max
//! 1000). Bets come newest first and are walked back with `before=<bet id>`.
//! Timestamps: ms since epoch.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, warn};

use super::MarketDataProvider;
use crate::config::ProviderConfig;
use crate::types::{Bet, Market, Outcome, TopicSelector};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const PLATFORM_NAME: &str = "manifold";

/// Upper bound on bet pages fetched for a single market.
const MAX_BET_PAGES: usize = 200;

// ---------------------------------------------------------------------------
// API response types (Manifold JSON → Rust)
// ---------------------------------------------------------------------------

/// Manifold `LiteMarket` as returned by `/v0/markets` and
/// `/v0/search-markets`. Only the fields we need.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifoldLiteMarket {
    id: String,
    #[serde(default)]
    question: String,

    /// "BINARY", "MULTIPLE_CHOICE", etc.
    #[serde(default)]
    outcome_type: Option<String>,

    #[serde(default)]
    is_resolved: bool,
    /// "YES", "NO", "MKT", "CANCEL", or an answer id.
    #[serde(default)]
    resolution: Option<String>,

    /// Created timestamp (ms since epoch).
    created_time: i64,
    #[serde(default)]
    close_time: Option<i64>,
    #[serde(default)]
    resolution_time: Option<i64>,

    /// Legacy free-form tags.
    #[serde(default)]
    tags: Vec<String>,
    /// Topics / group slugs tagged on this market.
    #[serde(default)]
    group_slugs: Option<Vec<String>>,
}

/// A bet from `/v0/bets`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifoldBet {
    id: String,
    created_time: i64,
    prob_after: f64,
    /// "YES" / "NO" for binary markets.
    outcome: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Manifold Markets data client.
pub struct ManifoldClient {
    http: Client,
    base_url: String,
    market_limit: u32,
    bet_limit: u32,
}

impl ManifoldClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("market-accuracy/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for Manifold")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            market_limit: config.market_limit,
            bet_limit: config.bet_limit,
        })
    }

    // -- Internal helpers ------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(url = %url, "Fetching from Manifold");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .context("Manifold API request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Manifold API error {status}: {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse Manifold response from {url}"))
    }

    fn markets_url(&self, topic: &TopicSelector) -> String {
        match topic {
            // Tags are not a server-side filter; fetch a page and filter locally.
            TopicSelector::Tag(_) => format!("{}/markets?limit={}", self.base_url, self.market_limit),
            TopicSelector::Group(slug) => format!(
                "{}/search-markets?term=&topicSlug={}&filter=resolved&contractType=BINARY&limit={}",
                self.base_url,
                urlencoding::encode(slug),
                self.market_limit,
            ),
        }
    }

    fn bets_url(&self, market_id: &str, before: Option<&str>) -> String {
        let mut url = format!(
            "{}/bets?contractId={}&limit={}",
            self.base_url,
            urlencoding::encode(market_id),
            self.bet_limit,
        );
        if let Some(before) = before {
            url.push_str("&before=");
            url.push_str(&urlencoding::encode(before));
        }
        url
    }

    /// Convert a Manifold API timestamp (ms since epoch) to `DateTime<Utc>`.
    fn ms_to_datetime(ms: i64) -> Result<DateTime<Utc>> {
        Utc.timestamp_millis_opt(ms)
            .single()
            .with_context(|| format!("Timestamp out of range: {ms}"))
    }

    /// Convert a `ManifoldLiteMarket` to the domain `Market` (without bets).
    fn to_market(m: ManifoldLiteMarket, topic: &TopicSelector) -> Result<Market> {
        let mut group_slugs = m.group_slugs.unwrap_or_default();
        // search-markets already scoped the results to this group
        if let TopicSelector::Group(slug) = topic {
            if !group_slugs.iter().any(|g| g == slug) {
                group_slugs.push(slug.clone());
            }
        }

        Ok(Market {
            created_time: Self::ms_to_datetime(m.created_time)?,
            close_time: m.close_time.map(Self::ms_to_datetime).transpose()?,
            resolution_time: m.resolution_time.map(Self::ms_to_datetime).transpose()?,
            resolution: m.resolution.as_deref().map(Outcome::from),
            id: m.id,
            question: m.question,
            tags: m.tags,
            group_slugs,
            is_resolved: m.is_resolved,
            bets: Vec::new(),
        })
    }

    fn to_bet(b: ManifoldBet) -> Result<Bet> {
        Ok(Bet {
            created_time: Self::ms_to_datetime(b.created_time)?,
            prob_after: b.prob_after,
            outcome: Outcome::from(b.outcome.as_str()),
        })
    }
}

// ---------------------------------------------------------------------------
// MarketDataProvider trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl MarketDataProvider for ManifoldClient {
    async fn list_markets(&self, topic: &TopicSelector) -> Result<Vec<Market>> {
        let url = self.markets_url(topic);
        let raw: Vec<ManifoldLiteMarket> = self.get_json(&url).await?;

        debug!(
            count = raw.len(),
            non_binary = raw
                .iter()
                .filter(|m| m.outcome_type.as_deref().is_some_and(|t| t != "BINARY"))
                .count(),
            "Manifold markets fetched"
        );

        raw.into_iter()
            .map(|m| Self::to_market(m, topic))
            .collect()
    }

    async fn list_bets(&self, market_id: &str) -> Result<Vec<Bet>> {
        let raw = fetch_bet_pages(self.bet_limit as usize, |before| async move {
            let url = self.bets_url(market_id, before.as_deref());
            self.get_json::<Vec<ManifoldBet>>(&url)
                .await
                .with_context(|| format!("Failed to fetch bets for market {market_id}"))
        })
        .await?;

        let mut bets = raw
            .into_iter()
            .map(Self::to_bet)
            .collect::<Result<Vec<_>>>()?;
        // The API returns newest first
        bets.sort_by_key(|b| b.created_time);
        Ok(bets)
    }

    fn name(&self) -> &str {
        PLATFORM_NAME
    }
}

/// Walk a newest-first bet listing back to the first bet.
///
/// `fetch_page` receives the id of the oldest bet seen so far (`None` for the
/// first page). Stops on a short page, an empty page, or a page that makes no
/// progress.
async fn fetch_bet_pages<F, Fut>(page_size: usize, mut fetch_page: F) -> Result<Vec<ManifoldBet>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Vec<ManifoldBet>>>,
{
    let mut bets: Vec<ManifoldBet> = Vec::new();
    let mut before: Option<String> = None;

    for page_number in 0..MAX_BET_PAGES {
        let page = fetch_page(before.clone()).await?;
        let oldest = page.last().map(|b| b.id.clone());
        if oldest.is_some() && oldest == before {
            warn!(page = page_number, "Bet listing ignored the page cursor");
            return Ok(bets);
        }

        let full = page_size > 0 && page.len() >= page_size;
        debug!(page = page_number, bets = page.len(), "Bet page fetched");
        bets.extend(page);

        match oldest {
            Some(id) if full => before = Some(id),
            _ => return Ok(bets),
        }
    }

    warn!(pages = MAX_BET_PAGES, bets = bets.len(), "Bet history page cap reached");
    Ok(bets)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
