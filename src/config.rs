//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the path given on the command line / in
//! `ACCURACY_CONFIG`) and deserializes into strongly-typed structs. The
//! result is fixed for the whole run.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::analysis::AnalysisConfig;

/// Default config file path.
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Environment variable that overrides the config path.
pub const CONFIG_ENV: &str = "ACCURACY_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Market data provider settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Markets requested per listing call (Manifold caps at 1000).
    pub market_limit: u32,
    /// Bets per page when walking a market's history (Manifold caps at 1000).
    pub bet_limit: u32,
    pub request_timeout_secs: u64,
    /// Bet requests in flight at once.
    pub concurrency: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.manifold.markets/v0".to_string(),
            market_limit: 1000,
            bet_limit: 1000,
            request_timeout_secs: 30,
            concurrency: 8,
        }
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the run meaningless.
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;
        if self.provider.concurrency == 0 {
            anyhow::bail!("provider.concurrency must be at least 1");
        }
        if self.provider.market_limit == 0 || self.provider.bet_limit == 0 {
            anyhow::bail!("provider limits must be at least 1");
        }
        Ok(())
    }

    /// Config path: first CLI argument, then `ACCURACY_CONFIG`, then the default.
    pub fn resolve_path(cli_arg: Option<String>) -> String {
        cli_arg
            .or_else(|| std::env::var(CONFIG_ENV).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string())
    }
}
