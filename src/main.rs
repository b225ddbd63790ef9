//! Market accuracy CLI.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! fetches the cohort from Manifold, scores it, and prints the report.

use anyhow::Result;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use market_accuracy::analysis::Analyzer;
use market_accuracy::config::AppConfig;
use market_accuracy::engine::Collector;
use market_accuracy::platforms::manifold::ManifoldClient;
use market_accuracy::platforms::MarketDataProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let path = AppConfig::resolve_path(std::env::args().nth(1));
    let cfg = AppConfig::load(&path)?;

    let run_id = Uuid::new_v4();
    let span = info_span!("analysis", %run_id);

    let result = async {
        info!(
            config = %path,
            topic = %cfg.analysis.topic,
            estimator = %cfg.analysis.estimator,
            scoring_rule = %cfg.analysis.scoring_rule,
            resolve_by = ?cfg.analysis.resolve_by,
            "Starting analysis"
        );

        let analyzer = Analyzer::new(cfg.analysis.clone())?;
        let client = ManifoldClient::new(&cfg.provider)?;
        info!(provider = client.name(), concurrency = cfg.provider.concurrency, "Provider ready");

        let report = Collector::new(client, cfg.provider.concurrency)
            .with_limits(
                cfg.provider.market_limit as usize,
                cfg.provider.bet_limit as usize,
            )
            .run(&analyzer)
            .await?;
        Ok::<_, anyhow::Error>(report)
    }
    .instrument(span)
    .await;

    match result {
        Ok(report) => {
            println!("{report}");
            Ok(())
        }
        Err(e) => {
            error!(%run_id, error = %format!("{e:#}"), "Analysis failed");
            Err(e)
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("market_accuracy=info"));

    let json_logging = std::env::var("ACCURACY_LOG_JSON").is_ok();

    // Logs go to stderr so the report on stdout stays clean.
    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
