//! End-to-end analysis runs against the mock provider.

use chrono::Duration;

use market_accuracy::analysis::{
    AnalysisConfig, Analyzer, OracleEquivalence, ProbabilityEstimator, ScoringRule,
};
use market_accuracy::engine::Collector;
use market_accuracy::types::{AccuracyError, TopicSelector};

use crate::mock_provider::{base_time, market, MockProvider};

fn analyzer(
    estimator: ProbabilityEstimator,
    scoring_rule: ScoringRule,
    resolve_by_day: Option<i64>,
) -> Analyzer {
    Analyzer::new(AnalysisConfig {
        topic: TopicSelector::Tag("RussiaUkraine".into()),
        estimator,
        scoring_rule,
        resolve_by: resolve_by_day.map(|d| base_time() + Duration::days(d)),
    })
    .unwrap()
}

#[tokio::test]
async fn test_time_weighted_log_cohort() {
    let mut off_topic = market("elections", "YES", 10, &[(0, 0.5)]);
    off_topic.tags = vec!["Elections".into()];
    off_topic.group_slugs.clear();

    let provider = MockProvider::new(vec![
        market("kherson", "YES", 10, &[(0, 0.6), (5, 0.9)]),
        market("ceasefire", "NO", 10, &[(0, 0.3)]),
        market("nuclear", "CANCEL", 10, &[(0, 0.05)]),
        market("quiet", "YES", 10, &[]),
        off_topic,
    ]);
    let log = provider.request_log();

    let report = Collector::new(provider, 3)
        .run(&analyzer(ProbabilityEstimator::TimeWeighted, ScoringRule::Log, None))
        .await
        .unwrap();

    assert_eq!(report.analyzed, 2);
    assert_eq!(report.excluded.non_binary, 1);
    assert_eq!(report.excluded.no_qualifying_bets, 1);
    assert_eq!(report.excluded.off_topic, 1);
    assert_eq!(report.diagnostics.markets_fetched, 5);

    let ids: Vec<_> = report.market_scores.iter().map(|s| s.market_id.as_str()).collect();
    assert_eq!(ids, vec!["kherson", "ceasefire"]);
    assert!((report.market_scores[0].belief - 0.75).abs() < 1e-9);

    let expected_mean = (0.75_f64.log2() + 0.7_f64.log2()) / 2.0;
    assert!((report.mean_score - expected_mean).abs() < 1e-9);
    assert!((report.proportion_yes - 0.5).abs() < 1e-12);

    match report.oracle {
        OracleEquivalence::Equivalent {
            probability,
            oracle_score,
        } => {
            assert!(probability > 0.5 && probability < 1.0);
            assert!((oracle_score - expected_mean).abs() < 1e-9);
        }
        other => panic!("expected an equivalent oracle, got {other:?}"),
    }

    let requested = log.lock().unwrap().clone();
    assert_eq!(requested.len(), 4);
    assert!(!requested.contains(&"elections".to_string()));

    let text = report.to_string();
    assert!(text.contains("Number of markets analyzed: 2"));
    assert!(text.contains("Average log score"));
}

#[tokio::test]
async fn test_snapshot_brier_with_deadline() {
    let provider = MockProvider::new(vec![
        market("a", "YES", 10, &[(0, 0.4), (3, 0.8), (6, 0.95)]),
        market("b", "NO", 10, &[(0, 0.5), (2, 0.2)]),
        market("late", "YES", 30, &[(0, 0.9)]),
        market("no-early-bets", "YES", 10, &[(7, 0.9)]),
    ]);
    let log = provider.request_log();

    let report = Collector::new(provider, 2)
        .run(&analyzer(
            ProbabilityEstimator::Snapshot { fraction: 0.5 },
            ScoringRule::Brier,
            Some(20),
        ))
        .await
        .unwrap();

    assert_eq!(report.analyzed, 2);
    assert_eq!(report.excluded.after_deadline, 1);
    assert_eq!(report.excluded.no_qualifying_bets, 1);
    assert!((report.mean_score - 0.04).abs() < 1e-9);
    assert!(!log.lock().unwrap().contains(&"late".to_string()));

    let expected_p = (1.0 + (1.0 - 4.0 * 0.04_f64).sqrt()) / 2.0;
    match report.oracle {
        OracleEquivalence::Equivalent { probability, .. } => {
            assert!((probability - expected_p).abs() < 1e-9, "p* = {probability}");
        }
        other => panic!("expected an equivalent oracle, got {other:?}"),
    }
}

#[test]
fn test_coin_flip_cohort_reported() {
    let provider = MockProvider::new(vec![
        market("a", "YES", 10, &[(0, 0.5)]),
        market("b", "NO", 10, &[(0, 0.5)]),
    ]);
    let analyzer = analyzer(ProbabilityEstimator::TimeWeighted, ScoringRule::Log, None);

    let report = tokio_test::block_on(Collector::new(provider, 1).run(&analyzer)).unwrap();
    assert!(matches!(
        report.oracle,
        OracleEquivalence::NoBetterThanCoinFlip { .. }
    ));
    assert!(report.to_string().contains("no better than a coin flip"));
}

#[tokio::test]
async fn test_weight_fault_aborts() {
    let provider = MockProvider::new(vec![
        market("ok", "YES", 10, &[(0, 0.7)]),
        market("gap", "YES", 10, &[(5, 0.7)]),
    ]);

    let err = Collector::new(provider, 2)
        .run(&analyzer(ProbabilityEstimator::TimeWeighted, ScoringRule::Log, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AccuracyError>(),
        Some(AccuracyError::WeightOutOfTolerance { .. })
    ));
}

#[tokio::test]
async fn test_missing_end_time_aborts() {
    let mut broken = market("broken", "YES", 10, &[(0, 0.7)]);
    broken.close_time = None;
    broken.resolution_time = None;
    let provider = MockProvider::new(vec![broken]);

    let err = Collector::new(provider, 2)
        .run(&analyzer(ProbabilityEstimator::TimeWeighted, ScoringRule::Brier, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AccuracyError>(),
        Some(AccuracyError::MissingEndTime { .. })
    ));
}

#[tokio::test]
async fn test_provider_failure_aborts() {
    let provider = MockProvider::new(vec![market("a", "YES", 10, &[(0, 0.7)])]);
    provider.set_error("rate limited");

    let err = Collector::new(provider, 2)
        .run(&analyzer(ProbabilityEstimator::TimeWeighted, ScoringRule::Log, None))
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("rate limited"));
}

#[tokio::test]
async fn test_long_bet_history_is_flagged_not_fatal() {
    // 250 bets spread across the market's ten days, starting at open.
    let history: Vec<(i64, f64)> = (0..250).map(|i| (i * 10 / 250, 0.8)).collect();
    let provider = MockProvider::new(vec![
        market("busy", "YES", 10, &history),
        market("calm", "YES", 10, &[(0, 0.8)]),
    ]);

    let report = Collector::new(provider, 2)
        .with_limits(1000, 250)
        .run(&analyzer(ProbabilityEstimator::TimeWeighted, ScoringRule::Brier, None))
        .await
        .unwrap();

    assert_eq!(report.analyzed, 2);
    assert!((report.mean_score - 0.04).abs() < 1e-9);
    assert!(report.diagnostics.truncation_suspected());
    assert!(report.to_string().contains("WARNING: market busy returned exactly 250 bets"));
}
