use anyhow::{Result, anyhow};
use async_trait::async_trait;
use pix_sentinel::application::compliance::ComplianceEvaluator;
use pix_sentinel::application::compliance::rule_checks::{
    ANOMALY_DETECTION, ART_89, ART_91, REAL_TIME_MONITORING, real_time_monitoring,
};
use pix_sentinel::application::monitoring::component_health::ComponentHealthService;
use pix_sentinel::domain::compliance::signals::{ALERTING_CONFIGURED, MONITORING_ACTIVE};
use pix_sentinel::domain::compliance::{
    CheckOutcome, ISSUE_CHECK_FAILURE, OperationalSignals, Requirement,
};
use pix_sentinel::domain::metrics::MetricRegistry;
use pix_sentinel::domain::ports::{ComplianceCheck, SignalProvider};
use pix_sentinel::infrastructure::observability::FraudMetrics;
use pix_sentinel::infrastructure::observability::metrics::names::{
    COMPLIANCE_CHECK_FAILURES_TOTAL, COMPLIANCE_CYCLES_TOTAL, COMPLIANCE_SCORE,
};
use std::sync::Arc;
use std::time::Duration;

// Mock anomaly check whose model registry is down
struct BrokenAnomalyCheck {
    requirement: Requirement,
}

#[async_trait]
impl ComplianceCheck for BrokenAnomalyCheck {
    fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    async fn evaluate(&self, _signals: &OperationalSignals) -> Result<CheckOutcome> {
        Err(anyhow!("model registry unreachable"))
    }
}

struct UnavailableSignals;

#[async_trait]
impl SignalProvider for UnavailableSignals {
    async fn collect(&self) -> Result<OperationalSignals> {
        Err(anyhow!("health board offline"))
    }
}

fn metrics() -> FraudMetrics {
    FraudMetrics::register(Arc::new(MetricRegistry::new())).unwrap()
}

fn score(metrics: &FraudMetrics, article: &str, requirement: &str) -> Option<f64> {
    metrics.registry().snapshot().scalar(
        COMPLIANCE_SCORE,
        &[("article_number", article), ("requirement_type", requirement)],
    )
}

#[tokio::test]
async fn test_failing_check_scores_zero_without_affecting_others() {
    let metrics = metrics();
    let board = Arc::new(ComponentHealthService::with_compliance_signals().await);
    let mut evaluator = ComplianceEvaluator::new(board, metrics.clone(), Duration::from_secs(1));
    evaluator.register(Arc::new(real_time_monitoring()));
    evaluator.register(Arc::new(BrokenAnomalyCheck {
        requirement: Requirement::new(ART_91, ANOMALY_DETECTION),
    }));

    let report = evaluator.run_cycle().await;

    assert_eq!(score(&metrics, ART_89, REAL_TIME_MONITORING), Some(1.0));
    assert_eq!(score(&metrics, ART_91, ANOMALY_DETECTION), Some(0.0));

    let failed = report.result(ANOMALY_DETECTION).unwrap();
    assert!(failed.is_failure());
    assert!(
        failed
            .issues
            .iter()
            .any(|i| i.issue_type == ISSUE_CHECK_FAILURE && i.description.contains("unreachable"))
    );
    assert!(report.result(REAL_TIME_MONITORING).unwrap().issues.is_empty());

    let snapshot = metrics.registry().snapshot();
    assert_eq!(
        snapshot.scalar(
            COMPLIANCE_CHECK_FAILURES_TOTAL,
            &[("requirement_type", ANOMALY_DETECTION)]
        ),
        Some(1.0)
    );
    assert_eq!(
        snapshot.scalar(COMPLIANCE_CYCLES_TOTAL, &[] as &[(&str, &str)]),
        Some(1.0)
    );
}

#[tokio::test]
async fn test_degraded_signals_lower_score_proportionally() {
    let metrics = metrics();
    let board = Arc::new(ComponentHealthService::with_compliance_signals().await);
    board.set_status(ALERTING_CONFIGURED, false, None).await;

    let evaluator = ComplianceEvaluator::with_default_checks(
        board.clone(),
        metrics.clone(),
        Duration::from_secs(1),
    );
    let report = evaluator.run_cycle().await;

    let monitoring = score(&metrics, ART_89, REAL_TIME_MONITORING).unwrap();
    assert!((monitoring - 0.7).abs() < 1e-9);
    assert_eq!(report.result(REAL_TIME_MONITORING).unwrap().issues.len(), 1);

    // Recovery is reflected on the next cycle
    board.set_status(ALERTING_CONFIGURED, true, None).await;
    board.set_status(MONITORING_ACTIVE, true, None).await;
    evaluator.run_cycle().await;
    assert_eq!(score(&metrics, ART_89, REAL_TIME_MONITORING), Some(1.0));
}

#[tokio::test]
async fn test_signal_outage_zeroes_every_requirement() {
    let metrics = metrics();
    let evaluator = ComplianceEvaluator::with_default_checks(
        Arc::new(UnavailableSignals),
        metrics.clone(),
        Duration::from_secs(1),
    );

    let report = evaluator.run_cycle().await;

    assert_eq!(report.results.len(), 3);
    for requirement in evaluator.requirements() {
        assert_eq!(
            score(
                &metrics,
                &requirement.article_number,
                &requirement.requirement_type
            ),
            Some(0.0)
        );
    }
    assert!(report.results.iter().all(|r| r.is_failure()));
}
