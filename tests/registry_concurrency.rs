use pix_sentinel::domain::errors::ObservationError;
use pix_sentinel::domain::metrics::{MetricKind, MetricRegistry, Observation, RegistryLimits};
use pix_sentinel::domain::fraud::Channel;
use pix_sentinel::infrastructure::observability::FraudMetrics;
use pix_sentinel::infrastructure::observability::metrics::names::PREDICTIONS_TOTAL;
use std::sync::Arc;

/// Test: concurrent increments from several producers are never lost
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_prediction_counts() {
    let metrics = FraudMetrics::register(Arc::new(MetricRegistry::new())).unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let metrics = metrics.clone();
        handles.push(tokio::spawn(async move {
            let is_fraud = i < 3;
            metrics
                .record_prediction(Channel::Pix, is_fraud, None, 0.01)
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let snapshot = metrics.registry().snapshot();
    assert_eq!(
        snapshot.scalar(PREDICTIONS_TOTAL, &[("result", "fraud"), ("channel", "PIX")]),
        Some(3.0)
    );
    assert_eq!(
        snapshot.scalar(PREDICTIONS_TOTAL, &[("result", "legitimate"), ("channel", "PIX")]),
        Some(1.0)
    );
}

#[test]
fn test_many_threads_hammering_one_counter() {
    let registry = Arc::new(MetricRegistry::new());
    registry
        .define("hits_total", MetricKind::Counter, "Hits", &["route"])
        .unwrap();

    let threads: Vec<_> = (0..8)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                for _ in 0..1000 {
                    registry
                        .observe(
                            "hits_total",
                            &[("route", "/predict")],
                            Observation::Increment(1.0),
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for t in threads {
        t.join().unwrap();
    }

    assert_eq!(
        registry.snapshot().scalar("hits_total", &[("route", "/predict")]),
        Some(8000.0)
    );
}

#[test]
fn test_cardinality_cap_holds_under_contention() {
    let registry = Arc::new(MetricRegistry::with_limits(RegistryLimits {
        max_series_per_metric: 10,
        ..RegistryLimits::default()
    }));
    registry
        .define("per_user_total", MetricKind::Counter, "Per user", &["user"])
        .unwrap();

    let threads: Vec<_> = (0..4)
        .map(|t| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                let mut rejected = 0;
                for i in 0..25 {
                    let user = format!("u{}-{}", t, i);
                    match registry.observe(
                        "per_user_total",
                        &[("user", user.as_str())],
                        Observation::Increment(1.0),
                    ) {
                        Ok(()) => {}
                        Err(ObservationError::CardinalityExceeded { .. }) => rejected += 1,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                rejected
            })
        })
        .collect();
    let rejected: usize = threads.into_iter().map(|t| t.join().unwrap()).sum();

    assert_eq!(registry.series_count(), 10);
    assert_eq!(rejected, 90);
}
