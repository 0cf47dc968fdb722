use crate::application::monitoring::component_health::ComponentHealthService;
use crate::domain::compliance::Severity;
use crate::domain::compliance::signals::DICT_INTEGRATION_HEALTHY;
use crate::domain::errors::ObservationError;
use crate::domain::fraud::adversarial::{self, DETECTION_METHOD_INPUT_ANALYSIS};
use crate::domain::fraud::{Channel, PredictionResponse, Transaction, TransactionRequest};
use crate::domain::ports::FraudModel;
use crate::infrastructure::observability::FraudMetrics;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const SECURITY_EVENT_ADVERSARIAL: &str = "adversarial_input";
const AUDIT_EVENT_PREDICTION: &str = "prediction";

pub const DICT_FOUND: &str = "found";
pub const DICT_SKIPPED: &str = "skipped";
pub const DICT_UNAVAILABLE: &str = "unavailable";

/// Runs the fraud model on one request and records everything observable about it.
///
/// Metric write failures are logged and never fail the prediction.
pub struct PredictionService {
    model: Arc<dyn FraudModel>,
    metrics: FraudMetrics,
    dict_health: Option<Arc<ComponentHealthService>>,
}

impl PredictionService {
    pub fn new(model: Arc<dyn FraudModel>, metrics: FraudMetrics) -> Self {
        Self {
            model,
            metrics,
            dict_health: None,
        }
    }

    /// DICT lookup outcomes follow the board's `dict_integration_healthy` signal.
    /// Without a board every Pix lookup is treated as resolved.
    pub fn with_dict_health(mut self, board: Arc<ComponentHealthService>) -> Self {
        self.dict_health = Some(board);
        self
    }

    pub fn model(&self) -> &Arc<dyn FraudModel> {
        &self.model
    }

    pub async fn predict(&self, request: TransactionRequest) -> Result<PredictionResponse> {
        let started = Instant::now();
        let tx = Transaction::from_request(request, Utc::now());

        self.screen_input(&tx);
        let dict_result = self.dict_lookup_result(tx.channel).await;
        record(self.metrics.record_dict_lookup(dict_result));

        let (name, version) = (self.model.name(), self.model.version());
        let decision = match self.model.predict(&tx) {
            Ok(decision) => decision,
            Err(e) => {
                let latency = started.elapsed().as_secs_f64();
                record(self.metrics.record_inference_error());
                record(self.metrics.record_inference_request(name, version, "error", latency));
                return Err(e).with_context(|| {
                    format!("Model {} failed on transaction {}", name, tx.transaction_id)
                });
            }
        };

        let latency = started.elapsed().as_secs_f64();
        let result = if decision.is_fraud { "fraud" } else { "legitimate" };

        record(self.metrics.record_prediction(
            tx.channel,
            decision.is_fraud,
            decision.fraud_type,
            latency,
        ));
        record(self.metrics.record_inference_request(name, version, result, latency));
        record(self.metrics.record_outlier_score(name, decision.outlier_score));
        record(self.metrics.record_audit_event(AUDIT_EVENT_PREDICTION));

        if decision.is_fraud {
            info!(
                transaction_id = %tx.transaction_id,
                channel = %tx.channel,
                fraud_score = decision.fraud_score,
                "Fraud detected"
            );
        }

        Ok(PredictionResponse {
            transaction_id: tx.transaction_id,
            is_fraud: decision.is_fraud,
            fraud_score: decision.fraud_score,
            fraud_type: decision.fraud_type,
            explainability: decision.explainability,
            processing_time_ms: latency * 1000.0,
            timestamp: Utc::now(),
        })
    }

    /// The DICT directory is an external collaborator; its reachability comes from
    /// the health board rather than a live query.
    async fn dict_lookup_result(&self, channel: Channel) -> &'static str {
        if channel != Channel::Pix {
            return DICT_SKIPPED;
        }
        let Some(board) = &self.dict_health else {
            return DICT_FOUND;
        };
        match board.status(DICT_INTEGRATION_HEALTHY).await {
            Some(status) if status.healthy => DICT_FOUND,
            _ => DICT_UNAVAILABLE,
        }
    }

    fn screen_input(&self, tx: &Transaction) {
        let Some(assessment) = adversarial::assess(tx) else {
            return;
        };

        warn!(
            transaction_id = %tx.transaction_id,
            attack_type = assessment.attack_type.as_str(),
            severity = %assessment.severity,
            "Potential adversarial input"
        );
        record(self.metrics.record_adversarial_attempt(
            assessment.attack_type.as_str(),
            DETECTION_METHOD_INPUT_ANALYSIS,
            assessment.severity,
        ));
        record(
            self.metrics
                .record_security_event(SECURITY_EVENT_ADVERSARIAL, escalate(assessment.severity)),
        );
    }
}

/// Security events are at least High once an input is flagged.
fn escalate(severity: Severity) -> Severity {
    severity.max(Severity::High)
}

fn record(result: std::result::Result<(), ObservationError>) {
    if let Err(e) = result {
        warn!("PredictionService: metric not recorded: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prediction::heuristic_model::{
        HeuristicFraudModel, MODEL_NAME, MODEL_VERSION,
    };
    use crate::domain::fraud::FraudDecision;
    use crate::domain::metrics::MetricRegistry;
    use crate::infrastructure::observability::metrics::names::*;

    struct FailingModel;

    impl FraudModel for FailingModel {
        fn name(&self) -> &str {
            "broken"
        }
        fn version(&self) -> &str {
            "0"
        }
        fn predict(&self, _tx: &Transaction) -> Result<FraudDecision> {
            anyhow::bail!("weights not loaded")
        }
    }

    fn service(model: Arc<dyn FraudModel>) -> PredictionService {
        let metrics = FraudMetrics::register(Arc::new(MetricRegistry::new())).unwrap();
        PredictionService::new(model, metrics)
    }

    #[tokio::test]
    async fn test_prediction_records_metrics() {
        let svc = service(Arc::new(HeuristicFraudModel::new(0.7)));
        let response = svc
            .predict(TransactionRequest {
                transaction_id: Some("tx-42".to_string()),
                amount: Some(250.0),
                channel: Some("pix".to_string()),
                transaction_type: None,
            })
            .await
            .unwrap();

        assert_eq!(response.transaction_id, "tx-42");
        assert!(!response.is_fraud);
        assert!(response.processing_time_ms >= 0.0);

        let snapshot = svc.metrics.registry().snapshot();
        assert_eq!(
            snapshot.scalar(PREDICTIONS_TOTAL, &[("result", "legitimate"), ("channel", "PIX")]),
            Some(1.0)
        );
        assert_eq!(
            snapshot.scalar(
                INFERENCE_REQUESTS_TOTAL,
                &[
                    ("model_name", MODEL_NAME),
                    ("model_version", MODEL_VERSION),
                    ("result", "legitimate"),
                ]
            ),
            Some(1.0)
        );
        assert_eq!(snapshot.scalar(DICT_LOOKUPS_TOTAL, &[("result", "found")]), Some(1.0));
        assert_eq!(
            snapshot.scalar(AUDIT_EVENTS_TOTAL, &[("event_type", "prediction")]),
            Some(1.0)
        );
        assert_eq!(snapshot.family(ADVERSARIAL_ATTEMPTS_TOTAL).unwrap().series.len(), 0);
    }

    #[tokio::test]
    async fn test_extreme_amount_counts_adversarial_attempt() {
        let svc = service(Arc::new(HeuristicFraudModel::new(0.7)));
        svc.predict(TransactionRequest {
            amount: Some(5_000_000.0),
            ..TransactionRequest::default()
        })
        .await
        .unwrap();

        let snapshot = svc.metrics.registry().snapshot();
        assert_eq!(
            snapshot.scalar(
                ADVERSARIAL_ATTEMPTS_TOTAL,
                &[
                    ("attack_type", "amount_manipulation"),
                    ("detection_method", "input_analysis"),
                    ("severity", "critical"),
                ]
            ),
            Some(1.0)
        );
        assert_eq!(
            snapshot.scalar(
                SECURITY_EVENTS_TOTAL,
                &[("event_type", "adversarial_input"), ("severity", "critical")]
            ),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn test_model_failure_is_counted() {
        let svc = service(Arc::new(FailingModel));
        let err = svc.predict(TransactionRequest::default()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("weights not loaded"));

        let snapshot = svc.metrics.registry().snapshot();
        assert_eq!(snapshot.scalar(INFERENCE_ERRORS_TOTAL, &[] as &[(&str, &str)]), Some(1.0));
        assert_eq!(
            snapshot.scalar(
                INFERENCE_REQUESTS_TOTAL,
                &[("model_name", "broken"), ("model_version", "0"), ("result", "error")]
            ),
            Some(1.0)
        );
    }

    #[tokio::test]
    async fn test_free_form_channel_is_bounded() {
        let svc = service(Arc::new(HeuristicFraudModel::new(0.7)));
        for channel in ["whatsapp", "carrier-pigeon", "fax"] {
            svc.predict(TransactionRequest {
                amount: Some(10.0),
                channel: Some(channel.to_string()),
                ..TransactionRequest::default()
            })
            .await
            .unwrap();
        }

        let snapshot = svc.metrics.registry().snapshot();
        assert_eq!(
            snapshot.scalar(PREDICTIONS_TOTAL, &[("result", "legitimate"), ("channel", "OTHER")]),
            Some(3.0)
        );
        assert_eq!(snapshot.scalar(DICT_LOOKUPS_TOTAL, &[("result", "skipped")]), Some(3.0));
    }

    #[tokio::test]
    async fn test_dict_outcome_follows_health_board() {
        let board = Arc::new(ComponentHealthService::with_compliance_signals().await);
        let metrics = FraudMetrics::register(Arc::new(MetricRegistry::new())).unwrap();
        let svc = PredictionService::new(Arc::new(HeuristicFraudModel::new(0.7)), metrics)
            .with_dict_health(board.clone());
        let pix = || TransactionRequest {
            amount: Some(80.0),
            channel: Some("PIX".to_string()),
            ..TransactionRequest::default()
        };

        svc.predict(pix()).await.unwrap();
        board
            .set_status(DICT_INTEGRATION_HEALTHY, false, Some("timeout".to_string()))
            .await;
        svc.predict(pix()).await.unwrap();

        let snapshot = svc.metrics.registry().snapshot();
        assert_eq!(snapshot.scalar(DICT_LOOKUPS_TOTAL, &[("result", DICT_FOUND)]), Some(1.0));
        assert_eq!(
            snapshot.scalar(DICT_LOOKUPS_TOTAL, &[("result", DICT_UNAVAILABLE)]),
            Some(1.0)
        );
    }
}
