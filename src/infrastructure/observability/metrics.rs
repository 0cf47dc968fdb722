//! Metric catalogue for the fraud-detection platform.
//!
//! Every metric the process exposes is declared here, once, at startup. Recording
//! helpers keep label names and values consistent across call sites.

use crate::domain::compliance::{Requirement, Severity};
use crate::domain::errors::ObservationError;
use crate::domain::fraud::{Channel, FraudType};
use crate::domain::metrics::definition::DEFAULT_QUANTILES;
use crate::domain::metrics::{MetricKind, MetricRegistry, Observation};
use std::sync::Arc;

pub mod names {
    // Model quality and decisions
    pub const PREDICTIONS_TOTAL: &str = "ml_predictions_total";
    pub const FRAUD_DETECTED_TOTAL: &str = "ml_fraud_detected_total";
    pub const INFERENCE_ERRORS_TOTAL: &str = "inference_errors_total";
    pub const MODEL_PRECISION: &str = "model_precision";
    pub const MODEL_RECALL: &str = "model_recall";
    pub const MODEL_F1_SCORE: &str = "model_f1_score";
    pub const MODEL_DRIFT_SCORE: &str = "model_drift_score";
    pub const PREDICTION_FRAUD_RATE: &str = "prediction_fraud_rate";
    pub const MODEL_VERSION: &str = "model_version";
    pub const UPTIME_SECONDS: &str = "uptime_seconds";

    // Latency distributions
    pub const INFERENCE_LATENCY_SECONDS: &str = "inference_latency_seconds";
    pub const FRAUD_TRIGGER_LATENCY_SECONDS: &str = "fraud_detection_trigger_latency_seconds";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
    pub const PREDICTION_LATENCY_SECONDS: &str = "prediction_latency_seconds";

    // Per-request inference and security
    pub const INFERENCE_REQUESTS_TOTAL: &str = "ml_inference_requests_total";
    pub const INFERENCE_REQUEST_LATENCY_SECONDS: &str = "ml_inference_latency_seconds";
    pub const ADVERSARIAL_ATTEMPTS_TOTAL: &str = "adversarial_attempts_total";
    pub const INPUT_OUTLIER_SCORE: &str = "input_outlier_score";
    pub const SECURITY_EVENTS_TOTAL: &str = "security_events_total";
    pub const DICT_LOOKUPS_TOTAL: &str = "dict_lookups_total";
    pub const AUDIT_EVENTS_TOTAL: &str = "audit_events_total";

    // Regulatory
    pub const COMPLIANCE_SCORE: &str = "bcb_403_compliance_score";
    pub const COMPLIANCE_CYCLES_TOTAL: &str = "compliance_cycles_total";
    pub const COMPLIANCE_CHECK_FAILURES_TOTAL: &str = "compliance_check_failures_total";
    pub const COMPLIANCE_CYCLE_DURATION_SECONDS: &str = "compliance_cycle_duration_seconds";
    pub const COMPLIANCE_LAST_CYCLE_TIMESTAMP: &str = "compliance_last_cycle_timestamp_seconds";

    // Self-observability
    pub const PUSH_FAILURES_TOTAL: &str = "push_failures_total";
    pub const PUSH_LAST_SUCCESS_TIMESTAMP: &str = "push_last_success_timestamp_seconds";
    pub const SCRAPE_REQUESTS_TOTAL: &str = "metrics_scrape_requests_total";
}

use names::*;

pub const INFERENCE_LATENCY_BUCKETS: &[f64] = &[0.05, 0.1, 0.2, 0.5, 1.0, 2.0];
pub const FRAUD_TRIGGER_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0];
pub const HTTP_DURATION_BUCKETS: &[f64] = &[0.05, 0.1, 0.5, 1.0, 5.0];
pub const REQUEST_LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];
pub const OUTLIER_SCORE_BUCKETS: &[f64] = &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0];
pub const CYCLE_DURATION_BUCKETS: &[f64] = &[0.01, 0.1, 0.5, 1.0, 5.0, 30.0];

type Result<T> = std::result::Result<T, ObservationError>;

const NO_LABELS: &[(&str, &str)] = &[];

/// Typed recording facade over the shared registry.
#[derive(Clone)]
pub struct FraudMetrics {
    registry: Arc<MetricRegistry>,
}

impl FraudMetrics {
    /// Declare the full catalogue on `registry`. Fails on any schema conflict.
    pub fn register(registry: Arc<MetricRegistry>) -> anyhow::Result<Self> {
        let r = &registry;

        r.define(
            PREDICTIONS_TOTAL,
            MetricKind::Counter,
            "Total predictions performed",
            &["result", "channel"],
        )?;
        r.define(
            FRAUD_DETECTED_TOTAL,
            MetricKind::Counter,
            "Total fraud detections",
            &["channel", "fraud_type"],
        )?;
        r.define(
            INFERENCE_ERRORS_TOTAL,
            MetricKind::Counter,
            "Total errors during inference",
            &[],
        )?;
        r.define(MODEL_PRECISION, MetricKind::Gauge, "Fraud model precision", &[])?;
        r.define(MODEL_RECALL, MetricKind::Gauge, "Fraud model recall", &[])?;
        r.define(MODEL_F1_SCORE, MetricKind::Gauge, "Fraud model F1 score", &[])?;
        r.define(MODEL_DRIFT_SCORE, MetricKind::Gauge, "Model drift score over time", &[])?;
        r.define(
            PREDICTION_FRAUD_RATE,
            MetricKind::Gauge,
            "Share of transactions classified as fraud",
            &[],
        )?;
        r.define(MODEL_VERSION, MetricKind::Gauge, "Model version in production", &[])?;
        r.define(UPTIME_SECONDS, MetricKind::Gauge, "Process uptime in seconds", &[])?;

        r.define(
            INFERENCE_LATENCY_SECONDS,
            MetricKind::histogram(INFERENCE_LATENCY_BUCKETS),
            "Model inference latency in seconds",
            &[],
        )?;
        r.define(
            FRAUD_TRIGGER_LATENCY_SECONDS,
            MetricKind::histogram(FRAUD_TRIGGER_BUCKETS),
            "Response time for transactions suspected of fraud",
            &[],
        )?;
        r.define(
            HTTP_REQUEST_DURATION_SECONDS,
            MetricKind::histogram(HTTP_DURATION_BUCKETS),
            "HTTP request duration in seconds",
            &["route", "status"],
        )?;
        r.define(
            PREDICTION_LATENCY_SECONDS,
            MetricKind::summary(DEFAULT_QUANTILES),
            "Prediction latency in seconds",
            &[],
        )?;

        r.define(
            INFERENCE_REQUESTS_TOTAL,
            MetricKind::Counter,
            "Total inference requests",
            &["model_name", "model_version", "result"],
        )?;
        r.define(
            INFERENCE_REQUEST_LATENCY_SECONDS,
            MetricKind::histogram(REQUEST_LATENCY_BUCKETS),
            "Inference request latency in seconds",
            &["model_name", "model_version"],
        )?;
        r.define(
            ADVERSARIAL_ATTEMPTS_TOTAL,
            MetricKind::Counter,
            "Detected adversarial attack attempts",
            &["attack_type", "detection_method", "severity"],
        )?;
        r.define(
            INPUT_OUTLIER_SCORE,
            MetricKind::histogram(OUTLIER_SCORE_BUCKETS),
            "Outlier score of model inputs",
            &["model_name"],
        )?;
        r.define(
            SECURITY_EVENTS_TOTAL,
            MetricKind::Counter,
            "Security events detected",
            &["event_type", "severity"],
        )?;
        r.define(DICT_LOOKUPS_TOTAL, MetricKind::Counter, "DICT directory lookups", &["result"])?;
        r.define(AUDIT_EVENTS_TOTAL, MetricKind::Counter, "Audited operations", &["event_type"])?;

        r.define(
            COMPLIANCE_SCORE,
            MetricKind::Gauge,
            "Conformity level with BCB Resolution 403",
            &["article_number", "requirement_type"],
        )?;
        r.define(COMPLIANCE_CYCLES_TOTAL, MetricKind::Counter, "Completed compliance cycles", &[])?;
        r.define(
            COMPLIANCE_CHECK_FAILURES_TOTAL,
            MetricKind::Counter,
            "Compliance checks that failed or timed out",
            &["requirement_type"],
        )?;
        r.define(
            COMPLIANCE_CYCLE_DURATION_SECONDS,
            MetricKind::histogram(CYCLE_DURATION_BUCKETS),
            "Compliance cycle duration in seconds",
            &[],
        )?;
        r.define(
            COMPLIANCE_LAST_CYCLE_TIMESTAMP,
            MetricKind::Gauge,
            "Unix time of the last completed compliance cycle",
            &[],
        )?;

        r.define(
            PUSH_FAILURES_TOTAL,
            MetricKind::Counter,
            "Failed pushes to the metrics collector",
            &["job"],
        )?;
        r.define(
            PUSH_LAST_SUCCESS_TIMESTAMP,
            MetricKind::Gauge,
            "Unix time of the last successful push",
            &["job"],
        )?;
        r.define(
            SCRAPE_REQUESTS_TOTAL,
            MetricKind::Counter,
            "Requests served by the scrape endpoint",
            &[],
        )?;

        let metrics = Self {
            registry: registry.clone(),
        };
        metrics.initialise_unlabelled()?;
        Ok(metrics)
    }

    /// Unlabelled counters start at 0 so they are exported before the first event.
    fn initialise_unlabelled(&self) -> Result<()> {
        for name in [INFERENCE_ERRORS_TOTAL, COMPLIANCE_CYCLES_TOTAL, SCRAPE_REQUESTS_TOTAL] {
            self.registry
                .observe(name, NO_LABELS, Observation::Increment(0.0))?;
        }
        Ok(())
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// Prediction outcome plus its latency distributions.
    pub fn record_prediction(
        &self,
        channel: Channel,
        is_fraud: bool,
        fraud_type: Option<FraudType>,
        latency_secs: f64,
    ) -> Result<()> {
        let result = if is_fraud { "fraud" } else { "legitimate" };
        self.registry.observe(
            PREDICTIONS_TOTAL,
            &[("result", result), ("channel", channel.as_str())],
            Observation::Increment(1.0),
        )?;
        if is_fraud {
            let fraud_type = fraud_type.map(|t| t.as_str()).unwrap_or("unclassified");
            self.registry.observe(
                FRAUD_DETECTED_TOTAL,
                &[("channel", channel.as_str()), ("fraud_type", fraud_type)],
                Observation::Increment(1.0),
            )?;
            self.registry.observe(
                FRAUD_TRIGGER_LATENCY_SECONDS,
                NO_LABELS,
                Observation::Observe(latency_secs),
            )?;
        }
        self.registry
            .observe(INFERENCE_LATENCY_SECONDS, NO_LABELS, Observation::Observe(latency_secs))?;
        self.registry
            .observe(PREDICTION_LATENCY_SECONDS, NO_LABELS, Observation::Observe(latency_secs))
    }

    /// Bulk prediction counts, as produced by the freshness simulator.
    pub fn add_predictions(&self, channel: Channel, legitimate: u64, fraud: u64) -> Result<()> {
        self.registry.observe(
            PREDICTIONS_TOTAL,
            &[("result", "legitimate"), ("channel", channel.as_str())],
            Observation::Increment(legitimate as f64),
        )?;
        if fraud > 0 {
            self.registry.observe(
                PREDICTIONS_TOTAL,
                &[("result", "fraud"), ("channel", channel.as_str())],
                Observation::Increment(fraud as f64),
            )?;
            self.registry.observe(
                FRAUD_DETECTED_TOTAL,
                &[("channel", channel.as_str()), ("fraud_type", "unclassified")],
                Observation::Increment(fraud as f64),
            )?;
        }
        Ok(())
    }

    pub fn record_inference_error(&self) -> Result<()> {
        self.registry
            .observe(INFERENCE_ERRORS_TOTAL, NO_LABELS, Observation::Increment(1.0))
    }

    pub fn record_inference_request(
        &self,
        model_name: &str,
        model_version: &str,
        result: &str,
        latency_secs: f64,
    ) -> Result<()> {
        self.registry.observe(
            INFERENCE_REQUESTS_TOTAL,
            &[
                ("model_name", model_name),
                ("model_version", model_version),
                ("result", result),
            ],
            Observation::Increment(1.0),
        )?;
        self.registry.observe(
            INFERENCE_REQUEST_LATENCY_SECONDS,
            &[("model_name", model_name), ("model_version", model_version)],
            Observation::Observe(latency_secs),
        )
    }

    pub fn record_outlier_score(&self, model_name: &str, score: f64) -> Result<()> {
        self.registry.observe(
            INPUT_OUTLIER_SCORE,
            &[("model_name", model_name)],
            Observation::Observe(score),
        )
    }

    pub fn record_adversarial_attempt(
        &self,
        attack_type: &str,
        detection_method: &str,
        severity: Severity,
    ) -> Result<()> {
        self.registry.observe(
            ADVERSARIAL_ATTEMPTS_TOTAL,
            &[
                ("attack_type", attack_type),
                ("detection_method", detection_method),
                ("severity", severity.as_str()),
            ],
            Observation::Increment(1.0),
        )
    }

    pub fn record_security_event(&self, event_type: &str, severity: Severity) -> Result<()> {
        self.registry.observe(
            SECURITY_EVENTS_TOTAL,
            &[("event_type", event_type), ("severity", severity.as_str())],
            Observation::Increment(1.0),
        )
    }

    pub fn record_dict_lookup(&self, result: &str) -> Result<()> {
        self.registry
            .observe(DICT_LOOKUPS_TOTAL, &[("result", result)], Observation::Increment(1.0))
    }

    pub fn record_audit_event(&self, event_type: &str) -> Result<()> {
        self.registry
            .observe(AUDIT_EVENTS_TOTAL, &[("event_type", event_type)], Observation::Increment(1.0))
    }

    pub fn record_http_request(&self, route: &str, status: u16, duration_secs: f64) -> Result<()> {
        let status = status.to_string();
        self.registry.observe(
            HTTP_REQUEST_DURATION_SECONDS,
            &[("route", route), ("status", status.as_str())],
            Observation::Observe(duration_secs),
        )
    }

    pub fn record_scrape(&self) -> Result<()> {
        self.registry
            .observe(SCRAPE_REQUESTS_TOTAL, NO_LABELS, Observation::Increment(1.0))
    }

    /// Publish precision, recall and the F1 derived from those exact two values.
    pub fn set_model_quality(&self, quality: &ModelQuality) -> Result<()> {
        self.registry
            .observe(MODEL_PRECISION, NO_LABELS, Observation::Set(quality.precision))?;
        self.registry
            .observe(MODEL_RECALL, NO_LABELS, Observation::Set(quality.recall))?;
        self.registry
            .observe(MODEL_F1_SCORE, NO_LABELS, Observation::Set(quality.f1_score()))?;
        self.registry
            .observe(MODEL_DRIFT_SCORE, NO_LABELS, Observation::Set(quality.drift_score))?;
        self.registry
            .observe(PREDICTION_FRAUD_RATE, NO_LABELS, Observation::Set(quality.fraud_rate))
    }

    pub fn set_model_version(&self, version: f64) -> Result<()> {
        self.registry
            .observe(MODEL_VERSION, NO_LABELS, Observation::Set(version))
    }

    pub fn set_uptime(&self, seconds: f64) -> Result<()> {
        self.registry
            .observe(UPTIME_SECONDS, NO_LABELS, Observation::Set(seconds))
    }

    pub fn observe_latencies(
        &self,
        inference: f64,
        fraud_trigger: f64,
        prediction: f64,
    ) -> Result<()> {
        self.registry
            .observe(INFERENCE_LATENCY_SECONDS, NO_LABELS, Observation::Observe(inference))?;
        self.registry.observe(
            FRAUD_TRIGGER_LATENCY_SECONDS,
            NO_LABELS,
            Observation::Observe(fraud_trigger),
        )?;
        self.registry
            .observe(PREDICTION_LATENCY_SECONDS, NO_LABELS, Observation::Observe(prediction))
    }

    pub fn set_compliance_score(&self, requirement: &Requirement, score: f64) -> Result<()> {
        self.registry.observe(
            COMPLIANCE_SCORE,
            &[
                ("article_number", requirement.article_number.as_str()),
                ("requirement_type", requirement.requirement_type.as_str()),
            ],
            Observation::Set(score),
        )
    }

    pub fn record_check_failure(&self, requirement_type: &str) -> Result<()> {
        self.registry.observe(
            COMPLIANCE_CHECK_FAILURES_TOTAL,
            &[("requirement_type", requirement_type)],
            Observation::Increment(1.0),
        )
    }

    pub fn record_compliance_cycle(&self, duration_secs: f64, finished_at_unix: f64) -> Result<()> {
        self.registry
            .observe(COMPLIANCE_CYCLES_TOTAL, NO_LABELS, Observation::Increment(1.0))?;
        self.registry.observe(
            COMPLIANCE_CYCLE_DURATION_SECONDS,
            NO_LABELS,
            Observation::Observe(duration_secs),
        )?;
        self.registry.observe(
            COMPLIANCE_LAST_CYCLE_TIMESTAMP,
            NO_LABELS,
            Observation::Set(finished_at_unix),
        )
    }

    pub fn record_push_failure(&self, job: &str) -> Result<()> {
        self.registry
            .observe(PUSH_FAILURES_TOTAL, &[("job", job)], Observation::Increment(1.0))
    }

    pub fn record_push_success(&self, job: &str, at_unix: f64) -> Result<()> {
        self.registry
            .observe(PUSH_LAST_SUCCESS_TIMESTAMP, &[("job", job)], Observation::Set(at_unix))
    }
}

/// Model quality figures owned by a single producer and published together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelQuality {
    pub precision: f64,
    pub recall: f64,
    pub drift_score: f64,
    pub fraud_rate: f64,
}

impl ModelQuality {
    pub fn f1_score(&self) -> f64 {
        let denominator = self.precision + self.recall;
        if denominator <= 0.0 {
            return 0.0;
        }
        2.0 * self.precision * self.recall / denominator
    }
}
