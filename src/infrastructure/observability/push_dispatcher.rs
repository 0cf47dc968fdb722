//! Delivery of registry snapshots to a Prometheus push gateway.
//!
//! Failures never propagate into the caller's state: they are logged, counted in
//! `push_failures_total{job}` and returned so the caller can decide what to log.

use crate::domain::errors::DeliveryError;
use crate::domain::metrics::RegistrySnapshot;
use crate::infrastructure::core::{CircuitBreaker, HttpClientFactory};
use crate::infrastructure::observability::exposition::{export_text, PUSH_CONTENT_TYPE};
use crate::infrastructure::observability::metrics::FraudMetrics;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

const BREAKER_FAILURE_THRESHOLD: usize = 3;
const BREAKER_COOL_DOWN: Duration = Duration::from_secs(60);
const MAX_ERROR_BODY_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct PushSettings {
    /// Bounds the whole push, retries included.
    pub timeout: Duration,
    pub max_retries: u32,
    pub breaker_threshold: usize,
    pub breaker_cool_down: Duration,
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            max_retries: 2,
            breaker_threshold: BREAKER_FAILURE_THRESHOLD,
            breaker_cool_down: BREAKER_COOL_DOWN,
        }
    }
}

pub struct PushDispatcher {
    client: ClientWithMiddleware,
    metrics: FraudMetrics,
    breaker: CircuitBreaker,
    timeout: Duration,
}

impl PushDispatcher {
    pub fn new(metrics: FraudMetrics, settings: PushSettings) -> Self {
        Self {
            client: HttpClientFactory::create_client(settings.timeout, settings.max_retries),
            metrics,
            breaker: CircuitBreaker::new(
                "push_gateway",
                settings.breaker_threshold,
                settings.breaker_cool_down,
            ),
            timeout: settings.timeout,
        }
    }

    /// Resolve `{destination}/metrics/job/{job}`. A destination without a scheme is
    /// treated as plain HTTP.
    pub fn push_url(destination: &str, job: &str) -> Result<Url, DeliveryError> {
        let invalid = |reason: &str| DeliveryError::InvalidDestination {
            destination: destination.to_string(),
            reason: reason.to_string(),
        };

        let destination = destination.trim();
        if destination.is_empty() {
            return Err(invalid("empty address"));
        }
        if job.trim().is_empty() {
            return Err(invalid("empty job label"));
        }

        let with_scheme = if destination.contains("://") {
            destination.to_string()
        } else {
            format!("http://{}", destination)
        };
        let mut url = Url::parse(&with_scheme).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }

        url.path_segments_mut()
            .map_err(|_| invalid("address cannot carry a path"))?
            .pop_if_empty()
            .extend(["metrics", "job", job]);
        Ok(url)
    }

    /// PUT the snapshot to the collector, replacing the job's previous group.
    pub async fn push(
        &self,
        snapshot: &RegistrySnapshot,
        destination: &str,
        job: &str,
    ) -> Result<(), DeliveryError> {
        let result = self.deliver(snapshot, destination, job).await;

        match &result {
            Ok(()) => {
                info!(job, destination, families = snapshot.families.len(), "Metrics pushed");
                if let Err(e) = self
                    .metrics
                    .record_push_success(job, chrono::Utc::now().timestamp() as f64)
                {
                    warn!("PushDispatcher: failed to record push success: {}", e);
                }
            }
            Err(err) => {
                warn!(job, destination, error = %err, "Metrics push failed, snapshot dropped");
                if let Err(e) = self.metrics.record_push_failure(job) {
                    warn!("PushDispatcher: failed to record push failure: {}", e);
                }
            }
        }

        result
    }

    /// Snapshot the shared registry and push it.
    pub async fn push_registry(&self, destination: &str, job: &str) -> Result<(), DeliveryError> {
        let snapshot = self.metrics.registry().snapshot();
        self.push(&snapshot, destination, job).await
    }

    async fn deliver(
        &self,
        snapshot: &RegistrySnapshot,
        destination: &str,
        job: &str,
    ) -> Result<(), DeliveryError> {
        let url = Self::push_url(destination, job)?;

        if let Err(retry_in) = self.breaker.try_acquire() {
            return Err(DeliveryError::CircuitOpen {
                retry_in_ms: retry_in.as_millis() as u64,
            });
        }

        let body = export_text(snapshot);
        debug!(url = %url, bytes = body.len(), "PushDispatcher: sending snapshot");

        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, PUSH_CONTENT_TYPE)
            .body(body)
            .send();

        let outcome = match tokio::time::timeout(self.timeout, request).await {
            Err(_) => Err(DeliveryError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }),
            Ok(Err(e)) => Err(DeliveryError::Transport {
                reason: e.to_string(),
            }),
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => {
                let status = response.status().as_u16();
                let mut body = response.text().await.unwrap_or_default();
                body.truncate(floor_char_boundary(&body, MAX_ERROR_BODY_LEN));
                Err(DeliveryError::Rejected { status, body })
            }
        };

        match &outcome {
            Ok(()) => self.breaker.record_success(),
            Err(_) => self.breaker.record_failure(),
        }
        outcome
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}
