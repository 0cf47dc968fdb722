use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub mod periodic_task;

use crate::application::compliance::{ComplianceEvaluator, ComplianceJob, PushTarget};
use crate::application::monitoring::component_health::ComponentHealthService;
use crate::application::monitoring::metrics_simulator::MetricsSimulator;
use crate::application::prediction::{HeuristicFraudModel, PredictionService};
use crate::application::system::periodic_task::{PeriodicTaskHandle, spawn_periodic};
use crate::config::Config;
use crate::domain::metrics::MetricRegistry;
use crate::infrastructure::observability::{FraudMetrics, PushDispatcher, PushSettings};
use crate::interfaces::http::{AppState, create_router};

/// Running background tasks; dropped tasks keep running until the token is cancelled.
pub struct SystemHandle {
    pub cancel: CancellationToken,
    pub tasks: Vec<PeriodicTaskHandle>,
}

impl SystemHandle {
    /// Cancel every task and wait for in-flight cycles (bounded by their grace).
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            info!("Waiting for {} to stop...", task.name());
            task.join().await;
        }
    }
}

pub struct Application {
    pub config: Config,
    pub registry: Arc<MetricRegistry>,
    pub metrics: FraudMetrics,
    pub health: Arc<ComponentHealthService>,
    pub compliance: Arc<ComplianceJob>,
    pub predictions: Arc<PredictionService>,
    pub simulator: Option<Arc<MetricsSimulator>>,
    pub started_at: Instant,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        info!("Building fraud-signal application...");

        // 1. One registry for every producer
        let registry = Arc::new(MetricRegistry::with_limits(
            config.observability.registry_limits(),
        ));
        let metrics = FraudMetrics::register(registry.clone())
            .context("Failed to register metric catalogue")?;

        // 2. Operational signals and compliance
        let health = Arc::new(ComponentHealthService::with_compliance_signals().await);
        let evaluator = Arc::new(ComplianceEvaluator::with_default_checks(
            health.clone(),
            metrics.clone(),
            config.compliance.check_timeout(),
        ));

        let dispatcher = if config.push.enabled {
            Some(Arc::new(PushDispatcher::new(
                metrics.clone(),
                PushSettings {
                    timeout: config.push.timeout(),
                    max_retries: config.push.max_retries,
                    ..PushSettings::default()
                },
            )))
        } else {
            info!("Push delivery disabled.");
            None
        };
        let compliance = Arc::new(ComplianceJob::new(
            evaluator,
            dispatcher,
            PushTarget {
                destination: config.push.gateway_url.clone(),
                job_name: config.push.job_name.clone(),
            },
        ));

        // 3. Prediction path
        let predictions = Arc::new(
            PredictionService::new(
                Arc::new(HeuristicFraudModel::new(config.simulation.fraud_threshold)),
                metrics.clone(),
            )
            .with_dict_health(health.clone()),
        );

        let simulator = if config.simulation.enabled {
            Some(Arc::new(
                MetricsSimulator::new(metrics.clone(), config.simulation.seed)
                    .context("Failed to seed model-quality metrics")?,
            ))
        } else {
            None
        };

        Ok(Self {
            config,
            registry,
            metrics,
            health,
            compliance,
            predictions,
            simulator,
            started_at: Instant::now(),
        })
    }

    /// Spawn the periodic tasks. The compliance cycle runs immediately.
    pub fn start(&self, cancel: CancellationToken) -> SystemHandle {
        let mut tasks = Vec::new();
        let grace = self.config.compliance.shutdown_grace();

        tasks.push(spawn_periodic(
            self.compliance.clone(),
            self.config.compliance.eval_interval(),
            grace,
            cancel.child_token(),
        ));
        info!(
            "Compliance evaluation scheduled every {:?}",
            self.config.compliance.eval_interval()
        );

        match &self.simulator {
            Some(simulator) => {
                tasks.push(spawn_periodic(
                    simulator.clone(),
                    self.config.simulation.interval(),
                    grace,
                    cancel.child_token(),
                ));
                info!(
                    "Metric-freshness simulator running every {:?}",
                    self.config.simulation.interval()
                );
            }
            None => info!("Metric-freshness simulator disabled."),
        }

        SystemHandle { cancel, tasks }
    }

    pub fn router(&self) -> axum::Router {
        create_router(AppState {
            metrics: self.metrics.clone(),
            predictions: self.predictions.clone(),
            health: self.health.clone(),
            started_at: self.started_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup_from;
    use crate::infrastructure::observability::metrics::names::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_compliance_immediately() {
        let config = Config::from_lookup(lookup_from(&[
            ("PUSH_ENABLED", "false"),
            ("SIMULATION_SEED", "5"),
        ]))
        .unwrap();
        let app = Application::build(config).await.unwrap();

        let handle = app.start(CancellationToken::new());
        tokio::time::sleep(Duration::from_millis(10)).await;

        let snapshot = app.registry.snapshot();
        assert_eq!(
            snapshot.scalar(COMPLIANCE_CYCLES_TOTAL, &[] as &[(&str, &str)]),
            Some(1.0)
        );
        assert_eq!(
            snapshot.scalar(
                COMPLIANCE_SCORE,
                &[("article_number", "91"), ("requirement_type", "deteccao_anomalias")]
            ),
            Some(1.0)
        );
        assert!(snapshot.scalar(UPTIME_SECONDS, &[] as &[(&str, &str)]).is_some());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_simulator_can_be_disabled() {
        let config = Config::from_lookup(lookup_from(&[("SIMULATION_ENABLED", "false")])).unwrap();
        let app = Application::build(config).await.unwrap();
        assert!(app.simulator.is_none());
        assert!(
            app.registry
                .snapshot()
                .scalar(MODEL_PRECISION, &[] as &[(&str, &str)])
                .is_none()
        );
    }
}
