//! Keeps model-quality metrics fresh between real predictions.
//!
//! The simulator is the single owner of the quality figures: it random-walks its
//! own copy and publishes precision, recall and F1 together, so the exported F1
//! always matches the exported precision and recall.

use crate::application::system::periodic_task::PeriodicJob;
use crate::domain::errors::ObservationError;
use crate::domain::fraud::Channel;
use crate::infrastructure::observability::{FraudMetrics, ModelQuality};
use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::time::Instant;
use tracing::debug;

const PREDICTIONS_PER_TICK: RangeInclusive<u64> = 5..=15;
const FRAUD_PER_TICK: RangeInclusive<u64> = 1..=3;
const FRAUD_PROBABILITY: f64 = 0.3;
const ERROR_PROBABILITY: f64 = 0.05;

const QUALITY_BOUNDS: RangeInclusive<f64> = 0.70..=0.99;
const QUALITY_STEP: RangeInclusive<f64> = -0.01..=0.01;
const DRIFT_BOUNDS: RangeInclusive<f64> = 0.01..=0.20;
const DRIFT_STEP: RangeInclusive<f64> = -0.005..=0.01;
const FRAUD_RATE_BOUNDS: RangeInclusive<f64> = 0.001..=0.05;
const FRAUD_RATE_STEP: RangeInclusive<f64> = -0.001..=0.002;

const INFERENCE_LATENCY: RangeInclusive<f64> = 0.05..=0.3;
const FRAUD_TRIGGER_LATENCY: RangeInclusive<f64> = 0.2..=1.0;
const PREDICTION_LATENCY: RangeInclusive<f64> = 0.05..=0.2;

pub const INITIAL_QUALITY: ModelQuality = ModelQuality {
    precision: 0.94,
    recall: 0.91,
    drift_score: 0.03,
    fraud_rate: 0.007,
};
pub const INITIAL_MODEL_VERSION: f64 = 1.0;

/// What one tick produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummary {
    pub predictions: u64,
    pub fraud: u64,
    pub inference_error: bool,
    pub quality: ModelQuality,
}

struct SimulatorState {
    rng: StdRng,
    quality: ModelQuality,
}

pub struct MetricsSimulator {
    metrics: FraudMetrics,
    state: Mutex<SimulatorState>,
    started_at: Instant,
}

impl MetricsSimulator {
    /// Publishes the initial quality figures and model version.
    pub fn new(metrics: FraudMetrics, seed: Option<u64>) -> Result<Self, ObservationError> {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        metrics.set_model_quality(&INITIAL_QUALITY)?;
        metrics.set_model_version(INITIAL_MODEL_VERSION)?;

        Ok(Self {
            metrics,
            state: Mutex::new(SimulatorState {
                rng,
                quality: INITIAL_QUALITY,
            }),
            started_at: Instant::now(),
        })
    }

    pub fn quality(&self) -> ModelQuality {
        self.state.lock().quality
    }

    pub fn tick(&self) -> Result<TickSummary, ObservationError> {
        // Draw everything under the lock, publish after releasing it.
        let (summary, latencies) = {
            let mut state = self.state.lock();
            let SimulatorState { rng, quality } = &mut *state;

            let predictions = rng.random_range(PREDICTIONS_PER_TICK);
            let fraud = if rng.random_bool(FRAUD_PROBABILITY) {
                rng.random_range(FRAUD_PER_TICK).min(predictions)
            } else {
                0
            };
            let inference_error = rng.random_bool(ERROR_PROBABILITY);

            quality.precision = walk(rng, quality.precision, QUALITY_STEP, QUALITY_BOUNDS);
            quality.recall = walk(rng, quality.recall, QUALITY_STEP, QUALITY_BOUNDS);
            quality.drift_score = walk(rng, quality.drift_score, DRIFT_STEP, DRIFT_BOUNDS);
            quality.fraud_rate = walk(rng, quality.fraud_rate, FRAUD_RATE_STEP, FRAUD_RATE_BOUNDS);

            let latencies = (
                rng.random_range(INFERENCE_LATENCY),
                rng.random_range(FRAUD_TRIGGER_LATENCY),
                rng.random_range(PREDICTION_LATENCY),
            );

            (
                TickSummary {
                    predictions,
                    fraud,
                    inference_error,
                    quality: *quality,
                },
                latencies,
            )
        };

        self.metrics
            .add_predictions(Channel::Pix, summary.predictions - summary.fraud, summary.fraud)?;
        if summary.inference_error {
            self.metrics.record_inference_error()?;
        }
        self.metrics.set_model_quality(&summary.quality)?;
        self.metrics
            .set_uptime(self.started_at.elapsed().as_secs_f64())?;
        self.metrics
            .observe_latencies(latencies.0, latencies.1, latencies.2)?;

        debug!(
            predictions = summary.predictions,
            fraud = summary.fraud,
            precision = summary.quality.precision,
            recall = summary.quality.recall,
            "MetricsSimulator: tick"
        );
        Ok(summary)
    }
}

fn walk(
    rng: &mut StdRng,
    current: f64,
    step: RangeInclusive<f64>,
    bounds: RangeInclusive<f64>,
) -> f64 {
    (current + rng.random_range(step)).clamp(*bounds.start(), *bounds.end())
}

#[async_trait]
impl PeriodicJob for MetricsSimulator {
    fn name(&self) -> &str {
        "metrics_simulator"
    }

    async fn run_once(&self) -> Result<()> {
        self.tick()?;
        Ok(())
    }
}
