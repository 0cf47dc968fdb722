//! Compliance cycle: collect signals, run every rule check in isolation, publish
//! one score per requirement and return the aggregated report.

use crate::application::compliance::rule_checks::default_checks;
use crate::domain::compliance::{
    CheckOutcome, ComplianceCheckResult, ComplianceIssue, ComplianceReport, ISSUE_CHECK_FAILURE,
    OperationalSignals, Requirement, Severity,
};
use crate::domain::errors::CheckFailure;
use crate::domain::ports::{ComplianceCheck, SignalProvider};
use crate::infrastructure::observability::FraudMetrics;
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    Idle,
    Running,
}

pub struct ComplianceEvaluator {
    checks: Vec<Arc<dyn ComplianceCheck>>,
    signals: Arc<dyn SignalProvider>,
    metrics: FraudMetrics,
    check_timeout: Duration,
    state: Mutex<EvaluatorState>,
    // Held for the whole cycle; a second trigger waits here.
    cycle_lock: tokio::sync::Mutex<()>,
}

impl ComplianceEvaluator {
    pub fn new(
        signals: Arc<dyn SignalProvider>,
        metrics: FraudMetrics,
        check_timeout: Duration,
    ) -> Self {
        Self {
            checks: Vec::new(),
            signals,
            metrics,
            check_timeout,
            state: Mutex::new(EvaluatorState::Idle),
            cycle_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Evaluator loaded with the Art. 89 and Art. 91 catalogue.
    pub fn with_default_checks(
        signals: Arc<dyn SignalProvider>,
        metrics: FraudMetrics,
        check_timeout: Duration,
    ) -> Self {
        let mut evaluator = Self::new(signals, metrics, check_timeout);
        for check in default_checks() {
            evaluator.register(check);
        }
        evaluator
    }

    pub fn register(&mut self, check: Arc<dyn ComplianceCheck>) {
        self.checks.push(check);
    }

    pub fn requirements(&self) -> Vec<Requirement> {
        self.checks.iter().map(|c| c.requirement().clone()).collect()
    }

    pub fn state(&self) -> EvaluatorState {
        *self.state.lock()
    }

    /// Run one full cycle. Never fails: every check yields a result, failed ones
    /// with score 0 and a `check_failure` issue.
    pub async fn run_cycle(&self) -> ComplianceReport {
        let _cycle = self.cycle_lock.lock().await;
        let cycle_id = uuid::Uuid::new_v4();
        let mut running = RunningGuard::enter(&self.state, cycle_id);

        let started_at = Utc::now();
        let clock = Instant::now();
        info!(%cycle_id, checks = self.checks.len(), "Compliance cycle started");

        let outcomes = match self.signals.collect().await {
            Ok(signals) => self.run_checks(Arc::new(signals)).await,
            Err(e) => {
                error!(%cycle_id, "Operational signals unavailable: {:#}", e);
                self.checks
                    .iter()
                    .map(|check| {
                        Err(CheckFailure::SignalsUnavailable {
                            check: check.requirement().requirement_type.clone(),
                            reason: format!("{:#}", e),
                        })
                    })
                    .collect()
            }
        };

        let mut results = Vec::with_capacity(self.checks.len());
        for (check, outcome) in self.checks.iter().zip(outcomes) {
            let requirement = check.requirement();
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(failure) => {
                    warn!(
                        requirement_type = %requirement.requirement_type,
                        "Compliance check failed: {}",
                        failure
                    );
                    if let Err(e) = self.metrics.record_check_failure(&requirement.requirement_type)
                    {
                        error!("Failed to count check failure: {}", e);
                    }
                    failure_outcome(&failure)
                }
            };

            let result = ComplianceCheckResult::from_outcome(requirement, outcome);
            if let Err(e) = self.metrics.set_compliance_score(requirement, result.score) {
                error!(
                    requirement_type = %requirement.requirement_type,
                    "Failed to publish compliance score: {}",
                    e
                );
            }
            debug!(
                article_number = %requirement.article_number,
                requirement_type = %requirement.requirement_type,
                score = result.score,
                "Compliance score published"
            );
            results.push(result);
        }

        let finished_at = Utc::now();
        if let Err(e) = self
            .metrics
            .record_compliance_cycle(clock.elapsed().as_secs_f64(), finished_at.timestamp() as f64)
        {
            error!("Failed to record compliance cycle: {}", e);
        }

        running.complete();

        ComplianceReport {
            cycle_id,
            started_at,
            finished_at,
            results,
        }
    }

    /// Every check runs on its own task with its own deadline, so a panic or a
    /// hang stays contained. Results come back in registration order.
    async fn run_checks(
        &self,
        signals: Arc<OperationalSignals>,
    ) -> Vec<Result<CheckOutcome, CheckFailure>> {
        let timeout = self.check_timeout;

        let handles: Vec<JoinHandle<Result<CheckOutcome, CheckFailure>>> = self
            .checks
            .iter()
            .map(|check| {
                let check = Arc::clone(check);
                let signals = Arc::clone(&signals);
                tokio::spawn(async move {
                    let name = check.requirement().requirement_type.clone();
                    match tokio::time::timeout(timeout, check.evaluate(&signals)).await {
                        Ok(Ok(outcome)) => Ok(outcome),
                        Ok(Err(e)) => Err(CheckFailure::Failed {
                            check: name,
                            reason: format!("{:#}", e),
                        }),
                        Err(_) => Err(CheckFailure::TimedOut {
                            check: name,
                            timeout_ms: timeout.as_millis() as u64,
                        }),
                    }
                })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (check, handle) in self.checks.iter().zip(handles) {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    let check = check.requirement().requirement_type.clone();
                    if join_error.is_panic() {
                        Err(CheckFailure::Panicked { check })
                    } else {
                        Err(CheckFailure::Failed {
                            check,
                            reason: join_error.to_string(),
                        })
                    }
                }
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}

/// Holds the evaluator in `Running` for the lifetime of one cycle. Dropping it,
/// including when the cycle future is abandoned, always returns to `Idle`.
struct RunningGuard<'a> {
    state: &'a Mutex<EvaluatorState>,
    cycle_id: uuid::Uuid,
    completed: bool,
}

impl<'a> RunningGuard<'a> {
    fn enter(state: &'a Mutex<EvaluatorState>, cycle_id: uuid::Uuid) -> Self {
        *state.lock() = EvaluatorState::Running;
        Self {
            state,
            cycle_id,
            completed: false,
        }
    }

    fn complete(&mut self) {
        self.completed = true;
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = EvaluatorState::Idle;
        if !self.completed {
            warn!(cycle_id = %self.cycle_id, "Compliance cycle abandoned before completion");
        }
    }
}

fn failure_outcome(failure: &CheckFailure) -> CheckOutcome {
    CheckOutcome::new(
        0.0,
        vec![ComplianceIssue::new(
            ISSUE_CHECK_FAILURE,
            Severity::High,
            failure.to_string(),
        )],
    )
}
