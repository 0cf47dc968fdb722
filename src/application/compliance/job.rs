use crate::application::compliance::evaluator::ComplianceEvaluator;
use crate::application::system::periodic_task::PeriodicJob;
use crate::domain::compliance::ComplianceReport;
use crate::infrastructure::observability::reporter::emit_report;
use crate::infrastructure::observability::PushDispatcher;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Where cycle results go after scoring.
#[derive(Debug, Clone)]
pub struct PushTarget {
    pub destination: String,
    pub job_name: String,
}

/// One scheduled compliance cycle: evaluate, report, then push the registry.
pub struct ComplianceJob {
    evaluator: Arc<ComplianceEvaluator>,
    dispatcher: Option<Arc<PushDispatcher>>,
    target: PushTarget,
}

impl ComplianceJob {
    pub fn new(
        evaluator: Arc<ComplianceEvaluator>,
        dispatcher: Option<Arc<PushDispatcher>>,
        target: PushTarget,
    ) -> Self {
        Self {
            evaluator,
            dispatcher,
            target,
        }
    }

    /// Push failures are counted and logged by the dispatcher; they never fail
    /// the cycle.
    pub async fn run_cycle(&self) -> ComplianceReport {
        let report = self.evaluator.run_cycle().await;
        emit_report(&report);

        match &self.dispatcher {
            Some(dispatcher) => {
                if let Err(e) = dispatcher
                    .push_registry(&self.target.destination, &self.target.job_name)
                    .await
                {
                    debug!(
                        cycle_id = %report.cycle_id,
                        "ComplianceJob: push failed, cycle result kept: {}",
                        e
                    );
                }
            }
            None => debug!("ComplianceJob: push disabled, skipping delivery"),
        }

        report
    }
}

#[async_trait]
impl PeriodicJob for ComplianceJob {
    fn name(&self) -> &str {
        "compliance"
    }

    async fn run_once(&self) -> Result<()> {
        self.run_cycle().await;
        Ok(())
    }
}
