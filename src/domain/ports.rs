use crate::domain::compliance::{CheckOutcome, OperationalSignals, Requirement};
use crate::domain::fraud::{FraudDecision, Transaction};
use anyhow::Result;
use async_trait::async_trait;

/// Source of the boolean health/SLA signals a compliance cycle scores.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    async fn collect(&self) -> Result<OperationalSignals>;
}

/// One named regulatory rule check.
#[async_trait]
pub trait ComplianceCheck: Send + Sync {
    fn requirement(&self) -> &Requirement;

    /// Map the current signals to a score and issue list. An `Err` is scored as 0.
    async fn evaluate(&self, signals: &OperationalSignals) -> Result<CheckOutcome>;
}

/// Opaque fraud-detection model.
pub trait FraudModel: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn predict(&self, tx: &Transaction) -> Result<FraudDecision>;
}
