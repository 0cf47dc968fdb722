//! BCB Resolution 403 compliance scoring.

pub mod evaluator;
pub mod job;
pub mod rule_checks;

pub use evaluator::{ComplianceEvaluator, EvaluatorState};
pub use job::{ComplianceJob, PushTarget};
