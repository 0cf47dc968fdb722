pub mod signals;
pub mod types;

pub use signals::OperationalSignals;
pub use types::{
    CheckOutcome, ComplianceCheckResult, ComplianceIssue, ComplianceReport, ISSUE_CHECK_FAILURE,
    ISSUE_COMPONENT_NOT_CONFORMANT, ISSUE_MISSING_SIGNAL, Requirement, Severity,
};
