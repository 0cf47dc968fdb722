use thiserror::Error;

/// Errors raised while declaring the metric catalogue. These are programming or
/// configuration bugs and should halt startup.
#[derive(Debug, Error, PartialEq)]
pub enum DefinitionError {
    #[error("Metric {name} already defined with a different kind or label schema")]
    Duplicate { name: String },

    #[error("Invalid metric name: {name:?}")]
    InvalidName { name: String },

    #[error("Invalid label name {label:?} for metric {metric}")]
    InvalidLabelName { metric: String, label: String },

    #[error("Label {label} declared twice for metric {metric}")]
    DuplicateLabelName { metric: String, label: String },

    #[error("Label {label} is reserved for {metric}")]
    ReservedLabelName { metric: String, label: String },

    #[error("Invalid histogram buckets for {metric}: {reason}")]
    InvalidBuckets { metric: String, reason: String },

    #[error("Invalid summary quantiles for {metric}: {reason}")]
    InvalidQuantiles { metric: String, reason: String },
}

/// Errors surfaced to the caller of `observe`. The registry is left untouched.
#[derive(Debug, Error, PartialEq)]
pub enum ObservationError {
    #[error("Unknown metric: {name}")]
    UnknownMetric { name: String },

    #[error("Label mismatch for {name}: expected {expected:?}, got {got:?}")]
    LabelMismatch {
        name: String,
        expected: Vec<String>,
        got: Vec<String>,
    },

    #[error("Invalid delta for counter {name}: {delta}")]
    InvalidDelta { name: String, delta: f64 },

    #[error("Non-finite value {value} for {name}")]
    NonFiniteValue { name: String, value: f64 },

    #[error("Operation {operation} is not supported by {kind} {name}")]
    UnsupportedOperation {
        name: String,
        kind: &'static str,
        operation: &'static str,
    },

    #[error("Label value for {label} on {name} exceeds {max_len} bytes")]
    LabelValueTooLong {
        name: String,
        label: String,
        max_len: usize,
    },

    #[error("Cardinality limit of {limit} series reached for {name}")]
    CardinalityExceeded { name: String, limit: usize },
}

/// A single compliance rule check that could not produce a score.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CheckFailure {
    #[error("Check {check} failed: {reason}")]
    Failed { check: String, reason: String },

    #[error("Check {check} timed out after {timeout_ms}ms")]
    TimedOut { check: String, timeout_ms: u64 },

    #[error("Check {check} panicked")]
    Panicked { check: String },

    #[error("Operational signals unavailable for {check}: {reason}")]
    SignalsUnavailable { check: String, reason: String },
}

/// Push transport failures. Logged and counted, never propagated into registry state.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid push destination {destination:?}: {reason}")]
    InvalidDestination { destination: String, reason: String },

    #[error("Push transport failed: {reason}")]
    Transport { reason: String },

    #[error("Collector rejected push with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Push timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Delivery circuit is open, retry in {retry_in_ms}ms")]
    CircuitOpen { retry_in_ms: u64 },
}

/// Failures while parsing the text exposition format.
#[derive(Debug, Error, PartialEq)]
pub enum ExpositionError {
    #[error("Line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Line {line}: invalid sample value {value:?}")]
    InvalidValue { line: usize, value: String },
}
