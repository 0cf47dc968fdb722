// Compliance results and operational signals
pub mod compliance;

// Fraud decisions and transaction input
pub mod fraud;

// Metric registry and series model
pub mod metrics;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
