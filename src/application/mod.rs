// BCB 403 compliance evaluation and push
pub mod compliance;

// Operational signals and metric freshness
pub mod monitoring;

// Fraud scoring behind the HTTP endpoint
pub mod prediction;

// Wiring and background task lifecycle
pub mod system;
