// Component health board feeding the compliance checks
pub mod component_health;

// Model-quality random walk keeping dashboards fresh
pub mod metrics_simulator;
