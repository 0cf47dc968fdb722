//! Metric catalogue, text exposition and outbound delivery.
//!
//! Metrics leave the process two ways: scraped from `GET /metrics`, or pushed to a
//! Prometheus push gateway after each compliance cycle. Compliance reports are also
//! written to stdout as structured JSON lines.

pub mod exposition;
pub mod metrics;
pub mod push_dispatcher;
pub mod reporter;

pub use metrics::{FraudMetrics, ModelQuality};
pub use push_dispatcher::{PushDispatcher, PushSettings};
