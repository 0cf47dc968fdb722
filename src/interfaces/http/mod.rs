//! HTTP surface: banner, scrape endpoint, health and prediction.

pub mod handlers;
pub mod middleware;
pub mod router;

use crate::application::monitoring::component_health::ComponentHealthService;
use crate::application::prediction::PredictionService;
use crate::infrastructure::observability::FraudMetrics;
use std::sync::Arc;
use std::time::Instant;

pub use router::create_router;

#[derive(Clone)]
pub struct AppState {
    pub metrics: FraudMetrics,
    pub predictions: Arc<PredictionService>,
    pub health: Arc<ComponentHealthService>,
    pub started_at: Instant,
}
