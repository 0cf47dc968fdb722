use crate::interfaces::http::{handlers, middleware, AppState};
use axum::middleware as axum_middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(middleware::SCRAPE_ROUTE, get(handlers::metrics))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::track_http_duration,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
