use crate::interfaces::http::AppState;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::warn;

/// Route label for requests that matched no route, so arbitrary paths never
/// become label values.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Scrapes are audited only by `metrics_scrape_requests_total`.
pub const SCRAPE_ROUTE: &str = "/metrics";

/// Records `http_request_duration_seconds{route, status}` using the route template.
/// The scrape route passes through untouched.
pub async fn track_http_duration(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string());
    if route == SCRAPE_ROUTE {
        return next.run(request).await;
    }

    let started = Instant::now();
    let response = next.run(request).await;

    if let Err(e) = state.metrics.record_http_request(
        &route,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    ) {
        warn!(route = %route, "Failed to record request duration: {}", e);
    }

    response
}
