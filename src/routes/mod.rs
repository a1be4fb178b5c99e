//! HTTP route handlers.
//!
//! The JSON API lives under `/api`; the orchestrator probes sit at the root.
//! Request tracing is enabled via middleware that generates a unique request ID
//! for each incoming request, allowing correlation of all logs within a request.

pub mod faults;
pub mod health;
pub mod items;
pub mod status;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::request_id_layer;
use crate::state::AppState;

/// Build the CORS layer for the configured origin (`*` allows any origin).
pub fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(Any);

    if origin == "*" {
        return layer.allow_origin(Any);
    }

    match HeaderValue::from_str(origin) {
        Ok(value) => layer.allow_origin(AllowOrigin::exact(value)),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid CORS_ORIGIN, cross-origin requests will be refused");
            layer
        }
    }
}

/// Creates the Axum router with all routes and layers.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/status", get(status::status))
        .route("/config", get(status::config))
        .route("/items", get(items::list).post(items::create))
        .route("/items/{id}", delete(items::delete))
        .route("/work", post(faults::work))
        .route("/crash", post(faults::crash));

    // Probes - never consult the store
    let health_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz));

    let cors = cors_layer(&state.config.cors_origin);

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // Request ID middleware - creates root span with request_id for correlation
        .layer(middleware::from_fn(request_id_layer))
}
