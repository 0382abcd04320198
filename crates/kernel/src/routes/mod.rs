//! HTTP routers.
//!
//! The main listener answers language listings and checks on any path. The
//! admin listener, when enabled, serves health and metrics.

pub mod dispatch;
pub mod health;
pub mod metrics;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::trace::TraceLayer;

use crate::middleware::enforce_access;
use crate::state::AppState;

/// Build the main application.
///
/// Layers (last added = first executed): TraceLayer → access filter →
/// body limit → dispatcher. Denied requests never reach the body.
pub fn app(state: AppState) -> Router {
    dispatch::router()
        .layer(DefaultBodyLimit::max(state.max_body_bytes()))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            enforce_access,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build the admin application serving `/health` and `/metrics`.
pub fn admin(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
