//! Invitation microsite server.
//!
//! Resolves page state from the request query, fetches the event config
//! from `<CONFIG_BASE_URL>/events/<slug>/config.json` and serves the rendered
//! invitation. Referral codes and the click-tracking log persist in SQLite.

pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod fetch;
pub mod page;
pub mod tracker;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use api::ApiState;

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health))
        .route("/share", get(api::share))
        .route("/actions", post(api::actions))
        .route("/tracking", get(api::tracking))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
