//! REST API for the sales metrics
//!
//! Serves JSON views of the dashboard over a shared, read-only [`SalesData`]
//! snapshot.

pub mod handlers;

use crate::dashboard::SalesData;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(data: Arc<SalesData>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(handlers::health))
        .route("/api/v1/years", get(handlers::get_years))
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        .route("/api/v1/categories", get(handlers::get_categories))
        .route("/api/v1/states", get(handlers::get_states))
        .route("/api/v1/growth", get(handlers::get_growth))
        .route("/api/v1/diagnostics", get(handlers::get_diagnostics))
        .with_state(data)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
