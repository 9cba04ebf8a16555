use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers::ask;
use crate::services::AnalyticsService;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<AnalyticsService>,
}

/// Create router with application state
pub fn create_router_with_state(analytics: Arc<AnalyticsService>) -> Router {
    let state = AppState { analytics };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/ask", post(ask::ask_question))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
