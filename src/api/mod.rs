//! HTTP API module
//!
//! The control surface a presentation layer drives: gestures in, timer
//! snapshots out.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Gestures
        .route("/toggle", post(toggle_handler))
        .route("/start", post(start_handler))
        .route("/stop", post(stop_handler))
        .route("/reset", post(reset_handler))
        .route("/restart", post(restart_handler))
        .route("/double-tap", post(double_tap_handler))
        // Duration-change prompt
        .route("/confirm", post(confirm_handler))
        .route("/dismiss", post(dismiss_handler))
        .route("/settings", get(get_settings_handler).post(save_settings_handler))
        .route("/languages", get(languages_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
