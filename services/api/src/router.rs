//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the service: the
//! call-control webhook, the telephony media WebSocket and a health check.

use crate::{handlers, state::AppState, ws::ws_handler};
use axum::{
    Router,
    routing::{any, get},
};
use callbridge_core::call_control::MEDIA_STREAM_PATH;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Path the telephony provider's inbound-call webhook is pointed at.
pub const INCOMING_CALL_PATH: &str = "/incoming-call-eleven";

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let relay_router = Router::new()
        .route(MEDIA_STREAM_PATH, get(ws_handler))
        .with_state(app_state);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route(INCOMING_CALL_PATH, any(handlers::incoming_call))
        .merge(relay_router)
        .layer(TraceLayer::new_for_http())
}
