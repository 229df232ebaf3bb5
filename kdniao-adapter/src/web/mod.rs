//! Web server module for KDNiao callbacks.
//!
//! This module provides the two endpoints KDNiao integrations need:
//! - A push endpoint receiving tracking updates
//! - A print endpoint signing label requests for a print service
//!
//! Both are mounted at configurable paths next to a health check.

pub mod dispatch;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

pub use dispatch::{
    LoggingTrackingHandler, PushDispatcher, PushForm, PushRoute, TrackingHandler, WebhookError,
};
pub use handlers::{client_ip, health, print_sign, push_webhook, AppState, HealthResponse};

/// Build the router serving push, print and health endpoints.
///
/// Peer addresses reach [`print_sign`] only when served with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router(state: AppState) -> Router {
    let push_path = state.config.push_path.clone();
    let print_path = state.config.print_path.clone();

    Router::new()
        .route("/health", get(health))
        .route(&push_path, post(push_webhook))
        .route(&print_path, post(print_sign))
        .with_state(state)
}
