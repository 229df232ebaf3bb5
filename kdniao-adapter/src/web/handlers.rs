//! Endpoint handlers.
//!
//! - Tracking pushes: decode the form, route it, answer with the
//!   acknowledgment KDNiao expects
//! - Print signatures: sign an order list for the print service
//! - Health check

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        ConnectInfo, Form, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::envelope::sign_print_request;
use crate::types::{PrintItem, PrintSignature};
use crate::web::dispatch::{PushDispatcher, PushForm, TrackingHandler, WebhookError};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<PushDispatcher>,
}

impl AppState {
    pub fn new(config: Config, tracking_handler: Arc<dyn TrackingHandler>) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(PushDispatcher::new(tracking_handler)),
        }
    }

    /// Use a preconfigured dispatcher, e.g. one with extra push routes.
    pub fn with_dispatcher(config: Config, dispatcher: PushDispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Tracking Push
// =============================================================================

/// Tracking push endpoint.
///
/// A push that decodes is always acknowledged with 200, whatever the
/// tracking handler did with it. Request types without a route get an empty
/// 200.
pub async fn push_webhook(
    State(state): State<AppState>,
    form: Result<Form<PushForm>, FormRejection>,
) -> Result<Response, WebhookError> {
    let Form(form) = form.map_err(|e| WebhookError::Bind(e.body_text()))?;

    info!(
        request_type = %form.request_type,
        has_data_sign = !form.data_sign.is_empty(),
        request_data_length = form.request_data.len(),
        "kdniao_push_received"
    );

    match state.dispatcher.dispatch(&form)? {
        Some(ack) => {
            info!(
                ebusiness_id = %ack.ebusiness_id,
                update_time = %ack.update_time,
                "kdniao_push_acknowledged"
            );
            Ok((StatusCode::OK, Json(ack)).into_response())
        }
        None => Ok(StatusCode::OK.into_response()),
    }
}

// =============================================================================
// Print Signature
// =============================================================================

/// Print signature endpoint.
///
/// Signs the posted order list together with the caller's IP so the print
/// service can fetch label templates from KDNiao without the app key.
pub async fn print_sign(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    items: Result<Json<Vec<PrintItem>>, JsonRejection>,
) -> Result<Json<PrintSignature>, WebhookError> {
    let Json(items) = items.map_err(|e| WebhookError::Bind(e.body_text()))?;

    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let signed = sign_print_request(&state.config.credentials, &ip, &items)
        .map_err(|e| WebhookError::Encode(e.to_string()))?;

    info!(
        client_ip = %ip,
        item_count = items.len(),
        "kdniao_print_signed"
    );

    Ok(Json(signed))
}

/// Resolve the originating client IP.
///
/// Prefers the first `X-Forwarded-For` entry, then `X-Real-Ip`, then the
/// socket peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    if let Some(forwarded) = header("x-forwarded-for") {
        if let Some(first) = forwarded.split(',').map(str::trim).find(|s| !s.is_empty()) {
            return first.to_string();
        }
    }

    if let Some(real_ip) = header("x-real-ip") {
        return real_ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_default()
}
