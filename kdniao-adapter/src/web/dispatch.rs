//! Push dispatch.
//!
//! KDNiao posts pushes as a form with three fields. The `RequestType`
//! discriminator selects a route from a lookup table; each route decodes
//! `RequestData` and hands the result to caller code. Types with no route
//! are ignored without a response body.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::envelope::RequestType;
use crate::types::{Acknowledgment, TrackingEvent, TrackingPush};
use crate::util::query_unescape;

/// Errors that reject an inbound request with HTTP 400.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request body could not be bound to the expected shape.
    #[error("bind error: {0}")]
    Bind(String),

    /// `RequestData` could not be unescaped or parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// A response payload could not be encoded for signing.
    #[error("encode error: {0}")]
    Encode(String),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        warn!(error = %self, "kdniao_webhook_rejected");
        StatusCode::BAD_REQUEST.into_response()
    }
}

/// Push form body.
#[derive(Debug, Clone, Deserialize)]
pub struct PushForm {
    #[serde(rename = "RequestType")]
    pub request_type: String,
    /// Not verified; pushes are accepted unsigned.
    #[serde(rename = "DataSign", default)]
    pub data_sign: String,
    /// URL-escaped JSON
    #[serde(rename = "RequestData")]
    pub request_data: String,
}

/// Caller logic receiving pushed tracking events.
///
/// Called synchronously once per accepted push. The push is acknowledged
/// whatever this returns; an error is only logged.
pub trait TrackingHandler: Send + Sync {
    fn on_tracking(&self, events: Vec<TrackingEvent>) -> anyhow::Result<()>;
}

impl<F> TrackingHandler for F
where
    F: Fn(Vec<TrackingEvent>) -> anyhow::Result<()> + Send + Sync,
{
    fn on_tracking(&self, events: Vec<TrackingEvent>) -> anyhow::Result<()> {
        self(events)
    }
}

/// Logs every event it receives. Used when no other handler is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingTrackingHandler;

impl TrackingHandler for LoggingTrackingHandler {
    fn on_tracking(&self, events: Vec<TrackingEvent>) -> anyhow::Result<()> {
        for event in &events {
            info!(
                shipper_code = %event.shipper_code,
                logistic_code = %event.logistic_code,
                state = %event.state,
                order_code = ?event.order_code,
                trace_count = event.traces.len(),
                latest_station = ?event.traces.last().map(|t| t.accept_station.as_str()),
                "kdniao_tracking_event"
            );
        }
        Ok(())
    }
}

/// A push route: decode `form` and produce the acknowledgment.
pub type PushRoute = fn(&PushDispatcher, &PushForm) -> Result<Acknowledgment, WebhookError>;

/// Routes pushes by their `RequestType`.
#[derive(Clone)]
pub struct PushDispatcher {
    tracking_handler: Arc<dyn TrackingHandler>,
    routes: HashMap<RequestType, PushRoute>,
}

impl fmt::Debug for PushDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushDispatcher")
            .field("routes", &self.routes.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl PushDispatcher {
    /// Create a dispatcher with the tracking push route registered.
    pub fn new(tracking_handler: Arc<dyn TrackingHandler>) -> Self {
        let mut routes: HashMap<RequestType, PushRoute> = HashMap::new();
        routes.insert(RequestType::PushTracing, tracking_push);

        Self {
            tracking_handler,
            routes,
        }
    }

    /// Register (or replace) the route for `request_type`.
    #[must_use]
    pub fn with_route(mut self, request_type: RequestType, route: PushRoute) -> Self {
        self.routes.insert(request_type, route);
        self
    }

    pub fn tracking_handler(&self) -> &dyn TrackingHandler {
        self.tracking_handler.as_ref()
    }

    /// Route one push.
    ///
    /// Returns `Ok(None)` when no route exists for the request type.
    pub fn dispatch(&self, form: &PushForm) -> Result<Option<Acknowledgment>, WebhookError> {
        let request_type = RequestType::from(form.request_type.as_str());

        match self.routes.get(&request_type) {
            Some(route) => route(self, form).map(Some),
            None => {
                info!(request_type = %request_type, "kdniao_push_ignored");
                Ok(None)
            }
        }
    }
}

/// Route for [`RequestType::PushTracing`].
fn tracking_push(
    dispatcher: &PushDispatcher,
    form: &PushForm,
) -> Result<Acknowledgment, WebhookError> {
    let data =
        query_unescape(&form.request_data).map_err(|e| WebhookError::Parse(e.to_string()))?;
    let push: TrackingPush =
        serde_json::from_str(&data).map_err(|e| WebhookError::Parse(e.to_string()))?;

    info!(
        ebusiness_id = %push.ebusiness_id,
        push_time = %push.push_time,
        count = push.count,
        events = push.data.len(),
        "kdniao_tracking_push_decoded"
    );

    let ack = Acknowledgment::accepted(&push);

    if let Err(e) = dispatcher.tracking_handler.on_tracking(push.data) {
        warn!(
            ebusiness_id = %ack.ebusiness_id,
            push_time = %ack.update_time,
            error = %e,
            "kdniao_tracking_handler_failed"
        );
    }

    Ok(ack)
}
