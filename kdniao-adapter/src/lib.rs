//! KDNiao - courier API adapter.
//!
//! This library provides:
//! - A signed-envelope client for creating e-orders and subscribing to tracking
//! - A webhook router receiving tracking pushes and signing print requests
//!
//! ## Architecture
//!
//! ```text
//! Outbound: payload → Envelope (sign) → Client → KDNiao → reply check → caller
//! Inbound:  KDNiao push → router → PushDispatcher → TrackingHandler → acknowledgment
//! ```

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod signature;
pub mod types;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use client::Client;
pub use config::{ApiEnvironment, Config, Credentials};
pub use envelope::{sign_print_request, Envelope, RequestType};
pub use error::KdniaoError;
pub use signature::{data_sign, SignScheme};
pub use types::{
    Acknowledgment, EOrderRequest, EOrderResponse, PrintItem, PrintSignature,
    SubscribeTracingRequest, SubscribeTracingResponse, TrackingEvent, TrackingPush,
    TrackingState,
};
pub use web::{AppState, TrackingHandler};
