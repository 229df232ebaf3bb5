//! Error types for outbound KDNiao calls.

use thiserror::Error;

/// Errors returned by [`crate::Client`] and the envelope builder.
///
/// Transport and decoding failures are kept apart from business failures so
/// callers can decide what is worth retrying.
#[derive(Debug, Error)]
pub enum KdniaoError {
    /// The business payload could not be serialized to JSON.
    #[error("failed to encode request data: {0}")]
    Encoding(#[source] serde_json::Error),

    /// Network or connection failure talking to the provider.
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider's response body was not the expected JSON shape.
    #[error("failed to decode response: {0}")]
    Decoding(#[source] serde_json::Error),

    /// The exchange succeeded but the provider rejected the request.
    #[error("KDNiao business error: code {code}, reason: {reason}")]
    Business { code: String, reason: String },
}

impl KdniaoError {
    pub fn is_business(&self) -> bool {
        matches!(self, KdniaoError::Business { .. })
    }
}
