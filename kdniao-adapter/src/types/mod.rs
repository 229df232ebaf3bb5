//! KDNiao wire types.
//!
//! This module defines the JSON bodies carried inside envelopes:
//! - Electronic order (e-order) requests and responses
//! - Tracking subscriptions and pushed tracking events
//! - Print-token requests and responses
//!
//! Field names follow the provider's documented schema, so most structs
//! rename their fields explicitly.

pub mod order;
pub mod print;
pub mod tracking;

pub use order::{AddService, Commodity, EOrderRequest, EOrderResponse, OrderInfo, Receiver, Sender};
pub use print::{PrintItem, PrintSignature};
pub use tracking::{
    Acknowledgment, ContactInfo, SubscribeTracingRequest, SubscribeTracingResponse, TraceItem,
    TrackingEvent, TrackingPush, TrackingState,
};

use serde::{Deserialize, Deserializer};

use crate::error::KdniaoError;

/// `ResultCode` the provider returns for an accepted request.
pub const RESULT_CODE_SUCCESS: &str = "100";

/// Common status fields of every provider response.
pub trait ProviderReply {
    /// The provider's `ResultCode`, if the response carries one.
    fn result_code(&self) -> Option<&str>;

    fn is_success(&self) -> bool;

    fn reason(&self) -> &str;

    /// Turn a well-formed but rejected response into [`KdniaoError::Business`].
    ///
    /// A present `ResultCode` decides on its own; responses without one fall
    /// back to the `Success` flag.
    fn check(&self) -> Result<(), KdniaoError> {
        match self.result_code() {
            Some(code) if code != RESULT_CODE_SUCCESS => Err(KdniaoError::Business {
                code: code.to_string(),
                reason: self.reason().to_string(),
            }),
            Some(_) => Ok(()),
            None if !self.is_success() => Err(KdniaoError::Business {
                code: String::new(),
                reason: self.reason().to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Deserialize an explicit JSON `null` as `T::default()`.
///
/// `#[serde(default)]` only covers missing keys; pushes also send `null` for
/// empty lists and strings.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
