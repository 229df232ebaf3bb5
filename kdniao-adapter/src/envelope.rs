//! Signed request envelopes.
//!
//! Every call to KDNiao is a flat form body:
//!
//! ```text
//! EBusinessID=<merchant>&RequestType=<code>&DataSign=<sign>&RequestData=<json>&DataType=2
//! ```
//!
//! `DataSign` is computed over the exact `RequestData` string that is sent.

use std::fmt;

use serde::Serialize;
use url::form_urlencoded;

use crate::config::Credentials;
use crate::error::KdniaoError;
use crate::types::{PrintItem, PrintSignature};
use crate::util::query_escape;

/// `DataType` value meaning JSON request data.
pub const DATA_TYPE_JSON: &str = "2";

/// The `RequestType` discriminator.
///
/// Codes not known to this crate are kept verbatim in `Other`, so they can
/// still be routed or logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Electronic order creation
    CreateEOrder,
    /// Tracking subscription
    SubscribeTracing,
    /// Tracking push sent by KDNiao
    PushTracing,
    Other(String),
}

impl RequestType {
    pub fn code(&self) -> &str {
        match self {
            RequestType::CreateEOrder => "1007",
            RequestType::SubscribeTracing => "1008",
            RequestType::PushTracing => "101",
            RequestType::Other(code) => code,
        }
    }
}

impl From<&str> for RequestType {
    fn from(code: &str) -> Self {
        match code {
            "1007" => RequestType::CreateEOrder,
            "1008" => RequestType::SubscribeTracing,
            "101" => RequestType::PushTracing,
            other => RequestType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A signed outbound request.
///
/// Fields are private: an envelope can only come from [`Envelope::build`],
/// which always signs the data it stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    business_id: String,
    request_type: RequestType,
    data_sign: String,
    request_data: String,
}

impl Envelope {
    /// Serialize `payload`, sign it and wrap it for `request_type`.
    pub fn build<T>(
        credentials: &Credentials,
        request_type: RequestType,
        payload: &T,
    ) -> Result<Self, KdniaoError>
    where
        T: Serialize + ?Sized,
    {
        let request_data = serde_json::to_string(payload).map_err(KdniaoError::Encoding)?;
        let data_sign = credentials.sign(&request_data);

        Ok(Self {
            business_id: credentials.business_id.clone(),
            request_type,
            data_sign,
            request_data,
        })
    }

    pub fn business_id(&self) -> &str {
        &self.business_id
    }

    pub fn request_type(&self) -> &RequestType {
        &self.request_type
    }

    pub fn data_sign(&self) -> &str {
        &self.data_sign
    }

    pub fn request_data(&self) -> &str {
        &self.request_data
    }

    /// Form fields in the order KDNiao documents them.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("EBusinessID", self.business_id.as_str()),
            ("RequestType", self.request_type.code()),
            ("DataSign", self.data_sign.as_str()),
            ("RequestData", self.request_data.as_str()),
            ("DataType", DATA_TYPE_JSON),
        ]
    }

    /// Encode as an `application/x-www-form-urlencoded` body.
    pub fn to_form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields())
            .finish()
    }
}

/// Sign a print request on behalf of a print service.
///
/// The signed text is the caller's IP followed by the query-escaped JSON of
/// `items`; the print service presents the result to KDNiao without ever
/// holding the app key.
pub fn sign_print_request(
    credentials: &Credentials,
    client_ip: &str,
    items: &[PrintItem],
) -> Result<PrintSignature, KdniaoError> {
    let data = serde_json::to_string(items).map_err(KdniaoError::Encoding)?;
    let signature = credentials.sign(&format!("{}{}", client_ip, query_escape(&data)));

    Ok(PrintSignature {
        eid: credentials.business_id.clone(),
        signature,
    })
}
