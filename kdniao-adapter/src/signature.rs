//! KDNiao data signing.
//!
//! KDNiao authenticates every request by recomputing `DataSign` server-side:
//! the signed text is the request data with the merchant app key appended
//! (no delimiter), digested with MD5 and Base64 encoded. A mismatch is
//! rejected as an invalid signature, so the output must be bit-exact.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};

/// Encoding applied to the MD5 digest before Base64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignScheme {
    /// `base64(md5(data + key))` over the raw 16 digest bytes.
    #[default]
    Md5Base64,
    /// `base64(hex(md5(data + key)))` over the lowercase hex digest.
    Md5HexBase64,
}

impl SignScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignScheme::Md5Base64 => "md5-base64",
            SignScheme::Md5HexBase64 => "md5-hex-base64",
        }
    }
}

impl fmt::Display for SignScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5-base64" => Ok(SignScheme::Md5Base64),
            "md5-hex-base64" => Ok(SignScheme::Md5HexBase64),
            other => Err(format!("unknown sign scheme: {other}")),
        }
    }
}

/// Compute the `DataSign` value for `data` under `app_key`.
///
/// Pure and deterministic: the provider recomputes the same value from the
/// received `RequestData`, so identical inputs must always yield identical
/// output.
pub fn data_sign(data: &str, app_key: &str, scheme: SignScheme) -> String {
    let mut hasher = Md5::new();
    hasher.update(data.as_bytes());
    hasher.update(app_key.as_bytes());
    let digest = hasher.finalize();

    match scheme {
        SignScheme::Md5Base64 => STANDARD.encode(digest),
        SignScheme::Md5HexBase64 => STANDARD.encode(hex::encode(digest)),
    }
}
