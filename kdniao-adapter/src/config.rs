//! Configuration module for environment variable parsing.
//!
//! Credentials, API environment and the webhook mount points are all read
//! from environment variables, with defaults for everything but the
//! credentials themselves.

use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::signature::{data_sign, SignScheme};

/// Production API base URL.
pub const BASE_URL: &str = "http://api.kdniao.cc/api";

/// Sandbox API base URL.
pub const TEST_BASE_URL: &str = "http://testapi.kdniao.cc:8081/api";

/// Merchant credentials issued by KDNiao.
///
/// Immutable once built; shared by the outbound client and the webhook
/// endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Merchant ID (`EBusinessID`)
    pub business_id: String,
    /// Shared secret used to sign request data
    pub app_key: String,
    pub sign_scheme: SignScheme,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("business_id", &self.business_id)
            .field("app_key", &"[REDACTED]")
            .field("sign_scheme", &self.sign_scheme)
            .finish()
    }
}

impl Credentials {
    pub fn new(business_id: impl Into<String>, app_key: impl Into<String>) -> Self {
        Self {
            business_id: business_id.into(),
            app_key: app_key.into(),
            sign_scheme: SignScheme::default(),
        }
    }

    #[must_use]
    pub fn with_sign_scheme(mut self, scheme: SignScheme) -> Self {
        self.sign_scheme = scheme;
        self
    }

    /// Sign `data` with this merchant's app key.
    pub fn sign(&self, data: &str) -> String {
        data_sign(data, &self.app_key, self.sign_scheme)
    }
}

/// Which KDNiao deployment outbound calls go to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiEnvironment {
    #[default]
    Production,
    Test,
}

impl ApiEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            ApiEnvironment::Production => BASE_URL,
            ApiEnvironment::Test => TEST_BASE_URL,
        }
    }
}

impl FromStr for ApiEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(ApiEnvironment::Production),
            "test" | "sandbox" => Ok(ApiEnvironment::Test),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,

    /// Deployment selected for outbound calls
    pub environment: ApiEnvironment,

    /// Explicit base URL, takes precedence over `environment` (mock servers)
    pub base_url_override: Option<String>,

    /// HTTP request timeout for the outbound client, none by default
    pub request_timeout_ms: Option<u64>,

    // =========================================================================
    // Web Server Configuration
    // =========================================================================
    /// Port for the web server to listen on
    pub port: u16,

    /// Route receiving tracking pushes
    pub push_path: String,

    /// Route issuing print signatures
    pub print_path: String,
}

impl Config {
    /// Build a configuration with default settings around `credentials`.
    pub fn new(credentials: Credentials) -> Self {
        Config {
            credentials,
            environment: ApiEnvironment::default(),
            base_url_override: None,
            request_timeout_ms: None,
            port: 8080,
            push_path: "/kdniao/push".to_string(),
            print_path: "/kdniao/print".to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let credentials = Credentials::new(
            env::var("KDNIAO_EBUSINESS_ID").unwrap_or_default(),
            env::var("KDNIAO_APP_KEY").unwrap_or_default(),
        )
        .with_sign_scheme(parse_or("KDNIAO_SIGN_SCHEME", SignScheme::default()));

        if credentials.business_id.is_empty() || credentials.app_key.is_empty() {
            warn!(
                has_business_id = !credentials.business_id.is_empty(),
                has_app_key = !credentials.app_key.is_empty(),
                "kdniao_credentials_incomplete"
            );
        }

        let defaults = Config::new(credentials);

        Config {
            environment: parse_or("KDNIAO_ENV", defaults.environment),

            base_url_override: env::var("KDNIAO_BASE_URL")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok()),

            port: parse_or("PORT", defaults.port),

            push_path: parse_path("KDNIAO_PUSH_PATH", &defaults.push_path),

            print_path: parse_path("KDNIAO_PRINT_PATH", &defaults.print_path),

            ..defaults
        }
    }

    /// Base URL outbound calls are sent to.
    pub fn base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or_else(|| self.environment.base_url())
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr + fmt::Debug,
{
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, default = ?default, "Invalid value, using default");
            default
        }
    }
}

/// Parse a route path, making sure it starts with `/`.
fn parse_path(name: &str, default: &str) -> String {
    let raw = match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => return default.to_string(),
    };

    if raw.starts_with('/') {
        raw
    } else {
        format!("/{}", raw)
    }
}
