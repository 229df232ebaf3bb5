//! Outbound KDNiao API client.

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, Credentials};
use crate::envelope::{Envelope, RequestType};
use crate::error::KdniaoError;
use crate::types::order::EXP_TYPE_STANDARD;
use crate::types::{
    EOrderRequest, EOrderResponse, ProviderReply, SubscribeTracingRequest,
    SubscribeTracingResponse,
};

/// E-order service path.
pub const EORDER_PATH: &str = "/eorderservice";

/// Distribution path, used for tracking subscriptions.
pub const DIST_PATH: &str = "/dist";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// Client for KDNiao's signed form API.
///
/// Holds no mutable state; clone it freely. Timeouts, proxies and TLS are
/// whatever the injected `reqwest::Client` was built with.
#[derive(Debug, Clone)]
pub struct Client {
    credentials: Credentials,
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client with a default `reqwest::Client`.
    pub fn new(credentials: Credentials, base_url: impl Into<String>) -> Self {
        Self::with_client(credentials, base_url, reqwest::Client::new())
    }

    /// Create a client on top of a caller-configured HTTP client.
    pub fn with_client(
        credentials: Credentials,
        base_url: impl Into<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            credentials,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        Self::with_client(config.credentials.clone(), config.base_url(), http)
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Serialize and sign `payload` as a `request_type` envelope.
    pub fn build_envelope<T>(
        &self,
        request_type: RequestType,
        payload: &T,
    ) -> Result<Envelope, KdniaoError>
    where
        T: Serialize + ?Sized,
    {
        Envelope::build(&self.credentials, request_type, payload)
    }

    /// POST `envelope` to `path` and decode the provider's reply.
    ///
    /// A reply that decodes but reports failure is returned as
    /// [`KdniaoError::Business`].
    pub async fn call<R>(&self, path: &str, envelope: &Envelope) -> Result<R, KdniaoError>
    where
        R: DeserializeOwned + ProviderReply,
    {
        let url = format!("{}{}", self.base_url, path);

        debug!(
            url = %url,
            request_type = %envelope.request_type(),
            request_data_length = envelope.request_data().len(),
            "kdniao_request_sending"
        );

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(envelope.to_form_body())
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "kdniao_request_failed");
                KdniaoError::Transport(e)
            })?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        let reply: R = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            warn!(
                url = %url,
                status_code = status,
                error = %e,
                body_preview = %preview,
                "kdniao_response_decode_failed"
            );
            KdniaoError::Decoding(e)
        })?;

        if let Err(e) = reply.check() {
            warn!(
                url = %url,
                request_type = %envelope.request_type(),
                error = %e,
                "kdniao_business_error"
            );
            return Err(e);
        }

        debug!(url = %url, status_code = status, "kdniao_request_complete");

        Ok(reply)
    }

    /// Create an electronic order.
    ///
    /// `ExpType` is always sent as standard express.
    pub async fn create_eorder(&self, order: &EOrderRequest) -> Result<EOrderResponse, KdniaoError> {
        let order = EOrderRequest {
            exp_type: EXP_TYPE_STANDARD.to_string(),
            ..order.clone()
        };

        let envelope = self.build_envelope(RequestType::CreateEOrder, &order)?;
        let reply: EOrderResponse = self.call(EORDER_PATH, &envelope).await?;

        info!(
            order_code = %reply.order.order_code,
            shipper_code = %reply.order.shipper_code,
            logistic_code = %reply.order.logistic_code,
            "kdniao_eorder_created"
        );

        Ok(reply)
    }

    /// Subscribe to tracking pushes for one waybill.
    pub async fn subscribe_tracing(
        &self,
        sub: &SubscribeTracingRequest,
    ) -> Result<SubscribeTracingResponse, KdniaoError> {
        let envelope = self.build_envelope(RequestType::SubscribeTracing, sub)?;
        let reply: SubscribeTracingResponse = self.call(DIST_PATH, &envelope).await?;

        info!(
            shipper_code = %sub.shipper_code,
            logistic_code = %sub.logistic_code,
            estimated_delivery_time = %reply.estimated_delivery_time,
            "kdniao_tracing_subscribed"
        );

        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use url::form_urlencoded;

    use super::*;

    /// A single-shot HTTP server returning a canned response.
    struct MockKdniaoServer {
        listener: TcpListener,
        base_url: String,
    }

    /// What the mock server received.
    struct CapturedRequest {
        head: String,
        form: HashMap<String, String>,
    }

    impl MockKdniaoServer {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("failed to bind mock server");
            let port = listener.local_addr().unwrap().port();
            let base_url = format!("http://127.0.0.1:{port}/api");
            Self { listener, base_url }
        }

        async fn respond_once(self, status_code: u16, body: &str) -> CapturedRequest {
            let (mut stream, _) = self.listener.accept().await.unwrap();

            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            let (head, body_start, content_length) = loop {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&raw[..pos]).to_string();
                    let content_length = head
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    break (head, pos + 4, content_length);
                }
            };
            while raw.len() < body_start + content_length {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before body");
                raw.extend_from_slice(&buf[..n]);
            }

            let form = form_urlencoded::parse(&raw[body_start..body_start + content_length])
                .into_owned()
                .collect();

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            CapturedRequest { head, form }
        }
    }

    fn credentials() -> Credentials {
        Credentials::new("1237100", "secret-key")
    }

    fn test_client(base_url: &str) -> Client {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        Client::with_client(credentials(), base_url, http)
    }

    #[tokio::test]
    async fn test_subscribe_tracing_success() {
        let server = MockKdniaoServer::start().await;
        let client = test_client(&server.base_url);

        let body = r#"{"EBusinessID":"1237100","UpdateTime":"2024-03-01 10:00:00","Success":true,"Reason":"","EstimatedDeliveryTime":"2024-03-03"}"#;
        let handle = tokio::spawn(server.respond_once(200, body));

        let sub = SubscribeTracingRequest::new("SF", "118650888018");
        let reply = client.subscribe_tracing(&sub).await.expect("subscribe should succeed");
        let captured = handle.await.unwrap();

        assert!(reply.success);
        assert_eq!(reply.estimated_delivery_time, "2024-03-03");

        assert!(captured.head.starts_with("POST /api/dist "));
        assert!(captured
            .head
            .to_ascii_lowercase()
            .contains("content-type: application/x-www-form-urlencoded;charset=utf-8"));
        assert_eq!(captured.form["EBusinessID"], "1237100");
        assert_eq!(captured.form["RequestType"], "1008");
        assert_eq!(captured.form["DataType"], "2");
        assert_eq!(
            captured.form["RequestData"],
            r#"{"ShipperCode":"SF","LogisticCode":"118650888018"}"#
        );
        assert_eq!(
            captured.form["DataSign"],
            credentials().sign(&captured.form["RequestData"])
        );
    }

    #[tokio::test]
    async fn test_create_eorder_forces_standard_exp_type() {
        let server = MockKdniaoServer::start().await;
        let client = test_client(&server.base_url);

        let body = r#"{"EBusinessID":"1237100","Order":{"OrderCode":"ORD-1","ShipperCode":"SF","LogisticCode":"118650888018"},"Success":true,"ResultCode":"100","UniquerRequestNumber":"abc"}"#;
        let handle = tokio::spawn(server.respond_once(200, body));

        let order = EOrderRequest {
            order_code: "ORD-1".to_string(),
            shipper_code: "SF".to_string(),
            exp_type: "9".to_string(),
            ..Default::default()
        };
        let reply = client.create_eorder(&order).await.expect("create should succeed");
        let captured = handle.await.unwrap();

        assert_eq!(reply.order.logistic_code, "118650888018");
        assert!(captured.head.starts_with("POST /api/eorderservice "));
        assert_eq!(captured.form["RequestType"], "1007");

        let sent: serde_json::Value = serde_json::from_str(&captured.form["RequestData"]).unwrap();
        assert_eq!(sent["ExpType"], "1");
        assert_eq!(sent["OrderCode"], "ORD-1");
    }

    #[tokio::test]
    async fn test_business_failure_surfaced_distinctly() {
        let server = MockKdniaoServer::start().await;
        let client = test_client(&server.base_url);

        let body = r#"{"EBusinessID":"1237100","Success":false,"ResultCode":"105","Reason":"DataSign verification failed"}"#;
        let handle = tokio::spawn(server.respond_once(200, body));

        let err = client
            .create_eorder(&EOrderRequest::default())
            .await
            .unwrap_err();
        handle.await.unwrap();

        match err {
            KdniaoError::Business { code, reason } => {
                assert_eq!(code, "105");
                assert_eq!(reason, "DataSign verification failed");
            }
            other => panic!("Expected business error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_subscribe_failure_without_result_code() {
        let server = MockKdniaoServer::start().await;
        let client = test_client(&server.base_url);

        let body = r#"{"EBusinessID":"1237100","Success":false,"Reason":"waybill not found"}"#;
        let handle = tokio::spawn(server.respond_once(200, body));

        let err = client
            .subscribe_tracing(&SubscribeTracingRequest::new("SF", "0"))
            .await
            .unwrap_err();
        handle.await.unwrap();

        assert!(err.is_business());
        assert!(err.to_string().contains("waybill not found"));
    }

    #[tokio::test]
    async fn test_malformed_response_is_decoding_error() {
        let server = MockKdniaoServer::start().await;
        let client = test_client(&server.base_url);

        let handle = tokio::spawn(server.respond_once(200, "<html>gateway error</html>"));

        let err = client
            .subscribe_tracing(&SubscribeTracingRequest::new("SF", "1"))
            .await
            .unwrap_err();
        handle.await.unwrap();

        assert!(matches!(err, KdniaoError::Decoding(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = test_client(&format!("http://127.0.0.1:{port}/api"));
        let err = client
            .subscribe_tracing(&SubscribeTracingRequest::new("SF", "1"))
            .await
            .unwrap_err();

        assert!(matches!(err, KdniaoError::Transport(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = Client::new(credentials(), "http://api.kdniao.cc/api/");
        assert_eq!(client.base_url(), "http://api.kdniao.cc/api");
    }
}
