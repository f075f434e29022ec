//! Resolving connection parameters from a remote endpoint before connecting.

use std::collections::HashMap;
use std::time::Duration;

use rtvi_core::RtviError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Where to POST for connection parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEndpoint {
    /// URL receiving the POST.
    pub endpoint: String,
    /// Extra request headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// JSON body; an empty object when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
    /// Request timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ConnectionEndpoint {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn request_data(mut self, data: Value) -> Self {
        self.request_data = Some(data);
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

/// Argument to `connect`: either transport parameters as-is or an endpoint
/// to fetch them from.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectParams {
    /// Passed straight to the transport.
    Direct(Value),
    /// Fetched first, then passed to the transport.
    Endpoint(ConnectionEndpoint),
}

impl ConnectParams {
    /// Classify a loose JSON value: an object whose `endpoint` field is a
    /// string is a fetch descriptor, anything else goes to the transport.
    pub fn from_value(value: Value) -> Result<Self, RtviError> {
        let is_endpoint = value
            .as_object()
            .and_then(|obj| obj.get("endpoint"))
            .is_some_and(Value::is_string);
        if !is_endpoint {
            return Ok(Self::Direct(value));
        }
        serde_json::from_value(value)
            .map(Self::Endpoint)
            .map_err(|e| RtviError::InvalidConnectionParams(e.to_string()))
    }
}

impl From<ConnectionEndpoint> for ConnectParams {
    fn from(endpoint: ConnectionEndpoint) -> Self {
        Self::Endpoint(endpoint)
    }
}

/// POST to the endpoint and return the JSON body as connection parameters.
///
/// HTTP failures become [`RtviError::StartBot`] carrying the status when the
/// server answered. Cancelling `cancel` aborts the request with
/// [`RtviError::Cancelled`].
pub async fn fetch_connection_params(
    http: &reqwest::Client,
    endpoint: &ConnectionEndpoint,
    default_timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<Value, RtviError> {
    let body = endpoint
        .request_data
        .clone()
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
    let mut request = http.post(&endpoint.endpoint).json(&body);
    for (name, value) in &endpoint.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    let timeout = endpoint.timeout.map(Duration::from_millis).or(default_timeout);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    debug!(endpoint = %endpoint.endpoint, ?timeout, "fetching connection params");

    let exchange = async {
        let resp = request.send().await.map_err(start_bot_error)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(RtviError::StartBot {
                message,
                status: Some(status.as_u16()),
            });
        }
        resp.json::<Value>()
            .await
            .map_err(|e| RtviError::InvalidConnectionParams(e.to_string()))
    };

    tokio::select! {
        () = cancel.cancelled() => {
            warn!(endpoint = %endpoint.endpoint, "connection params fetch aborted");
            Err(RtviError::Cancelled)
        }
        result = exchange => result,
    }
}

fn start_bot_error(e: reqwest::Error) -> RtviError {
    RtviError::StartBot {
        message: e.to_string(),
        status: e.status().map(|s| s.as_u16()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn endpoint_descriptor_detection() {
        let params = ConnectParams::from_value(json!({
            "endpoint": "https://example.test/connect",
            "requestData": {"bot": "demo"},
            "timeout": 1500
        }))
        .unwrap();
        let ConnectParams::Endpoint(ep) = params else {
            panic!("expected endpoint descriptor");
        };
        assert_eq!(ep.endpoint, "https://example.test/connect");
        assert_eq!(ep.request_data, Some(json!({"bot": "demo"})));
        assert_eq!(ep.timeout, Some(1500));
    }

    #[test]
    fn non_string_endpoint_is_direct() {
        for value in [
            json!({"endpoint": 42}),
            json!({"url": "wss://example.test"}),
            json!("room-token"),
            Value::Null,
        ] {
            assert!(matches!(
                ConnectParams::from_value(value.clone()).unwrap(),
                ConnectParams::Direct(v) if v == value
            ));
        }
    }

    #[test]
    fn malformed_descriptor_is_rejected() {
        let err = ConnectParams::from_value(json!({"endpoint": "x", "headers": "nope"})).unwrap_err();
        assert!(matches!(err, RtviError::InvalidConnectionParams(_)));
    }

    #[tokio::test]
    async fn posts_request_data_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(json!({"bot": "demo"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"room_url": "wss://room", "token": "t"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = ConnectionEndpoint::new(format!("{}/connect", server.uri()))
            .header("authorization", "Bearer secret")
            .request_data(json!({"bot": "demo"}));
        let params = fetch_connection_params(
            &reqwest::Client::new(),
            &endpoint,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(params["room_url"], "wss://room");
    }

    #[tokio::test]
    async fn empty_body_when_no_request_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let params = fetch_connection_params(
            &reqwest::Client::new(),
            &ConnectionEndpoint::new(server.uri()),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(params, json!({"ok": true}));
    }

    #[tokio::test]
    async fn http_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = fetch_connection_params(
            &reqwest::Client::new(),
            &ConnectionEndpoint::new(server.uri()),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.kind(), "start_bot");
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = fetch_connection_params(
            &reqwest::Client::new(),
            &ConnectionEndpoint::new(server.uri()),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RtviError::InvalidConnectionParams(_)));
    }

    #[tokio::test]
    async fn timeout_is_a_start_bot_error_without_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let endpoint = ConnectionEndpoint::new(server.uri()).timeout(Duration::from_millis(100));
        let err = fetch_connection_params(
            &reqwest::Client::new(),
            &endpoint,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RtviError::StartBot { status: None, .. }));
    }

    #[tokio::test]
    async fn cancellation_aborts_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let _ = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = fetch_connection_params(
            &reqwest::Client::new(),
            &ConnectionEndpoint::new(server.uri()),
            None,
            &cancel,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RtviError::Cancelled));
    }
}
