//! Shared HTTP plumbing: request sending, status mapping and inspection hooks.

use std::sync::Arc;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};

use super::error::LlmError;

/// Callback receiving the raw JSON of a request or response.
pub type Inspector = Arc<dyn Fn(&Value) + Send + Sync>;

/// Optional request/response hooks, useful for debugging prompts and schemas.
#[derive(Clone, Default)]
pub struct InspectorConfig {
    pub request_inspector: Option<Inspector>,
    pub response_inspector: Option<Inspector>,
}

impl InspectorConfig {
    fn inspect_request(&self, value: &Value) {
        if let Some(inspector) = &self.request_inspector {
            inspector(value);
        }
    }

    fn inspect_response(&self, value: &Value) {
        if let Some(inspector) = &self.response_inspector {
            inspector(value);
        }
    }
}

impl std::fmt::Debug for InspectorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InspectorConfig")
            .field("request_inspector", &self.request_inspector.is_some())
            .field("response_inspector", &self.response_inspector.is_some())
            .finish()
    }
}

/// Transport settings. No timeout is applied unless one is set here.
#[derive(Debug, Clone, Default)]
pub struct HttpClientConfig {
    /// Total time for a request, including reading a streamed body.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    /// Defaults to `xai-client/<version>`.
    pub user_agent: Option<String>,
}

impl HttpClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

pub(crate) struct HttpClient {
    client: reqwest::Client,
    inspector_config: InspectorConfig,
}

impl HttpClient {
    pub(crate) fn new(
        config: &HttpClientConfig,
        inspector_config: InspectorConfig,
    ) -> Result<Self, LlmError> {
        let default_ua = format!("xai-client/{}", env!("CARGO_PKG_VERSION"));
        let ua = config.user_agent.as_deref().unwrap_or(&default_ua);

        let mut builder = reqwest::Client::builder().user_agent(ua);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build reqwest client: {e}")))?;

        Ok(Self {
            client,
            inspector_config,
        })
    }

    /// POST a JSON body and decode a JSON response. Never retries.
    #[tracing::instrument(
        name = "http_post_json",
        level = "debug",
        skip(self, headers, body),
        fields(url = %url),
        err
    )]
    pub(crate) async fn post_json<Req, Res>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<Res, LlmError>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        let res = self.send(url, headers, body).await?;

        let response_text = res
            .text()
            .await
            .map_err(|e| LlmError::transport("Failed to read response body", e))?;

        let response_value: Value = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::parse("Failed to parse response as JSON", e))?;

        self.inspector_config.inspect_response(&response_value);

        serde_json::from_value(response_value)
            .map_err(|e| LlmError::parse("Failed to parse API response", e))
    }

    /// POST a JSON body and hand back the successful response with its body unread.
    #[tracing::instrument(
        name = "http_post_stream",
        level = "debug",
        skip(self, headers, body),
        fields(url = %url),
        err
    )]
    pub(crate) async fn post_stream<Req>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<reqwest::Response, LlmError>
    where
        Req: Serialize,
    {
        self.send(url, headers, body).await
    }

    async fn send<Req>(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &Req,
    ) -> Result<reqwest::Response, LlmError>
    where
        Req: Serialize,
    {
        let body_value = serde_json::to_value(body)
            .map_err(|e| LlmError::parse("Failed to serialize request", e))?;

        self.inspector_config.inspect_request(&body_value);

        let mut req_builder = self.client.post(url).json(&body_value);
        for (name, value) in headers {
            req_builder = req_builder.header(name, value);
        }

        let res = req_builder
            .send()
            .await
            .map_err(|e| LlmError::transport("Failed to send request", e))?;

        let status = res.status();
        if status.is_success() {
            debug!(status = %status, "HTTP request successful");
            return Ok(res);
        }

        warn!(status = %status, "API returned error status");

        let error_text = res
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let error_value = serde_json::from_str(&error_text).unwrap_or_else(|_| {
            serde_json::json!({
                "error": error_text,
                "status_code": status.as_u16()
            })
        });
        self.inspector_config.inspect_response(&error_value);

        Err(error_from_status(status, &error_text))
    }
}

/// Maps a non-success status and its body onto the error taxonomy.
///
/// Understands both `{"error": {"message", "code", "type"}}` and
/// `{"code": "...", "error": "..."}` payloads.
pub(crate) fn error_from_status(status: reqwest::StatusCode, body: &str) -> LlmError {
    let payload: Option<Value> = serde_json::from_str(body).ok();
    let (message, code) = payload
        .as_ref()
        .map(describe_error_payload)
        .unwrap_or((None, None));

    let message = message
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| format!("HTTP {status}"));

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => LlmError::Auth {
            message,
            status_code: status.as_u16(),
        },
        _ => LlmError::Provider {
            message,
            status_code: Some(status.as_u16()),
            code,
        },
    }
}

/// Pulls `(message, code)` out of a provider error payload.
pub(crate) fn describe_error_payload(payload: &Value) -> (Option<String>, Option<String>) {
    let as_string = |value: &Value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };

    match payload.get("error") {
        Some(Value::Object(error)) => {
            let message = error.get("message").and_then(as_string);
            let code = error
                .get("code")
                .and_then(as_string)
                .or_else(|| error.get("type").and_then(as_string));
            (message, code)
        }
        Some(Value::String(message)) => (
            Some(message.clone()),
            payload.get("code").and_then(as_string),
        ),
        _ => (
            payload.get("message").and_then(as_string),
            payload.get("code").and_then(as_string),
        ),
    }
}
