//! Typed payloads carried in the `data` field of protocol envelopes.
//!
//! Field names follow the wire format exactly (snake_case), so none of these
//! structs rename their fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Descriptor of this client library sent in the `client-ready` handshake.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AboutClientData {
    #[serde(default)]
    pub library: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_details: Option<Map<String, Value>>,
}

/// Payload of `client-ready`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientReadyData {
    pub version: String,
    pub about: AboutClientData,
}

/// Payload of `bot-ready`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BotReadyData {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<Value>,
}

/// Payload of `error`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorData {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub fatal: bool,
}

/// One processor's reading inside a metrics report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipecatMetricData {
    pub processor: String,
    pub value: f64,
}

/// Payload of `metrics`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipecatMetricsData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing: Option<Vec<PipecatMetricData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttfb: Option<Vec<PipecatMetricData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<PipecatMetricData>>,
}

/// Payload of `user-transcription`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranscriptData {
    #[serde(default)]
    pub text: String,
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub user_id: String,
}

/// Payload of the streamed text notifications (`bot-transcription`,
/// `user-llm-text`, `bot-llm-text`, `bot-tts-text`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    #[serde(default)]
    pub text: String,
}

/// Payload of `client-message`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientMessageData {
    pub t: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

/// Payload of `server-response`: the same `{t, d}` shape as the request.
pub type ServerResponseData = ClientMessageData;

#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LlmSearchResult {
    pub text: String,
    #[serde(default)]
    pub confidence: Vec<f64>,
}

#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LlmSearchOrigin {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_title: Option<String>,
    #[serde(default)]
    pub results: Vec<LlmSearchResult>,
}

/// Payload of `bot-llm-search-response`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BotLlmSearchResponseData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_content: Option<String>,
    #[serde(default)]
    pub origins: Vec<LlmSearchOrigin>,
}

/// Payload of `llm-function-call`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmFunctionCallData {
    #[serde(default)]
    pub function_name: String,
    #[serde(default)]
    pub tool_call_id: String,
    #[serde(default)]
    pub args: Value,
}

/// Payload of the outbound `llm-function-call-result`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LlmFunctionCallResultResponse {
    pub function_name: String,
    pub tool_call_id: String,
    pub args: Value,
    pub result: Value,
}

/// Payload of `append-to-context`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LlmContextMessage {
    pub role: LlmContextRole,
    pub content: Value,
    #[serde(default, rename = "runImmediately", alias = "run_immediately")]
    pub run_immediately: bool,
}

impl LlmContextMessage {
    /// A user-role context entry.
    pub fn user(content: impl Into<Value>, run_immediately: bool) -> Self {
        Self {
            role: LlmContextRole::User,
            content: content.into(),
            run_immediately,
        }
    }
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmContextRole {
    User,
    Assistant,
}

/// Payload of `append-to-context-result`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppendToContextResultData {
    #[serde(default)]
    pub result: Value,
}

impl AppendToContextResultData {
    /// Truthiness of `result` the way the bot means it.
    pub fn is_success(&self) -> bool {
        match &self.result {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}
