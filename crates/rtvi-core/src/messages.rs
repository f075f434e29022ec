use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::RtviError;
use crate::ids::MessageId;
use crate::payloads::{
    AboutClientData, ClientMessageData, ClientReadyData, ErrorData, LlmContextMessage,
    LlmFunctionCallResultResponse,
};

/// Version of the RTVI protocol spoken by this client.
pub const RTVI_PROTOCOL_VERSION: &str = "1.0.0";
/// Constant marker carried in every envelope's `label` field.
pub const RTVI_MESSAGE_LABEL: &str = "rtvi-ai";
/// Error text of the payload synthesised when a pending request expires.
pub const TIMEOUT_ERROR_TEXT: &str = "Timed out waiting for response";

/// Type tag of an envelope.
///
/// The wire form is the kebab-case string. Tags this client does not know are
/// preserved in [`MessageType::Unknown`] so that routing can log and drop them
/// instead of failing to parse the whole envelope.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    // Outbound
    ClientReady,
    DisconnectBot,
    ClientMessage,
    AppendToContext,

    // Inbound: lifecycle and request/response
    BotReady,
    Error,
    Metrics,
    ServerMessage,
    ServerResponse,
    ErrorResponse,
    AppendToContextResult,

    // Inbound: transcription and turn taking
    UserTranscription,
    BotTranscription,
    UserStartedSpeaking,
    UserStoppedSpeaking,
    BotStartedSpeaking,
    BotStoppedSpeaking,

    // Inbound: LLM
    UserLlmText,
    BotLlmText,
    BotLlmStarted,
    BotLlmStopped,
    LlmFunctionCall,
    LlmFunctionCallResult,
    BotLlmSearchResponse,

    // Inbound: TTS
    BotTtsText,
    BotTtsStarted,
    BotTtsStopped,

    Unknown(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ClientReady => "client-ready",
            Self::DisconnectBot => "disconnect-bot",
            Self::ClientMessage => "client-message",
            Self::AppendToContext => "append-to-context",
            Self::BotReady => "bot-ready",
            Self::Error => "error",
            Self::Metrics => "metrics",
            Self::ServerMessage => "server-message",
            Self::ServerResponse => "server-response",
            Self::ErrorResponse => "error-response",
            Self::AppendToContextResult => "append-to-context-result",
            Self::UserTranscription => "user-transcription",
            Self::BotTranscription => "bot-transcription",
            Self::UserStartedSpeaking => "user-started-speaking",
            Self::UserStoppedSpeaking => "user-stopped-speaking",
            Self::BotStartedSpeaking => "bot-started-speaking",
            Self::BotStoppedSpeaking => "bot-stopped-speaking",
            Self::UserLlmText => "user-llm-text",
            Self::BotLlmText => "bot-llm-text",
            Self::BotLlmStarted => "bot-llm-started",
            Self::BotLlmStopped => "bot-llm-stopped",
            Self::LlmFunctionCall => "llm-function-call",
            Self::LlmFunctionCallResult => "llm-function-call-result",
            Self::BotLlmSearchResponse => "bot-llm-search-response",
            Self::BotTtsText => "bot-tts-text",
            Self::BotTtsStarted => "bot-tts-started",
            Self::BotTtsStopped => "bot-tts-stopped",
            Self::Unknown(raw) => raw,
        }
    }

    /// Whether this tag is one the client sends to the bot.
    pub fn is_outbound(&self) -> bool {
        matches!(
            self,
            Self::ClientReady
                | Self::DisconnectBot
                | Self::ClientMessage
                | Self::AppendToContext
                | Self::LlmFunctionCallResult
        )
    }
}

impl From<&str> for MessageType {
    fn from(raw: &str) -> Self {
        match raw {
            "client-ready" => Self::ClientReady,
            "disconnect-bot" => Self::DisconnectBot,
            "client-message" => Self::ClientMessage,
            "append-to-context" => Self::AppendToContext,
            "bot-ready" => Self::BotReady,
            "error" => Self::Error,
            "metrics" => Self::Metrics,
            "server-message" => Self::ServerMessage,
            "server-response" => Self::ServerResponse,
            "error-response" => Self::ErrorResponse,
            "append-to-context-result" => Self::AppendToContextResult,
            "user-transcription" => Self::UserTranscription,
            "bot-transcription" => Self::BotTranscription,
            "user-started-speaking" => Self::UserStartedSpeaking,
            "user-stopped-speaking" => Self::UserStoppedSpeaking,
            "bot-started-speaking" => Self::BotStartedSpeaking,
            "bot-stopped-speaking" => Self::BotStoppedSpeaking,
            "user-llm-text" => Self::UserLlmText,
            "bot-llm-text" => Self::BotLlmText,
            "bot-llm-started" => Self::BotLlmStarted,
            "bot-llm-stopped" => Self::BotLlmStopped,
            "llm-function-call" => Self::LlmFunctionCall,
            "llm-function-call-result" => Self::LlmFunctionCallResult,
            "bot-llm-search-response" => Self::BotLlmSearchResponse,
            "bot-tts-text" => Self::BotTtsText,
            "bot-tts-started" => Self::BotTtsStarted,
            "bot-tts-stopped" => Self::BotTtsStopped,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl From<String> for MessageType {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<MessageType> for String {
    fn from(ty: MessageType) -> Self {
        match ty {
            MessageType::Unknown(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_label() -> String {
    RTVI_MESSAGE_LABEL.to_owned()
}

/// The unit exchanged with the bot.
///
/// Wire shape: `{ "id", "label": "rtvi-ai", "type", "data" }`. The id is fixed
/// at construction and is the only key used to correlate a response with its
/// request, so there is no setter for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    #[serde(default = "default_label")]
    label: String,
    #[serde(rename = "type")]
    msg_type: MessageType,
    #[serde(default)]
    data: Value,
}

impl Message {
    /// Build an envelope with a freshly generated id.
    pub fn new(msg_type: MessageType, data: Value) -> Self {
        Self::with_id(MessageId::new(), msg_type, data)
    }

    /// Build an envelope that reuses `id`, as responses do.
    pub fn with_id(id: MessageId, msg_type: MessageType, data: Value) -> Self {
        Self {
            id,
            label: default_label(),
            msg_type,
            data,
        }
    }

    /// Correlation id.
    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn msg_type(&self) -> &MessageType {
        &self.msg_type
    }

    /// Raw `data` body; see [`Message::payload`] for a typed view.
    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    /// Decode the payload into a typed structure.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, RtviError> {
        serde_json::from_value(self.data.clone()).map_err(|e| {
            RtviError::Serialization(format!("invalid {} payload: {e}", self.msg_type))
        })
    }

    pub fn to_json(&self) -> Result<String, RtviError> {
        serde_json::to_string(self).map_err(|e| RtviError::Serialization(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, RtviError> {
        serde_json::from_str(raw).map_err(|e| RtviError::Serialization(e.to_string()))
    }

    // ── Outbound constructors ──────────────────────────────────────────

    /// The `client-ready` handshake, built from an explicit about-client descriptor.
    pub fn client_ready(about: &AboutClientData) -> Self {
        let data = ClientReadyData {
            version: RTVI_PROTOCOL_VERSION.to_owned(),
            about: about.clone(),
        };
        Self::new(MessageType::ClientReady, to_value_or_null(&data))
    }

    pub fn disconnect_bot() -> Self {
        Self::new(MessageType::DisconnectBot, json!({}))
    }

    pub fn client_message(msg_type: impl Into<String>, data: Option<Value>) -> Self {
        let payload = ClientMessageData {
            t: msg_type.into(),
            d: data,
        };
        Self::new(MessageType::ClientMessage, to_value_or_null(&payload))
    }

    pub fn append_to_context(context: &LlmContextMessage) -> Self {
        Self::new(MessageType::AppendToContext, to_value_or_null(context))
    }

    pub fn function_call_result(result: &LlmFunctionCallResultResponse) -> Self {
        Self::new(MessageType::LlmFunctionCallResult, to_value_or_null(result))
    }

    pub fn error(message: impl Into<String>, fatal: bool) -> Self {
        let data = ErrorData {
            message: message.into(),
            fatal,
        };
        Self::new(MessageType::Error, to_value_or_null(&data))
    }

    /// The `error-response` synthesised locally when `request` expires.
    ///
    /// For `client-message` requests the diagnostic fields report the inner
    /// `t`/`d` pair; for any other request they report the envelope's own
    /// type and data. The synthesised message reuses the request id.
    pub fn request_timed_out(request: &Self) -> Self {
        let (msg_type, data) = match (&request.msg_type, request.payload::<ClientMessageData>()) {
            (MessageType::ClientMessage, Ok(inner)) => {
                (Value::String(inner.t), inner.d.unwrap_or(Value::Null))
            }
            _ => (
                Value::String(request.msg_type.as_str().to_owned()),
                request.data.clone(),
            ),
        };
        Self::with_id(
            request.id.clone(),
            MessageType::ErrorResponse,
            json!({
                "error": TIMEOUT_ERROR_TEXT,
                "msgType": msg_type,
                "data": data,
                "fatal": false,
            }),
        )
    }

    /// The `error` text of an `error-response` payload, if present.
    pub fn error_text(&self) -> Option<&str> {
        self.data.get("error").and_then(Value::as_str)
    }
}

// Payload structs only contain JSON-representable fields.
fn to_value_or_null<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
