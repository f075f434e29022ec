use serde::{Deserialize, Serialize};

use crate::messages::Message;
use crate::state::TransportState;

/// Device class named in a [`RtviError::Device`].
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cam,
    Mic,
    Speaker,
}

/// Why a device could not be used.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceErrorKind {
    InUse,
    Permissions,
    UndefinedMediaDevices,
    NotFound,
    Constraints,
    Unknown,
}

/// Errors surfaced by the SDK.
///
/// Grouped by kind: protocol (bot-reported), precondition (method called in
/// the wrong session state), timeout (synthesised locally), bootstrap (the
/// credential fetch failed) and capability errors. Everything else is
/// operational plumbing.
#[derive(Clone, Debug, thiserror::Error)]
pub enum RtviError {
    // Protocol
    /// An `error` message from the bot.
    #[error("bot reported error: {message}")]
    Protocol {
        /// Bot-supplied text.
        message: String,
        /// Whether the bot is ending the session.
        fatal: bool,
    },
    /// The bot answered a request with `error-response`.
    #[error("bot rejected request {}: {}", .0.id(), .0.error_text().unwrap_or("unknown error"))]
    ErrorResponse(Box<Message>),

    // Precondition
    /// `connect` while a session is starting or live.
    #[error("client has already been started; call disconnect() before starting again")]
    AlreadyStarted,
    /// A messaging call made before `bot-ready`.
    #[error("attempt to call action on transport when not in 'ready' state (state: {state})")]
    BotNotReady { state: TransportState },

    // Timeout
    /// No response within the request timeout. Carries the synthesised
    /// `error-response`.
    #[error("timed out waiting for response to request {}", .0.id())]
    Timeout(Box<Message>),

    // Bootstrap
    /// The connection-params fetch failed. `status` is set when the server
    /// answered.
    #[error("failed to start bot: {message}")]
    StartBot {
        /// What went wrong.
        message: String,
        /// HTTP status, if any.
        status: Option<u16>,
    },

    // Capability
    /// The transport lacks a feature, such as screen sharing.
    #[error("{}", unsupported_message(.feature, .transport.as_deref(), .detail.as_deref()))]
    UnsupportedFeature {
        /// Feature name.
        feature: String,
        /// Transport name, if known.
        transport: Option<String>,
        /// Extra context.
        detail: Option<String>,
    },
    /// Media device failure reported by the transport.
    #[error("{kind:?} error for {devices:?}: {message}")]
    Device {
        /// Devices involved.
        devices: Vec<DeviceKind>,
        /// Failure class.
        kind: DeviceErrorKind,
        /// Transport-supplied text.
        message: String,
    },

    // Operational
    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(String),
    /// Connection params the transport cannot use.
    #[error("invalid connection parameters: {0}")]
    InvalidConnectionParams(String),
    /// The operation was aborted by a disconnect.
    #[error("cancelled")]
    Cancelled,
    /// The request was dropped by a queue clear or disconnect.
    #[error("session disconnected before a response arrived")]
    SessionDisconnected,
    /// A payload did not match its expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),
}

fn unsupported_message(feature: &str, transport: Option<&str>, detail: Option<&str>) -> String {
    let mut msg = format!("{feature} not supported");
    if let Some(transport) = transport {
        msg = format!("{transport} does not support {feature}");
    }
    if let Some(detail) = detail {
        msg.push_str(": ");
        msg.push_str(detail);
    }
    msg
}

impl RtviError {
    /// Capability error for `feature`, naming the transport when known.
    pub fn unsupported(feature: impl Into<String>, transport: Option<&str>) -> Self {
        Self::UnsupportedFeature {
            feature: feature.into(),
            transport: transport.map(str::to_owned),
            detail: None,
        }
    }

    /// Short classification string for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Protocol { .. } => "protocol",
            Self::ErrorResponse(_) => "error_response",
            Self::AlreadyStarted => "already_started",
            Self::BotNotReady { .. } => "bot_not_ready",
            Self::Timeout(_) => "timeout",
            Self::StartBot { .. } => "start_bot",
            Self::UnsupportedFeature { .. } => "unsupported_feature",
            Self::Device { .. } => "device",
            Self::Transport(_) => "transport",
            Self::InvalidConnectionParams(_) => "invalid_connection_params",
            Self::Cancelled => "cancelled",
            Self::SessionDisconnected => "session_disconnected",
            Self::Serialization(_) => "serialization",
        }
    }

    /// HTTP status of a failed credential fetch, when the server answered.
    pub fn status(&self) -> Option<u16> {
        if let Self::StartBot { status, .. } = self {
            *status
        } else {
            None
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::AlreadyStarted | Self::BotNotReady { .. })
    }

    /// The error-response message a request was settled with, for timeout
    /// and bot-rejected requests.
    pub fn response(&self) -> Option<&Message> {
        match self {
            Self::Timeout(msg) | Self::ErrorResponse(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageType;
    use serde_json::json;

    #[test]
    fn timeout_is_distinguishable_by_payload() {
        let request = Message::client_message("ping", None);
        let err = RtviError::Timeout(Box::new(Message::request_timed_out(&request)));
        assert_eq!(err.kind(), "timeout");
        let response = err.response().unwrap();
        assert_eq!(response.error_text(), Some("Timed out waiting for response"));
        assert!(err.to_string().contains(request.id().as_str()));
    }

    #[test]
    fn error_response_display_includes_bot_text() {
        let msg = Message::new(MessageType::ErrorResponse, json!({"error": "no such action"}));
        let err = RtviError::ErrorResponse(Box::new(msg));
        assert!(err.to_string().contains("no such action"), "got: {err}");
    }

    #[test]
    fn status_only_for_start_bot() {
        let err = RtviError::StartBot {
            message: "bad gateway".into(),
            status: Some(502),
        };
        assert_eq!(err.status(), Some(502));
        assert_eq!(RtviError::Cancelled.status(), None);
    }

    #[test]
    fn precondition_classification() {
        assert!(RtviError::AlreadyStarted.is_precondition());
        assert!(
            RtviError::BotNotReady {
                state: TransportState::Connecting
            }
            .is_precondition()
        );
        assert!(!RtviError::SessionDisconnected.is_precondition());
    }

    #[test]
    fn bot_not_ready_names_state() {
        let err = RtviError::BotNotReady {
            state: TransportState::Connected,
        };
        assert!(err.to_string().contains("state: connected"));
    }

    #[test]
    fn unsupported_feature_messages() {
        assert_eq!(
            RtviError::unsupported("screenShare", Some("StubTransport")).to_string(),
            "StubTransport does not support screenShare"
        );
        assert_eq!(
            RtviError::unsupported("screenShare", None).to_string(),
            "screenShare not supported"
        );
        let detailed = RtviError::UnsupportedFeature {
            feature: "video".into(),
            transport: None,
            detail: Some("no camera".into()),
        };
        assert_eq!(detailed.to_string(), "video not supported: no camera");
    }
}
