//! Settings type definitions.
//!
//! JSON field names are camelCase. Every struct is `#[serde(default)]`, so a
//! settings file only needs the keys it changes.

use rtvi_core::payloads::AboutClientData;
use serde::{Deserialize, Serialize};

/// Root settings for an RTVI client.
///
/// ```json
/// {
///   "dispatcher": { "requestTimeoutMs": 5000 },
///   "media": { "enableCam": true },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientSettings {
    /// Request/response timing.
    pub dispatcher: DispatcherSettings,
    /// Which local devices start enabled.
    pub media: MediaSettings,
    /// Credential-fetch defaults.
    pub credentials: CredentialSettings,
    /// Log level and format.
    pub logging: LoggingSettings,
    /// Overrides merged into the handshake's about-client descriptor.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<AboutClientData>,
}

/// Dispatcher timing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatcherSettings {
    /// Default time a request may stay pending.
    pub request_timeout_ms: u64,
    /// Period of the expiry sweep.
    pub gc_interval_ms: u64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            gc_interval_ms: 2_000,
        }
    }
}

/// Local media defaults passed to the transport at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaSettings {
    /// Microphone enabled on join.
    pub enable_mic: bool,
    /// Camera enabled on join.
    pub enable_cam: bool,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            enable_mic: true,
            enable_cam: false,
        }
    }
}

/// Credential-fetch defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialSettings {
    /// Applied when an endpoint descriptor carries no timeout of its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level directive (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
