use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of the transport session.
///
/// Owned and advanced by the transport; the client only observes and
/// re-broadcasts it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum TransportState {
    #[default]
    Disconnected,
    Initializing,
    Initialized,
    Authenticating,
    Authenticated,
    Connecting,
    Connected,
    Ready,
    Disconnecting,
    Error,
}

impl TransportState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Ready => "ready",
            Self::Disconnecting => "disconnecting",
            Self::Error => "error",
        }
    }

    /// States in which a new connect attempt is refused.
    pub fn is_connecting_or_connected(self) -> bool {
        matches!(
            self,
            Self::Authenticating | Self::Connecting | Self::Connected | Self::Ready
        )
    }

    /// `connected` or `ready`.
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected | Self::Ready)
    }

    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(
            serde_json::to_string(&TransportState::Authenticating).unwrap(),
            "\"authenticating\""
        );
        let parsed: TransportState = serde_json::from_str("\"ready\"").unwrap();
        assert_eq!(parsed, TransportState::Ready);
    }

    #[test]
    fn display_matches_serde() {
        for state in [
            TransportState::Disconnected,
            TransportState::Initializing,
            TransportState::Initialized,
            TransportState::Authenticating,
            TransportState::Authenticated,
            TransportState::Connecting,
            TransportState::Connected,
            TransportState::Ready,
            TransportState::Disconnecting,
            TransportState::Error,
        ] {
            assert_eq!(
                serde_json::to_string(&state).unwrap(),
                format!("\"{state}\"")
            );
        }
    }

    #[test]
    fn busy_states_block_connect() {
        assert!(TransportState::Connecting.is_connecting_or_connected());
        assert!(TransportState::Ready.is_connecting_or_connected());
        assert!(!TransportState::Disconnected.is_connecting_or_connected());
        assert!(!TransportState::Initialized.is_connecting_or_connected());
        assert!(!TransportState::Error.is_connecting_or_connected());
    }

    #[test]
    fn default_is_disconnected() {
        assert_eq!(TransportState::default(), TransportState::Disconnected);
    }
}
