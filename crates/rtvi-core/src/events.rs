use serde_json::Value;

use crate::errors::RtviError;
use crate::media::{MediaDeviceInfo, MediaTrack, Participant};
use crate::messages::Message;
use crate::payloads::{
    BotLlmSearchResponseData, BotReadyData, LlmFunctionCallData, PipecatMetricsData, TextData,
    TranscriptData,
};
use crate::state::TransportState;

// ─────────────────────────────────────────────────────────────────────────────
// rtvi_events! macro: generates Event, EventKind, kind(), and the name table
// ─────────────────────────────────────────────────────────────────────────────

/// Generates [`Event`], the payload-free [`EventKind`] tag, and the
/// event-name strings applications subscribe with.
///
/// Adding an event is one edit inside the invocation below.
macro_rules! rtvi_events {
    ($(
        $(#[doc = $doc:literal])*
        $variant:ident $({ $($field:ident : $ty:ty),* $(,)? })? => $name:literal
    ),* $(,)?) => {
        /// Application-visible event, delivered through the constructor
        /// callback table and then to every registered listener.
        #[derive(Clone, Debug)]
        #[allow(missing_docs)]
        pub enum Event {
            $(
                $(#[doc = $doc])*
                $variant $({ $($field: $ty),* })?,
            )*
        }

        /// Payload-free tag of an [`Event`], used as the subscription key.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[allow(missing_docs)]
        pub enum EventKind {
            $($variant,)*
        }

        impl EventKind {
            /// Every event tag, in catalog order.
            pub const ALL: &'static [EventKind] = &[$(Self::$variant,)*];

            /// Event name as exposed to applications.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        impl Event {
            pub fn kind(&self) -> EventKind {
                match self {
                    $(Self::$variant { .. } => EventKind::$variant,)*
                }
            }
        }
    };
}

rtvi_events! {
    // -- Session lifecycle --

    /// Transport connected to the session.
    Connected => "connected",
    Disconnected => "disconnected",
    TransportStateChanged { state: TransportState } => "transportStateChanged",

    // -- Bot lifecycle --

    BotConnected { participant: Participant } => "botConnected",
    /// Bot completed the handshake; the session is usable.
    BotReady { data: BotReadyData } => "botReady",
    BotDisconnected { participant: Participant } => "botDisconnected",
    /// Bot reported an error; `fatal` errors also tear down the session.
    Error { message: Message } => "error",

    // -- Messaging --

    ServerMessage { data: Value } => "serverMessage",
    /// A request was answered with `error-response`.
    MessageError { message: Message } => "messageError",
    Metrics { data: PipecatMetricsData } => "metrics",

    // -- Turn taking --

    BotStartedSpeaking => "botStartedSpeaking",
    BotStoppedSpeaking => "botStoppedSpeaking",
    UserStartedSpeaking => "userStartedSpeaking",
    UserStoppedSpeaking => "userStoppedSpeaking",

    // -- Transcription and text streaming --

    UserTranscript { data: TranscriptData } => "userTranscript",
    BotTranscript { data: TextData } => "botTranscript",
    UserLlmText { data: TextData } => "userLlmText",
    BotLlmText { data: TextData } => "botLlmText",
    BotLlmStarted => "botLlmStarted",
    BotLlmStopped => "botLlmStopped",
    BotTtsText { data: TextData } => "botTtsText",
    BotTtsStarted => "botTtsStarted",
    BotTtsStopped => "botTtsStopped",
    BotLlmSearchResponse { data: BotLlmSearchResponseData } => "botLlmSearchResponse",

    // -- Function calls --

    /// Emitted for every inbound function call, handled or not.
    LlmFunctionCall { data: LlmFunctionCallData } => "llmFunctionCall",

    // -- Participants and media --

    ParticipantConnected { participant: Participant } => "participantConnected",
    ParticipantLeft { participant: Participant } => "participantLeft",
    TrackStarted { track: MediaTrack, participant: Option<Participant> } => "trackStarted",
    TrackStopped { track: MediaTrack, participant: Option<Participant> } => "trackStopped",
    ScreenTrackStarted { track: MediaTrack, participant: Option<Participant> } => "screenTrackStarted",
    ScreenTrackStopped { track: MediaTrack, participant: Option<Participant> } => "screenTrackStopped",
    ScreenShareError { message: String } => "screenShareError",
    LocalAudioLevel { level: f32 } => "localAudioLevel",
    RemoteAudioLevel { level: f32, participant: Participant } => "remoteAudioLevel",

    // -- Devices --

    AvailableCamsUpdated { cams: Vec<MediaDeviceInfo> } => "availableCamsUpdated",
    AvailableMicsUpdated { mics: Vec<MediaDeviceInfo> } => "availableMicsUpdated",
    AvailableSpeakersUpdated { speakers: Vec<MediaDeviceInfo> } => "availableSpeakersUpdated",
    CamUpdated { cam: MediaDeviceInfo } => "camUpdated",
    MicUpdated { mic: MediaDeviceInfo } => "micUpdated",
    SpeakerUpdated { speaker: MediaDeviceInfo } => "speakerUpdated",
    DeviceError { error: RtviError } => "deviceError",
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_round_trip() {
        let mut seen = HashSet::new();
        for kind in EventKind::ALL {
            assert!(seen.insert(kind.as_str()), "duplicate name {kind}");
            assert_eq!(EventKind::from_name(kind.as_str()), Some(*kind));
        }
        assert_eq!(EventKind::from_name("notAnEvent"), None);
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Event::BotTtsStarted.kind(), EventKind::BotTtsStarted);
        let ev = Event::TransportStateChanged {
            state: TransportState::Ready,
        };
        assert_eq!(ev.kind(), EventKind::TransportStateChanged);
        assert_eq!(ev.kind().as_str(), "transportStateChanged");
    }

    #[test]
    fn catalog_covers_every_inbound_notification() {
        for name in [
            "botReady", "error", "metrics", "serverMessage", "messageError",
            "userTranscript", "botTranscript", "userLlmText", "botLlmText",
            "botLlmStarted", "botLlmStopped", "llmFunctionCall", "botLlmSearchResponse",
            "botTtsText", "botTtsStarted", "botTtsStopped", "userStartedSpeaking",
            "userStoppedSpeaking", "botStartedSpeaking", "botStoppedSpeaking",
        ] {
            assert!(EventKind::from_name(name).is_some(), "missing {name}");
        }
    }
}
