//! Media descriptors reported by the transport.
//!
//! The client never inspects these beyond passing them through to
//! application code, so they stay plain data.

use serde::{Deserialize, Serialize};

/// A remote or local participant of the session.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub local: bool,
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaDeviceKind {
    AudioInput,
    AudioOutput,
    VideoInput,
}

/// One enumerated input or output device.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    #[serde(default)]
    pub group_id: String,
    pub kind: MediaDeviceKind,
    #[serde(default)]
    pub label: String,
}

#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// Opaque handle to a media track owned by the transport.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// Local tracks, including screen capture.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct LocalTracks {
    pub audio: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
    pub screen_audio: Option<MediaTrack>,
    pub screen_video: Option<MediaTrack>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct BotTracks {
    pub audio: Option<MediaTrack>,
    pub video: Option<MediaTrack>,
}

/// Snapshot of every track known to the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Tracks {
    pub local: LocalTracks,
    pub bot: Option<BotTracks>,
}
