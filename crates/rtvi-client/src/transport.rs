//! The boundary between the client and a concrete media transport.
//!
//! A transport owns the physical connection and the session state. It talks
//! back to the client only through the [`TransportSink`] handed to it in
//! [`Transport::initialize`].

use std::fmt;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use rtvi_core::media::{MediaDeviceInfo, Tracks};
use rtvi_core::{Event, Message, RtviError, TransportState};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::ClientInner;

/// Local media flags passed to the transport at initialisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransportOptions {
    /// Microphone enabled on join.
    pub enable_mic: bool,
    /// Camera enabled on join.
    pub enable_cam: bool,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            enable_mic: true,
            enable_cam: false,
        }
    }
}

/// Capability set the client needs from a transport.
///
/// Lifecycle methods (`initialize`, `init_devices`, `connect`, `disconnect`,
/// `send_ready_message`) are driven exclusively by the client; applications
/// reach the rest through [`TransportHandle`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Short name used in logs and capability errors.
    fn name(&self) -> &str {
        "transport"
    }

    /// Wire the transport to its client. Called once, at client construction.
    fn initialize(&self, options: &TransportOptions, sink: TransportSink);

    async fn init_devices(&self) -> Result<(), RtviError>;

    /// Establish the session using already-resolved parameters.
    async fn connect(&self, params: Option<Value>) -> Result<(), RtviError>;

    async fn disconnect(&self) -> Result<(), RtviError>;

    /// Deliver the `client-ready` handshake once the bot can receive it.
    async fn send_ready_message(&self, message: Message) -> Result<(), RtviError>;

    /// Fire-and-forget send. Must not block.
    fn send_message(&self, message: &Message) -> Result<(), RtviError>;

    fn state(&self) -> TransportState;

    // ── Devices ─────────────────────────────────────────────────────

    async fn get_all_mics(&self) -> Result<Vec<MediaDeviceInfo>, RtviError>;
    async fn get_all_cams(&self) -> Result<Vec<MediaDeviceInfo>, RtviError>;
    async fn get_all_speakers(&self) -> Result<Vec<MediaDeviceInfo>, RtviError>;

    fn update_mic(&self, device_id: &str);
    fn update_cam(&self, device_id: &str);
    fn update_speaker(&self, device_id: &str);

    fn selected_mic(&self) -> Option<MediaDeviceInfo>;
    fn selected_cam(&self) -> Option<MediaDeviceInfo>;
    fn selected_speaker(&self) -> Option<MediaDeviceInfo>;

    fn enable_mic(&self, enable: bool);
    fn enable_cam(&self, enable: bool);

    fn enable_screen_share(&self, _enable: bool) -> Result<(), RtviError> {
        Err(RtviError::unsupported("screenShare", Some(self.name())))
    }

    fn is_mic_enabled(&self) -> bool;
    fn is_cam_enabled(&self) -> bool;

    fn is_sharing_screen(&self) -> bool {
        false
    }

    fn tracks(&self) -> Tracks;
}

/// The transport's channel back into the client.
///
/// Holds the client weakly: once the client is dropped, reports are
/// discarded.
#[derive(Clone)]
pub struct TransportSink {
    client: Weak<ClientInner>,
}

impl TransportSink {
    pub(crate) fn new(client: Weak<ClientInner>) -> Self {
        Self { client }
    }

    /// A sink attached to no client; every report is dropped.
    pub fn detached() -> Self {
        Self { client: Weak::new() }
    }

    pub fn is_attached(&self) -> bool {
        self.client.strong_count() > 0
    }

    /// Route one inbound protocol message. Delivery order is the call order.
    pub fn on_message(&self, message: Message) {
        match self.client.upgrade() {
            Some(client) => client.handle_message(message),
            None => debug!(msg_id = %message.id(), "client gone, dropping inbound message"),
        }
    }

    /// Parse and route a raw JSON envelope. Malformed input is logged and
    /// dropped.
    pub fn on_raw_message(&self, raw: &str) {
        match Message::from_json(raw) {
            Ok(message) => self.on_message(message),
            Err(e) => warn!(error = %e, "dropping malformed inbound message"),
        }
    }

    /// Report a transport-originated event (participants, tracks, devices).
    pub fn emit(&self, event: &Event) {
        if let Some(client) = self.client.upgrade() {
            client.emit(event);
        }
    }

    /// Report a state transition.
    pub fn state_changed(&self, state: TransportState) {
        debug!(%state, "transport state changed");
        self.emit(&Event::TransportStateChanged { state });
    }
}

impl fmt::Debug for TransportSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportSink")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Application-facing view of the transport.
///
/// Exposes everything except the lifecycle methods, which only the client
/// may call.
#[derive(Clone)]
pub struct TransportHandle {
    inner: Arc<dyn Transport>,
}

impl TransportHandle {
    pub(crate) fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn state(&self) -> TransportState {
        self.inner.state()
    }

    pub fn send_message(&self, message: &Message) -> Result<(), RtviError> {
        self.inner.send_message(message)
    }

    pub async fn get_all_mics(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        self.inner.get_all_mics().await
    }

    pub async fn get_all_cams(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        self.inner.get_all_cams().await
    }

    pub async fn get_all_speakers(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        self.inner.get_all_speakers().await
    }

    pub fn update_mic(&self, device_id: &str) {
        self.inner.update_mic(device_id);
    }

    pub fn update_cam(&self, device_id: &str) {
        self.inner.update_cam(device_id);
    }

    pub fn update_speaker(&self, device_id: &str) {
        self.inner.update_speaker(device_id);
    }

    pub fn selected_mic(&self) -> Option<MediaDeviceInfo> {
        self.inner.selected_mic()
    }

    pub fn selected_cam(&self) -> Option<MediaDeviceInfo> {
        self.inner.selected_cam()
    }

    pub fn selected_speaker(&self) -> Option<MediaDeviceInfo> {
        self.inner.selected_speaker()
    }

    pub fn enable_mic(&self, enable: bool) {
        self.inner.enable_mic(enable);
    }

    pub fn enable_cam(&self, enable: bool) {
        self.inner.enable_cam(enable);
    }

    pub fn enable_screen_share(&self, enable: bool) -> Result<(), RtviError> {
        self.inner.enable_screen_share(enable)
    }

    pub fn is_mic_enabled(&self) -> bool {
        self.inner.is_mic_enabled()
    }

    pub fn is_cam_enabled(&self) -> bool {
        self.inner.is_cam_enabled()
    }

    pub fn is_sharing_screen(&self) -> bool {
        self.inner.is_sharing_screen()
    }

    pub fn tracks(&self) -> Tracks {
        self.inner.tracks()
    }
}

impl fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportHandle")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_sink_drops_everything() {
        let sink = TransportSink::detached();
        assert!(!sink.is_attached());
        sink.on_message(Message::disconnect_bot());
        sink.on_raw_message("{not json");
        sink.state_changed(TransportState::Ready);
    }

    #[test]
    fn default_options() {
        let opts = TransportOptions::default();
        assert!(opts.enable_mic);
        assert!(!opts.enable_cam);
    }
}
