//! Scripted in-process transport for deterministic testing without a media
//! server.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rtvi_core::media::{MediaDeviceInfo, MediaDeviceKind, Tracks};
use rtvi_core::{Event, Message, MessageType, RtviError, TransportState};
use serde_json::{Value, json};

use crate::transport::{Transport, TransportOptions, TransportSink};

/// Produces an optional inbound reply for each outbound message.
pub type Responder = Arc<dyn Fn(&Message) -> Option<Message> + Send + Sync>;

/// Transport that walks the usual state sequence, records everything the
/// client sends, and answers `client-ready` with `bot-ready`.
pub struct StubTransport {
    state: Mutex<TransportState>,
    sink: Mutex<TransportSink>,
    options: Mutex<TransportOptions>,
    sent: Mutex<Vec<Message>>,
    connect_params: Mutex<Vec<Option<Value>>>,
    responder: Option<Responder>,
    step_delay: Duration,
    bot_version: String,
    auto_ready: bool,
    connect_error: Option<RtviError>,
    fail_sends: AtomicBool,
    devices: Vec<MediaDeviceInfo>,
    selected: Mutex<Selected>,
    mic_enabled: AtomicBool,
    cam_enabled: AtomicBool,
    init_devices_count: AtomicUsize,
    connect_count: AtomicUsize,
    disconnect_count: AtomicUsize,
}

#[derive(Default)]
struct Selected {
    mic: Option<MediaDeviceInfo>,
    cam: Option<MediaDeviceInfo>,
    speaker: Option<MediaDeviceInfo>,
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TransportState::Disconnected),
            sink: Mutex::new(TransportSink::detached()),
            options: Mutex::new(TransportOptions::default()),
            sent: Mutex::new(Vec::new()),
            connect_params: Mutex::new(Vec::new()),
            responder: None,
            step_delay: Duration::ZERO,
            bot_version: "1.0.0".to_string(),
            auto_ready: true,
            connect_error: None,
            fail_sends: AtomicBool::new(false),
            devices: default_devices(),
            selected: Mutex::new(Selected::default()),
            mic_enabled: AtomicBool::new(true),
            cam_enabled: AtomicBool::new(false),
            init_devices_count: AtomicUsize::new(0),
            connect_count: AtomicUsize::new(0),
            disconnect_count: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every lifecycle step.
    #[must_use]
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Version reported in the scripted `bot-ready`.
    #[must_use]
    pub fn with_bot_version(mut self, version: impl Into<String>) -> Self {
        self.bot_version = version.into();
        self
    }

    /// Do not answer `client-ready`; the test delivers `bot-ready` itself.
    #[must_use]
    pub fn without_auto_ready(mut self) -> Self {
        self.auto_ready = false;
        self
    }

    /// Fail every `connect` with `error`.
    #[must_use]
    pub fn with_connect_error(mut self, error: RtviError) -> Self {
        self.connect_error = Some(error);
        self
    }

    /// Answer outbound messages. Replies are delivered inline, before
    /// `send_message` returns.
    #[must_use]
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&Message) -> Option<Message> + Send + Sync + 'static,
    {
        self.responder = Some(Arc::new(responder));
        self
    }

    /// Make subsequent `send_message` calls fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// Deliver an inbound message as if it came from the bot.
    pub fn receive(&self, message: Message) {
        let sink = self.sink.lock().clone();
        sink.on_message(message);
    }

    /// Deliver a raw JSON envelope.
    pub fn receive_raw(&self, raw: &str) {
        let sink = self.sink.lock().clone();
        sink.on_raw_message(raw);
    }

    /// Report a transport-originated event.
    pub fn emit(&self, event: &Event) {
        let sink = self.sink.lock().clone();
        sink.emit(event);
    }

    /// Force a state transition, notifying the client.
    pub fn set_state(&self, state: TransportState) {
        *self.state.lock() = state;
        let sink = self.sink.lock().clone();
        sink.state_changed(state);
    }

    /// Everything sent through `send_message`, oldest first.
    pub fn sent_messages(&self) -> Vec<Message> {
        self.sent.lock().clone()
    }

    pub fn sent_of_type(&self, msg_type: &MessageType) -> Vec<Message> {
        self.sent
            .lock()
            .iter()
            .filter(|m| m.msg_type() == msg_type)
            .cloned()
            .collect()
    }

    pub fn connect_params(&self) -> Vec<Option<Value>> {
        self.connect_params.lock().clone()
    }

    pub fn options(&self) -> TransportOptions {
        *self.options.lock()
    }

    pub fn init_devices_count(&self) -> usize {
        self.init_devices_count.load(Ordering::Relaxed)
    }

    pub fn connect_count(&self) -> usize {
        self.connect_count.load(Ordering::Relaxed)
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_count.load(Ordering::Relaxed)
    }

    async fn step(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }

    fn find_device(&self, kind: MediaDeviceKind, device_id: &str) -> Option<MediaDeviceInfo> {
        self.devices
            .iter()
            .find(|d| d.kind == kind && d.device_id == device_id)
            .cloned()
    }

    fn devices_of(&self, kind: MediaDeviceKind) -> Vec<MediaDeviceInfo> {
        self.devices.iter().filter(|d| d.kind == kind).cloned().collect()
    }
}

#[async_trait]
impl Transport for StubTransport {
    fn name(&self) -> &str {
        "stub"
    }

    fn initialize(&self, options: &TransportOptions, sink: TransportSink) {
        *self.options.lock() = *options;
        self.mic_enabled.store(options.enable_mic, Ordering::Relaxed);
        self.cam_enabled.store(options.enable_cam, Ordering::Relaxed);
        *self.sink.lock() = sink;
    }

    async fn init_devices(&self) -> Result<(), RtviError> {
        let _ = self.init_devices_count.fetch_add(1, Ordering::Relaxed);
        self.set_state(TransportState::Initializing);
        self.step().await;
        self.set_state(TransportState::Initialized);
        Ok(())
    }

    async fn connect(&self, params: Option<Value>) -> Result<(), RtviError> {
        let _ = self.connect_count.fetch_add(1, Ordering::Relaxed);
        self.connect_params.lock().push(params);
        self.set_state(TransportState::Connecting);
        self.step().await;
        if let Some(error) = &self.connect_error {
            self.set_state(TransportState::Error);
            return Err(error.clone());
        }
        self.set_state(TransportState::Connected);
        self.emit(&Event::Connected);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), RtviError> {
        let _ = self.disconnect_count.fetch_add(1, Ordering::Relaxed);
        self.set_state(TransportState::Disconnecting);
        self.step().await;
        self.set_state(TransportState::Disconnected);
        self.emit(&Event::Disconnected);
        Ok(())
    }

    async fn send_ready_message(&self, message: Message) -> Result<(), RtviError> {
        self.sent.lock().push(message);
        self.set_state(TransportState::Ready);
        if self.auto_ready {
            self.receive(Message::new(
                MessageType::BotReady,
                json!({"version": self.bot_version}),
            ));
        }
        Ok(())
    }

    fn send_message(&self, message: &Message) -> Result<(), RtviError> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(RtviError::Transport("stub send failure".to_string()));
        }
        self.sent.lock().push(message.clone());
        if let Some(reply) = self.responder.as_ref().and_then(|r| r(message)) {
            self.receive(reply);
        }
        Ok(())
    }

    fn state(&self) -> TransportState {
        *self.state.lock()
    }

    async fn get_all_mics(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        Ok(self.devices_of(MediaDeviceKind::AudioInput))
    }

    async fn get_all_cams(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        Ok(self.devices_of(MediaDeviceKind::VideoInput))
    }

    async fn get_all_speakers(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        Ok(self.devices_of(MediaDeviceKind::AudioOutput))
    }

    fn update_mic(&self, device_id: &str) {
        if let Some(mic) = self.find_device(MediaDeviceKind::AudioInput, device_id) {
            self.selected.lock().mic = Some(mic.clone());
            self.emit(&Event::MicUpdated { mic });
        }
    }

    fn update_cam(&self, device_id: &str) {
        if let Some(cam) = self.find_device(MediaDeviceKind::VideoInput, device_id) {
            self.selected.lock().cam = Some(cam.clone());
            self.emit(&Event::CamUpdated { cam });
        }
    }

    fn update_speaker(&self, device_id: &str) {
        if let Some(speaker) = self.find_device(MediaDeviceKind::AudioOutput, device_id) {
            self.selected.lock().speaker = Some(speaker.clone());
            self.emit(&Event::SpeakerUpdated { speaker });
        }
    }

    fn selected_mic(&self) -> Option<MediaDeviceInfo> {
        self.selected.lock().mic.clone()
    }

    fn selected_cam(&self) -> Option<MediaDeviceInfo> {
        self.selected.lock().cam.clone()
    }

    fn selected_speaker(&self) -> Option<MediaDeviceInfo> {
        self.selected.lock().speaker.clone()
    }

    fn enable_mic(&self, enable: bool) {
        self.mic_enabled.store(enable, Ordering::Relaxed);
    }

    fn enable_cam(&self, enable: bool) {
        self.cam_enabled.store(enable, Ordering::Relaxed);
    }

    fn is_mic_enabled(&self) -> bool {
        self.mic_enabled.load(Ordering::Relaxed)
    }

    fn is_cam_enabled(&self) -> bool {
        self.cam_enabled.load(Ordering::Relaxed)
    }

    fn tracks(&self) -> Tracks {
        Tracks::default()
    }
}

fn default_devices() -> Vec<MediaDeviceInfo> {
    let device = |id: &str, kind, label: &str| MediaDeviceInfo {
        device_id: id.to_string(),
        group_id: String::new(),
        kind,
        label: label.to_string(),
    };
    vec![
        device("mic-1", MediaDeviceKind::AudioInput, "Built-in Microphone"),
        device("mic-2", MediaDeviceKind::AudioInput, "USB Headset"),
        device("cam-1", MediaDeviceKind::VideoInput, "Built-in Camera"),
        device("spk-1", MediaDeviceKind::AudioOutput, "Built-in Speakers"),
    ]
}
