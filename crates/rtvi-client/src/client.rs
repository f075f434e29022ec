//! The session controller.
//!
//! [`RtviClient`] owns the transport lifecycle and the request dispatcher,
//! routes every inbound protocol message to exactly one handler, and fans
//! the resulting events out through the [`EventHub`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use rtvi_core::media::{MediaDeviceInfo, Tracks};
use rtvi_core::payloads::{
    AboutClientData, AppendToContextResultData, BotLlmSearchResponseData, BotReadyData,
    LlmContextMessage, LlmFunctionCallData, LlmFunctionCallResultResponse, PipecatMetricsData,
    ServerResponseData, TextData, TranscriptData,
};
use rtvi_core::{Event, EventKind, Message, MessageType, RtviError, TransportState};
use rtvi_settings::ClientSettings;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::about::{LIBRARY_VERSION, default_about, merge_about};
use crate::credentials::{ConnectParams, fetch_connection_params};
use crate::dispatcher::{DEFAULT_GC_INTERVAL, DEFAULT_REQUEST_TIMEOUT, MessageDispatcher, SendFn};
use crate::function_calls::{self, FunctionCallParams, FunctionCallRegistry};
use crate::hub::{EventHub, ListenerId, RtviClientCallbacks};
use crate::transport::{Transport, TransportHandle, TransportOptions, TransportSink};

/// Construction options for [`RtviClient`].
pub struct RtviClientOptions {
    transport: Arc<dyn Transport>,
    callbacks: RtviClientCallbacks,
    transport_options: TransportOptions,
    request_timeout: Duration,
    gc_interval: Duration,
    credentials_timeout: Option<Duration>,
    about: AboutClientData,
    http: Option<reqwest::Client>,
}

impl RtviClientOptions {
    /// Defaults for everything but the transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            callbacks: RtviClientCallbacks::new(),
            transport_options: TransportOptions::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            gc_interval: DEFAULT_GC_INTERVAL,
            credentials_timeout: None,
            about: default_about(),
            http: None,
        }
    }

    /// Seed timings, media flags and the about-client descriptor from
    /// loaded settings.
    pub fn from_settings(transport: Arc<dyn Transport>, settings: &ClientSettings) -> Self {
        let mut options = Self::new(transport)
            .enable_mic(settings.media.enable_mic)
            .enable_cam(settings.media.enable_cam)
            .request_timeout(Duration::from_millis(settings.dispatcher.request_timeout_ms))
            .gc_interval(Duration::from_millis(settings.dispatcher.gc_interval_ms));
        options.credentials_timeout = settings.credentials.timeout_ms.map(Duration::from_millis);
        if let Some(about) = &settings.about {
            options = options.about(about);
        }
        options
    }

    /// Constructor callbacks, run before listeners.
    #[must_use]
    pub fn callbacks(mut self, callbacks: RtviClientCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Open the mic when devices initialize.
    #[must_use]
    pub fn enable_mic(mut self, enable: bool) -> Self {
        self.transport_options.enable_mic = enable;
        self
    }

    /// Open the camera when devices initialize.
    #[must_use]
    pub fn enable_cam(mut self, enable: bool) -> Self {
        self.transport_options.enable_cam = enable;
        self
    }

    /// Default timeout for correlated requests.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// How often expired requests are swept.
    #[must_use]
    pub fn gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = interval;
        self
    }

    /// Cap on the connection-params fetch.
    #[must_use]
    pub fn credentials_timeout(mut self, timeout: Duration) -> Self {
        self.credentials_timeout = Some(timeout);
        self
    }

    /// Merge `about` into the handshake descriptor.
    #[must_use]
    pub fn about(mut self, about: &AboutClientData) -> Self {
        self.about = merge_about(&self.about, about);
        self
    }

    /// HTTP client used for credential fetches.
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }
}

/// Client facade for one bot session.
///
/// Cheap to clone; clones share the session.
#[derive(Clone)]
pub struct RtviClient {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    transport: Arc<dyn Transport>,
    dispatcher: MessageDispatcher,
    hub: EventHub,
    functions: FunctionCallRegistry,
    about: RwLock<AboutClientData>,
    ready_tx: Mutex<Option<oneshot::Sender<BotReadyData>>>,
    connect_cancel: Mutex<Option<CancellationToken>>,
    http: reqwest::Client,
    credentials_timeout: Option<Duration>,
}

impl RtviClient {
    /// Build a client and attach it to the transport. No I/O happens here.
    pub fn new(options: RtviClientOptions) -> Self {
        let transport = options.transport;
        let sender = Arc::clone(&transport);
        let send: SendFn = Arc::new(move |message: &Message| sender.send_message(message));

        let inner = Arc::new(ClientInner {
            transport,
            dispatcher: MessageDispatcher::with_timing(
                send,
                options.request_timeout,
                options.gc_interval,
            ),
            hub: EventHub::new(options.callbacks),
            functions: FunctionCallRegistry::new(),
            about: RwLock::new(options.about),
            ready_tx: Mutex::new(None),
            connect_cancel: Mutex::new(None),
            http: options.http.unwrap_or_default(),
            credentials_timeout: options.credentials_timeout,
        });

        inner.transport.initialize(
            &options.transport_options,
            TransportSink::new(Arc::downgrade(&inner)),
        );
        debug!(transport = inner.transport.name(), "client initialized");

        Self { inner }
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// Connect and wait for the bot to report ready.
    ///
    /// Fails with [`RtviError::AlreadyStarted`] before touching the transport
    /// if a session is already authenticating, connecting or up. Any failure
    /// while establishing the session tears it down again before the error
    /// is returned, except a credential fetch cancelled by [`Self::disconnect`],
    /// which already tears down. There is no built-in timeout on the ready wait.
    pub async fn connect(&self, params: Option<ConnectParams>) -> Result<BotReadyData, RtviError> {
        let state = self.inner.transport.state();
        if state.is_connecting_or_connected() {
            return Err(RtviError::AlreadyStarted);
        }

        let (tx, rx) = oneshot::channel();
        *self.inner.ready_tx.lock() = Some(tx);
        info!(%state, transport = self.inner.transport.name(), "connecting");

        if let Err(e) = self.inner.establish(params).await {
            error!(error = %e, kind = e.kind(), "connect failed");
            // A cancelled fetch means a disconnect is already under way.
            if !matches!(e, RtviError::Cancelled) {
                if let Err(cleanup) = self.inner.disconnect().await {
                    warn!(error = %cleanup, "disconnect after failed connect also failed");
                }
            }
            return Err(e);
        }

        let ready = rx.await.map_err(|_| RtviError::SessionDisconnected)?;
        info!(version = %ready.version, "bot ready");
        Ok(ready)
    }

    /// Tear the session down. Safe to call when never connected.
    ///
    /// Pending requests fail with [`RtviError::SessionDisconnected`].
    pub async fn disconnect(&self) -> Result<(), RtviError> {
        self.inner.disconnect().await
    }

    /// Ask the bot to leave while keeping the transport session open.
    pub fn disconnect_bot(&self) -> Result<(), RtviError> {
        self.inner.ensure_ready()?;
        self.inner.transport.send_message(&Message::disconnect_bot())
    }

    // ── Messaging ───────────────────────────────────────────────────

    /// Fire-and-forget `client-message` with payload `{t, d}`.
    pub fn send_client_message(&self, msg_type: &str, data: Option<Value>) -> Result<(), RtviError> {
        self.inner.ensure_ready()?;
        self.inner
            .transport
            .send_message(&Message::client_message(msg_type, data))
    }

    /// Send a `client-message` and wait for the bot's `server-response`.
    ///
    /// The precondition is checked immediately; the returned future yields
    /// the response's `d` payload (`null` if absent).
    pub fn send_client_request(
        &self,
        msg_type: &str,
        data: Option<Value>,
        timeout: Option<Duration>,
    ) -> Result<impl Future<Output = Result<Value, RtviError>> + Send + 'static, RtviError> {
        self.inner.ensure_ready()?;
        let pending = self
            .inner
            .dispatcher
            .dispatch_message(Message::client_message(msg_type, data), timeout);
        Ok(async move {
            let response = pending.await?;
            Ok(response
                .payload::<ServerResponseData>()
                .ok()
                .and_then(|r| r.d)
                .unwrap_or(Value::Null))
        })
    }

    /// Append a message to the bot's LLM context.
    ///
    /// The returned future yields whether the bot reported success.
    pub fn append_to_context(
        &self,
        context: &LlmContextMessage,
    ) -> Result<impl Future<Output = Result<bool, RtviError>> + Send + 'static, RtviError> {
        self.inner.ensure_ready()?;
        let pending = self
            .inner
            .dispatcher
            .dispatch_message(Message::append_to_context(context), None);
        Ok(async move {
            let response = pending.await?;
            Ok(response
                .payload::<AppendToContextResultData>()
                .is_ok_and(|r| r.is_success()))
        })
    }

    /// Number of requests still waiting for a response.
    pub fn pending_requests(&self) -> usize {
        self.inner.dispatcher.pending_count()
    }

    // ── Function calls ──────────────────────────────────────────────

    /// Handle bot calls to `name`. The handler's `Some` result (other than
    /// `null`) is sent back as `llm-function-call-result`.
    pub fn register_function_call_handler<F, Fut>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(FunctionCallParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Value>> + Send + 'static,
    {
        let name = name.into();
        debug!(function_name = %name, "registering function call handler");
        let _ = self
            .inner
            .functions
            .register(name, function_calls::callback(handler));
    }

    /// Returns whether a handler was registered under `name`.
    pub fn unregister_function_call_handler(&self, name: &str) -> bool {
        self.inner.functions.unregister(name)
    }

    /// Drop every function-call handler.
    pub fn unregister_all_function_call_handlers(&self) {
        self.inner.functions.unregister_all();
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Subscribe to `kind`; listeners run after the constructor callback.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.hub.on(kind, listener)
    }

    /// Remove one listener. Returns whether it existed.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        self.inner.hub.off(kind, id)
    }

    /// Remove listeners for `kind`, or for every kind when `None`.
    pub fn remove_all_listeners(&self, kind: Option<EventKind>) {
        self.inner.hub.remove_all_listeners(kind);
    }

    // ── About ───────────────────────────────────────────────────────

    /// Merge `update` into the descriptor sent with the next handshake.
    pub fn set_about_client(&self, update: &AboutClientData) {
        let mut about = self.inner.about.write();
        let merged = merge_about(&about, update);
        *about = merged;
    }

    /// Descriptor sent in the next `client-ready`.
    pub fn about_client(&self) -> AboutClientData {
        self.inner.about.read().clone()
    }

    // ── Observers ───────────────────────────────────────────────────

    /// Current transport state.
    pub fn state(&self) -> TransportState {
        self.inner.transport.state()
    }

    /// `true` in the `connected` and `ready` states.
    pub fn connected(&self) -> bool {
        self.state().is_connected()
    }

    /// RTVI protocol version this client speaks.
    pub fn version(&self) -> &'static str {
        LIBRARY_VERSION
    }

    /// The transport without its lifecycle methods.
    pub fn transport(&self) -> TransportHandle {
        TransportHandle::new(Arc::clone(&self.inner.transport))
    }

    // ── Devices ─────────────────────────────────────────────────────

    /// Initialize media devices without connecting.
    pub async fn init_devices(&self) -> Result<(), RtviError> {
        debug!("initializing devices");
        self.inner.transport.init_devices().await
    }

    /// Available microphones.
    pub async fn get_all_mics(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        self.inner.transport.get_all_mics().await
    }

    /// Available cameras.
    pub async fn get_all_cams(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        self.inner.transport.get_all_cams().await
    }

    /// Available speakers.
    pub async fn get_all_speakers(&self) -> Result<Vec<MediaDeviceInfo>, RtviError> {
        self.inner.transport.get_all_speakers().await
    }

    /// Switch to the mic with `device_id`.
    pub fn update_mic(&self, device_id: &str) {
        self.inner.transport.update_mic(device_id);
    }

    /// Switch to the camera with `device_id`.
    pub fn update_cam(&self, device_id: &str) {
        self.inner.transport.update_cam(device_id);
    }

    /// Route bot audio to the speaker with `device_id`.
    pub fn update_speaker(&self, device_id: &str) {
        self.inner.transport.update_speaker(device_id);
    }

    /// Mic in use, if one is selected.
    pub fn selected_mic(&self) -> Option<MediaDeviceInfo> {
        self.inner.transport.selected_mic()
    }

    /// Camera in use, if one is selected.
    pub fn selected_cam(&self) -> Option<MediaDeviceInfo> {
        self.inner.transport.selected_cam()
    }

    /// Speaker in use, if one is selected.
    pub fn selected_speaker(&self) -> Option<MediaDeviceInfo> {
        self.inner.transport.selected_speaker()
    }

    /// Mute or unmute the local mic.
    pub fn enable_mic(&self, enable: bool) {
        self.inner.transport.enable_mic(enable);
    }

    /// Turn the local camera on or off.
    pub fn enable_cam(&self, enable: bool) {
        self.inner.transport.enable_cam(enable);
    }

    /// Start or stop screen sharing.
    ///
    /// Transports without it return [`RtviError::UnsupportedFeature`].
    pub fn enable_screen_share(&self, enable: bool) -> Result<(), RtviError> {
        self.inner.transport.enable_screen_share(enable)
    }

    /// Whether the local mic is live.
    pub fn is_mic_enabled(&self) -> bool {
        self.inner.transport.is_mic_enabled()
    }

    /// Whether the local camera is live.
    pub fn is_cam_enabled(&self) -> bool {
        self.inner.transport.is_cam_enabled()
    }

    /// Whether screen sharing is active.
    pub fn is_sharing_screen(&self) -> bool {
        self.inner.transport.is_sharing_screen()
    }

    /// Local and bot media tracks.
    pub fn tracks(&self) -> Tracks {
        self.inner.transport.tracks()
    }
}

impl fmt::Debug for RtviClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RtviClient")
            .field("transport", &self.inner.transport.name())
            .field("state", &self.state())
            .field("pending_requests", &self.pending_requests())
            .finish_non_exhaustive()
    }
}

impl ClientInner {
    fn ensure_ready(&self) -> Result<(), RtviError> {
        let state = self.transport.state();
        if state.is_ready() {
            Ok(())
        } else {
            Err(RtviError::BotNotReady { state })
        }
    }

    /// Steps between the precondition check and the ready wait.
    async fn establish(&self, params: Option<ConnectParams>) -> Result<(), RtviError> {
        if self.transport.state() == TransportState::Disconnected {
            self.transport.init_devices().await?;
        }

        let resolved = match params {
            None => None,
            Some(ConnectParams::Direct(value)) => Some(value),
            Some(ConnectParams::Endpoint(endpoint)) => {
                let token = CancellationToken::new();
                *self.connect_cancel.lock() = Some(token.clone());
                let fetched =
                    fetch_connection_params(&self.http, &endpoint, self.credentials_timeout, &token)
                        .await;
                let _ = self.connect_cancel.lock().take();
                Some(fetched?)
            }
        };

        self.transport.connect(resolved).await?;

        let about = self.about.read().clone();
        self.transport
            .send_ready_message(Message::client_ready(&about))
            .await
    }

    async fn disconnect(&self) -> Result<(), RtviError> {
        let fetch = self.connect_cancel.lock().take();
        if let Some(token) = fetch {
            token.cancel();
        }

        let result = self.transport.disconnect().await;
        self.dispatcher.disconnect();
        let _ = self.ready_tx.lock().take();
        result
    }

    pub(crate) fn emit(&self, event: &Event) {
        self.hub.emit(event);
    }

    fn decode<T: DeserializeOwned>(message: &Message) -> Option<T> {
        match message.payload() {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(msg_id = %message.id(), error = %e, "dropping message with bad payload");
                None
            }
        }
    }

    /// Route one inbound message. Never blocks and never fails.
    pub(crate) fn handle_message(self: &Arc<Self>, message: Message) {
        debug!(msg_id = %message.id(), msg_type = %message.msg_type(), "inbound message");

        let msg_type = message.msg_type().clone();
        match msg_type {
            // Lifecycle
            MessageType::BotReady => self.on_bot_ready(&message),
            MessageType::Error => self.on_error(message),

            // Request correlation
            MessageType::ServerResponse => {
                let _ = self.dispatcher.resolve(message);
            }
            MessageType::ErrorResponse => {
                let settled = self.dispatcher.reject(message);
                self.emit(&Event::MessageError { message: settled });
            }

            // Turn taking
            MessageType::UserStartedSpeaking => self.emit(&Event::UserStartedSpeaking),
            MessageType::UserStoppedSpeaking => self.emit(&Event::UserStoppedSpeaking),
            MessageType::BotStartedSpeaking => self.emit(&Event::BotStartedSpeaking),
            MessageType::BotStoppedSpeaking => self.emit(&Event::BotStoppedSpeaking),

            // Transcripts and text streams
            MessageType::UserTranscription => {
                if let Some(data) = Self::decode::<TranscriptData>(&message) {
                    self.emit(&Event::UserTranscript { data });
                }
            }
            MessageType::BotTranscription => {
                if let Some(data) = Self::decode::<TextData>(&message) {
                    self.emit(&Event::BotTranscript { data });
                }
            }
            MessageType::UserLlmText => {
                if let Some(data) = Self::decode::<TextData>(&message) {
                    self.emit(&Event::UserLlmText { data });
                }
            }
            MessageType::BotLlmText => {
                if let Some(data) = Self::decode::<TextData>(&message) {
                    self.emit(&Event::BotLlmText { data });
                }
            }
            MessageType::BotTtsText => {
                if let Some(data) = Self::decode::<TextData>(&message) {
                    self.emit(&Event::BotTtsText { data });
                }
            }
            MessageType::BotLlmStarted => self.emit(&Event::BotLlmStarted),
            MessageType::BotLlmStopped => self.emit(&Event::BotLlmStopped),
            MessageType::BotTtsStarted => self.emit(&Event::BotTtsStarted),
            MessageType::BotTtsStopped => self.emit(&Event::BotTtsStopped),
            MessageType::BotLlmSearchResponse => {
                if let Some(data) = Self::decode::<BotLlmSearchResponseData>(&message) {
                    self.emit(&Event::BotLlmSearchResponse { data });
                }
            }

            // Metrics and generic payloads
            MessageType::Metrics => {
                if let Some(data) = Self::decode::<PipecatMetricsData>(&message) {
                    self.emit(&Event::Metrics { data });
                }
            }
            MessageType::ServerMessage | MessageType::AppendToContextResult => {
                self.emit(&Event::ServerMessage {
                    data: message.into_data(),
                });
            }

            // Function calls
            MessageType::LlmFunctionCall => self.on_function_call(&message),
            MessageType::LlmFunctionCallResult => {
                debug!(msg_id = %message.id(), "ignoring inbound function call result");
            }

            MessageType::ClientReady
            | MessageType::DisconnectBot
            | MessageType::ClientMessage
            | MessageType::AppendToContext
            | MessageType::Unknown(_) => {
                warn!(%msg_type, "unrecognized message type, dropping");
            }
        }
    }

    fn on_bot_ready(&self, message: &Message) {
        let data = Self::decode::<BotReadyData>(message).unwrap_or_default();
        if !protocol_version_supported(&data.version) {
            warn!(
                bot_version = %data.version,
                "bot speaks an RTVI protocol version below 1.0; some features may not work"
            );
        }

        let waiter = self.ready_tx.lock().take();
        if let Some(tx) = waiter {
            let _ = tx.send(data.clone());
        }
        self.emit(&Event::BotReady { data });
    }

    fn on_error(self: &Arc<Self>, message: Message) {
        // Only `fatal` decides teardown; the rest of the payload may be partial.
        let data = message.data();
        let fatal = data.get("fatal").and_then(Value::as_bool).unwrap_or(false);
        let text = data.get("message").and_then(Value::as_str).unwrap_or_default();
        if fatal {
            error!(error = %text, "fatal error from bot");
        } else {
            warn!(error = %text, "error from bot");
        }

        self.emit(&Event::Error { message });

        if fatal {
            let inner = Arc::clone(self);
            spawn_detached(async move {
                if let Err(e) = inner.disconnect().await {
                    warn!(error = %e, "disconnect after fatal error failed");
                }
            });
        }
    }

    fn on_function_call(&self, message: &Message) {
        let Some(data) = Self::decode::<LlmFunctionCallData>(message) else {
            self.emit(&Event::LlmFunctionCall {
                data: LlmFunctionCallData {
                    args: message.data().get("args").cloned().unwrap_or_default(),
                    ..LlmFunctionCallData::default()
                },
            });
            return;
        };

        if let Some(handler) = self.functions.get(&data.function_name) {
            debug!(function_name = %data.function_name, tool_call_id = %data.tool_call_id, "invoking function call handler");
            let call = handler(FunctionCallParams {
                function_name: data.function_name.clone(),
                arguments: data.args.clone(),
            });
            let transport = Arc::clone(&self.transport);
            let request = data.clone();
            spawn_detached(async move {
                let Some(result) = call.await.filter(|value| !value.is_null()) else {
                    debug!(function_name = %request.function_name, "handler returned no result");
                    return;
                };
                let reply = Message::function_call_result(&LlmFunctionCallResultResponse {
                    function_name: request.function_name,
                    tool_call_id: request.tool_call_id,
                    args: request.args,
                    result,
                });
                if let Err(e) = transport.send_message(&reply) {
                    error!(error = %e, "failed to send function call result");
                }
            });
        } else {
            debug!(function_name = %data.function_name, "no function call handler registered");
        }

        self.emit(&Event::LlmFunctionCall { data });
    }
}

/// Whether a bot's dotted protocol version has a major component of at
/// least 1.
pub fn protocol_version_supported(version: &str) -> bool {
    version
        .split('.')
        .next()
        .and_then(|major| major.trim().parse::<u32>().ok())
        .is_some_and(|major| major >= 1)
}

fn spawn_detached<F>(task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            let _ = runtime.spawn(task);
        }
        Err(_) => warn!("no tokio runtime, dropping background task"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubTransport;

    #[tokio::test]
    async fn options_from_settings() {
        let mut settings = ClientSettings::default();
        settings.media.enable_mic = false;
        settings.media.enable_cam = true;
        settings.about = Some(AboutClientData {
            platform: Some("kiosk".into()),
            ..Default::default()
        });

        let stub = Arc::new(StubTransport::new());
        let client = RtviClient::new(RtviClientOptions::from_settings(stub.clone(), &settings));

        assert!(!stub.options().enable_mic);
        assert!(stub.options().enable_cam);
        let about = client.about_client();
        assert_eq!(about.platform.as_deref(), Some("kiosk"));
        assert_eq!(about.library, crate::about::LIBRARY_NAME);
    }

    #[test]
    fn version_advisory() {
        assert!(protocol_version_supported("1.0.0"));
        assert!(protocol_version_supported("2.3"));
        assert!(!protocol_version_supported("0.3.0"));
        assert!(!protocol_version_supported(""));
        assert!(!protocol_version_supported("v1"));
    }
}
