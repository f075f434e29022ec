//! Request/response correlation on top of a fire-and-forget send primitive.
//!
//! Each dispatched request parks a oneshot sender keyed by the envelope id.
//! A response settles it through [`MessageDispatcher::resolve`] or
//! [`MessageDispatcher::reject`]; a periodic sweep rejects entries that
//! outlive their timeout. Removal from the map is the single point where an
//! entry is settled, so no request is ever settled twice.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;
use rtvi_core::{Message, MessageId, MessageType, RtviError};
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, warn};

/// Default time a request may stay pending.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);
/// Default period of the expiry sweep.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_millis(2_000);

/// The send primitive the dispatcher writes through.
pub type SendFn = Arc<dyn Fn(&Message) -> Result<(), RtviError> + Send + Sync>;

type Settle = oneshot::Sender<Result<Message, RtviError>>;

struct PendingRequest {
    message: Message,
    timestamp: Instant,
    timeout: Duration,
    tx: Settle,
}

impl PendingRequest {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) >= self.timeout
    }
}

type PendingMap = DashMap<MessageId, PendingRequest>;

/// Correlates outbound requests with inbound responses.
pub struct MessageDispatcher {
    send: SendFn,
    pending: Arc<PendingMap>,
    gc_task: Mutex<Option<JoinHandle<()>>>,
    default_timeout: Duration,
    gc_interval: Duration,
}

impl MessageDispatcher {
    /// Dispatcher with the default request timeout and sweep interval.
    pub fn new(send: SendFn) -> Self {
        Self::with_timing(send, DEFAULT_REQUEST_TIMEOUT, DEFAULT_GC_INTERVAL)
    }

    /// Dispatcher with explicit timing. `gc_interval` paces the expiry
    /// sweep, which starts on the first dispatch inside a runtime.
    pub fn with_timing(send: SendFn, default_timeout: Duration, gc_interval: Duration) -> Self {
        Self {
            send,
            pending: Arc::new(DashMap::new()),
            gc_task: Mutex::new(None),
            default_timeout,
            gc_interval,
        }
    }

    /// Send a request and return a future for its response.
    ///
    /// The entry is recorded before the send so a response can never race
    /// ahead of its bookkeeping. A failed send removes the entry and the
    /// returned future resolves to that error immediately.
    pub fn dispatch(
        &self,
        data: Value,
        msg_type: MessageType,
        timeout: Option<Duration>,
    ) -> PendingResponse {
        self.dispatch_message(Message::new(msg_type, data), timeout)
    }

    /// Dispatch a pre-built envelope.
    pub fn dispatch_message(&self, message: Message, timeout: Option<Duration>) -> PendingResponse {
        self.ensure_gc();

        let id = message.id().clone();
        let (tx, rx) = oneshot::channel();
        let entry = PendingRequest {
            message: message.clone(),
            timestamp: Instant::now(),
            timeout: timeout.unwrap_or(self.default_timeout),
            tx,
        };
        if let Some(displaced) = self.pending.insert(id.clone(), entry) {
            warn!(
                msg_id = %id,
                msg_type = %displaced.message.msg_type(),
                "correlation id collision, earlier request dropped"
            );
        }

        debug!(msg_id = %id, msg_type = %message.msg_type(), "dispatch");

        if let Err(e) = (self.send)(&message) {
            error!(msg_id = %id, error = %e, "failed to send message");
            let _ = self.pending.remove(&id);
            return PendingResponse::failed(id, e);
        }

        let _ = self.collect_expired();
        PendingResponse {
            id,
            state: ResponseState::Waiting(rx),
        }
    }

    /// Settle the matching request successfully. Unknown ids are ignored.
    pub fn resolve(&self, message: Message) -> Message {
        if let Some((_, entry)) = self.pending.remove(message.id()) {
            debug!(msg_id = %message.id(), "resolve");
            let _ = entry.tx.send(Ok(message.clone()));
        }
        message
    }

    /// Fail the matching request with the bot's `error-response`. Unknown
    /// ids are ignored.
    pub fn reject(&self, message: Message) -> Message {
        if let Some((_, entry)) = self.pending.remove(message.id()) {
            debug!(msg_id = %message.id(), "reject");
            let _ = entry
                .tx
                .send(Err(RtviError::ErrorResponse(Box::new(message.clone()))));
        }
        message
    }

    /// Drop every pending request; their futures observe
    /// [`RtviError::SessionDisconnected`].
    pub fn clear_queue(&self) {
        let dropped = self.pending.len();
        self.pending.clear();
        if dropped > 0 {
            debug!(dropped, "cleared pending requests");
        }
    }

    /// Clear the queue and stop the sweep.
    pub fn disconnect(&self) {
        self.clear_queue();
        if let Some(task) = self.gc_task.lock().take() {
            task.abort();
        }
    }

    /// Number of requests awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Whether `id` still has an unsettled request.
    pub fn is_pending(&self, id: &MessageId) -> bool {
        self.pending.contains_key(id)
    }

    /// Whether the expiry sweep task is alive.
    pub fn gc_running(&self) -> bool {
        self.gc_task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Reject every entry older than its timeout. Returns how many expired.
    pub fn collect_expired(&self) -> usize {
        sweep(&self.pending, Instant::now())
    }

    fn ensure_gc(&self) {
        let mut slot = self.gc_task.lock();
        if slot.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime; pending requests expire only on dispatch");
            return;
        };
        let pending = Arc::downgrade(&self.pending);
        *slot = Some(runtime.spawn(gc_loop(pending, self.gc_interval)));
    }
}

impl Drop for MessageDispatcher {
    fn drop(&mut self) {
        if let Some(task) = self.gc_task.get_mut().take() {
            task.abort();
        }
    }
}

async fn gc_loop(pending: Weak<PendingMap>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        let _ = ticker.tick().await;
        let Some(pending) = pending.upgrade() else {
            break;
        };
        let _ = sweep(&pending, Instant::now());
    }
}

fn sweep(pending: &PendingMap, now: Instant) -> usize {
    let expired: Vec<MessageId> = pending
        .iter()
        .filter(|entry| entry.value().is_expired(now))
        .map(|entry| entry.key().clone())
        .collect();

    let mut count = 0;
    for id in expired {
        // A response may have settled the entry since the scan.
        if let Some((_, entry)) = pending.remove_if(&id, |_, e| e.is_expired(now)) {
            warn!(
                msg_id = %id,
                msg_type = %entry.message.msg_type(),
                timeout = ?entry.timeout,
                "request timed out"
            );
            let timed_out = Message::request_timed_out(&entry.message);
            let _ = entry.tx.send(Err(RtviError::Timeout(Box::new(timed_out))));
            count += 1;
        }
    }
    count
}

enum ResponseState {
    Waiting(oneshot::Receiver<Result<Message, RtviError>>),
    Failed(Option<RtviError>),
}

/// Future for the response to one dispatched request.
#[must_use = "a dispatched request does nothing unless its response is awaited"]
pub struct PendingResponse {
    id: MessageId,
    state: ResponseState,
}

impl PendingResponse {
    fn failed(id: MessageId, err: RtviError) -> Self {
        Self {
            id,
            state: ResponseState::Failed(Some(err)),
        }
    }

    /// Correlation id of the request this future is waiting on.
    pub fn id(&self) -> &MessageId {
        &self.id
    }
}

impl Future for PendingResponse {
    type Output = Result<Message, RtviError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            ResponseState::Waiting(rx) => Pin::new(rx)
                .poll(cx)
                .map(|settled| settled.unwrap_or(Err(RtviError::SessionDisconnected))),
            ResponseState::Failed(err) => {
                Poll::Ready(Err(err.take().unwrap_or(RtviError::Cancelled)))
            }
        }
    }
}
