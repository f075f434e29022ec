//! Single delivery point for application-visible events.
//!
//! Every event goes first to the callback supplied at construction for its
//! kind, then to each dynamically registered listener in registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rtvi_core::{Event, EventKind};
use tracing::trace;

/// Closure invoked with each delivered event.
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Token returned by [`EventHub::on`], used to remove that listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Constructor-supplied callbacks, at most one per event kind.
#[derive(Clone, Default)]
pub struct RtviClientCallbacks {
    table: HashMap<EventKind, EventCallback>,
}

impl RtviClientCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the callback for `kind`, replacing any previous one.
    #[must_use]
    pub fn on<F>(mut self, kind: EventKind, callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let _ = self.table.insert(kind, Arc::new(callback));
        self
    }

    pub fn get(&self, kind: EventKind) -> Option<&EventCallback> {
        self.table.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for RtviClientCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

/// Callback table plus the listener registry.
pub struct EventHub {
    callbacks: RtviClientCallbacks,
    listeners: RwLock<HashMap<EventKind, Vec<(ListenerId, EventCallback)>>>,
    next_id: AtomicU64,
}

impl EventHub {
    pub fn new(callbacks: RtviClientCallbacks) -> Self {
        Self {
            callbacks,
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to every future occurrence of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove one listener. Returns whether it was registered.
    pub fn off(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(list) = listeners.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            let _ = listeners.remove(&kind);
        }
        removed
    }

    /// Remove every listener for `kind`, or for all kinds when `None`.
    pub fn remove_all_listeners(&self, kind: Option<EventKind>) {
        let mut listeners = self.listeners.write();
        match kind {
            Some(kind) => {
                let _ = listeners.remove(&kind);
            }
            None => listeners.clear(),
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.read().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to its callback, then to every listener.
    ///
    /// Listeners are snapshotted before delivery, so a listener may
    /// subscribe or unsubscribe from inside its own invocation.
    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        trace!(event = %kind, "emit");

        if let Some(callback) = self.callbacks.get(kind) {
            callback(event);
        }

        let snapshot: Vec<EventCallback> = self
            .listeners
            .read()
            .get(&kind)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();
        for listener in snapshot {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rtvi_core::TransportState;

    fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn callback_runs_before_listeners() {
        let order = log();
        let o = order.clone();
        let callbacks = RtviClientCallbacks::new().on(EventKind::BotReady, move |_| {
            o.lock().push("callback".into());
        });
        let hub = EventHub::new(callbacks);

        let o1 = order.clone();
        let _ = hub.on(EventKind::BotReady, move |_| o1.lock().push("first".into()));
        let o2 = order.clone();
        let _ = hub.on(EventKind::BotReady, move |_| o2.lock().push("second".into()));

        hub.emit(&Event::BotReady {
            data: Default::default(),
        });
        assert_eq!(*order.lock(), vec!["callback", "first", "second"]);
    }

    #[test]
    fn every_occurrence_reaches_every_listener() {
        let count = Arc::new(AtomicU64::new(0));
        let hub = EventHub::new(RtviClientCallbacks::new());
        for _ in 0..3 {
            let c = count.clone();
            let _ = hub.on(EventKind::BotTtsStarted, move |_| {
                let _ = c.fetch_add(1, Ordering::SeqCst);
            });
        }
        hub.emit(&Event::BotTtsStarted);
        hub.emit(&Event::BotTtsStarted);
        assert_eq!(count.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn events_only_reach_their_kind() {
        let seen = log();
        let s = seen.clone();
        let hub = EventHub::new(RtviClientCallbacks::new());
        let _ = hub.on(EventKind::TransportStateChanged, move |ev| {
            if let Event::TransportStateChanged { state } = ev {
                s.lock().push(state.to_string());
            }
        });
        hub.emit(&Event::BotLlmStarted);
        hub.emit(&Event::TransportStateChanged {
            state: TransportState::Ready,
        });
        assert_eq!(*seen.lock(), vec!["ready"]);
    }

    #[test]
    fn off_removes_only_that_listener() {
        let seen = log();
        let hub = EventHub::new(RtviClientCallbacks::new());
        let s1 = seen.clone();
        let a = hub.on(EventKind::Connected, move |_| s1.lock().push("a".into()));
        let s2 = seen.clone();
        let _b = hub.on(EventKind::Connected, move |_| s2.lock().push("b".into()));

        assert!(hub.off(EventKind::Connected, a));
        assert!(!hub.off(EventKind::Connected, a));
        hub.emit(&Event::Connected);
        assert_eq!(*seen.lock(), vec!["b"]);
        assert_eq!(hub.listener_count(EventKind::Connected), 1);
    }

    #[test]
    fn remove_all_listeners_by_kind_and_globally() {
        let hub = EventHub::new(RtviClientCallbacks::new());
        let _ = hub.on(EventKind::Connected, |_| {});
        let _ = hub.on(EventKind::Disconnected, |_| {});

        hub.remove_all_listeners(Some(EventKind::Connected));
        assert_eq!(hub.listener_count(EventKind::Connected), 0);
        assert_eq!(hub.listener_count(EventKind::Disconnected), 1);

        hub.remove_all_listeners(None);
        assert_eq!(hub.listener_count(EventKind::Disconnected), 0);
    }

    #[test]
    fn listener_may_subscribe_during_emit() {
        let hub = Arc::new(EventHub::new(RtviClientCallbacks::new()));
        let inner = hub.clone();
        let _ = hub.on(EventKind::Connected, move |_| {
            let _ = inner.on(EventKind::Connected, |_| {});
        });
        hub.emit(&Event::Connected);
        assert_eq!(hub.listener_count(EventKind::Connected), 2);
    }

    #[test]
    fn callbacks_replace_per_kind() {
        let callbacks = RtviClientCallbacks::new()
            .on(EventKind::Error, |_| {})
            .on(EventKind::Error, |_| {})
            .on(EventKind::Metrics, |_| {});
        assert_eq!(callbacks.len(), 2);
        assert!(callbacks.get(EventKind::Error).is_some());
        assert!(callbacks.get(EventKind::BotReady).is_none());
    }
}
