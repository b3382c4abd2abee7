use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

use super::events::{NEW_LISTENER, REMOVE_LISTENER};

/// A listener callback. Listeners run synchronously on the dispatch path.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle identifying one registration, returned by `on`/`once`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    listener: Listener,
    once: bool,
}

/// Named-event registry: event name -> ordered list of listeners
///
/// Cloning an emitter yields another handle to the same registry. The lock
/// is never held while listeners run, so listeners may add or remove
/// listeners (or emit) on the same emitter.
#[derive(Clone, Default)]
pub struct EventEmitter {
    events: Arc<Mutex<HashMap<String, Vec<Registration>>>>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.event_names())
            .finish()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Registration>>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a listener for `event`
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(listener), false)
    }

    /// Add a listener that is removed right before its first invocation
    pub fn once<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.register(event, Arc::new(listener), true)
    }

    /// Add a shared listener, which can later be removed by identity
    pub fn add_listener(&self, event: &str, listener: Listener) -> ListenerId {
        self.register(event, listener, false)
    }

    /// One-shot variant of [`EventEmitter::add_listener`]
    pub fn add_once_listener(&self, event: &str, listener: Listener) -> ListenerId {
        self.register(event, listener, true)
    }

    fn register(&self, event: &str, listener: Listener, once: bool) -> ListenerId {
        let id = ListenerId::next();
        let announce = {
            let mut events = self.lock();
            let announce = events.contains_key(NEW_LISTENER);
            events
                .entry(event.to_string())
                .or_default()
                .push(Registration { id, listener, once });
            announce
        };
        trace!(event = %event, once = once, "Listener added");
        if announce {
            self.emit(NEW_LISTENER, &Value::String(event.to_string()));
        }
        id
    }

    /// Remove the registration identified by `id`
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.remove_where(event, |registration| registration.id == id)
    }

    /// Remove the most recently added registration of `listener`, including
    /// a one-shot registration made with the same listener
    pub fn remove_listener(&self, event: &str, listener: &Listener) -> bool {
        self.remove_where(event, |registration| {
            Arc::ptr_eq(&registration.listener, listener)
        })
    }

    fn remove_where(&self, event: &str, predicate: impl Fn(&Registration) -> bool) -> bool {
        let announce = {
            let mut events = self.lock();
            let Some(list) = events.get_mut(event) else {
                return false;
            };
            let Some(position) = list.iter().rposition(|r| predicate(r)) else {
                return false;
            };
            list.remove(position);
            if list.is_empty() {
                events.remove(event);
            }
            events.contains_key(REMOVE_LISTENER)
        };
        if announce {
            self.emit(REMOVE_LISTENER, &Value::String(event.to_string()));
        }
        true
    }

    /// Remove every listener of `event`, or of all events when `None`
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        match event {
            Some(event) => {
                let (removed, announce) = {
                    let mut events = self.lock();
                    let removed = events.remove(event).map_or(0, |list| list.len());
                    (removed, events.contains_key(REMOVE_LISTENER))
                };
                if announce {
                    for _ in 0..removed {
                        self.emit(REMOVE_LISTENER, &Value::String(event.to_string()));
                    }
                }
            }
            None => {
                let names: Vec<String> = self
                    .event_names()
                    .into_iter()
                    .filter(|name| name != REMOVE_LISTENER)
                    .collect();
                for name in names {
                    self.remove_all_listeners(Some(&name));
                }
                self.lock().clear();
            }
        }
    }

    /// Snapshot of the listeners registered for `event`, in firing order
    pub fn listeners(&self, event: &str) -> Vec<Listener> {
        self.lock()
            .get(event)
            .map(|list| list.iter().map(|r| r.listener.clone()).collect())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }

    /// Names of all events that currently have listeners
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Fire `event` with `payload`. Returns whether any listener was registered.
    pub fn emit(&self, event: &str, payload: &Value) -> bool {
        let snapshot = {
            let mut events = self.lock();
            let Some(list) = events.get_mut(event) else {
                return false;
            };
            let snapshot = list.clone();
            list.retain(|r| !r.once);
            if list.is_empty() {
                events.remove(event);
            }
            snapshot
        };

        trace!(event = %event, listeners = snapshot.len(), "Emitting event");
        for registration in &snapshot {
            (registration.listener)(payload);
        }
        true
    }
}
