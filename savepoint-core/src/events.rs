/*!
Save lifecycle events.

Outcomes (including every failure) are published on a small bus so UI and
gameplay code can react without the engine knowing about them. Subscriptions
are scoped: dropping the returned handle unsubscribes, so teardown cannot
leak dangling listeners.
*/

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Notifications emitted by the save engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    SaveStarted { slot: usize },
    SaveCompleted { slot: usize },
    SaveFailed { slot: usize, reason: String },
    LoadCompleted { slot: usize },
    LoadFailed { slot: usize, reason: String },
    SlotRepaired { slot: usize },
    SlotDeleted { slot: usize },
}

type Listener = Box<dyn Fn(&SaveEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    by_id: HashMap<u64, Listener>,
}

/// Publish/subscribe channel for `SaveEvent`s.
///
/// Listeners run synchronously on the emitting call; do not subscribe or
/// unsubscribe from inside a listener.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<Mutex<Listeners>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it stays active until the returned handle is
    /// dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SaveEvent) + Send + Sync + 'static,
    {
        let mut guard = self.listeners.lock().expect("event bus lock poisoned");
        let id = guard.next_id;
        guard.next_id += 1;
        guard.by_id.insert(id, Box::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Deliver an event to every live listener.
    pub fn emit(&self, event: &SaveEvent) {
        let guard = self.listeners.lock().expect("event bus lock poisoned");
        for listener in guard.by_id.values() {
            listener(event);
        }
    }

    #[cfg(test)]
    fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().by_id.len()
    }
}

/// Scoped subscription handle; unsubscribes on drop.
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut guard) = listeners.lock() {
                guard.by_id.remove(&self.id);
            }
        }
    }
}
