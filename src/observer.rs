//! Ordered listener registry with explicit unsubscribe handles.
//!
//! DESIGN
//! ======
//! Listeners are keyed by a monotonically increasing id in a `BTreeMap`, so
//! iteration order is registration order. `notify` snapshots the listener
//! list and releases the lock before invoking anything, which lets a listener
//! subscribe or unsubscribe from inside a callback.
//!
//! A `Subscription` only holds a `Weak` back-reference: unsubscribing after
//! the registry is gone is a no-op.

#[cfg(test)]
#[path = "observer_test.rs"]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: BTreeMap<u64, Listener<T>>,
}

// =============================================================================
// LISTENER SET
// =============================================================================

/// A set of callbacks invoked in registration order.
pub struct ListenerSet<T> {
    inner: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> ListenerSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(Registry { next_id: 0, listeners: BTreeMap::new() })) }
    }

    /// Register a listener. It stays registered until the returned handle is
    /// unsubscribed or the set is dropped.
    pub fn add<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.insert(id, Arc::new(listener));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .remove(&id);
            }
        })
    }

    /// Invoke every registered listener with `value`, oldest first.
    pub fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .values()
            .cloned()
            .collect();

        for listener in listeners {
            listener(value);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle returned by every `subscribe`-style call.
///
/// Dropping the handle does NOT unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "dropping a Subscription keeps the listener registered; call `unsubscribe` to remove it"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(detach: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self { detach: Some(Box::new(detach)) }
    }

    /// Remove the listener. Idempotent with respect to the registry: a listener
    /// whose registry is already gone is simply forgotten.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.detach.is_some()).finish()
    }
}
