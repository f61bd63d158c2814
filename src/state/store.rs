//! Process-wide observable session store.
//!
//! DESIGN
//! ======
//! One writer, many readers. The only writer is the callback registered on
//! the identity client by `attach`; it calls `apply`, which replaces the
//! session wholesale, clears `initializing`, and notifies listeners in
//! registration order.
//!
//! `apply` holds `write_lock` for the whole replace-and-notify step so two
//! provider events can never interleave their notifications. Reads go
//! through the `watch` channel and never wait on listeners.
//!
//! Listeners must not call `apply` re-entrantly; everything else (reading
//! state, subscribing, unsubscribing) is fine from inside a callback.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use super::session::{AuthSnapshot, Session};
use crate::identity::IdentityClient;
use crate::observer::{ListenerSet, Subscription};

pub struct SessionStore {
    state: watch::Sender<AuthSnapshot>,
    listeners: ListenerSet<AuthSnapshot>,
    write_lock: Mutex<()>,
    upstream: Mutex<Option<Subscription>>,
}

impl SessionStore {
    /// New store in the initial `(absent, initializing)` state.
    #[must_use]
    pub fn new() -> Self {
        let (state, _rx) = watch::channel(AuthSnapshot::initial());
        Self { state, listeners: ListenerSet::new(), write_lock: Mutex::new(()), upstream: Mutex::new(None) }
    }

    /// Register this store as the identity client's session-change listener.
    /// Replaces any previous attachment.
    pub fn attach(self: &Arc<Self>, client: &dyn IdentityClient) {
        let weak = Arc::downgrade(self);
        let subscription = client.on_auth_state_changed(Box::new(move |session: Option<&Session>| {
            if let Some(store) = weak.upgrade() {
                store.apply(session.cloned());
            }
        }));

        let previous = self
            .upstream
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
    }

    /// Stop receiving identity client events. State is kept as-is.
    pub fn detach(&self) {
        let upstream = self.upstream.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(subscription) = upstream {
            subscription.unsubscribe();
        }
    }

    /// Replace the current session and notify listeners.
    pub fn apply(&self, session: Option<Session>) {
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = AuthSnapshot { session, initializing: false };
        let previous = self.state.send_replace(snapshot.clone());

        if previous.initializing {
            info!(signed_in = snapshot.is_signed_in(), "session store initialized");
        } else {
            debug!(signed_in = snapshot.is_signed_in(), "session changed");
        }

        self.listeners.notify(&snapshot);
    }

    /// Register a listener for every subsequent transition.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthSnapshot) + Send + Sync + 'static,
    {
        self.listeners.add(listener)
    }

    /// Async view of the state, for awaiting transitions.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Synchronous snapshot.
    #[must_use]
    pub fn state(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    /// Wait until the first session-change notification has been applied.
    pub async fn initialized(&self) -> AuthSnapshot {
        let mut rx = self.watch();
        match rx.wait_for(|snapshot| !snapshot.initializing).await {
            Ok(snapshot) => snapshot.clone(),
            // The sender lives in `self`, so the channel cannot close here.
            Err(_) => self.state(),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
