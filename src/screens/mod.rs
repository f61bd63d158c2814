//! Screen view-models for the entry and admin screens.
//!
//! DESIGN
//! ======
//! A screen owns no session state. It reads `SessionStore` and the
//! adapter's flow state when asked for its view, and while mounted it
//! re-runs the route guard on every store notification. Guard callbacks
//! only act while their screen is the navigator's current screen, so both
//! screens can stay mounted at once.
//!
//! Views are plain enums with a `Display` rendering, which is what the
//! terminal demo prints.

pub mod admin;
pub mod home;

use std::sync::{Arc, Mutex, PoisonError};

use crate::observer::Subscription;
use crate::routes::{Navigator, Screen, decide};
use crate::state::SessionStore;

pub use admin::{AdminScreen, AdminView};
pub use home::{HomeScreen, HomeView};

/// Guard subscription for one screen, plus the immediate on-mount check.
fn mount_guard(screen: Screen, store: &SessionStore, navigator: &Arc<dyn Navigator>) -> Subscription {
    if navigator.current() == screen {
        navigator.follow(decide(screen, &store.state()));
    }

    let navigator = navigator.clone();
    store.subscribe(move |snapshot| {
        if navigator.current() == screen {
            navigator.follow(decide(screen, snapshot));
        }
    })
}

/// Mounted-guard slot shared by both screens.
#[derive(Default)]
struct Mount(Mutex<Option<Subscription>>);

impl Mount {
    fn set(&self, subscription: Subscription) {
        let previous = self.0.lock().unwrap_or_else(PoisonError::into_inner).replace(subscription);
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
    }

    fn clear(&self) {
        let current = self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(current) = current {
            current.unsubscribe();
        }
    }

    fn is_mounted(&self) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}
