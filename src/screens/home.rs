//! Entry screen: sign-in action, pending indicator, error banner.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info};

use super::{Mount, mount_guard};
use crate::auth::{AuthError, PlatformAuthAdapter};
use crate::routes::{Navigator, Screen};
use crate::state::SessionStore;

pub const TITLE: &str = "Social Sign-In Demo";
pub const SUBTITLE: &str = "Google sign-in through the identity platform";
pub const SIGN_IN_ACTION: &str = "Sign in with Google";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeView {
    /// Session store has not reported yet.
    Loading,
    /// A sign-in attempt is in flight.
    SigningIn,
    Ready { error: Option<String>, hint: &'static str },
}

impl fmt::Display for HomeView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loading => write!(f, "Loading..."),
            Self::SigningIn => write!(f, "Signing in..."),
            Self::Ready { error, hint } => {
                writeln!(f, "{TITLE}")?;
                writeln!(f, "{SUBTITLE}")?;
                if let Some(error) = error {
                    writeln!(f, "! {error}")?;
                }
                writeln!(f, "[ {SIGN_IN_ACTION} ]")?;
                write!(f, "{hint}")
            }
        }
    }
}

pub struct HomeScreen {
    store: Arc<SessionStore>,
    adapter: Arc<PlatformAuthAdapter>,
    navigator: Arc<dyn Navigator>,
    error: Mutex<Option<String>>,
    mount: Mount,
}

impl HomeScreen {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, adapter: Arc<PlatformAuthAdapter>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, adapter, navigator, error: Mutex::new(None), mount: Mount::default() }
    }

    /// Run the guard now and on every store notification until unmounted.
    pub fn on_mount(&self) {
        self.mount.set(mount_guard(Screen::Entry, &self.store, &self.navigator));
    }

    pub fn on_unmount(&self) {
        self.mount.clear();
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mount.is_mounted()
    }

    #[must_use]
    pub fn view(&self) -> HomeView {
        if self.store.state().initializing {
            return HomeView::Loading;
        }
        if self.adapter.flow_state().phase.is_pending() {
            return HomeView::SigningIn;
        }
        HomeView::Ready { error: self.error(), hint: self.adapter.platform().hint() }
    }

    /// Last sign-in error message, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Run the sign-in sequence. On success the screen redirects without
    /// waiting for the guard; on failure the message is kept for the banner.
    ///
    /// # Errors
    ///
    /// Returns the adapter's [`AuthError`]. A duplicate press rejected while
    /// this screen's attempt is pending leaves the banner alone; the same
    /// error reported by the provider is shown like any other failure.
    ///
    /// Dropping the returned future abandons the attempt and returns the
    /// screen to [`HomeView::Ready`].
    pub async fn press_sign_in(&self) -> Result<(), AuthError> {
        self.set_error(None);

        match self.adapter.sign_in().await {
            Ok(_) => {
                self.navigator.redirect_to(Screen::Authenticated);
                Ok(())
            }
            Err(AuthError::AlreadyInProgress) if self.adapter.flow_state().phase.is_pending() => {
                debug!("sign-in already pending");
                Err(AuthError::AlreadyInProgress)
            }
            Err(e) => {
                self.set_error(Some(e.user_message()));
                Err(e)
            }
        }
    }

    /// Record that the user gave up on a pending attempt whose future has
    /// been dropped.
    pub fn abandon_sign_in(&self) {
        info!("sign-in abandoned by user");
        self.set_error(Some(AuthError::UserCancelled.user_message()));
    }

    fn set_error(&self, message: Option<String>) {
        *self.error.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }
}

#[cfg(test)]
#[path = "home_test.rs"]
mod tests;
