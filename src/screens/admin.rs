//! Admin screen: signed-in identity and the sign-out action.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::{Mount, mount_guard};
use crate::auth::{AuthError, PlatformAuthAdapter};
use crate::routes::{Navigator, Screen};
use crate::state::SessionStore;

pub const SIGNED_IN_AS: &str = "Signed in as:";
pub const NO_EMAIL: &str = "(no email)";
pub const SIGN_OUT_ACTION: &str = "Sign out";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminView {
    /// No session: render nothing and let the guard move us.
    Empty,
    SignedIn { email: Option<String>, message: Option<String> },
}

impl fmt::Display for AdminView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::SignedIn { email, message } => {
                writeln!(f, "{}", Screen::Authenticated.title())?;
                writeln!(f, "{SIGNED_IN_AS}")?;
                writeln!(f, "{}", email.as_deref().unwrap_or(NO_EMAIL))?;
                if let Some(message) = message {
                    writeln!(f, "! {message}")?;
                }
                write!(f, "[ {SIGN_OUT_ACTION} ]")
            }
        }
    }
}

pub struct AdminScreen {
    store: Arc<SessionStore>,
    adapter: Arc<PlatformAuthAdapter>,
    navigator: Arc<dyn Navigator>,
    message: Mutex<Option<String>>,
    mount: Mount,
}

impl AdminScreen {
    #[must_use]
    pub fn new(store: Arc<SessionStore>, adapter: Arc<PlatformAuthAdapter>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, adapter, navigator, message: Mutex::new(None), mount: Mount::default() }
    }

    pub fn on_mount(&self) {
        self.mount.set(mount_guard(Screen::Authenticated, &self.store, &self.navigator));
    }

    pub fn on_unmount(&self) {
        self.mount.clear();
    }

    #[must_use]
    pub fn view(&self) -> AdminView {
        match self.store.state().session {
            None => AdminView::Empty,
            Some(session) => AdminView::SignedIn {
                email: session.display_email,
                message: self.message.lock().unwrap_or_else(PoisonError::into_inner).clone(),
            },
        }
    }

    /// Sign out, then go back to the entry screen without waiting for the
    /// guard. A failure stays on this screen as a message.
    ///
    /// # Errors
    ///
    /// Returns the normalized sign-out error.
    pub async fn press_sign_out(&self) -> Result<(), AuthError> {
        *self.message.lock().unwrap_or_else(PoisonError::into_inner) = None;

        match self.adapter.sign_out().await {
            Ok(()) => {
                self.navigator.redirect_to(Screen::Entry);
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    AuthError::Unknown(detail) => format!("Sign-out failed: {detail}"),
                    other => other.user_message(),
                };
                *self.message.lock().unwrap_or_else(PoisonError::into_inner) = Some(message);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
