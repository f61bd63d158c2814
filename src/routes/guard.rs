//! Route guard: maps `(screen, snapshot)` to a navigation action.

use crate::state::AuthSnapshot;

/// The two screens of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Public entry screen with the sign-in action.
    Entry,
    /// Session-only screen.
    Authenticated,
}

impl Screen {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Entry => "/",
            Self::Authenticated => "/admin",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Entry => "Home",
            Self::Authenticated => "Admin",
        }
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Stay,
    RedirectTo(Screen),
}

/// Decide where `current` should be for `snapshot`.
///
/// Nothing moves while the store is initializing. Afterwards a session on
/// the entry screen goes to the authenticated screen and a missing session
/// on the authenticated screen goes back to the entry screen.
#[must_use]
pub fn decide(current: Screen, snapshot: &AuthSnapshot) -> NavAction {
    if snapshot.initializing {
        return NavAction::Stay;
    }
    match (current, snapshot.session.is_some()) {
        (Screen::Entry, true) => NavAction::RedirectTo(Screen::Authenticated),
        (Screen::Authenticated, false) => NavAction::RedirectTo(Screen::Entry),
        _ => NavAction::Stay,
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
