//! Replace-style navigation.

use std::sync::{Mutex, PoisonError};

use tracing::info;

use super::guard::{NavAction, Screen};

/// Host navigation. `redirect_to` replaces the current entry; it never pushes.
pub trait Navigator: Send + Sync {
    fn redirect_to(&self, screen: Screen);

    fn current(&self) -> Screen;

    /// Apply a guard decision.
    fn follow(&self, action: NavAction) {
        if let NavAction::RedirectTo(screen) = action {
            self.redirect_to(screen);
        }
    }
}

struct NavState {
    current: Screen,
    replacements: usize,
}

/// In-process navigator holding a single history entry.
pub struct ReplaceNavigator {
    state: Mutex<NavState>,
}

impl ReplaceNavigator {
    #[must_use]
    pub fn new(start: Screen) -> Self {
        Self { state: Mutex::new(NavState { current: start, replacements: 0 }) }
    }

    /// Number of redirects that actually changed the screen.
    #[must_use]
    pub fn replacements(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).replacements
    }
}

impl Navigator for ReplaceNavigator {
    fn redirect_to(&self, screen: Screen) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.current == screen {
            return;
        }
        info!(from = %state.current, to = %screen, "navigate");
        state.current = screen;
        state.replacements += 1;
    }

    fn current(&self) -> Screen {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).current
    }
}
