//! Screens, the route guard, and navigation.
//!
//! DESIGN
//! ======
//! `guard::decide` is the single source of truth for which screen a given
//! auth snapshot belongs on. Screens call it on mount and on every store
//! notification.
//! The navigator only replaces the current screen, so history never grows
//! and back-navigation cannot return to a screen the guard would reject.

pub mod guard;
pub mod navigator;

pub use guard::{NavAction, Screen, decide};
pub use navigator::{Navigator, ReplaceNavigator};
