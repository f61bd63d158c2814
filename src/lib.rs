//! # social-signin
//!
//! Google social sign-in demo: an entry screen, a guarded admin screen, and
//! the session coordination between them.
//!
//! Credential verification, token issuance and session refresh belong to the
//! external identity platform (`identity`). This crate contributes the
//! observable session store (`state`), the platform-dependent sign-in adapter
//! (`auth`), the route guard and navigator (`routes`), and the two screen
//! view-models (`screens`) driven by the terminal demo binary.

pub mod auth;
pub mod config;
pub mod identity;
pub mod observer;
pub mod routes;
pub mod screens;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;
