//! Per-attempt sign-in flow state and the single-flight guard.
//!
//! DESIGN
//! ======
//! `AuthFlow` publishes `AuthFlowState` on a `tokio::sync::watch` channel so
//! screens can render a waiting indicator. Starting an attempt is an atomic
//! check-and-set on that channel (`send_if_modified`): only an `Idle` flow can
//! move to `AwaitingProviderResponse`, so a concurrent second caller is
//! rejected without touching the provider.
//!
//! The returned `FlightGuard` owns the in-flight slot. Finishing it publishes
//! the terminal phase and then returns to `Idle`; dropping it unfinished (the
//! caller's future was cancelled) returns to `Idle` as well.

use tokio::sync::watch;

use super::error::AuthError;
use crate::state::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowPhase {
    #[default]
    Idle,
    AwaitingProviderResponse,
    ExchangingCredential,
    Failed,
    Succeeded,
}

impl FlowPhase {
    /// True while an attempt is waiting on the provider.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::AwaitingProviderResponse | Self::ExchangingCredential)
    }
}

/// Observable state of the current (or most recent) sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthFlowState {
    pub phase: FlowPhase,
    /// Error of the most recent failed attempt, cleared when a new one starts.
    pub last_error: Option<AuthError>,
}

// =============================================================================
// AUTH FLOW
// =============================================================================

pub struct AuthFlow {
    tx: watch::Sender<AuthFlowState>,
}

impl AuthFlow {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthFlowState::default());
        Self { tx }
    }

    #[must_use]
    pub fn state(&self) -> AuthFlowState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthFlowState> {
        self.tx.subscribe()
    }

    /// Claim the in-flight slot.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlreadyInProgress`] if another attempt holds it.
    pub fn begin(&self) -> Result<FlightGuard<'_>, AuthError> {
        let claimed = self.tx.send_if_modified(|state| {
            if state.phase != FlowPhase::Idle {
                return false;
            }
            state.phase = FlowPhase::AwaitingProviderResponse;
            state.last_error = None;
            true
        });

        if claimed { Ok(FlightGuard { flow: self, finished: false }) } else { Err(AuthError::AlreadyInProgress) }
    }
}

impl Default for AuthFlow {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// FLIGHT GUARD
// =============================================================================

/// Exclusive handle on the in-flight attempt.
#[must_use = "dropping the guard immediately ends the attempt"]
pub struct FlightGuard<'a> {
    flow: &'a AuthFlow,
    finished: bool,
}

impl FlightGuard<'_> {
    /// Move to a later non-terminal phase.
    pub fn advance(&self, phase: FlowPhase) {
        self.flow.tx.send_modify(|state| state.phase = phase);
    }

    /// Publish the terminal phase for `result`, then release the slot.
    pub fn finish(mut self, result: &Result<Session, AuthError>) {
        let (phase, last_error) = match result {
            Ok(_) => (FlowPhase::Succeeded, None),
            Err(e) => (FlowPhase::Failed, Some(e.clone())),
        };
        self.flow.tx.send_modify(|state| {
            state.phase = phase;
            state.last_error = last_error;
        });
        self.flow.tx.send_modify(|state| state.phase = FlowPhase::Idle);
        self.finished = true;
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.flow.tx.send_modify(|state| state.phase = FlowPhase::Idle);
        }
    }
}

#[cfg(test)]
#[path = "flow_test.rs"]
mod tests;
