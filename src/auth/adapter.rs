//! Platform sign-in adapter.
//!
//! DESIGN
//! ======
//! The sign-in sequence is a strategy chosen once at construction from the
//! detected `Platform`:
//!
//! - `Popup`: one call to `IdentityClient::sign_in_with_popup`.
//! - `Delegated`: the authorizer runs an out-of-band flow and returns a
//!   provider token, which is then exchanged through
//!   `IdentityClient::sign_in_with_credential`.
//!
//! Either way the resulting session reaches `SessionStore` through the
//! identity client's state-change notification; the adapter never writes the
//! store itself.
//!
//! Single-flight is enforced by `AuthFlow`: a second `sign_in` while one is
//! pending returns `AlreadyInProgress` before any provider call.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::delegated::{DelegatedAuthorizer, DelegatedOutcome};
use super::error::AuthError;
use super::flow::{AuthFlow, AuthFlowState, FlightGuard, FlowPhase};
use super::platform::Platform;
use crate::identity::{Credential, GoogleProvider, IdentityClient};
use crate::state::Session;

/// Concrete login sequence.
pub enum SignInStrategy {
    Popup(GoogleProvider),
    Delegated(Arc<dyn DelegatedAuthorizer>),
}

impl SignInStrategy {
    /// Pick the sequence for `platform`.
    #[must_use]
    pub fn for_platform(platform: Platform, provider: GoogleProvider, authorizer: Arc<dyn DelegatedAuthorizer>) -> Self {
        match platform {
            Platform::Web => Self::Popup(provider),
            Platform::Native => Self::Delegated(authorizer),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Popup(_) => "popup",
            Self::Delegated(_) => "delegated",
        }
    }
}

// =============================================================================
// ADAPTER
// =============================================================================

pub struct PlatformAuthAdapter {
    platform: Platform,
    strategy: SignInStrategy,
    identity: Arc<dyn IdentityClient>,
    flow: AuthFlow,
}

impl PlatformAuthAdapter {
    #[must_use]
    pub fn new(
        platform: Platform,
        identity: Arc<dyn IdentityClient>,
        authorizer: Arc<dyn DelegatedAuthorizer>,
    ) -> Self {
        let strategy = SignInStrategy::for_platform(platform, GoogleProvider::new(), authorizer);
        info!(%platform, strategy = strategy.name(), "sign-in strategy resolved");
        Self { platform, strategy, identity, flow: AuthFlow::new() }
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn strategy(&self) -> &SignInStrategy {
        &self.strategy
    }

    #[must_use]
    pub fn flow_state(&self) -> AuthFlowState {
        self.flow.state()
    }

    #[must_use]
    pub fn watch_flow(&self) -> watch::Receiver<AuthFlowState> {
        self.flow.watch()
    }

    /// Run the platform's sign-in sequence.
    ///
    /// # Errors
    ///
    /// Returns the normalized [`AuthError`]; `AlreadyInProgress` is returned
    /// without contacting the provider.
    pub async fn sign_in(&self) -> Result<Session, AuthError> {
        let guard = self.flow.begin()?;
        let attempt = Uuid::new_v4();
        info!(%attempt, strategy = self.strategy.name(), "sign-in started");

        let result = match &self.strategy {
            SignInStrategy::Popup(provider) => self.run_popup(provider).await,
            SignInStrategy::Delegated(authorizer) => self.run_delegated(authorizer.as_ref(), &guard).await,
        };

        match &result {
            Ok(session) => info!(%attempt, subject = %session.subject_id, "sign-in succeeded"),
            Err(e) => warn!(%attempt, kind = e.code(), error = %e, "sign-in failed"),
        }

        guard.finish(&result);
        result
    }

    /// Sign out through the identity client. Navigation follows from the
    /// resulting session-change notification.
    ///
    /// # Errors
    ///
    /// Returns the normalized provider error.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.identity.sign_out().await.map_err(AuthError::from)
    }

    async fn run_popup(&self, provider: &GoogleProvider) -> Result<Session, AuthError> {
        Ok(self.identity.sign_in_with_popup(provider).await?)
    }

    async fn run_delegated(
        &self,
        authorizer: &dyn DelegatedAuthorizer,
        guard: &FlightGuard<'_>,
    ) -> Result<Session, AuthError> {
        authorizer.ensure_available().await?;

        let token = match authorizer.authorize().await {
            DelegatedOutcome::Success { id_token: Some(token) } if !token.trim().is_empty() => token,
            DelegatedOutcome::Success { .. } => return Err(AuthError::TokenMissing),
            DelegatedOutcome::Cancelled => return Err(AuthError::UserCancelled),
            DelegatedOutcome::Error(err) => return Err(err.into()),
        };

        guard.advance(FlowPhase::ExchangingCredential);
        Ok(self.identity.sign_in_with_credential(Credential::google_id_token(token)).await?)
    }
}

#[cfg(test)]
#[path = "adapter_test.rs"]
mod tests;
