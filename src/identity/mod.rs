//! Identity platform boundary.
//!
//! DESIGN
//! ======
//! The identity platform (token issuance, credential verification, session
//! persistence) is an external collaborator. `IdentityClient` is the seam:
//! the rest of the crate only talks to this trait, and tests substitute an
//! in-memory fake. `firebase` provides the REST-backed implementation used
//! by the demo binary.
//!
//! Failures cross this boundary as `ProviderError { code, message }` carrying
//! the provider's own code; `auth::AuthError` normalizes them.

pub mod firebase;

use std::fmt;

use crate::observer::Subscription;
use crate::state::Session;

/// Provider identifier used by the identity platform for Google.
pub const GOOGLE_PROVIDER_ID: &str = "google.com";

/// Provider error codes this crate knows how to normalize.
pub mod codes {
    pub const POPUP_CLOSED_BY_USER: &str = "auth/popup-closed-by-user";
    pub const CANCELLED_POPUP_REQUEST: &str = "auth/cancelled-popup-request";
    pub const USER_CANCELLED: &str = "auth/user-cancelled";
    pub const POPUP_BLOCKED: &str = "auth/popup-blocked";
    pub const UNAUTHORIZED_DOMAIN: &str = "auth/unauthorized-domain";
    pub const OPERATION_NOT_SUPPORTED: &str = "auth/operation-not-supported-in-this-environment";
    pub const OPERATION_NOT_ALLOWED: &str = "auth/operation-not-allowed";
    pub const INVALID_CREDENTIAL: &str = "auth/invalid-credential";
    pub const USER_DISABLED: &str = "auth/user-disabled";
    pub const NETWORK_REQUEST_FAILED: &str = "auth/network-request-failed";
    pub const INTERNAL_ERROR: &str = "auth/internal-error";

    // Native Google sign-in status codes.
    pub const SIGN_IN_CANCELLED: &str = "SIGN_IN_CANCELLED";
    pub const IN_PROGRESS: &str = "IN_PROGRESS";
    pub const PLAY_SERVICES_NOT_AVAILABLE: &str = "PLAY_SERVICES_NOT_AVAILABLE";

    // OAuth 2.0 authorization endpoint errors (RFC 6749 §4.1.2.1).
    pub const ACCESS_DENIED: &str = "access_denied";
    pub const REDIRECT_URI_MISMATCH: &str = "redirect_uri_mismatch";

    pub const LOOPBACK_UNAVAILABLE: &str = "loopback-unavailable";
}

// =============================================================================
// ERROR
// =============================================================================

/// A failure reported by the identity platform or the delegated authorizer,
/// carrying the provider's own code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into() }
    }
}

// =============================================================================
// PROVIDER + CREDENTIAL
// =============================================================================

/// Google provider configuration for the popup sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProvider {
    scopes: Vec<String>,
}

impl GoogleProvider {
    /// Google provider requesting the `profile` and `email` scopes.
    #[must_use]
    pub fn new() -> Self {
        Self { scopes: Vec::new() }.with_scope("profile").with_scope("email")
    }

    /// Request an additional OAuth scope. Duplicates are ignored.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        if !self.scopes.contains(&scope) {
            self.scopes.push(scope);
        }
        self
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn provider_id(&self) -> &'static str {
        GOOGLE_PROVIDER_ID
    }
}

impl Default for GoogleProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque provider proof exchanged for a session.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// A Google OIDC `id_token`.
    GoogleIdToken(String),
}

impl Credential {
    #[must_use]
    pub fn google_id_token(token: impl Into<String>) -> Self {
        Self::GoogleIdToken(token.into())
    }

    #[must_use]
    pub fn provider_id(&self) -> &'static str {
        match self {
            Self::GoogleIdToken(_) => GOOGLE_PROVIDER_ID,
        }
    }
}

// Tokens never reach logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoogleIdToken(_) => f.write_str("GoogleIdToken(<redacted>)"),
        }
    }
}

// =============================================================================
// IDENTITY CLIENT
// =============================================================================

/// Callback invoked with the new session value (`None` = signed out).
pub type AuthStateListener = Box<dyn Fn(Option<&Session>) + Send + Sync>;

/// Capability exposed by the external identity platform.
///
/// Implementations must report every session change (sign-in, sign-out) to
/// the listeners registered through `on_auth_state_changed`, and must deliver
/// the current state to a newly registered listener once, immediately.
#[async_trait::async_trait]
pub trait IdentityClient: Send + Sync {
    /// Run an in-process popup sign-in.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, including user cancellation.
    async fn sign_in_with_popup(&self, provider: &GoogleProvider) -> Result<Session, ProviderError>;

    /// Exchange a provider credential for a session.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when the credential is rejected or the
    /// platform is unreachable.
    async fn sign_in_with_credential(&self, credential: Credential) -> Result<Session, ProviderError>;

    /// Drop the current session.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if sign-out could not complete.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Register a session-change listener.
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription;
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
