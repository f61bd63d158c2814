//! Sign-in error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Every provider-specific failure maps to exactly one `AuthError` kind at the
//! adapter boundary. Screens only ever see these kinds and render them via
//! `user_message`; nothing here is retried automatically.

use crate::identity::{ProviderError, codes};

/// Normalized sign-in failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The user closed the popup or dismissed the account chooser.
    #[error("sign-in cancelled by the user")]
    UserCancelled,

    /// Another sign-in is still pending.
    #[error("a sign-in is already in progress")]
    AlreadyInProgress,

    /// Required platform services (popup support, native SDK, loopback) are missing.
    #[error("sign-in provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The runtime origin is not permitted by the provider configuration.
    #[error("origin not authorized by the identity provider")]
    UnauthorizedOrigin,

    /// The delegated exchange finished without a usable token.
    #[error("provider returned no usable token")]
    TokenMissing,

    /// Anything the taxonomy has no dedicated kind for.
    #[error("sign-in failed: {0}")]
    Unknown(String),
}

impl AuthError {
    /// Classify a provider error by its code.
    #[must_use]
    pub fn from_provider(err: &ProviderError) -> Self {
        match err.code.as_str() {
            codes::POPUP_CLOSED_BY_USER
            | codes::CANCELLED_POPUP_REQUEST
            | codes::USER_CANCELLED
            | codes::SIGN_IN_CANCELLED
            | codes::ACCESS_DENIED => Self::UserCancelled,
            codes::IN_PROGRESS => Self::AlreadyInProgress,
            codes::PLAY_SERVICES_NOT_AVAILABLE
            | codes::OPERATION_NOT_SUPPORTED
            | codes::POPUP_BLOCKED
            | codes::LOOPBACK_UNAVAILABLE => Self::ProviderUnavailable(err.message.clone()),
            codes::UNAUTHORIZED_DOMAIN | codes::REDIRECT_URI_MISMATCH => Self::UnauthorizedOrigin,
            _ => Self::Unknown(err.message.clone()),
        }
    }

    /// Stable short code for logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserCancelled => "user_cancelled",
            Self::AlreadyInProgress => "already_in_progress",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::UnauthorizedOrigin => "unauthorized_origin",
            Self::TokenMissing => "token_missing",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Text shown on the entry screen.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::UserCancelled => "Sign-in cancelled".to_owned(),
            Self::AlreadyInProgress => "Sign-in already in progress".to_owned(),
            Self::ProviderUnavailable(_) => "Google sign-in services are not available".to_owned(),
            Self::UnauthorizedOrigin => {
                "Origin not authorized. Add it to the identity provider's authorized domains.".to_owned()
            }
            Self::TokenMissing => "Could not obtain the authentication token".to_owned(),
            Self::Unknown(message) => format!("Sign-in failed: {message}"),
        }
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        Self::from_provider(&err)
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
