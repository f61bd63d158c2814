//! Delegated (out-of-band) authorization capability.
//!
//! The authorizer runs an external flow (device browser, native SDK) and
//! reports back a single outcome. A success that carries no token is still
//! reported as a success here; the adapter decides it is a failure.

use std::fmt;

use crate::identity::ProviderError;

/// Terminal outcome of a delegated authorization round-trip.
#[derive(Clone, PartialEq, Eq)]
pub enum DelegatedOutcome {
    /// The flow completed. `id_token` is whatever the provider returned.
    Success { id_token: Option<String> },
    /// The user backed out.
    Cancelled,
    /// The flow failed with a provider code.
    Error(ProviderError),
}

impl fmt::Debug for DelegatedOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { id_token } => f
                .debug_struct("Success")
                .field("id_token", &id_token.as_ref().map(|_| "<redacted>"))
                .finish(),
            Self::Cancelled => f.write_str("Cancelled"),
            Self::Error(err) => f.debug_tuple("Error").field(err).finish(),
        }
    }
}

/// Out-of-band authorization used on runtimes without popup support.
#[async_trait::async_trait]
pub trait DelegatedAuthorizer: Send + Sync {
    /// Verify the platform services this authorizer depends on are present.
    ///
    /// # Errors
    ///
    /// Returns a provider error (typically mapped to `ProviderUnavailable`).
    async fn ensure_available(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Run the external flow to completion.
    async fn authorize(&self) -> DelegatedOutcome;
}
