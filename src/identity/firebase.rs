//! Firebase Authentication client over the Identity Toolkit REST API.
//!
//! DESIGN
//! ======
//! Only credential exchange goes over the wire
//! (`POST /v1/accounts:signInWithIdp`). The signed-in user is kept in memory
//! for the lifetime of the process; persistence and token refresh are the
//! platform's concern and are not reimplemented here.
//!
//! Popup sign-in needs a browser runtime, so this client reports
//! `auth/operation-not-supported-in-this-environment` for it.

use std::sync::{Mutex, PoisonError};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{AuthStateListener, Credential, GoogleProvider, IdentityClient, ProviderError, codes};
use crate::observer::{ListenerSet, Subscription};
use crate::state::{Session, SubjectId};

pub const DEFAULT_IDENTITY_TOOLKIT_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// `requestUri` sent with IdP credentials. Firebase requires a syntactically
/// valid URI even when no redirect happens.
const DEFAULT_REQUEST_URI: &str = "http://localhost";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpResponse {
    #[serde(default)]
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct FirebaseIdentityClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    request_uri: String,
    current: Mutex<Option<Session>>,
    listeners: ListenerSet<Option<Session>>,
    /// Held across every state change and its delivery, and across
    /// registering a listener and handing it the current state, so no
    /// listener sees an older session after a newer one. Listeners must not
    /// call back into the client.
    delivery: Mutex<()>,
}

impl FirebaseIdentityClient {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_IDENTITY_TOOLKIT_BASE_URL.to_owned(),
            request_uri: DEFAULT_REQUEST_URI.to_owned(),
            current: Mutex::new(None),
            listeners: ListenerSet::new(),
            delivery: Mutex::new(()),
        }
    }

    /// Point the client at a different Identity Toolkit host (emulator, proxy).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn sign_in_url(&self) -> String {
        format!("{}/v1/accounts:signInWithIdp", self.base_url)
    }

    fn current(&self) -> Option<Session> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the in-memory user and notify listeners if anything changed.
    fn set_current(&self, session: Option<Session>) {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let changed = {
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            let changed = *current != session || session.is_some();
            *current = session.clone();
            changed
        };
        if changed {
            self.listeners.notify(&session);
        }
    }
}

#[async_trait::async_trait]
impl IdentityClient for FirebaseIdentityClient {
    async fn sign_in_with_popup(&self, provider: &GoogleProvider) -> Result<Session, ProviderError> {
        debug!(provider = provider.provider_id(), "popup sign-in requested on a non-browser runtime");
        Err(ProviderError::new(
            codes::OPERATION_NOT_SUPPORTED,
            "popup sign-in requires a browser runtime",
        ))
    }

    async fn sign_in_with_credential(&self, credential: Credential) -> Result<Session, ProviderError> {
        let Credential::GoogleIdToken(id_token) = &credential;
        let body = serde_json::json!({
            "postBody": post_body(id_token, credential.provider_id()),
            "requestUri": self.request_uri,
            "returnSecureToken": true,
            "returnIdpCredential": true,
        });

        let resp = self
            .http
            .post(self.sign_in_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::new(codes::NETWORK_REQUEST_FAILED, e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ProviderError::new(codes::NETWORK_REQUEST_FAILED, e.to_string()))?;

        if !status.is_success() {
            let err = error_from_body(&text);
            warn!(status = status.as_u16(), code = %err.code, "signInWithIdp rejected");
            return Err(err);
        }

        let session = session_from_body(&text)?;
        info!(subject = %session.subject_id, "identity platform session established");
        self.set_current(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        if let Some(previous) = self.current() {
            info!(subject = %previous.subject_id, "signing out");
        }
        self.set_current(None);
        Ok(())
    }

    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        let _delivery = self.delivery.lock().unwrap_or_else(PoisonError::into_inner);
        let listener: std::sync::Arc<AuthStateListener> = std::sync::Arc::new(listener);
        let registered = listener.clone();
        let subscription = self.listeners.add(move |session: &Option<Session>| registered(session.as_ref()));

        // Deliver the current state once, like the platform's own observer.
        let current = self.current();
        listener(current.as_ref());

        subscription
    }
}

// =============================================================================
// WIRE HELPERS
// =============================================================================

/// Form-encoded `postBody` carrying the IdP credential.
fn post_body(id_token: &str, provider_id: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("id_token", id_token)
        .append_pair("providerId", provider_id)
        .finish()
}

fn session_from_body(body: &str) -> Result<Session, ProviderError> {
    let parsed: SignInWithIdpResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::new(codes::INTERNAL_ERROR, format!("unexpected response: {e}")))?;
    let subject_id = SubjectId::try_from(parsed.local_id)
        .map_err(|_| ProviderError::new(codes::INTERNAL_ERROR, "response carried no localId"))?;
    Ok(Session::new(subject_id, parsed.email))
}

/// Decode `{ "error": { "message": "CODE : detail" } }` into a provider error.
fn error_from_body(body: &str) -> ProviderError {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return ProviderError::new(codes::INTERNAL_ERROR, body.to_owned());
    };
    let raw = envelope.error.message;
    let (server_code, detail) = match raw.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim().to_owned()),
        None => (raw.trim(), raw.trim().to_owned()),
    };
    ProviderError::new(map_server_code(server_code), detail)
}

/// Map Identity Toolkit server codes to client-side `auth/*` codes.
fn map_server_code(server_code: &str) -> &'static str {
    match server_code {
        "OPERATION_NOT_ALLOWED" => codes::OPERATION_NOT_ALLOWED,
        "INVALID_IDP_RESPONSE" | "INVALID_ID_TOKEN" => codes::INVALID_CREDENTIAL,
        "USER_DISABLED" => codes::USER_DISABLED,
        "UNAUTHORIZED_DOMAIN" => codes::UNAUTHORIZED_DOMAIN,
        _ => codes::INTERNAL_ERROR,
    }
}

#[cfg(test)]
#[path = "firebase_test.rs"]
mod tests;
