//! In-memory fakes for the identity platform and delegated authorizer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::auth::{DelegatedAuthorizer, DelegatedOutcome};
use crate::identity::{AuthStateListener, Credential, GoogleProvider, IdentityClient, ProviderError};
use crate::observer::{ListenerSet, Subscription};
use crate::state::{Session, SubjectId};

#[must_use]
pub fn session(id: &str, email: Option<&str>) -> Session {
    Session::new(SubjectId::try_from(id).unwrap(), email.map(str::to_owned))
}

// =============================================================================
// FAKE IDENTITY CLIENT
// =============================================================================

pub struct FakeIdentity {
    current: Mutex<Option<Session>>,
    listeners: ListenerSet<Option<Session>>,
    popup_result: Mutex<Result<Session, ProviderError>>,
    credential_result: Mutex<Result<Session, ProviderError>>,
    sign_out_error: Mutex<Option<ProviderError>>,
    gate: Mutex<Option<Arc<Notify>>>,
    pub last_credential: Mutex<Option<Credential>>,
    pub popup_calls: AtomicUsize,
    pub credential_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl FakeIdentity {
    /// Signed-out fake whose popup and credential exchanges both succeed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            listeners: ListenerSet::new(),
            popup_result: Mutex::new(Ok(session("u1", Some("a@b.com")))),
            credential_result: Mutex::new(Ok(session("u2", Some("native@b.com")))),
            sign_out_error: Mutex::new(None),
            gate: Mutex::new(None),
            last_credential: Mutex::new(None),
            popup_calls: AtomicUsize::new(0),
            credential_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_popup_result(self, result: Result<Session, ProviderError>) -> Self {
        *self.popup_result.lock().unwrap() = result;
        self
    }

    #[must_use]
    pub fn with_credential_result(self, result: Result<Session, ProviderError>) -> Self {
        *self.credential_result.lock().unwrap() = result;
        self
    }

    #[must_use]
    pub fn with_sign_out_error(self, err: ProviderError) -> Self {
        *self.sign_out_error.lock().unwrap() = Some(err);
        self
    }

    /// Make provider calls wait until the returned `Notify` fires.
    pub fn hold_calls(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Simulate a provider-side session change.
    pub fn emit(&self, session: Option<Session>) {
        self.current.lock().unwrap().clone_from(&session);
        self.listeners.notify(&session);
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[async_trait::async_trait]
impl IdentityClient for FakeIdentity {
    async fn sign_in_with_popup(&self, _provider: &GoogleProvider) -> Result<Session, ProviderError> {
        self.popup_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_gate().await;
        let result = self.popup_result.lock().unwrap().clone();
        if let Ok(session) = &result {
            self.emit(Some(session.clone()));
        }
        result
    }

    async fn sign_in_with_credential(&self, credential: Credential) -> Result<Session, ProviderError> {
        self.credential_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_credential.lock().unwrap() = Some(credential);
        self.wait_gate().await;
        let result = self.credential_result.lock().unwrap().clone();
        if let Ok(session) = &result {
            self.emit(Some(session.clone()));
        }
        result
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.sign_out_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.emit(None);
        Ok(())
    }

    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        let listener = Arc::new(listener);
        let registered = listener.clone();
        let sub = self.listeners.add(move |session: &Option<Session>| registered(session.as_ref()));
        let current = self.current.lock().unwrap().clone();
        listener(current.as_ref());
        sub
    }
}

// =============================================================================
// FAKE DELEGATED AUTHORIZER
// =============================================================================

pub struct FakeAuthorizer {
    outcome: DelegatedOutcome,
    availability: Result<(), ProviderError>,
    pub calls: AtomicUsize,
}

impl FakeAuthorizer {
    #[must_use]
    pub fn returning(outcome: DelegatedOutcome) -> Self {
        Self { outcome, availability: Ok(()), calls: AtomicUsize::new(0) }
    }

    #[must_use]
    pub fn unavailable(err: ProviderError) -> Self {
        Self {
            outcome: DelegatedOutcome::Cancelled,
            availability: Err(err),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl DelegatedAuthorizer for FakeAuthorizer {
    async fn ensure_available(&self) -> Result<(), ProviderError> {
        self.availability.clone()
    }

    async fn authorize(&self) -> DelegatedOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}
