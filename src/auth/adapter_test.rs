use super::*;

use std::sync::atomic::Ordering;

use crate::identity::{ProviderError, codes};
use crate::routes::{NavAction, Screen, decide};
use crate::state::SessionStore;
use crate::test_helpers::{FakeAuthorizer, FakeIdentity, session};

fn adapter(platform: Platform, identity: &Arc<FakeIdentity>, authorizer: FakeAuthorizer) -> PlatformAuthAdapter {
    PlatformAuthAdapter::new(platform, identity.clone(), Arc::new(authorizer))
}

fn attached_store(identity: &Arc<FakeIdentity>) -> Arc<SessionStore> {
    let store = Arc::new(SessionStore::new());
    store.attach(identity.as_ref());
    store
}

// =============================================================================
// strategy resolution
// =============================================================================

#[test]
fn web_resolves_popup_native_resolves_delegated() {
    let identity = Arc::new(FakeIdentity::new());
    let web = adapter(Platform::Web, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled));
    let native = adapter(Platform::Native, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled));

    assert_eq!(web.strategy().name(), "popup");
    assert_eq!(native.strategy().name(), "delegated");
    assert_eq!(native.platform(), Platform::Native);
}

// =============================================================================
// popup sequence
// =============================================================================

#[tokio::test]
async fn popup_success_reaches_store_and_guard_redirects() {
    let identity = Arc::new(FakeIdentity::new());
    let store = attached_store(&identity);
    let adapter = adapter(Platform::Web, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled));

    let signed_in = adapter.sign_in().await.unwrap();

    assert_eq!(signed_in.subject_id.as_str(), "u1");
    let snapshot = store.state();
    assert!(!snapshot.initializing);
    assert_eq!(snapshot.session, Some(session("u1", Some("a@b.com"))));
    assert_eq!(decide(Screen::Entry, &snapshot), NavAction::RedirectTo(Screen::Authenticated));
    assert_eq!(adapter.flow_state().phase, FlowPhase::Idle);
}

#[tokio::test]
async fn popup_cancel_leaves_store_unchanged() {
    let identity = Arc::new(
        FakeIdentity::new().with_popup_result(Err(ProviderError::new(codes::POPUP_CLOSED_BY_USER, "closed"))),
    );
    let store = attached_store(&identity);
    let before = store.state();
    let adapter = adapter(Platform::Web, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled));

    let err = adapter.sign_in().await.unwrap_err();

    assert_eq!(err, AuthError::UserCancelled);
    assert_eq!(store.state(), before);
    assert_eq!(adapter.flow_state().last_error, Some(AuthError::UserCancelled));
}

#[tokio::test]
async fn popup_unauthorized_domain_is_normalized() {
    let identity = Arc::new(
        FakeIdentity::new().with_popup_result(Err(ProviderError::new(codes::UNAUTHORIZED_DOMAIN, "localhost"))),
    );
    let adapter = adapter(Platform::Web, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled));

    assert_eq!(adapter.sign_in().await.unwrap_err(), AuthError::UnauthorizedOrigin);
}

// =============================================================================
// single flight
// =============================================================================

#[tokio::test]
async fn second_sign_in_while_pending_is_rejected_without_provider_call() {
    let identity = Arc::new(FakeIdentity::new());
    let gate = identity.hold_calls();
    let adapter = Arc::new(adapter(Platform::Web, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled)));

    let first = tokio::spawn({
        let adapter = adapter.clone();
        async move { adapter.sign_in().await }
    });

    let mut flow = adapter.watch_flow();
    flow.wait_for(|state| state.phase.is_pending()).await.unwrap();

    assert_eq!(adapter.sign_in().await.unwrap_err(), AuthError::AlreadyInProgress);
    assert_eq!(identity.popup_calls.load(Ordering::SeqCst), 1);

    gate.notify_one();
    assert!(first.await.unwrap().is_ok());
    assert_eq!(identity.popup_calls.load(Ordering::SeqCst), 1);

    // Pre-release the gate so the next attempt runs straight through.
    gate.notify_one();
    assert!(adapter.sign_in().await.is_ok());
}

#[tokio::test]
async fn rejected_duplicate_does_not_clobber_pending_state() {
    let identity = Arc::new(FakeIdentity::new());
    let gate = identity.hold_calls();
    let adapter = Arc::new(adapter(Platform::Web, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled)));

    let first = tokio::spawn({
        let adapter = adapter.clone();
        async move { adapter.sign_in().await }
    });
    adapter.watch_flow().wait_for(|s| s.phase.is_pending()).await.unwrap();

    let _ = adapter.sign_in().await;
    assert!(adapter.flow_state().phase.is_pending());
    assert!(adapter.flow_state().last_error.is_none());

    gate.notify_one();
    first.await.unwrap().unwrap();
}

// =============================================================================
// delegated sequence
// =============================================================================

#[tokio::test]
async fn delegated_success_exchanges_token() {
    let identity = Arc::new(FakeIdentity::new());
    let store = attached_store(&identity);
    let adapter = adapter(
        Platform::Native,
        &identity,
        FakeAuthorizer::returning(DelegatedOutcome::Success { id_token: Some("tok".into()) }),
    );

    let signed_in = adapter.sign_in().await.unwrap();

    assert_eq!(signed_in.subject_id.as_str(), "u2");
    assert_eq!(
        *identity.last_credential.lock().unwrap(),
        Some(crate::identity::Credential::google_id_token("tok"))
    );
    assert_eq!(store.state().session, Some(signed_in));
    assert_eq!(identity.popup_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delegated_phase_passes_through_exchanging() {
    let identity = Arc::new(FakeIdentity::new());
    let gate = identity.hold_calls();
    let adapter = Arc::new(adapter(
        Platform::Native,
        &identity,
        FakeAuthorizer::returning(DelegatedOutcome::Success { id_token: Some("tok".into()) }),
    ));

    let task = tokio::spawn({
        let adapter = adapter.clone();
        async move { adapter.sign_in().await }
    });

    adapter
        .watch_flow()
        .wait_for(|s| s.phase == FlowPhase::ExchangingCredential)
        .await
        .unwrap();
    gate.notify_one();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn delegated_success_without_token_is_token_missing() {
    let identity = Arc::new(FakeIdentity::new());
    let store = attached_store(&identity);
    let before = store.state();
    let adapter = adapter(
        Platform::Native,
        &identity,
        FakeAuthorizer::returning(DelegatedOutcome::Success { id_token: None }),
    );

    assert_eq!(adapter.sign_in().await.unwrap_err(), AuthError::TokenMissing);
    assert_eq!(store.state(), before);
    assert_eq!(identity.credential_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn delegated_blank_token_is_token_missing() {
    let identity = Arc::new(FakeIdentity::new());
    let adapter = adapter(
        Platform::Native,
        &identity,
        FakeAuthorizer::returning(DelegatedOutcome::Success { id_token: Some("  ".into()) }),
    );

    assert_eq!(adapter.sign_in().await.unwrap_err(), AuthError::TokenMissing);
}

#[tokio::test]
async fn delegated_cancel_is_user_cancelled() {
    let identity = Arc::new(FakeIdentity::new());
    let adapter = adapter(Platform::Native, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled));

    assert_eq!(adapter.sign_in().await.unwrap_err(), AuthError::UserCancelled);
}

#[tokio::test]
async fn delegated_error_outcome_is_normalized() {
    let identity = Arc::new(FakeIdentity::new());
    let adapter = adapter(
        Platform::Native,
        &identity,
        FakeAuthorizer::returning(DelegatedOutcome::Error(ProviderError::new(codes::IN_PROGRESS, "busy"))),
    );

    assert_eq!(adapter.sign_in().await.unwrap_err(), AuthError::AlreadyInProgress);
}

#[tokio::test]
async fn delegated_missing_services_skip_authorize() {
    let identity = Arc::new(FakeIdentity::new());
    let authorizer = Arc::new(FakeAuthorizer::unavailable(ProviderError::new(
        codes::PLAY_SERVICES_NOT_AVAILABLE,
        "no services",
    )));
    let adapter = PlatformAuthAdapter::new(Platform::Native, identity.clone(), authorizer.clone());

    assert_eq!(
        adapter.sign_in().await.unwrap_err(),
        AuthError::ProviderUnavailable("no services".into())
    );
    assert_eq!(authorizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn credential_rejection_leaves_store_unchanged() {
    let identity = Arc::new(
        FakeIdentity::new().with_credential_result(Err(ProviderError::new(codes::INVALID_CREDENTIAL, "bad"))),
    );
    let store = attached_store(&identity);
    let adapter = adapter(
        Platform::Native,
        &identity,
        FakeAuthorizer::returning(DelegatedOutcome::Success { id_token: Some("tok".into()) }),
    );

    assert_eq!(adapter.sign_in().await.unwrap_err(), AuthError::Unknown("bad".into()));
    assert!(store.state().session.is_none());
}

// =============================================================================
// sign out
// =============================================================================

#[tokio::test]
async fn sign_out_delegates_and_store_follows() {
    let identity = Arc::new(FakeIdentity::new());
    let store = attached_store(&identity);
    let adapter = adapter(Platform::Web, &identity, FakeAuthorizer::returning(DelegatedOutcome::Cancelled));
    adapter.sign_in().await.unwrap();

    adapter.sign_out().await.unwrap();

    assert_eq!(identity.sign_out_calls.load(Ordering::SeqCst), 1);
    let snapshot = store.state();
    assert!(snapshot.session.is_none());
    assert_eq!(decide(Screen::Authenticated, &snapshot), NavAction::RedirectTo(Screen::Entry));
}
