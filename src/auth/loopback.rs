//! Delegated authorization through the system browser and a loopback redirect.
//!
//! DESIGN
//! ======
//! Native sign-in cannot host a popup, so the authorizer hands the Google
//! consent page to the system browser and listens on `127.0.0.1` for the
//! redirect:
//!
//! 1. Bind the loopback listener (port 0 picks a free port).
//! 2. Generate a PKCE verifier/challenge pair and a random `state`.
//! 3. Serve `GET /callback` with axum until the first callback arrives, then
//!    shut the server down gracefully.
//! 4. Check `state`, then exchange the authorization code at Google's token
//!    endpoint for an ID token.
//!
//! The ID token is returned as `DelegatedOutcome::Success` and the adapter
//! exchanges it with the identity platform. A user who denies consent comes
//! back with `error=access_denied`, which is reported as `Cancelled`.
//!
//! Dropping the `authorize` future drops the shutdown sender, so an abandoned
//! attempt also stops the callback server.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use super::delegated::{DelegatedAuthorizer, DelegatedOutcome};
use crate::identity::{ProviderError, codes};

pub const DEFAULT_LOOPBACK_PORT: u16 = 8085;
pub const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SCOPES: &str = "openid email profile";
const CALLBACK_PATH: &str = "/callback";

// =============================================================================
// PKCE
// =============================================================================

/// PKCE code verifier and its S256 challenge.
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;
        let verifier_bytes: [u8; 32] = rand::rng().random();
        let verifier = URL_SAFE_NO_PAD.encode(verifier_bytes);
        let challenge = challenge_for(&verifier);
        Self { verifier, challenge }
    }
}

/// S256 challenge: base64url(sha256(verifier)) without padding.
#[must_use]
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

// =============================================================================
// CALLBACK
// =============================================================================

/// Query parameters Google appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Turn a callback into an authorization code, or the terminal outcome when
/// there is nothing to exchange.
///
/// # Errors
///
/// Returns `Cancelled` for `access_denied`, otherwise an `Error` outcome for
/// provider errors, a mismatched `state`, or a missing code.
pub fn classify_callback(params: &CallbackParams, expected_state: &str) -> Result<String, DelegatedOutcome> {
    if let Some(error) = params.error.as_deref() {
        if error == codes::ACCESS_DENIED {
            return Err(DelegatedOutcome::Cancelled);
        }
        let message = params.error_description.clone().unwrap_or_else(|| error.to_string());
        return Err(DelegatedOutcome::Error(ProviderError::new(error, message)));
    }

    if params.state.as_deref() != Some(expected_state) {
        return Err(DelegatedOutcome::Error(ProviderError::new(
            codes::INVALID_CREDENTIAL,
            "oauth state mismatch",
        )));
    }

    match params.code.as_deref().map(str::trim) {
        Some(code) if !code.is_empty() => Ok(code.to_string()),
        _ => Err(DelegatedOutcome::Error(ProviderError::new(
            codes::INVALID_CREDENTIAL,
            "callback carried no authorization code",
        ))),
    }
}

#[derive(Clone)]
struct CallbackState {
    tx: Arc<Mutex<Option<oneshot::Sender<CallbackParams>>>>,
}

/// `GET /callback`: hand the first redirect to the waiting authorizer.
async fn callback(State(state): State<CallbackState>, Query(params): Query<CallbackParams>) -> (StatusCode, &'static str) {
    let sender = state.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    let Some(sender) = sender else {
        return (StatusCode::GONE, "This sign-in request has already completed.");
    };

    let failed = params.error.is_some();
    if sender.send(params).is_err() {
        return (StatusCode::GONE, "This sign-in request is no longer active.");
    }

    if failed {
        (StatusCode::OK, "Sign-in was not completed. You can close this window.")
    } else {
        (StatusCode::OK, "Sign-in complete. You can close this window.")
    }
}

// =============================================================================
// TOKEN EXCHANGE
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

// =============================================================================
// AUTHORIZER
// =============================================================================

type UrlHandler = Arc<dyn Fn(&Url) + Send + Sync>;

pub struct LoopbackAuthorizer {
    http: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    port: u16,
    authorize_url: String,
    token_url: String,
    url_handler: UrlHandler,
}

impl LoopbackAuthorizer {
    /// Authorizer for `client_id` on the default port, opening the system browser.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: None,
            port: DEFAULT_LOOPBACK_PORT,
            authorize_url: GOOGLE_AUTHORIZE_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            url_handler: Arc::new(|url: &Url| launch_browser(url, true)),
        }
    }

    #[must_use]
    pub fn with_client_secret(mut self, secret: Option<String>) -> Self {
        self.client_secret = secret;
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// When false the authorization URL is only logged for the user to open.
    #[must_use]
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.url_handler = Arc::new(move |url: &Url| launch_browser(url, open_browser));
        self
    }

    /// Replace how the authorization URL is presented to the user.
    #[must_use]
    pub fn with_url_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Url) + Send + Sync + 'static,
    {
        self.url_handler = Arc::new(handler);
        self
    }

    /// Point the authorizer at non-Google endpoints.
    #[must_use]
    pub fn with_endpoints(mut self, authorize_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.authorize_url = authorize_url.into();
        self.token_url = token_url.into();
        self
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Consent page URL for one attempt.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the configured authorize endpoint is not a URL.
    pub fn authorization_url(&self, redirect_uri: &str, pkce: &Pkce, state: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(
            &self.authorize_url,
            [
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
    }

    async fn bind(&self) -> Result<TcpListener, ProviderError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        TcpListener::bind(addr).await.map_err(|e| {
            ProviderError::new(codes::LOOPBACK_UNAVAILABLE, format!("cannot listen on {addr}: {e}"))
        })
    }

    async fn wait_for_callback(
        &self,
        listener: TcpListener,
        redirect_uri: &str,
        pkce: &Pkce,
        state: &str,
    ) -> Result<CallbackParams, ProviderError> {
        let url = self
            .authorization_url(redirect_uri, pkce, state)
            .map_err(|e| ProviderError::new(codes::INTERNAL_ERROR, format!("bad authorize endpoint: {e}")))?;

        let (tx, rx) = oneshot::channel();
        let app = Router::new()
            .route(CALLBACK_PATH, get(callback))
            .with_state(CallbackState { tx: Arc::new(Mutex::new(Some(tx))) })
            .layer(TraceLayer::new_for_http());

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        info!(%redirect_uri, "waiting for authorization callback");
        (self.url_handler)(&url);

        let received = rx.await;
        let _ = stop_tx.send(());
        match server.await {
            Ok(Err(e)) => warn!(error = %e, "loopback server stopped with error"),
            Err(e) => warn!(error = %e, "loopback server task failed"),
            Ok(Ok(())) => {}
        }

        received.map_err(|_| ProviderError::new(codes::INTERNAL_ERROR, "callback server closed before a redirect arrived"))
    }

    /// Exchange an authorization code for a Google ID token.
    ///
    /// # Errors
    ///
    /// Returns a provider error carrying the token endpoint's `error` code,
    /// or `auth/network-request-failed` when the endpoint is unreachable.
    pub async fn exchange_code(&self, code: &str, verifier: &str, redirect_uri: &str) -> Result<Option<String>, ProviderError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("code_verifier", verifier),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ProviderError::new(codes::NETWORK_REQUEST_FAILED, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::new(codes::NETWORK_REQUEST_FAILED, e.to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => {
                    let message = err.error_description.unwrap_or_else(|| err.error.clone());
                    ProviderError::new(err.error, message)
                }
                Err(_) => ProviderError::new(codes::INTERNAL_ERROR, format!("token endpoint returned {status}")),
            });
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::new(codes::INTERNAL_ERROR, format!("bad token response: {e}")))?;
        Ok(token.id_token)
    }
}

#[async_trait::async_trait]
impl DelegatedAuthorizer for LoopbackAuthorizer {
    async fn ensure_available(&self) -> Result<(), ProviderError> {
        if self.port == 0 {
            return Ok(());
        }
        self.bind().await.map(drop)
    }

    async fn authorize(&self) -> DelegatedOutcome {
        let listener = match self.bind().await {
            Ok(listener) => listener,
            Err(e) => return DelegatedOutcome::Error(e),
        };
        let redirect_uri = match redirect_uri_for(&listener) {
            Ok(uri) => uri,
            Err(e) => return DelegatedOutcome::Error(e),
        };

        let pkce = Pkce::generate();
        let state = Uuid::new_v4().to_string();

        let params = match self.wait_for_callback(listener, &redirect_uri, &pkce, &state).await {
            Ok(params) => params,
            Err(e) => return DelegatedOutcome::Error(e),
        };
        let code = match classify_callback(&params, &state) {
            Ok(code) => code,
            Err(outcome) => return outcome,
        };

        debug!("authorization code received");
        match self.exchange_code(&code, &pkce.verifier, &redirect_uri).await {
            Ok(id_token) => DelegatedOutcome::Success { id_token },
            Err(e) => DelegatedOutcome::Error(e),
        }
    }
}

fn redirect_uri_for(listener: &TcpListener) -> Result<String, ProviderError> {
    let addr = listener
        .local_addr()
        .map_err(|e| ProviderError::new(codes::LOOPBACK_UNAVAILABLE, e.to_string()))?;
    Ok(format!("http://{}:{}{CALLBACK_PATH}", addr.ip(), addr.port()))
}

fn launch_browser(url: &Url, open_browser: bool) {
    if open_browser {
        match open::that(url.as_str()) {
            Ok(()) => return,
            Err(e) => warn!(error = %e, "could not open the system browser"),
        }
    }
    info!(%url, "open this URL to continue sign-in");
}

#[cfg(test)]
#[path = "loopback_test.rs"]
mod tests;
