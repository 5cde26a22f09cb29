//! Player Authentication
//!
//! Bearer tokens issued by the backend, where they are kept, and the page
//! guard that decides whether a screen may be shown. The backend is the only
//! authority on validity; the local JWT check only short-circuits tokens that
//! are already past their expiry.

use std::collections::HashSet;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::network::backend::{Backend, BackendError};
use crate::network::protocol::{LoginRequest, SignupRequest, VerifyResponse};
use crate::network::retry::{retry, RetryPolicy};

// =============================================================================
// TOKEN
// =============================================================================

/// Bearer token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token. Blank input yields `None`.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Raw token for the `Authorization` header.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the token is a JWT whose `exp` is at or before `now_secs`.
    ///
    /// Tokens that are not JWTs, or carry no `exp`, are never expired here.
    pub fn is_expired_at(&self, now_secs: u64) -> bool {
        match peek_expiry(&self.0) {
            Some(exp) => exp <= now_secs,
            None => false,
        }
    }

    /// [`Self::is_expired_at`] against the system clock.
    pub fn is_expired(&self) -> bool {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        self.is_expired_at(now)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthToken(<{} bytes>)", self.0.len())
    }
}

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    #[serde(default)]
    exp: Option<u64>,
}

/// Read `exp` without checking the signature. The backend still verifies.
fn peek_expiry(token: &str) -> Option<u64> {
    if token.split('.').count() != 3 {
        return None;
    }

    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    match decode::<ExpiryClaim>(token, &DecodingKey::from_secret(&[]), &validation) {
        Ok(data) => data.claims.exp,
        Err(e) => {
            debug!("Token claims unreadable, deferring to backend: {}", e);
            None
        }
    }
}

// =============================================================================
// TOKEN STORE
// =============================================================================

/// Where the current token and username live between screens.
pub trait TokenStore: Send + Sync {
    /// Stored token, if any.
    fn token(&self) -> Option<AuthToken>;

    /// Replace the stored token.
    fn set_token(&mut self, token: AuthToken);

    /// Stored display name, if any.
    fn username(&self) -> Option<String>;

    /// Replace the stored display name.
    fn set_username(&mut self, username: String);

    /// Forget token and username.
    fn clear(&mut self);
}

/// Process-local token store.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    token: Option<AuthToken>,
    username: Option<String>,
}

impl MemoryTokenStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a token.
    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Some(token),
            username: None,
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn token(&self) -> Option<AuthToken> {
        self.token.clone()
    }

    fn set_token(&mut self, token: AuthToken) {
        self.token = Some(token);
    }

    fn username(&self) -> Option<String> {
        self.username.clone()
    }

    fn set_username(&mut self, username: String) {
        self.username = Some(username);
    }

    fn clear(&mut self) {
        self.token = None;
        self.username = None;
    }
}

// =============================================================================
// ACCOUNT OPERATIONS
// =============================================================================

/// Authentication errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Input rejected before contacting the backend.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Backend refused the credentials or the signup.
    #[error("{0}")]
    Rejected(String),

    /// Login succeeded but no token came back.
    #[error("backend returned no token")]
    MissingToken,

    /// Transport or protocol failure.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

fn require(field: &str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_email(email: &str) -> Result<(), AuthError> {
    require("email", email)?;
    if !email.contains('@') {
        return Err(AuthError::Validation("email must contain '@'".into()));
    }
    Ok(())
}

/// Verify `token` with the backend.
///
/// `None` means invalid: locally expired, rejected with 401, or still
/// unreachable once the policy is exhausted.
pub async fn verify_token<B: Backend>(
    backend: &B,
    policy: &RetryPolicy,
    token: &AuthToken,
) -> Option<VerifyResponse> {
    if token.is_expired() {
        info!("Token expired locally, skipping verification");
        return None;
    }

    match retry(policy, move || backend.verify(token), BackendError::is_transient).await {
        Ok(response) => Some(response),
        Err(BackendError::Unauthorized) => {
            info!("Token rejected by backend");
            None
        }
        Err(e) => {
            warn!("Token verification failed: {}", e);
            None
        }
    }
}

/// Log in and store the returned token.
pub async fn login<B: Backend, S: TokenStore>(
    backend: &B,
    store: &mut S,
    email: &str,
    password: &str,
) -> Result<AuthToken, AuthError> {
    require_email(email)?;
    require("password", password)?;

    let request = LoginRequest {
        email: email.trim().to_string(),
        password: password.to_string(),
    };
    let response = backend.login(&request).await?;
    if let Some(error) = response.error {
        return Err(AuthError::Rejected(error));
    }

    let token = response.token.and_then(AuthToken::new).ok_or(AuthError::MissingToken)?;
    store.set_token(token.clone());
    if let Some(username) = response.username {
        store.set_username(username);
    }
    info!("Logged in as {}", store.username().unwrap_or_else(|| "<unknown>".into()));
    Ok(token)
}

/// Create an account. The player logs in separately afterwards.
pub async fn signup<B: Backend>(
    backend: &B,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), AuthError> {
    require("username", username)?;
    require_email(email)?;
    require("password", password)?;

    let request = SignupRequest {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        pass: password.to_string(),
    };
    let response = backend.signup(&request).await?;
    if let Some(error) = response.error {
        return Err(AuthError::Rejected(error));
    }
    if response.user.is_none() {
        return Err(AuthError::Rejected("signup returned no user".into()));
    }
    info!("Account {} created", request.username);
    Ok(())
}

/// Whether `username` is still free.
pub async fn check_username<B: Backend>(backend: &B, username: &str) -> Result<bool, AuthError> {
    require("username", username)?;
    Ok(backend.check_username(username.trim()).await?.available)
}

/// Forget the stored credentials.
pub fn logout<S: TokenStore>(store: &mut S) {
    store.clear();
    info!("Logged out");
}

// =============================================================================
// PAGE GUARD
// =============================================================================

/// Screens of the game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Page {
    /// Login and signup.
    Login,
    /// Main menu.
    MainMenu,
    /// The game itself.
    Game,
    /// Leaderboard.
    Leaderboard,
}

impl Page {
    /// Needs a verified token.
    pub fn is_protected(self) -> bool {
        matches!(self, Page::MainMenu | Page::Game | Page::Leaderboard)
    }

    /// Only shown to logged-out players.
    pub fn is_public_only(self) -> bool {
        matches!(self, Page::Login)
    }

    /// Map a page file name. An empty name is the login page.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            "" | "index.html" => Some(Page::Login),
            "mainmenu.html" => Some(Page::MainMenu),
            "game.html" => Some(Page::Game),
            "leaderboard.html" => Some(Page::Leaderboard),
            _ => None,
        }
    }
}

/// Page guard verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Show the requested page.
    Allow,
    /// Go to the login page.
    RedirectToLogin,
    /// Go to the main menu.
    RedirectToMainMenu,
}

/// Decide whether `page` may be shown. Invalid tokens are cleared from the
/// store; a verified username is stored.
pub async fn guard_page<B: Backend, S: TokenStore>(
    backend: &B,
    store: &mut S,
    policy: &RetryPolicy,
    page: Page,
) -> GuardDecision {
    let token = store.token();
    debug!("Guarding {:?} (token: {})", page, token.is_some());

    if page.is_protected() {
        let Some(token) = token else {
            return GuardDecision::RedirectToLogin;
        };
        return match verify_token(backend, policy, &token).await {
            Some(verified) => {
                if let Some(username) = verified.username {
                    store.set_username(username);
                }
                GuardDecision::Allow
            }
            None => {
                store.clear();
                GuardDecision::RedirectToLogin
            }
        };
    }

    if page.is_public_only() {
        if let Some(token) = token {
            if verify_token(backend, policy, &token).await.is_some() {
                return GuardDecision::RedirectToMainMenu;
            }
            store.clear();
        }
    }

    GuardDecision::Allow
}

// =============================================================================
// TESTS
// =============================================================================
