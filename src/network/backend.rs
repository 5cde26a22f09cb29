//! Backend Contract
//!
//! The remote API the game consumes, as a trait so the client can run against
//! HTTP in production and an in-memory double in tests.

use std::future::Future;

use thiserror::Error;

use crate::network::auth::AuthToken;
use crate::network::protocol::{
    CreateSessionResponse, LeaderboardResponse, LoginRequest, LoginResponse, ScoreSubmission,
    ScoreUpdateResponse, SignupRequest, SignupResponse, UserScoreResponse, UsernameAvailability,
    VerifyResponse,
};

/// Backend call failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// No response in time.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Bearer token rejected (401).
    #[error("unauthorized")]
    Unauthorized,

    /// Backend answered with an `error` field.
    #[error("rejected by backend: {0}")]
    Rejected(String),

    /// Unexpected HTTP status with no usable body.
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Worth retrying: timeouts, transport failures and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Timeout | BackendError::Transport(_) => true,
            BackendError::Status(code) => *code >= 500,
            _ => false,
        }
    }
}

/// Backend API.
pub trait Backend: Send + Sync {
    /// `GET /api/leaderboard`.
    fn leaderboard(&self) -> impl Future<Output = Result<LeaderboardResponse, BackendError>> + Send;

    /// `POST /api/auth/signup`.
    fn signup(&self, request: &SignupRequest) -> impl Future<Output = Result<SignupResponse, BackendError>> + Send;

    /// `POST /api/auth/login`.
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<LoginResponse, BackendError>> + Send;

    /// `POST /api/auth/verify`. A rejected token is [`BackendError::Unauthorized`].
    fn verify(&self, token: &AuthToken) -> impl Future<Output = Result<VerifyResponse, BackendError>> + Send;

    /// `GET /api/auth/check-username/:name`.
    fn check_username(&self, username: &str) -> impl Future<Output = Result<UsernameAvailability, BackendError>> + Send;

    /// `GET /api/userscore`.
    fn user_score(&self, token: &AuthToken) -> impl Future<Output = Result<UserScoreResponse, BackendError>> + Send;

    /// `POST /api/create-session`.
    fn create_session(&self, token: &AuthToken) -> impl Future<Output = Result<CreateSessionResponse, BackendError>> + Send;

    /// `POST /api/scoreupdate`.
    fn submit_score(
        &self,
        token: &AuthToken,
        submission: &ScoreSubmission,
    ) -> impl Future<Output = Result<ScoreUpdateResponse, BackendError>> + Send;
}

// =============================================================================
// TEST DOUBLE
// =============================================================================

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;

    use super::*;
    use crate::network::protocol::paths;

    type Script<T> = Mutex<VecDeque<Result<T, BackendError>>>;

    /// Scripted in-memory backend. Each endpoint replays queued replies in
    /// order, then falls back to a happy-path default. Every call is counted.
    #[derive(Default)]
    pub(crate) struct MockBackend {
        pub leaderboard: Script<LeaderboardResponse>,
        pub signup: Script<SignupResponse>,
        pub login: Script<LoginResponse>,
        pub verify: Script<VerifyResponse>,
        pub check_username: Script<UsernameAvailability>,
        pub user_score: Script<UserScoreResponse>,
        pub create_session: Script<CreateSessionResponse>,
        pub submit_score: Script<ScoreUpdateResponse>,
        pub submissions: Mutex<Vec<ScoreSubmission>>,
        calls: Mutex<BTreeMap<&'static str, usize>>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a reply.
        pub fn push<T>(script: &Script<T>, reply: Result<T, BackendError>) {
            script.lock().unwrap().push_back(reply);
        }

        /// Calls made to `path`.
        pub fn calls(&self, path: &str) -> usize {
            self.calls.lock().unwrap().get(path).copied().unwrap_or(0)
        }

        /// Calls made to any endpoint.
        pub fn total_calls(&self) -> usize {
            self.calls.lock().unwrap().values().sum()
        }

        fn next<T>(&self, path: &'static str, script: &Script<T>, fallback: impl FnOnce() -> T) -> Result<T, BackendError> {
            *self.calls.lock().unwrap().entry(path).or_insert(0) += 1;
            script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(fallback()))
        }
    }

    impl Backend for MockBackend {
        async fn leaderboard(&self) -> Result<LeaderboardResponse, BackendError> {
            self.next(paths::LEADERBOARD, &self.leaderboard, LeaderboardResponse::default)
        }

        async fn signup(&self, _request: &SignupRequest) -> Result<SignupResponse, BackendError> {
            self.next(paths::SIGNUP, &self.signup, || SignupResponse {
                user: Some(serde_json::json!({ "id": 1 })),
                error: None,
            })
        }

        async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse, BackendError> {
            self.next(paths::LOGIN, &self.login, || LoginResponse {
                token: Some("mock-token".into()),
                username: Some("tester".into()),
                error: None,
            })
        }

        async fn verify(&self, _token: &AuthToken) -> Result<VerifyResponse, BackendError> {
            self.next(paths::VERIFY, &self.verify, || VerifyResponse {
                username: Some("tester".into()),
            })
        }

        async fn check_username(&self, _username: &str) -> Result<UsernameAvailability, BackendError> {
            self.next(paths::CHECK_USERNAME, &self.check_username, || UsernameAvailability { available: true })
        }

        async fn user_score(&self, _token: &AuthToken) -> Result<UserScoreResponse, BackendError> {
            self.next(paths::USER_SCORE, &self.user_score, || UserScoreResponse { score: Some(0) })
        }

        async fn create_session(&self, _token: &AuthToken) -> Result<CreateSessionResponse, BackendError> {
            self.next(paths::CREATE_SESSION, &self.create_session, || CreateSessionResponse {
                session_key: Some("mock-session-key".into()),
                error: None,
            })
        }

        async fn submit_score(
            &self,
            _token: &AuthToken,
            submission: &ScoreSubmission,
        ) -> Result<ScoreUpdateResponse, BackendError> {
            self.submissions.lock().unwrap().push(submission.clone());
            self.next(paths::SCORE_UPDATE, &self.submit_score, || ScoreUpdateResponse {
                success: true,
                message: None,
                error: None,
            })
        }
    }
}
