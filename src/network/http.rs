//! HTTP Backend
//!
//! [`Backend`] over `reqwest`. Bearer tokens go in the `Authorization`
//! header; every request shares one client with a fixed timeout.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::network::auth::AuthToken;
use crate::network::backend::{Backend, BackendError};
use crate::network::protocol::{
    paths, CreateSessionResponse, LeaderboardResponse, LoginRequest, LoginResponse,
    ScoreSubmission, ScoreUpdateResponse, SignupRequest, SignupResponse, UserScoreResponse,
    UsernameAvailability, VerifyResponse,
};

/// Backend reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
}

impl HttpBackend {
    /// Create a backend rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else if err.is_decode() {
        BackendError::Decode(err.to_string())
    } else {
        BackendError::Transport(err.to_string())
    }
}

/// Decode a response. Client-error bodies are still parsed so the backend's
/// `error` field reaches the caller.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, BackendError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }
    if status.is_server_error() {
        return Err(BackendError::Status(status.as_u16()));
    }

    let body = response.bytes().await.map_err(map_reqwest_error)?;
    match serde_json::from_slice::<T>(&body) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => {
            debug!("Unparseable {} response body", status);
            Err(BackendError::Status(status.as_u16()))
        }
        Err(e) => Err(BackendError::Decode(e.to_string())),
    }
}

impl Backend for HttpBackend {
    #[instrument(skip(self))]
    async fn leaderboard(&self) -> Result<LeaderboardResponse, BackendError> {
        self.send(self.client.get(self.url(paths::LEADERBOARD))).await
    }

    #[instrument(skip(self, request), fields(username = %request.username))]
    async fn signup(&self, request: &SignupRequest) -> Result<SignupResponse, BackendError> {
        self.send(self.client.post(self.url(paths::SIGNUP)).json(request)).await
    }

    #[instrument(skip(self, request))]
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, BackendError> {
        self.send(self.client.post(self.url(paths::LOGIN)).json(request)).await
    }

    #[instrument(skip(self, token))]
    async fn verify(&self, token: &AuthToken) -> Result<VerifyResponse, BackendError> {
        let request = self.client.post(self.url(paths::VERIFY)).bearer_auth(token.as_str());
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        // Any 2xx means valid; the username in the body is optional.
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }

    #[instrument(skip(self))]
    async fn check_username(&self, username: &str) -> Result<UsernameAvailability, BackendError> {
        let mut url = reqwest::Url::parse(&self.url(paths::CHECK_USERNAME))
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Transport("base url cannot carry a path".into()))?
            .push(username);
        self.send(self.client.get(url)).await
    }

    #[instrument(skip(self, token))]
    async fn user_score(&self, token: &AuthToken) -> Result<UserScoreResponse, BackendError> {
        self.send(self.client.get(self.url(paths::USER_SCORE)).bearer_auth(token.as_str())).await
    }

    #[instrument(skip(self, token))]
    async fn create_session(&self, token: &AuthToken) -> Result<CreateSessionResponse, BackendError> {
        self.send(self.client.post(self.url(paths::CREATE_SESSION)).bearer_auth(token.as_str())).await
    }

    #[instrument(skip(self, token, submission), fields(score = submission.score))]
    async fn submit_score(
        &self,
        token: &AuthToken,
        submission: &ScoreSubmission,
    ) -> Result<ScoreUpdateResponse, BackendError> {
        let request = self.client
            .post(self.url(paths::SCORE_UPDATE))
            .bearer_auth(token.as_str())
            .json(submission);
        self.send(request).await
    }
}
