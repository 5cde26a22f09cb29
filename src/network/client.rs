//! Game Client
//!
//! Async shell around the deterministic session manager. It owns the
//! monotonic clock, talks to the backend for tokens, session keys and score
//! submission, and turns a finished run into a game-over screen.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, instrument, warn};

use crate::anticheat::session_key::SessionKey;
use crate::game::config::{ConfigError, GameConfig};
use crate::game::renderer::{GameOverView, Renderer};
use crate::game::session::{EndReason, JumpOutcome, SessionError, SessionManager, SessionState};
use crate::network::auth::{verify_token, AuthToken, MemoryTokenStore, TokenStore};
use crate::network::backend::{Backend, BackendError};
use crate::network::reporter::{ScoreReporter, SkipReason, SubmitOutcome};
use crate::network::retry::{retry, RetryPolicy};

/// Shown when a protected run could not be started.
pub const SESSION_KEY_NOTICE: &str = "Could not start a protected session. Please try again.";

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL.
    pub backend_url: String,
    /// Bearer token to start with.
    pub auth_token: Option<String>,
    /// Require session keys and run integrity checks.
    pub anti_cheat: bool,
    /// Optional JSON game config overriding the defaults.
    pub game_config_path: Option<PathBuf>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Runs played by the demo driver.
    pub demo_runs: u32,
    /// Demo autopilot gives up after this many seconds of a run.
    pub demo_max_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".to_string(),
            auth_token: None,
            anti_cheat: true,
            game_config_path: None,
            request_timeout: Duration::from_millis(8000),
            demo_runs: 3,
            demo_max_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let parse_u64 = |key: &str, fallback: u64| {
            std::env::var(key)
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(fallback)
        };

        Self {
            backend_url: std::env::var("BACKEND_URL").unwrap_or(defaults.backend_url),
            auth_token: std::env::var("HURDLE_AUTH_TOKEN").ok().filter(|t| !t.trim().is_empty()),
            anti_cheat: std::env::var("HURDLE_ANTI_CHEAT")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.anti_cheat),
            game_config_path: std::env::var("HURDLE_GAME_CONFIG").ok().map(PathBuf::from),
            request_timeout: Duration::from_millis(parse_u64(
                "HURDLE_REQUEST_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),
            demo_runs: parse_u64("HURDLE_DEMO_RUNS", defaults.demo_runs as u64) as u32,
            demo_max_secs: parse_u64("HURDLE_DEMO_MAX_SECS", defaults.demo_max_secs),
        }
    }

    /// Game config from the configured file (or defaults) with this
    /// config's anti-cheat switch applied.
    pub fn game_config(&self) -> Result<GameConfig, ConfigError> {
        let mut config = match &self.game_config_path {
            Some(path) => GameConfig::from_json_file(path)?,
            None => GameConfig::default(),
        };
        config.anti_cheat = self.anti_cheat;
        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// CLIENT
// =============================================================================

async fn request_session_key<B: Backend>(backend: &B, token: &AuthToken) -> Result<SessionKey, BackendError> {
    let response = backend.create_session(token).await?;
    if let Some(error) = response.error {
        return Err(BackendError::Rejected(error));
    }
    response
        .session_key
        .and_then(SessionKey::new)
        .ok_or_else(|| BackendError::Decode("missing sessionKey".into()))
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No usable auth token.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Session key could not be obtained after retries.
    #[error("session key unavailable: {0}")]
    SessionKeyUnavailable(BackendError),

    /// Session state error.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Backend error.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Runs games against a backend.
pub struct GameClient<B: Backend, R: Renderer, S: TokenStore = MemoryTokenStore> {
    backend: B,
    store: S,
    manager: SessionManager<R>,
    reporter: ScoreReporter,
    epoch: Instant,
    reported: bool,
    last_outcome: Option<SubmitOutcome>,
}

impl<B: Backend, R: Renderer, S: TokenStore> GameClient<B, R, S> {
    /// Create a client. The session clock starts now.
    pub fn new(backend: B, renderer: R, store: S, config: GameConfig) -> Self {
        let anti_cheat = config.anti_cheat;
        Self {
            backend,
            store,
            manager: SessionManager::new(config, renderer),
            reporter: ScoreReporter::new(anti_cheat),
            epoch: Instant::now(),
            reported: false,
            last_outcome: None,
        }
    }

    /// Milliseconds since the client was created.
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Session manager.
    pub fn manager(&self) -> &SessionManager<R> {
        &self.manager
    }

    /// Score reporter.
    pub fn reporter(&self) -> &ScoreReporter {
        &self.reporter
    }

    /// Token store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Outcome of the last submission attempt.
    pub fn last_outcome(&self) -> Option<&SubmitOutcome> {
        self.last_outcome.as_ref()
    }

    /// Verify the stored token and load the high score.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) -> Result<(), ClientError> {
        let token = self.store.token().ok_or(ClientError::NotAuthenticated)?;
        let Some(verified) = verify_token(&self.backend, &RetryPolicy::auth_verify(), &token).await else {
            self.store.clear();
            return Err(ClientError::NotAuthenticated);
        };
        if let Some(username) = verified.username {
            self.store.set_username(username);
        }

        let high_score = self.reporter.refresh_high_score(&self.backend, Some(&token)).await;
        self.manager.renderer_mut().set_high_score(high_score);
        info!(
            "Client ready for {} (high score {})",
            self.store.username().unwrap_or_else(|| "<unknown>".into()),
            high_score,
        );
        Ok(())
    }

    /// Request a session key, retrying transient failures.
    #[instrument(skip(self))]
    pub async fn acquire_session_key(&self) -> Result<SessionKey, ClientError> {
        let token = self.store.token().ok_or(ClientError::NotAuthenticated)?;
        let token = &token;
        let backend = &self.backend;

        let key = retry(
            &RetryPolicy::session_key(),
            move || request_session_key(backend, token),
            BackendError::is_transient,
        )
        .await
        .map_err(ClientError::SessionKeyUnavailable)?;

        info!("Session key {} issued", key.fingerprint());
        Ok(key)
    }

    async fn session_key_for_run(&self) -> Result<Option<SessionKey>, ClientError> {
        if self.manager.config().anti_cheat {
            self.acquire_session_key().await.map(Some)
        } else {
            Ok(None)
        }
    }

    /// Start a run. In anti-cheat mode a session key is acquired first.
    pub async fn start(&mut self) -> Result<(), ClientError> {
        let key = self.session_key_for_run().await?;
        let now = self.now_ms();
        self.manager.start(now, Utc::now(), key)?;
        self.begin_run();
        Ok(())
    }

    /// Start over. If no session key can be obtained the player is told to
    /// retry and no unprotected run is started.
    pub async fn restart(&mut self) -> Result<(), ClientError> {
        let key = match self.session_key_for_run().await {
            Ok(key) => key,
            Err(e) => {
                warn!("Restart failed: {}", e);
                let score = self.manager.session().map_or(0, |s| s.score);
                let high_score = self.reporter.high_score();
                self.manager.renderer_mut().show_game_over(&GameOverView {
                    score,
                    high_score,
                    notice: Some(SESSION_KEY_NOTICE.to_string()),
                });
                return Err(e);
            }
        };
        let now = self.now_ms();
        self.manager.restart(now, Utc::now(), key)?;
        self.begin_run();
        Ok(())
    }

    fn begin_run(&mut self) {
        self.reported = false;
        self.last_outcome = None;
        let high_score = self.reporter.high_score();
        self.manager.renderer_mut().set_high_score(high_score);
    }

    /// Jump now.
    pub fn jump(&mut self) -> JumpOutcome {
        let now = self.now_ms();
        self.manager.jump(now)
    }

    /// Pause the live run.
    pub fn pause(&mut self) -> Result<(), ClientError> {
        let now = self.now_ms();
        Ok(self.manager.pause(now)?)
    }

    /// Resume a paused run.
    pub fn resume(&mut self) -> Result<(), ClientError> {
        let now = self.now_ms();
        Ok(self.manager.resume(now)?)
    }

    /// Advance the core to now. When the run has just ended, submit it and
    /// show the game-over screen; the outcome is returned once.
    pub async fn pump(&mut self) -> Option<SubmitOutcome> {
        let now = self.now_ms();
        self.manager.advance(now);

        if self.manager.state() != SessionState::Stopped || self.reported {
            return None;
        }
        Some(self.finish_run().await)
    }

    async fn finish_run(&mut self) -> SubmitOutcome {
        self.reported = true;
        let token = self.store.token();

        let (outcome, score, notice) = match self.manager.session() {
            Some(session) => {
                let outcome = self.reporter.submit(&self.backend, token.as_ref(), session).await;
                let notice = match (&session.end_reason, &outcome) {
                    (Some(EndReason::IntegrityViolation(violation)), _) => {
                        Some(format!("Run voided: {}", violation))
                    }
                    (_, SubmitOutcome::Accepted { .. }) => Some("New high score!".to_string()),
                    (_, SubmitOutcome::Failed(_)) => Some("Score could not be submitted.".to_string()),
                    _ => None,
                };
                (outcome, session.score, notice)
            }
            None => (SubmitOutcome::Skipped(SkipReason::RunNotFinished), 0, None),
        };

        let high_score = self.reporter.high_score();
        let renderer = self.manager.renderer_mut();
        renderer.set_high_score(high_score);
        renderer.show_game_over(&GameOverView { score, high_score, notice });

        self.last_outcome = Some(outcome.clone());
        outcome
    }

    /// Drive the live run on a fixed tick until it ends. `input` sees the
    /// manager and the current time each tick and returns whether to jump.
    pub async fn run_until_over<F>(&mut self, tick: Duration, mut input: F) -> Result<SubmitOutcome, ClientError>
    where
        F: FnMut(&SessionManager<R>, u64) -> bool,
    {
        if self.manager.state() != SessionState::Active {
            return Err(ClientError::Session(SessionError::NotActive));
        }

        let mut ticker = interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Some(outcome) = self.pump().await {
                return Ok(outcome);
            }
            let now = self.now_ms();
            if input(&self.manager, now) {
                self.manager.jump(now);
            }
        }
    }

    /// Abandon the live run without submitting it.
    pub fn abandon(&mut self) -> Result<(), ClientError> {
        let now = self.now_ms();
        self.manager.abandon(now)?;
        self.reported = true;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
