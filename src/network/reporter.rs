//! Score Reporter
//!
//! Decides whether a finished run is worth sending, sends it once, and keeps
//! the locally known high score in step with what the backend accepted.
//! A submission is never retried and never assumed to have succeeded.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::anticheat::evidence::{build_evidence, GameSessionEvidence};
use crate::game::events::EventLogError;
use crate::game::session::GameSession;
use crate::network::auth::AuthToken;
use crate::network::backend::{Backend, BackendError};
use crate::network::protocol::ScoreSubmission;

/// Why a run was not sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// Player is not logged in.
    #[error("no auth token")]
    NoToken,
    /// Run is still live.
    #[error("run has not finished")]
    RunNotFinished,
    /// Run was abandoned or failed the integrity check.
    #[error("run is void")]
    RunVoided,
    /// Score does not beat the known high score.
    #[error("score {score} does not beat high score {high_score}")]
    NotAHighScore {
        /// Run score.
        score: u64,
        /// Known high score.
        high_score: u64,
    },
    /// Event log is malformed.
    #[error("inconsistent event log: {0}")]
    InconsistentLog(EventLogError),
    /// Anti-cheat is on and no key was bound at start.
    #[error("no session key bound to the run")]
    MissingSessionKey,
}

/// Result of [`ScoreReporter::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Nothing was sent.
    Skipped(SkipReason),
    /// Backend recorded the score as the new high score.
    Accepted {
        /// Recorded score.
        score: u64,
    },
    /// Backend answered but did not record the score.
    Rejected {
        /// Backend explanation.
        message: String,
    },
    /// Request failed.
    Failed(BackendError),
}

impl SubmitOutcome {
    /// A request reached the backend (or tried to).
    pub fn was_sent(&self) -> bool {
        !matches!(self, SubmitOutcome::Skipped(_))
    }
}

/// Submits finished runs.
#[derive(Clone, Debug, Default)]
pub struct ScoreReporter {
    high_score: u64,
    anti_cheat: bool,
}

impl ScoreReporter {
    /// Reporter with no known high score.
    pub fn new(anti_cheat: bool) -> Self {
        Self {
            high_score: 0,
            anti_cheat,
        }
    }

    /// Last high score the backend confirmed.
    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    /// Overwrite the known high score.
    pub fn set_high_score(&mut self, high_score: u64) {
        self.high_score = high_score;
    }

    /// Load the stored high score. Falls back to 0 on any failure.
    #[instrument(skip(self, backend, token))]
    pub async fn refresh_high_score<B: Backend>(&mut self, backend: &B, token: Option<&AuthToken>) -> u64 {
        let Some(token) = token else {
            self.high_score = 0;
            return 0;
        };

        self.high_score = match backend.user_score(token).await {
            Ok(response) => response.score.unwrap_or(0),
            Err(e) => {
                warn!("Could not load high score: {}", e);
                0
            }
        };
        debug!("High score is {}", self.high_score);
        self.high_score
    }

    /// Build the payload for `session`, or say why it must not be sent.
    pub fn prepare(
        &self,
        session: &GameSession,
        token: Option<&AuthToken>,
    ) -> Result<ScoreSubmission, SkipReason> {
        if token.is_none() {
            return Err(SkipReason::NoToken);
        }
        if session.active {
            return Err(SkipReason::RunNotFinished);
        }
        if !session.submittable {
            return Err(SkipReason::RunVoided);
        }
        if session.score <= self.high_score {
            return Err(SkipReason::NotAHighScore {
                score: session.score,
                high_score: self.high_score,
            });
        }
        session.events.check_consistency().map_err(SkipReason::InconsistentLog)?;
        if self.anti_cheat && session.session_key.is_none() {
            return Err(SkipReason::MissingSessionKey);
        }

        let evidence: GameSessionEvidence = build_evidence(session).ok_or(SkipReason::RunNotFinished)?;
        Ok(ScoreSubmission {
            score: session.score,
            session_key: session.session_key.clone(),
            game_session: evidence,
        })
    }

    /// Submit `session` if it qualifies. Makes at most one backend call.
    #[instrument(skip_all, fields(run_id = %session.run_id, score = session.score))]
    pub async fn submit<B: Backend>(
        &mut self,
        backend: &B,
        token: Option<&AuthToken>,
        session: &GameSession,
    ) -> SubmitOutcome {
        let submission = match self.prepare(session, token) {
            Ok(submission) => submission,
            Err(reason) => {
                debug!("Not submitting: {}", reason);
                return SubmitOutcome::Skipped(reason);
            }
        };
        let Some(token) = token else {
            return SubmitOutcome::Skipped(SkipReason::NoToken);
        };

        match backend.submit_score(token, &submission).await {
            Ok(response) if response.success => {
                self.high_score = submission.score;
                info!("New high score {} recorded", submission.score);
                SubmitOutcome::Accepted { score: submission.score }
            }
            Ok(response) => {
                let message = response
                    .error
                    .or(response.message)
                    .unwrap_or_else(|| "score not recorded".to_string());
                warn!("Score {} not recorded: {}", submission.score, message);
                SubmitOutcome::Rejected { message }
            }
            Err(e) => {
                warn!("Score submission failed: {}", e);
                SubmitOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::anticheat::session_key::SessionKey;
    use crate::game::config::GameConfig;
    use crate::game::renderer::HeadlessRenderer;
    use crate::game::session::SessionManager;
    use crate::network::backend::mock::MockBackend;
    use crate::network::protocol::{paths, ScoreUpdateResponse, UserScoreResponse};

    fn token() -> AuthToken {
        AuthToken::new("mock-token").unwrap()
    }

    /// A stopped run scoring one point per 50ms over `ms`.
    fn finished(anti_cheat: bool, key: Option<&str>, ms: u64) -> GameSession {
        let mut config = GameConfig::default();
        config.anti_cheat = anti_cheat;
        config.collision.player_samples.clear();
        let mut m = SessionManager::new(config, HeadlessRenderer::new("move"));
        m.start(0, Utc::now(), key.and_then(SessionKey::new)).unwrap();
        m.advance(ms);
        m.stop(ms).unwrap();
        m.session().unwrap().clone()
    }

    #[tokio::test]
    async fn test_not_a_high_score_is_noop() {
        let backend = MockBackend::new();
        let mut reporter = ScoreReporter::new(false);
        reporter.set_high_score(60);

        let outcome = reporter.submit(&backend, Some(&token()), &finished(false, None, 3000)).await;
        assert_eq!(outcome, SubmitOutcome::Skipped(SkipReason::NotAHighScore { score: 60, high_score: 60 }));
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_key_in_anti_cheat_mode_is_noop() {
        let backend = MockBackend::new();
        let mut reporter = ScoreReporter::new(true);

        // Run started without anti-cheat, reported under anti-cheat rules.
        let outcome = reporter.submit(&backend, Some(&token()), &finished(false, None, 1000)).await;
        assert_eq!(outcome, SubmitOutcome::Skipped(SkipReason::MissingSessionKey));
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_no_token_is_noop() {
        let backend = MockBackend::new();
        let mut reporter = ScoreReporter::new(false);
        let outcome = reporter.submit(&backend, None, &finished(false, None, 1000)).await;
        assert_eq!(outcome, SubmitOutcome::Skipped(SkipReason::NoToken));
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_eligible_run_sends_exactly_once() {
        let backend = MockBackend::new();
        let mut reporter = ScoreReporter::new(true);
        reporter.set_high_score(10);

        let session = finished(true, Some("key-123"), 3000);
        let outcome = reporter.submit(&backend, Some(&token()), &session).await;

        assert_eq!(outcome, SubmitOutcome::Accepted { score: 60 });
        assert_eq!(backend.calls(paths::SCORE_UPDATE), 1);
        assert_eq!(backend.total_calls(), 1);
        assert_eq!(reporter.high_score(), 60);

        let sent = backend.submissions.lock().unwrap();
        assert_eq!(sent[0].session_key.as_ref().map(|k| k.as_str()), Some("key-123"));
        assert_eq!(sent[0].game_session.final_score, 60);
        assert_eq!(sent[0].game_session.run_id, session.run_id);
    }

    #[tokio::test]
    async fn test_rejection_keeps_high_score() {
        let backend = MockBackend::new();
        MockBackend::push(&backend.submit_score, Ok(ScoreUpdateResponse {
            success: false,
            message: Some("Score not higher".into()),
            error: None,
        }));
        let mut reporter = ScoreReporter::new(false);
        reporter.set_high_score(5);

        let outcome = reporter.submit(&backend, Some(&token()), &finished(false, None, 1000)).await;
        assert_eq!(outcome, SubmitOutcome::Rejected { message: "Score not higher".into() });
        assert_eq!(reporter.high_score(), 5);
    }

    #[tokio::test]
    async fn test_failure_not_retried() {
        let backend = MockBackend::new();
        MockBackend::push(&backend.submit_score, Err(BackendError::Timeout));
        let mut reporter = ScoreReporter::new(false);

        let outcome = reporter.submit(&backend, Some(&token()), &finished(false, None, 1000)).await;
        assert_eq!(outcome, SubmitOutcome::Failed(BackendError::Timeout));
        assert_eq!(backend.calls(paths::SCORE_UPDATE), 1);
        assert_eq!(reporter.high_score(), 0);
    }

    #[tokio::test]
    async fn test_voided_and_live_runs_skipped() {
        let backend = MockBackend::new();
        let mut reporter = ScoreReporter::new(false);

        let mut voided = finished(false, None, 1000);
        voided.submittable = false;
        assert_eq!(
            reporter.submit(&backend, Some(&token()), &voided).await,
            SubmitOutcome::Skipped(SkipReason::RunVoided),
        );

        let mut live = finished(false, None, 1000);
        live.active = true;
        assert_eq!(
            reporter.submit(&backend, Some(&token()), &live).await,
            SubmitOutcome::Skipped(SkipReason::RunNotFinished),
        );
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_truncated_log_skipped() {
        let backend = MockBackend::new();
        let mut reporter = ScoreReporter::new(false);
        let mut session = finished(false, None, 1000);
        session.events.clear();

        let outcome = reporter.submit(&backend, Some(&token()), &session).await;
        assert_eq!(outcome, SubmitOutcome::Skipped(SkipReason::InconsistentLog(EventLogError::Empty)));
        assert_eq!(backend.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_high_score() {
        let backend = MockBackend::new();
        MockBackend::push(&backend.user_score, Ok(UserScoreResponse { score: Some(250) }));
        MockBackend::push(&backend.user_score, Err(BackendError::Status(500)));
        let mut reporter = ScoreReporter::new(false);

        assert_eq!(reporter.refresh_high_score(&backend, Some(&token())).await, 250);
        assert_eq!(reporter.refresh_high_score(&backend, Some(&token())).await, 0);
        assert_eq!(reporter.refresh_high_score(&backend, None).await, 0);
        assert_eq!(backend.calls(paths::USER_SCORE), 2);
    }
}
