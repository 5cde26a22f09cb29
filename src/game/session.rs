//! Session Manager
//!
//! Owns the single live run and every timer it started. All run state is
//! mutated here, from [`SessionManager::advance`] (timer callbacks) and the
//! input handlers, never concurrently.
//!
//! Time is passed in by the caller as milliseconds on a monotonic session
//! clock. Nothing in this module reads a clock.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::anticheat::integrity::{verify_obstacle, ExpectedObstacle, IntegrityViolation};
use crate::anticheat::session_key::SessionKey;
use crate::core::rng::DeterministicRng;
use crate::core::scheduler::{Fired, Scheduler, Ticket};
use crate::game::collision::check_collision_opt;
use crate::game::config::GameConfig;
use crate::game::difficulty::{AppliedChange, BackgroundStage, DifficultyController, DifficultyState, Hold};
use crate::game::events::{EventLog, EventPayload, GameEvent, GameEventKind};
use crate::game::obstacle::{ObstacleScheduler, ObstacleSpawn};
use crate::game::renderer::Renderer;

/// What a scheduled timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Add one point.
    ScoreIncrement,
    /// Integrity check, then collision check.
    CollisionPoll,
    /// Vary and restart the obstacle.
    ObstacleRespawn,
    /// Check whether a pending difficulty change can be applied.
    OffscreenPoll,
    /// Stop waiting for the obstacle to clear.
    DifficultyTimeout,
    /// Land the player.
    JumpEnd,
}

/// Lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No run yet.
    Idle,
    /// Run in progress (possibly paused).
    Active,
    /// Run over; score frozen.
    Stopped,
}

/// Why a run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// Player hit the obstacle.
    Collision,
    /// Rendered obstacle was tampered with.
    IntegrityViolation(IntegrityViolation),
    /// Player quit or restarted mid-run.
    Abandoned,
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A run is already in progress.
    #[error("a run is already active")]
    AlreadyActive,

    /// Anti-cheat is on and no session key was supplied.
    #[error("anti-cheat is enabled but no session key was issued")]
    MissingSessionKey,

    /// Operation needs an active run.
    #[error("no active run")]
    NotActive,

    /// Run is already paused.
    #[error("run is already paused")]
    AlreadyPaused,

    /// Run is not paused.
    #[error("run is not paused")]
    NotPaused,
}

/// Why a jump request was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoredJump {
    /// No active run.
    NotActive,
    /// Run is paused.
    Paused,
    /// Player is still in the air.
    Airborne,
    /// Too soon after the previous jump.
    Debounced,
}

/// Result of a jump request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpOutcome {
    /// Jump started.
    Accepted {
        /// Jump duration.
        duration_ms: u64,
        /// Time since the last obstacle spawn.
        reaction_ms: Option<u64>,
    },
    /// Jump dropped.
    Ignored(IgnoredJump),
}

/// What one call to [`SessionManager::advance`] did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Timers handled, in firing order.
    pub fired: Vec<Fired<TimerKind>>,
    /// Set if the run ended during this call.
    pub ended: Option<EndReason>,
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// One run.
#[derive(Clone, Debug)]
pub struct GameSession {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
    /// Session-clock start.
    pub start_ms: u64,
    /// Session-clock end, once stopped.
    pub ended_at_ms: Option<u64>,
    /// Run in progress.
    pub active: bool,
    /// Current score.
    pub score: u64,
    /// Event log.
    pub events: EventLog,
    /// Anti-cheat key bound at start.
    pub session_key: Option<SessionKey>,
    /// False once the run is void.
    pub submittable: bool,
    /// Player is airborne.
    pub jumping: bool,
    /// Last accepted jump, relative to start.
    pub last_jump_ms: Option<u64>,
    /// Last obstacle spawn, relative to start.
    pub last_spawn_ms: Option<u64>,
    /// Shortest traversal period reached.
    pub peak_speed_ms: u64,
    /// Highest background stage reached.
    pub max_background: BackgroundStage,
    /// Why the run ended.
    pub end_reason: Option<EndReason>,
}

impl GameSession {
    fn new(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        start_ms: u64,
        session_key: Option<SessionKey>,
        base: &DifficultyState,
    ) -> Self {
        Self {
            run_id,
            started_at,
            start_ms,
            ended_at_ms: None,
            active: true,
            score: 0,
            events: EventLog::new(),
            session_key,
            submittable: true,
            jumping: false,
            last_jump_ms: None,
            last_spawn_ms: None,
            peak_speed_ms: base.speed_ms,
            max_background: base.background,
            end_reason: None,
        }
    }

    /// Milliseconds since start.
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.start_ms)
    }

    /// Run length, once stopped.
    pub fn duration_ms(&self) -> Option<u64> {
        self.ended_at_ms.map(|end| self.elapsed_ms(end))
    }

    /// Wall-clock end, once stopped.
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        let duration = self.duration_ms()?;
        Some(self.started_at + chrono::Duration::milliseconds(duration as i64))
    }

    /// Accepted jumps.
    pub fn jump_count(&self) -> usize {
        self.events.count(GameEventKind::Jump)
    }

    /// Mean time from obstacle spawn to the next jump.
    pub fn average_reaction_ms(&self) -> Option<f64> {
        let reactions: Vec<u64> = self
            .events
            .of_kind(GameEventKind::Jump)
            .filter_map(|e| match e.payload {
                EventPayload::Jump { reaction_ms, .. } => reaction_ms,
                _ => None,
            })
            .collect();
        if reactions.is_empty() {
            return None;
        }
        Some(reactions.iter().sum::<u64>() as f64 / reactions.len() as f64)
    }

    fn record(&mut self, event: GameEvent) {
        self.events.push(event);
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

#[derive(Clone, Debug, Default)]
struct RunTimers {
    score: Option<Ticket>,
    collision: Option<Ticket>,
    offscreen: Option<Ticket>,
    safety: Option<Ticket>,
    jump_end: Option<Ticket>,
}

#[derive(Clone, Copy, Debug)]
struct Suspended {
    obstacle_remaining_ms: Option<u64>,
    jump_remaining_ms: Option<u64>,
    safety_remaining_ms: Option<u64>,
}

/// Drives runs against a renderer.
pub struct SessionManager<R: Renderer> {
    config: GameConfig,
    renderer: R,
    timers: Scheduler<TimerKind>,
    run_timers: RunTimers,
    difficulty: DifficultyController,
    obstacles: ObstacleScheduler,
    state: SessionState,
    session: Option<GameSession>,
    suspended: Option<Suspended>,
}

impl<R: Renderer> SessionManager<R> {
    /// Create an idle manager.
    pub fn new(config: GameConfig, renderer: R) -> Self {
        let difficulty = DifficultyController::new(config.difficulty.clone());
        let obstacles = ObstacleScheduler::new(config.obstacle.sizes.clone(), DeterministicRng::default());
        Self {
            config,
            renderer,
            timers: Scheduler::new(),
            run_timers: RunTimers::default(),
            difficulty,
            obstacles,
            state: SessionState::Idle,
            session: None,
            suspended: None,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Current or last run.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Difficulty controller.
    pub fn difficulty(&self) -> &DifficultyController {
        &self.difficulty
    }

    /// Timer table.
    pub fn timers(&self) -> &Scheduler<TimerKind> {
        &self.timers
    }

    /// Renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Run is paused.
    pub fn is_paused(&self) -> bool {
        self.suspended.is_some()
    }

    /// Earliest pending timer.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.next_due_ms()
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Start a fresh run at `now_ms`.
    ///
    /// With anti-cheat on, a session key is mandatory.
    pub fn start(
        &mut self,
        now_ms: u64,
        started_at: DateTime<Utc>,
        session_key: Option<SessionKey>,
    ) -> Result<&GameSession, SessionError> {
        if self.state == SessionState::Active {
            return Err(SessionError::AlreadyActive);
        }
        if self.config.anti_cheat && session_key.is_none() {
            return Err(SessionError::MissingSessionKey);
        }

        self.clear_run();

        let run_id = Uuid::new_v4();
        self.obstacles.reseed(DeterministicRng::for_run(run_id.as_bytes()));

        let base = *self.difficulty.state();
        let mut session = GameSession::new(run_id, started_at, now_ms, session_key, &base);
        session.record(GameEvent::game_start(base.speed_ms, base.jump_duration_ms));

        self.renderer.advance_to(now_ms);
        self.renderer.set_score(0);
        self.renderer.set_background_stage(base.background);
        self.renderer.set_obstacle_speed(base.speed_ms);

        let timing = &self.config.timing;
        self.run_timers.score = Some(self.timers.schedule_interval(TimerKind::ScoreIncrement, timing.score_increment_ms, now_ms));
        self.run_timers.collision = Some(self.timers.schedule_interval(TimerKind::CollisionPoll, timing.collision_check_ms, now_ms));

        let spawn = self.obstacles.activate(&mut self.timers, base.speed_ms, base.background, now_ms);
        self.session = Some(session);
        self.state = SessionState::Active;
        self.show_spawn(&spawn, now_ms);

        match self.session.as_ref() {
            Some(session) => {
                info!(
                    "Run {} started (anti-cheat: {}, key: {})",
                    session.run_id,
                    self.config.anti_cheat,
                    session.session_key.as_ref().map(|k| k.fingerprint()).unwrap_or_else(|| "none".into()),
                );
                Ok(session)
            }
            None => Err(SessionError::NotActive),
        }
    }

    /// End the run on a collision detected at `now_ms`.
    pub fn stop(&mut self, now_ms: u64) -> Result<(), SessionError> {
        self.end(EndReason::Collision, now_ms)
    }

    /// End the run without a terminal event. The run cannot be submitted.
    pub fn abandon(&mut self, now_ms: u64) -> Result<(), SessionError> {
        self.end(EndReason::Abandoned, now_ms)
    }

    /// Abandon any live run and start a new one.
    pub fn restart(
        &mut self,
        now_ms: u64,
        started_at: DateTime<Utc>,
        session_key: Option<SessionKey>,
    ) -> Result<&GameSession, SessionError> {
        if self.config.anti_cheat && session_key.is_none() {
            return Err(SessionError::MissingSessionKey);
        }
        if self.state == SessionState::Active {
            self.abandon(now_ms)?;
        }
        self.start(now_ms, started_at, session_key)
    }

    /// Drop everything and return to idle.
    pub fn reset(&mut self) {
        self.clear_run();
        self.session = None;
        self.state = SessionState::Idle;
    }

    fn clear_run(&mut self) {
        self.timers.cancel_all();
        self.run_timers = RunTimers::default();
        self.obstacles.deactivate(&mut self.timers);
        self.obstacles.clear();
        self.difficulty.reset();
        self.suspended = None;
        self.renderer.reset();
    }

    fn end(&mut self, reason: EndReason, now_ms: u64) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::NotActive);
        }

        self.timers.cancel_all();
        self.run_timers = RunTimers::default();
        self.obstacles.deactivate(&mut self.timers);
        self.difficulty.cancel_pending();
        self.suspended = None;
        self.renderer.advance_to(now_ms);
        self.renderer.freeze();
        self.state = SessionState::Stopped;

        let Some(session) = self.session.as_mut() else {
            return Err(SessionError::NotActive);
        };
        let elapsed = session.elapsed_ms(now_ms);
        session.active = false;
        session.jumping = false;
        session.ended_at_ms = Some(now_ms);

        match &reason {
            EndReason::Collision => {
                session.record(GameEvent::collision(elapsed, session.score));
                info!("Run {} ended by collision at {}ms, score {}", session.run_id, elapsed, session.score);
            }
            EndReason::IntegrityViolation(violation) => {
                session.submittable = false;
                session.record(GameEvent::integrity_violation(elapsed, session.score, violation.to_string()));
                warn!("Run {} voided: {}", session.run_id, violation);
            }
            EndReason::Abandoned => {
                session.submittable = false;
                info!("Run {} abandoned at {}ms", session.run_id, elapsed);
            }
        }
        session.end_reason = Some(reason);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    /// Request a jump at `now_ms`. Timers due by then are handled first.
    pub fn jump(&mut self, now_ms: u64) -> JumpOutcome {
        self.advance(now_ms);

        if self.state != SessionState::Active {
            return JumpOutcome::Ignored(IgnoredJump::NotActive);
        }
        if self.is_paused() {
            return JumpOutcome::Ignored(IgnoredJump::Paused);
        }

        let debounce = self.config.timing.jump_debounce_ms;
        let duration_ms = self.difficulty.state().jump_duration_ms;
        let Some(session) = self.session.as_mut() else {
            return JumpOutcome::Ignored(IgnoredJump::NotActive);
        };

        if session.jumping {
            return JumpOutcome::Ignored(IgnoredJump::Airborne);
        }
        let elapsed = session.elapsed_ms(now_ms);
        if let Some(last) = session.last_jump_ms {
            if elapsed.saturating_sub(last) < debounce {
                debug!("Jump at {}ms debounced", elapsed);
                return JumpOutcome::Ignored(IgnoredJump::Debounced);
            }
        }

        let reaction_ms = session.last_spawn_ms.map(|spawn| elapsed.saturating_sub(spawn));
        session.jumping = true;
        session.last_jump_ms = Some(elapsed);
        session.record(GameEvent::jump(elapsed, session.score, duration_ms, reaction_ms));

        self.renderer.play_jump_animation(duration_ms);
        self.timers.cancel_slot(&mut self.run_timers.jump_end);
        self.run_timers.jump_end = Some(self.timers.schedule_timeout(TimerKind::JumpEnd, duration_ms, now_ms));

        JumpOutcome::Accepted { duration_ms, reaction_ms }
    }

    /// Freeze the run. Timers are suspended with their remaining delays.
    pub fn pause(&mut self, now_ms: u64) -> Result<(), SessionError> {
        self.advance(now_ms);
        if self.state != SessionState::Active {
            return Err(SessionError::NotActive);
        }
        if self.is_paused() {
            return Err(SessionError::AlreadyPaused);
        }

        let remaining = |timers: &Scheduler<TimerKind>, slot: Option<Ticket>| {
            slot.and_then(|t| timers.due_ms(t)).map(|due| due.saturating_sub(now_ms))
        };
        let suspended = Suspended {
            obstacle_remaining_ms: self.obstacles.suspend(&mut self.timers, now_ms),
            jump_remaining_ms: remaining(&self.timers, self.run_timers.jump_end),
            safety_remaining_ms: remaining(&self.timers, self.run_timers.safety),
        };

        self.timers.cancel_slot(&mut self.run_timers.score);
        self.timers.cancel_slot(&mut self.run_timers.collision);
        self.timers.cancel_slot(&mut self.run_timers.offscreen);
        self.timers.cancel_slot(&mut self.run_timers.safety);
        self.timers.cancel_slot(&mut self.run_timers.jump_end);
        self.renderer.freeze();
        self.suspended = Some(suspended);
        debug!("Run paused at {}ms", now_ms);
        Ok(())
    }

    /// Continue a paused run from `now_ms`.
    pub fn resume(&mut self, now_ms: u64) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::NotActive);
        }
        let Some(suspended) = self.suspended.take() else {
            return Err(SessionError::NotPaused);
        };

        self.renderer.advance_to(now_ms);
        self.renderer.unfreeze();

        let timing = &self.config.timing;
        let speed_ms = self.difficulty.state().speed_ms;
        self.run_timers.score = Some(self.timers.schedule_interval(TimerKind::ScoreIncrement, timing.score_increment_ms, now_ms));
        self.run_timers.collision = Some(self.timers.schedule_interval(TimerKind::CollisionPoll, timing.collision_check_ms, now_ms));
        self.obstacles.resume_after(&mut self.timers, suspended.obstacle_remaining_ms.unwrap_or(speed_ms), now_ms);

        if let Some(delay) = suspended.jump_remaining_ms {
            self.run_timers.jump_end = Some(self.timers.schedule_timeout(TimerKind::JumpEnd, delay, now_ms));
        }
        if self.difficulty.is_pending() {
            self.arm_transition_polls(now_ms, suspended.safety_remaining_ms);
        }
        debug!("Run resumed at {}ms", now_ms);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Fire every timer due at or before `now_ms`, in order.
    pub fn advance(&mut self, now_ms: u64) -> TickReport {
        let mut report = TickReport::default();

        while self.state == SessionState::Active {
            let Some(fired) = self.timers.pop_due(now_ms) else {
                break;
            };
            self.renderer.advance_to(fired.at_ms);
            report.fired.push(fired.clone());

            if let Some(reason) = self.on_timer(&fired) {
                report.ended = Some(reason);
                break;
            }
        }

        if self.state == SessionState::Active {
            self.renderer.advance_to(now_ms);
        }
        report
    }

    fn on_timer(&mut self, fired: &Fired<TimerKind>) -> Option<EndReason> {
        let at = fired.at_ms;
        match fired.kind {
            TimerKind::ScoreIncrement => self.on_score_tick(at),
            TimerKind::CollisionPoll => return self.on_collision_poll(at),
            TimerKind::ObstacleRespawn => {
                let tier = self.difficulty.state().tier();
                let spawn = self.obstacles.on_fired(&mut self.timers, fired.ticket, tier.speed_ms, tier.background, at);
                self.show_spawn(&spawn, at);
            }
            TimerKind::OffscreenPoll => self.try_apply_difficulty(at),
            TimerKind::DifficultyTimeout => {
                self.run_timers.safety = None;
                self.difficulty.mark_timeout_elapsed();
                warn!("Obstacle did not clear within {}ms, forcing difficulty change", self.config.difficulty.safety_timeout_ms);
                self.try_apply_difficulty(at);
            }
            TimerKind::JumpEnd => {
                self.run_timers.jump_end = None;
                if let Some(session) = self.session.as_mut() {
                    session.jumping = false;
                }
                self.renderer.end_jump_animation();
            }
        }
        None
    }

    fn on_score_tick(&mut self, at: u64) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.score += 1;
        let score = session.score;
        self.renderer.set_score(score);

        if let Some(target) = self.difficulty.evaluate(score, at) {
            debug!(
                "Difficulty change pending at score {}: {}ms -> {}ms, background {}",
                score,
                self.difficulty.state().speed_ms,
                target.speed_ms,
                target.background.number(),
            );
            self.arm_transition_polls(at, None);
        }
    }

    fn arm_transition_polls(&mut self, now_ms: u64, safety_remaining_ms: Option<u64>) {
        let d = &self.config.difficulty;
        let safety_delay = safety_remaining_ms.unwrap_or(d.safety_timeout_ms);
        self.timers.cancel_slot(&mut self.run_timers.offscreen);
        self.run_timers.offscreen = Some(self.timers.schedule_interval(TimerKind::OffscreenPoll, d.offscreen_poll_ms, now_ms));

        let timeout_pending = matches!(
            self.difficulty.phase(),
            crate::game::difficulty::TransitionPhase::AwaitingSafeTransition { timeout_elapsed: false, .. }
        );
        if timeout_pending {
            self.timers.cancel_slot(&mut self.run_timers.safety);
            self.run_timers.safety = Some(self.timers.schedule_timeout(TimerKind::DifficultyTimeout, safety_delay, now_ms));
        }
    }

    fn on_collision_poll(&mut self, at: u64) -> Option<EndReason> {
        if self.config.anti_cheat {
            if let Some(expected) = self.expected_obstacle() {
                let observed = self.renderer.obstacle_properties();
                if let Err(violation) = verify_obstacle(&expected, observed.as_ref()) {
                    let reason = EndReason::IntegrityViolation(violation);
                    return self.end(reason.clone(), at).ok().map(|_| reason);
                }
            }
        }

        let hit = check_collision_opt(
            self.renderer.player_rect(),
            self.renderer.obstacle_rect(),
            &self.config.collision,
        );
        if hit {
            return self.end(EndReason::Collision, at).ok().map(|_| EndReason::Collision);
        }
        None
    }

    fn expected_obstacle(&self) -> Option<ExpectedObstacle> {
        let spawn = self.obstacles.last_spawn()?;
        Some(ExpectedObstacle {
            size: spawn.size,
            animation_name: self.config.obstacle.animation_name.clone(),
            animation_duration_ms: self.difficulty.state().speed_ms,
        })
    }

    fn obstacle_cleared(&self) -> bool {
        match (self.renderer.obstacle_rect(), self.renderer.container_rect()) {
            (Some(obstacle), Some(container)) => obstacle.is_left_of(&container),
            _ => false,
        }
    }

    fn try_apply_difficulty(&mut self, at: u64) {
        let cleared = self.obstacle_cleared();
        let jumping = self.session.as_ref().map_or(false, |s| s.jumping);

        match self.difficulty.try_apply(cleared, jumping) {
            Ok(change) => self.commit_difficulty(change, at),
            Err(Hold::NothingPending) => {
                self.timers.cancel_slot(&mut self.run_timers.offscreen);
                self.timers.cancel_slot(&mut self.run_timers.safety);
            }
            Err(Hold::ObstacleInFlight) | Err(Hold::PlayerMidJump) => {}
        }
    }

    fn commit_difficulty(&mut self, change: AppliedChange, at: u64) {
        self.timers.cancel_slot(&mut self.run_timers.offscreen);
        self.timers.cancel_slot(&mut self.run_timers.safety);

        let to = change.to;
        self.renderer.set_obstacle_speed(to.speed_ms);
        if to.background != change.from.background {
            self.renderer.set_background_stage(to.background);
        }

        if let Some(session) = self.session.as_mut() {
            let elapsed = session.elapsed_ms(at);
            session.peak_speed_ms = session.peak_speed_ms.min(to.speed_ms);
            session.max_background = session.max_background.max(to.background);
            session.record(GameEvent::difficulty_change(elapsed, session.score, &change));
            info!(
                "Run {} difficulty {}ms -> {}ms, jump {}ms, background {}{}",
                session.run_id,
                change.from.speed_ms,
                to.speed_ms,
                to.jump_duration_ms,
                to.background.number(),
                if change.forced { " (forced)" } else { "" },
            );
        }

        let spawn = self.obstacles.activate(&mut self.timers, to.speed_ms, to.background, at);
        self.show_spawn(&spawn, at);
    }

    fn show_spawn(&mut self, spawn: &ObstacleSpawn, at: u64) {
        self.renderer.spawn_obstacle(spawn);
        if let Some(session) = self.session.as_mut() {
            let elapsed = session.elapsed_ms(at);
            session.last_spawn_ms = Some(elapsed);
            session.record(GameEvent::obstacle_spawn(
                elapsed,
                session.score,
                spawn.size,
                spawn.alternate,
                spawn.traversal_ms,
            ));
        }
    }
}
