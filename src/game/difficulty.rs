//! Difficulty Controller
//!
//! Maps score to obstacle speed, jump duration and background stage, and
//! defers applying a new tier until the obstacle in flight has left the
//! screen. Changing the traversal period mid-sweep would snap the obstacle
//! to a new position.
//!
//! ```text
//!            evaluate(score) finds a new tier
//!   Stable ──────────────────────────────────▶ AwaitingSafeTransition
//!     ▲                                              │
//!     └──── try_apply: cleared (or timed out), ──────┘
//!           player on the ground
//! ```

use serde::{Serialize, Deserialize};

use crate::game::config::DifficultyConfig;

// =============================================================================
// CURVES
// =============================================================================

/// Obstacle traversal period for a score.
///
/// `max(min, base - floor(score / step) * speed_step)`.
pub fn calculate_speed(score: u64, config: &DifficultyConfig) -> u64 {
    let steps = score / config.score_step.max(1);
    let reduction = steps.saturating_mul(config.speed_step_ms);
    config.base_speed_ms
        .saturating_sub(reduction)
        .max(config.min_speed_ms)
}

/// Jump duration for a traversal period; shrinks proportionally with speed.
pub fn calculate_jump_duration(speed_ms: u64, config: &DifficultyConfig) -> u64 {
    let ratio = speed_ms as f64 / config.base_speed_ms.max(1) as f64;
    let scaled = config.base_jump_duration_ms as f64 * ratio;
    scaled.max(config.min_jump_duration_ms as f64).round() as u64
}

/// Background stage for a score.
///
/// Below the threshold the current stage is kept. From the threshold on,
/// even bands show the second stage and odd bands the first.
pub fn calculate_background(
    score: u64,
    current: BackgroundStage,
    config: &DifficultyConfig,
) -> BackgroundStage {
    if score < config.background_threshold {
        return current;
    }
    let band = (score - config.background_threshold) / config.background_band.max(1);
    if band % 2 == 0 {
        BackgroundStage::Second
    } else {
        BackgroundStage::First
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Which backdrop (and obstacle variant) is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum BackgroundStage {
    /// Stage 1.
    #[default]
    First,
    /// Stage 2, which also switches obstacles to their alternate art.
    Second,
}

impl BackgroundStage {
    /// Stage number as shown to the backend (1 or 2).
    pub fn number(self) -> u8 {
        match self {
            BackgroundStage::First => 1,
            BackgroundStage::Second => 2,
        }
    }
}

impl From<BackgroundStage> for u8 {
    fn from(stage: BackgroundStage) -> u8 {
        stage.number()
    }
}

impl TryFrom<u8> for BackgroundStage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(BackgroundStage::First),
            2 => Ok(BackgroundStage::Second),
            other => Err(format!("background stage must be 1 or 2, got {}", other)),
        }
    }
}

/// A full difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyTier {
    /// Obstacle traversal period.
    pub speed_ms: u64,
    /// Jump duration.
    pub jump_duration_ms: u64,
    /// Background stage.
    pub background: BackgroundStage,
}

/// Live difficulty values plus the change waiting to be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DifficultyState {
    /// Current obstacle traversal period.
    pub speed_ms: u64,
    /// Current jump duration.
    pub jump_duration_ms: u64,
    /// Current background stage.
    pub background: BackgroundStage,
    /// Present only between detecting a new tier and applying it.
    pub pending_change: Option<DifficultyTier>,
}

impl DifficultyState {
    /// Base values for a fresh run.
    pub fn base(config: &DifficultyConfig) -> Self {
        Self {
            speed_ms: config.base_speed_ms,
            jump_duration_ms: config.base_jump_duration_ms,
            background: BackgroundStage::First,
            pending_change: None,
        }
    }

    /// Current tier without the pending record.
    pub fn tier(&self) -> DifficultyTier {
        DifficultyTier {
            speed_ms: self.speed_ms,
            jump_duration_ms: self.jump_duration_ms,
            background: self.background,
        }
    }
}

/// Transition phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    /// No change pending.
    Stable,
    /// A change is pending until the obstacle clears.
    AwaitingSafeTransition {
        /// When the change was detected.
        since_ms: u64,
        /// The safety timeout fired; off-screen gating no longer applies.
        timeout_elapsed: bool,
    },
}

/// Tier change that was just committed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedChange {
    /// Tier before the change.
    pub from: DifficultyTier,
    /// Tier after the change.
    pub to: DifficultyTier,
    /// Whether it went through because the safety timeout fired.
    pub forced: bool,
}

/// Why a pending change was not applied on this poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Hold {
    /// Nothing is pending.
    NothingPending,
    /// Obstacle still on screen and the timeout has not fired.
    ObstacleInFlight,
    /// Player is airborne.
    PlayerMidJump,
}

// =============================================================================
// CONTROLLER
// =============================================================================

/// Owns [`DifficultyState`] and the transition phase.
#[derive(Clone, Debug)]
pub struct DifficultyController {
    config: DifficultyConfig,
    state: DifficultyState,
    phase: TransitionPhase,
}

impl DifficultyController {
    /// Create a controller at base difficulty.
    pub fn new(config: DifficultyConfig) -> Self {
        let state = DifficultyState::base(&config);
        Self {
            config,
            state,
            phase: TransitionPhase::Stable,
        }
    }

    /// Back to base values with nothing pending.
    pub fn reset(&mut self) {
        self.state = DifficultyState::base(&self.config);
        self.phase = TransitionPhase::Stable;
    }

    /// Current state.
    pub fn state(&self) -> &DifficultyState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Configuration in use.
    pub fn config(&self) -> &DifficultyConfig {
        &self.config
    }

    /// True while a change waits for a safe moment.
    pub fn is_pending(&self) -> bool {
        matches!(self.phase, TransitionPhase::AwaitingSafeTransition { .. })
    }

    /// Tier the given score calls for.
    pub fn target_for(&self, score: u64) -> DifficultyTier {
        let speed_ms = calculate_speed(score, &self.config);
        DifficultyTier {
            speed_ms,
            jump_duration_ms: calculate_jump_duration(speed_ms, &self.config),
            background: calculate_background(score, self.state.background, &self.config),
        }
    }

    /// Re-evaluate after a score change.
    ///
    /// Returns the newly pending tier when this call moved the controller
    /// from `Stable` to `AwaitingSafeTransition`. While a change is already
    /// pending nothing is recorded.
    pub fn evaluate(&mut self, score: u64, now_ms: u64) -> Option<DifficultyTier> {
        if self.is_pending() {
            return None;
        }

        let target = self.target_for(score);
        if target == self.state.tier() {
            return None;
        }

        self.state.pending_change = Some(target);
        self.phase = TransitionPhase::AwaitingSafeTransition {
            since_ms: now_ms,
            timeout_elapsed: false,
        };
        Some(target)
    }

    /// Note that the safety timeout fired.
    pub fn mark_timeout_elapsed(&mut self) {
        if let TransitionPhase::AwaitingSafeTransition { since_ms, .. } = self.phase {
            self.phase = TransitionPhase::AwaitingSafeTransition {
                since_ms,
                timeout_elapsed: true,
            };
        }
    }

    /// Commit the pending tier if it is safe to do so.
    ///
    /// Safe means the obstacle has cleared the play area or the safety
    /// timeout has fired, and (when configured) the player is not mid-jump.
    /// An airborne player defers the change even after the timeout.
    pub fn try_apply(&mut self, obstacle_cleared: bool, player_jumping: bool) -> Result<AppliedChange, Hold> {
        let TransitionPhase::AwaitingSafeTransition { timeout_elapsed, .. } = self.phase else {
            return Err(Hold::NothingPending);
        };
        let Some(target) = self.state.pending_change else {
            return Err(Hold::NothingPending);
        };

        if !obstacle_cleared && !timeout_elapsed {
            return Err(Hold::ObstacleInFlight);
        }
        if self.config.defer_during_jump && player_jumping {
            return Err(Hold::PlayerMidJump);
        }

        let from = self.state.tier();
        self.state.speed_ms = target.speed_ms;
        self.state.jump_duration_ms = target.jump_duration_ms;
        self.state.background = target.background;
        self.state.pending_change = None;
        self.phase = TransitionPhase::Stable;

        Ok(AppliedChange {
            from,
            to: target,
            forced: !obstacle_cleared,
        })
    }

    /// Drop any pending change (run ended).
    pub fn cancel_pending(&mut self) {
        self.state.pending_change = None;
        self.phase = TransitionPhase::Stable;
    }
}
