//! Game Events
//!
//! Append-only run log submitted as evidence with a score.
//!
//! Timestamps are milliseconds since run start and never decrease. Events are
//! only recorded while the run is active, except the terminal `collision` or
//! `integrity_violation` event which is recorded at the moment the run ends.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

use crate::core::hash::{EvidenceHash, EvidenceHasher};
use crate::game::difficulty::{AppliedChange, BackgroundStage};
use crate::game::obstacle::ObstacleSize;

/// Event type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventKind {
    /// Run started.
    GameStart,
    /// Jump accepted.
    Jump,
    /// Player hit the obstacle. Terminal.
    Collision,
    /// Difficulty tier committed.
    DifficultyChange,
    /// Obstacle respawned.
    ObstacleSpawn,
    /// Rendered obstacle was tampered with. Terminal.
    IntegrityViolation,
}

impl GameEventKind {
    /// Wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameEventKind::GameStart => "game_start",
            GameEventKind::Jump => "jump",
            GameEventKind::Collision => "collision",
            GameEventKind::DifficultyChange => "difficulty_change",
            GameEventKind::ObstacleSpawn => "obstacle_spawn",
            GameEventKind::IntegrityViolation => "integrity_violation",
        }
    }

    /// Ends the run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameEventKind::Collision | GameEventKind::IntegrityViolation)
    }
}

/// Type-specific event fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// Start parameters.
    #[serde(rename_all = "camelCase")]
    Start {
        /// Initial traversal period.
        speed_ms: u64,
        /// Initial jump duration.
        jump_duration_ms: u64,
    },
    /// Jump details.
    #[serde(rename_all = "camelCase")]
    Jump {
        /// Jump duration at the time of the jump.
        duration_ms: u64,
        /// Time since the last obstacle spawn.
        #[serde(skip_serializing_if = "Option::is_none")]
        reaction_ms: Option<u64>,
    },
    /// Tier change.
    #[serde(rename_all = "camelCase")]
    Difficulty {
        /// Previous traversal period.
        old_speed_ms: u64,
        /// New traversal period.
        new_speed_ms: u64,
        /// New jump duration.
        jump_duration_ms: u64,
        /// New background stage.
        background: BackgroundStage,
        /// Applied because the safety timeout fired.
        forced: bool,
    },
    /// Spawn details.
    #[serde(rename_all = "camelCase")]
    Spawn {
        /// Size drawn.
        size: ObstacleSize,
        /// Alternate art.
        alternate: bool,
        /// Traversal period of this sweep.
        traversal_ms: u64,
    },
    /// Violation description.
    Violation {
        /// What failed.
        reason: String,
    },
    /// No extra fields.
    Empty {},
}

/// One logged event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub kind: GameEventKind,
    /// Milliseconds since run start.
    pub timestamp_ms: u64,
    /// Score when the event was recorded.
    pub score_at_event: u64,
    /// Type-specific fields.
    pub payload: EventPayload,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(kind: GameEventKind, timestamp_ms: u64, score_at_event: u64, payload: EventPayload) -> Self {
        Self {
            kind,
            timestamp_ms,
            score_at_event,
            payload,
        }
    }

    /// Create game start event.
    pub fn game_start(speed_ms: u64, jump_duration_ms: u64) -> Self {
        Self::new(GameEventKind::GameStart, 0, 0, EventPayload::Start { speed_ms, jump_duration_ms })
    }

    /// Create jump event.
    pub fn jump(timestamp_ms: u64, score: u64, duration_ms: u64, reaction_ms: Option<u64>) -> Self {
        Self::new(GameEventKind::Jump, timestamp_ms, score, EventPayload::Jump { duration_ms, reaction_ms })
    }

    /// Create collision event.
    pub fn collision(timestamp_ms: u64, score: u64) -> Self {
        Self::new(GameEventKind::Collision, timestamp_ms, score, EventPayload::Empty {})
    }

    /// Create obstacle spawn event.
    pub fn obstacle_spawn(timestamp_ms: u64, score: u64, size: ObstacleSize, alternate: bool, traversal_ms: u64) -> Self {
        Self::new(
            GameEventKind::ObstacleSpawn,
            timestamp_ms,
            score,
            EventPayload::Spawn { size, alternate, traversal_ms },
        )
    }

    /// Create difficulty change event.
    pub fn difficulty_change(timestamp_ms: u64, score: u64, change: &AppliedChange) -> Self {
        Self::new(
            GameEventKind::DifficultyChange,
            timestamp_ms,
            score,
            EventPayload::Difficulty {
                old_speed_ms: change.from.speed_ms,
                new_speed_ms: change.to.speed_ms,
                jump_duration_ms: change.to.jump_duration_ms,
                background: change.to.background,
                forced: change.forced,
            },
        )
    }

    /// Create integrity violation event.
    pub fn integrity_violation(timestamp_ms: u64, score: u64, reason: impl Into<String>) -> Self {
        Self::new(
            GameEventKind::IntegrityViolation,
            timestamp_ms,
            score,
            EventPayload::Violation { reason: reason.into() },
        )
    }
}

/// Log consistency failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventLogError {
    /// Nothing logged.
    #[error("event log is empty")]
    Empty,
    /// First event is not `game_start`.
    #[error("event log does not begin with game_start")]
    MissingStart,
    /// More than one `game_start`.
    #[error("game_start recorded {0} times")]
    DuplicateStart(usize),
    /// Last event is not terminal.
    #[error("event log does not end with a terminal event")]
    MissingTerminal,
    /// A terminal event appears before the end.
    #[error("terminal event at index {0} is not last")]
    TerminalNotLast(usize),
    /// Timestamps go backwards.
    #[error("timestamp decreases at index {0}")]
    TimestampRegression(usize),
}

/// Append-only event log.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLog {
    events: Vec<GameEvent>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Its timestamp is raised to the previous one if it
    /// would otherwise go backwards.
    pub fn push(&mut self, mut event: GameEvent) {
        if let Some(last) = self.events.last() {
            if event.timestamp_ms < last.timestamp_ms {
                debug!(
                    "Clamping {} at {}ms to previous {}ms",
                    event.kind.as_str(),
                    event.timestamp_ms,
                    last.timestamp_ms,
                );
                event.timestamp_ms = last.timestamp_ms;
            }
        }
        self.events.push(event);
    }

    /// Drop every event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Logged events in order.
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Nothing logged.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Last event.
    pub fn last(&self) -> Option<&GameEvent> {
        self.events.last()
    }

    /// Number of events of `kind`.
    pub fn count(&self, kind: GameEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    /// Events of `kind`.
    pub fn of_kind(&self, kind: GameEventKind) -> impl Iterator<Item = &GameEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Run ended on a terminal event.
    pub fn is_closed(&self) -> bool {
        self.last().map_or(false, |e| e.kind.is_terminal())
    }

    /// Check a completed run's log: one `game_start` first, exactly one
    /// terminal event last, timestamps non-decreasing.
    pub fn check_consistency(&self) -> Result<(), EventLogError> {
        let first = self.events.first().ok_or(EventLogError::Empty)?;
        if first.kind != GameEventKind::GameStart {
            return Err(EventLogError::MissingStart);
        }

        let starts = self.count(GameEventKind::GameStart);
        if starts != 1 {
            return Err(EventLogError::DuplicateStart(starts));
        }

        let last_index = self.events.len() - 1;
        if let Some(i) = self.events[..last_index].iter().position(|e| e.kind.is_terminal()) {
            return Err(EventLogError::TerminalNotLast(i));
        }
        if !self.is_closed() {
            return Err(EventLogError::MissingTerminal);
        }

        for (i, pair) in self.events.windows(2).enumerate() {
            if pair[1].timestamp_ms < pair[0].timestamp_ms {
                return Err(EventLogError::TimestampRegression(i + 1));
            }
        }

        Ok(())
    }

    /// SHA-256 over the canonical event sequence.
    pub fn digest(&self) -> EvidenceHash {
        let mut hasher = EvidenceHasher::for_event_log();
        hasher.update_u64(self.events.len() as u64);
        for event in &self.events {
            hasher.update_str(event.kind.as_str());
            hasher.update_u64(event.timestamp_ms);
            hasher.update_u64(event.score_at_event);
            match &event.payload {
                EventPayload::Start { speed_ms, jump_duration_ms } => {
                    hasher.update_u64(*speed_ms);
                    hasher.update_u64(*jump_duration_ms);
                }
                EventPayload::Jump { duration_ms, reaction_ms } => {
                    hasher.update_u64(*duration_ms);
                    hasher.update_u64(reaction_ms.unwrap_or(u64::MAX));
                }
                EventPayload::Difficulty { old_speed_ms, new_speed_ms, jump_duration_ms, background, forced } => {
                    hasher.update_u64(*old_speed_ms);
                    hasher.update_u64(*new_speed_ms);
                    hasher.update_u64(*jump_duration_ms);
                    hasher.update_u8(background.number());
                    hasher.update_u8(*forced as u8);
                }
                EventPayload::Spawn { size, alternate, traversal_ms } => {
                    hasher.update_str(size.as_str());
                    hasher.update_u8(*alternate as u8);
                    hasher.update_u64(*traversal_ms);
                }
                EventPayload::Violation { reason } => hasher.update_str(reason),
                EventPayload::Empty {} => {}
            }
        }
        hasher.finalize()
    }
}
