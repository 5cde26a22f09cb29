//! Game Logic Module
//!
//! Everything that runs while a run is live. Deterministic given the
//! session clock values passed in; no clocks, no network.
//!
//! ## Module Structure
//!
//! - `config`: Tunables and JSON overrides
//! - `difficulty`: Score-to-speed curve and the safe transition gate
//! - `obstacle`: Obstacle spawns on the traversal period
//! - `collision`: Hull and sample-point collision test
//! - `events`: Run event log
//! - `renderer`: Display seam and the headless renderer
//! - `session`: Run lifecycle and timer dispatch

pub mod config;
pub mod difficulty;
pub mod obstacle;
pub mod collision;
pub mod events;
pub mod renderer;
pub mod session;

// Re-export key types
pub use config::{GameConfig, ConfigError};
pub use difficulty::{DifficultyController, DifficultyState, DifficultyTier, BackgroundStage};
pub use obstacle::{ObstacleScheduler, ObstacleSize, ObstacleSpawn};
pub use collision::check_collision;
pub use events::{EventLog, GameEvent, GameEventKind};
pub use renderer::{Renderer, HeadlessRenderer, ObstacleProperties, GameOverView};
pub use session::{SessionManager, GameSession, SessionState, SessionError, JumpOutcome, EndReason, TimerKind};
