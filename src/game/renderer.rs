//! Renderer Seam
//!
//! The game core never touches a display. It reads on-screen geometry and
//! pushes visual state through [`Renderer`]. [`HeadlessRenderer`] is a
//! kinematic stand-in used by the demo binary and the tests: the obstacle
//! sweeps linearly across the container and the player follows a parabolic
//! jump arc.

use serde::{Serialize, Deserialize};

use crate::core::geometry::Rect;
use crate::game::difficulty::BackgroundStage;
use crate::game::obstacle::{ObstacleSize, ObstacleSpawn};

/// Obstacle state as actually rendered, read back for integrity checks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleProperties {
    /// Obstacle is displayed.
    pub visible: bool,
    /// Size class currently applied.
    pub size: ObstacleSize,
    /// Running traversal animation.
    pub animation_name: String,
    /// Traversal animation duration.
    pub animation_duration_ms: u64,
}

/// What the game-over screen shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameOverView {
    /// Final score.
    pub score: u64,
    /// High score after submission settled.
    pub high_score: u64,
    /// Message for the player, if any.
    pub notice: Option<String>,
}

/// Display collaborator.
///
/// Geometry queries return `None` when the element cannot be measured.
pub trait Renderer {
    /// Bring time-dependent visuals up to `now_ms` before the core reads them.
    fn advance_to(&mut self, _now_ms: u64) {}

    /// Player bounding box.
    fn player_rect(&self) -> Option<Rect>;

    /// Obstacle bounding box.
    fn obstacle_rect(&self) -> Option<Rect>;

    /// Play area bounding box.
    fn container_rect(&self) -> Option<Rect>;

    /// Obstacle render state.
    fn obstacle_properties(&self) -> Option<ObstacleProperties>;

    /// Set the traversal animation duration.
    fn set_obstacle_speed(&mut self, speed_ms: u64);

    /// Apply a new obstacle shape and restart its sweep.
    fn spawn_obstacle(&mut self, spawn: &ObstacleSpawn);

    /// Swap the backdrop.
    fn set_background_stage(&mut self, stage: BackgroundStage);

    /// Start the jump animation.
    fn play_jump_animation(&mut self, duration_ms: u64);

    /// Land the player.
    fn end_jump_animation(&mut self);

    /// Show the running score.
    fn set_score(&mut self, score: u64);

    /// Show the high score.
    fn set_high_score(&mut self, high_score: u64);

    /// Stop every animation in place.
    fn freeze(&mut self);

    /// Continue animations after [`Renderer::freeze`].
    fn unfreeze(&mut self);

    /// Present the game-over affordances.
    fn show_game_over(&mut self, view: &GameOverView);

    /// Return to the pre-game layout.
    fn reset(&mut self);
}

// =============================================================================
// HEADLESS RENDERER
// =============================================================================

/// Play area width.
pub const CONTAINER_WIDTH: f64 = 800.0;
/// Play area height; the ground is the container's bottom edge.
pub const CONTAINER_HEIGHT: f64 = 300.0;
/// Player left edge.
pub const PLAYER_X: f64 = 80.0;
/// Player box size.
pub const PLAYER_SIZE: f64 = 60.0;
/// Apex of the jump arc above the ground.
pub const JUMP_HEIGHT: f64 = 180.0;
/// Sweep overshoot past the left edge, as a fraction of container width.
pub const SWEEP_OVERSHOOT: f64 = 0.2;

/// Pixel size of an obstacle class.
pub fn obstacle_dimensions(size: ObstacleSize) -> (f64, f64) {
    match size {
        ObstacleSize::Small => (30.0, 40.0),
        ObstacleSize::Medium => (40.0, 60.0),
        ObstacleSize::Large => (50.0, 80.0),
    }
}

#[derive(Clone, Copy, Debug)]
struct Jump {
    started_at_ms: u64,
    duration_ms: u64,
}

/// Kinematic renderer without a display.
#[derive(Clone, Debug)]
pub struct HeadlessRenderer {
    now_ms: u64,
    frozen_at_ms: Option<u64>,
    container: Rect,
    jump: Option<Jump>,
    obstacle: Option<ObstacleSpawn>,
    animation_name: String,
    animation_duration_ms: u64,
    background: BackgroundStage,
    score: u64,
    high_score: u64,
    game_over: Option<GameOverView>,
    tampered: Option<ObstacleProperties>,
    pinned: Option<f64>,
    spawn_count: u64,
}

impl HeadlessRenderer {
    /// Create a renderer whose sweep animation is called `animation_name`.
    pub fn new(animation_name: impl Into<String>) -> Self {
        Self {
            now_ms: 0,
            frozen_at_ms: None,
            container: Rect::new(0.0, 0.0, CONTAINER_WIDTH, CONTAINER_HEIGHT),
            jump: None,
            obstacle: None,
            animation_name: animation_name.into(),
            animation_duration_ms: 0,
            background: BackgroundStage::First,
            score: 0,
            high_score: 0,
            game_over: None,
            tampered: None,
            pinned: None,
            spawn_count: 0,
        }
    }

    fn visual_time(&self) -> u64 {
        self.frozen_at_ms.unwrap_or(self.now_ms)
    }

    /// Sweep progress of the current obstacle, 0.0 to 1.0.
    pub fn sweep_progress(&self) -> Option<f64> {
        let spawn = self.obstacle?;
        if let Some(progress) = self.pinned {
            return Some(progress);
        }
        let elapsed = self.visual_time().saturating_sub(spawn.spawned_at_ms) as f64;
        Some((elapsed / spawn.traversal_ms.max(1) as f64).min(1.0))
    }

    /// Horizontal gap between the player's front and the obstacle's left edge.
    pub fn obstacle_gap(&self) -> Option<f64> {
        Some(self.obstacle_rect()?.left - (PLAYER_X + PLAYER_SIZE))
    }

    /// Player is off the ground.
    pub fn is_airborne(&self) -> bool {
        self.jump.is_some()
    }

    /// Score last pushed by the core.
    pub fn score(&self) -> u64 {
        self.score
    }

    /// High score last pushed by the core.
    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    /// Background last pushed by the core.
    pub fn background(&self) -> BackgroundStage {
        self.background
    }

    /// Game-over screen, if shown.
    pub fn game_over(&self) -> Option<&GameOverView> {
        self.game_over.as_ref()
    }

    /// Number of spawns since construction.
    pub fn spawn_count(&self) -> u64 {
        self.spawn_count
    }

    /// Animations are stopped.
    pub fn is_frozen(&self) -> bool {
        self.frozen_at_ms.is_some()
    }

    /// Report `props` instead of the real obstacle state, as an external
    /// script editing the page would.
    pub fn tamper_obstacle(&mut self, props: ObstacleProperties) {
        self.tampered = Some(props);
    }

    /// Hold the obstacle at a sweep fraction across respawns, as a stuck
    /// animation would.
    pub fn pin_obstacle_at(&mut self, progress: f64) {
        self.pinned = Some(progress.clamp(0.0, 1.0));
    }

    /// Release [`HeadlessRenderer::pin_obstacle_at`].
    pub fn unpin_obstacle(&mut self) {
        self.pinned = None;
    }
}

impl Renderer for HeadlessRenderer {
    fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    fn player_rect(&self) -> Option<Rect> {
        let ground_top = self.container.bottom() - PLAYER_SIZE;
        let lift = match self.jump {
            Some(jump) => {
                let t = self.visual_time().saturating_sub(jump.started_at_ms) as f64
                    / jump.duration_ms.max(1) as f64;
                let t = t.clamp(0.0, 1.0);
                JUMP_HEIGHT * 4.0 * t * (1.0 - t)
            }
            None => 0.0,
        };
        Some(Rect::new(PLAYER_X, ground_top - lift, PLAYER_SIZE, PLAYER_SIZE))
    }

    fn obstacle_rect(&self) -> Option<Rect> {
        let spawn = self.obstacle?;
        let (w, h) = obstacle_dimensions(spawn.size);
        let start = self.container.right();
        let end = self.container.left - self.container.width * SWEEP_OVERSHOOT - w;
        let left = start + (end - start) * self.sweep_progress()?;
        Some(Rect::new(left, self.container.bottom() - h, w, h))
    }

    fn container_rect(&self) -> Option<Rect> {
        Some(self.container)
    }

    fn obstacle_properties(&self) -> Option<ObstacleProperties> {
        if let Some(props) = &self.tampered {
            return Some(props.clone());
        }
        let spawn = self.obstacle?;
        Some(ObstacleProperties {
            visible: true,
            size: spawn.size,
            animation_name: self.animation_name.clone(),
            animation_duration_ms: self.animation_duration_ms,
        })
    }

    fn set_obstacle_speed(&mut self, speed_ms: u64) {
        self.animation_duration_ms = speed_ms;
    }

    fn spawn_obstacle(&mut self, spawn: &ObstacleSpawn) {
        self.obstacle = Some(*spawn);
        self.animation_duration_ms = spawn.traversal_ms;
        self.spawn_count += 1;
    }

    fn set_background_stage(&mut self, stage: BackgroundStage) {
        self.background = stage;
    }

    fn play_jump_animation(&mut self, duration_ms: u64) {
        self.jump = Some(Jump {
            started_at_ms: self.now_ms,
            duration_ms,
        });
    }

    fn end_jump_animation(&mut self) {
        self.jump = None;
    }

    fn set_score(&mut self, score: u64) {
        self.score = score;
    }

    fn set_high_score(&mut self, high_score: u64) {
        self.high_score = high_score;
    }

    fn freeze(&mut self) {
        if self.frozen_at_ms.is_none() {
            self.frozen_at_ms = Some(self.now_ms);
        }
    }

    fn unfreeze(&mut self) {
        if let Some(frozen_at) = self.frozen_at_ms.take() {
            let paused = self.now_ms.saturating_sub(frozen_at);
            if let Some(jump) = self.jump.as_mut() {
                jump.started_at_ms += paused;
            }
            if let Some(spawn) = self.obstacle.as_mut() {
                spawn.spawned_at_ms += paused;
            }
        }
    }

    fn show_game_over(&mut self, view: &GameOverView) {
        self.game_over = Some(view.clone());
    }

    fn reset(&mut self) {
        let name = std::mem::take(&mut self.animation_name);
        let high_score = self.high_score;
        let spawn_count = self.spawn_count;
        let now_ms = self.now_ms;
        *self = Self::new(name);
        self.high_score = high_score;
        self.spawn_count = spawn_count;
        self.now_ms = now_ms;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(size: ObstacleSize, at: u64) -> ObstacleSpawn {
        ObstacleSpawn {
            size,
            alternate: false,
            traversal_ms: 4000,
            spawned_at_ms: at,
        }
    }

    #[test]
    fn test_obstacle_sweeps_right_to_left() {
        let mut r = HeadlessRenderer::new("move");
        r.spawn_obstacle(&spawn(ObstacleSize::Medium, 0));

        let start = r.obstacle_rect().unwrap();
        assert_eq!(start.left, CONTAINER_WIDTH);
        assert_eq!(start.bottom(), CONTAINER_HEIGHT);

        r.advance_to(2000);
        let mid = r.obstacle_rect().unwrap();
        assert!(mid.left < start.left);

        r.advance_to(4000);
        let end = r.obstacle_rect().unwrap();
        let container = r.container_rect().unwrap();
        assert!(end.is_left_of(&container));
    }

    #[test]
    fn test_jump_arc_peaks_midway() {
        let mut r = HeadlessRenderer::new("move");
        let ground = r.player_rect().unwrap();
        r.play_jump_animation(1000);
        r.advance_to(500);
        let apex = r.player_rect().unwrap();
        assert!((ground.top - apex.top - JUMP_HEIGHT).abs() < 1e-9);

        r.end_jump_animation();
        assert_eq!(r.player_rect().unwrap(), ground);
    }

    #[test]
    fn test_freeze_holds_positions() {
        let mut r = HeadlessRenderer::new("move");
        r.spawn_obstacle(&spawn(ObstacleSize::Small, 0));
        r.advance_to(1000);
        r.freeze();
        let held = r.obstacle_rect().unwrap();
        r.advance_to(3000);
        assert_eq!(r.obstacle_rect().unwrap(), held);

        r.unfreeze();
        assert_eq!(r.obstacle_rect().unwrap(), held);
        r.advance_to(3500);
        assert!(r.obstacle_rect().unwrap().left < held.left);
    }

    #[test]
    fn test_properties_and_tamper() {
        let mut r = HeadlessRenderer::new("move");
        assert!(r.obstacle_properties().is_none());
        r.spawn_obstacle(&spawn(ObstacleSize::Large, 0));

        let props = r.obstacle_properties().unwrap();
        assert!(props.visible);
        assert_eq!(props.size, ObstacleSize::Large);
        assert_eq!(props.animation_name, "move");
        assert_eq!(props.animation_duration_ms, 4000);

        r.tamper_obstacle(ObstacleProperties { visible: false, ..props });
        assert!(!r.obstacle_properties().unwrap().visible);
    }

    #[test]
    fn test_pin_obstacle() {
        let mut r = HeadlessRenderer::new("move");
        r.spawn_obstacle(&spawn(ObstacleSize::Small, 0));
        r.advance_to(100);
        r.pin_obstacle_at(0.5);
        assert_eq!(r.sweep_progress(), Some(0.5));
        r.advance_to(50_000);
        r.spawn_obstacle(&spawn(ObstacleSize::Medium, 50_000));
        assert_eq!(r.sweep_progress(), Some(0.5));

        r.unpin_obstacle();
        assert_eq!(r.sweep_progress(), Some(0.0));
    }

    #[test]
    fn test_reset_keeps_high_score() {
        let mut r = HeadlessRenderer::new("move");
        r.set_high_score(42);
        r.set_score(10);
        r.spawn_obstacle(&spawn(ObstacleSize::Small, 0));
        r.freeze();
        r.reset();
        assert_eq!(r.high_score(), 42);
        assert_eq!(r.score(), 0);
        assert!(!r.is_frozen());
        assert!(r.obstacle_rect().is_none());
        assert_eq!(r.spawn_count(), 1);
    }
}
