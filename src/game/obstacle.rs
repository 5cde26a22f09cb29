//! Obstacle Scheduler
//!
//! Varies the obstacle on a timer whose period is the current traversal
//! speed. Each spawn picks a size uniformly, tags the background variant and
//! restarts the sweep. The timer must be re-armed whenever the speed changes;
//! an interval left on a stale period drifts out of phase with the sweep.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::core::scheduler::{Scheduler, Ticket};
use crate::game::difficulty::BackgroundStage;
use crate::game::session::TimerKind;

/// Obstacle size class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleSize {
    /// Small.
    #[serde(rename = "s")]
    Small,
    /// Medium.
    #[serde(rename = "m")]
    Medium,
    /// Large.
    #[serde(rename = "l")]
    Large,
}

impl ObstacleSize {
    /// Short tag ("s", "m", "l").
    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleSize::Small => "s",
            ObstacleSize::Medium => "m",
            ObstacleSize::Large => "l",
        }
    }
}

/// One obstacle spawn, handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleSpawn {
    /// Size drawn for this spawn.
    pub size: ObstacleSize,
    /// Alternate art for the second background stage.
    pub alternate: bool,
    /// Sweep duration.
    pub traversal_ms: u64,
    /// When the sweep started (session clock).
    pub spawned_at_ms: u64,
}

/// Drives obstacle spawns.
#[derive(Clone, Debug)]
pub struct ObstacleScheduler {
    sizes: Vec<ObstacleSize>,
    rng: DeterministicRng,
    ticket: Option<Ticket>,
    last_spawn: Option<ObstacleSpawn>,
}

impl ObstacleScheduler {
    /// Create a scheduler drawing from `sizes`.
    pub fn new(sizes: Vec<ObstacleSize>, rng: DeterministicRng) -> Self {
        Self {
            sizes,
            rng,
            ticket: None,
            last_spawn: None,
        }
    }

    /// Replace the RNG (new run).
    pub fn reseed(&mut self, rng: DeterministicRng) {
        self.rng = rng;
    }

    /// Spawn now and every `speed_ms` after, replacing any running timer.
    pub fn activate(
        &mut self,
        timers: &mut Scheduler<TimerKind>,
        speed_ms: u64,
        background: BackgroundStage,
        now_ms: u64,
    ) -> ObstacleSpawn {
        timers.cancel_slot(&mut self.ticket);
        self.ticket = Some(timers.schedule_interval(TimerKind::ObstacleRespawn, speed_ms, now_ms));
        self.spawn(speed_ms, background, now_ms)
    }

    /// Cancel the spawn timer.
    pub fn deactivate(&mut self, timers: &mut Scheduler<TimerKind>) {
        timers.cancel_slot(&mut self.ticket);
    }

    /// Cancel the spawn timer, returning how long the current sweep had left.
    pub fn suspend(&mut self, timers: &mut Scheduler<TimerKind>, now_ms: u64) -> Option<u64> {
        let remaining = self
            .ticket
            .and_then(|t| timers.due_ms(t))
            .map(|due| due.saturating_sub(now_ms));
        self.deactivate(timers);
        remaining
    }

    /// Arm a one-shot respawn after `delay_ms`; the interval restarts when it
    /// fires.
    pub fn resume_after(&mut self, timers: &mut Scheduler<TimerKind>, delay_ms: u64, now_ms: u64) {
        timers.cancel_slot(&mut self.ticket);
        self.ticket = Some(timers.schedule_timeout(TimerKind::ObstacleRespawn, delay_ms, now_ms));
    }

    /// Handle a fired respawn timer. A consumed one-shot re-arms the
    /// interval; a live interval just spawns.
    pub fn on_fired(
        &mut self,
        timers: &mut Scheduler<TimerKind>,
        ticket: Ticket,
        speed_ms: u64,
        background: BackgroundStage,
        now_ms: u64,
    ) -> ObstacleSpawn {
        if timers.is_active(ticket) {
            self.spawn(speed_ms, background, now_ms)
        } else {
            self.activate(timers, speed_ms, background, now_ms)
        }
    }

    /// Forget the previous run's spawns.
    pub fn clear(&mut self) {
        self.last_spawn = None;
    }

    /// Draw a new obstacle.
    pub fn spawn(&mut self, speed_ms: u64, background: BackgroundStage, now_ms: u64) -> ObstacleSpawn {
        let size = self.rng.choose(&self.sizes).copied().unwrap_or(ObstacleSize::Medium);
        let spawn = ObstacleSpawn {
            size,
            alternate: background == BackgroundStage::Second,
            traversal_ms: speed_ms,
            spawned_at_ms: now_ms,
        };
        self.last_spawn = Some(spawn);
        spawn
    }

    /// Live timer ticket.
    pub fn ticket(&self) -> Option<Ticket> {
        self.ticket
    }

    /// Most recent spawn.
    pub fn last_spawn(&self) -> Option<&ObstacleSpawn> {
        self.last_spawn.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> ObstacleScheduler {
        ObstacleScheduler::new(
            vec![ObstacleSize::Small, ObstacleSize::Medium, ObstacleSize::Large],
            DeterministicRng::new(3),
        )
    }

    #[test]
    fn test_activate_spawns_immediately() {
        let mut timers = Scheduler::new();
        let mut obstacles = scheduler();

        let spawn = obstacles.activate(&mut timers, 4000, BackgroundStage::First, 100);
        assert_eq!(spawn.spawned_at_ms, 100);
        assert_eq!(spawn.traversal_ms, 4000);
        assert!(!spawn.alternate);
        assert_eq!(obstacles.last_spawn(), Some(&spawn));

        let fired = timers.pop_due(4100).unwrap();
        assert_eq!(fired.kind, TimerKind::ObstacleRespawn);
        assert_eq!(Some(fired.ticket), obstacles.ticket());
    }

    #[test]
    fn test_reactivate_replaces_timer() {
        let mut timers = Scheduler::new();
        let mut obstacles = scheduler();

        obstacles.activate(&mut timers, 4000, BackgroundStage::First, 0);
        let old = obstacles.ticket().unwrap();
        obstacles.activate(&mut timers, 3600, BackgroundStage::Second, 1000);
        let new = obstacles.ticket().unwrap();

        assert_ne!(old, new);
        assert!(!timers.is_active(old));
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_due_ms(), Some(4600));
    }

    #[test]
    fn test_alternate_variant_on_second_stage() {
        let mut obstacles = scheduler();
        assert!(obstacles.spawn(2800, BackgroundStage::Second, 0).alternate);
        assert!(!obstacles.spawn(2400, BackgroundStage::First, 0).alternate);
    }

    #[test]
    fn test_deactivate_is_idempotent() {
        let mut timers = Scheduler::new();
        let mut obstacles = scheduler();
        obstacles.activate(&mut timers, 4000, BackgroundStage::First, 0);
        obstacles.deactivate(&mut timers);
        obstacles.deactivate(&mut timers);
        assert!(timers.is_empty());
        assert!(obstacles.ticket().is_none());
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut timers = Scheduler::new();
        let mut obstacles = scheduler();
        obstacles.activate(&mut timers, 4000, BackgroundStage::First, 0);

        assert_eq!(obstacles.suspend(&mut timers, 1500), Some(2500));
        assert!(timers.is_empty());

        obstacles.resume_after(&mut timers, 2500, 9000);
        let fired = timers.pop_due(11_500).unwrap();
        assert!(!timers.is_active(fired.ticket));

        let spawn = obstacles.on_fired(&mut timers, fired.ticket, 4000, BackgroundStage::First, fired.at_ms);
        assert_eq!(spawn.spawned_at_ms, 11_500);
        assert_eq!(timers.next_due_ms(), Some(15_500));

        let next = timers.pop_due(15_500).unwrap();
        assert!(timers.is_active(next.ticket));
        obstacles.on_fired(&mut timers, next.ticket, 4000, BackgroundStage::First, next.at_ms);
        assert_eq!(Some(next.ticket), obstacles.ticket());
    }

    #[test]
    fn test_size_serde_tags() {
        assert_eq!(serde_json::to_string(&ObstacleSize::Large).unwrap(), "\"l\"");
        assert_eq!(ObstacleSize::Small.as_str(), "s");
    }
}
