//! Obstacle Integrity
//!
//! Compares what the renderer reports for the obstacle against what the core
//! last told it to show. Any drift means something outside the game edited
//! the obstacle, and the run is void.

use thiserror::Error;

use crate::game::obstacle::ObstacleSize;
use crate::game::renderer::ObstacleProperties;

/// Obstacle state the core expects to be on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedObstacle {
    /// Size of the last spawn.
    pub size: ObstacleSize,
    /// Traversal animation name.
    pub animation_name: String,
    /// Current traversal period.
    pub animation_duration_ms: u64,
}

/// Detected tampering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityViolation {
    /// Obstacle could not be read back.
    #[error("obstacle missing from renderer")]
    Missing,
    /// Obstacle was hidden.
    #[error("obstacle hidden")]
    Hidden,
    /// Size differs from the last spawn.
    #[error("obstacle size changed: expected {expected:?}, found {found:?}")]
    SizeChanged {
        /// Spawned size.
        expected: ObstacleSize,
        /// Rendered size.
        found: ObstacleSize,
    },
    /// Traversal animation swapped out.
    #[error("obstacle animation renamed to {0:?}")]
    AnimationRenamed(String),
    /// Traversal slowed down or sped up.
    #[error("obstacle animation duration {found}ms, expected {expected}ms")]
    DurationChanged {
        /// Current period.
        expected: u64,
        /// Rendered period.
        found: u64,
    },
}

/// Verify rendered obstacle properties.
pub fn verify_obstacle(
    expected: &ExpectedObstacle,
    observed: Option<&ObstacleProperties>,
) -> Result<(), IntegrityViolation> {
    let observed = observed.ok_or(IntegrityViolation::Missing)?;

    if !observed.visible {
        return Err(IntegrityViolation::Hidden);
    }
    if observed.size != expected.size {
        return Err(IntegrityViolation::SizeChanged {
            expected: expected.size,
            found: observed.size,
        });
    }
    if observed.animation_name != expected.animation_name {
        return Err(IntegrityViolation::AnimationRenamed(observed.animation_name.clone()));
    }
    if observed.animation_duration_ms != expected.animation_duration_ms {
        return Err(IntegrityViolation::DurationChanged {
            expected: expected.animation_duration_ms,
            found: observed.animation_duration_ms,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expected() -> ExpectedObstacle {
        ExpectedObstacle {
            size: ObstacleSize::Medium,
            animation_name: "move".into(),
            animation_duration_ms: 4000,
        }
    }

    fn observed() -> ObstacleProperties {
        ObstacleProperties {
            visible: true,
            size: ObstacleSize::Medium,
            animation_name: "move".into(),
            animation_duration_ms: 4000,
        }
    }

    #[test]
    fn test_untouched_passes() {
        assert!(verify_obstacle(&expected(), Some(&observed())).is_ok());
    }

    #[test]
    fn test_each_tamper_detected() {
        let e = expected();
        assert_eq!(verify_obstacle(&e, None), Err(IntegrityViolation::Missing));

        let hidden = ObstacleProperties { visible: false, ..observed() };
        assert_eq!(verify_obstacle(&e, Some(&hidden)), Err(IntegrityViolation::Hidden));

        let shrunk = ObstacleProperties { size: ObstacleSize::Small, ..observed() };
        assert!(matches!(verify_obstacle(&e, Some(&shrunk)), Err(IntegrityViolation::SizeChanged { .. })));

        let renamed = ObstacleProperties { animation_name: "none".into(), ..observed() };
        assert_eq!(
            verify_obstacle(&e, Some(&renamed)),
            Err(IntegrityViolation::AnimationRenamed("none".into()))
        );

        let slowed = ObstacleProperties { animation_duration_ms: 60_000, ..observed() };
        assert_eq!(
            verify_obstacle(&e, Some(&slowed)),
            Err(IntegrityViolation::DurationChanged { expected: 4000, found: 60_000 })
        );
    }
}
