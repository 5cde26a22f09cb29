//! Collision Detection
//!
//! Hitboxes are rebuilt from the current on-screen boxes on every poll. The
//! obstacle is a quadrilateral inset from its bounding box; the player is a
//! handful of sample points. A hit is any sample inside the hull, which can
//! miss grazing contact between samples.

use crate::core::geometry::{Point, Rect, point_in_polygon};
use crate::game::config::{CollisionConfig, SampleAnchor};

/// Obstacle hull in screen space.
pub fn obstacle_hitbox(obstacle: &Rect, config: &CollisionConfig) -> Vec<Point> {
    config
        .obstacle_hull
        .iter()
        .map(|&(fx, fy)| obstacle.at_fraction(fx, fy))
        .collect()
}

/// Resolve one sample anchor against the player box.
#[inline]
pub fn sample_point(player: &Rect, anchor: &SampleAnchor) -> Point {
    match *anchor {
        SampleAnchor::Bottom { fx, inset_px } => {
            Point::new(player.left + player.width * fx, player.bottom() - inset_px)
        }
        SampleAnchor::Top { fx, inset_px } => {
            Point::new(player.left + player.width * fx, player.top + inset_px)
        }
        SampleAnchor::Fraction { fx, fy } => player.at_fraction(fx, fy),
    }
}

/// Player sample points in screen space.
pub fn player_samples(player: &Rect, config: &CollisionConfig) -> Vec<Point> {
    config
        .player_samples
        .iter()
        .map(|anchor| sample_point(player, anchor))
        .collect()
}

/// True if any player sample lies inside the obstacle hull.
pub fn check_collision(player: &Rect, obstacle: &Rect, config: &CollisionConfig) -> bool {
    let hull = obstacle_hitbox(obstacle, config);
    config
        .player_samples
        .iter()
        .any(|anchor| point_in_polygon(sample_point(player, anchor), &hull))
}

/// Same as [`check_collision`] for optional geometry. Unmeasurable boxes
/// never collide.
pub fn check_collision_opt(player: Option<Rect>, obstacle: Option<Rect>, config: &CollisionConfig) -> bool {
    match (player, obstacle) {
        (Some(p), Some(o)) => check_collision(&p, &o, config),
        _ => false,
    }
}
