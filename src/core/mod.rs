//! Core deterministic primitives.
//!
//! Nothing in here touches a clock, the network or a renderer.

pub mod geometry;
pub mod scheduler;
pub mod rng;
pub mod hash;

// Re-export core types
pub use geometry::{Point, Rect, point_in_polygon};
pub use scheduler::{Scheduler, Ticket, Fired};
pub use rng::DeterministicRng;
pub use hash::{EvidenceHash, EvidenceHasher};
