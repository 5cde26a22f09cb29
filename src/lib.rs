//! # Hurdle Runner
//!
//! Endless-runner game core with adaptive difficulty and anti-cheat score
//! submission.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       HURDLE RUNNER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── geometry.rs - Points, rects, point-in-polygon           │
//! │  ├── scheduler.rs- Virtual-time timers                       │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── hash.rs     - Domain-separated SHA-256                  │
//! │                                                              │
//! │  game/           - Game logic (no clocks, no network)        │
//! │  ├── config.rs   - Tunables and JSON overrides               │
//! │  ├── difficulty.rs - Speed curve and safe transitions        │
//! │  ├── obstacle.rs - Obstacle spawns                           │
//! │  ├── collision.rs- Hull vs sample-point collision            │
//! │  ├── events.rs   - Run event log                             │
//! │  ├── renderer.rs - Display seam, headless renderer           │
//! │  └── session.rs  - Run lifecycle and timer dispatch          │
//! │                                                              │
//! │  anticheat/      - Session keys, integrity, evidence         │
//! │                                                              │
//! │  network/        - Backend (non-deterministic)               │
//! │  ├── backend.rs  - Backend trait                             │
//! │  ├── http.rs     - reqwest implementation                    │
//! │  ├── auth.rs     - Tokens and page guard                     │
//! │  ├── reporter.rs - Score submission                          │
//! │  └── client.rs   - Async driver                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! `core/` and `game/` never read a clock. Every operation takes the current
//! session time in milliseconds, and obstacle sizes come from a PRNG seeded
//! by the run id. Feeding the same times to the same run replays it exactly.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod anticheat;
pub mod network;

// Re-export commonly used types
pub use core::geometry::{Point, Rect};
pub use core::rng::DeterministicRng;
pub use game::config::GameConfig;
pub use game::renderer::{Renderer, HeadlessRenderer};
pub use game::session::{SessionManager, GameSession};
pub use network::backend::Backend;
pub use network::client::{GameClient, ClientConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
