//! Network Layer
//!
//! Everything that talks to the backend or reads a real clock.
//! The game core in `game/` stays unaware of this layer; the client drives
//! it with session-clock milliseconds.

pub mod protocol;
pub mod backend;
pub mod http;
pub mod retry;
pub mod auth;
pub mod leaderboard;
pub mod reporter;
pub mod client;

pub use protocol::{ScoreSubmission, LeaderboardRow};
pub use backend::{Backend, BackendError};
pub use http::HttpBackend;
pub use retry::{Backoff, RetryPolicy};
pub use auth::{AuthToken, AuthError, TokenStore, MemoryTokenStore, Page, GuardDecision, guard_page, verify_token};
pub use leaderboard::{LeaderboardEntry, fetch_leaderboard};
pub use reporter::{ScoreReporter, SubmitOutcome, SkipReason};
pub use client::{GameClient, ClientConfig, ClientError};
