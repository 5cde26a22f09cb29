//! Leaderboard
//!
//! Fetches the global ranking and fills in whatever the backend left out.

use serde::{Serialize, Deserialize};
use tracing::{instrument, warn};

use crate::network::backend::{Backend, BackendError};

/// Name shown for rows without a player.
pub const ANONYMOUS: &str = "Anonymous";

/// One normalized leaderboard row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Position; `None` renders as "N/A".
    pub rank: Option<u32>,
    /// Display name.
    pub player: String,
    /// Best score.
    pub score: u64,
}

impl LeaderboardEntry {
    /// Rank as displayed.
    pub fn rank_label(&self) -> String {
        self.rank.map(|r| r.to_string()).unwrap_or_else(|| "N/A".into())
    }
}

/// Fetch and normalize the leaderboard, best first as sent.
#[instrument(skip(backend))]
pub async fn fetch_leaderboard<B: Backend>(backend: &B) -> Result<Vec<LeaderboardEntry>, BackendError> {
    let response = backend.leaderboard().await?;
    if let Some(error) = response.error {
        warn!("Leaderboard unavailable: {}", error);
        return Err(BackendError::Rejected(error));
    }

    Ok(response
        .leaderboard
        .unwrap_or_default()
        .into_iter()
        .map(|row| LeaderboardEntry {
            rank: row.rank,
            player: row
                .player
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS.to_string()),
            score: row.score.unwrap_or(0),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::backend::mock::MockBackend;
    use crate::network::protocol::{LeaderboardResponse, LeaderboardRow};

    #[tokio::test]
    async fn test_rows_normalized() {
        let backend = MockBackend::new();
        MockBackend::push(&backend.leaderboard, Ok(LeaderboardResponse {
            leaderboard: Some(vec![
                LeaderboardRow { rank: Some(1), player: Some("ada".into()), score: Some(4200) },
                LeaderboardRow { rank: None, player: None, score: None },
                LeaderboardRow { rank: Some(3), player: Some("".into()), score: Some(10) },
            ]),
            error: None,
        }));

        let rows = fetch_leaderboard(&backend).await.unwrap();
        assert_eq!(rows[0], LeaderboardEntry { rank: Some(1), player: "ada".into(), score: 4200 });
        assert_eq!(rows[1].rank_label(), "N/A");
        assert_eq!(rows[1].player, ANONYMOUS);
        assert_eq!(rows[1].score, 0);
        assert_eq!(rows[2].player, ANONYMOUS);
    }

    #[tokio::test]
    async fn test_error_field_surfaces() {
        let backend = MockBackend::new();
        MockBackend::push(&backend.leaderboard, Ok(LeaderboardResponse {
            leaderboard: None,
            error: Some("database offline".into()),
        }));
        let err = fetch_leaderboard(&backend).await.unwrap_err();
        assert_eq!(err, BackendError::Rejected("database offline".into()));
    }

    #[tokio::test]
    async fn test_missing_list_is_empty() {
        let backend = MockBackend::new();
        assert!(fetch_leaderboard(&backend).await.unwrap().is_empty());
    }
}
