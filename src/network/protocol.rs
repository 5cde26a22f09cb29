//! Protocol Messages
//!
//! Request and response bodies of the backend HTTP API. Field names follow
//! the backend's JSON exactly; optional fields are tolerated on read so a
//! sparse or partially broken response degrades instead of failing to parse.

use serde::{Serialize, Deserialize};

use crate::anticheat::evidence::GameSessionEvidence;
use crate::anticheat::session_key::SessionKey;

/// Endpoint paths.
pub mod paths {
    /// `GET` leaderboard.
    pub const LEADERBOARD: &str = "/api/leaderboard";
    /// `POST` new account.
    pub const SIGNUP: &str = "/api/auth/signup";
    /// `POST` credentials for a token.
    pub const LOGIN: &str = "/api/auth/login";
    /// `POST` bearer token check.
    pub const VERIFY: &str = "/api/auth/verify";
    /// `GET` username availability; the name is appended.
    pub const CHECK_USERNAME: &str = "/api/auth/check-username";
    /// `GET` the caller's high score.
    pub const USER_SCORE: &str = "/api/userscore";
    /// `POST` issue an anti-cheat session key.
    pub const CREATE_SESSION: &str = "/api/create-session";
    /// `POST` submit a score.
    pub const SCORE_UPDATE: &str = "/api/scoreupdate";
}

// =============================================================================
// LEADERBOARD
// =============================================================================

/// One leaderboard row as sent by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    /// Position, if the backend ranked it.
    #[serde(default)]
    pub rank: Option<u32>,
    /// Display name.
    #[serde(default)]
    pub player: Option<String>,
    /// Best score.
    #[serde(default)]
    pub score: Option<u64>,
}

/// `GET /api/leaderboard` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    /// Rows, best first.
    #[serde(default)]
    pub leaderboard: Option<Vec<LeaderboardRow>>,
    /// Backend-reported failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =============================================================================
// AUTH
// =============================================================================

/// `POST /api/auth/signup` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Password.
    pub pass: String,
}

/// `POST /api/auth/signup` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignupResponse {
    /// Created user record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
    /// Backend-reported failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Email address.
    pub email: String,
    /// Password.
    pub password: String,
}

/// `POST /api/auth/login` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Backend-reported failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/auth/verify` success body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Username the token belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// `GET /api/auth/check-username/:name` response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameAvailability {
    /// Name is free.
    #[serde(default)]
    pub available: bool,
}

// =============================================================================
// SCORES
// =============================================================================

/// `GET /api/userscore` response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserScoreResponse {
    /// Stored high score.
    #[serde(default)]
    pub score: Option<u64>,
}

/// `POST /api/create-session` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    /// Issued key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    /// Backend-reported failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `POST /api/scoreupdate` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    /// Final score.
    pub score: u64,
    /// Session key bound at run start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_key: Option<SessionKey>,
    /// Run evidence.
    pub game_session: GameSessionEvidence,
}

/// `POST /api/scoreupdate` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreUpdateResponse {
    /// Score was recorded as the new high score.
    #[serde(default)]
    pub success: bool,
    /// Explanation when not recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Backend-reported failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaderboard_tolerates_missing_fields() {
        let response: LeaderboardResponse = serde_json::from_str(r#"{
            "leaderboard": [
                { "rank": 1, "player": "ada", "score": 120 },
                { "player": null },
                {}
            ]
        }"#).unwrap();
        let rows = response.leaderboard.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].rank, Some(1));
        assert_eq!(rows[1].player, None);
        assert_eq!(rows[2].score, None);
    }

    #[test]
    fn test_leaderboard_error_only() {
        let response: LeaderboardResponse = serde_json::from_str(r#"{ "error": "db down" }"#).unwrap();
        assert!(response.leaderboard.is_none());
        assert_eq!(response.error.as_deref(), Some("db down"));
    }

    #[test]
    fn test_request_field_names() {
        let signup = serde_json::to_value(SignupRequest {
            username: "ada".into(),
            email: "ada@example.com".into(),
            pass: "pw".into(),
        }).unwrap();
        assert_eq!(signup["pass"], "pw");

        let login = serde_json::to_value(LoginRequest {
            email: "ada@example.com".into(),
            password: "pw".into(),
        }).unwrap();
        assert_eq!(login["password"], "pw");
    }

    #[test]
    fn test_create_session_camel_case() {
        let response: CreateSessionResponse = serde_json::from_str(r#"{ "sessionKey": "abc" }"#).unwrap();
        assert_eq!(response.session_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_score_update_defaults() {
        let response: ScoreUpdateResponse = serde_json::from_str(r#"{ "message": "not a high score" }"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("not a high score"));

        let score: UserScoreResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(score.score, None);
    }
}
