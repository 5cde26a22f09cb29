//! Session Evidence
//!
//! The `gameSession` object sent with a score. It carries the full event log
//! plus aggregates the backend can cross-check against it, and a digest of
//! the log so a truncated or edited log is detectable.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::difficulty::BackgroundStage;
use crate::game::events::GameEvent;
use crate::game::session::GameSession;

/// Evidence for one finished run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionEvidence {
    /// Run identifier.
    pub run_id: Uuid,
    /// Wall-clock start.
    pub start_time: DateTime<Utc>,
    /// Wall-clock end.
    pub end_time: DateTime<Utc>,
    /// Run length in milliseconds.
    pub duration: u64,
    /// Full event log.
    pub events: Vec<GameEvent>,
    /// Score at the end of the run.
    pub final_score: u64,
    /// Number of logged events.
    pub event_count: usize,
    /// Shortest traversal period reached, in milliseconds.
    pub max_speed: u64,
    /// Highest background stage reached.
    pub backgrounds_reached: BackgroundStage,
    /// Accepted jumps.
    pub jump_count: usize,
    /// Mean spawn-to-jump time, if any jump had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_reaction_time: Option<f64>,
    /// Hex SHA-256 of the event log.
    pub event_digest: String,
}

/// Assemble evidence for a stopped run. `None` while the run is live.
pub fn build_evidence(session: &GameSession) -> Option<GameSessionEvidence> {
    let end_time = session.ended_at()?;
    let duration = session.duration_ms()?;

    Some(GameSessionEvidence {
        run_id: session.run_id,
        start_time: session.started_at,
        end_time,
        duration,
        events: session.events.events().to_vec(),
        final_score: session.score,
        event_count: session.events.len(),
        max_speed: session.peak_speed_ms,
        backgrounds_reached: session.max_background,
        jump_count: session.jump_count(),
        average_reaction_time: session.average_reaction_ms(),
        event_digest: hex::encode(session.events.digest()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::GameConfig;
    use crate::game::renderer::HeadlessRenderer;
    use crate::game::session::SessionManager;

    fn finished_run() -> SessionManager<HeadlessRenderer> {
        let mut config = GameConfig::default();
        config.collision.player_samples.clear();
        let mut m = SessionManager::new(config, HeadlessRenderer::new("move"));
        m.start(0, Utc::now(), None).unwrap();
        m.jump(400);
        m.advance(3000);
        m.stop(3000).unwrap();
        m
    }

    #[test]
    fn test_live_run_has_no_evidence() {
        let mut m = SessionManager::new(GameConfig::default(), HeadlessRenderer::new("move"));
        m.start(0, Utc::now(), None).unwrap();
        assert!(build_evidence(m.session().unwrap()).is_none());
    }

    #[test]
    fn test_evidence_matches_session() {
        let m = finished_run();
        let session = m.session().unwrap();
        let evidence = build_evidence(session).unwrap();

        assert_eq!(evidence.final_score, 60);
        assert_eq!(evidence.duration, 3000);
        assert_eq!(evidence.event_count, session.events.len());
        assert_eq!(evidence.jump_count, 1);
        assert_eq!(evidence.average_reaction_time, Some(400.0));
        assert_eq!(evidence.max_speed, 4000);
        assert_eq!(evidence.backgrounds_reached, BackgroundStage::First);
        assert_eq!(evidence.event_digest.len(), 64);
        assert_eq!(evidence.end_time - evidence.start_time, chrono::Duration::milliseconds(3000));
    }

    #[test]
    fn test_wire_shape() {
        let m = finished_run();
        let json = serde_json::to_value(build_evidence(m.session().unwrap()).unwrap()).unwrap();

        for field in [
            "runId", "startTime", "endTime", "duration", "events", "finalScore",
            "eventCount", "maxSpeed", "backgroundsReached", "jumpCount",
            "averageReactionTime", "eventDigest",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(json["backgroundsReached"], 1);
        assert_eq!(json["events"][0]["type"], "game_start");
    }
}
