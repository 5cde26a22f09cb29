//! Hurdle Runner Demo
//!
//! Plays a few runs on the headless renderer with a simple autopilot and
//! reports them to the configured backend.

use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hurdle_runner::{
    VERSION,
    core::rng::DeterministicRng,
    game::{
        renderer::{HeadlessRenderer, CONTAINER_WIDTH, SWEEP_OVERSHOOT},
        session::SessionManager,
    },
    network::{
        auth::{AuthToken, MemoryTokenStore, TokenStore},
        client::{ClientConfig, GameClient},
        http::HttpBackend,
        leaderboard::fetch_leaderboard,
    },
};

/// Client loop period.
const TICK: Duration = Duration::from_millis(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Hurdle Runner v{}", VERSION);

    let mut config = ClientConfig::from_env();
    let token = config.auth_token.clone().and_then(AuthToken::new);
    if token.is_none() && config.anti_cheat {
        warn!("HURDLE_AUTH_TOKEN not set; playing offline with anti-cheat disabled");
        config.anti_cheat = false;
    }

    let game_config = config.game_config()?;
    let backend = HttpBackend::new(config.backend_url.clone(), config.request_timeout)?;
    info!("Backend: {} (anti-cheat: {})", backend.base_url(), game_config.anti_cheat);

    let store = token.map(MemoryTokenStore::with_token).unwrap_or_default();
    let renderer = HeadlessRenderer::new(game_config.obstacle.animation_name.clone());
    let mut client = GameClient::new(backend, renderer, store, game_config);

    if client.store().token().is_some() {
        if let Err(e) = client.initialize().await {
            warn!("Login check failed: {}", e);
        }
        match fetch_leaderboard(client.backend()).await {
            Ok(rows) => {
                for row in rows.iter().take(5) {
                    info!("#{} {} - {}", row.rank_label(), row.player, row.score);
                }
            }
            Err(e) => warn!("Leaderboard unavailable: {}", e),
        }
    }

    let seed = chrono::Utc::now().timestamp_millis() as u64;
    let mut rng = DeterministicRng::new(seed);

    for run in 1..=config.demo_runs.max(1) {
        if run == 1 {
            client.start().await?;
        } else {
            client.restart().await?;
        }

        let started = client.now_ms();
        let give_up_ms = config.demo_max_secs.saturating_mul(1000);
        let jitter_ms = rng.next_int(80) as u64;

        let outcome = client
            .run_until_over(TICK, |manager, now| {
                now.saturating_sub(started) < give_up_ms && autopilot(manager, jitter_ms)
            })
            .await?;

        if let Some(session) = client.manager().session() {
            info!(
                "Run {}/{}: score {}, {} jumps, {} events -> {:?}",
                run,
                config.demo_runs.max(1),
                session.score,
                session.jump_count(),
                session.events.len(),
                outcome,
            );
        }
    }

    info!("High score: {}", client.reporter().high_score());
    Ok(())
}

/// Jump when the obstacle is about to reach the player.
fn autopilot(manager: &SessionManager<HeadlessRenderer>, jitter_ms: u64) -> bool {
    let renderer = manager.renderer();
    if renderer.is_airborne() {
        return false;
    }
    let Some(gap) = renderer.obstacle_gap() else {
        return false;
    };
    if gap < 0.0 {
        return false;
    }

    let state = manager.difficulty().state();
    let px_per_ms = CONTAINER_WIDTH * (1.0 + SWEEP_OVERSHOOT) / state.speed_ms.max(1) as f64;
    let lead_ms = (state.jump_duration_ms / 8 + jitter_ms) as f64;
    gap / px_per_ms <= lead_ms
}
