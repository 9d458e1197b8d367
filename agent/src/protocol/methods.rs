use serde::{Deserialize, Serialize};

use sofatracker_core::notify::NotificationEvent;
use sofatracker_core::provider::{Lineups, LiveMatch};
use sofatracker_core::stats::{CanonicalStats, Metric};
use sofatracker_core::tracking::{PlayerRef, TrackedEntry, ViewSession};

// ── initialize ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct InitializeParams {
    pub protocol_version: String,
    pub client: String,
    pub client_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub metrics: Vec<Metric>,
    pub live_interval_ms: u64,
    pub demo_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitializeResult {
    pub protocol_version: String,
    pub agent_version: String,
    pub capabilities: Capabilities,
}

// ── health.check ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub status: String,
    pub uptime_secs: u64,
    pub tracked_players: usize,
    pub monitoring: bool,
    pub demo: bool,
}

// ── matches.live / matches.lineups ──────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MatchesLiveResult {
    pub matches: Vec<LiveMatch>,
    pub demo: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineupsParams {
    pub match_id: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineupsResult {
    pub match_id: u64,
    pub lineups: Lineups,
    pub demo: bool,
}

// ── player.* ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerOpenParams {
    pub match_id: u64,
    pub player_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerIdParams {
    pub player_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleMetricParams {
    pub metric: String,
}

/// The open player as shown to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ViewResult {
    pub player: PlayerRef,
    pub game: LiveMatch,
    pub stats: CanonicalStats,
    pub tracked: Vec<Metric>,
    pub saved: bool,
}

impl ViewResult {
    pub fn new(view: &ViewSession, saved: bool) -> Self {
        Self {
            player: view.player.clone(),
            game: view.game.clone(),
            stats: view.stats.clone(),
            tracked: view.tracked.iter().copied().collect(),
            saved,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleSaveResult {
    pub player_id: u64,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleMetricResult {
    pub player_id: u64,
    pub metric: Metric,
    pub enabled: bool,
}

// ── tracked.* ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TrackedListResult {
    pub players: Vec<TrackedEntry>,
    pub monitoring: bool,
}

// ── notifications.list ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct NotificationsListResult {
    pub notifications: Vec<NotificationEvent>,
}
