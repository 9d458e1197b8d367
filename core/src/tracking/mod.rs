//! Tracked players: the durable store and the live view session.

pub mod session;
pub mod store;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::provider::LiveMatch;
use crate::stats::{CanonicalStats, Metric};

pub use session::ViewSession;
pub use store::{MemoryBackend, StateBackend, TrackOutcome, TrackedEntityStore, STORE_KEY};

/// Identity of a tracked player. `id` is the store key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shirt_number: Option<String>,
}

/// A persisted tracking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntry {
    pub player: PlayerRef,
    /// Match the stats belong to; player endpoints are keyed by it.
    pub game: LiveMatch,
    #[serde(default)]
    pub stats: CanonicalStats,
    /// Metrics the user wants alerts for.
    #[serde(default)]
    pub tracked: BTreeSet<Metric>,
}

impl TrackedEntry {
    pub fn entity_id(&self) -> u64 {
        self.player.id
    }

    pub fn is_tracking(&self, metric: Metric) -> bool {
        self.tracked.contains(&metric)
    }

    pub fn set_tracking(&mut self, metric: Metric, enabled: bool) {
        if enabled {
            self.tracked.insert(metric);
        } else {
            self.tracked.remove(&metric);
        }
    }
}
