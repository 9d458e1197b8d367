//! Upstream data source abstraction.
//!
//! The engine only knows three endpoints and treats every failure the same
//! way: no data for this request. Concrete transports live outside the
//! core (the agent ships an HTTP implementation).

pub mod demo;
pub mod matches;

use serde_json::Value;

use crate::errors::FetchError;

pub use matches::{LineupPlayer, Lineups, LiveMatch, TeamScore, TeamSheet};

/// An endpoint of the live-stats backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /live`: matches currently in play.
    Live,
    /// `GET /lineups/{matchId}`: both rosters with nested stat blobs.
    Lineups { match_id: u64 },
    /// `GET /player/{matchId}/{name}`: one player's raw stat blob.
    Player { match_id: u64, name: String },
}

impl Endpoint {
    /// Request path, with the player name percent-encoded.
    pub fn path(&self) -> String {
        match self {
            Self::Live => "/live".to_string(),
            Self::Lineups { match_id } => format!("/lineups/{match_id}"),
            Self::Player { match_id, name } => {
                format!("/player/{match_id}/{}", urlencoding::encode(name))
            }
        }
    }
}

/// Fetch capability for raw provider JSON.
#[async_trait::async_trait]
pub trait StatsSource: Send + Sync {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError>;
}
