//! Match and lineup records parsed from the `/live` and `/lineups` payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::tracking::PlayerRef;

/// One side of a live match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamScore {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

/// A match currently in play.
///
/// Also serves as the persisted context of a tracked entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveMatch {
    pub id: u64,
    pub home_team: TeamScore,
    pub away_team: TeamScore,
    pub tournament: String,
    /// Current minute, only while the match is in progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    pub status: String,
}

/// A player row from a lineup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupPlayer {
    pub id: u64,
    pub name: String,
    pub position: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shirt_number: Option<String>,
    #[serde(default)]
    pub substitute: bool,
    /// Raw stat blob as delivered; normalized when the player is opened.
    #[serde(default)]
    pub statistics: Value,
}

impl LineupPlayer {
    pub fn player_ref(&self) -> PlayerRef {
        PlayerRef {
            id: self.id,
            name: self.name.clone(),
            position: Some(self.position.clone()),
            shirt_number: self.shirt_number.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSheet {
    pub name: String,
    pub starters: Vec<LineupPlayer>,
    pub substitutes: Vec<LineupPlayer>,
}

impl TeamSheet {
    pub fn players(&self) -> impl Iterator<Item = &LineupPlayer> {
        self.starters.iter().chain(self.substitutes.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lineups {
    pub home: TeamSheet,
    pub away: TeamSheet,
}

impl Lineups {
    pub fn find(&self, player_id: u64) -> Option<&LineupPlayer> {
        self.home
            .players()
            .chain(self.away.players())
            .find(|p| p.id == player_id)
    }
}

/// Parse a `/live` payload: either `{"events": [...]}` or a bare array.
///
/// Events without a numeric id are dropped.
pub fn parse_live(payload: &Value) -> Vec<LiveMatch> {
    let events = payload
        .get("events")
        .and_then(Value::as_array)
        .or_else(|| payload.as_array());

    let Some(events) = events else {
        return Vec::new();
    };

    events.iter().filter_map(parse_event).collect()
}

fn parse_event(event: &Value) -> Option<LiveMatch> {
    let id = event.get("id").and_then(Value::as_u64)?;
    let in_progress = event.pointer("/status/type").and_then(Value::as_str) == Some("inprogress");

    Some(LiveMatch {
        id,
        home_team: TeamScore {
            name: str_at(event, "/homeTeam/name").unwrap_or("Home").to_string(),
            score: u32_at(event, "/homeScore/current"),
        },
        away_team: TeamScore {
            name: str_at(event, "/awayTeam/name").unwrap_or("Away").to_string(),
            score: u32_at(event, "/awayScore/current"),
        },
        tournament: str_at(event, "/tournament/name")
            .unwrap_or("Unknown")
            .to_string(),
        minute: if in_progress {
            u32_at(event, "/time/minute")
        } else {
            None
        },
        status: str_at(event, "/status/description")
            .unwrap_or("Live")
            .to_string(),
    })
}

/// Parse a `/lineups/{id}` payload. `None` unless both sides are present.
pub fn parse_lineups(payload: &Value) -> Option<Lineups> {
    let home = payload.get("home").filter(|v| v.is_object())?;
    let away = payload.get("away").filter(|v| v.is_object())?;
    Some(Lineups {
        home: parse_team(home),
        away: parse_team(away),
    })
}

fn parse_team(team: &Value) -> TeamSheet {
    let mut starters = Vec::new();
    let mut substitutes = Vec::new();

    let rows = team.get("players").and_then(Value::as_array);
    for row in rows.into_iter().flatten() {
        let Some(player) = row.get("player").filter(|p| p.is_object()) else {
            continue;
        };
        let Some(id) = player.get("id").and_then(Value::as_u64) else {
            debug!("Skipping lineup row without player id");
            continue;
        };
        let substitute = row
            .get("substitute")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let name = non_empty_str(player, "name")
            .or_else(|| non_empty_str(player, "shortName"))
            .unwrap_or("?");

        let entry = LineupPlayer {
            id,
            name: name.to_string(),
            position: non_empty_str(player, "position").unwrap_or("M").to_string(),
            shirt_number: row
                .get("shirtNumber")
                .or_else(|| player.get("jerseyNumber"))
                .and_then(scalar_to_string),
            substitute,
            statistics: row
                .get("statistics")
                .filter(|s| s.is_object())
                .cloned()
                .unwrap_or_else(|| Value::Object(Default::default())),
        };
        if substitute {
            substitutes.push(entry);
        } else {
            starters.push(entry);
        }
    }

    TeamSheet {
        name: str_at(team, "/name").unwrap_or("Team").to_string(),
        starters,
        substitutes,
    }
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

fn u32_at(value: &Value, pointer: &str) -> Option<u32> {
    value
        .pointer(pointer)
        .and_then(Value::as_u64)
        .map(|n| n.min(u32::MAX as u64) as u32)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
