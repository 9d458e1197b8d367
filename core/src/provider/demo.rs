//! Built-in dataset used when the backend is unreachable or returns junk.

use serde_json::json;

use super::matches::{LineupPlayer, Lineups, LiveMatch, TeamScore, TeamSheet};

pub fn demo_matches() -> Vec<LiveMatch> {
    vec![
        LiveMatch {
            id: 1,
            home_team: TeamScore {
                name: "Flamengo".to_string(),
                score: Some(1),
            },
            away_team: TeamScore {
                name: "Palmeiras".to_string(),
                score: Some(0),
            },
            tournament: "Brasileirão Série A".to_string(),
            minute: Some(45),
            status: "Live".to_string(),
        },
        LiveMatch {
            id: 2,
            home_team: TeamScore {
                name: "Real Madrid".to_string(),
                score: Some(2),
            },
            away_team: TeamScore {
                name: "Barcelona".to_string(),
                score: Some(2),
            },
            tournament: "La Liga".to_string(),
            minute: Some(78),
            status: "Live".to_string(),
        },
    ]
}

// (id, name, position, shirt, rating)
type Row = (u64, &'static str, &'static str, &'static str, Option<f64>);

const HOME_STARTERS: &[Row] = &[
    (101, "Rossi", "G", "1", Some(7.2)),
    (102, "Varela", "D", "2", Some(6.8)),
    (103, "F. Bruno", "D", "15", Some(7.5)),
    (104, "L. Pereira", "D", "4", Some(6.9)),
    (105, "A. Lucas", "D", "6", Some(7.1)),
    (106, "Pulgar", "M", "5", Some(6.5)),
    (107, "De La Cruz", "M", "18", Some(8.0)),
    (108, "Arrascaeta", "M", "14", Some(7.8)),
    (109, "Gerson", "F", "8", Some(7.3)),
    (110, "Cebolinha", "F", "11", Some(6.7)),
    (111, "Pedro", "F", "9", Some(8.5)),
];
const HOME_SUBS: &[Row] = &[(112, "Gabigol", "F", "10", None)];

const AWAY_STARTERS: &[Row] = &[
    (201, "Weverton", "G", "21", Some(6.4)),
    (202, "Mayke", "D", "12", Some(6.6)),
    (203, "Gómez", "D", "15", Some(7.0)),
    (204, "Murilo", "D", "26", Some(6.8)),
    (205, "Piquerez", "D", "22", Some(7.4)),
    (206, "Zé Rafael", "M", "8", Some(6.2)),
    (207, "Moreno", "M", "5", Some(6.7)),
    (208, "Veiga", "M", "23", Some(7.1)),
    (209, "Estêvão", "F", "41", Some(8.1)),
    (210, "Rony", "F", "10", Some(5.9)),
    (211, "Endrick", "F", "9", Some(7.5)),
];
const AWAY_SUBS: &[Row] = &[(212, "Dudu", "F", "7", None)];

pub fn demo_lineups() -> Lineups {
    Lineups {
        home: sheet("Home Team", HOME_STARTERS, HOME_SUBS),
        away: sheet("Away Team", AWAY_STARTERS, AWAY_SUBS),
    }
}

fn sheet(name: &str, starters: &[Row], subs: &[Row]) -> TeamSheet {
    TeamSheet {
        name: name.to_string(),
        starters: starters.iter().map(|r| player(r, false)).collect(),
        substitutes: subs.iter().map(|r| player(r, true)).collect(),
    }
}

fn player(&(id, name, position, shirt, rating): &Row, substitute: bool) -> LineupPlayer {
    let statistics = match rating {
        Some(r) => json!({ "rating": r, "minutesPlayed": 90 }),
        None => json!({}),
    };
    LineupPlayer {
        id,
        name: name.to_string(),
        position: position.to_string(),
        shirt_number: Some(shirt.to_string()),
        substitute,
        statistics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn demo_lineup_ids_are_unique() {
        let lineups = demo_lineups();
        let ids: HashSet<u64> = lineups
            .home
            .players()
            .chain(lineups.away.players())
            .map(|p| p.id)
            .collect();
        assert_eq!(ids.len(), 24);
        assert!(lineups.find(112).unwrap().substitute);
    }

    #[test]
    fn demo_matches_are_live() {
        let matches = demo_matches();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.status == "Live"));
    }
}
