//! The player currently being viewed.
//!
//! A view session is polled like a tracked entry but never persisted on
//! its own. Saving it, or picking a metric to watch, copies it into the
//! store.

use std::collections::BTreeSet;

use super::{PlayerRef, TrackedEntry, TrackedEntityStore};
use crate::provider::{LineupPlayer, LiveMatch};
use crate::stats::{normalize, CanonicalStats, Metric};

#[derive(Debug, Clone, PartialEq)]
pub struct ViewSession {
    pub player: PlayerRef,
    pub game: LiveMatch,
    /// Live stat snapshot shown to the viewer.
    pub stats: CanonicalStats,
    pub tracked: BTreeSet<Metric>,
}

impl ViewSession {
    /// Open a lineup player. A stored player resumes its persisted stats and
    /// metrics; anyone else starts from the lineup's stat blob.
    pub fn open(player: &LineupPlayer, game: &LiveMatch, store: &TrackedEntityStore) -> Self {
        match store.get(player.id) {
            Some(saved) => Self::from_entry(saved),
            None => Self {
                player: player.player_ref(),
                game: game.clone(),
                stats: normalize(Some(&player.statistics), &CanonicalStats::default()),
                tracked: BTreeSet::new(),
            },
        }
    }

    pub fn from_entry(entry: &TrackedEntry) -> Self {
        Self {
            player: entry.player.clone(),
            game: entry.game.clone(),
            stats: entry.stats.clone(),
            tracked: entry.tracked.clone(),
        }
    }

    pub fn entity_id(&self) -> u64 {
        self.player.id
    }

    /// The session as a store record.
    pub fn to_entry(&self) -> TrackedEntry {
        TrackedEntry {
            player: self.player.clone(),
            game: self.game.clone(),
            stats: self.stats.clone(),
            tracked: self.tracked.clone(),
        }
    }

    /// Flip one metric, returning the new state.
    pub fn toggle(&mut self, metric: Metric) -> bool {
        if !self.tracked.remove(&metric) {
            self.tracked.insert(metric);
            true
        } else {
            false
        }
    }

    /// Fold a poll result into the live snapshot.
    pub fn merge_stats(&mut self, update: &CanonicalStats) {
        self.stats.merge_from(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::demo::{demo_lineups, demo_matches};
    use crate::tracking::MemoryBackend;

    fn store() -> TrackedEntityStore {
        TrackedEntityStore::load(Box::new(MemoryBackend::new()))
    }

    #[test]
    fn unsaved_player_starts_from_lineup_stats() {
        let lineups = demo_lineups();
        let player = lineups.find(111).unwrap();
        let session = ViewSession::open(player, &demo_matches()[0], &store());

        assert_eq!(session.entity_id(), 111);
        assert_eq!(session.stats.rating, Some(8.5));
        assert_eq!(session.stats.minutes, 90);
        assert!(session.tracked.is_empty());
    }

    #[test]
    fn saved_player_resumes_persisted_state() {
        let lineups = demo_lineups();
        let player = lineups.find(111).unwrap();
        let game = &demo_matches()[0];

        let mut store = store();
        let mut saved = ViewSession::open(player, game, &store).to_entry();
        saved.stats.tackles = 6;
        saved.set_tracking(Metric::Tackles, true);
        store.upsert(saved);

        let session = ViewSession::open(player, game, &store);
        assert_eq!(session.stats.tackles, 6);
        assert!(session.tracked.contains(&Metric::Tackles));
    }

    #[test]
    fn toggle_flips_metric() {
        let lineups = demo_lineups();
        let mut session =
            ViewSession::open(lineups.find(101).unwrap(), &demo_matches()[0], &store());
        assert!(session.toggle(Metric::Fouls));
        assert!(!session.toggle(Metric::Fouls));
        assert!(session.tracked.is_empty());
    }
}
