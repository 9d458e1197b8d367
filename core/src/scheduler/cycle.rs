//! One poll cycle: snapshot → sequential fetch → normalize → compare.
//!
//! The cycle itself never touches shared state. It works on a
//! [`CycleSnapshot`] taken under the tracker lock and returns a
//! [`CycleOutcome`] that is applied in one step afterwards.

use std::collections::BTreeSet;

use rand::Rng;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::notify::{compare, NotificationEvent};
use crate::provider::{Endpoint, LiveMatch, StatsSource};
use crate::stats::{demo, normalize, CanonicalStats, Metric};
use crate::tracking::{PlayerRef, TrackedEntityStore, ViewSession};

/// A player polled in this cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PollTarget {
    pub player: PlayerRef,
    pub game: LiveMatch,
    pub stats: CanonicalStats,
    pub tracked: BTreeSet<Metric>,
    /// Only being viewed, not stored.
    pub ephemeral: bool,
}

/// Immutable view of everything a cycle needs.
#[derive(Debug, Clone, Default)]
pub struct CycleSnapshot {
    pub targets: Vec<PollTarget>,
    pub demo: bool,
}

impl CycleSnapshot {
    /// Stored entries in store order, then the viewed player if unsaved.
    pub fn collect(store: &TrackedEntityStore, view: Option<&ViewSession>, demo: bool) -> Self {
        let mut targets: Vec<PollTarget> = store
            .list()
            .iter()
            .map(|e| PollTarget {
                player: e.player.clone(),
                game: e.game.clone(),
                stats: e.stats.clone(),
                tracked: e.tracked.clone(),
                ephemeral: false,
            })
            .collect();

        if let Some(view) = view.filter(|v| !store.contains(v.entity_id())) {
            targets.push(PollTarget {
                player: view.player.clone(),
                game: view.game.clone(),
                stats: view.stats.clone(),
                tracked: view.tracked.clone(),
                ephemeral: true,
            });
        }

        Self { targets, demo }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// New stats for one target.
#[derive(Debug, Clone, PartialEq)]
pub struct StatUpdate {
    pub entity_id: u64,
    pub stats: CanonicalStats,
    pub ephemeral: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub updates: Vec<StatUpdate>,
    pub notifications: Vec<NotificationEvent>,
    /// Targets that yielded no data this cycle.
    pub skipped: Vec<u64>,
}

/// Summary of an applied cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub polled: usize,
    pub updated: usize,
    pub skipped: usize,
    pub alerts: usize,
}

/// Poll every target in order, one request at a time.
///
/// A target without data is skipped and keeps its stats; the remaining
/// targets are still polled.
pub async fn run_cycle<R>(
    snapshot: &CycleSnapshot,
    source: &dyn StatsSource,
    rng: &mut R,
) -> CycleOutcome
where
    R: Rng + Send + ?Sized,
{
    let mut outcome = CycleOutcome::default();

    for target in &snapshot.targets {
        let fresh = if snapshot.demo {
            Some(demo::synthesize(&target.stats, rng))
        } else {
            fetch_player(source, target).await
        };

        let Some(fresh) = fresh else {
            outcome.skipped.push(target.player.id);
            continue;
        };

        outcome.notifications.extend(compare(
            &target.player.name,
            &target.stats,
            &fresh,
            &target.tracked,
        ));
        outcome.updates.push(StatUpdate {
            entity_id: target.player.id,
            stats: fresh,
            ephemeral: target.ephemeral,
        });
    }

    outcome
}

async fn fetch_player(source: &dyn StatsSource, target: &PollTarget) -> Option<CanonicalStats> {
    let endpoint = Endpoint::Player {
        match_id: target.game.id,
        name: target.player.name.clone(),
    };
    match source.fetch(&endpoint).await {
        Ok(Value::Null) => {
            debug!("Empty stats for {}", target.player.name);
            None
        }
        Ok(raw) => Some(normalize(Some(&raw), &target.stats)),
        Err(e) => {
            debug!("No stats for {} this cycle: {}", target.player.name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::tracking::fixtures::entry;
    use crate::tracking::MemoryBackend;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned player blobs by name and records the request order.
    #[derive(Default)]
    struct CannedSource {
        players: HashMap<String, Value>,
        requests: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl StatsSource for CannedSource {
        async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
            self.requests.lock().unwrap().push(endpoint.path());
            match endpoint {
                Endpoint::Player { name, .. } => self
                    .players
                    .get(name)
                    .cloned()
                    .ok_or_else(|| FetchError::NotFound(endpoint.path())),
                _ => Err(FetchError::NotFound(endpoint.path())),
            }
        }
    }

    fn store_with(names: &[(u64, &str)]) -> TrackedEntityStore {
        let mut store = TrackedEntityStore::load(Box::new(MemoryBackend::new()));
        for (id, name) in names {
            let mut e = entry(*id, name);
            e.set_tracking(Metric::Tackles, true);
            e.stats.tackles = 1;
            store.upsert(e);
        }
        store
    }

    #[test]
    fn snapshot_adds_unsaved_view_last() {
        let store = store_with(&[(1, "Pedro"), (2, "Gerson")]);
        let view = ViewSession::from_entry(&entry(3, "Veiga"));
        let snapshot = CycleSnapshot::collect(&store, Some(&view), false);

        let ids: Vec<(u64, bool)> = snapshot
            .targets
            .iter()
            .map(|t| (t.player.id, t.ephemeral))
            .collect();
        assert_eq!(ids, vec![(1, false), (2, false), (3, true)]);
    }

    #[test]
    fn snapshot_does_not_duplicate_saved_view() {
        let store = store_with(&[(1, "Pedro")]);
        let view = ViewSession::from_entry(store.get(1).unwrap());
        let snapshot = CycleSnapshot::collect(&store, Some(&view), false);
        assert_eq!(snapshot.targets.len(), 1);
        assert!(!snapshot.targets[0].ephemeral);
    }

    #[tokio::test]
    async fn empty_snapshot_is_a_no_op() {
        let source = CannedSource::default();
        let mut rng = StdRng::seed_from_u64(1);
        let outcome = run_cycle(&CycleSnapshot::default(), &source, &mut rng).await;
        assert!(outcome.updates.is_empty());
        assert!(source.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_target_does_not_block_others() {
        let store = store_with(&[(1, "Pedro"), (2, "Gerson"), (3, "De La Cruz")]);
        let snapshot = CycleSnapshot::collect(&store, None, false);

        let mut source = CannedSource::default();
        source
            .players
            .insert("Pedro".to_string(), json!({"tackles": 2}));
        source
            .players
            .insert("De La Cruz".to_string(), json!({"totalTackle": 4, "rating": 7.9}));

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = run_cycle(&snapshot, &source, &mut rng).await;

        let updated: Vec<u64> = outcome.updates.iter().map(|u| u.entity_id).collect();
        assert_eq!(updated, vec![1, 3]);
        assert_eq!(outcome.skipped, vec![2]);
        assert_eq!(outcome.updates[1].stats.tackles, 4);
        assert_eq!(outcome.updates[1].stats.rating, Some(7.9));

        let messages: Vec<&str> = outcome
            .notifications
            .iter()
            .map(|n| n.message.as_str())
            .collect();
        assert_eq!(messages, vec!["+1 recorded. Total: 2", "+3 recorded. Total: 4"]);

        let requests = source.requests.lock().unwrap().clone();
        assert_eq!(
            requests,
            vec!["/player/1/Pedro", "/player/1/Gerson", "/player/1/De%20La%20Cruz"]
        );
    }

    #[tokio::test]
    async fn null_payload_counts_as_no_data() {
        let store = store_with(&[(1, "Pedro")]);
        let snapshot = CycleSnapshot::collect(&store, None, false);
        let mut source = CannedSource::default();
        source.players.insert("Pedro".to_string(), Value::Null);

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = run_cycle(&snapshot, &source, &mut rng).await;
        assert!(outcome.updates.is_empty());
        assert_eq!(outcome.skipped, vec![1]);
    }

    #[tokio::test]
    async fn demo_mode_never_calls_the_source() {
        let store = store_with(&[(1, "Pedro"), (2, "Gerson")]);
        let snapshot = CycleSnapshot::collect(&store, None, true);
        let source = CannedSource::default();

        let mut rng = StdRng::seed_from_u64(42);
        let outcome = run_cycle(&snapshot, &source, &mut rng).await;

        assert!(source.requests.lock().unwrap().is_empty());
        assert_eq!(outcome.updates.len(), 2);
        assert!(outcome.updates.iter().all(|u| u.stats.minutes == 1));
    }
}
