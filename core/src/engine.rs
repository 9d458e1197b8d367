//! The tracker: single owner of the store, the view session, the demo flag
//! and the alert list.
//!
//! [`Tracker`] is synchronous; every method is a plain state transition.
//! [`TrackerHandle`] wraps it in a mutex and performs the network work
//! outside the lock, so fetches never block user actions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::config::TrackerConfig;
use crate::errors::CoreError;
use crate::notify::{NotificationCenter, NotificationEvent, Severity};
use crate::power::PowerModeController;
use crate::provider::demo::{demo_lineups, demo_matches};
use crate::provider::matches::{parse_lineups, parse_live};
use crate::provider::{Endpoint, LineupPlayer, Lineups, LiveMatch, StatsSource};
use crate::scheduler::{run_cycle, CycleOutcome, CycleReport, CycleSnapshot};
use crate::stats::Metric;
use crate::tracking::{TrackOutcome, TrackedEntityStore, TrackedEntry, ViewSession};

pub struct Tracker {
    config: TrackerConfig,
    store: TrackedEntityStore,
    view: Option<ViewSession>,
    demo: bool,
    notifications: NotificationCenter,
    power: PowerModeController,
}

impl Tracker {
    pub fn new(
        config: TrackerConfig,
        store: TrackedEntityStore,
        notifications: NotificationCenter,
        power: PowerModeController,
    ) -> Self {
        let mut tracker = Self {
            config,
            store,
            view: None,
            demo: false,
            notifications,
            power,
        };
        tracker.store_changed();
        tracker
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn tracked(&self) -> &[TrackedEntry] {
        self.store.list()
    }

    pub fn view(&self) -> Option<&ViewSession> {
        self.view.as_ref()
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn set_demo(&mut self, demo: bool) {
        if self.demo != demo {
            info!("Demo mode {}", if demo { "on" } else { "off" });
            self.demo = demo;
        }
    }

    pub fn is_monitoring(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval(self.demo)
    }

    /// Everything the next cycle polls, frozen.
    pub fn snapshot(&self) -> CycleSnapshot {
        CycleSnapshot::collect(&self.store, self.view.as_ref(), self.demo)
    }

    /// Apply a finished cycle in one step.
    pub fn apply_cycle(&mut self, outcome: CycleOutcome) -> CycleReport {
        let batch: Vec<_> = outcome
            .updates
            .iter()
            .map(|u| (u.entity_id, u.stats.clone()))
            .collect();
        let updated = self.store.apply_stats(&batch);

        if let Some(view) = self.view.as_mut() {
            if let Some(update) = outcome
                .updates
                .iter()
                .find(|u| u.entity_id == view.entity_id())
            {
                view.merge_stats(&update.stats);
            }
        }

        let report = CycleReport {
            polled: outcome.updates.len() + outcome.skipped.len(),
            updated,
            skipped: outcome.skipped.len(),
            alerts: outcome.notifications.len(),
        };
        self.notifications.extend(outcome.notifications);
        self.store_changed();
        report
    }

    /// Raise a user-facing alert.
    pub fn notify(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) {
        self.notifications
            .push(NotificationEvent::new(title, message, severity));
    }

    /// Alerts still on screen, newest first.
    pub fn notifications(&mut self) -> Vec<NotificationEvent> {
        self.notifications.active(Utc::now()).to_vec()
    }

    /// Start viewing a lineup player.
    pub fn open_player(&mut self, player: &LineupPlayer, game: &LiveMatch) -> &ViewSession {
        self.notifications.clear();
        self.view.insert(ViewSession::open(player, game, &self.store))
    }

    /// Start viewing a stored player.
    pub fn open_saved(&mut self, entity_id: u64) -> Result<&ViewSession, CoreError> {
        let entry = self
            .store
            .get(entity_id)
            .ok_or(CoreError::NotTracked(entity_id))?;
        let session = ViewSession::from_entry(entry);
        Ok(self.view.insert(session))
    }

    pub fn close_view(&mut self) {
        if let Some(view) = self.view.take() {
            debug!("Closed view of {}", view.player.name);
        }
    }

    /// Save or unsave the viewed player. Returns whether it is now saved.
    pub fn toggle_save(&mut self) -> Result<bool, CoreError> {
        let view = self.view.as_ref().ok_or(CoreError::NoActiveView)?;
        let name = view.player.name.clone();

        let saved = if self.store.remove(view.entity_id()) {
            self.notify("Removed", format!("{name} removed from saved players."), Severity::Info);
            false
        } else {
            self.store.upsert(view.to_entry());
            self.notify("Saved!", format!("{name} is now being tracked."), Severity::Success);
            true
        };
        self.store_changed();
        Ok(saved)
    }

    /// Flip alerts for `metric` on the viewed player, tracking it if needed.
    ///
    /// Returns the new state of the metric.
    pub fn toggle_metric(&mut self, metric: Metric) -> Result<bool, CoreError> {
        let view = self.view.as_mut().ok_or(CoreError::NoActiveView)?;
        let enabled = view.toggle(metric);
        let candidate = view.to_entry();

        if self.store.set_tracked_metric(&candidate, metric, enabled) == TrackOutcome::Created {
            self.notify(
                "Auto-tracked",
                format!("{} added to saved players.", candidate.player.name),
                Severity::Success,
            );
        }
        self.store_changed();
        Ok(enabled)
    }

    /// Stop tracking a stored player. Returns `true` if it was stored.
    pub fn remove_saved(&mut self, entity_id: u64) -> bool {
        let removed = self.store.remove(entity_id);
        self.store_changed();
        removed
    }

    fn store_changed(&mut self) {
        self.power.reconcile(!self.store.is_empty());
    }
}

/// Shared handle to a [`Tracker`] plus its data source.
#[derive(Clone)]
pub struct TrackerHandle {
    tracker: Arc<Mutex<Tracker>>,
    source: Arc<dyn StatsSource>,
}

impl TrackerHandle {
    pub fn new(tracker: Tracker, source: Arc<dyn StatsSource>) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
            source,
        }
    }

    /// Lock the tracker for a synchronous action.
    pub async fn lock(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().await
    }

    /// Run one poll cycle: snapshot under the lock, fetch without it,
    /// apply under the lock.
    pub async fn poll_once(&self) -> CycleReport {
        let snapshot = self.tracker.lock().await.snapshot();
        if snapshot.is_empty() {
            return CycleReport::default();
        }

        let mut rng = StdRng::from_entropy();
        let outcome = run_cycle(&snapshot, self.source.as_ref(), &mut rng).await;

        let report = self.tracker.lock().await.apply_cycle(outcome);
        debug!(
            "Cycle done: {} polled, {} updated, {} skipped, {} alerts",
            report.polled, report.updated, report.skipped, report.alerts
        );
        report
    }

    /// Matches in play. Falls back to the demo set (and demo mode) when the
    /// backend has nothing usable; real data turns demo mode off.
    pub async fn load_live_matches(&self) -> Vec<LiveMatch> {
        let matches = match self.source.fetch(&Endpoint::Live).await {
            Ok(payload) => parse_live(&payload),
            Err(e) => {
                debug!("Live matches unavailable: {}", e);
                Vec::new()
            }
        };

        let mut tracker = self.tracker.lock().await;
        if matches.is_empty() {
            tracker.set_demo(true);
            demo_matches()
        } else {
            tracker.set_demo(false);
            matches
        }
    }

    /// Lineups of `match_id`. Demo mode, or a missing/malformed payload,
    /// yields the demo lineup.
    pub async fn load_lineups(&self, match_id: u64) -> Lineups {
        if self.tracker.lock().await.is_demo() {
            return demo_lineups();
        }

        let lineups = match self.source.fetch(&Endpoint::Lineups { match_id }).await {
            Ok(payload) => parse_lineups(&payload),
            Err(e) => {
                debug!("Lineups for {} unavailable: {}", match_id, e);
                None
            }
        };

        match lineups {
            Some(lineups) => lineups,
            None => {
                self.tracker.lock().await.set_demo(true);
                demo_lineups()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::tracking::MemoryBackend;
    use serde_json::{json, Value};

    struct Offline;

    #[async_trait::async_trait]
    impl StatsSource for Offline {
        async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
            Err(FetchError::Unreachable(endpoint.path()))
        }
    }

    struct Fixed(Value);

    #[async_trait::async_trait]
    impl StatsSource for Fixed {
        async fn fetch(&self, _endpoint: &Endpoint) -> Result<Value, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn tracker() -> Tracker {
        let config = TrackerConfig::default();
        Tracker::new(
            config.clone(),
            TrackedEntityStore::load(Box::new(MemoryBackend::new())),
            NotificationCenter::new(config.notification_ttl(), config.native_delay(), None),
            PowerModeController::detached(),
        )
    }

    fn open_demo_player(tracker: &mut Tracker, id: u64) {
        let lineups = demo_lineups();
        let game = demo_matches().remove(0);
        tracker.open_player(lineups.find(id).unwrap(), &game);
    }

    #[test]
    fn viewing_alone_persists_nothing() {
        let mut tracker = tracker();
        open_demo_player(&mut tracker, 107);
        assert!(tracker.tracked().is_empty());
        assert!(!tracker.is_monitoring());
        assert_eq!(tracker.snapshot().targets.len(), 1);
        assert!(tracker.snapshot().targets[0].ephemeral);
    }

    #[test]
    fn toggle_metric_promotes_once() {
        let mut tracker = tracker();
        open_demo_player(&mut tracker, 107);

        assert!(tracker.toggle_metric(Metric::Tackles).unwrap());
        assert!(tracker.toggle_metric(Metric::Fouls).unwrap());
        assert!(!tracker.toggle_metric(Metric::Tackles).unwrap());

        assert_eq!(tracker.tracked().len(), 1);
        let entry = &tracker.tracked()[0];
        assert!(!entry.is_tracking(Metric::Tackles));
        assert!(entry.is_tracking(Metric::Fouls));
        assert!(tracker.is_monitoring());

        let titles: Vec<String> = tracker.notifications().into_iter().map(|n| n.title).collect();
        assert_eq!(titles, vec!["Auto-tracked"]);
    }

    #[test]
    fn toggle_save_round_trip() {
        let mut tracker = tracker();
        open_demo_player(&mut tracker, 201);

        assert!(tracker.toggle_save().unwrap());
        assert_eq!(tracker.tracked().len(), 1);
        assert!(!tracker.toggle_save().unwrap());
        assert!(tracker.tracked().is_empty());
    }

    #[test]
    fn actions_without_view_fail() {
        let mut tracker = tracker();
        assert!(matches!(tracker.toggle_save(), Err(CoreError::NoActiveView)));
        assert!(matches!(
            tracker.toggle_metric(Metric::Fouls),
            Err(CoreError::NoActiveView)
        ));
        assert!(matches!(tracker.open_saved(5), Err(CoreError::NotTracked(5))));
    }

    #[test]
    fn opening_a_player_clears_alerts() {
        let mut tracker = tracker();
        tracker.notify("Old", "", Severity::Info);
        open_demo_player(&mut tracker, 101);
        assert!(tracker.notifications().is_empty());
    }

    #[tokio::test]
    async fn offline_live_load_enters_demo_mode() {
        let handle = TrackerHandle::new(tracker(), Arc::new(Offline));
        let matches = handle.load_live_matches().await;
        assert_eq!(matches, demo_matches());
        assert!(handle.lock().await.is_demo());
        assert_eq!(handle.lock().await.poll_interval(), Duration::from_secs(5));

        let lineups = handle.load_lineups(1).await;
        assert_eq!(lineups, demo_lineups());
    }

    #[tokio::test]
    async fn real_live_data_leaves_demo_mode() {
        let payload = json!({
            "events": [{"id": 77, "homeTeam": {"name": "A"}, "awayTeam": {"name": "B"}}]
        });
        let handle = TrackerHandle::new(tracker(), Arc::new(Fixed(payload)));
        handle.lock().await.set_demo(true);

        let matches = handle.load_live_matches().await;
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, 77);
        assert!(!handle.lock().await.is_demo());
    }

    #[tokio::test]
    async fn malformed_lineups_fall_back_to_demo() {
        let handle = TrackerHandle::new(tracker(), Arc::new(Fixed(json!({"home": {}}))));
        let lineups = handle.load_lineups(9).await;
        assert_eq!(lineups, demo_lineups());
        assert!(handle.lock().await.is_demo());
    }

    #[tokio::test]
    async fn poll_refreshes_view_snapshot() {
        let payload = json!({"tackles": 3, "minutesPlayed": 50});
        let handle = TrackerHandle::new(tracker(), Arc::new(Fixed(payload)));
        {
            let mut tracker = handle.lock().await;
            open_demo_player(&mut tracker, 111);
            tracker.toggle_metric(Metric::Tackles).unwrap();
        }

        let report = handle.poll_once().await;
        assert_eq!(report.polled, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.alerts, 1);

        let tracker = handle.lock().await;
        let view = tracker.view().unwrap();
        assert_eq!(view.stats.tackles, 3);
        // Lineup had 90 minutes; the merge never moves backwards.
        assert_eq!(view.stats.minutes, 90);
        assert_eq!(view.stats.rating, Some(8.5));
        assert_eq!(tracker.tracked()[0].stats.tackles, 3);
    }
}
