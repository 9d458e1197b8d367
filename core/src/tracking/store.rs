//! Durable store of tracked players.
//!
//! The whole store is serialized as one JSON blob under [`STORE_KEY`] and
//! rewritten on every mutation. Loading never fails: missing or corrupt
//! state yields an empty store, and write failures are logged and dropped.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use super::TrackedEntry;
use crate::errors::PersistError;
use crate::stats::{CanonicalStats, Metric};

/// Fixed key the store is persisted under.
pub const STORE_KEY: &str = "sofatracker_saved_players";

/// Key/blob persistence capability.
pub trait StateBackend: Send + Sync {
    /// Read the blob stored under `key`, `None` if nothing was ever written.
    fn read(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Replace the blob stored under `key`.
    fn write(&self, key: &str, blob: &str) -> Result<(), PersistError>;
}

/// In-memory backend. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current blob for `key`, for inspection.
    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs.lock().ok()?.get(key).cloned()
    }
}

impl StateBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| PersistError::Unavailable("memory backend poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), PersistError> {
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| PersistError::Unavailable("memory backend poisoned".to_string()))?;
        blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

/// Result of [`TrackedEntityStore::set_tracked_metric`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    /// The entity was not tracked; a new entry was created.
    Created,
    /// An existing entry's tracked metrics were updated.
    Updated,
}

/// Insertion-ordered set of [`TrackedEntry`], unique by player id.
pub struct TrackedEntityStore {
    entries: Vec<TrackedEntry>,
    backend: Box<dyn StateBackend>,
}

impl TrackedEntityStore {
    /// Load the store from `backend`.
    pub fn load(backend: Box<dyn StateBackend>) -> Self {
        let entries = match backend.read(STORE_KEY) {
            Ok(Some(blob)) => match Self::entries_from_blob(&blob) {
                Ok(entries) => {
                    debug!("Loaded {} tracked players", entries.len());
                    entries
                }
                Err(e) => {
                    warn!("Failed to parse tracked players, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No persisted tracked players");
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read tracked players, starting empty: {}", e);
                Vec::new()
            }
        };
        Self { entries, backend }
    }

    /// Parse a serialized store. Duplicate ids keep their first occurrence.
    pub fn entries_from_blob(blob: &str) -> Result<Vec<TrackedEntry>, PersistError> {
        let parsed: Vec<TrackedEntry> = serde_json::from_str(blob)?;
        let mut seen = HashSet::new();
        Ok(parsed
            .into_iter()
            .filter(|e| seen.insert(e.entity_id()))
            .collect())
    }

    /// Serialize the whole store.
    pub fn to_blob(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    pub fn list(&self) -> &[TrackedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, entity_id: u64) -> Option<&TrackedEntry> {
        self.entries.iter().find(|e| e.entity_id() == entity_id)
    }

    pub fn contains(&self, entity_id: u64) -> bool {
        self.get(entity_id).is_some()
    }

    fn position(&self, entity_id: u64) -> Option<usize> {
        self.entries.iter().position(|e| e.entity_id() == entity_id)
    }

    /// Insert, or replace in place when the id is already present.
    pub fn upsert(&mut self, entry: TrackedEntry) {
        match self.position(entry.entity_id()) {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
        self.persist();
    }

    /// Remove by id. Returns `true` if an entry existed.
    pub fn remove(&mut self, entity_id: u64) -> bool {
        let Some(idx) = self.position(entity_id) else {
            return false;
        };
        self.entries.remove(idx);
        self.persist();
        true
    }

    /// Enable or disable alerts for one metric.
    ///
    /// When `candidate`'s entity is not stored yet, `candidate` itself is
    /// inserted with the metric applied: choosing a metric to watch starts
    /// tracking. Disabling never removes the entry.
    pub fn set_tracked_metric(
        &mut self,
        candidate: &TrackedEntry,
        metric: Metric,
        enabled: bool,
    ) -> TrackOutcome {
        let outcome = match self.position(candidate.entity_id()) {
            Some(idx) => {
                self.entries[idx].set_tracking(metric, enabled);
                TrackOutcome::Updated
            }
            None => {
                let mut entry = candidate.clone();
                entry.set_tracking(metric, enabled);
                self.entries.push(entry);
                TrackOutcome::Created
            }
        };
        self.persist();
        outcome
    }

    /// Replace the stats of every listed entity, then persist once.
    ///
    /// Ids that are no longer stored (removed mid-cycle) are ignored.
    pub fn apply_stats(&mut self, batch: &[(u64, CanonicalStats)]) -> usize {
        let mut applied = 0;
        for (entity_id, stats) in batch {
            if let Some(idx) = self.position(*entity_id) {
                self.entries[idx].stats = stats.clone();
                applied += 1;
            }
        }
        if applied > 0 {
            self.persist();
        }
        applied
    }

    fn persist(&self) {
        let blob = match self.to_blob() {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to serialize tracked players: {}", e);
                return;
            }
        };
        if let Err(e) = self.backend.write(STORE_KEY, &blob) {
            warn!("Failed to persist tracked players: {}", e);
        }
    }
}
