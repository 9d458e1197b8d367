//! Shared helpers for the tracker integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use sofatracker_core::config::TrackerConfig;
use sofatracker_core::engine::{Tracker, TrackerHandle};
use sofatracker_core::errors::{FetchError, PersistError};
use sofatracker_core::notify::NotificationCenter;
use sofatracker_core::power::PowerModeController;
use sofatracker_core::provider::{Endpoint, StatsSource};
use sofatracker_core::tracking::{StateBackend, TrackedEntityStore};

/// Serves per-path payloads that tests can swap between cycles.
#[derive(Default)]
pub struct ScriptedSource {
    payloads: Mutex<HashMap<String, Result<Value, u16>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub fn set(&self, path: &str, payload: Value) {
        self.payloads
            .lock()
            .unwrap()
            .insert(path.to_string(), Ok(payload));
    }

    pub fn fail(&self, path: &str, status: u16) {
        self.payloads
            .lock()
            .unwrap()
            .insert(path.to_string(), Err(status));
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl StatsSource for ScriptedSource {
    async fn fetch(&self, endpoint: &Endpoint) -> Result<Value, FetchError> {
        let path = endpoint.path();
        self.requests.lock().unwrap().push(path.clone());
        let scripted = self.payloads.lock().unwrap().get(&path).cloned();
        match scripted {
            Some(Ok(payload)) => Ok(payload),
            Some(Err(status)) => Err(FetchError::Status {
                status,
                endpoint: path,
            }),
            None => Err(FetchError::NotFound(path)),
        }
    }
}

/// One JSON file per key inside a directory.
pub struct DirBackend {
    pub dir: PathBuf,
}

impl StateBackend for DirBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.dir.join(format!("{key}.json"))) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), PersistError> {
        fs::write(self.dir.join(format!("{key}.json")), blob)?;
        Ok(())
    }
}

pub fn tracker(backend: Box<dyn StateBackend>) -> Tracker {
    let config = TrackerConfig::default();
    Tracker::new(
        config.clone(),
        TrackedEntityStore::load(backend),
        NotificationCenter::new(config.notification_ttl(), config.native_delay(), None),
        PowerModeController::detached(),
    )
}

pub fn handle(backend: Box<dyn StateBackend>, source: Arc<ScriptedSource>) -> TrackerHandle {
    TrackerHandle::new(tracker(backend), source)
}
