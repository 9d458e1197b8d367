//! On-disk state for the tracker store.
//!
//! Each key is stored as `<dir>/<key>.json`. A missing file reads as "no
//! state"; writes create the directory on demand.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use sofatracker_core::errors::PersistError;
use sofatracker_core::tracking::StateBackend;

#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    dir: PathBuf,
}

impl JsonFileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(PersistError::Unavailable(format!("invalid state key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl StateBackend for JsonFileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => {
                debug!("Read {} bytes from {}", contents.len(), path.display());
                Ok(Some(contents))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No state file at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Atomic replace.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, blob)?;
        std::fs::rename(&tmp, &path)?;
        debug!("Wrote {} bytes to {}", blob.len(), path.display());
        Ok(())
    }
}
