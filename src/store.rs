//! Persistence adapter for session snapshots.

use crate::models::Session;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Where sessions are saved between restarts.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Vec<Session>, StoreError>;
    fn save(&self, sessions: &[Session]) -> Result<(), StoreError>;
}

/// All sessions in one JSON file. A missing file loads as no sessions.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Session>, StoreError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Written to a sibling temp file first, then renamed over the old snapshot.
    fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(sessions)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Keeps the last saved snapshot in memory. Used when no data file is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<Session>>,
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.sessions.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        *self.sessions.lock().map_err(|_| StoreError::Poisoned)? = sessions.to_vec();
        Ok(())
    }
}
