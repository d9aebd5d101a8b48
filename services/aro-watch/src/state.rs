//! Last known availability and its persistence

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::AvailabilityResult;
use crate::WatchError;

/// What the runner remembers between cycles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorState {
    #[serde(default)]
    pub last_result: Option<AvailabilityResult>,
    #[serde(default)]
    pub last_notified_at: Option<DateTime<Utc>>,
}

impl MonitorState {
    pub fn last_available(&self) -> Option<bool> {
        self.last_result.as_ref().map(|r| r.available)
    }
}

/// Storage for the monitor state
pub trait StateStore: Send + Sync + std::fmt::Debug {
    /// Load the stored state; a store that has never been written yields the default
    fn load(&self) -> crate::Result<MonitorState>;

    /// Replace the stored state
    fn save(&self, state: &MonitorState) -> crate::Result<()>;

    /// Human readable location, for status output
    fn location(&self) -> String;
}

/// JSON file store with atomic replacement
#[derive(Debug, Clone)]
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> crate::Result<MonitorState> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                WatchError::State(format!("Corrupt state file {:?}: {}", self.path, e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No state file at {:?}, starting fresh", self.path);
                Ok(MonitorState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, state: &MonitorState) -> crate::Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // The temp file is removed on drop unless persisted
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(tmp.as_file_mut(), state)?;
        tmp.as_file_mut().write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| {
            WatchError::State(format!("Replacing state file {:?}: {}", self.path, e))
        })?;

        tracing::debug!("State saved to {:?}", self.path);
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-lifetime store
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    state: Mutex<MonitorState>,
}

impl MemoryStateStore {
    pub fn new(state: MonitorState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> crate::Result<MonitorState> {
        self.state
            .lock()
            .map(|s| s.clone())
            .map_err(|e| WatchError::State(format!("State lock poisoned: {}", e)))
    }

    fn save(&self, state: &MonitorState) -> crate::Result<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| WatchError::State(format!("State lock poisoned: {}", e)))?;
        *guard = state.clone();
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
