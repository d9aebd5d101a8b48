//! Tracing setup: stdout plus an optional append-only log file

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::{Result, WatchError};

/// Open `path` for appending, creating it and its parent directory if needed
pub fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| WatchError::Config(format!("cannot open log file {:?}: {}", path, e)))
}

/// Install the global subscriber. Must be called once, before any other logging.
pub fn init_tracing(level: Level, file: Option<&Path>) -> Result<()> {
    let file_layer = match file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .map_err(|e| WatchError::Config(format!("cannot install logger: {}", e)))
}
