//! JSON snapshots of a [`MemoryBackend`].
//!
//! A snapshot is the whole store serialized with `serde_json`. Loading a path
//! that does not exist yields a fresh site, so the first run against a new
//! `--store` file behaves like an empty host.

use crate::{MemoryBackend, StoreState};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load a store from `path`, or a fresh site if the file is missing.
pub fn load(path: &Path) -> Result<MemoryBackend, SnapshotError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no snapshot; starting fresh");
        return Ok(MemoryBackend::new());
    }
    let contents = std::fs::read_to_string(path)?;
    let state: StoreState = serde_json::from_str(&contents)?;
    Ok(MemoryBackend::from_state(state))
}

/// Write the store to `path`, creating parent directories as needed.
pub fn save(backend: &MemoryBackend, path: &Path) -> Result<(), SnapshotError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(backend.state())?;
    std::fs::write(path, json)?;
    tracing::debug!(path = %path.display(), "snapshot saved");
    Ok(())
}
