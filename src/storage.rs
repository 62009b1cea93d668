// SPDX-License-Identifier: GPL-3.0-only

//! Snapshot export to disk
//!
//! Exporting never changes the gallery; it only copies encoded bytes out
//! under `wizard-<n>.png`, where `n` is the 1-based gallery position.

use crate::config::Config;
use crate::constants::snapshots;
use crate::errors::SnapshotError;
use crate::pipelines::snapshot::{BlobRegistry, SnapshotStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name for the snapshot at gallery position `index` (0 = most recent)
pub fn export_file_name(index: usize) -> String {
    format!("{}-{}.png", snapshots::EXPORT_PREFIX, index + 1)
}

/// Directory snapshots are exported to
///
/// The configured override wins; otherwise the user's pictures directory,
/// falling back to the current directory.
pub fn export_dir(config: &Config) -> PathBuf {
    if let Some(dir) = &config.export_dir {
        return dir.clone();
    }
    dirs::picture_dir()
        .map(|dir| dir.join("webcam-wizard"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Write the snapshot at `index` into `dir`
pub async fn export_snapshot<R: BlobRegistry>(
    store: &SnapshotStore<R>,
    index: usize,
    dir: &Path,
) -> Result<PathBuf, SnapshotError> {
    let snapshot = store.get(index).ok_or(SnapshotError::NotFound(index))?;
    let data = store
        .data(snapshot)
        .ok_or(SnapshotError::NotFound(index))?;

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| SnapshotError::ExportFailed(format!("{}: {}", dir.display(), e)))?;

    let path = dir.join(export_file_name(index));
    debug!(path = %path.display(), size = data.len(), "Exporting snapshot");
    tokio::fs::write(&path, &data[..])
        .await
        .map_err(|e| SnapshotError::ExportFailed(format!("{}: {}", path.display(), e)))?;

    info!(path = %path.display(), "Snapshot exported");
    Ok(path)
}

/// Write every snapshot in gallery order
pub async fn export_all<R: BlobRegistry>(
    store: &SnapshotStore<R>,
    dir: &Path,
) -> Result<Vec<PathBuf>, SnapshotError> {
    let mut paths = Vec::with_capacity(store.len());
    for index in 0..store.len() {
        paths.push(export_snapshot(store, index, dir).await?);
    }
    Ok(paths)
}
