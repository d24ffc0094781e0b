// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-disk snapshot of the cached summary list, used for warm starts.

use crate::models::WorkoutSummary;
use crate::time_utils::format_utc_rfc3339;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    saved_at: String,
    workouts: Vec<WorkoutSummary>,
}

/// JSON file holding the last reconciled summary list.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot. A missing file is `Ok(None)`.
    pub async fn load(&self) -> Result<Option<Vec<WorkoutSummary>>, SnapshotError> {
        let data = match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_str(&data)?;
        Ok(Some(snapshot.workouts))
    }

    /// Write the snapshot, replacing any previous one.
    ///
    /// Written to a sibling temp file first and renamed into place.
    pub async fn save(&self, workouts: &[WorkoutSummary]) -> Result<(), SnapshotError> {
        let snapshot = Snapshot {
            saved_at: format_utc_rfc3339(chrono::Utc::now()),
            workouts: workouts.to_vec(),
        };
        let data = serde_json::to_vec(&snapshot)?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    /// Remove the snapshot. A missing file is not an error.
    pub async fn clear(&self) -> Result<(), SnapshotError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Errors from snapshot operations.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}
