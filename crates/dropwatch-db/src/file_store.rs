//! JSON-file backend.
//!
//! Layout under the data directory:
//! - `snapshot.json`: the snapshot as an object keyed by variant id.
//! - `lock_state.json`: `{ "status": "locked", "updated_at": "..." }`.
//!
//! Writes go to a uniquely named temp file in the same directory which is
//! then renamed over the target, so readers never see a partial document.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dropwatch_core::{LockStatus, Snapshot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{LockStateStore, SnapshotStore};
use crate::StoreError;

const SNAPSHOT_FILE: &str = "snapshot.json";
const LOCK_STATE_FILE: &str = "lock_state.json";

#[derive(Debug, Serialize, Deserialize)]
struct LockStateRecord {
    status: LockStatus,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    #[must_use]
    pub fn lock_state_path(&self) -> PathBuf {
        self.data_dir.join(LOCK_STATE_FILE)
    }
}

impl SnapshotStore for FileStore {
    async fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(read_json::<Snapshot>(&self.snapshot_path())
            .await?
            .unwrap_or_default())
    }

    async fn replace(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        write_json_atomic(&self.snapshot_path(), snapshot).await?;
        tracing::debug!(
            variants = snapshot.len(),
            path = %self.snapshot_path().display(),
            "snapshot replaced"
        );
        Ok(())
    }
}

impl LockStateStore for FileStore {
    async fn load_lock_status(&self) -> Result<LockStatus, StoreError> {
        Ok(read_json::<LockStateRecord>(&self.lock_state_path())
            .await?
            .map_or(LockStatus::Unknown, |record| record.status))
    }

    async fn save_lock_status(&self, status: LockStatus) -> Result<(), StoreError> {
        let record = LockStateRecord {
            status,
            updated_at: Utc::now(),
        };
        write_json_atomic(&self.lock_state_path(), &record).await
    }
}

/// Reads and decodes `path`; a missing file is `Ok(None)`.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_error(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        })
}

async fn write_json_atomic<T: Serialize + ?Sized>(
    path: &Path,
    value: &T,
) -> Result<(), StoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| io_error(dir, e))?;

    let body = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
        path: path.display().to_string(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map_or_else(|| "store".into(), |n| n.to_string_lossy());
    let tmp_path = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

    if let Err(e) = tokio::fs::write(&tmp_path, &body).await {
        return Err(io_error(&tmp_path, e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_error(path, e));
    }
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}
