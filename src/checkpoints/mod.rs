//! Checkpoints: point-in-time snapshots of a path's content
//!
//! A store keeps, per API path, an ordered list of immutable snapshots. Ids are
//! opaque to callers; they sort in creation order. Stores read from and restore
//! into whichever [`StorageBackend`] the manager hands them.

pub mod memory;
pub mod persistence;

pub use memory::MemoryCheckpointStore;
pub use persistence::SledCheckpointStore;

use crate::backend::StorageBackend;
use crate::error::ContentsError;
use crate::path::ApiPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshots kept per path unless configured otherwise
pub const DEFAULT_MAX_PER_PATH: usize = 10;

/// Caller-facing checkpoint metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointModel {
    pub id: String,
    pub last_modified: DateTime<Utc>,
}

/// Snapshot store contract
pub trait CheckpointStore: Send + Sync {
    /// Snapshot the current bytes at `path`
    fn create(
        &self,
        backend: &dyn StorageBackend,
        path: &ApiPath,
    ) -> Result<CheckpointModel, ContentsError>;

    /// Checkpoints of `path`, oldest first. Empty when there are none.
    fn list(&self, path: &ApiPath) -> Result<Vec<CheckpointModel>, ContentsError>;

    /// Overwrite `path` with the snapshot. Nothing is written unless the
    /// snapshot was found and read in full.
    fn restore(
        &self,
        backend: &dyn StorageBackend,
        path: &ApiPath,
        id: &str,
    ) -> Result<(), ContentsError>;

    fn delete(&self, path: &ApiPath, id: &str) -> Result<(), ContentsError>;

    /// Re-key checkpoints of `old` and everything under it to `new`
    fn rename_all(&self, old: &ApiPath, new: &ApiPath) -> Result<(), ContentsError>;

    /// Drop checkpoints of `path` and everything under it
    fn delete_all(&self, path: &ApiPath) -> Result<(), ContentsError>;
}

/// Opaque id for the `seq`-th checkpoint; fixed width so ids sort by creation
pub(crate) fn checkpoint_id(seq: u64) -> String {
    format!("{:016x}", seq)
}

/// Current bytes of a file, or `NotFound`
pub(crate) fn snapshot_source(
    backend: &dyn StorageBackend,
    path: &ApiPath,
) -> Result<Vec<u8>, ContentsError> {
    if !backend.file_exists(path)? {
        return Err(ContentsError::NotFound(path.to_string()));
    }
    Ok(backend.read_raw(path)?)
}

pub(crate) fn checkpoint_not_found(path: &ApiPath, id: &str) -> ContentsError {
    ContentsError::NotFound(format!("checkpoint {} for {}", id, path))
}
