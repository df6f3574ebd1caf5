//! In-process checkpoint store

use super::{
    checkpoint_id, checkpoint_not_found, snapshot_source, CheckpointModel, CheckpointStore,
    DEFAULT_MAX_PER_PATH,
};
use crate::backend::StorageBackend;
use crate::error::ContentsError;
use crate::path::ApiPath;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

struct Snapshot {
    meta: CheckpointModel,
    content: Vec<u8>,
}

pub struct MemoryCheckpointStore {
    snapshots: RwLock<HashMap<ApiPath, Vec<Snapshot>>>,
    seq: AtomicU64,
    max_per_path: usize,
}

impl Default for MemoryCheckpointStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PER_PATH)
    }
}

impl MemoryCheckpointStore {
    pub fn new(max_per_path: usize) -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            seq: AtomicU64::new(0),
            max_per_path: max_per_path.max(1),
        }
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn create(
        &self,
        backend: &dyn StorageBackend,
        path: &ApiPath,
    ) -> Result<CheckpointModel, ContentsError> {
        let content = snapshot_source(backend, path)?;
        let meta = CheckpointModel {
            id: checkpoint_id(self.seq.fetch_add(1, Ordering::SeqCst)),
            last_modified: Utc::now(),
        };
        let mut snapshots = self.snapshots.write();
        let list = snapshots.entry(path.clone()).or_default();
        list.push(Snapshot {
            meta: meta.clone(),
            content,
        });
        if list.len() > self.max_per_path {
            let excess = list.len() - self.max_per_path;
            list.drain(..excess);
            debug!(path = %path, evicted = excess, "Evicted oldest checkpoints");
        }
        Ok(meta)
    }

    fn list(&self, path: &ApiPath) -> Result<Vec<CheckpointModel>, ContentsError> {
        Ok(self
            .snapshots
            .read()
            .get(path)
            .map(|list| list.iter().map(|s| s.meta.clone()).collect())
            .unwrap_or_default())
    }

    fn restore(
        &self,
        backend: &dyn StorageBackend,
        path: &ApiPath,
        id: &str,
    ) -> Result<(), ContentsError> {
        let content = {
            let snapshots = self.snapshots.read();
            snapshots
                .get(path)
                .and_then(|list| list.iter().find(|s| s.meta.id == id))
                .map(|s| s.content.clone())
                .ok_or_else(|| checkpoint_not_found(path, id))?
        };
        if !backend.file_exists(path)? {
            return Err(ContentsError::NotFound(path.to_string()));
        }
        backend.write_raw(path, &content)?;
        Ok(())
    }

    fn delete(&self, path: &ApiPath, id: &str) -> Result<(), ContentsError> {
        let mut snapshots = self.snapshots.write();
        let list = snapshots
            .get_mut(path)
            .ok_or_else(|| checkpoint_not_found(path, id))?;
        let before = list.len();
        list.retain(|s| s.meta.id != id);
        if list.len() == before {
            return Err(checkpoint_not_found(path, id));
        }
        Ok(())
    }

    fn rename_all(&self, old: &ApiPath, new: &ApiPath) -> Result<(), ContentsError> {
        let mut snapshots = self.snapshots.write();
        let moved: Vec<ApiPath> = snapshots
            .keys()
            .filter(|p| p.starts_with(old))
            .cloned()
            .collect();
        for from in moved {
            if let (Some(list), Some(to)) = (snapshots.remove(&from), from.rebase(old, new)) {
                snapshots.insert(to, list);
            }
        }
        Ok(())
    }

    fn delete_all(&self, path: &ApiPath) -> Result<(), ContentsError> {
        self.snapshots.write().retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}
