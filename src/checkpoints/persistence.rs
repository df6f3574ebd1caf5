//! Sled-backed checkpoint store
//!
//! Two trees share one key layout, `<path> 0x00 <id>`: the index holds
//! [`CheckpointModel`] records and the blob tree the snapshot bytes. Blobs are
//! written before their index entry and removed after it, so a listed
//! checkpoint always has its bytes. Paths never contain NUL, and ids are fixed
//! width, so a prefix scan over `<path> 0x00` yields one path's checkpoints in
//! creation order.

use super::{
    checkpoint_id, checkpoint_not_found, snapshot_source, CheckpointModel, CheckpointStore,
    DEFAULT_MAX_PER_PATH,
};
use crate::backend::StorageBackend;
use crate::error::{ContentsError, StorageError};
use crate::path::ApiPath;
use chrono::Utc;
use std::path::Path;
use tracing::debug;

const TREE_INDEX: &str = "checkpoint_index";
const TREE_BLOBS: &str = "checkpoint_blobs";
const SEPARATOR: u8 = 0;

pub struct SledCheckpointStore {
    db: sled::Db,
    index: sled::Tree,
    blobs: sled::Tree,
    max_per_path: usize,
}

fn path_prefix(path: &ApiPath) -> Vec<u8> {
    let mut key = path.as_str().as_bytes().to_vec();
    key.push(SEPARATOR);
    key
}

fn entry_key(path: &ApiPath, id: &str) -> Vec<u8> {
    let mut key = path_prefix(path);
    key.extend_from_slice(id.as_bytes());
    key
}

/// Split a stored key back into path and id
fn parse_key(key: &[u8]) -> Result<(ApiPath, String), StorageError> {
    let sep = key
        .iter()
        .position(|b| *b == SEPARATOR)
        .ok_or_else(|| StorageError::Serialization("checkpoint key without separator".into()))?;
    let path = std::str::from_utf8(&key[..sep])
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let id = std::str::from_utf8(&key[sep + 1..])
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    let path = ApiPath::try_from(path)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok((path, id.to_string()))
}

impl SledCheckpointStore {
    /// Open (or create) the store at `path`
    pub fn new<P: AsRef<Path>>(path: P, max_per_path: usize) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db, max_per_path)
    }

    pub fn from_db(db: sled::Db, max_per_path: usize) -> Result<Self, StorageError> {
        let index = db.open_tree(TREE_INDEX)?;
        let blobs = db.open_tree(TREE_BLOBS)?;
        Ok(Self {
            db,
            index,
            blobs,
            max_per_path: max_per_path.max(1),
        })
    }

    /// In-memory database, removed on drop
    pub fn temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db, DEFAULT_MAX_PER_PATH)
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn records(&self, path: &ApiPath) -> Result<Vec<CheckpointModel>, StorageError> {
        let mut out = Vec::new();
        for item in self.index.scan_prefix(path_prefix(path)) {
            let (_, value) = item?;
            out.push(bincode::deserialize(&value)?);
        }
        Ok(out)
    }

    fn remove_entry(&self, key: &[u8]) -> Result<bool, StorageError> {
        let existed = self.index.remove(key)?.is_some();
        self.blobs.remove(key)?;
        Ok(existed)
    }

    /// Keys of every checkpoint at or under `path`
    fn keys_under(&self, path: &ApiPath) -> Result<Vec<(Vec<u8>, ApiPath, String)>, StorageError> {
        let mut out = Vec::new();
        for item in self.index.scan_prefix(path.as_str().as_bytes()) {
            let (key, _) = item?;
            let (entry_path, id) = parse_key(&key)?;
            if entry_path.starts_with(path) {
                out.push((key.to_vec(), entry_path, id));
            }
        }
        Ok(out)
    }

    fn evict_excess(&self, path: &ApiPath) -> Result<(), StorageError> {
        let records = self.records(path)?;
        if records.len() <= self.max_per_path {
            return Ok(());
        }
        let excess = records.len() - self.max_per_path;
        for record in &records[..excess] {
            self.remove_entry(&entry_key(path, &record.id))?;
        }
        debug!(path = %path, evicted = excess, "Evicted oldest checkpoints");
        Ok(())
    }
}

impl CheckpointStore for SledCheckpointStore {
    fn create(
        &self,
        backend: &dyn StorageBackend,
        path: &ApiPath,
    ) -> Result<CheckpointModel, ContentsError> {
        let content = snapshot_source(backend, path)?;
        let id = checkpoint_id(self.db.generate_id().map_err(StorageError::from)?);
        let meta = CheckpointModel {
            id,
            last_modified: Utc::now(),
        };
        let key = entry_key(path, &meta.id);
        let record = bincode::serialize(&meta).map_err(StorageError::from)?;
        self.blobs.insert(&key, content).map_err(StorageError::from)?;
        self.index.insert(&key, record).map_err(StorageError::from)?;
        self.evict_excess(path)?;
        Ok(meta)
    }

    fn list(&self, path: &ApiPath) -> Result<Vec<CheckpointModel>, ContentsError> {
        Ok(self.records(path)?)
    }

    fn restore(
        &self,
        backend: &dyn StorageBackend,
        path: &ApiPath,
        id: &str,
    ) -> Result<(), ContentsError> {
        let key = entry_key(path, id);
        if !self.index.contains_key(&key).map_err(StorageError::from)? {
            return Err(checkpoint_not_found(path, id));
        }
        let content = self
            .blobs
            .get(&key)
            .map_err(StorageError::from)?
            .ok_or_else(|| checkpoint_not_found(path, id))?;
        if !backend.file_exists(path)? {
            return Err(ContentsError::NotFound(path.to_string()));
        }
        backend.write_raw(path, &content)?;
        Ok(())
    }

    fn delete(&self, path: &ApiPath, id: &str) -> Result<(), ContentsError> {
        if self.remove_entry(&entry_key(path, id))? {
            Ok(())
        } else {
            Err(checkpoint_not_found(path, id))
        }
    }

    fn rename_all(&self, old: &ApiPath, new: &ApiPath) -> Result<(), ContentsError> {
        for (key, entry_path, id) in self.keys_under(old)? {
            let Some(target) = entry_path.rebase(old, new) else {
                continue;
            };
            let new_key = entry_key(&target, &id);
            if let Some(blob) = self.blobs.get(&key).map_err(StorageError::from)? {
                self.blobs.insert(&new_key, blob).map_err(StorageError::from)?;
            }
            if let Some(record) = self.index.get(&key).map_err(StorageError::from)? {
                self.index.insert(&new_key, record).map_err(StorageError::from)?;
            }
            self.remove_entry(&key)?;
        }
        Ok(())
    }

    fn delete_all(&self, path: &ApiPath) -> Result<(), ContentsError> {
        for (key, _, _) in self.keys_under(path)? {
            self.remove_entry(&key)?;
        }
        Ok(())
    }
}
