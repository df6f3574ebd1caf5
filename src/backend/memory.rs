//! In-memory backend for ephemeral contents and tests

use super::{EntryStat, StorageBackend};
use crate::error::StorageError;
use crate::path::ApiPath;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    created: DateTime<Utc>,
    last_modified: DateTime<Utc>,
}

impl Entry {
    fn dir() -> Self {
        let now = Utc::now();
        Self {
            node: Node::Dir,
            created: now,
            last_modified: now,
        }
    }
}

/// Map of API path to entry; the root always exists
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<ApiPath, Entry>>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(ApiPath::root(), Entry::dir());
        Self {
            entries: RwLock::new(entries),
        }
    }
}

fn is_dir(entries: &BTreeMap<ApiPath, Entry>, path: &ApiPath) -> bool {
    matches!(entries.get(path), Some(Entry { node: Node::Dir, .. }))
}

fn require_parent_dir(
    entries: &BTreeMap<ApiPath, Entry>,
    path: &ApiPath,
) -> Result<(), StorageError> {
    if is_dir(entries, &path.parent()) {
        Ok(())
    } else {
        Err(StorageError::NotFound(path.parent().to_string()))
    }
}

impl StorageBackend for MemoryBackend {
    fn dir_exists(&self, path: &ApiPath) -> Result<bool, StorageError> {
        Ok(is_dir(&self.entries.read(), path))
    }

    fn file_exists(&self, path: &ApiPath) -> Result<bool, StorageError> {
        Ok(matches!(
            self.entries.read().get(path),
            Some(Entry {
                node: Node::File(_),
                ..
            })
        ))
    }

    fn read_raw(&self, path: &ApiPath) -> Result<Vec<u8>, StorageError> {
        match self.entries.read().get(path) {
            Some(Entry {
                node: Node::File(bytes),
                ..
            }) => Ok(bytes.clone()),
            Some(_) => Err(StorageError::InvalidPath(format!("{} is a directory", path))),
            None => Err(StorageError::NotFound(path.to_string())),
        }
    }

    fn write_raw(&self, path: &ApiPath, content: &[u8]) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        require_parent_dir(&entries, path)?;
        let now = Utc::now();
        match entries.get_mut(path) {
            Some(Entry { node: Node::Dir, .. }) => Err(StorageError::AlreadyExists(format!(
                "{} is a directory",
                path
            ))),
            Some(entry) => {
                entry.node = Node::File(content.to_vec());
                entry.last_modified = now;
                Ok(())
            }
            None => {
                entries.insert(
                    path.clone(),
                    Entry {
                        node: Node::File(content.to_vec()),
                        created: now,
                        last_modified: now,
                    },
                );
                Ok(())
            }
        }
    }

    fn list_children(&self, path: &ApiPath) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read();
        if !is_dir(&entries, path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let mut names: Vec<String> = entries
            .keys()
            .filter(|p| !p.is_root() && p.parent() == *path)
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn rename(&self, from: &ApiPath, to: &ApiPath) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if !entries.contains_key(from) {
            return Err(StorageError::NotFound(from.to_string()));
        }
        if entries.contains_key(to) {
            return Err(StorageError::AlreadyExists(to.to_string()));
        }
        require_parent_dir(&entries, to)?;
        let moved: Vec<ApiPath> = entries
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let (Some(entry), Some(new)) = (entries.remove(&old), old.rebase(from, to)) {
                entries.insert(new, entry);
            }
        }
        Ok(())
    }

    fn delete_physical(&self, path: &ApiPath) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if path.is_root() {
            return Err(StorageError::InvalidPath("cannot delete the root".to_string()));
        }
        if !entries.contains_key(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let has_children = entries
            .keys()
            .any(|p| p != path && p.starts_with(path));
        if has_children {
            return Err(StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("directory not empty: {}", path),
            )));
        }
        entries.remove(path);
        Ok(())
    }

    fn create_dir(&self, path: &ApiPath) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        if entries.contains_key(path) {
            return Err(StorageError::AlreadyExists(path.to_string()));
        }
        require_parent_dir(&entries, path)?;
        entries.insert(path.clone(), Entry::dir());
        Ok(())
    }

    fn stat(&self, path: &ApiPath) -> Result<EntryStat, StorageError> {
        let entries = self.entries.read();
        let entry = entries
            .get(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        let (is_dir, size) = match &entry.node {
            Node::Dir => (true, 0),
            Node::File(bytes) => (false, bytes.len() as u64),
        };
        Ok(EntryStat {
            is_dir,
            size,
            created: entry.created,
            last_modified: entry.last_modified,
            writable: true,
        })
    }

    fn describe(&self) -> String {
        "in-memory contents".to_string()
    }
}
