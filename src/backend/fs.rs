//! Local filesystem backend
//!
//! API paths map onto a root directory. Writes go to a temporary sibling file
//! which is then renamed over the target, so a crash or an abandoned save
//! leaves either the previous or the new content.

use super::{EntryStat, StorageBackend};
use crate::error::StorageError;
use crate::path::ApiPath;
use chrono::{DateTime, Utc};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Prefix of in-flight temporary files; never listed
pub const TEMP_PREFIX: &str = ".~nbcontents-";

pub struct FileSystemBackend {
    root: PathBuf,
    temp_counter: AtomicU64,
}

impl FileSystemBackend {
    /// Serve the directory at `root`, creating it if needed
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| {
            StorageError::IoError(io::Error::new(
                e.kind(),
                format!("Failed to create root directory {:?}: {}", root, e),
            ))
        })?;
        let root = dunce::canonicalize(root).map_err(|e| {
            StorageError::InvalidPath(format!("Failed to canonicalize root {:?}: {}", root, e))
        })?;
        Ok(Self {
            root,
            temp_counter: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem location of an API path
    pub fn os_path(&self, path: &ApiPath) -> PathBuf {
        let mut out = self.root.clone();
        for segment in path.segments() {
            out.push(segment);
        }
        out
    }

    fn temp_path_for(&self, target: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::SeqCst);
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        target.with_file_name(format!(
            "{}{}.{}.{}.tmp",
            TEMP_PREFIX,
            name,
            std::process::id(),
            n
        ))
    }
}

fn map_io(path: &ApiPath, err: io::Error) -> StorageError {
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
        io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.to_string()),
        _ => StorageError::IoError(err),
    }
}

fn to_utc(time: io::Result<std::time::SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

impl StorageBackend for FileSystemBackend {
    fn dir_exists(&self, path: &ApiPath) -> Result<bool, StorageError> {
        Ok(self.os_path(path).is_dir())
    }

    fn file_exists(&self, path: &ApiPath) -> Result<bool, StorageError> {
        Ok(self.os_path(path).is_file())
    }

    fn read_raw(&self, path: &ApiPath) -> Result<Vec<u8>, StorageError> {
        fs::read(self.os_path(path)).map_err(|e| map_io(path, e))
    }

    fn write_raw(&self, path: &ApiPath, content: &[u8]) -> Result<(), StorageError> {
        let target = self.os_path(path);
        if target.is_dir() {
            return Err(StorageError::AlreadyExists(format!(
                "{} is a directory",
                path
            )));
        }
        let temp = self.temp_path_for(&target);

        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&temp)?;
            file.write_all(content)?;
            file.sync_all()?;
            fs::rename(&temp, &target)
        };
        write().map_err(|e| {
            // Clean up temp file on error
            let _ = fs::remove_file(&temp);
            map_io(path, e)
        })?;

        debug!(path = %path, bytes = content.len(), "Wrote file");
        Ok(())
    }

    fn list_children(&self, path: &ApiPath) -> Result<Vec<String>, StorageError> {
        let dir = self.os_path(path);
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| map_io(path, e))? {
            let entry = entry?;
            match entry.file_name().into_string() {
                Ok(name) if name.starts_with(TEMP_PREFIX) => {}
                Ok(name) => names.push(name),
                Err(raw) => {
                    debug!(dir = %path, name = ?raw, "Skipping non UTF-8 entry");
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn rename(&self, from: &ApiPath, to: &ApiPath) -> Result<(), StorageError> {
        let source = self.os_path(from);
        let target = self.os_path(to);
        if !source.exists() {
            return Err(StorageError::NotFound(from.to_string()));
        }
        if target.exists() {
            return Err(StorageError::AlreadyExists(to.to_string()));
        }
        fs::rename(&source, &target).map_err(|e| map_io(to, e))
    }

    fn delete_physical(&self, path: &ApiPath) -> Result<(), StorageError> {
        let target = self.os_path(path);
        if target.is_dir() {
            fs::remove_dir(&target).map_err(|e| map_io(path, e))
        } else {
            fs::remove_file(&target).map_err(|e| map_io(path, e))
        }
    }

    fn create_dir(&self, path: &ApiPath) -> Result<(), StorageError> {
        fs::create_dir(self.os_path(path)).map_err(|e| map_io(path, e))
    }

    fn stat(&self, path: &ApiPath) -> Result<EntryStat, StorageError> {
        let meta = fs::metadata(self.os_path(path)).map_err(|e| map_io(path, e))?;
        let last_modified = to_utc(meta.modified()).unwrap_or_else(Utc::now);
        let created = to_utc(meta.created()).unwrap_or(last_modified);
        Ok(EntryStat {
            is_dir: meta.is_dir(),
            size: meta.len(),
            created,
            last_modified,
            writable: !meta.permissions().readonly(),
        })
    }

    fn describe(&self) -> String {
        format!("local directory: {}", self.root.display())
    }
}
