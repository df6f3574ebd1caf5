//! Storage backends
//!
//! The manager never touches physical storage itself. A [`StorageBackend`]
//! supplies existence checks, raw reads, atomic writes, listings, renames and
//! removals over API paths. The concrete backend is picked from configuration
//! at startup.

pub mod fs;
pub mod memory;

pub use fs::FileSystemBackend;
pub use memory::MemoryBackend;

use crate::error::StorageError;
use crate::path::ApiPath;
use chrono::{DateTime, Utc};

/// Metadata for one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStat {
    pub is_dir: bool,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub writable: bool,
}

/// Physical storage provider contract
pub trait StorageBackend: Send + Sync {
    fn dir_exists(&self, path: &ApiPath) -> Result<bool, StorageError>;

    fn file_exists(&self, path: &ApiPath) -> Result<bool, StorageError>;

    /// Full contents of a file
    fn read_raw(&self, path: &ApiPath) -> Result<Vec<u8>, StorageError>;

    /// Replace a file's contents atomically: readers see the old bytes or the
    /// new bytes, never a mix. The parent directory must exist.
    fn write_raw(&self, path: &ApiPath, content: &[u8]) -> Result<(), StorageError>;

    /// Names of immediate children, sorted
    fn list_children(&self, path: &ApiPath) -> Result<Vec<String>, StorageError>;

    /// Move an entry; fails if `to` exists
    fn rename(&self, from: &ApiPath, to: &ApiPath) -> Result<(), StorageError>;

    /// Remove a file or an empty directory
    fn delete_physical(&self, path: &ApiPath) -> Result<(), StorageError>;

    /// Create a directory; the parent must exist
    fn create_dir(&self, path: &ApiPath) -> Result<(), StorageError>;

    fn stat(&self, path: &ApiPath) -> Result<EntryStat, StorageError>;

    /// One-line human description, e.g. the served root
    fn describe(&self) -> String;
}
