//! Per-path locking
//!
//! Writers to the same API path (saves, checkpoint create/restore, renames,
//! deletes) take the path's write lock. Different paths never contend.

use crate::path::ApiPath;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

pub type PathLock = Arc<RwLock<()>>;

/// Hands out one lock per normalized path
#[derive(Default)]
pub struct PathLockManager {
    locks: Mutex<HashMap<ApiPath, PathLock>>,
}

impl PathLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `path`, created on first use
    ///
    /// Creating a lock first drops every entry nobody else holds. Handles are
    /// only cloned under the map mutex, so a count of one means no thread holds
    /// or waits on that lock.
    pub fn get_lock(&self, path: &ApiPath) -> PathLock {
        let mut locks = self.locks.lock();
        if let Some(lock) = locks.get(path) {
            return lock.clone();
        }
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let lock = Arc::new(RwLock::new(()));
        locks.insert(path.clone(), lock.clone());
        lock
    }

    /// Locks for two paths, in acquisition order
    ///
    /// Callers must take them first to second. The order is fixed by path so
    /// two renames over the same pair cannot deadlock. `None` when both paths
    /// are equal.
    pub fn get_pair(&self, a: &ApiPath, b: &ApiPath) -> (PathLock, Option<PathLock>) {
        if a == b {
            return (self.get_lock(a), None);
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        (self.get_lock(first), Some(self.get_lock(second)))
    }

    /// Number of paths with a tracked lock
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
