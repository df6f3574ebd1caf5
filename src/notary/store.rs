//! Known-good signature store
//!
//! A bounded set of digests signed by this installation. Once the bound is hit
//! the least recently seen digests are evicted, and the notebooks they vouched
//! for load as untrusted again. Entries carry a monotonically increasing
//! sequence number refreshed on every successful check.

use super::{Digest, DigestAlgorithm};
use crate::error::StorageError;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Stored metadata for one known-good digest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub algorithm: DigestAlgorithm,
    pub signed_at_ms: u64,
    pub last_seen_ms: u64,
    /// Recency rank; larger is more recent
    pub seq: u64,
}

/// Size and age bound of a signature store
#[derive(Debug, Clone, PartialEq)]
pub struct StorePolicy {
    /// Entry count above which the store culls
    pub max_entries: usize,
    /// Entries not seen for this long stop counting as trusted
    pub max_age: Option<Duration>,
    /// Fraction of `max_entries` kept after a cull
    pub cull_fraction: f64,
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self {
            max_entries: 65_535,
            max_age: None,
            cull_fraction: 0.75,
        }
    }
}

impl StorePolicy {
    /// Number of entries left after a cull
    pub fn cull_target(&self) -> usize {
        let target = (self.max_entries as f64 * self.cull_fraction).floor() as usize;
        target.clamp(1, self.max_entries.max(1))
    }

    pub fn is_expired(&self, record: &SignatureRecord, now_ms: u64) -> bool {
        match self.max_age {
            Some(age) => now_ms.saturating_sub(record.last_seen_ms) > age.as_millis() as u64,
            None => false,
        }
    }
}

/// Persistence contract for known-good digests
///
/// Implementations must be safe for concurrent `store`/`check`: a reader never
/// observes a partially written record.
pub trait SignatureStore: Send + Sync {
    /// Record `digest` as known-good, refreshing it if already present
    fn store(&self, digest: &Digest, algorithm: DigestAlgorithm) -> Result<(), StorageError>;

    /// Is `digest` known-good under `algorithm`? A hit refreshes its recency.
    fn check(&self, digest: &Digest, algorithm: DigestAlgorithm) -> Result<bool, StorageError>;

    /// Forget `digest`
    fn remove(&self, digest: &Digest) -> Result<(), StorageError>;

    /// Number of stored digests
    fn len(&self) -> Result<usize, StorageError>;

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

pub(crate) fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Pick the least recent entries to drop so that `target` remain
pub(crate) fn eviction_victims(mut entries: Vec<(u64, Digest)>, target: usize) -> Vec<Digest> {
    if entries.len() <= target {
        return Vec::new();
    }
    entries.sort_unstable_by_key(|(seq, _)| *seq);
    let excess = entries.len() - target;
    entries.into_iter().take(excess).map(|(_, d)| d).collect()
}

/// In-process signature store
pub struct MemorySignatureStore {
    records: RwLock<HashMap<Digest, SignatureRecord>>,
    next_seq: AtomicU64,
    policy: StorePolicy,
}

impl MemorySignatureStore {
    pub fn new(policy: StorePolicy) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
            policy,
        }
    }

    fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MemorySignatureStore {
    fn default() -> Self {
        Self::new(StorePolicy::default())
    }
}

impl SignatureStore for MemorySignatureStore {
    fn store(&self, digest: &Digest, algorithm: DigestAlgorithm) -> Result<(), StorageError> {
        let now = now_millis();
        let seq = self.next_seq();
        let mut records = self.records.write();
        let signed_at_ms = records
            .get(digest)
            .map(|r| r.signed_at_ms)
            .unwrap_or(now);
        records.insert(
            *digest,
            SignatureRecord {
                algorithm,
                signed_at_ms,
                last_seen_ms: now,
                seq,
            },
        );
        if records.len() > self.policy.max_entries {
            let entries = records.iter().map(|(d, r)| (r.seq, *d)).collect();
            for victim in eviction_victims(entries, self.policy.cull_target()) {
                records.remove(&victim);
            }
        }
        Ok(())
    }

    fn check(&self, digest: &Digest, algorithm: DigestAlgorithm) -> Result<bool, StorageError> {
        let now = now_millis();
        let mut records = self.records.write();
        let Some(record) = records.get(digest) else {
            return Ok(false);
        };
        if record.algorithm != algorithm {
            return Ok(false);
        }
        if self.policy.is_expired(record, now) {
            records.remove(digest);
            return Ok(false);
        }
        let seq = self.next_seq();
        if let Some(record) = records.get_mut(digest) {
            record.last_seen_ms = now;
            record.seq = seq;
        }
        Ok(true)
    }

    fn remove(&self, digest: &Digest) -> Result<(), StorageError> {
        self.records.write().remove(digest);
        Ok(())
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.records.read().len())
    }
}
