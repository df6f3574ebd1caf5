//! Sled-backed signature store

use super::store::{eviction_victims, now_millis, SignatureRecord, SignatureStore, StorePolicy};
use super::{Digest, DigestAlgorithm};
use crate::error::StorageError;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

const TREE_SIGNATURES: &str = "notary_signatures";

/// Persistent known-good store
///
/// One sled tree keyed by digest. Each record is written with a single
/// `insert`, so concurrent readers see either the old or the new record.
/// Refreshing on `check` is a compare-and-swap against the record it read, so
/// it never resurrects an entry removed in between.
/// Recency sequence numbers come from `Db::generate_id`, which is monotonic
/// across restarts.
pub struct SledSignatureStore {
    db: sled::Db,
    signatures: sled::Tree,
    count: AtomicUsize,
    cull_guard: Mutex<()>,
    policy: StorePolicy,
}

impl SledSignatureStore {
    /// Open (or create) the store at `path`
    pub fn new<P: AsRef<Path>>(path: P, policy: StorePolicy) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Self::from_db(db, policy)
    }

    /// Use an already opened database
    pub fn from_db(db: sled::Db, policy: StorePolicy) -> Result<Self, StorageError> {
        let signatures = db.open_tree(TREE_SIGNATURES)?;
        let count = AtomicUsize::new(signatures.len());
        Ok(Self {
            db,
            signatures,
            count,
            cull_guard: Mutex::new(()),
            policy,
        })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn get_record(&self, digest: &Digest) -> Result<Option<SignatureRecord>, StorageError> {
        match self.signatures.get(digest)? {
            Some(raw) => Ok(Some(bincode::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    fn put_record(&self, digest: &Digest, record: &SignatureRecord) -> Result<(), StorageError> {
        let value = bincode::serialize(record)?;
        if self.signatures.insert(digest, value)?.is_none() {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn delete_record(&self, digest: &Digest) -> Result<(), StorageError> {
        if self.signatures.remove(digest)?.is_some() {
            self.count.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    fn cull(&self) -> Result<(), StorageError> {
        let _guard = self.cull_guard.lock();
        if self.count.load(Ordering::SeqCst) <= self.policy.max_entries {
            return Ok(());
        }

        let mut entries = Vec::new();
        for item in self.signatures.iter() {
            let (key, value) = item?;
            let record: SignatureRecord = bincode::deserialize(&value)?;
            let Ok(digest) = <Digest>::try_from(&key[..]) else {
                continue;
            };
            entries.push((record.seq, digest));
        }

        let victims = eviction_victims(entries, self.policy.cull_target());
        debug!(evicted = victims.len(), "Culling signature store");
        for victim in victims {
            self.delete_record(&victim)?;
        }
        Ok(())
    }
}

impl SignatureStore for SledSignatureStore {
    fn store(&self, digest: &Digest, algorithm: DigestAlgorithm) -> Result<(), StorageError> {
        let now = now_millis();
        let signed_at_ms = self
            .get_record(digest)?
            .map(|r| r.signed_at_ms)
            .unwrap_or(now);
        let record = SignatureRecord {
            algorithm,
            signed_at_ms,
            last_seen_ms: now,
            seq: self.db.generate_id()?,
        };
        self.put_record(digest, &record)?;

        if self.count.load(Ordering::SeqCst) > self.policy.max_entries {
            self.cull()?;
        }
        Ok(())
    }

    fn check(&self, digest: &Digest, algorithm: DigestAlgorithm) -> Result<bool, StorageError> {
        loop {
            let Some(raw) = self.signatures.get(digest)? else {
                return Ok(false);
            };
            let mut record: SignatureRecord = bincode::deserialize(&raw)?;
            if record.algorithm != algorithm {
                return Ok(false);
            }
            let now = now_millis();
            if self.policy.is_expired(&record, now) {
                let removed = self
                    .signatures
                    .compare_and_swap(digest, Some(&raw[..]), None::<&[u8]>)?;
                if removed.is_ok() {
                    self.count.fetch_sub(1, Ordering::SeqCst);
                }
                return Ok(false);
            }
            record.last_seen_ms = now;
            record.seq = self.db.generate_id()?;
            let value = bincode::serialize(&record)?;
            // A concurrent remove or cull wins; a concurrent refresh retries
            match self
                .signatures
                .compare_and_swap(digest, Some(&raw[..]), Some(value))?
            {
                Ok(()) => return Ok(true),
                Err(_) => continue,
            }
        }
    }

    fn remove(&self, digest: &Digest) -> Result<(), StorageError> {
        self.delete_record(digest)
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.count.load(Ordering::SeqCst))
    }
}
