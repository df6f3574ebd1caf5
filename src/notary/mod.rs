//! Notebook Notary
//!
//! Computes a keyed digest over a notebook's trust-relevant content (the ordered
//! code-cell sources) and records digests of notebooks this installation
//! signed. A notebook is trusted iff its current digest is in the known-good
//! store; there is no partial matching.

pub mod key;
pub mod persistence;
pub mod store;

pub use key::SigningKey;
pub use persistence::SledSignatureStore;
pub use store::{MemorySignatureStore, SignatureRecord, SignatureStore, StorePolicy};

use crate::error::{ContentsError, StorageError};
use crate::notebook::Notebook;
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Notebook digest
pub type Digest = [u8; 32];

/// Domain separator mixed into every digest
const DIGEST_DOMAIN: &[u8] = b"nbcontents-notary-v1";

/// Digest algorithm used for signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[serde(rename = "blake3-keyed")]
    Blake3Keyed,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Blake3Keyed => "blake3-keyed",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = ContentsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blake3-keyed" | "blake3" => Ok(DigestAlgorithm::Blake3Keyed),
            other => Err(ContentsError::ConfigError(format!(
                "Unsupported digest algorithm: {}",
                other
            ))),
        }
    }
}

/// Signs notebooks and checks signatures against the known-good store
pub struct NotebookNotary {
    key: SigningKey,
    algorithm: DigestAlgorithm,
    store: Arc<dyn SignatureStore>,
}

impl NotebookNotary {
    pub fn new(key: SigningKey, algorithm: DigestAlgorithm, store: Arc<dyn SignatureStore>) -> Self {
        Self {
            key,
            algorithm,
            store,
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn store(&self) -> &Arc<dyn SignatureStore> {
        &self.store
    }

    /// Digest of the notebook's trust-relevant content
    ///
    /// Order-sensitive over code-cell sources; each source is length-prefixed
    /// so cell boundaries cannot be shifted. Markdown and raw cells, metadata
    /// and outputs do not contribute.
    pub fn compute_signature(&self, nb: &Notebook) -> Digest {
        match self.algorithm {
            DigestAlgorithm::Blake3Keyed => {
                let mut hasher = Hasher::new_keyed(self.key.as_bytes());
                hasher.update(DIGEST_DOMAIN);
                for cell in nb.code_cells() {
                    let source = cell.source.text();
                    hasher.update(&(source.len() as u64).to_be_bytes());
                    hasher.update(source.as_bytes());
                }
                *hasher.finalize().as_bytes()
            }
        }
    }

    /// Record the notebook's current digest as known-good
    pub fn sign(&self, nb: &Notebook) -> Result<(), ContentsError> {
        let digest = self.compute_signature(nb);
        self.store
            .store(&digest, self.algorithm)
            .map_err(store_unavailable)
    }

    /// Is the notebook's current digest known-good?
    pub fn check_signature(&self, nb: &Notebook) -> Result<bool, ContentsError> {
        let digest = self.compute_signature(nb);
        self.store
            .check(&digest, self.algorithm)
            .map_err(store_unavailable)
    }

    /// Forget the notebook's current digest
    pub fn unsign(&self, nb: &Notebook) -> Result<(), ContentsError> {
        let digest = self.compute_signature(nb);
        self.store.remove(&digest).map_err(store_unavailable)
    }

    /// Set every code cell's trust flag
    pub fn mark_cells(&self, nb: &mut Notebook, trusted: bool) {
        for cell in nb.code_cells_mut() {
            cell.set_trusted(trusted);
        }
    }

    /// True iff every code cell is currently flagged trusted
    pub fn check_cells(&self, nb: &Notebook) -> bool {
        nb.code_cells().all(|c| c.is_trusted())
    }
}

fn store_unavailable(err: StorageError) -> ContentsError {
    ContentsError::TrustStoreUnavailable(err.to_string())
}
