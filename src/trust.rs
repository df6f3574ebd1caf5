//! Trust mediation between the notary and notebook cells
//!
//! Per load/save cycle a notebook moves through:
//!
//! ```text
//! Unchecked --load--> Trusted | Untrusted
//! Trusted   --save--> Signed
//! Untrusted --save--> Untrusted   (no signature written)
//! any       --force-> Signed
//! any       --revoke-> Untrusted  (signature removed)
//! ```

use crate::error::ContentsError;
use crate::notary::NotebookNotary;
use crate::notebook::Notebook;
use crate::path::ApiPath;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a notebook stands in its load/save cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustState {
    Unchecked,
    Trusted,
    Untrusted,
    Signed,
}

/// Applies notary verdicts to notebook cells
#[derive(Clone)]
pub struct TrustMediator {
    notary: Arc<NotebookNotary>,
}

impl TrustMediator {
    pub fn new(notary: Arc<NotebookNotary>) -> Self {
        Self { notary }
    }

    pub fn notary(&self) -> &Arc<NotebookNotary> {
        &self.notary
    }

    /// Flag every code cell from the stored signature. Called on load.
    ///
    /// Never fails: an unreachable store leaves the notebook untrusted.
    pub fn mark_cells_from_signature(&self, nb: &mut Notebook, path: &ApiPath) -> TrustState {
        let trusted = match self.notary.check_signature(nb) {
            Ok(trusted) => trusted,
            Err(e) => {
                warn!(path = %path, error = %e, "Signature check failed; treating notebook as untrusted");
                false
            }
        };
        if !trusted {
            warn!(path = %path, "Notebook is not trusted");
        }
        self.notary.mark_cells(nb, trusted);
        if trusted {
            TrustState::Trusted
        } else {
            TrustState::Untrusted
        }
    }

    /// Sign the notebook if every code cell is trusted. Called before save.
    ///
    /// An untrusted notebook is never re-signed. A store failure is logged and
    /// the save goes ahead unsigned.
    pub fn prepare_for_save(&self, nb: &Notebook, path: &ApiPath) -> TrustState {
        if !self.notary.check_cells(nb) {
            warn!(path = %path, "Saving untrusted notebook");
            return TrustState::Untrusted;
        }
        match self.notary.sign(nb) {
            Ok(()) => {
                debug!(path = %path, "Signed notebook");
                TrustState::Signed
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to sign notebook; saving unsigned");
                TrustState::Untrusted
            }
        }
    }

    /// Explicit user trust: flag every code cell trusted and sign unconditionally
    pub fn force_trust(&self, nb: &mut Notebook, path: &ApiPath) -> Result<TrustState, ContentsError> {
        warn!(path = %path, "Trusting notebook");
        self.notary.mark_cells(nb, true);
        self.notary.sign(nb)?;
        Ok(TrustState::Signed)
    }

    /// Explicit user distrust: drop the signature and flag every code cell untrusted
    pub fn revoke(&self, nb: &mut Notebook, path: &ApiPath) -> Result<TrustState, ContentsError> {
        warn!(path = %path, "Revoking notebook trust");
        self.notary.unsign(nb)?;
        self.notary.mark_cells(nb, false);
        Ok(TrustState::Untrusted)
    }
}
