//! Notary signing key

use crate::error::{ContentsError, StorageError};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::info;

pub const KEY_SIZE: usize = 32;

const DERIVE_CONTEXT: &str = "nbcontents 2024 notebook notary signing key";

/// Secret key for keyed notebook digests
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey([u8; KEY_SIZE]);

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

impl From<[u8; KEY_SIZE]> for SigningKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        SigningKey(bytes)
    }
}

impl SigningKey {
    /// Random key from the OS RNG
    pub fn generate() -> Result<Self, ContentsError> {
        let mut buff = [0u8; KEY_SIZE];
        getrandom::getrandom(&mut buff).map_err(|e| {
            ContentsError::ConfigError(format!("Failed to generate signing key: {}", e))
        })?;
        Ok(Self(buff))
    }

    /// Key from arbitrary secret material
    ///
    /// 64 hex characters are taken verbatim; anything else is run through the
    /// BLAKE3 key derivation function.
    pub fn from_secret(secret: &[u8]) -> Self {
        let trimmed = std::str::from_utf8(secret).map(str::trim).ok();
        if let Some(text) = trimmed {
            if text.len() == KEY_SIZE * 2 {
                let mut buff = [0u8; KEY_SIZE];
                if hex::decode_to_slice(text, &mut buff).is_ok() {
                    return Self(buff);
                }
            }
        }
        Self(blake3::derive_key(DERIVE_CONTEXT, secret))
    }

    /// Read the key from `path`, generating and persisting a fresh one if absent
    pub fn load_or_create(path: &Path) -> Result<Self, ContentsError> {
        if path.is_file() {
            let secret = fs::read(path).map_err(StorageError::from)?;
            return Ok(Self::from_secret(&secret));
        }

        let key = Self::generate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(StorageError::from)?;
        }
        fs::write(path, hex::encode(key.0)).map_err(StorageError::from)?;
        restrict_permissions(path)?;
        info!(secret_file = %path.display(), "Generated new notary signing key");
        Ok(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ContentsError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(StorageError::from)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ContentsError> {
    Ok(())
}
