// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! AES-256-GCM encrypted credential store.
//!
//! File layout: `nonce(12) ‖ ciphertext ‖ tag(16)`, empty associated
//! data. The key is PBKDF2-HMAC-SHA-256 over the dashed machine UUID
//! with a fixed salt and 100 000 iterations, derived once per store and
//! zeroed when the store drops. A decrypt failure loads as `None`: that
//! is how a blob written on different hardware announces itself.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use pbkdf2::pbkdf2_hmac;
use rand::RngExt;
use sha2::Sha256;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::auth::{
    credentials::{CredentialRecord, CredentialStore, StoreError},
    machine::MachineIdentity,
};

/// Credential blob file name within the store directory.
pub const CREDENTIAL_FILE: &str = "auth.enc";

pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const PBKDF2_SALT: &[u8] = b"HytaleAuthCredentialStore";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypted file-backed store keyed by the machine identity.
pub struct EncryptedCredentialStore {
    path: PathBuf,
    key: Option<Zeroizing<[u8; 32]>>,
}

impl EncryptedCredentialStore {
    /// Creates a store writing to `dir/auth.enc`. Without a usable
    /// machine identity the store still loads (`None`) but refuses to
    /// save.
    pub fn new(dir: impl AsRef<Path>, identity: &MachineIdentity) -> Self {
        let key = identity
            .is_available()
            .then(|| derive_key(&identity.to_uuid_string()));
        Self {
            path: dir.as_ref().join(CREDENTIAL_FILE),
            key,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// PBKDF2-HMAC-SHA-256 with the store's fixed salt and iteration count.
pub fn derive_key(machine_uuid: &str) -> Zeroizing<[u8; 32]> {
    let mut key = Zeroizing::new([0u8; 32]);
    pbkdf2_hmac::<Sha256>(
        machine_uuid.as_bytes(),
        PBKDF2_SALT,
        PBKDF2_ITERATIONS,
        key.as_mut(),
    );
    key
}

impl CredentialStore for EncryptedCredentialStore {
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        let Some(key) = self.key.as_ref() else {
            return Ok(None);
        };
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Ok(None);
        }

        let cipher = Aes256Gcm::new_from_slice(key.as_ref())
            .map_err(|_| StoreError::Crypto)?;
        let nonce = Nonce::from_slice(&raw[..NONCE_LEN]);
        let Ok(plaintext) = cipher.decrypt(nonce, &raw[NONCE_LEN..]) else {
            // Tag mismatch: produced under a different machine key.
            debug!(path = %self.path.display(), "credential blob failed to decrypt");
            return Ok(None);
        };

        match serde_json::from_slice(&plaintext) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(%err, "credential plaintext is not a valid record");
                Ok(None)
            },
        }
    }

    fn save(&mut self, record: &CredentialRecord) -> Result<(), StoreError> {
        let key = self.key.as_ref().ok_or(StoreError::NoEncryptionKey)?;
        let plaintext = serde_json::to_vec(record)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        let cipher = Aes256Gcm::new_from_slice(key.as_ref())
            .map_err(|_| StoreError::Crypto)?;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|_| StoreError::Crypto)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        fs::write(&self.path, blob)?;
        Ok(())
    }

    fn clear(&mut self) {
        if let Err(err) = fs::remove_file(&self.path)
            && err.kind() != io::ErrorKind::NotFound
        {
            warn!(%err, path = %self.path.display(), "failed to clear credential file");
        }
    }

    fn is_encryption_available(&self) -> bool {
        self.key.is_some()
    }
}
