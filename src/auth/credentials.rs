// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Credential records and the store contract.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access tokens are treated as stale this many seconds before their
/// actual expiry.
pub const TOKEN_EXPIRY_SKEW_SECS: i64 = 300;

/// Persisted OAuth state for one account. UUIDs serialize as dashed hex
/// in the JSON plaintext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: i64,
    pub profile_uuid: Option<Uuid>,
    pub username: Option<String>,
    pub account_uuid: Option<Uuid>,
}

impl CredentialRecord {
    /// A refresh is possible iff a refresh token is held.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// The access token is usable iff present and not within
    /// [`TOKEN_EXPIRY_SKEW_SECS`] of expiry.
    pub fn access_token_valid(&self, now_unix: i64) -> bool {
        self.access_token.is_some() && now_unix < self.expires_at - TOKEN_EXPIRY_SKEW_SECS
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Save was requested but no encryption key could be derived (no
    /// machine identity on this host).
    #[error("no encryption key available")]
    NoEncryptionKey,

    #[error("credential store i/o failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential record serialization failed: {0}")]
    Serialize(String),

    #[error("credential encryption failed")]
    Crypto,
}

/// Store contract shared by the in-memory and encrypted-file backends.
///
/// `load` returns `None` both for "nothing saved yet" and for an
/// undecryptable blob; the latter is the observable signal that the file
/// was produced on different hardware.
pub trait CredentialStore: Send {
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError>;
    fn save(&mut self, record: &CredentialRecord) -> Result<(), StoreError>;
    fn clear(&mut self);
    fn is_encryption_available(&self) -> bool;
}

/// Volatile store; `save` deep-copies the record.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    record: Option<CredentialRecord>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.record.clone())
    }

    fn save(&mut self, record: &CredentialRecord) -> Result<(), StoreError> {
        self.record = Some(record.clone());
        Ok(())
    }

    fn clear(&mut self) {
        self.record = None;
    }

    fn is_encryption_available(&self) -> bool {
        true
    }
}
