// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Machine identity: a stable 16-byte UUID used solely as the PBKDF2
//! password for the encrypted credential store.
//!
//! Resolution order: OS identity (on Linux `/etc/machine-id`, then
//! `/var/lib/dbus/machine-id`; macOS is reserved for IOKit and currently
//! yields none), then a persisted random fallback in `.machine_id`.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rand::RngExt;
use tracing::warn;
use uuid::Uuid;

/// Fallback identity file: 16 raw bytes in the store directory.
pub const MACHINE_ID_FILE: &str = ".machine_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineIdSource {
    /// Read from the operating system.
    System,
    /// Random identity persisted to [`MACHINE_ID_FILE`].
    Generated,
    /// No identity could be obtained; encryption is unavailable.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineIdentity {
    pub uuid: Uuid,
    pub source: MachineIdSource,
}

impl MachineIdentity {
    /// Resolves the identity, generating and persisting a fallback under
    /// `fallback_dir` when the OS offers none. Stable across restarts on
    /// the same host.
    pub fn resolve(fallback_dir: impl AsRef<Path>) -> Self {
        if let Some(uuid) = system_machine_id() {
            return Self {
                uuid,
                source: MachineIdSource::System,
            };
        }
        match fallback_machine_id(fallback_dir.as_ref()) {
            Ok(uuid) => Self {
                uuid,
                source: MachineIdSource::Generated,
            },
            Err(err) => {
                warn!(%err, "machine identity unavailable");
                Self::unavailable()
            },
        }
    }

    pub fn unavailable() -> Self {
        Self {
            uuid: Uuid::nil(),
            source: MachineIdSource::Unavailable,
        }
    }

    pub fn is_available(&self) -> bool {
        self.source != MachineIdSource::Unavailable
    }

    /// Canonical dashed-hex rendering, the exact PBKDF2 password form.
    pub fn to_uuid_string(&self) -> String {
        self.uuid.hyphenated().to_string()
    }
}

#[cfg(target_os = "linux")]
fn system_machine_id() -> Option<Uuid> {
    for path in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
        if let Ok(text) = fs::read_to_string(path) {
            let trimmed = text.trim();
            if trimmed.len() == 32
                && let Ok(uuid) = Uuid::parse_str(trimmed)
            {
                return Some(uuid);
            }
        }
    }
    None
}

// IOKit platform expert UUID, not wired up yet.
#[cfg(target_os = "macos")]
fn system_machine_id() -> Option<Uuid> {
    None
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn system_machine_id() -> Option<Uuid> {
    None
}

fn fallback_machine_id(dir: &Path) -> io::Result<Uuid> {
    let path: PathBuf = dir.join(MACHINE_ID_FILE);
    if let Ok(raw) = fs::read(&path)
        && raw.len() == 16
        && let Ok(uuid) = Uuid::from_slice(&raw)
    {
        return Ok(uuid);
    }

    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    fs::write(&path, bytes)?;
    Ok(Uuid::from_bytes(bytes))
}
