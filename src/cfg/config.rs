// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

pub const DEFAULT_DEVICE_URL: &str =
    "https://oauth.accounts.hytale.com/oauth2/device/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth.accounts.hytale.com/oauth2/token";
pub const DEFAULT_SESSIONS_BASE: &str = "https://sessions.hytale.com";
pub const DEFAULT_ACCOUNT_DATA_BASE: &str = "https://account-data.hytale.com";
pub const DEFAULT_CLIENT_ID: &str = "hytale-server";
pub const DEFAULT_SCOPE: &str = "openid offline auth:server";
pub const DEFAULT_AUDIENCE: &str = "hytale-game-server";

pub const ENV_DEVICE_URL: &str = "HYTALE_AUTH_DEVICE_URL";
pub const ENV_TOKEN_URL: &str = "HYTALE_AUTH_TOKEN_URL";
pub const ENV_SERVER_SESSION_TOKEN: &str = "HYTALE_SERVER_SESSION_TOKEN";
pub const ENV_SERVER_IDENTITY_TOKEN: &str = "HYTALE_SERVER_IDENTITY_TOKEN";
pub const ENV_SERVER_CERT_FINGERPRINT: &str = "HYTALE_SERVER_CERT_FINGERPRINT";
pub const ENV_SERVER_AUDIENCE: &str = "HYTALE_SERVER_AUDIENCE";

/// Single cross-platform environment accessor; empty values count as
/// unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Config {
    /// Identity provider / session service endpoints and OAuth client
    /// identity.
    #[serde(default)]
    pub auth: AuthServiceConfig,
    /// Implementation/runtime parameters that never travel on the wire.
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Endpoints and client identity for the device-flow and session
/// clients.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AuthServiceConfig {
    #[serde(default = "default_device_url", rename = "DeviceUrl")]
    pub device_url: String,

    #[serde(default = "default_token_url", rename = "TokenUrl")]
    pub token_url: String,

    #[serde(default = "default_sessions_base", rename = "SessionsBase")]
    pub sessions_base: String,

    #[serde(default = "default_account_data_base", rename = "AccountDataBase")]
    pub account_data_base: String,

    #[serde(default = "default_client_id", rename = "ClientId")]
    pub client_id: String,

    /// OAuth scopes, space separated; form-encoded when sent.
    #[serde(default = "default_scope", rename = "Scope")]
    pub scope: String,

    #[serde(default = "default_audience", rename = "Audience")]
    pub audience: String,
}

fn default_device_url() -> String {
    DEFAULT_DEVICE_URL.to_string()
}
fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}
fn default_sessions_base() -> String {
    DEFAULT_SESSIONS_BASE.to_string()
}
fn default_account_data_base() -> String {
    DEFAULT_ACCOUNT_DATA_BASE.to_string()
}
fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}
fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}
fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            device_url: default_device_url(),
            token_url: default_token_url(),
            sessions_base: default_sessions_base(),
            account_data_base: default_account_data_base(),
            client_id: default_client_id(),
            scope: default_scope(),
            audience: default_audience(),
        }
    }
}

impl AuthServiceConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Applies `HYTALE_AUTH_*` / `HYTALE_SERVER_AUDIENCE` overrides on
    /// top of whatever the config file supplied.
    pub fn apply_env(&mut self) {
        if let Some(url) = env_var(ENV_DEVICE_URL) {
            self.device_url = url;
        }
        if let Some(url) = env_var(ENV_TOKEN_URL) {
            self.token_url = url;
        }
        if let Some(aud) = env_var(ENV_SERVER_AUDIENCE) {
            self.audience = aud;
        }
    }
}

/// Runtime-only settings.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RuntimeConfig {
    /// Directory holding `auth.enc` and the `.machine_id` fallback.
    #[serde(default = "default_credential_dir", rename = "CredentialDir")]
    pub credential_dir: String,

    /// Cadence for the manager's periodic refresh check.
    #[serde(
        default = "default_refresh_interval",
        rename = "RefreshIntervalSecs",
        with = "serde_secs"
    )]
    pub refresh_interval: Duration,
}

fn default_credential_dir() -> String {
    ".".to_string()
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(60)
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            credential_dir: default_credential_dir(),
            refresh_interval: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Loads the configuration from YAML, applies environment overrides,
    /// validates, and returns the ready-to-use value.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path)?;
        let mut cfg: Config =
            serde_yaml::from_str(&s).context("failed to parse config YAML")?;
        cfg.auth.apply_env();
        cfg.validate_and_normalize()?;
        Ok(cfg)
    }

    /// Defaults plus environment overrides, no file involved.
    pub fn from_env() -> Self {
        Self {
            auth: AuthServiceConfig::from_env(),
            runtime: RuntimeConfig::default(),
        }
    }

    /// Validates invariants and normalizes derived fields.
    pub fn validate_and_normalize(&mut self) -> Result<()> {
        for (name, url) in [
            ("DeviceUrl", &self.auth.device_url),
            ("TokenUrl", &self.auth.token_url),
            ("SessionsBase", &self.auth.sessions_base),
            ("AccountDataBase", &self.auth.account_data_base),
        ] {
            ensure!(
                url.starts_with("http://") || url.starts_with("https://"),
                "{name} must be an http(s) URL, got {url:?}"
            );
        }
        for base in [&mut self.auth.sessions_base, &mut self.auth.account_data_base] {
            while base.ends_with('/') {
                base.pop();
            }
        }

        ensure!(!self.auth.client_id.is_empty(), "ClientId must not be empty");
        ensure!(!self.auth.scope.is_empty(), "Scope must not be empty");
        ensure!(!self.auth.audience.is_empty(), "Audience must not be empty");
        ensure!(
            self.runtime.refresh_interval >= Duration::from_secs(1),
            "RefreshIntervalSecs must be >= 1"
        );
        Ok(())
    }
}

/// Server-side credentials injected through the environment for hosts
/// that already own a session (external-session mode).
#[derive(Debug, Clone, Default)]
pub struct ServerCredentialsConfig {
    pub session_token: Option<String>,
    pub identity_token: Option<String>,
    pub cert_fingerprint: Option<[u8; 32]>,
    pub audience: String,
}

impl ServerCredentialsConfig {
    pub fn from_env() -> Self {
        let cert_fingerprint = env_var(ENV_SERVER_CERT_FINGERPRINT)
            .and_then(|text| hex::decode(text.trim()).ok())
            .and_then(|raw| <[u8; 32]>::try_from(raw.as_slice()).ok());
        Self {
            session_token: env_var(ENV_SERVER_SESSION_TOKEN),
            identity_token: env_var(ENV_SERVER_IDENTITY_TOKEN),
            cert_fingerprint,
            audience: env_var(ENV_SERVER_AUDIENCE)
                .unwrap_or_else(|| DEFAULT_AUDIENCE.to_string()),
        }
    }

    /// True when both tokens are present.
    pub fn is_complete(&self) -> bool {
        self.session_token.is_some() && self.identity_token.is_some()
    }
}

/// Serde helpers for representing `Duration` as a number of seconds.
mod serde_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}
