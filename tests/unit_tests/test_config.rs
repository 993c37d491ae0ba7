// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, path::PathBuf};

use hytale_server_rs::cfg::config::{
    AuthServiceConfig, Config, DEFAULT_AUDIENCE, DEFAULT_CLIENT_ID, DEFAULT_DEVICE_URL,
    DEFAULT_SCOPE, DEFAULT_TOKEN_URL, ENV_DEVICE_URL, ENV_SERVER_CERT_FINGERPRINT,
    ENV_SERVER_IDENTITY_TOKEN, ENV_SERVER_SESSION_TOKEN, ENV_TOKEN_URL,
    ServerCredentialsConfig,
};
use rand::RngExt;
use serial_test::serial;

fn set_env(name: &str, value: &str) {
    unsafe { std::env::set_var(name, value) };
}

fn clear_env(name: &str) {
    unsafe { std::env::remove_var(name) };
}

#[test]
#[serial]
fn test_defaults() {
    clear_env(ENV_DEVICE_URL);
    clear_env(ENV_TOKEN_URL);
    let cfg = AuthServiceConfig::from_env();
    assert_eq!(cfg.device_url, DEFAULT_DEVICE_URL);
    assert_eq!(cfg.token_url, DEFAULT_TOKEN_URL);
    assert_eq!(cfg.client_id, DEFAULT_CLIENT_ID);
    assert_eq!(cfg.scope, DEFAULT_SCOPE);
    assert_eq!(cfg.audience, DEFAULT_AUDIENCE);
}

#[test]
#[serial]
fn test_env_overrides_endpoints() {
    set_env(ENV_DEVICE_URL, "https://idp.test/device");
    set_env(ENV_TOKEN_URL, "https://idp.test/token");
    let cfg = AuthServiceConfig::from_env();
    assert_eq!(cfg.device_url, "https://idp.test/device");
    assert_eq!(cfg.token_url, "https://idp.test/token");
    clear_env(ENV_DEVICE_URL);
    clear_env(ENV_TOKEN_URL);
}

#[test]
#[serial]
fn test_server_credentials_from_env() {
    clear_env(ENV_SERVER_SESSION_TOKEN);
    clear_env(ENV_SERVER_IDENTITY_TOKEN);
    clear_env(ENV_SERVER_CERT_FINGERPRINT);
    let cfg = ServerCredentialsConfig::from_env();
    assert!(!cfg.is_complete());
    assert_eq!(cfg.audience, DEFAULT_AUDIENCE);

    set_env(ENV_SERVER_SESSION_TOKEN, "st-env");
    set_env(ENV_SERVER_IDENTITY_TOKEN, "idt-env");
    set_env(ENV_SERVER_CERT_FINGERPRINT, &"ab".repeat(32));
    let cfg = ServerCredentialsConfig::from_env();
    assert!(cfg.is_complete());
    assert_eq!(cfg.session_token.as_deref(), Some("st-env"));
    assert_eq!(cfg.cert_fingerprint, Some([0xAB; 32]));

    // Malformed fingerprints are dropped, not fatal.
    set_env(ENV_SERVER_CERT_FINGERPRINT, "not-hex");
    let cfg = ServerCredentialsConfig::from_env();
    assert!(cfg.cert_fingerprint.is_none());

    clear_env(ENV_SERVER_SESSION_TOKEN);
    clear_env(ENV_SERVER_IDENTITY_TOKEN);
    clear_env(ENV_SERVER_CERT_FINGERPRINT);
}

#[test]
#[serial]
fn test_load_from_yaml() {
    clear_env(ENV_DEVICE_URL);
    clear_env(ENV_TOKEN_URL);

    let mut bytes = [0u8; 8];
    rand::rng().fill(&mut bytes);
    let path: PathBuf =
        std::env::temp_dir().join(format!("hytale-cfg-{}.yaml", hex::encode(bytes)));
    fs::write(
        &path,
        r#"
auth:
  ClientId: my-server
  SessionsBase: "https://sessions.test/"
runtime:
  CredentialDir: /var/lib/hytale
  RefreshIntervalSecs: 30
"#,
    )
    .expect("write failed");

    let cfg = Config::load_from_file(&path).expect("load failed");
    assert_eq!(cfg.auth.client_id, "my-server");
    // Trailing slash is normalized away.
    assert_eq!(cfg.auth.sessions_base, "https://sessions.test");
    // Unset keys fall back to defaults.
    assert_eq!(cfg.auth.device_url, DEFAULT_DEVICE_URL);
    assert_eq!(cfg.runtime.credential_dir, "/var/lib/hytale");
    assert_eq!(cfg.runtime.refresh_interval.as_secs(), 30);

    fs::remove_file(&path).ok();
}

#[test]
fn test_validation_rejects_bad_urls() {
    let mut cfg = Config::default();
    cfg.auth.device_url = "ftp://nope".to_string();
    assert!(cfg.validate_and_normalize().is_err());

    let mut cfg = Config::default();
    cfg.auth.client_id = String::new();
    assert!(cfg.validate_and_normalize().is_err());
}
