// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! State machine coverage: device-flow ordering, profile selection,
//! refresh, restore, offline modes and the server-join handshake.

use std::sync::Arc;

use hytale_server_rs::{
    auth::{
        credentials::CredentialRecord,
        http::{Clock, HttpClient},
        manager::{
            AuthError, AuthManager, AuthMode, AuthState, ManagerPoll, RestoreOutcome,
        },
        session::certificate_fingerprint,
    },
    cfg::config::{AuthServiceConfig, ServerCredentialsConfig},
};
use uuid::Uuid;

use crate::unit_tests::common::{FakeClock, FakeHttp, SharedStore};

const NOW: i64 = 1_700_000_000;
const PROFILE_A: &str = "123e4567-e89b-12d3-a456-426614174000";
const PROFILE_B: &str = "223e4567-e89b-12d3-a456-426614174000";

fn manager(http: &Arc<FakeHttp>, clock: &Arc<FakeClock>, store: &SharedStore) -> AuthManager {
    let http: Arc<dyn HttpClient> = http.clone();
    let clock: Arc<dyn Clock> = clock.clone();
    AuthManager::new(
        http,
        clock,
        &AuthServiceConfig::default(),
        Box::new(store.clone()),
    )
}

fn push_device_auth(http: &FakeHttp) {
    http.push_json(
        200,
        r#"{
            "device_code": "dev-123",
            "user_code": "WDJB-MJHT",
            "verification_uri": "https://accounts.hytale.com/activate",
            "expires_in": 600,
            "interval": 5
        }"#,
    );
}

fn push_tokens(http: &FakeHttp) {
    http.push_json(
        200,
        r#"{
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 3600
        }"#,
    );
}

fn push_single_profile(http: &FakeHttp) {
    http.push_json(
        200,
        &format!(
            r#"{{"profiles": [{{"uuid": "{PROFILE_A}", "username": "kweebec"}}]}}"#
        ),
    );
}

fn push_two_profiles(http: &FakeHttp) {
    http.push_json(
        200,
        &format!(
            r#"{{"profiles": [
                {{"uuid": "{PROFILE_A}", "username": "kweebec"}},
                {{"uuid": "{PROFILE_B}", "username": "trork"}}
            ]}}"#
        ),
    );
}

fn push_session(http: &FakeHttp, token: &str) {
    http.push_json(
        200,
        &format!(
            r#"{{
                "sessionToken": "{token}",
                "identityToken": "idt-{token}",
                "expiresAt": "2026-01-23T20:43:39Z"
            }}"#
        ),
    );
}

/// Runs the happy path to `Authenticated` and returns the manager.
async fn authenticated_manager(
    http: &Arc<FakeHttp>,
    clock: &Arc<FakeClock>,
    store: &SharedStore,
) -> AuthManager {
    let mut mgr = manager(http, clock, store);
    push_device_auth(http);
    mgr.start_device_flow().await.expect("start failed");
    push_tokens(http);
    push_single_profile(http);
    push_session(http, "st-1");
    let outcome = mgr.poll_device_flow().await.expect("poll failed");
    assert!(matches!(outcome, ManagerPoll::Authenticated));
    mgr
}

#[tokio::test]
async fn test_device_flow_single_profile() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mut mgr = manager(&http, &clock, &store);
    assert_eq!(mgr.state(), AuthState::Idle);
    assert_eq!(mgr.mode(), AuthMode::None);

    push_device_auth(&http);
    let auth = mgr.start_device_flow().await.expect("start failed");
    assert_eq!(auth.user_code, "WDJB-MJHT");
    assert_eq!(mgr.state(), AuthState::Polling);
    assert_eq!(mgr.mode(), AuthMode::OauthDevice);

    http.push_json(400, r#"{"error":"authorization_pending"}"#);
    let outcome = mgr.poll_device_flow().await.expect("poll failed");
    assert!(matches!(outcome, ManagerPoll::Pending { .. }));
    assert_eq!(mgr.state(), AuthState::Polling);

    push_tokens(&http);
    push_single_profile(&http);
    push_session(&http, "st-1");
    let outcome = mgr.poll_device_flow().await.expect("poll failed");
    assert!(matches!(outcome, ManagerPoll::Authenticated));
    assert_eq!(mgr.state(), AuthState::Authenticated);

    let session = mgr.session().expect("missing session");
    assert_eq!(session.session_token, "st-1");
    assert_eq!(session.username, "kweebec");

    // Session creation happens-before the first save (O4).
    assert_eq!(store.saves(), 1);
    let record = store.record().expect("nothing persisted");
    assert_eq!(record.access_token.as_deref(), Some("at-1"));
    assert_eq!(record.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(record.expires_at, NOW + 3600);
    assert_eq!(
        record.profile_uuid,
        Some(Uuid::parse_str(PROFILE_A).expect("bad uuid"))
    );
}

#[tokio::test]
async fn test_device_flow_profile_selection() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mut mgr = manager(&http, &clock, &store);

    push_device_auth(&http);
    mgr.start_device_flow().await.expect("start failed");

    push_tokens(&http);
    push_two_profiles(&http);
    let outcome = mgr.poll_device_flow().await.expect("poll failed");
    let profiles = match outcome {
        ManagerPoll::ProfileSelectionRequired(profiles) => profiles,
        other => panic!("expected profile selection, got {other:?}"),
    };
    assert_eq!(profiles.len(), 2);
    assert_eq!(mgr.state(), AuthState::AwaitingProfileSelection);
    assert_eq!(store.saves(), 0, "nothing persisted before a session exists");

    // Unknown profile is rejected without a state change.
    let bogus = Uuid::from_u128(0xDEAD);
    assert!(matches!(
        mgr.select_profile(bogus).await,
        Err(AuthError::UnknownProfile(u)) if u == bogus
    ));
    assert_eq!(mgr.state(), AuthState::AwaitingProfileSelection);

    push_session(&http, "st-2");
    mgr.select_profile(Uuid::parse_str(PROFILE_B).expect("bad uuid"))
        .await
        .expect("select failed");
    assert_eq!(mgr.state(), AuthState::Authenticated);
    assert_eq!(mgr.session().expect("missing session").username, "trork");
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn test_denied_flow_fails() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mut mgr = manager(&http, &clock, &store);

    push_device_auth(&http);
    mgr.start_device_flow().await.expect("start failed");

    http.push_json(400, r#"{"error":"access_denied"}"#);
    assert!(mgr.poll_device_flow().await.is_err());
    assert_eq!(mgr.state(), AuthState::Failed);
    assert!(mgr.last_error().expect("missing error").contains("denied"));

    // Terminal states re-enter through reset.
    mgr.reset();
    assert_eq!(mgr.state(), AuthState::Idle);
    assert_eq!(mgr.mode(), AuthMode::None);
}

#[tokio::test]
async fn test_ordering_is_enforced() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mut mgr = manager(&http, &clock, &store);

    // Poll before a successful start (O1).
    assert!(matches!(
        mgr.poll_device_flow().await,
        Err(AuthError::InvalidState(AuthState::Idle))
    ));
    // Select before profiles were fetched (O3).
    assert!(matches!(
        mgr.select_profile(Uuid::from_u128(1)).await,
        Err(AuthError::InvalidState(AuthState::Idle))
    ));

    push_device_auth(&http);
    mgr.start_device_flow().await.expect("start failed");
    // A second start while a flow is running.
    assert!(matches!(
        mgr.start_device_flow().await,
        Err(AuthError::InvalidState(AuthState::Polling))
    ));
}

#[tokio::test]
async fn test_check_and_refresh_renews_token_and_session() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mut mgr = authenticated_manager(&http, &clock, &store).await;
    let saves_before = store.saves();

    // Still fresh: nothing happens.
    assert!(!mgr.check_and_refresh().await.expect("check failed"));

    // Move to 299 s before expiry, inside the 300 s skew.
    clock.set(NOW + 3301);
    http.push_json(
        200,
        r#"{"access_token": "at-2", "expires_in": 3600}"#,
    );
    push_session(&http, "st-2");
    assert!(mgr.check_and_refresh().await.expect("refresh failed"));

    assert_eq!(mgr.state(), AuthState::Authenticated);
    assert_eq!(mgr.session().expect("missing session").session_token, "st-2");

    let record = store.record().expect("nothing persisted");
    assert_eq!(record.access_token.as_deref(), Some("at-2"));
    // Provider sent no new refresh token: the old one is retained.
    assert_eq!(record.refresh_token.as_deref(), Some("rt-1"));
    assert_eq!(record.expires_at, NOW + 3301 + 3600);
    assert_eq!(store.saves(), saves_before + 1);
}

#[tokio::test]
async fn test_check_and_refresh_skips_offline_modes() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();

    let mut mgr = manager(&http, &clock, &store);
    mgr.start_singleplayer("hermit");
    assert!(!mgr.check_and_refresh().await.expect("check failed"));

    let mut mgr = manager(&http, &clock, &store);
    mgr.use_external_session("ext-st".to_string(), "ext-idt".to_string());
    assert!(!mgr.check_and_refresh().await.expect("check failed"));

    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn test_restore_auto_selects_stored_profile() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::with_record(CredentialRecord {
        access_token: Some("at-stored".to_string()),
        refresh_token: Some("rt-stored".to_string()),
        expires_at: NOW + 3600,
        profile_uuid: Some(Uuid::parse_str(PROFILE_B).expect("bad uuid")),
        username: Some("trork".to_string()),
        account_uuid: None,
    });
    let mut mgr = manager(&http, &clock, &store);

    push_two_profiles(&http);
    push_session(&http, "st-restored");
    let outcome = mgr.initialize_from_store().await.expect("restore failed");
    assert!(matches!(outcome, RestoreOutcome::Authenticated));
    assert_eq!(mgr.state(), AuthState::Authenticated);
    assert_eq!(mgr.mode(), AuthMode::OauthStore);
    assert_eq!(mgr.session().expect("missing session").username, "trork");
}

#[tokio::test]
async fn test_restore_refreshes_stale_token_first() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::with_record(CredentialRecord {
        access_token: Some("at-stale".to_string()),
        refresh_token: Some("rt-stored".to_string()),
        expires_at: NOW - 10,
        profile_uuid: Some(Uuid::parse_str(PROFILE_A).expect("bad uuid")),
        username: Some("kweebec".to_string()),
        account_uuid: None,
    });
    let mut mgr = manager(&http, &clock, &store);

    http.push_json(
        200,
        r#"{"access_token": "at-fresh", "expires_in": 3600}"#,
    );
    push_single_profile(&http);
    push_session(&http, "st-fresh");
    let outcome = mgr.initialize_from_store().await.expect("restore failed");
    assert!(matches!(outcome, RestoreOutcome::Authenticated));

    let refresh = &http.requests()[0];
    assert!(refresh.body.contains("refresh_token=rt-stored"));
    let record = store.record().expect("nothing persisted");
    assert_eq!(record.access_token.as_deref(), Some("at-fresh"));
}

#[tokio::test]
async fn test_restore_without_match_surfaces_selection() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::with_record(CredentialRecord {
        access_token: Some("at-stored".to_string()),
        refresh_token: Some("rt-stored".to_string()),
        expires_at: NOW + 3600,
        profile_uuid: Some(Uuid::from_u128(0xBEEF)),
        username: None,
        account_uuid: None,
    });
    let mut mgr = manager(&http, &clock, &store);

    push_two_profiles(&http);
    let outcome = mgr.initialize_from_store().await.expect("restore failed");
    match outcome {
        RestoreOutcome::ProfileSelectionRequired(profiles) => {
            assert_eq!(profiles.len(), 2);
        },
        other => panic!("expected selection, got {other:?}"),
    }
    assert_eq!(mgr.state(), AuthState::AwaitingProfileSelection);
}

#[tokio::test]
async fn test_restore_with_empty_store() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mut mgr = manager(&http, &clock, &store);

    let outcome = mgr.initialize_from_store().await.expect("restore failed");
    assert!(matches!(outcome, RestoreOutcome::NoCredentials));
    assert_eq!(mgr.state(), AuthState::Idle);
    assert_eq!(http.request_count(), 0);
}

#[tokio::test]
async fn test_singleplayer_session() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mut mgr = manager(&http, &clock, &store);

    mgr.start_singleplayer("hermit");
    assert_eq!(mgr.state(), AuthState::Authenticated);
    assert_eq!(mgr.mode(), AuthMode::Singleplayer);

    let session = mgr.session().expect("missing session").clone();
    assert_eq!(session.username, "hermit");
    // Locally generated tokens: 32 random bytes, hex rendered.
    assert_eq!(session.session_token.len(), 64);
    assert_ne!(session.session_token, session.identity_token);
    assert!(mgr.verify_auth_token(&session.session_token));
}

#[tokio::test]
async fn test_external_session_from_env_config() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();

    let mut mgr = manager(&http, &clock, &store);
    let incomplete = ServerCredentialsConfig {
        session_token: Some("ext-st".to_string()),
        ..Default::default()
    };
    assert!(!mgr.external_session_from_env(&incomplete));
    assert_eq!(mgr.state(), AuthState::Idle);

    let complete = ServerCredentialsConfig {
        session_token: Some("ext-st".to_string()),
        identity_token: Some("ext-idt".to_string()),
        cert_fingerprint: None,
        audience: "hytale-game-server".to_string(),
    };
    assert!(mgr.external_session_from_env(&complete));
    assert_eq!(mgr.state(), AuthState::Authenticated);
    assert_eq!(mgr.mode(), AuthMode::ExternalSession);
    assert!(mgr.verify_auth_token("ext-st"));
}

#[tokio::test]
async fn test_verify_auth_token() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mgr = authenticated_manager(&http, &clock, &store).await;

    assert!(mgr.verify_auth_token("st-1"));
    assert!(!mgr.verify_auth_token("st-2"));
    assert!(!mgr.verify_auth_token(""));
}

#[tokio::test]
async fn test_exchange_client_identity() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mgr = authenticated_manager(&http, &clock, &store).await;
    let fingerprint = certificate_fingerprint(b"server-cert-der");

    http.push_json(200, r#"{"authorizationGrant": "grant-9"}"#);
    http.push_json(200, r#"{"accessToken": "joined-at"}"#);
    let token = mgr
        .exchange_client_identity("client-idt", &fingerprint)
        .await
        .expect("exchange failed");
    assert_eq!(token, "joined-at");

    let requests = http.requests();
    let grant_request = &requests[requests.len() - 2];
    assert!(grant_request.url.ends_with("/server-join/auth-grant"));
    assert_eq!(grant_request.header("Authorization"), Some("Bearer st-1"));
    assert!(grant_request.body.contains(r#""aud":"hytale-game-server""#));

    let token_request = &requests[requests.len() - 1];
    assert!(token_request.url.ends_with("/server-join/auth-token"));
    assert!(token_request.body.contains(&hex::encode(fingerprint)));
}

#[tokio::test]
async fn test_exchange_requires_session() {
    let http = FakeHttp::new();
    let clock = FakeClock::new(NOW);
    let store = SharedStore::new();
    let mgr = manager(&http, &clock, &store);

    assert!(matches!(
        mgr.exchange_client_identity("idt", &[0u8; 32]).await,
        Err(AuthError::InvalidState(AuthState::Idle))
    ));
}
