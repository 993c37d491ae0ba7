// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::sync::Arc;

use hex_literal::hex;
use hytale_server_rs::{
    auth::{
        http::HttpClient,
        session::{
            GameProfile, SessionError, SessionServiceClient, certificate_fingerprint,
            parse_expires_at,
        },
    },
    cfg::config::AuthServiceConfig,
};
use uuid::Uuid;

use crate::unit_tests::common::FakeHttp;

fn client(http: &Arc<FakeHttp>) -> SessionServiceClient {
    let http: Arc<dyn HttpClient> = http.clone();
    SessionServiceClient::new(http, &AuthServiceConfig::default())
}

fn profile() -> GameProfile {
    GameProfile {
        uuid: Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000")
            .expect("bad uuid literal"),
        username: "kweebec".to_string(),
    }
}

#[test]
fn test_parse_expires_at_epoch() {
    assert_eq!(
        parse_expires_at("1970-01-01T00:00:00Z").expect("parse failed"),
        0
    );
}

#[test]
fn test_parse_expires_at_discards_fraction() {
    let with_fraction =
        parse_expires_at("2026-01-23T20:43:39.930178155Z").expect("parse failed");
    let without = parse_expires_at("2026-01-23T20:43:39Z").expect("parse failed");
    assert_eq!(with_fraction, without);
    assert_eq!(with_fraction, 1_769_201_019);
}

#[test]
fn test_parse_expires_at_validates_ranges() {
    for bad in [
        "2026-13-01T00:00:00Z",
        "2026-01-32T00:00:00Z",
        "2026-01-01T24:00:00Z",
        "2026-01-01T00:61:00Z",
        "not a date",
        "",
    ] {
        assert!(parse_expires_at(bad).is_err(), "{bad:?} must fail");
    }
}

#[test]
fn test_certificate_fingerprint_is_sha256() {
    // SHA-256 of the empty string.
    assert_eq!(
        certificate_fingerprint(b""),
        hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
    );
    assert_eq!(certificate_fingerprint(b"der"), certificate_fingerprint(b"der"));
    assert_ne!(certificate_fingerprint(b"a"), certificate_fingerprint(b"b"));
}

#[tokio::test]
async fn test_get_game_profiles() {
    let http = FakeHttp::new();
    http.push_json(
        200,
        r#"{
            "owner": "acct-1",
            "profiles": [
                {"uuid": "123e4567-e89b-12d3-a456-426614174000", "username": "kweebec"},
                {"uuid": "223e4567-e89b-12d3-a456-426614174000", "username": "trork"}
            ]
        }"#,
    );

    let profiles = client(&http)
        .get_game_profiles("at-1")
        .await
        .expect("get profiles failed");
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].username, "kweebec");

    let request = http.last_request();
    assert_eq!(
        request.url,
        "https://account-data.hytale.com/my-account/get-profiles"
    );
    assert_eq!(request.header("Authorization"), Some("Bearer at-1"));
}

#[tokio::test]
async fn test_create_game_session() {
    let http = FakeHttp::new();
    http.push_json(
        200,
        r#"{
            "sessionToken": "st-1",
            "identityToken": "it-1",
            "expiresAt": "2026-01-23T20:43:39.930178155Z"
        }"#,
    );

    let session = client(&http)
        .create_game_session("at-1", &profile())
        .await
        .expect("create session failed");
    assert_eq!(session.session_token, "st-1");
    assert_eq!(session.identity_token, "it-1");
    assert_eq!(session.expires_at, 1_769_201_019);
    assert_eq!(session.username, "kweebec");
    assert_eq!(session.player_uuid, profile().uuid);

    let request = http.last_request();
    assert_eq!(request.url, "https://sessions.hytale.com/game-session/new");
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert!(request
        .body
        .contains("123e4567-e89b-12d3-a456-426614174000"));
}

#[tokio::test]
async fn test_status_mapping() {
    let http = FakeHttp::new();

    http.push_json(401, "{}");
    assert!(matches!(
        client(&http).get_game_profiles("bad").await,
        Err(SessionError::AuthenticationFailed { status: 401 })
    ));

    http.push_json(403, "{}");
    assert!(matches!(
        client(&http).get_game_profiles("bad").await,
        Err(SessionError::AuthenticationFailed { status: 403 })
    ));

    http.push_json(503, "{}");
    assert!(matches!(
        client(&http).get_game_profiles("at").await,
        Err(SessionError::ServiceError { status: 503 })
    ));

    http.push_error("dns failure");
    assert!(matches!(
        client(&http).get_game_profiles("at").await,
        Err(SessionError::ConnectionFailed(_))
    ));

    http.push_json(200, "not json");
    assert!(matches!(
        client(&http).get_game_profiles("at").await,
        Err(SessionError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_auth_grant_exchange() {
    let http = FakeHttp::new();
    let fingerprint = certificate_fingerprint(b"server-cert-der");

    http.push_json(200, r#"{"authorizationGrant": "grant-1"}"#);
    let grant = client(&http)
        .request_auth_grant("st-1", "client-idt", "hytale-game-server")
        .await
        .expect("auth grant failed");
    assert_eq!(grant, "grant-1");

    let request = http.last_request();
    assert_eq!(
        request.url,
        "https://sessions.hytale.com/server-join/auth-grant"
    );
    assert_eq!(request.header("Authorization"), Some("Bearer st-1"));
    assert!(request.body.contains(r#""identityToken":"client-idt""#));
    assert!(request.body.contains(r#""aud":"hytale-game-server""#));

    http.push_json(200, r#"{"accessToken": "server-at"}"#);
    let token = client(&http)
        .exchange_auth_grant("st-1", &grant, &fingerprint)
        .await
        .expect("exchange failed");
    assert_eq!(token, "server-at");

    let request = http.last_request();
    assert_eq!(
        request.url,
        "https://sessions.hytale.com/server-join/auth-token"
    );
    assert!(request.body.contains(r#""authorizationGrant":"grant-1""#));
    assert!(request.body.contains(&hex::encode(fingerprint)));
}
