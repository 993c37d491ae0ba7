// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Session service client: profile enumeration, game-session minting and
//! the server-join auth-grant/auth-token exchange.
//!
//! Every operation authenticates with `Authorization: Bearer <token>`.
//! Status mapping is uniform: 401/403 ⇒ `AuthenticationFailed`, any other
//! non-2xx ⇒ `ServiceError`, transport failure ⇒ `ConnectionFailed`,
//! malformed JSON ⇒ `InvalidResponse`.

use std::sync::Arc;

use chrono::DateTime;
use serde::Deserialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::http::{HttpClient, HttpError, HttpRequest, HttpResponse, Method},
    cfg::config::AuthServiceConfig,
};

#[derive(Debug, Error)]
pub enum SessionError {
    /// 401/403: the bearer token is missing, expired or unauthorized.
    #[error("session service rejected the credentials ({status})")]
    AuthenticationFailed { status: u16 },

    /// Any other non-2xx status.
    #[error("session service error ({status})")]
    ServiceError { status: u16 },

    #[error("connection to session service failed: {0}")]
    ConnectionFailed(#[from] HttpError),

    #[error("invalid session service response: {0}")]
    InvalidResponse(String),

    /// The account owns no game profiles.
    #[error("account has no game profiles")]
    NoProfiles,
}

/// One playable profile on the account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameProfile {
    pub uuid: Uuid,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct ProfilesResponse {
    #[allow(dead_code)]
    owner: Option<String>,
    profiles: Vec<GameProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GameSessionResponse {
    session_token: String,
    identity_token: String,
    expires_at: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthGrantResponse {
    authorization_grant: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthTokenResponse {
    access_token: String,
}

/// Minted game session bound to one profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub session_token: String,
    pub identity_token: String,
    pub expires_at: i64,
    pub player_uuid: Uuid,
    pub username: String,
}

/// SHA-256 fingerprint of a server certificate in X.509 DER form, as
/// presented during the server-join exchange.
pub fn certificate_fingerprint(der: &[u8]) -> [u8; 32] {
    Sha256::digest(der).into()
}

/// Client for the sessions + account-data services.
pub struct SessionServiceClient {
    http: Arc<dyn HttpClient>,
    sessions_base: String,
    account_data_base: String,
}

impl SessionServiceClient {
    pub fn new(http: Arc<dyn HttpClient>, cfg: &AuthServiceConfig) -> Self {
        Self {
            http,
            sessions_base: cfg.sessions_base.clone(),
            account_data_base: cfg.account_data_base.clone(),
        }
    }

    /// Lists the game profiles the account owns.
    pub async fn get_game_profiles(
        &self,
        access_token: &str,
    ) -> Result<Vec<GameProfile>, SessionError> {
        let url = format!("{}/my-account/get-profiles", self.account_data_base);
        let response = self.request(Method::Get, &url, access_token, None).await?;
        let parsed: ProfilesResponse = decode_json(&response)?;
        debug!(count = parsed.profiles.len(), "fetched game profiles");
        Ok(parsed.profiles)
    }

    /// Mints a game session for `profile`.
    pub async fn create_game_session(
        &self,
        access_token: &str,
        profile: &GameProfile,
    ) -> Result<GameSession, SessionError> {
        let url = format!("{}/game-session/new", self.sessions_base);
        let body = json!({ "uuid": profile.uuid.hyphenated().to_string() });
        let response = self
            .request(Method::Post, &url, access_token, Some(&body))
            .await?;
        let parsed: GameSessionResponse = decode_json(&response)?;
        let expires_at = parse_expires_at(&parsed.expires_at)?;
        Ok(GameSession {
            session_token: parsed.session_token,
            identity_token: parsed.identity_token,
            expires_at,
            player_uuid: profile.uuid,
            username: profile.username.clone(),
        })
    }

    /// Presents a client identity token, yielding a short-lived
    /// authorization grant for `aud`.
    pub async fn request_auth_grant(
        &self,
        bearer: &str,
        identity_token: &str,
        aud: &str,
    ) -> Result<String, SessionError> {
        let url = format!("{}/server-join/auth-grant", self.sessions_base);
        let body = json!({ "identityToken": identity_token, "aud": aud });
        let response = self.request(Method::Post, &url, bearer, Some(&body)).await?;
        let parsed: AuthGrantResponse = decode_json(&response)?;
        Ok(parsed.authorization_grant)
    }

    /// Redeems an authorization grant against the server's certificate
    /// fingerprint, yielding the server-bound access token.
    pub async fn exchange_auth_grant(
        &self,
        bearer: &str,
        authorization_grant: &str,
        cert_fingerprint: &[u8; 32],
    ) -> Result<String, SessionError> {
        let url = format!("{}/server-join/auth-token", self.sessions_base);
        let body = json!({
            "authorizationGrant": authorization_grant,
            "x509Fingerprint": hex::encode(cert_fingerprint),
        });
        let response = self.request(Method::Post, &url, bearer, Some(&body)).await?;
        let parsed: AuthTokenResponse = decode_json(&response)?;
        Ok(parsed.access_token)
    }

    async fn request(
        &self,
        method: Method,
        url: &str,
        bearer: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse, SessionError> {
        let encoded = body.map(serde_json::Value::to_string);
        let mut headers = vec![
            ("Authorization", format!("Bearer {bearer}")),
            ("Accept", "application/json".to_string()),
        ];
        if encoded.is_some() {
            headers.push(("Content-Type", "application/json".to_string()));
        }
        let response = self
            .http
            .fetch(HttpRequest {
                method,
                url,
                headers: &headers,
                body: encoded.as_deref().map(str::as_bytes),
            })
            .await?;
        match response.status {
            200..=299 => Ok(response),
            status @ (401 | 403) => Err(SessionError::AuthenticationFailed { status }),
            status => Err(SessionError::ServiceError { status }),
        }
    }
}

fn decode_json<'a, T: Deserialize<'a>>(
    response: &'a HttpResponse,
) -> Result<T, SessionError> {
    serde_json::from_slice(&response.body)
        .map_err(|e| SessionError::InvalidResponse(e.to_string()))
}

/// Parses the session service's ISO-8601 expiry
/// (`YYYY-MM-DDTHH:MM:SS[.fff…]Z`) to Unix seconds, discarding
/// fractional seconds.
pub fn parse_expires_at(text: &str) -> Result<i64, SessionError> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.timestamp())
        .map_err(|e| SessionError::InvalidResponse(format!("bad expiresAt {text:?}: {e}")))
}
