// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! OAuth 2.0 Device Flow client (RFC 8628).
//!
//! The client owns the device-authorization handle and the token set; the
//! auth manager drives it and owns the sleep between polls. All requests
//! are `application/x-www-form-urlencoded` POSTs against the identity
//! provider's device and token endpoints.

use std::{sync::Arc, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use urlencoding::encode;

use crate::{
    auth::http::{Clock, HttpClient, HttpError, HttpRequest, HttpResponse, Method},
    cfg::config::AuthServiceConfig,
};

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
/// Interval bump applied on every `slow_down` (RFC 8628 §3.5).
const SLOW_DOWN_STEP_SECS: u64 = 5;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Terminal device-flow failures. The transient `authorization_pending`
/// and `slow_down` responses are *not* errors; they surface as
/// [`PollOutcome`] variants.
#[derive(Debug, Error)]
pub enum DeviceFlowError {
    /// The device authorization lapsed before the user approved it.
    #[error("device authorization expired")]
    Expired,

    /// The user rejected the authorization request.
    #[error("authorization denied by user")]
    Denied,

    /// The refresh token is no longer honored by the identity provider.
    #[error("refresh token rejected (invalid_grant)")]
    InvalidGrant,

    /// Any other `error` field in an identity-provider response.
    #[error("identity provider rejected the request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Network(#[from] HttpError),

    /// Response body was not the JSON shape the protocol promises.
    #[error("malformed identity provider response: {0}")]
    Parse(String),

    /// `poll_for_token` before `start_device_authorization`.
    #[error("no device authorization in progress")]
    NotStarted,
}

/// What a single poll produced.
#[derive(Debug)]
pub enum PollOutcome {
    /// User has not decided yet; poll again after the interval.
    Pending,
    /// Identity provider asked for a slower cadence; the interval has
    /// already been increased.
    SlowDown,
    /// Tokens granted.
    Complete(TokenSet),
}

/// Issued tokens with an absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub id_token: Option<String>,
    pub expires_at: i64,
}

/// User-facing handle returned by `start_device_authorization`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceAuthorization {
    pub user_code: String,
    pub verification_uri: String,
    pub expires_at: i64,
}

#[derive(Debug)]
struct PendingAuthorization {
    device_code: String,
    user_code: String,
    verification_uri: String,
    interval: Duration,
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct DeviceAuthorizationResponse {
    device_code: String,
    user_code: String,
    verification_uri: String,
    expires_in: i64,
    interval: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    id_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[allow(dead_code)]
    error_description: Option<String>,
}

/// Device-flow client bound to one identity provider.
pub struct DeviceFlowClient {
    http: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    client_id: String,
    scope: String,
    device_url: String,
    token_url: String,
    pending: Option<PendingAuthorization>,
    tokens: Option<TokenSet>,
}

impl DeviceFlowClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        cfg: &AuthServiceConfig,
    ) -> Self {
        Self {
            http,
            clock,
            client_id: cfg.client_id.clone(),
            scope: cfg.scope.clone(),
            device_url: cfg.device_url.clone(),
            token_url: cfg.token_url.clone(),
            pending: None,
            tokens: None,
        }
    }

    /// Requests a device authorization and returns the code the user must
    /// enter at the verification URI.
    pub async fn start_device_authorization(
        &mut self,
    ) -> Result<DeviceAuthorization, DeviceFlowError> {
        let body = format!(
            "client_id={}&scope={}",
            encode(&self.client_id),
            encode(&self.scope)
        );
        let response = self.post_form(&self.device_url, &body).await?;
        if !response.is_success() {
            return Err(self.error_from_body(&response.body));
        }

        let parsed: DeviceAuthorizationResponse = serde_json::from_slice(&response.body)
            .map_err(|e| DeviceFlowError::Parse(e.to_string()))?;
        let expires_at = self.clock.now_unix() + parsed.expires_in;
        let interval =
            Duration::from_secs(parsed.interval.unwrap_or(DEFAULT_POLL_INTERVAL_SECS));

        debug!(user_code = %parsed.user_code, "device authorization started");
        let authorization = DeviceAuthorization {
            user_code: parsed.user_code.clone(),
            verification_uri: parsed.verification_uri.clone(),
            expires_at,
        };
        self.pending = Some(PendingAuthorization {
            device_code: parsed.device_code,
            user_code: parsed.user_code,
            verification_uri: parsed.verification_uri,
            interval,
            expires_at,
        });
        Ok(authorization)
    }

    /// One non-blocking poll of the token endpoint. The caller is
    /// responsible for honoring [`Self::poll_interval`] between calls.
    pub async fn poll_for_token(&mut self) -> Result<PollOutcome, DeviceFlowError> {
        let pending = self.pending.as_ref().ok_or(DeviceFlowError::NotStarted)?;
        if self.clock.now_unix() > pending.expires_at {
            return Err(DeviceFlowError::Expired);
        }

        let body = format!(
            "grant_type={}&device_code={}&client_id={}",
            encode(DEVICE_GRANT_TYPE),
            encode(&pending.device_code),
            encode(&self.client_id),
        );
        let response = self.post_form(&self.token_url, &body).await?;

        if response.is_success() {
            let tokens = self.parse_token_response(&response.body, None)?;
            self.pending = None;
            self.tokens = Some(tokens.clone());
            return Ok(PollOutcome::Complete(tokens));
        }

        let error: OAuthErrorBody = serde_json::from_slice(&response.body)
            .map_err(|e| DeviceFlowError::Parse(e.to_string()))?;
        match error.error.as_str() {
            "authorization_pending" => Ok(PollOutcome::Pending),
            "slow_down" => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.interval += Duration::from_secs(SLOW_DOWN_STEP_SECS);
                }
                Ok(PollOutcome::SlowDown)
            },
            "expired_token" => Err(DeviceFlowError::Expired),
            "access_denied" => Err(DeviceFlowError::Denied),
            other => Err(DeviceFlowError::InvalidRequest(other.to_string())),
        }
    }

    /// Exchanges a refresh token for a fresh token set. When the provider
    /// omits a new refresh token the old one is retained.
    pub async fn refresh_token(
        &mut self,
        refresh_token: &str,
    ) -> Result<TokenSet, DeviceFlowError> {
        let body = format!(
            "grant_type=refresh_token&refresh_token={}&client_id={}",
            encode(refresh_token),
            encode(&self.client_id),
        );
        let response = self.post_form(&self.token_url, &body).await?;

        if !response.is_success() {
            let error: OAuthErrorBody = serde_json::from_slice(&response.body)
                .map_err(|e| DeviceFlowError::Parse(e.to_string()))?;
            return Err(match error.error.as_str() {
                "invalid_grant" => DeviceFlowError::InvalidGrant,
                other => DeviceFlowError::InvalidRequest(other.to_string()),
            });
        }

        let tokens = self.parse_token_response(&response.body, Some(refresh_token))?;
        self.tokens = Some(tokens.clone());
        Ok(tokens)
    }

    /// Cadence the identity provider asked for.
    pub fn poll_interval(&self) -> Duration {
        self.pending
            .as_ref()
            .map_or(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS), |p| {
                p.interval
            })
    }

    /// False once the pending device authorization has lapsed.
    pub fn is_valid(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| self.clock.now_unix() <= p.expires_at)
    }

    /// Pending user code / verification URI, if a flow is in progress.
    pub fn pending_authorization(&self) -> Option<DeviceAuthorization> {
        self.pending.as_ref().map(|p| DeviceAuthorization {
            user_code: p.user_code.clone(),
            verification_uri: p.verification_uri.clone(),
            expires_at: p.expires_at,
        })
    }

    pub fn tokens(&self) -> Option<&TokenSet> {
        self.tokens.as_ref()
    }

    /// Drops any pending authorization and held tokens.
    pub fn reset(&mut self) {
        self.pending = None;
        self.tokens = None;
    }

    async fn post_form(
        &self,
        url: &str,
        body: &str,
    ) -> Result<HttpResponse, DeviceFlowError> {
        let headers = [
            (
                "Content-Type",
                "application/x-www-form-urlencoded".to_string(),
            ),
            ("Accept", "application/json".to_string()),
        ];
        let response = self
            .http
            .fetch(HttpRequest {
                method: Method::Post,
                url,
                headers: &headers,
                body: Some(body.as_bytes()),
            })
            .await?;
        Ok(response)
    }

    fn parse_token_response(
        &self,
        body: &[u8],
        previous_refresh: Option<&str>,
    ) -> Result<TokenSet, DeviceFlowError> {
        let parsed: TokenResponse = serde_json::from_slice(body)
            .map_err(|e| DeviceFlowError::Parse(e.to_string()))?;
        Ok(TokenSet {
            access_token: parsed.access_token,
            refresh_token: parsed
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string)),
            id_token: parsed.id_token,
            expires_at: self.clock.now_unix() + parsed.expires_in,
        })
    }

    fn error_from_body(&self, body: &[u8]) -> DeviceFlowError {
        match serde_json::from_slice::<OAuthErrorBody>(body) {
            Ok(e) => DeviceFlowError::InvalidRequest(e.error),
            Err(e) => DeviceFlowError::Parse(e.to_string()),
        }
    }
}
