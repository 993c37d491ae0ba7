// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The auth manager: drives the device flow, profile selection, session
//! minting, persistence and periodic refresh behind one state machine.
//!
//! A manager is single-owned: every transition happens under `&mut self`,
//! so the ordering rules (start → poll → fetch profiles → select →
//! create session → save) and the no-overlapping-refresh rule hold by
//! construction. Terminal states are `Authenticated` and `Failed`, both
//! re-enterable after [`AuthManager::reset`].

use std::{sync::Arc, time::Duration};

use rand::RngExt;
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        credentials::{CredentialRecord, CredentialStore, StoreError},
        http::{Clock, HttpClient},
        oauth::{DeviceAuthorization, DeviceFlowClient, DeviceFlowError, PollOutcome, TokenSet},
        session::{GameProfile, GameSession, SessionError, SessionServiceClient},
    },
    cfg::config::{AuthServiceConfig, ServerCredentialsConfig},
};

/// Observable lifecycle of one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    AwaitingUser,
    Polling,
    FetchingProfiles,
    AwaitingProfileSelection,
    CreatingSession,
    Authenticated,
    Failed,
}

/// How the current credentials were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    None,
    Singleplayer,
    ExternalSession,
    OauthDevice,
    OauthStore,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    DeviceFlow(#[from] DeviceFlowError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("operation not valid in state {0:?}")]
    InvalidState(AuthState),

    #[error("profile {0} is not one of the fetched profiles")]
    UnknownProfile(Uuid),

    #[error("no access token held")]
    NoAccessToken,
}

/// What one `poll_device_flow` call produced.
#[derive(Debug)]
pub enum ManagerPoll {
    /// Keep polling after `retry_in`.
    Pending { retry_in: Duration },
    /// Tokens arrived and the account owns several profiles; call
    /// `select_profile`.
    ProfileSelectionRequired(Vec<GameProfile>),
    /// Fully authenticated.
    Authenticated,
}

/// Outcome of restoring persisted credentials at startup.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Nothing stored, or stored under a different machine key.
    NoCredentials,
    /// Stored profile matched; fully authenticated.
    Authenticated,
    /// Credentials restored but the stored profile no longer matches
    /// exactly one account profile.
    ProfileSelectionRequired(Vec<GameProfile>),
}

pub struct AuthManager {
    clock: Arc<dyn Clock>,
    device: DeviceFlowClient,
    sessions: SessionServiceClient,
    store: Box<dyn CredentialStore>,
    audience: String,
    state: AuthState,
    mode: AuthMode,
    credentials: CredentialRecord,
    profiles: Vec<GameProfile>,
    session: Option<GameSession>,
    last_error: Option<String>,
}

impl AuthManager {
    pub fn new(
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        cfg: &AuthServiceConfig,
        store: Box<dyn CredentialStore>,
    ) -> Self {
        Self {
            device: DeviceFlowClient::new(Arc::clone(&http), Arc::clone(&clock), cfg),
            sessions: SessionServiceClient::new(http, cfg),
            clock,
            store,
            audience: cfg.audience.clone(),
            state: AuthState::Idle,
            mode: AuthMode::None,
            credentials: CredentialRecord::default(),
            profiles: Vec::new(),
            session: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Current game session, once `Authenticated`.
    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    /// Profiles fetched for selection.
    pub fn profiles(&self) -> &[GameProfile] {
        &self.profiles
    }

    /// Message of the failure that sent the manager to `Failed`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Pending user code / verification URI while a device flow runs.
    pub fn pending_authorization(&self) -> Option<DeviceAuthorization> {
        self.device.pending_authorization()
    }

    /// Cadence the caller should poll at.
    pub fn poll_interval(&self) -> Duration {
        self.device.poll_interval()
    }

    /// Returns the manager to `Idle`, dropping all flow state. Persisted
    /// credentials are untouched; use the store's `clear` for that.
    pub fn reset(&mut self) {
        self.device.reset();
        self.state = AuthState::Idle;
        self.mode = AuthMode::None;
        self.credentials = CredentialRecord::default();
        self.profiles.clear();
        self.session = None;
        self.last_error = None;
    }

    /// Starts a device flow: on success the returned code must be shown
    /// to the user and `poll_device_flow` drives the rest.
    pub async fn start_device_flow(
        &mut self,
    ) -> Result<DeviceAuthorization, AuthError> {
        if self.state != AuthState::Idle {
            return Err(AuthError::InvalidState(self.state));
        }
        self.state = AuthState::AwaitingUser;
        match self.device.start_device_authorization().await {
            Ok(authorization) => {
                info!(user_code = %authorization.user_code, "device flow started");
                self.mode = AuthMode::OauthDevice;
                self.state = AuthState::Polling;
                Ok(authorization)
            },
            Err(err) => Err(self.fail(err)),
        }
    }

    /// One non-blocking poll step. The caller sleeps `retry_in` between
    /// `Pending` outcomes; `run_device_flow` does exactly that.
    pub async fn poll_device_flow(&mut self) -> Result<ManagerPoll, AuthError> {
        if self.state != AuthState::Polling {
            return Err(AuthError::InvalidState(self.state));
        }
        match self.device.poll_for_token().await {
            Ok(PollOutcome::Pending) | Ok(PollOutcome::SlowDown) => {
                Ok(ManagerPoll::Pending {
                    retry_in: self.device.poll_interval(),
                })
            },
            Ok(PollOutcome::Complete(tokens)) => {
                debug!("device flow granted tokens");
                self.apply_tokens(&tokens);
                self.fetch_profiles_and_continue().await
            },
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Blocking helper: polls at the provider's cadence until the flow
    /// authenticates or needs a profile choice.
    pub async fn run_device_flow(&mut self) -> Result<ManagerPoll, AuthError> {
        loop {
            match self.poll_device_flow().await? {
                ManagerPoll::Pending { retry_in } => {
                    tokio::time::sleep(retry_in).await;
                },
                done => return Ok(done),
            }
        }
    }

    /// Picks one of the fetched profiles and mints the session.
    pub async fn select_profile(&mut self, profile_uuid: Uuid) -> Result<(), AuthError> {
        if self.state != AuthState::AwaitingProfileSelection {
            return Err(AuthError::InvalidState(self.state));
        }
        let Some(profile) = self
            .profiles
            .iter()
            .find(|p| p.uuid == profile_uuid)
            .cloned()
        else {
            return Err(AuthError::UnknownProfile(profile_uuid));
        };
        self.create_session_for(&profile).await?;
        Ok(())
    }

    /// Refreshes the access token when within the expiry skew, re-mints
    /// the game session (it may have lapsed independently) and persists.
    /// Only meaningful for OAuth-derived modes; returns whether a
    /// refresh ran.
    pub async fn check_and_refresh(&mut self) -> Result<bool, AuthError> {
        if !matches!(self.mode, AuthMode::OauthDevice | AuthMode::OauthStore) {
            return Ok(false);
        }
        if self.state != AuthState::Authenticated {
            return Ok(false);
        }
        let now = self.clock.now_unix();
        if self.credentials.access_token_valid(now) {
            return Ok(false);
        }
        let Some(refresh_token) = self.credentials.refresh_token.clone() else {
            return Err(self.fail(DeviceFlowError::InvalidGrant));
        };

        debug!("access token near expiry, refreshing");
        let tokens = match self.device.refresh_token(&refresh_token).await {
            Ok(tokens) => tokens,
            Err(err) => return Err(self.fail(err)),
        };
        self.apply_tokens(&tokens);

        let profile = GameProfile {
            uuid: self
                .credentials
                .profile_uuid
                .ok_or(AuthError::InvalidState(self.state))?,
            username: self.credentials.username.clone().unwrap_or_default(),
        };
        self.create_session_for(&profile).await?;
        Ok(true)
    }

    /// Restores persisted credentials: refresh if stale, fetch profiles,
    /// auto-select the stored profile when it still matches exactly one.
    pub async fn initialize_from_store(&mut self) -> Result<RestoreOutcome, AuthError> {
        if self.state != AuthState::Idle {
            return Err(AuthError::InvalidState(self.state));
        }
        let Some(record) = self.store.load()? else {
            debug!("no stored credentials (or stored under another machine key)");
            return Ok(RestoreOutcome::NoCredentials);
        };
        self.credentials = record;
        self.mode = AuthMode::OauthStore;

        let now = self.clock.now_unix();
        if !self.credentials.access_token_valid(now) {
            let Some(refresh_token) = self.credentials.refresh_token.clone() else {
                self.reset();
                return Ok(RestoreOutcome::NoCredentials);
            };
            let tokens = match self.device.refresh_token(&refresh_token).await {
                Ok(tokens) => tokens,
                Err(err) => return Err(self.fail(err)),
            };
            self.apply_tokens(&tokens);
        }

        let stored_profile = self.credentials.profile_uuid;
        let outcome = self.fetch_profiles_with(stored_profile).await?;
        Ok(match outcome {
            ManagerPoll::Authenticated => RestoreOutcome::Authenticated,
            ManagerPoll::ProfileSelectionRequired(profiles) => {
                RestoreOutcome::ProfileSelectionRequired(profiles)
            },
            // fetch_profiles never reports Pending.
            ManagerPoll::Pending { .. } => RestoreOutcome::NoCredentials,
        })
    }

    /// Adopts a session minted elsewhere (dedicated-server deployments
    /// that receive tokens through the environment).
    pub fn use_external_session(
        &mut self,
        session_token: String,
        identity_token: String,
    ) {
        self.session = Some(GameSession {
            session_token,
            identity_token,
            expires_at: i64::MAX,
            player_uuid: Uuid::nil(),
            username: String::new(),
        });
        self.mode = AuthMode::ExternalSession;
        self.state = AuthState::Authenticated;
        info!("external session adopted");
    }

    /// [`Self::use_external_session`] from the `HYTALE_SERVER_*`
    /// environment; returns false when the variables are incomplete.
    pub fn external_session_from_env(&mut self, cfg: &ServerCredentialsConfig) -> bool {
        let (Some(session_token), Some(identity_token)) =
            (cfg.session_token.clone(), cfg.identity_token.clone())
        else {
            return false;
        };
        self.audience = cfg.audience.clone();
        self.use_external_session(session_token, identity_token);
        true
    }

    /// Offline singleplayer: locally generated random tokens, no IdP.
    pub fn start_singleplayer(&mut self, username: impl Into<String>) {
        let username = username.into();
        self.session = Some(GameSession {
            session_token: random_local_token(),
            identity_token: random_local_token(),
            expires_at: i64::MAX,
            player_uuid: Uuid::new_v4(),
            username,
        });
        self.mode = AuthMode::Singleplayer;
        self.state = AuthState::Authenticated;
        info!("singleplayer session created");
    }

    /// Server handshake: converts an arriving client's identity token
    /// into a short-lived access token bound to this server's TLS
    /// certificate fingerprint.
    pub async fn exchange_client_identity(
        &self,
        client_identity_token: &str,
        cert_fingerprint: &[u8; 32],
    ) -> Result<String, AuthError> {
        let session = self
            .session
            .as_ref()
            .ok_or(AuthError::InvalidState(self.state))?;
        let grant = self
            .sessions
            .request_auth_grant(&session.session_token, client_identity_token, &self.audience)
            .await?;
        let token = self
            .sessions
            .exchange_auth_grant(&session.session_token, &grant, cert_fingerprint)
            .await?;
        Ok(token)
    }

    /// Whether `token` equals the current session token, compared in
    /// constant time.
    pub fn verify_auth_token(&self, token: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| s.session_token.as_bytes().ct_eq(token.as_bytes()).into())
    }

    async fn fetch_profiles_and_continue(&mut self) -> Result<ManagerPoll, AuthError> {
        self.fetch_profiles_with(None).await
    }

    /// Fetches profiles and either auto-selects (single profile, or a
    /// preferred uuid that matches exactly one) or surfaces the choice.
    async fn fetch_profiles_with(
        &mut self,
        preferred: Option<Uuid>,
    ) -> Result<ManagerPoll, AuthError> {
        self.state = AuthState::FetchingProfiles;
        let access_token = self
            .credentials
            .access_token
            .clone()
            .ok_or(AuthError::NoAccessToken)?;
        let profiles = match self.sessions.get_game_profiles(&access_token).await {
            Ok(profiles) => profiles,
            Err(err) => return Err(self.fail(err)),
        };
        if profiles.is_empty() {
            return Err(self.fail(SessionError::NoProfiles));
        }

        let auto_selected = if profiles.len() == 1 {
            Some(profiles[0].clone())
        } else {
            preferred.and_then(|uuid| {
                let mut matches = profiles.iter().filter(|p| p.uuid == uuid);
                match (matches.next(), matches.next()) {
                    (Some(profile), None) => Some(profile.clone()),
                    _ => None,
                }
            })
        };

        self.profiles = profiles;
        match auto_selected {
            Some(profile) => {
                self.create_session_for(&profile).await?;
                Ok(ManagerPoll::Authenticated)
            },
            None => {
                self.state = AuthState::AwaitingProfileSelection;
                Ok(ManagerPoll::ProfileSelectionRequired(self.profiles.clone()))
            },
        }
    }

    async fn create_session_for(&mut self, profile: &GameProfile) -> Result<(), AuthError> {
        self.state = AuthState::CreatingSession;
        let access_token = self
            .credentials
            .access_token
            .clone()
            .ok_or(AuthError::NoAccessToken)?;
        let session = match self
            .sessions
            .create_game_session(&access_token, profile)
            .await
        {
            Ok(session) => session,
            Err(err) => return Err(self.fail(err)),
        };

        self.credentials.profile_uuid = Some(profile.uuid);
        self.credentials.username = Some(profile.username.clone());
        self.session = Some(session);
        self.persist();
        self.state = AuthState::Authenticated;
        info!(username = %profile.username, "authenticated");
        Ok(())
    }

    fn apply_tokens(&mut self, tokens: &TokenSet) {
        self.credentials.access_token = Some(tokens.access_token.clone());
        self.credentials.refresh_token = tokens.refresh_token.clone();
        self.credentials.expires_at = tokens.expires_at;
    }

    /// Persistence is best-effort: a host without an encryption key still
    /// authenticates, it just cannot restore next launch.
    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.credentials) {
            warn!(%err, "failed to persist credentials");
        }
    }

    fn fail(&mut self, err: impl Into<AuthError>) -> AuthError {
        let err = err.into();
        warn!(%err, "authentication failed");
        self.last_error = Some(err.to_string());
        self.state = AuthState::Failed;
        err
    }
}

/// Opaque local bearer token for offline modes.
fn random_local_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}
