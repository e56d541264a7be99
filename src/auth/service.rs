use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use strum::{Display, EnumString};

use super::authorization_code::{AuthorizationCodeFlow, AUTHORIZATION_TIMEOUT};
use super::client::{AuthClient, Introspection};
use super::console::{Browser, Console};
use super::device_code::DeviceCodeFlow;
use super::error::AuthError;
use super::login::{LoginOptions, LoginOutcome};
use super::store::{validate_profile, TokenStore};
use super::token::Credential;
use super::validity::{is_valid, remaining};
use crate::util::timeout::{with_timeout, REMOTE_CALL_TIMEOUT};

/// Which stored token an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// What `logout` managed to revoke remotely before deleting the local file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogoutReport {
    pub revoked: Vec<TokenKind>,
    pub failed: Vec<TokenKind>,
}

/// Stored state of one profile, as reported by [`AuthService::status`].
#[derive(Debug, Clone)]
pub struct ProfileStatus {
    pub profile: String,
    pub state: ProfileState,
}

#[derive(Debug, Clone)]
pub enum ProfileState {
    Valid {
        expires_at: DateTime<Utc>,
        remaining: chrono::Duration,
    },
    Expired {
        expires_at: DateTime<Utc>,
        refreshable: bool,
    },
    Unreadable(String),
}

/// Credential lifecycle facade used by the command layer.
///
/// All collaborators are injected, so tests can swap the store, remote
/// client, console and browser independently.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use gauth::auth::{
///     AuthService, FileTokenStore, HttpAuthClient, LoginOptions, SystemBrowser,
///     TerminalConsole, TokenStoreConfig,
/// };
/// use gauth::config::{AuthConfig, ConfigOverrides};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = AuthConfig::from_env(ConfigOverrides::default())?;
/// let service = AuthService::new(
///     Arc::new(HttpAuthClient::new(&config)?),
///     Arc::new(FileTokenStore::new(TokenStoreConfig::new(config.config_root.clone()))),
///     Arc::new(TerminalConsole),
///     Arc::new(SystemBrowser),
/// )
/// .with_callback_port(config.callback_port);
/// service.login("default", &LoginOptions::default()).await?;
/// # Ok(())
/// # }
/// ```
pub struct AuthService {
    client: Arc<dyn AuthClient>,
    store: Arc<dyn TokenStore>,
    console: Arc<dyn Console>,
    browser: Arc<dyn Browser>,
    callback_port: u16,
    authorization_timeout: Duration,
    remote_timeout: Duration,
}

impl AuthService {
    pub fn new(
        client: Arc<dyn AuthClient>,
        store: Arc<dyn TokenStore>,
        console: Arc<dyn Console>,
        browser: Arc<dyn Browser>,
    ) -> Self {
        Self {
            client,
            store,
            console,
            browser,
            callback_port: crate::config::DEFAULT_CALLBACK_PORT,
            authorization_timeout: AUTHORIZATION_TIMEOUT,
            remote_timeout: REMOTE_CALL_TIMEOUT,
        }
    }

    pub fn with_callback_port(mut self, port: u16) -> Self {
        self.callback_port = port;
        self
    }

    pub fn with_authorization_timeout(mut self, timeout: Duration) -> Self {
        self.authorization_timeout = timeout;
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Browser login, skipped when a valid credential is already stored
    /// (unless `force_login` is set).
    pub async fn login(
        &self,
        profile: &str,
        options: &LoginOptions,
    ) -> Result<LoginOutcome, AuthError> {
        if let Some(existing) = self.reusable_credential(profile, options)? {
            return Ok(LoginOutcome::AlreadyLoggedIn(existing));
        }
        let flow = AuthorizationCodeFlow::new(
            self.client.clone(),
            self.store.clone(),
            self.console.clone(),
            self.browser.clone(),
            self.callback_port,
        )
        .with_timeout(self.authorization_timeout)
        .with_remote_timeout(self.remote_timeout);
        Ok(LoginOutcome::Authenticated(flow.run(profile, options).await?))
    }

    /// Device-code login with the same skip rule as [`AuthService::login`].
    pub async fn device_login(
        &self,
        profile: &str,
        options: &LoginOptions,
    ) -> Result<LoginOutcome, AuthError> {
        if let Some(existing) = self.reusable_credential(profile, options)? {
            return Ok(LoginOutcome::AlreadyLoggedIn(existing));
        }
        let flow = DeviceCodeFlow::new(self.client.clone(), self.store.clone(), self.console.clone())
            .with_remote_timeout(self.remote_timeout);
        Ok(LoginOutcome::Authenticated(flow.run(profile, options).await?))
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// The stored refresh token is kept when the provider does not rotate it.
    pub async fn refresh(&self, profile: &str) -> Result<Credential, AuthError> {
        let current = self.store.load(profile)?;
        let refresh_token = current
            .refresh_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NoRefreshToken)?;
        let response =
            with_timeout(self.remote_timeout, self.client.refresh_token(&refresh_token)).await?;
        let refreshed = Credential::from_response(response, Some(refresh_token), Utc::now());
        self.store.save(profile, &refreshed)?;
        tracing::debug!(profile, expires_at = %refreshed.expires_at, "credential refreshed");
        Ok(refreshed)
    }

    /// Revoke one stored token remotely. The local record is left in place.
    pub async fn revoke_one(&self, profile: &str, kind: TokenKind) -> Result<(), AuthError> {
        let current = self.store.load(profile)?;
        let token = match kind {
            TokenKind::Access => current.access_token,
            TokenKind::Refresh => current
                .refresh_token
                .filter(|token| !token.is_empty())
                .ok_or(AuthError::NoRefreshToken)?,
        };
        with_timeout(self.remote_timeout, self.client.revoke_token(&token))
            .await
            .map_err(|err| AuthError::RevocationError(err.to_string()))
    }

    /// Revoke what can be revoked, then delete the local credential.
    ///
    /// Remote failures become console warnings; the file is removed either
    /// way.
    pub async fn logout(&self, profile: &str) -> Result<LogoutReport, AuthError> {
        let current = self.store.load(profile)?;
        let mut report = LogoutReport::default();
        let tokens = [
            (TokenKind::Access, Some(current.access_token)),
            (TokenKind::Refresh, current.refresh_token),
        ];
        for (kind, token) in tokens {
            let Some(token) = token.filter(|token| !token.is_empty()) else {
                continue;
            };
            match with_timeout(self.remote_timeout, self.client.revoke_token(&token)).await {
                Ok(()) => report.revoked.push(kind),
                Err(err) => {
                    tracing::warn!(profile, %kind, error = %err, "token revocation failed");
                    self.console
                        .warn(&format!("Failed to revoke {kind} token: {err}"));
                    report.failed.push(kind);
                }
            }
        }
        self.store.delete(profile)?;
        Ok(report)
    }

    /// Stored credential that is still inside its validity window.
    pub fn whoami_check(&self, profile: &str) -> Result<Credential, AuthError> {
        let credential = self.store.load(profile)?;
        if !is_valid(Some(&credential)) {
            return Err(AuthError::TokenExpired);
        }
        Ok(credential)
    }

    /// Ask the provider who the stored access token belongs to.
    pub async fn introspect(&self, profile: &str) -> Result<Introspection, AuthError> {
        self.whoami(profile).await.map(|(_, identity)| identity)
    }

    /// Valid stored credential together with the identity it belongs to.
    pub async fn whoami(&self, profile: &str) -> Result<(Credential, Introspection), AuthError> {
        let credential = self.whoami_check(profile)?;
        let identity = with_timeout(
            self.remote_timeout,
            self.client.introspect_token(&credential.access_token),
        )
        .await?;
        Ok((credential, identity))
    }

    /// Stored credential regardless of expiry.
    pub fn stored(&self, profile: &str) -> Result<Credential, AuthError> {
        self.store.load(profile)
    }

    /// Every stored profile and whether its credential is usable.
    pub fn status(&self) -> Result<Vec<ProfileStatus>, AuthError> {
        let now = Utc::now();
        let statuses = self
            .store
            .profiles()?
            .into_iter()
            .map(|profile| {
                let state = match self.store.load(&profile) {
                    Ok(credential) if is_valid(Some(&credential)) => ProfileState::Valid {
                        expires_at: credential.expires_at,
                        remaining: remaining(&credential, now).unwrap_or_else(chrono::Duration::zero),
                    },
                    Ok(credential) => ProfileState::Expired {
                        expires_at: credential.expires_at,
                        refreshable: credential.has_refresh_token(),
                    },
                    Err(err) => ProfileState::Unreadable(err.to_string()),
                };
                ProfileStatus { profile, state }
            })
            .collect();
        Ok(statuses)
    }

    fn reusable_credential(
        &self,
        profile: &str,
        options: &LoginOptions,
    ) -> Result<Option<Credential>, AuthError> {
        validate_profile(profile)?;
        if options.force_login {
            return Ok(None);
        }
        match self.store.load(profile) {
            Ok(credential) if is_valid(Some(&credential)) => Ok(Some(credential)),
            Ok(_) | Err(AuthError::NotLoggedIn) => Ok(None),
            Err(AuthError::CorruptCredential(reason)) => {
                tracing::warn!(profile, %reason, "ignoring unreadable credential");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
