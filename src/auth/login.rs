use bon::Builder;
use chrono::Utc;

use super::error::AuthError;
use super::store::TokenStore;
use super::token::{Credential, TokenResponse};
use crate::config::default_scopes;

/// Per-invocation login settings.
///
/// Passed explicitly into every flow so repeated logins in one process never
/// share flag state.
///
/// # Example
/// ```
/// use gauth::auth::LoginOptions;
///
/// let options = LoginOptions::builder()
///     .force_login(true)
///     .scopes(vec!["openid".to_string()])
///     .build();
/// assert!(options.force_login);
/// assert!(!options.no_save_tokens);
/// assert_eq!(options.requested_scopes(), vec!["openid".to_string()]);
/// ```
#[derive(Debug, Clone, Default, Builder)]
pub struct LoginOptions {
    /// Run the flow even when a valid credential is stored.
    #[builder(default)]
    pub force_login: bool,
    /// Return the credential without writing it to the store.
    #[builder(default)]
    pub no_save_tokens: bool,
    /// Print the authorization URL but do not launch a browser.
    #[builder(default)]
    pub no_browser: bool,
    /// Scopes to request; `None` or empty means the default set.
    pub scopes: Option<Vec<String>>,
}

impl LoginOptions {
    pub fn requested_scopes(&self) -> Vec<String> {
        match &self.scopes {
            Some(scopes) if !scopes.is_empty() => scopes.clone(),
            _ => default_scopes(),
        }
    }
}

/// Result of a login request.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    /// A stored credential was still valid; no flow ran.
    AlreadyLoggedIn(Credential),
    /// A flow completed and produced this credential.
    Authenticated(Credential),
}

impl LoginOutcome {
    pub fn credential(&self) -> &Credential {
        match self {
            Self::AlreadyLoggedIn(credential) | Self::Authenticated(credential) => credential,
        }
    }
}

/// Turn a successful token response into a credential and persist it unless
/// the caller opted out.
pub(crate) fn complete_login(
    store: &dyn TokenStore,
    profile: &str,
    response: TokenResponse,
    options: &LoginOptions,
) -> Result<Credential, AuthError> {
    let credential = Credential::from_response(response, None, Utc::now());
    credential
        .validate()
        .map_err(|_| AuthError::InvalidResponse("token response had no access token".into()))?;
    if options.no_save_tokens {
        tracing::debug!(profile, "token persistence disabled for this login");
    } else {
        store.save(profile, &credential)?;
    }
    Ok(credential)
}
