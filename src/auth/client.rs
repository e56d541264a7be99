//! Contract with the remote authorization server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::token::TokenResponse;

/// Device authorization issued by the provider.
///
/// # Example
/// ```
/// use gauth::auth::DeviceAuthorization;
///
/// let authorization = DeviceAuthorization {
///     device_code: "device-code".to_string(),
///     user_code: "ABCD-EFGH".to_string(),
///     verification_uri: "https://auth.example.org/device".to_string(),
///     verification_uri_complete: None,
///     expires_in: 900,
///     interval: 5,
/// };
/// assert_eq!(authorization.expires_in_minutes(), 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthorization {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl DeviceAuthorization {
    pub fn expires_in_minutes(&self) -> u64 {
        self.expires_in / 60
    }
}

fn default_interval() -> u64 {
    5
}

/// Outcome of a single device token poll.
#[derive(Debug, Clone)]
pub enum DevicePoll {
    Pending,
    SlowDown,
    Authorized(TokenResponse),
    Denied,
    Expired,
}

/// Token introspection result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Introspection {
    pub active: bool,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub identity_set: Vec<String>,
}

/// Remote operations needed by the login flows and token lifecycle.
///
/// Implementations own transport details (endpoints, client credentials,
/// redirect URI); callers only see OAuth2 concepts.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// URL the user visits to approve access. `state` is echoed back on the
    /// redirect.
    fn build_authorization_url(&self, state: &str, scopes: &[String])
        -> Result<String, AuthError>;

    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenResponse, AuthError>;

    async fn request_device_code(&self, scopes: &[String])
        -> Result<DeviceAuthorization, AuthError>;

    /// Single poll attempt; interval and deadline are the caller's concern.
    async fn poll_device_code(&self, device_code: &str) -> Result<DevicePoll, AuthError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError>;

    async fn revoke_token(&self, token: &str) -> Result<(), AuthError>;

    async fn introspect_token(&self, access_token: &str) -> Result<Introspection, AuthError>;
}
