use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error::AuthError;

/// Credential persisted for one profile.
///
/// Serialized as a flat JSON object; `refresh_token` and `scopes` are
/// omitted when empty.
///
/// # Example
/// ```
/// use chrono::{Duration, Utc};
/// use gauth::auth::Credential;
///
/// let credential = Credential {
///     access_token: "access".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     expires_at: Utc::now() + Duration::hours(1),
///     scopes: vec!["openid".to_string(), "profile".to_string()],
/// };
/// assert!(credential.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(
        default,
        skip_serializing_if = "is_blank",
        deserialize_with = "blank_as_none"
    )]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl Credential {
    /// Build a credential from a token endpoint response.
    ///
    /// `fallback_refresh` is kept when the response carries no refresh token,
    /// which is how refresh preserves the stored value across rotations that
    /// the provider skips.
    pub fn from_response(
        response: TokenResponse,
        fallback_refresh: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let expires_at = response.expires_at(now);
        let scopes = split_scopes(&response.scope);
        let refresh_token = response
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| fallback_refresh.filter(|t| !t.is_empty()));
        Self {
            access_token: response.access_token,
            refresh_token,
            expires_at,
            scopes,
        }
    }

    /// Reject records that are only partially populated.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.access_token.trim().is_empty() {
            return Err(AuthError::CorruptCredential("credential has no access token".into()));
        }
        if self.expires_at.timestamp() == 0 {
            return Err(AuthError::CorruptCredential("credential has no expiry".into()));
        }
        Ok(())
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Token payload returned by the authorization server for code exchange,
/// device polling and refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to the moment the response was received.
    #[serde(default)]
    pub expires_in: i64,
    /// Space-delimited granted scopes.
    #[serde(default)]
    pub scope: String,
    /// Absolute expiry when the client already computed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<DateTime<Utc>>,
}

impl TokenResponse {
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.expiry_time
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in))
    }
}

/// Split a provider scope string into its parts, keeping provider order.
pub fn split_scopes(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(ToString::to_string).collect()
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}
