use thiserror::Error;

/// Errors raised by the credential lifecycle.
///
/// Each failure mode of the login flows and token operations is its own
/// variant so the command layer can pick exit codes and messages without
/// parsing strings.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Not logged in")]
    NotLoggedIn,
    #[error("Stored token has expired")]
    TokenExpired,
    #[error("No refresh token stored")]
    NoRefreshToken,
    #[error("Token storage error: {0}")]
    Storage(String),
    /// A stored record exists but cannot be parsed or is incomplete.
    #[error("Stored credential is unreadable: {0}")]
    CorruptCredential(String),
    #[error("Authorization callback failed: {0}")]
    CallbackError(String),
    #[error("Timed out waiting for the authorization callback")]
    TimedOut,
    #[error("Authorization code exchange failed: {0}")]
    ExchangeError(String),
    #[error("Device authorization failed: {0}")]
    PollError(String),
    #[error("Device code expired before authorization completed")]
    Expired,
    #[error("Token revocation failed: {0}")]
    RevocationError(String),
    #[error("Invalid profile name: {0:?}")]
    InvalidProfile(String),
    #[error("Provider returned {status}: {error}{}", describe(.description))]
    Provider {
        status: u16,
        error: String,
        description: Option<String>,
    },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout after {0}ms")]
    Timeout(u64),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Whether the user has to log in again before retrying.
    ///
    /// A corrupt token file is treated the same as a missing one; failures
    /// to write or remove a file are not.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::NotLoggedIn
                | Self::TokenExpired
                | Self::NoRefreshToken
                | Self::CorruptCredential(_)
        )
    }
}

fn describe(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            return Self::Network(format!("request timed out: {error}"));
        }
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

impl From<url::ParseError> for AuthError {
    fn from(error: url::ParseError) -> Self {
        Self::Configuration(format!("invalid URL: {error}"))
    }
}
