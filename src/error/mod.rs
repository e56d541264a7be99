//! Top-level error type for gauth.

use thiserror::Error;

use crate::auth::AuthError;

/// Exit code for failures that need a fresh login.
pub const EXIT_LOGIN_REQUIRED: i32 = 2;

/// Primary error type returned to the command layer.
#[derive(Error, Debug)]
pub enum GauthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GauthError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Auth(err) if err.requires_login() => EXIT_LOGIN_REQUIRED,
            _ => 1,
        }
    }

    /// Actionable follow-up for the user, if there is one.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Auth(AuthError::NotLoggedIn | AuthError::CorruptCredential(_)) => {
                Some("You are not logged in. Please run `gauth login` (or `gauth device`).")
            }
            Self::Auth(AuthError::TokenExpired) => Some(
                "Your token has expired. Run `gauth refresh`, or log in again with `gauth login`.",
            ),
            Self::Auth(AuthError::NoRefreshToken) => {
                Some("No refresh token is stored. Please log in again with `gauth login`.")
            }
            Self::Auth(AuthError::TimedOut) => {
                Some("No browser callback arrived. Retry, or use `gauth device` on headless machines.")
            }
            Self::Auth(AuthError::Expired) => {
                Some("The device code expired. Run `gauth device` again and approve sooner.")
            }
            Self::Configuration(_) | Self::Auth(AuthError::Configuration(_)) => Some(
                "Set GAUTH_CLIENT_ID (and GAUTH_CLIENT_SECRET for confidential clients) or add them to config.toml.",
            ),
            _ => None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, GauthError>;
