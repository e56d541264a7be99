//! Configuration system (layered: flags > env > config file > defaults).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::GauthError;

pub const DEFAULT_AUTH_URL: &str = "https://auth.globus.org";
pub const DEFAULT_CALLBACK_PORT: u16 = 8888;
pub const DEFAULT_PROFILE: &str = "default";
pub const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Scopes requested when the caller does not name any.
pub const DEFAULT_SCOPES: &[&str] = &[
    "openid",
    "profile",
    "email",
    "urn:globus:auth:scope:auth.globus.org:view_identities",
    "urn:globus:auth:scope:transfer.api.globus.org:all",
    "urn:globus:auth:scope:groups.api.globus.org:all",
    "urn:globus:auth:scope:search.api.globus.org:all",
    "https://auth.globus.org/scopes/eec9b274-0c81-4334-bdc2-54e90e689b9a/manage_flows",
    "https://auth.globus.org/scopes/facd7ccc-c5f4-42aa-916b-a0e270e2c2a9/all",
];

pub fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(ToString::to_string).collect()
}

/// Resolved settings for talking to the authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub callback_port: u16,
    pub config_root: PathBuf,
    pub request_timeout: Duration,
}

impl AuthConfig {
    /// Redirect URI registered with the provider; the callback listener
    /// binds the same port on loopback.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}/callback", self.callback_port)
    }

    /// Load from the process environment (after reading `.env`) and the
    /// config file under the resolved root.
    pub fn from_env(overrides: ConfigOverrides) -> Result<Self, GauthError> {
        let _ = dotenvy::dotenv();
        Self::resolve(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve the layered configuration with an injectable environment.
    pub fn resolve<F>(overrides: ConfigOverrides, env: F) -> Result<Self, GauthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let config_root = overrides
            .config_root
            .or_else(|| env("GAUTH_CONFIG_DIR").map(PathBuf::from))
            .unwrap_or_else(default_config_root);
        let file = FileConfig::load(&config_root.join(CONFIG_FILE_NAME))?;

        let client_id = overrides
            .client_id
            .or_else(|| env("GAUTH_CLIENT_ID"))
            .or(file.client_id)
            .ok_or_else(|| {
                GauthError::Configuration(format!(
                    "no client id configured (set GAUTH_CLIENT_ID or client_id in {})",
                    config_root.join(CONFIG_FILE_NAME).display()
                ))
            })?;
        let client_secret = overrides
            .client_secret
            .or_else(|| env("GAUTH_CLIENT_SECRET"))
            .or(file.client_secret);
        let auth_url = env("GAUTH_AUTH_URL")
            .or(file.auth_url)
            .unwrap_or_else(|| DEFAULT_AUTH_URL.to_string());
        let callback_port = match overrides.callback_port {
            Some(port) => port,
            None => match env("GAUTH_CALLBACK_PORT") {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    GauthError::Configuration(format!("GAUTH_CALLBACK_PORT is not a port: {raw}"))
                })?,
                None => file.callback_port.unwrap_or(DEFAULT_CALLBACK_PORT),
            },
        };
        let request_timeout = Duration::from_secs(
            file.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        );

        Ok(Self {
            client_id,
            client_secret,
            auth_url,
            callback_port,
            config_root,
            request_timeout,
        })
    }
}

/// Values supplied on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_root: Option<PathBuf>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub callback_port: Option<u16>,
}

/// Optional on-disk settings in `<config-root>/config.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_url: Option<String>,
    callback_port: Option<u16>,
    request_timeout_secs: Option<u64>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, GauthError> {
        let raw = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(GauthError::Io(err)),
        };
        toml::from_str(&raw).map_err(|err| {
            GauthError::Configuration(format!("{}: {err}", path.display()))
        })
    }
}

/// `~/.gauth`, or `.gauth` in the working directory when no home exists.
pub fn default_config_root() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".gauth"))
        .unwrap_or_else(|| PathBuf::from(".gauth"))
}
