//! gauth: OAuth2 credential lifecycle for command-line tools.
//!
//! Logs a user in through a browser redirect or the device-code flow,
//! keeps one credential per named profile on disk, and refreshes, inspects
//! or revokes it on request.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use gauth::auth::{
//!     AuthService, FileTokenStore, HttpAuthClient, SystemBrowser, TerminalConsole,
//!     TokenStoreConfig,
//! };
//! use gauth::config::{AuthConfig, ConfigOverrides};
//!
//! # async fn example() -> gauth::error::Result<()> {
//! let config = AuthConfig::from_env(ConfigOverrides::default())?;
//! let service = AuthService::new(
//!     Arc::new(HttpAuthClient::new(&config)?),
//!     Arc::new(FileTokenStore::new(TokenStoreConfig::new(config.config_root.clone()))),
//!     Arc::new(TerminalConsole),
//!     Arc::new(SystemBrowser),
//! );
//! let credential = service.whoami_check("default")?;
//! println!("token valid until {}", credential.expires_at);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
