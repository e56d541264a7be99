//! CLI entry point for gauth.

pub mod auth;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use strum::{Display, EnumString};

use crate::auth::TokenKind;
use crate::config::{ConfigOverrides, DEFAULT_PROFILE};

/// gauth OAuth2 credential manager
#[derive(Parser, Debug)]
#[command(name = "gauth", version, about = "Log in, inspect and revoke OAuth2 credentials")]
pub struct Cli {
    /// Credential profile to operate on
    #[arg(long, global = true, env = "GAUTH_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Configuration directory (defaults to ~/.gauth)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// OAuth2 client id
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Loopback port for the browser redirect
    #[arg(long, global = true)]
    pub callback_port: Option<u16>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in through the browser
    Login(LoginArgs),
    /// Log in with a device code (no local browser needed)
    Device(DeviceArgs),
    /// Revoke stored tokens and delete the local credential
    Logout,
    /// Refresh the access token
    Refresh,
    /// Check that the stored credential is valid
    Whoami(FormatArgs),
    /// Inspect or revoke stored tokens
    Tokens(TokensArgs),
    /// Show every stored profile
    Status,
}

/// Arguments for `gauth login`.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Log in even when a valid credential is stored
    #[arg(long)]
    pub force: bool,

    /// Do not write the credential to disk
    #[arg(long)]
    pub no_save_tokens: bool,

    /// Print the authorization URL without opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Scope to request (repeatable)
    #[arg(long = "scope")]
    pub scopes: Vec<String>,
}

/// Arguments for `gauth device`.
#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Log in even when a valid credential is stored
    #[arg(long)]
    pub force: bool,

    /// Do not write the credential to disk
    #[arg(long)]
    pub no_save_tokens: bool,

    /// Scope to request (repeatable)
    #[arg(long = "scope")]
    pub scopes: Vec<String>,
}

#[derive(Args, Debug)]
pub struct FormatArgs {
    /// Output format
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `tokens` subcommand group.
#[derive(Args, Debug)]
pub struct TokensArgs {
    #[command(subcommand)]
    pub command: TokensCommands,
}

#[derive(Subcommand, Debug)]
pub enum TokensCommands {
    /// Show the stored credential
    Show {
        /// Print full token values instead of masked ones
        #[arg(long)]
        show_secrets: bool,

        #[command(flatten)]
        format: FormatArgs,
    },
    /// Ask the provider about the stored access token
    Introspect(FormatArgs),
    /// Revoke one stored token remotely
    Revoke {
        /// Which token to revoke
        #[arg(long, default_value = "access")]
        kind: TokenKind,
    },
}

/// How command results are rendered on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl Cli {
    /// Flag values that take precedence over environment and config file.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_root: self.config_dir.clone(),
            client_id: self.client_id.clone(),
            client_secret: None,
            callback_port: self.callback_port,
        }
    }
}
