//! Command handlers: wire the service together and render results.

use std::sync::Arc;

use chrono::Utc;

use super::{Cli, Commands, DeviceArgs, LoginArgs, OutputFormat, TokensCommands};
use crate::auth::{
    format_remaining, AuthService, CredentialSummary, FileTokenStore, HttpAuthClient,
    Introspection, LoginOptions, LoginOutcome, ProfileState, SystemBrowser, TerminalConsole,
    TokenKind, TokenStoreConfig, WhoamiSummary,
};
use crate::config::AuthConfig;
use crate::error::Result;

/// Resolve configuration, build the service and run the selected command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = AuthConfig::from_env(cli.overrides())?;
    let service = build_service(&config)?;
    let profile = cli.profile.as_str();

    match cli.command {
        Commands::Login(args) => handle_login(&service, profile, args).await,
        Commands::Device(args) => handle_device(&service, profile, args).await,
        Commands::Logout => handle_logout(&service, profile).await,
        Commands::Refresh => handle_refresh(&service, profile).await,
        Commands::Whoami(args) => handle_whoami(&service, profile, args.format).await,
        Commands::Tokens(tokens) => match tokens.command {
            TokensCommands::Show {
                show_secrets,
                format,
            } => handle_show(&service, profile, show_secrets, format.format),
            TokensCommands::Introspect(args) => {
                handle_introspect(&service, profile, args.format).await
            }
            TokensCommands::Revoke { kind } => handle_revoke(&service, profile, kind).await,
        },
        Commands::Status => handle_status(&service),
    }
}

fn build_service(config: &AuthConfig) -> Result<AuthService> {
    let client = HttpAuthClient::new(config)?;
    let store = FileTokenStore::new(TokenStoreConfig::new(config.config_root.clone()));
    Ok(AuthService::new(
        Arc::new(client),
        Arc::new(store),
        Arc::new(TerminalConsole),
        Arc::new(SystemBrowser),
    )
    .with_callback_port(config.callback_port))
}

fn scopes_option(scopes: Vec<String>) -> Option<Vec<String>> {
    (!scopes.is_empty()).then_some(scopes)
}

async fn handle_login(service: &AuthService, profile: &str, args: LoginArgs) -> Result<()> {
    let options = LoginOptions::builder()
        .force_login(args.force)
        .no_save_tokens(args.no_save_tokens)
        .no_browser(args.no_browser)
        .maybe_scopes(scopes_option(args.scopes))
        .build();
    let outcome = service.login(profile, &options).await?;
    report_login(profile, &outcome, &options);
    Ok(())
}

async fn handle_device(service: &AuthService, profile: &str, args: DeviceArgs) -> Result<()> {
    let options = LoginOptions::builder()
        .force_login(args.force)
        .no_save_tokens(args.no_save_tokens)
        .maybe_scopes(scopes_option(args.scopes))
        .build();
    let outcome = service.device_login(profile, &options).await?;
    report_login(profile, &outcome, &options);
    Ok(())
}

fn report_login(profile: &str, outcome: &LoginOutcome, options: &LoginOptions) {
    match outcome {
        LoginOutcome::AlreadyLoggedIn(credential) => {
            println!(
                "✅ Already logged in as profile '{profile}' (valid until {}).",
                credential.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
            println!("   Use --force to log in again.");
        }
        LoginOutcome::Authenticated(credential) => {
            println!("✅ Login successful for profile '{profile}'.");
            println!(
                "   Access token valid until {}.",
                credential.expires_at.format("%Y-%m-%d %H:%M UTC")
            );
            if options.no_save_tokens {
                println!("   Tokens were not saved (--no-save-tokens).");
            }
        }
    }
}

async fn handle_logout(service: &AuthService, profile: &str) -> Result<()> {
    let report = service.logout(profile).await?;
    if report.failed.is_empty() {
        println!("✅ Logged out of profile '{profile}'.");
    } else {
        println!("✅ Local credential for '{profile}' removed; some tokens could not be revoked.");
    }
    Ok(())
}

async fn handle_refresh(service: &AuthService, profile: &str) -> Result<()> {
    let credential = service.refresh(profile).await?;
    println!(
        "✅ Token refreshed for profile '{profile}' (valid until {}).",
        credential.expires_at.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

async fn handle_whoami(service: &AuthService, profile: &str, format: OutputFormat) -> Result<()> {
    let (credential, identity) = service.whoami(profile).await?;
    let whoami = WhoamiSummary::new(profile, &credential, &identity, Utc::now());
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&whoami)?),
        OutputFormat::Text => println!("{whoami}"),
    }
    Ok(())
}

fn handle_show(
    service: &AuthService,
    profile: &str,
    show_secrets: bool,
    format: OutputFormat,
) -> Result<()> {
    let credential = service.stored(profile)?;
    let summary = CredentialSummary::new(profile, &credential, Utc::now(), show_secrets);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => println!("{summary}"),
    }
    Ok(())
}

async fn handle_introspect(service: &AuthService, profile: &str, format: OutputFormat) -> Result<()> {
    let info = service.introspect(profile).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        OutputFormat::Text => print_introspection(&info),
    }
    Ok(())
}

fn print_introspection(info: &Introspection) {
    let fields = [
        ("Username", info.username.as_str()),
        ("Name", info.name.as_deref().unwrap_or("")),
        ("Email", info.email.as_deref().unwrap_or("")),
        ("Subject", info.sub.as_str()),
        ("Client ID", info.client_id.as_str()),
    ];
    println!("{:<11}{}", "Active:", info.active);
    for (label, value) in fields.into_iter().filter(|(_, value)| !value.is_empty()) {
        println!("{:<11}{value}", format!("{label}:"));
    }
    if let Some(exp) = info.exp.and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)) {
        println!("{:<11}{}", "Expires:", exp.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if !info.scope.is_empty() {
        println!("Scopes:");
        for scope in info.scope.split_whitespace() {
            println!("  - {scope}");
        }
    }
    if !info.identity_set.is_empty() {
        println!("Identities: {}", info.identity_set.join(", "));
    }
}

async fn handle_revoke(service: &AuthService, profile: &str, kind: TokenKind) -> Result<()> {
    service.revoke_one(profile, kind).await?;
    println!("✅ Revoked the {kind} token for profile '{profile}'.");
    println!("   The local credential was kept; run `gauth logout` to remove it.");
    Ok(())
}

fn handle_status(service: &AuthService) -> Result<()> {
    let statuses = service.status()?;
    println!("🔐 Stored profiles\n");
    if statuses.is_empty() {
        println!("  (none) run `gauth login` to create one");
        return Ok(());
    }
    for status in statuses {
        let line = match status.state {
            ProfileState::Valid { remaining, .. } => {
                format!("✅ valid ({} remaining)", format_remaining(remaining))
            }
            ProfileState::Expired {
                refreshable: true, ..
            } => "⚠️  expired (run `gauth refresh`)".to_string(),
            ProfileState::Expired { .. } => "⚠️  expired (run `gauth login`)".to_string(),
            ProfileState::Unreadable(reason) => format!("❌ unreadable: {reason}"),
        };
        println!("  {}: {line}", status.profile);
    }
    Ok(())
}
