//! Display helpers for stored credentials.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::client::Introspection;
use super::token::Credential;
use super::validity::{is_valid_at, remaining};

/// Shorten a secret so it can be shown on screen.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// `2h 5m`, `12m`, or `<1m`.
pub fn format_remaining(left: Duration) -> String {
    let minutes = left.num_minutes();
    match (minutes / 60, minutes % 60) {
        (0, 0) => "<1m".to_string(),
        (0, m) => format!("{m}m"),
        (h, m) => format!("{h}h {m}m"),
    }
}

/// Renderable view of a credential.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialSummary {
    pub profile: String,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub valid: bool,
    pub expires_in_minutes: i64,
    pub scopes: Vec<String>,
}

impl CredentialSummary {
    /// Tokens are masked unless `reveal` is set.
    pub fn new(profile: &str, credential: &Credential, now: DateTime<Utc>, reveal: bool) -> Self {
        let show = |token: &str| {
            if reveal {
                token.to_string()
            } else {
                mask_token(token)
            }
        };
        Self {
            profile: profile.to_string(),
            access_token: show(&credential.access_token),
            refresh_token: credential.refresh_token.as_deref().map(show),
            expires_at: credential.expires_at,
            valid: is_valid_at(Some(credential), now),
            expires_in_minutes: remaining(credential, now).map_or(0, |left| left.num_minutes()),
            scopes: credential.scopes.clone(),
        }
    }
}

impl fmt::Display for CredentialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.valid {
            format!(
                "valid ({} remaining)",
                format_remaining(Duration::minutes(self.expires_in_minutes))
            )
        } else {
            "expired or about to expire".to_string()
        };
        writeln!(f, "Profile:       {}", self.profile)?;
        writeln!(f, "Access token:  {}", self.access_token)?;
        writeln!(
            f,
            "Refresh token: {}",
            self.refresh_token.as_deref().unwrap_or("(none)")
        )?;
        writeln!(
            f,
            "Expires at:    {}",
            self.expires_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(f, "Status:        {status}")?;
        if self.scopes.is_empty() {
            write!(f, "Scopes:        (none)")
        } else {
            write!(f, "Scopes:")?;
            for scope in &self.scopes {
                write!(f, "\n  - {scope}")?;
            }
            Ok(())
        }
    }
}

/// Who a profile is logged in as, combining the stored expiry with the
/// provider's introspection answer.
#[derive(Debug, Clone, Serialize)]
pub struct WhoamiSummary {
    pub profile: String,
    pub logged_in: bool,
    pub expires_at: DateTime<Utc>,
    pub expires_in_minutes: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub sub: String,
    pub identity_set: Vec<String>,
    pub scopes: Vec<String>,
}

impl WhoamiSummary {
    pub fn new(
        profile: &str,
        credential: &Credential,
        identity: &Introspection,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            profile: profile.to_string(),
            logged_in: true,
            expires_at: credential.expires_at,
            expires_in_minutes: remaining(credential, now).map_or(0, |left| left.num_minutes()),
            username: identity.username.clone(),
            name: identity.name.clone().filter(|name| !name.is_empty()),
            email: identity.email.clone().filter(|email| !email.is_empty()),
            sub: identity.sub.clone(),
            identity_set: identity.identity_set.clone(),
            scopes: credential.scopes.clone(),
        }
    }
}

impl fmt::Display for WhoamiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let who = match (self.username.is_empty(), self.sub.is_empty()) {
            (false, _) => self.username.as_str(),
            (true, false) => self.sub.as_str(),
            (true, true) => "an unnamed identity",
        };
        writeln!(f, "✅ Logged in as {who} (profile '{}').", self.profile)?;
        if let Some(name) = &self.name {
            writeln!(f, "   Name:       {name}")?;
        }
        if let Some(email) = &self.email {
            writeln!(f, "   Email:      {email}")?;
        }
        if !self.sub.is_empty() {
            writeln!(f, "   Subject:    {}", self.sub)?;
        }
        if !self.identity_set.is_empty() {
            writeln!(f, "   Identities: {}", self.identity_set.join(", "))?;
        }
        write!(
            f,
            "   Token expires in {}.",
            format_remaining(Duration::minutes(self.expires_in_minutes))
        )
    }
}
