//! Expiry checks with a fixed safety margin.

use chrono::{DateTime, Duration, Utc};

use super::token::Credential;

/// Margin subtracted from the server-side expiry before a token is
/// considered unusable.
pub const VALIDITY_BUFFER: Duration = Duration::minutes(5);

/// Whether `credential` can still be used right now.
pub fn is_valid(credential: Option<&Credential>) -> bool {
    is_valid_at(credential, Utc::now())
}

/// Same rule as [`is_valid`] with an explicit clock.
///
/// A credential expiring exactly `VALIDITY_BUFFER` from `now` is invalid.
pub fn is_valid_at(credential: Option<&Credential>, now: DateTime<Utc>) -> bool {
    match credential {
        Some(credential) => now + VALIDITY_BUFFER < credential.expires_at,
        None => false,
    }
}

/// Time left before the real expiry, or `None` once it has passed.
pub fn remaining(credential: &Credential, now: DateTime<Utc>) -> Option<Duration> {
    let left = credential.expires_at - now;
    (left > Duration::zero()).then_some(left)
}
