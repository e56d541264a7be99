//! Timeout helper.

use std::future::Future;
use std::time::Duration;

use crate::auth::AuthError;

/// Deadline applied to non-interactive remote calls (refresh, revoke,
/// introspect, device-code request).
pub const REMOTE_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Wrap a future with a timeout.
pub async fn with_timeout<T>(
    duration: Duration,
    future: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, AuthError> {
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Timeout(duration.as_millis() as u64)),
    }
}
