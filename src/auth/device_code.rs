//! Device-authorization login for machines without a local browser.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::client::{AuthClient, DeviceAuthorization, DevicePoll};
use super::console::Console;
use super::error::AuthError;
use super::login::{complete_login, LoginOptions};
use super::store::TokenStore;
use super::token::{Credential, TokenResponse};
use crate::util::timeout::{with_timeout, REMOTE_CALL_TIMEOUT};

/// Added to the poll interval each time the provider answers `slow_down`.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Requests a device code, shows it to the user and polls until approval,
/// denial or expiry.
pub struct DeviceCodeFlow {
    client: Arc<dyn AuthClient>,
    store: Arc<dyn TokenStore>,
    console: Arc<dyn Console>,
    remote_timeout: Duration,
}

impl DeviceCodeFlow {
    pub fn new(
        client: Arc<dyn AuthClient>,
        store: Arc<dyn TokenStore>,
        console: Arc<dyn Console>,
    ) -> Self {
        Self {
            client,
            store,
            console,
            remote_timeout: REMOTE_CALL_TIMEOUT,
        }
    }

    /// Bound on the device-code request.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub async fn run(&self, profile: &str, options: &LoginOptions) -> Result<Credential, AuthError> {
        let scopes = options.requested_scopes();
        let requested_at = Instant::now();
        let authorization =
            with_timeout(self.remote_timeout, self.client.request_device_code(&scopes)).await?;
        let deadline = requested_at
            .checked_add(Duration::from_secs(authorization.expires_in))
            .ok_or_else(|| {
                AuthError::InvalidResponse(format!(
                    "device code lifetime out of range: {}s",
                    authorization.expires_in
                ))
            })?;
        self.display(&authorization);

        let response = match tokio::time::timeout_at(deadline, self.poll(&authorization)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::debug!(profile, "device code deadline reached");
                return Err(AuthError::Expired);
            }
        };
        complete_login(self.store.as_ref(), profile, response, options)
    }

    fn display(&self, authorization: &DeviceAuthorization) {
        self.console.info("To log in, visit:");
        self.console
            .info(&format!("\n    {}\n", authorization.verification_uri));
        self.console
            .info(&format!("and enter the code: {}", authorization.user_code));
        if let Some(complete) = &authorization.verification_uri_complete {
            self.console
                .info(&format!("Or open this link directly: {complete}"));
        }
        self.console.info(&format!(
            "The code expires in {} minutes. Waiting for approval...",
            authorization.expires_in_minutes()
        ));
    }

    async fn poll(&self, authorization: &DeviceAuthorization) -> Result<TokenResponse, AuthError> {
        let mut interval = Duration::from_secs(authorization.interval.max(1));
        loop {
            tokio::time::sleep(interval).await;
            match self.client.poll_device_code(&authorization.device_code).await {
                Ok(DevicePoll::Authorized(response)) => return Ok(response),
                Ok(DevicePoll::Pending) => continue,
                Ok(DevicePoll::SlowDown) => {
                    interval += SLOW_DOWN_STEP;
                    tracing::debug!(interval_secs = interval.as_secs(), "provider asked to slow down");
                }
                Ok(DevicePoll::Denied) => {
                    return Err(AuthError::PollError("access was denied".to_string()))
                }
                Ok(DevicePoll::Expired) => return Err(AuthError::Expired),
                Err(AuthError::Network(reason)) => {
                    tracing::warn!(%reason, "device poll failed, retrying");
                }
                Err(err) => return Err(AuthError::PollError(err.to_string())),
            }
        }
    }
}
