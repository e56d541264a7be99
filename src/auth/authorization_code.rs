//! Browser-based authorization-code login.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use super::callback::CallbackServer;
use super::client::AuthClient;
use super::console::{Browser, Console};
use super::error::AuthError;
use super::login::{complete_login, LoginOptions};
use super::store::TokenStore;
use super::token::Credential;
use crate::util::timeout::{with_timeout, REMOTE_CALL_TIMEOUT};

/// How long the user has to finish the browser approval.
pub const AUTHORIZATION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Runs one authorization-code exchange through a loopback redirect
/// listener.
///
/// The flow does not check for an existing credential; callers decide
/// whether to run it.
pub struct AuthorizationCodeFlow {
    client: Arc<dyn AuthClient>,
    store: Arc<dyn TokenStore>,
    console: Arc<dyn Console>,
    browser: Arc<dyn Browser>,
    listen_addr: SocketAddr,
    timeout: Duration,
    remote_timeout: Duration,
}

impl AuthorizationCodeFlow {
    pub fn new(
        client: Arc<dyn AuthClient>,
        store: Arc<dyn TokenStore>,
        console: Arc<dyn Console>,
        browser: Arc<dyn Browser>,
        callback_port: u16,
    ) -> Self {
        Self {
            client,
            store,
            console,
            browser,
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, callback_port)),
            timeout: AUTHORIZATION_TIMEOUT,
            remote_timeout: REMOTE_CALL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound on the code exchange request.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Complete the flow for `profile`.
    ///
    /// The listener is shut down before this returns, whatever the outcome.
    pub async fn run(&self, profile: &str, options: &LoginOptions) -> Result<Credential, AuthError> {
        let mut server = CallbackServer::bind(self.listen_addr).await?;
        let result = self.authorize(&mut server, profile, options).await;
        server.shutdown().await;
        result
    }

    async fn authorize(
        &self,
        server: &mut CallbackServer,
        profile: &str,
        options: &LoginOptions,
    ) -> Result<Credential, AuthError> {
        let state = uuid::Uuid::new_v4().simple().to_string();
        let scopes = options.requested_scopes();
        let url = self.client.build_authorization_url(&state, &scopes)?;

        self.console
            .info("Please open the following URL in your browser to log in:");
        self.console.info(&format!("\n    {url}\n"));
        if !options.no_browser {
            if let Err(err) = self.browser.open(&url) {
                tracing::warn!(error = %err, "could not open a browser; use the printed URL");
            }
        }
        self.console.info(&format!(
            "Waiting for authorization (up to {} minutes)...",
            self.timeout.as_secs() / 60
        ));

        let code = server.wait(self.timeout).await?;
        tracing::debug!(profile, "authorization code received, exchanging");

        let response = with_timeout(
            self.remote_timeout,
            self.client.exchange_authorization_code(&code),
        )
        .await
        .map_err(|err| AuthError::ExchangeError(err.to_string()))?;

        complete_login(self.store.as_ref(), profile, response, options)
    }
}
