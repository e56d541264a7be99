//! Loopback listener that receives the provider's authorization redirect.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::error::AuthError;

pub const CALLBACK_PATH: &str = "/callback";

/// How long shutdown waits for open browser connections to drain before the
/// server task is aborted.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

const SUCCESS_PAGE: &str = "<!DOCTYPE html><html><head><title>Login complete</title></head>\
<body><h1>Authorization successful</h1><p>You can close this window and return to the terminal.</p></body></html>";

const FAILURE_PAGE: &str = "<!DOCTYPE html><html><head><title>Login failed</title></head>\
<body><h1>Authorization failed</h1><p>No authorization code was received. Return to the terminal for details.</p></body></html>";

/// What the redirect delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Error(String),
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// A bound callback listener for one authorization attempt.
///
/// The first redirect wins; later ones get a page but are otherwise ignored.
/// Call [`CallbackServer::shutdown`] to release the port; dropping the value
/// also stops the server.
pub struct CallbackServer {
    local_addr: SocketAddr,
    outcomes: mpsc::Receiver<CallbackOutcome>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl CallbackServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self, AuthError> {
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|err| {
            AuthError::CallbackError(format!("cannot listen on {addr}: {err}"))
        })?;
        let local_addr = listener
            .local_addr()
            .map_err(|err| AuthError::CallbackError(err.to_string()))?;

        let (sender, outcomes) = mpsc::channel(1);
        let router = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(sender);

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let task = tokio::spawn(async move {
            let serve =
                axum::serve(listener, router).with_graceful_shutdown(signal.cancelled_owned());
            if let Err(err) = serve.await {
                tracing::warn!(error = %err, "callback listener exited with error");
            }
        });
        tracing::debug!(%local_addr, "callback listener started");

        Ok(Self {
            local_addr,
            outcomes,
            shutdown,
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the first redirect, or give up after `timeout`.
    pub async fn wait(&mut self, timeout: Duration) -> Result<String, AuthError> {
        match tokio::time::timeout(timeout, self.outcomes.recv()).await {
            Ok(Some(CallbackOutcome::Code(code))) => Ok(code),
            Ok(Some(CallbackOutcome::Error(reason))) => Err(AuthError::CallbackError(reason)),
            Ok(None) => Err(AuthError::CallbackError(
                "callback listener stopped unexpectedly".to_string(),
            )),
            Err(_) => Err(AuthError::TimedOut),
        }
    }

    /// Stop accepting connections and wait until the port is released.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(DRAIN_TIMEOUT, &mut task).await.is_err() {
                task.abort();
                let _ = task.await;
            }
        }
        tracing::debug!(local_addr = %self.local_addr, "callback listener stopped");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn handle_callback(
    State(sender): State<mpsc::Sender<CallbackOutcome>>,
    Query(params): Query<CallbackParams>,
) -> impl IntoResponse {
    // The state value is not compared against the one that was sent.
    tracing::debug!(state = ?params.state, "authorization redirect received");
    match params.code.filter(|code| !code.is_empty()) {
        Some(code) => {
            let _ = sender.try_send(CallbackOutcome::Code(code));
            (StatusCode::OK, Html(SUCCESS_PAGE))
        }
        None => {
            let reason = match (params.error, params.error_description) {
                (Some(error), Some(description)) => format!("{error}: {description}"),
                (Some(error), None) => error,
                (None, _) => "redirect did not include an authorization code".to_string(),
            };
            let _ = sender.try_send(CallbackOutcome::Error(reason));
            (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE))
        }
    }
}
