#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::net::TcpListener;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use gauth::auth::{
    AuthClient, AuthError, Browser, Console, Credential, DeviceAuthorization, DevicePoll,
    Introspection, TokenResponse, TokenStore,
};

#[derive(Default)]
pub struct InMemoryTokenStore {
    credentials: Mutex<HashMap<String, Credential>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, profile: &str, credential: Credential) {
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .insert(profile.to_string(), credential);
    }

    pub fn get(&self, profile: &str) -> Option<Credential> {
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .get(profile)
            .cloned()
    }
}

impl TokenStore for InMemoryTokenStore {
    fn load(&self, profile: &str) -> Result<Credential, AuthError> {
        self.get(profile).ok_or(AuthError::NotLoggedIn)
    }

    fn save(&self, profile: &str, credential: &Credential) -> Result<(), AuthError> {
        self.seed(profile, credential.clone());
        Ok(())
    }

    fn delete(&self, profile: &str) -> Result<(), AuthError> {
        self.credentials
            .lock()
            .expect("store lock poisoned")
            .remove(profile);
        Ok(())
    }

    fn profiles(&self) -> Result<Vec<String>, AuthError> {
        let mut profiles: Vec<String> = self
            .credentials
            .lock()
            .expect("store lock poisoned")
            .keys()
            .cloned()
            .collect();
        profiles.sort();
        Ok(profiles)
    }
}

/// Scriptable [`AuthClient`] that records every remote call.
pub struct StubAuthClient {
    /// Base of the redirect the fake provider sends the browser to.
    redirect_base: Mutex<String>,
    authorization_code: Mutex<String>,
    token_response: Mutex<Option<TokenResponse>>,
    device_authorization: Mutex<Option<DeviceAuthorization>>,
    poll_script: Mutex<VecDeque<DevicePoll>>,
    failing_revocations: Mutex<HashSet<String>>,
    introspection: Mutex<Introspection>,
    /// Delay before the exchange and device-code requests answer.
    response_delay: Mutex<Option<std::time::Duration>>,
    calls: Mutex<Vec<String>>,
}

impl Default for StubAuthClient {
    fn default() -> Self {
        Self {
            redirect_base: Mutex::new("http://127.0.0.1:8888".to_string()),
            authorization_code: Mutex::new("auth-code".to_string()),
            token_response: Mutex::new(None),
            device_authorization: Mutex::new(None),
            poll_script: Mutex::new(VecDeque::new()),
            failing_revocations: Mutex::new(HashSet::new()),
            introspection: Mutex::new(Introspection::default()),
            response_delay: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StubAuthClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_to_port(self, port: u16) -> Self {
        *self.redirect_base.lock().unwrap() = format!("http://127.0.0.1:{port}");
        self
    }

    pub fn with_authorization_code(self, code: &str) -> Self {
        *self.authorization_code.lock().unwrap() = code.to_string();
        self
    }

    pub fn with_token_response(self, response: TokenResponse) -> Self {
        self.set_token_response(response);
        self
    }

    pub fn set_token_response(&self, response: TokenResponse) {
        *self.token_response.lock().unwrap() = Some(response);
    }

    pub fn with_device_authorization(self, authorization: DeviceAuthorization) -> Self {
        *self.device_authorization.lock().unwrap() = Some(authorization);
        self
    }

    pub fn with_poll_script(self, polls: Vec<DevicePoll>) -> Self {
        *self.poll_script.lock().unwrap() = polls.into();
        self
    }

    pub fn failing_revocation_of(self, token: &str) -> Self {
        self.failing_revocations
            .lock()
            .unwrap()
            .insert(token.to_string());
        self
    }

    pub fn with_introspection(self, introspection: Introspection) -> Self {
        *self.introspection.lock().unwrap() = introspection;
        self
    }

    pub fn with_response_delay(self, delay: std::time::Duration) -> Self {
        *self.response_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    async fn stall(&self) {
        let delay = *self.response_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn scripted_token(&self) -> Result<TokenResponse, AuthError> {
        self.token_response
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthError::Provider {
                status: 400,
                error: "invalid_grant".to_string(),
                description: None,
            })
    }
}

#[async_trait]
impl AuthClient for StubAuthClient {
    fn build_authorization_url(
        &self,
        state: &str,
        scopes: &[String],
    ) -> Result<String, AuthError> {
        self.record(format!("authorize:{}", scopes.join(" ")));
        Ok(format!(
            "{}/callback?code={}&state={state}",
            self.redirect_base.lock().unwrap(),
            self.authorization_code.lock().unwrap()
        ))
    }

    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        self.record(format!("exchange:{code}"));
        self.stall().await;
        self.scripted_token()
    }

    async fn request_device_code(
        &self,
        scopes: &[String],
    ) -> Result<DeviceAuthorization, AuthError> {
        self.record(format!("device:{}", scopes.join(" ")));
        self.stall().await;
        self.device_authorization
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| AuthError::InvalidResponse("no device authorization scripted".into()))
    }

    async fn poll_device_code(&self, device_code: &str) -> Result<DevicePoll, AuthError> {
        self.record(format!("poll:{device_code}"));
        Ok(self
            .poll_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(DevicePoll::Pending))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.record(format!("refresh:{refresh_token}"));
        self.scripted_token()
    }

    async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        self.record(format!("revoke:{token}"));
        if self.failing_revocations.lock().unwrap().contains(token) {
            return Err(AuthError::Provider {
                status: 503,
                error: "temporarily_unavailable".to_string(),
                description: None,
            });
        }
        Ok(())
    }

    async fn introspect_token(&self, access_token: &str) -> Result<Introspection, AuthError> {
        self.record(format!("introspect:{access_token}"));
        Ok(self.introspection.lock().unwrap().clone())
    }
}

/// Console that keeps everything it was asked to show.
#[derive(Default)]
pub struct RecordingConsole {
    infos: Mutex<Vec<String>>,
    warnings: Mutex<Vec<String>>,
}

impl RecordingConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn printed(&self, needle: &str) -> bool {
        self.infos().iter().any(|line| line.contains(needle))
    }
}

impl Console for RecordingConsole {
    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

/// Browser stand-in that follows the authorization URL as if the user had
/// approved access, which makes the provider redirect to the callback.
#[derive(Default)]
pub struct RedirectingBrowser {
    opened: Mutex<Vec<String>>,
}

impl RedirectingBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

impl Browser for RedirectingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        let url = url.to_string();
        tokio::spawn(async move {
            let _ = reqwest::get(url).await;
        });
        Ok(())
    }
}

/// Browser that is never expected to be launched.
#[derive(Default)]
pub struct UnavailableBrowser {
    attempts: Mutex<usize>,
}

impl UnavailableBrowser {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

impl Browser for UnavailableBrowser {
    fn open(&self, _url: &str) -> io::Result<()> {
        *self.attempts.lock().unwrap() += 1;
        Err(io::Error::new(io::ErrorKind::NotFound, "no browser available"))
    }
}

/// Port that was free a moment ago.
pub fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .expect("local addr")
        .port()
}

pub fn credential(access: &str, refresh: Option<&str>, expires_in: Duration) -> Credential {
    Credential {
        access_token: access.to_string(),
        refresh_token: refresh.map(String::from),
        expires_at: Utc::now() + expires_in,
        scopes: vec!["openid".to_string(), "profile".to_string()],
    }
}

pub fn token_response(access: &str, refresh: Option<&str>, expires_in: i64) -> TokenResponse {
    TokenResponse {
        access_token: access.to_string(),
        refresh_token: refresh.map(String::from),
        expires_in,
        scope: "openid profile email".to_string(),
        expiry_time: None,
    }
}

pub fn device_authorization(expires_in: u64, interval: u64) -> DeviceAuthorization {
    DeviceAuthorization {
        device_code: "device-code-1".to_string(),
        user_code: "WDJB-MJHT".to_string(),
        verification_uri: "https://auth.example.org/device".to_string(),
        verification_uri_complete: Some(
            "https://auth.example.org/device?user_code=WDJB-MJHT".to_string(),
        ),
        expires_in,
        interval,
    }
}
