use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use super::client::{AuthClient, DeviceAuthorization, DevicePoll, Introspection};
use super::error::AuthError;
use super::token::TokenResponse;
use crate::config::AuthConfig;

const AUTHORIZE_PATH: &str = "/v2/oauth2/authorize";
const TOKEN_PATH: &str = "/v2/oauth2/token";
const DEVICE_AUTHORIZATION_PATH: &str = "/v2/oauth2/device_authorization";
const REVOKE_PATH: &str = "/v2/oauth2/token/revoke";
const INTROSPECT_PATH: &str = "/v2/oauth2/token/introspect";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// reqwest-backed [`AuthClient`] for a standard OAuth2 authorization server.
///
/// # Example
/// ```no_run
/// use gauth::auth::HttpAuthClient;
/// use gauth::config::{AuthConfig, ConfigOverrides};
///
/// let config = AuthConfig::from_env(ConfigOverrides::default())?;
/// let client = HttpAuthClient::new(&config)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct HttpAuthClient {
    client: reqwest::Client,
    client_id: String,
    client_secret: Option<String>,
    base_url: String,
    redirect_uri: String,
}

impl HttpAuthClient {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("gauth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            base_url: config.auth_url.clone(),
            redirect_uri: config.redirect_uri(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    /// Form POST carrying client authentication: HTTP basic for confidential
    /// clients, `client_id` in the body for native apps.
    fn form_post(&self, path: &str, form: &[(&str, &str)]) -> RequestBuilder {
        let mut fields: Vec<(&str, &str)> = form.to_vec();
        let request = self
            .client
            .post(self.endpoint(path))
            .header("Accept", "application/json");
        let request = match self.client_secret.as_deref() {
            Some(secret) => request.basic_auth(&self.client_id, Some(secret)),
            None => {
                fields.push(("client_id", self.client_id.as_str()));
                request
            }
        };
        request.form(&fields)
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        let resp = self.form_post(TOKEN_PATH, form).send().await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        parse_json(resp).await
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    fn build_authorization_url(
        &self,
        state: &str,
        scopes: &[String],
    ) -> Result<String, AuthError> {
        let scope = scopes.join(" ");
        let url = url::Url::parse_with_params(
            &self.endpoint(AUTHORIZE_PATH),
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("state", state),
                ("access_type", "offline"),
            ],
        )?;
        Ok(url.to_string())
    }

    async fn exchange_authorization_code(&self, code: &str) -> Result<TokenResponse, AuthError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    async fn request_device_code(
        &self,
        scopes: &[String],
    ) -> Result<DeviceAuthorization, AuthError> {
        let scope = scopes.join(" ");
        let resp = self
            .form_post(DEVICE_AUTHORIZATION_PATH, &[("scope", scope.as_str())])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        parse_json(resp).await
    }

    async fn poll_device_code(&self, device_code: &str) -> Result<DevicePoll, AuthError> {
        let resp = self
            .form_post(
                TOKEN_PATH,
                &[("grant_type", DEVICE_GRANT_TYPE), ("device_code", device_code)],
            )
            .send()
            .await?;
        if resp.status().is_success() {
            return Ok(DevicePoll::Authorized(parse_json(resp).await?));
        }
        match provider_error(resp).await {
            AuthError::Provider { error, .. } if error == "authorization_pending" => {
                Ok(DevicePoll::Pending)
            }
            AuthError::Provider { error, .. } if error == "slow_down" => Ok(DevicePoll::SlowDown),
            AuthError::Provider { error, .. } if error == "access_denied" => Ok(DevicePoll::Denied),
            AuthError::Provider { error, .. } if error == "expired_token" => Ok(DevicePoll::Expired),
            other => Err(other),
        }
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AuthError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let resp = self.form_post(REVOKE_PATH, &[("token", token)]).send().await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        Ok(())
    }

    async fn introspect_token(&self, access_token: &str) -> Result<Introspection, AuthError> {
        let resp = self
            .form_post(
                INTROSPECT_PATH,
                &[("token", access_token), ("include", "identity_set")],
            )
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(provider_error(resp).await);
        }
        parse_json(resp).await
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    error_description: Option<String>,
}

async fn provider_error(resp: Response) -> AuthError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<OAuthErrorBody>(&body) {
        Ok(parsed) => AuthError::Provider {
            status: status.as_u16(),
            error: parsed.error,
            description: parsed.error_description,
        },
        Err(_) => AuthError::Provider {
            status: status.as_u16(),
            error: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            description: (!body.trim().is_empty()).then(|| body.trim().to_string()),
        },
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T, AuthError> {
    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|err| AuthError::InvalidResponse(err.to_string()))
}
