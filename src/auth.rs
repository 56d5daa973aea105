//! OAuth2 client-credentials authentication.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::FiniteStateClient;
use crate::config::ClientConfig;
use crate::error::{FiniteStateError, Result};

/// Something that can mint a fresh API token.
///
/// The token cache is written against this trait so that it never needs
/// to know how a token is obtained.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Request a new bearer token.
    async fn fetch_token(&self) -> Result<String>;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
    grant_type: &'static str,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Token endpoint client for a given set of credentials.
#[derive(Clone)]
pub struct AuthClient {
    http: Client,
    config: ClientConfig,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("token_url", &self.config.token_url)
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Create a token client for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(FiniteStateError::HttpError)?;
        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// Perform the client-credentials grant.
    ///
    /// # Errors
    ///
    /// * [`FiniteStateError::Transport`] if the endpoint answers non-200
    /// * [`FiniteStateError::Schema`] if the body has no `access_token`
    #[tracing::instrument(skip(self), fields(client_id = %self.config.client_id))]
    pub async fn request_token(&self) -> Result<String> {
        let body = TokenRequest {
            client_id: &self.config.client_id,
            client_secret: &self.config.client_secret,
            audience: &self.config.audience,
            grant_type: "client_credentials",
        };

        let response = self
            .http
            .post(&self.config.token_url)
            .json(&body)
            .send()
            .await
            .map_err(FiniteStateError::HttpError)?;

        let response = FiniteStateClient::check_response(response).await?;
        let token: TokenResponse = response.json().await.map_err(FiniteStateError::HttpError)?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| FiniteStateError::schema("token response has no access_token"))
    }
}

#[async_trait]
impl TokenSource for AuthClient {
    async fn fetch_token(&self) -> Result<String> {
        self.request_token().await
    }
}

/// Obtain an auth token for the configured credentials.
///
/// # Errors
///
/// See [`AuthClient::request_token`].
pub async fn get_auth_token(config: &ClientConfig) -> Result<String> {
    AuthClient::new(config)?.request_token().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_request_shape() {
        let body = TokenRequest {
            client_id: "id",
            client_secret: "secret",
            audience: "aud",
            grant_type: "client_credentials",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "client_id": "id",
                "client_secret": "secret",
                "audience": "aud",
                "grant_type": "client_credentials"
            })
        );
    }

    #[test]
    fn test_auth_client_debug_hides_secret() {
        let config = ClientConfig::new("id", "hidden-secret", "ctx");
        let client = AuthClient::new(&config).unwrap();
        assert!(!format!("{:?}", client).contains("hidden-secret"));
    }
}
