//! Finite State API client.
//!
//! Low-level HTTP transport that handles authentication headers, GraphQL
//! envelopes and presigned object-storage URLs. Higher-level operations are
//! implemented via traits on entity types and in the export/upload modules.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::{ClientConfig, DEFAULT_API_URL};
use crate::error::{FiniteStateError, Result};
use crate::graphql::{GraphQlRequest, GraphQlResponse};
use crate::retry::RetryPolicy;

const USER_AGENT: &str = concat!("finitestate/", env!("CARGO_PKG_VERSION"));

/// Low-level Finite State API client.
///
/// Every GraphQL call carries `Authorization: Bearer <token>` and
/// `Organization-Context: <context>`. Entity-specific operations are
/// implemented via the `Get`, `List` and `Create` traits on model types.
///
/// This struct is cheaply cloneable; clones reference the same underlying
/// connection pool.
///
/// # Example
///
/// ```no_run
/// use finitestate::{ClientConfig, FiniteStateClient};
///
/// # async fn example() -> finitestate::Result<()> {
/// let config = ClientConfig::from_env()?;
/// let token = finitestate::get_auth_token(&config).await?;
/// let client = FiniteStateClient::from_config(&config, &token)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FiniteStateClient {
    http: Client,
    api_url: Arc<Url>,
    token: String,
    organization_context: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for FiniteStateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiniteStateClient")
            .field("api_url", &self.api_url.as_str())
            .field("organization_context", &self.organization_context)
            .finish_non_exhaustive()
    }
}

impl FiniteStateClient {
    /// Create a client for the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: &str, organization_context: &str) -> Result<Self> {
        Self::with_api_url(token, organization_context, DEFAULT_API_URL)
    }

    /// Create a client from a configuration and an already-issued token.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured API URL is invalid.
    pub fn from_config(config: &ClientConfig, token: &str) -> Result<Self> {
        Self::with_api_url(token, &config.organization_context, &config.api_url)
    }

    /// Create a client against an explicit GraphQL endpoint.
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token, without the `Bearer ` prefix
    /// * `organization_context` - Tenant identifier
    /// * `api_url` - Full URL of the GraphQL endpoint
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn with_api_url(token: &str, organization_context: &str, api_url: &str) -> Result<Self> {
        let api_url = Url::parse(api_url)?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(FiniteStateError::HttpError)?;

        Ok(Self {
            http,
            api_url: Arc::new(api_url),
            token: token.to_string(),
            organization_context: organization_context.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy used for queries.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the GraphQL endpoint URL.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Get the organization context sent with every call.
    pub fn organization_context(&self) -> &str {
        &self.organization_context
    }

    /// Send a GraphQL request and return its `data` object.
    ///
    /// Queries are retried per the client's [`RetryPolicy`] when the
    /// failure is retryable. Mutations are sent exactly once.
    ///
    /// # Errors
    ///
    /// * [`FiniteStateError::Transport`] for a non-200 status
    /// * [`FiniteStateError::GraphQl`] when the body carries `errors`
    /// * [`FiniteStateError::Schema`] when the body has no `data` object
    #[tracing::instrument(skip(self, request), fields(mutation = request.is_mutation()))]
    pub async fn send_graphql(&self, request: &GraphQlRequest) -> Result<Value> {
        let retries = if request.is_mutation() {
            0
        } else {
            self.retry.max_retries
        };

        let mut attempt = 0u8;
        loop {
            match self.post_graphql(request).await {
                Err(e) if attempt < retries && e.is_retryable() => {
                    let wait = self.retry.backoff(attempt);
                    tracing::warn!("{e} - retrying after {wait:?}");
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Send a GraphQL request and decode its `data` object into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`send_graphql`](Self::send_graphql), plus
    /// [`FiniteStateError::Schema`] when `data` does not match `T`.
    pub async fn query<T: DeserializeOwned>(&self, request: &GraphQlRequest) -> Result<T> {
        let data = self.send_graphql(request).await?;
        serde_json::from_value(data)
            .map_err(|e| FiniteStateError::schema(format!("response data did not decode: {e}")))
    }

    /// Upload bytes to a presigned URL with `PUT`.
    ///
    /// Presigned URLs carry their own authorization, so no API headers are
    /// attached.
    #[tracing::instrument(skip(self, url, body), fields(bytes = body.len()))]
    pub async fn put_presigned(&self, url: &str, body: Vec<u8>) -> Result<Response> {
        let response = self
            .http
            .put(url)
            .body(body)
            .send()
            .await
            .map_err(FiniteStateError::HttpError)?;

        Self::check_response(response).await
    }

    /// Fetch the contents of a presigned download URL.
    #[tracing::instrument(skip(self, url))]
    pub async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(FiniteStateError::HttpError)?;

        let response = Self::check_response(response).await?;
        let bytes = response.bytes().await.map_err(FiniteStateError::HttpError)?;
        Ok(bytes.to_vec())
    }

    /// Single POST of a GraphQL envelope, without retries.
    async fn post_graphql(&self, request: &GraphQlRequest) -> Result<Value> {
        let response = self
            .http
            .post(self.api_url.as_str())
            .bearer_auth(&self.token)
            .header("Organization-Context", &self.organization_context)
            .json(request)
            .send()
            .await
            .map_err(FiniteStateError::HttpError)?;

        let response = Self::check_response(response).await?;
        let envelope: GraphQlResponse = response.json().await.map_err(FiniteStateError::HttpError)?;

        if let Some(errors) = envelope.errors {
            return Err(FiniteStateError::GraphQl { errors });
        }

        match envelope.data {
            Some(data @ Value::Object(_)) => Ok(data),
            _ => Err(FiniteStateError::schema("response has no data object")),
        }
    }

    /// Check response status and convert errors.
    ///
    /// Anything other than 200 is a failure, matching the platform's
    /// contract for both the GraphQL endpoint and presigned URLs.
    pub(crate) async fn check_response(response: Response) -> Result<Response> {
        let status = response.status();

        if status == StatusCode::OK {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(_) => format!("HTTP {status}"),
        };

        Err(FiniteStateError::Transport {
            status_code: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_debug() {
        let client = FiniteStateClient::new("test-token", "org-ctx").unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("FiniteStateClient"));
        assert!(debug.contains("api_url"));
        assert!(debug.contains("org-ctx"));
        // Token should not be in debug output
        assert!(!debug.contains("test-token"));
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let result = FiniteStateClient::with_api_url("token", "ctx", "not a url");
        assert!(matches!(result, Err(FiniteStateError::UrlError(_))));
    }

    #[test]
    fn test_from_config_uses_configured_endpoint() {
        let config = ClientConfig::new("id", "secret", "ctx").with_base_url("http://localhost:1234/api/v1");
        let client = FiniteStateClient::from_config(&config, "token").unwrap();
        assert_eq!(client.api_url().as_str(), "http://localhost:1234/api/v1/graphql");
        assert_eq!(client.organization_context(), "ctx");
    }
}
