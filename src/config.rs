//! Client configuration.
//!
//! Configuration is built once at the start of an entry point and passed
//! down explicitly. Nothing in the library reads the environment on its own.

use std::env;

use crate::error::{FiniteStateError, Result};

/// Production GraphQL endpoint.
pub const DEFAULT_API_URL: &str = "https://platform.finitestate.io/api/v1/graphql";

/// Production OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "https://platform.finitestate.io/api/v1/auth/token";

/// Audience requested in the client-credentials grant.
pub const DEFAULT_AUDIENCE: &str = "https://platform.finitestate.io/api/v1/graphql";

/// Credentials and endpoints for talking to the Finite State platform.
#[derive(Clone)]
pub struct ClientConfig {
    /// OAuth2 client ID.
    pub client_id: String,
    /// OAuth2 client secret.
    pub client_secret: String,
    /// Tenant identifier sent as `Organization-Context` on every call.
    pub organization_context: String,
    /// GraphQL endpoint.
    pub api_url: String,
    /// Token endpoint.
    pub token_url: String,
    /// Token audience.
    pub audience: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("organization_context", &self.organization_context)
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// Create a configuration pointing at the production endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        organization_context: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            organization_context: organization_context.into(),
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }

    /// Read configuration from environment variables.
    ///
    /// Requires `CLIENT_ID`, `CLIENT_SECRET` and `ORGANIZATION_CONTEXT`.
    /// `FINITE_STATE_API_URL`, `FINITE_STATE_TOKEN_URL` and
    /// `FINITE_STATE_AUDIENCE` override the production defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::ConfigMissing`] naming the first
    /// required variable that is unset or empty.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            required_var("CLIENT_ID")?,
            required_var("CLIENT_SECRET")?,
            required_var("ORGANIZATION_CONTEXT")?,
        );

        if let Ok(url) = env::var("FINITE_STATE_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = env::var("FINITE_STATE_TOKEN_URL") {
            config.token_url = url;
        }
        if let Ok(audience) = env::var("FINITE_STATE_AUDIENCE") {
            config.audience = audience;
        }

        Ok(config)
    }

    /// Point both the GraphQL and token endpoints at a different host.
    ///
    /// `base_url` is the API root, e.g. `http://127.0.0.1:8080/api/v1`.
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.api_url = format!("{base}/graphql");
        self.token_url = format!("{base}/auth/token");
        self
    }
}

fn required_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(FiniteStateError::ConfigMissing(format!(
            "{name} environment variable not set"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_hides_secret() {
        let config = ClientConfig::new("client", "super-secret", "org-ctx");
        let debug = format!("{:?}", config);
        assert!(debug.contains("client"));
        assert!(debug.contains("org-ctx"));
        assert!(!debug.contains("super-secret"));
    }

    #[test]
    fn test_with_base_url_sets_both_endpoints() {
        let config =
            ClientConfig::new("id", "secret", "ctx").with_base_url("http://localhost:9000/api/v1/");
        assert_eq!(config.api_url, "http://localhost:9000/api/v1/graphql");
        assert_eq!(config.token_url, "http://localhost:9000/api/v1/auth/token");
        assert_eq!(config.audience, DEFAULT_AUDIENCE);
    }
}
