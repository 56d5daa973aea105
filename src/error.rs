//! Error types for Finite State API operations.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single entry from the `errors` array of a GraphQL response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQlErrorDetail {
    /// Human-readable error message.
    pub message: String,

    /// Path to the response field that failed, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<serde_json::Value>>,

    /// Server-specific extension data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// Errors that can occur during Finite State API operations.
#[derive(Debug, Error)]
pub enum FiniteStateError {
    /// Configuration is missing or incomplete.
    #[error("Finite State configuration required: {0}")]
    ConfigMissing(String),

    /// Caller input was rejected before any request was made.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Entity not found.
    #[error("{entity_type} '{id}' not found")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The server answered with a non-200 HTTP status.
    #[error("HTTP {status_code}: {body}")]
    Transport { status_code: u16, body: String },

    /// The HTTP exchange succeeded but the query reported errors.
    #[error("GraphQL error: {}", format_graphql_errors(.errors))]
    GraphQl { errors: Vec<GraphQlErrorDetail> },

    /// An expected response field was absent or had the wrong shape.
    #[error("Unexpected response shape: {0}")]
    Schema(String),

    /// An export job could not be started.
    #[error("Export launch failed: {0}")]
    ExportLaunch(String),

    /// The server reported a terminal failure for an export job.
    #[error("Export job {export_job_id} ended with status {status}")]
    ExportFailed {
        export_job_id: String,
        status: String,
    },

    /// An export job did not complete within the polling budget.
    #[error("Export job {export_job_id} not complete after {attempts} polls ({elapsed:?})")]
    ExportTimeout {
        export_job_id: String,
        attempts: u32,
        elapsed: Duration,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    /// Local file I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FiniteStateError {
    /// Whether resending the same request could plausibly succeed.
    ///
    /// Server errors, rate limiting and connection failures qualify.
    /// GraphQL-level errors never do: the server processed the request.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status_code, .. } => *status_code >= 500 || *status_code == 429,
            Self::HttpError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Shorthand for a validation failure.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a schema failure.
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }
}

fn format_graphql_errors(errors: &[GraphQlErrorDetail]) -> String {
    if errors.is_empty() {
        return "unknown error".to_string();
    }
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for Finite State operations.
pub type Result<T> = core::result::Result<T, FiniteStateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_retryable_classification() {
        let server = FiniteStateError::Transport {
            status_code: 503,
            body: "unavailable".to_string(),
        };
        assert!(server.is_retryable());

        let throttled = FiniteStateError::Transport {
            status_code: 429,
            body: String::new(),
        };
        assert!(throttled.is_retryable());

        let client = FiniteStateError::Transport {
            status_code: 400,
            body: "bad request".to_string(),
        };
        assert!(!client.is_retryable());
    }

    #[test]
    fn test_graphql_error_is_never_retryable() {
        let err = FiniteStateError::GraphQl {
            errors: vec![GraphQlErrorDetail {
                message: "Cannot query field".to_string(),
                path: None,
                extensions: None,
            }],
        };
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "GraphQL error: Cannot query field");
    }

    #[test]
    fn test_graphql_error_joins_messages() {
        let err = FiniteStateError::GraphQl {
            errors: vec![
                GraphQlErrorDetail {
                    message: "first".to_string(),
                    path: None,
                    extensions: None,
                },
                GraphQlErrorDetail {
                    message: "second".to_string(),
                    path: None,
                    extensions: None,
                },
            ],
        };
        assert_eq!(err.to_string(), "GraphQL error: first; second");
    }
}
