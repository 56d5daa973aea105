//! Token endpoint handler.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;

/// Body of a client-credentials grant.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub grant_type: Option<String>,
}

/// POST /api/v1/auth/token
///
/// Issues `mock-token-<client_id>` for any non-empty credentials.
pub async fn issue_token(Json(request): Json<TokenRequest>) -> impl IntoResponse {
    if request.grant_type.as_deref() != Some("client_credentials") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "unsupported_grant_type"})),
        );
    }
    if request.client_id.is_empty() || request.client_secret.is_empty() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "access_denied"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "access_token": format!("mock-token-{}", request.client_id),
            "token_type": "Bearer",
            "expires_in": 86400,
        })),
    )
}
