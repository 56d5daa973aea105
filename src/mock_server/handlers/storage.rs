//! Presigned object-storage handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

/// PUT /upload/{upload_id}/{part_number}
///
/// Stores one multipart chunk and answers with its `ETag`.
pub async fn put_part(
    State(state): State<Arc<RwLock<MockState>>>,
    Path((upload_id, part_number)): Path<(String, u32)>,
    body: Bytes,
) -> impl IntoResponse {
    let mut state = state.write().await;

    let Some(upload) = state.uploads.get_mut(&upload_id) else {
        return (StatusCode::NOT_FOUND, [(header::ETAG, String::new())]).into_response();
    };
    let etag = format!("\"{upload_id}-{part_number}-{}\"", body.len());
    upload.parts.insert(part_number, body.to_vec());

    (StatusCode::OK, [(header::ETAG, etag)]).into_response()
}

/// PUT /upload/single/{key}
pub async fn put_object(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(key): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    let mut state = state.write().await;
    state.objects.insert(key, body.to_vec());
    StatusCode::OK
}

/// GET /download/{export_id}
///
/// Serves the finished export. Unknown or unfinished jobs are 404.
pub async fn download_export(
    State(state): State<Arc<RwLock<MockState>>>,
    Path(export_id): Path<String>,
) -> impl IntoResponse {
    let state = state.read().await;

    match state.exports.get(&export_id) {
        Some(export) if export.polls > state.polls_until_ready => {
            let body = match export.kind.as_str() {
                "launchCycloneDxExport" => r#"{"bomFormat":"CycloneDX","specVersion":"1.5","components":[]}"#.to_string(),
                "launchSpdxExport" => r#"{"spdxVersion":"SPDX-2.3","packages":[]}"#.to_string(),
                kind if kind.contains("CSV") => "id,title,severity\nf-1,CVE-2024-1,CRITICAL\n".to_string(),
                _ => "%PDF-1.7 mock report".to_string(),
            };
            (StatusCode::OK, body).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "export not ready").into_response(),
    }
}
