//! Multipart and single-part upload tests.

use std::io::Write;

use finitestate::{
    upload_file_for_binary_analysis, upload_test_results_file, FiniteStateClient,
    FiniteStateError, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> FiniteStateClient {
    FiniteStateClient::with_api_url("token", "org", &format!("{}/graphql", server.uri())).unwrap()
}

fn data(field: &str, value: Value) -> ResponseTemplate {
    let mut data = Map::new();
    data.insert(field.to_string(), value);
    ResponseTemplate::new(200).set_body_json(json!({ "data": data }))
}

/// A temp file of `len` bytes where every byte encodes its MiB index.
fn binary_file(len: usize) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let bytes: Vec<u8> = (0..len).map(|i| (i / (1024 * 1024)) as u8).collect();
    file.write_all(&bytes).unwrap();
    file.flush().unwrap();
    file
}

// =============================================================================
// Multipart binary upload
// =============================================================================

#[tokio::test]
async fn test_binary_upload_sends_ordered_parts() {
    let server = MockServer::start().await;
    let chunk = MIN_CHUNK_SIZE as usize;
    let file = binary_file(2 * chunk + 1024);

    Mock::given(method("POST"))
        .and(body_string_contains("startMultipartUploadV2"))
        .and(body_partial_json(json!({"variables": {"testId": "test-1"}})))
        .respond_with(data(
            "startMultipartUploadV2",
            json!({"uploadId": "up-1", "key": "uploads/test-1/up-1"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    for part in 1..=3u32 {
        Mock::given(method("POST"))
            .and(body_string_contains("generateUploadPartUrlV2"))
            .and(body_partial_json(json!({
                "variables": {"partNumber": part, "uploadId": "up-1", "uploadKey": "uploads/test-1/up-1"}
            })))
            .respond_with(data(
                "generateUploadPartUrlV2",
                json!({"key": "uploads/test-1/up-1", "uploadUrl": format!("{}/parts/{part}", server.uri())}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("/parts/{part}")))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", format!("\"etag-{part}\"")))
            .expect(1)
            .mount(&server)
            .await;
    }

    Mock::given(method("POST"))
        .and(body_string_contains("completeMultipartUploadV2"))
        .and(body_partial_json(json!({
            "variables": {"partData": [
                {"ETag": "\"etag-1\"", "PartNumber": 1},
                {"ETag": "\"etag-2\"", "PartNumber": 2},
                {"ETag": "\"etag-3\"", "PartNumber": 3}
            ]}
        })))
        .respond_with(data("completeMultipartUploadV2", json!({"key": "uploads/test-1/up-1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("launchBinaryUploadProcessing"))
        .and(body_partial_json(json!({
            "variables": {"key": "uploads/test-1/up-1", "testId": "test-1", "configurationOptions": ["QUICK_SCAN"]}
        })))
        .respond_with(data("launchBinaryUploadProcessing", json!({"key": "uploads/test-1/up-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let key = upload_file_for_binary_analysis(&client, "test-1", file.path(), MIN_CHUNK_SIZE, true)
        .await
        .unwrap();
    assert_eq!(key, "uploads/test-1/up-1");

    let puts: Vec<_> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "PUT")
        .collect();
    let sizes: Vec<usize> = puts.iter().map(|r| r.body.len()).collect();
    assert_eq!(sizes, [chunk, chunk, 1024]);
    assert_eq!(puts[1].body[0], 5);
    assert_eq!(puts[2].body[0], 10);
}

#[tokio::test]
async fn test_missing_etag_aborts_upload() {
    let server = MockServer::start().await;
    let file = binary_file(1024);

    Mock::given(method("POST"))
        .and(body_string_contains("startMultipartUploadV2"))
        .respond_with(data("startMultipartUploadV2", json!({"uploadId": "up-1", "key": "k"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("generateUploadPartUrlV2"))
        .respond_with(data(
            "generateUploadPartUrlV2",
            json!({"key": "k", "uploadUrl": format!("{}/parts/1", server.uri())}),
        ))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("completeMultipartUploadV2"))
        .respond_with(data("completeMultipartUploadV2", json!({"key": "k"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = upload_file_for_binary_analysis(&client, "test-1", file.path(), MIN_CHUNK_SIZE, false)
        .await
        .unwrap_err();

    assert!(matches!(err, FiniteStateError::Schema(_)));
}

#[tokio::test]
async fn test_invalid_chunk_size_makes_no_request() {
    let server = MockServer::start().await;
    let file = binary_file(16);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    for chunk_size in [MIN_CHUNK_SIZE - 1, MAX_CHUNK_SIZE] {
        let err = upload_file_for_binary_analysis(&client, "test-1", file.path(), chunk_size, false)
            .await
            .unwrap_err();
        assert!(matches!(err, FiniteStateError::Validation(_)));
    }

    let err = upload_file_for_binary_analysis(&client, "", file.path(), MIN_CHUNK_SIZE, false)
        .await
        .unwrap_err();
    assert!(matches!(err, FiniteStateError::Validation(_)));
}

#[tokio::test]
async fn test_missing_file_is_io_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = upload_file_for_binary_analysis(
        &client,
        "test-1",
        dir.path().join("missing.bin"),
        MIN_CHUNK_SIZE,
        false,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FiniteStateError::Io(_)));
}

// =============================================================================
// Single-part test results upload
// =============================================================================

#[tokio::test]
async fn test_results_upload_puts_whole_file() {
    let server = MockServer::start().await;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"bomFormat":"CycloneDX"}"#).unwrap();

    Mock::given(method("POST"))
        .and(body_string_contains("generateSinglePartUploadUrl"))
        .and(body_partial_json(json!({"variables": {"testId": "test-2"}})))
        .respond_with(data(
            "generateSinglePartUploadUrl",
            json!({"key": "results/test-2", "uploadUrl": format!("{}/single", server.uri())}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/single"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("launchTestResultProcessing"))
        .and(body_partial_json(json!({"variables": {"key": "results/test-2", "testId": "test-2"}})))
        .respond_with(data("launchTestResultProcessing", json!({"key": "results/test-2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let key = upload_test_results_file(&client, "test-2", file.path()).await.unwrap();

    assert_eq!(key, "results/test-2");
    let put = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "PUT")
        .unwrap();
    assert_eq!(put.body, br#"{"bomFormat":"CycloneDX"}"#);
}
