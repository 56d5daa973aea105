//! File uploads for analysis.
//!
//! Binaries go through a multipart session: start, then one presigned
//! `PUT` per chunk, then complete with the ordered part ETags, then launch
//! processing. Test result files (SBOMs, scanner output) go through a
//! single presigned `PUT`.
//!
//! Every step is sequential and any failure aborts the whole upload. There
//! is no resume.

use std::path::Path;

use reqwest::header::ETAG;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::graphql::GraphQlRequest;

const MIB: u64 = 1024 * 1024;

/// Smallest accepted chunk size (5 MiB).
pub const MIN_CHUNK_SIZE: u64 = 5 * MIB;

/// Chunk sizes must be strictly below this (2 GiB).
pub const MAX_CHUNK_SIZE: u64 = 2048 * MIB;

/// Default chunk size (1000 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 1000 * MIB;

const START_MULTIPART: &str = r#"
mutation Start($testId: ID!) {
    startMultipartUploadV2(testId: $testId) {
        uploadId
        key
    }
}
"#;

const GENERATE_PART_URL: &str = r#"
mutation GenerateUploadPartUrl($partNumber: Int!, $uploadId: ID!, $uploadKey: String!) {
    generateUploadPartUrlV2(partNumber: $partNumber, uploadId: $uploadId, uploadKey: $uploadKey) {
        key
        uploadUrl
    }
}
"#;

const COMPLETE_MULTIPART: &str = r#"
mutation CompleteMultipartUpload($partData: [PartInput!]!, $uploadId: ID!, $uploadKey: String!) {
    completeMultipartUploadV2(partData: $partData, uploadId: $uploadId, uploadKey: $uploadKey) {
        key
    }
}
"#;

const LAUNCH_BINARY_PROCESSING: &str = r#"
mutation LaunchBinaryUploadProcessing($key: String!, $testId: ID!, $configurationOptions: [BinaryAnalysisConfigurationOption]) {
    launchBinaryUploadProcessing(key: $key, testId: $testId, configurationOptions: $configurationOptions) {
        key
    }
}
"#;

const GENERATE_SINGLE_PART_URL: &str = r#"
mutation GenerateTestResultUploadUrl($testId: ID!) {
    generateSinglePartUploadUrl(testId: $testId) {
        uploadUrl
        key
    }
}
"#;

const LAUNCH_TEST_RESULT_PROCESSING: &str = r#"
mutation CompleteTestResultUpload($key: String!, $testId: ID!) {
    launchTestResultProcessing(key: $key, testId: $testId) {
        key
    }
}
"#;

/// A validated multipart chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSize(u64);

impl ChunkSize {
    /// Accepts sizes in `[5 MiB, 2 GiB)`.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::Validation`] outside that range.
    pub fn new(bytes: u64) -> Result<Self> {
        if bytes < MIN_CHUNK_SIZE {
            return Err(FiniteStateError::validation(format!(
                "chunk size must be at least {MIN_CHUNK_SIZE} bytes"
            )));
        }
        if bytes >= MAX_CHUNK_SIZE {
            return Err(FiniteStateError::validation(format!(
                "chunk size must be less than {MAX_CHUNK_SIZE} bytes"
            )));
        }
        Ok(Self(bytes))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for ChunkSize {
    fn default() -> Self {
        Self(DEFAULT_CHUNK_SIZE)
    }
}

/// One uploaded part, as submitted to the completion mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedPart {
    #[serde(rename = "ETag")]
    pub etag: String,
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    start_multipart_upload_v2: StartedUpload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartedUpload {
    upload_id: String,
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartUrlResponse {
    generate_upload_part_url_v2: UploadUrl,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SinglePartUrlResponse {
    generate_single_part_upload_url: UploadUrl,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrl {
    upload_url: String,
    #[serde(default)]
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeyResult {
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompleteResponse {
    complete_multipart_upload_v2: KeyResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaunchBinaryResponse {
    launch_binary_upload_processing: KeyResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaunchTestResultResponse {
    launch_test_result_processing: KeyResult,
}

/// An open multipart upload.
///
/// Parts are numbered from 1 in the order they are uploaded.
/// [`complete`](Self::complete) consumes the session.
#[derive(Debug)]
pub struct UploadSession {
    upload_id: String,
    upload_key: String,
    parts: Vec<CompletedPart>,
}

impl UploadSession {
    /// Open a multipart upload for a test.
    #[tracing::instrument(skip(client))]
    pub async fn start(client: &FiniteStateClient, test_id: &str) -> Result<Self> {
        let request = GraphQlRequest::new(START_MULTIPART, json!({"testId": test_id}));
        let response: StartResponse = client.query(&request).await?;
        let started = response.start_multipart_upload_v2;

        tracing::debug!("Started multipart upload {}", started.upload_id);
        Ok(Self {
            upload_id: started.upload_id,
            upload_key: started.key,
            parts: Vec::new(),
        })
    }

    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    pub fn upload_key(&self) -> &str {
        &self.upload_key
    }

    /// Parts uploaded so far, in part-number order.
    pub fn parts(&self) -> &[CompletedPart] {
        &self.parts
    }

    /// Upload the next part.
    ///
    /// Requests a presigned URL for the next part number, `PUT`s the bytes
    /// there and records the returned `ETag`.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::Schema`] if the `PUT` response has no
    /// `ETag` header.
    #[tracing::instrument(skip(self, client, chunk), fields(upload_id = %self.upload_id, bytes = chunk.len()))]
    pub async fn upload_part(
        &mut self,
        client: &FiniteStateClient,
        chunk: Vec<u8>,
    ) -> Result<&CompletedPart> {
        let part_number = u32::try_from(self.parts.len() + 1)
            .map_err(|_| FiniteStateError::validation("too many parts"))?;

        let request = GraphQlRequest::new(
            GENERATE_PART_URL,
            json!({
                "partNumber": part_number,
                "uploadId": self.upload_id,
                "uploadKey": self.upload_key,
            }),
        );
        let response: PartUrlResponse = client.query(&request).await?;
        let upload_url = response.generate_upload_part_url_v2.upload_url;

        let put = client.put_presigned(&upload_url, chunk).await?;
        let etag = put
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                FiniteStateError::schema(format!("part {part_number} upload returned no ETag"))
            })?;

        tracing::debug!("Uploaded part {} ({})", part_number, etag);
        self.parts.push(CompletedPart { etag, part_number });
        Ok(&self.parts[self.parts.len() - 1])
    }

    /// Finalize the upload and return the object key.
    #[tracing::instrument(skip(self, client), fields(upload_id = %self.upload_id, parts = self.parts.len()))]
    pub async fn complete(self, client: &FiniteStateClient) -> Result<String> {
        let request = GraphQlRequest::new(
            COMPLETE_MULTIPART,
            json!({
                "partData": self.parts,
                "uploadId": self.upload_id,
                "uploadKey": self.upload_key,
            }),
        );
        let response: CompleteResponse = client.query(&request).await?;
        Ok(response.complete_multipart_upload_v2.key)
    }
}

/// Read up to `limit` bytes, stopping early only at end of input.
///
/// An empty result means the reader is exhausted.
pub async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut R, limit: u64) -> Result<Vec<u8>> {
    let mut chunk = Vec::new();
    (&mut *reader).take(limit).read_to_end(&mut chunk).await?;
    Ok(chunk)
}

/// Start server-side analysis of an uploaded binary.
pub async fn launch_binary_upload_processing(
    client: &FiniteStateClient,
    key: &str,
    test_id: &str,
    quick_scan: bool,
) -> Result<String> {
    let mut variables = json!({"key": key, "testId": test_id});
    if quick_scan {
        variables["configurationOptions"] = json!(["QUICK_SCAN"]);
    }
    let request = GraphQlRequest::new(LAUNCH_BINARY_PROCESSING, variables);
    let response: LaunchBinaryResponse = client.query(&request).await?;
    Ok(response.launch_binary_upload_processing.key)
}

/// Upload a binary for analysis in chunks and launch processing.
///
/// Returns the key reported by the processing launch.
///
/// # Errors
///
/// * [`FiniteStateError::Validation`] for an empty test ID or a chunk size
///   outside `[5 MiB, 2 GiB)`; no request is made
/// * [`FiniteStateError::Io`] if the file cannot be opened or read
/// * any error from a GraphQL call or presigned `PUT`
#[tracing::instrument(skip(client, path), fields(path = %path.as_ref().display()))]
pub async fn upload_file_for_binary_analysis(
    client: &FiniteStateClient,
    test_id: &str,
    path: impl AsRef<Path>,
    chunk_size: u64,
    quick_scan: bool,
) -> Result<String> {
    if test_id.is_empty() {
        return Err(FiniteStateError::validation("test ID is required"));
    }
    let chunk_size = ChunkSize::new(chunk_size)?;
    let mut file = tokio::fs::File::open(path.as_ref()).await?;

    let mut session = UploadSession::start(client, test_id).await?;
    loop {
        let chunk = read_chunk(&mut file, chunk_size.get()).await?;
        if chunk.is_empty() {
            break;
        }
        session.upload_part(client, chunk).await?;
    }

    let parts = session.parts().len();
    let key = session.complete(client).await?;
    tracing::info!("Uploaded {} parts for test {}", parts, test_id);

    launch_binary_upload_processing(client, &key, test_id, quick_scan).await
}

/// Upload a test results file in one part and launch processing.
///
/// Returns the key reported by the processing launch.
///
/// # Errors
///
/// * [`FiniteStateError::Validation`] for an empty test ID
/// * [`FiniteStateError::Io`] if the file cannot be read
/// * any error from a GraphQL call or the presigned `PUT`
#[tracing::instrument(skip(client, path), fields(path = %path.as_ref().display()))]
pub async fn upload_test_results_file(
    client: &FiniteStateClient,
    test_id: &str,
    path: impl AsRef<Path>,
) -> Result<String> {
    if test_id.is_empty() {
        return Err(FiniteStateError::validation("test ID is required"));
    }
    let contents = tokio::fs::read(path.as_ref()).await?;

    let request = GraphQlRequest::new(GENERATE_SINGLE_PART_URL, json!({"testId": test_id}));
    let response: SinglePartUrlResponse = client.query(&request).await?;
    let slot = response.generate_single_part_upload_url;
    let key = slot
        .key
        .ok_or_else(|| FiniteStateError::schema("generateSinglePartUploadUrl.key missing"))?;

    client.put_presigned(&slot.upload_url, contents).await?;

    let request = GraphQlRequest::new(
        LAUNCH_TEST_RESULT_PROCESSING,
        json!({"key": key, "testId": test_id}),
    );
    let response: LaunchTestResultResponse = client.query(&request).await?;
    Ok(response.launch_test_result_processing.key)
}
