//! Finite State API client library.
//!
//! A Rust library for the Finite State platform's GraphQL API. Entity
//! operations are traits (Get, List, Create) that entity types implement;
//! the long-running parts of the API (exports, uploads) are plain async
//! functions built on the same client.
//!
//! # Quick Start
//!
//! ```no_run
//! use finitestate::{
//!     AuthClient, ClientConfig, FindingQuery, FiniteStateClient, Get, List, Asset, TokenCache,
//! };
//!
//! #[tokio::main]
//! async fn main() -> finitestate::Result<()> {
//!     // Credentials come from CLIENT_ID, CLIENT_SECRET and ORGANIZATION_CONTEXT
//!     let config = ClientConfig::from_env()?;
//!
//!     // Reuse a cached token while it is fresh
//!     let mut cache = TokenCache::new(&config.organization_context, Some(&config.client_id));
//!     let token = cache.get_token(&AuthClient::new(&config)?).await?;
//!     let client = FiniteStateClient::from_config(&config, &token)?;
//!
//!     // Get an asset by ID
//!     let asset = Asset::get(&client, "asset-id").await?;
//!     println!("Asset: {}", asset.name);
//!
//!     // List all assets, following cursors until the last page
//!     let assets = Asset::list_all(&client, &Default::default()).await?;
//!     println!("Found {} assets", assets.len());
//!
//!     // Fetch at most 50 findings for one asset version
//!     let query = FindingQuery {
//!         asset_version_id: Some("asset-version-id".into()),
//!         limit: Some(50),
//!         ..Default::default()
//!     };
//!     let findings = finitestate::get_findings(&client, &query).await?;
//!     println!("Found {} findings", findings.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`FiniteStateClient`] sends GraphQL documents with the auth and
//!   organization headers and retries failed queries (never mutations).
//! - [`get_all_paginated_results`] follows `_cursor` pagination.
//! - [`ExportJob::wait_for_download`] polls an export job under a
//!   [`PollPolicy`].
//! - [`UploadSession`] drives a chunked multipart upload.
//! - [`TokenCache`] keeps a token on disk for up to 24 hours.
//!
//! # Configuration
//!
//! [`ClientConfig::from_env`] reads:
//!
//! - `CLIENT_ID`, `CLIENT_SECRET`, `ORGANIZATION_CONTEXT` (required)
//! - `FINITE_STATE_API_URL`, `FINITE_STATE_TOKEN_URL`,
//!   `FINITE_STATE_AUDIENCE` (optional, default to production)

mod auth;
mod client;
mod config;
mod error;
mod export;
mod graphql;
mod models;
mod pagination;
mod retry;
mod token_cache;
mod traits;
mod upload;
mod workflow;

pub mod cli;
pub mod output;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use auth::{get_auth_token, AuthClient, TokenSource};
pub use client::FiniteStateClient;
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_AUDIENCE, DEFAULT_TOKEN_URL};
pub use error::{FiniteStateError, GraphQlErrorDetail, Result};
pub use graphql::{is_mutation, GraphQlRequest};
pub use pagination::{
    get_all_paginated_results, paginate, Page, CURSOR_FIELD, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use retry::{RetryPolicy, MAX_BACKOFF};
pub use token_cache::{TokenCache, DEFAULT_CACHE_ROOT, TOKEN_MAX_AGE};

// Re-export traits
pub use traits::{Create, Get, List};

// Re-export models
pub use models::*;

// Exports and downloads
pub use export::{
    download_asset_version_report, download_product_report, download_sbom, download_to_file,
    export_job_id_from, generate_download_url, generate_report_download_url,
    generate_sbom_download_url, launch_export, CompletedExport, ExportJob, ExportKind,
    ExportLaunch, ExportStatus, PollPolicy, ReportSubtype, ReportTarget, ReportType, SbomSubtype,
    SbomType,
};

// Uploads
pub use upload::{
    launch_binary_upload_processing, read_chunk, upload_file_for_binary_analysis,
    upload_test_results_file, ChunkSize, CompletedPart, UploadSession, DEFAULT_CHUNK_SIZE,
    MAX_CHUNK_SIZE, MIN_CHUNK_SIZE,
};
pub use workflow::{
    create_new_asset_version_and_upload_binary, create_new_asset_version_and_upload_test_results,
    create_new_asset_version_artifact_and_test_for_upload, NewAssetVersion,
};

pub use output::PrettyPrint;
