//! Mock Finite State API server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates the
//! Finite State API for integration and end-to-end testing. Unlike wiremock
//! which mocks at the HTTP level per-test, this server maintains state
//! across requests: created entities can be listed, export jobs progress
//! from `RUNNING` to `COMPLETED`, and uploaded parts are joined on
//! completion.
//!
//! # Example
//!
//! ```ignore
//! use finitestate::mock_server::MockServer;
//! use finitestate::{Asset, FiniteStateClient, Get};
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = FiniteStateClient::with_api_url("token", "org", &server.graphql_url()).unwrap();
//!
//!     // Server comes with default fixtures
//!     let asset = Asset::get(&client, "a-1").await.unwrap();
//!     assert_eq!(asset.name, "Router");
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::Fixtures;
pub use server::MockServer;
pub use state::{MockExport, MockState, MockUpload};
