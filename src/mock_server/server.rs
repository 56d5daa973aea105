//! Mock Finite State API server.
//!
//! Provides an axum-based HTTP server that simulates the Finite State
//! GraphQL API, its token endpoint and presigned storage URLs.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::Fixtures;
use super::handlers;
use super::state::MockState;
use crate::config::ClientConfig;

/// A mock Finite State API server for testing.
///
/// The server runs in the background and can be used to test the client
/// against a stateful implementation of the API.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_scenario()).await
    }

    /// Start a mock server with empty state.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new()).await
    }

    /// Start a mock server with custom state.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_state(mut state: MockState) -> Self {
        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");
        let url = format!("http://{addr}");

        state.base_url = url.clone();
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url,
            handle,
            state: shared_state,
        }
    }

    /// Get the base URL of the mock server.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The GraphQL endpoint, for building a `FiniteStateClient`.
    pub fn graphql_url(&self) -> String {
        format!("{}/api/v1/graphql", self.url)
    }

    /// A configuration with test credentials pointing at this server.
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new("test-client", "test-secret", "test-org")
            .with_base_url(&format!("{}/api/v1", self.url))
    }

    /// Get access to the server's shared state.
    ///
    /// This allows inspecting or modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the axum router with all routes.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            .route("/api/v1/graphql", post(handlers::graphql))
            .route("/api/v1/auth/token", post(handlers::issue_token))
            // Presigned storage
            .route("/upload/single/:key", put(handlers::put_object))
            .route("/upload/:upload_id/:part_number", put(handlers::put_part))
            .route("/download/:export_id", get(handlers::download_export))
            // Health check
            .route("/health", get(health_check))
            // Multipart chunks are at least 5 MiB.
            .layer(DefaultBodyLimit::disable())
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}
