//! HTTP request handlers for the mock server.

pub mod auth;
pub mod graphql;
pub mod storage;

pub use auth::*;
pub use graphql::*;
pub use storage::*;
