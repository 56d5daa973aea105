//! Trait definitions for Finite State entity operations.
//!
//! Each entity type implements the traits it supports, encapsulating
//! the GraphQL documents and variables in the implementations.

mod create;
mod get;
mod list;

pub use create::Create;
pub(crate) use create::require;
pub use get::Get;
pub use list::List;
