//! Finite State platform model types.

pub(crate) mod common;

mod artifact;
mod asset;
mod asset_version;
mod component;
mod finding;
mod organization;
mod product;
mod test;

pub use artifact::*;
pub use asset::*;
pub use asset_version::*;
pub use common::{Context, EntityRef, UserRef};
pub use component::*;
pub use finding::*;
pub use organization::*;
pub use product::*;
pub use test::*;
