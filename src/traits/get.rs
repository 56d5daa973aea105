//! Get trait for fetching single entities.

use async_trait::async_trait;

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::traits::List;

/// Fetch a single entity by ID.
///
/// The platform has no per-entity lookup; a get is a list query filtered
/// by ID. Implementors only say how to build that filter.
///
/// # Example
///
/// ```ignore
/// use finitestate::{Asset, Get};
///
/// let asset = Asset::get(&client, "123456789").await?;
/// ```
#[async_trait]
pub trait Get: List {
    /// Entity name used in [`FiniteStateError::NotFound`].
    const ENTITY: &'static str;

    /// A list query that matches only `id`.
    fn by_id(id: &str) -> Self::Query;

    /// Fetch the entity by ID.
    ///
    /// # Errors
    ///
    /// * [`FiniteStateError::Validation`] if `id` is empty
    /// * [`FiniteStateError::NotFound`] if nothing matches
    async fn get(client: &FiniteStateClient, id: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(FiniteStateError::validation(format!(
                "{} ID is required",
                Self::ENTITY
            )));
        }

        let page = Self::list_page(client, &Self::by_id(id), None, 1).await?;
        page.into_iter()
            .next()
            .ok_or_else(|| FiniteStateError::NotFound {
                entity_type: Self::ENTITY,
                id: id.to_string(),
            })
    }
}
