//! Create trait for entities made by mutation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::graphql::GraphQlRequest;

/// Create an entity.
///
/// Required inputs are checked by [`variables`](Self::variables) before
/// anything is sent.
///
/// # Example
///
/// ```ignore
/// use finitestate::{CreateProductParams, Create, Product};
///
/// let params = CreateProductParams {
///     business_unit_id: "bu-1".into(),
///     created_by_user_id: "user-1".into(),
///     name: "Router".into(),
///     ..Default::default()
/// };
/// let product = Product::create(&client, &params).await?;
/// ```
#[async_trait]
pub trait Create: DeserializeOwned + Send {
    /// Creation parameters.
    type Params: Send + Sync;

    /// The mutation's result field, e.g. `createAsset`.
    const FIELD: &'static str;

    /// The mutation document.
    const MUTATION: &'static str;

    /// Validate `params` and build the mutation variables.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::Validation`] if a required input is
    /// missing.
    fn variables(params: &Self::Params) -> Result<Value>;

    /// Create the entity and return it as the server reports it.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails, the request fails, or the
    /// result field is missing.
    async fn create(client: &FiniteStateClient, params: &Self::Params) -> Result<Self> {
        let variables = Self::variables(params)?;
        let request = GraphQlRequest::new(Self::MUTATION, variables);
        let mut data = client.send_graphql(&request).await?;

        let created = data
            .get_mut(Self::FIELD)
            .map(Value::take)
            .filter(|v| !v.is_null())
            .ok_or_else(|| FiniteStateError::schema(format!("{} not in response data", Self::FIELD)))?;

        serde_json::from_value(created).map_err(|e| {
            FiniteStateError::schema(format!("{} did not decode: {e}", Self::FIELD))
        })
    }
}

/// Fail with a validation error when a required string is empty.
pub(crate) fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FiniteStateError::validation(format!("{what} is required")));
    }
    Ok(())
}
