//! List trait for fetching collections of entities.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::client::FiniteStateClient;
use crate::error::Result;
use crate::graphql::GraphQlRequest;
use crate::pagination::{self, Page, DEFAULT_PAGE_SIZE};

/// List/filter entities through a cursor-paginated GraphQL field.
///
/// Implementors supply the document, the list field it returns and the
/// filter variables. The document must declare `$after: String` and
/// `$first: Int` and select `_cursor` on every record.
///
/// # Example
///
/// ```ignore
/// use finitestate::{Asset, AssetQuery, FiniteStateClient, List};
///
/// // Fetch a single page
/// let page = Asset::list_page(&client, &AssetQuery::default(), None, 50).await?;
///
/// // Fetch all pages
/// let assets = Asset::list_all(&client, &AssetQuery::default()).await?;
/// ```
#[async_trait]
pub trait List: DeserializeOwned + Send {
    /// Filter parameters.
    type Query: Default + Send + Sync;

    /// The list field under `data`, e.g. `allAssets`.
    const FIELD: &'static str;

    /// The GraphQL document.
    const QUERY: &'static str;

    /// Filter variables for `query`, without `first`/`after`.
    fn variables(query: &Self::Query) -> Map<String, Value>;

    /// Cap on the number of records [`list_all`](Self::list_all) returns.
    fn limit(_query: &Self::Query) -> Option<usize> {
        None
    }

    /// Fetch a single page.
    ///
    /// # Arguments
    ///
    /// * `client` - The Finite State API client
    /// * `query` - Filter parameters
    /// * `after` - Cursor of the last record of the previous page
    /// * `first` - Page size (1 to 1000)
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the records do not decode.
    async fn list_page(
        client: &FiniteStateClient,
        query: &Self::Query,
        after: Option<&str>,
        first: u32,
    ) -> Result<Page<Self>> {
        let mut variables = Self::variables(query);
        variables.insert("first".into(), first.into());
        variables.insert("after".into(), after.map_or(Value::Null, |a| a.into()));

        let request = GraphQlRequest::new(Self::QUERY, Value::Object(variables));
        let data = client.send_graphql(&request).await?;
        Page::from_data(&data, Self::FIELD)?.decode()
    }

    /// List all entities matching the query.
    ///
    /// Follows cursors until the server runs out of records, or until the
    /// query's limit is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    async fn list_all(client: &FiniteStateClient, query: &Self::Query) -> Result<Vec<Self>> {
        let limit = Self::limit(query);
        let first = limit.map_or(DEFAULT_PAGE_SIZE, |l| {
            u32::try_from(l).map_or(DEFAULT_PAGE_SIZE, |l| l.min(DEFAULT_PAGE_SIZE))
        });

        let mut variables = Self::variables(query);
        variables.insert("first".into(), first.into());

        pagination::paginate(
            client,
            Self::QUERY,
            Value::Object(variables),
            Self::FIELD,
            limit,
        )
        .await
    }
}
