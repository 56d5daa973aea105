//! Cursor pagination over GraphQL list fields.
//!
//! The platform pages list fields with `first`/`after` variables. Every
//! record carries an opaque `_cursor`; the cursor of the last record on a
//! page is passed as `after` to fetch the next one.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::graphql::GraphQlRequest;

/// Largest page size (and result limit) the platform accepts.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default page size for list operations.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Name of the per-record cursor field.
pub const CURSOR_FIELD: &str = "_cursor";

/// One page of results from a list field.
#[derive(Debug, Clone, Serialize)]
#[serde(bound = "T: Serialize")]
pub struct Page<T> {
    /// The items on this page, in server order.
    pub items: Vec<T>,
    /// Cursor of the last item, if the page has one.
    pub cursor: Option<String>,
}

impl Page<Value> {
    /// Extract the page stored under `field` in a response `data` object.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::Schema`] if `field` is absent or is not
    /// an array.
    pub fn from_data(data: &Value, field: &str) -> Result<Self> {
        let records = data
            .get(field)
            .ok_or_else(|| FiniteStateError::schema(format!("{field} not in response data")))?;

        let items = match records {
            Value::Array(items) => items.clone(),
            // A null list field is an empty page.
            Value::Null => Vec::new(),
            _ => {
                return Err(FiniteStateError::schema(format!(
                    "{field} is not a list"
                )))
            }
        };

        let cursor = items
            .last()
            .and_then(|last| last.get(CURSOR_FIELD))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self { items, cursor })
    }

    /// Decode every record into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::Schema`] if any record does not match `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Page<T>> {
        let items = decode_records(self.items)?;
        Ok(Page {
            items,
            cursor: self.cursor,
        })
    }
}

impl<T> Page<T> {
    /// Map the items to a different type.
    #[must_use]
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            cursor: self.cursor,
        }
    }

    /// Whether another page may follow this one.
    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.items.is_empty() && self.cursor.is_some()
    }

    /// Returns true if this page has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of items on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns an iterator over the items in this page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Decode raw records into typed values.
pub(crate) fn decode_records<T: DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|r| {
            serde_json::from_value(r)
                .map_err(|e| FiniteStateError::schema(format!("record did not decode: {e}")))
        })
        .collect()
}

/// Check `variables.first` and return the variables as a mutable map.
fn validated_variables(variables: Value) -> Result<Map<String, Value>> {
    let Value::Object(map) = variables else {
        return Err(FiniteStateError::validation("variables must be a JSON object"));
    };

    let first = map
        .get("first")
        .and_then(Value::as_i64)
        .ok_or_else(|| FiniteStateError::validation("variables.first is required"))?;

    if first < 1 {
        return Err(FiniteStateError::validation("first cannot be less than 1"));
    }
    if first > i64::from(MAX_PAGE_SIZE) {
        return Err(FiniteStateError::validation(format!(
            "first cannot be greater than {MAX_PAGE_SIZE}"
        )));
    }

    Ok(map)
}

/// Check a caller-supplied result limit.
pub(crate) fn validate_limit(limit: Option<usize>) -> Result<()> {
    match limit {
        Some(0) => Err(FiniteStateError::validation("limit cannot be less than 1")),
        Some(l) if l > MAX_PAGE_SIZE as usize => Err(FiniteStateError::validation(format!(
            "limit cannot be greater than {MAX_PAGE_SIZE}"
        ))),
        _ => Ok(()),
    }
}

/// Fetch every page of a list field and concatenate the records.
///
/// Issues `query` with `variables`, appends `data[field]`, and repeats
/// with `after` set to the last record's `_cursor` until a page is empty
/// or its last record has no cursor. With a `limit`, fetching stops once
/// at least `limit` records are held and the result is cut to `limit`.
///
/// Records keep server order. Nothing bounds the number of pages beyond
/// the server running out of them.
///
/// # Errors
///
/// * [`FiniteStateError::Validation`] if `first` is missing or outside
///   `[1, 1000]`, `field` is empty, or `limit` is outside `[1, 1000]`;
///   no request is made in that case
/// * [`FiniteStateError::Schema`] if a response lacks `field`
/// * any transport or GraphQL error from the client
#[tracing::instrument(skip(client, query, variables))]
pub async fn get_all_paginated_results(
    client: &FiniteStateClient,
    query: &str,
    variables: Value,
    field: &str,
    limit: Option<usize>,
) -> Result<Vec<Value>> {
    if field.is_empty() {
        return Err(FiniteStateError::validation("field is required"));
    }
    validate_limit(limit)?;
    let mut variables = validated_variables(variables)?;

    let mut results = Vec::new();
    let mut pages = 0u32;

    loop {
        let request = GraphQlRequest::new(query, Value::Object(variables.clone()));
        let data = client.send_graphql(&request).await?;
        let page = Page::from_data(&data, field)?;
        pages += 1;

        let cursor = page.cursor;
        results.extend(page.items);

        let Some(cursor) = cursor else {
            break;
        };
        if limit.is_some_and(|l| results.len() >= l) {
            break;
        }

        variables.insert("after".to_string(), Value::String(cursor));
    }

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    tracing::debug!("Fetched {} records from {} in {} pages", results.len(), field, pages);
    Ok(results)
}

/// Typed variant of [`get_all_paginated_results`].
///
/// # Errors
///
/// Same as [`get_all_paginated_results`], plus
/// [`FiniteStateError::Schema`] if a record does not decode into `T`.
pub async fn paginate<T: DeserializeOwned>(
    client: &FiniteStateClient,
    query: &str,
    variables: Value,
    field: &str,
    limit: Option<usize>,
) -> Result<Vec<T>> {
    let records = get_all_paginated_results(client, query, variables, field, limit).await?;
    decode_records(records)
}
