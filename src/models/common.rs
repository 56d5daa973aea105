//! Small record shapes shared across entities.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A reference to another entity by ID and name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A reference to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Access-control context attached to assets, artifacts and tests.
///
/// The platform uses these IDs for role based access control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Owning asset ID.
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub business_units: Option<Vec<String>>,
    #[serde(default)]
    pub products: Option<Vec<String>>,
}

impl Context {
    /// Business unit IDs, empty if unset.
    pub fn business_units(&self) -> &[String] {
        self.business_units.as_deref().unwrap_or_default()
    }

    /// Product IDs, empty if unset.
    pub fn products(&self) -> &[String] {
        self.products.as_deref().unwrap_or_default()
    }
}

/// Build a `filter` object from optional `(key, value)` pairs.
pub(crate) fn filter<const N: usize>(entries: [(&str, Option<Value>); N]) -> Map<String, Value> {
    let filter: Map<String, Value> = entries
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();

    let mut variables = Map::new();
    variables.insert("filter".into(), Value::Object(filter));
    variables
}

/// `{"id": id}`, the shape of a nested ID filter.
pub(crate) fn id_ref(id: &Option<String>) -> Option<Value> {
    id.as_ref().map(|id| serde_json::json!({ "id": id }))
}

/// A plain string filter value.
pub(crate) fn string(value: &Option<String>) -> Option<Value> {
    value.as_ref().map(|v| Value::String(v.clone()))
}
