//! Business units, users and organizations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::traits::List;

/// A business unit (a `Group` in the API).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessUnit {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An organization visible to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

impl List for BusinessUnit {
    type Query = ();
    const FIELD: &'static str = "allGroups";
    const QUERY: &'static str = r#"
query GetBusinessUnits($after: String, $first: Int) {
    allGroups(after: $after, first: $first) {
        _cursor
        id
        name
    }
}
"#;

    fn variables(_query: &()) -> Map<String, Value> {
        Map::new()
    }
}

impl List for User {
    type Query = ();
    const FIELD: &'static str = "allUsers";
    const QUERY: &'static str = r#"
query GetUsers($after: String, $first: Int) {
    allUsers(after: $after, first: $first) {
        _cursor
        id
        email
    }
}
"#;

    fn variables(_query: &()) -> Map<String, Value> {
        Map::new()
    }
}

impl List for Organization {
    type Query = ();
    const FIELD: &'static str = "allOrganizations";
    const QUERY: &'static str = r#"
query GetOrganizations($after: String, $first: Int) {
    allOrganizations(after: $after, first: $first) {
        _cursor
        id
        name
    }
}
"#;

    fn variables(_query: &()) -> Map<String, Value> {
        Map::new()
    }
}
