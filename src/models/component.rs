//! Software components (SBOM entries) and SBOM search.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::pagination::{self, DEFAULT_PAGE_SIZE};
use crate::traits::List;

/// A component instance found in an asset version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftwareComponent {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: Option<String>,

    /// Component type, e.g. `LIBRARY` or `OPERATING_SYSTEM`.
    #[serde(rename = "type", default)]
    pub component_type: Option<String>,

    #[serde(default)]
    pub absolute_risk_score: Option<f64>,

    #[serde(default)]
    pub licenses: Vec<License>,

    #[serde(default)]
    pub software_identifiers: Option<SoftwareIdentifiers>,

    #[serde(default)]
    pub hashes: Vec<Hash>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct License {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub copy_left: Option<String>,
    #[serde(default)]
    pub is_osi_approved: Option<bool>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftwareIdentifiers {
    #[serde(default)]
    pub cpes: Vec<String>,
    #[serde(default)]
    pub purl: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hash {
    pub alg: String,
    pub content: String,
}

/// Filter parameters for listing components.
#[derive(Debug, Clone, Default)]
pub struct ComponentQuery {
    pub asset_version_id: Option<String>,
    /// Restrict to one component type.
    pub component_type: Option<String>,
}

impl List for SoftwareComponent {
    type Query = ComponentQuery;
    const FIELD: &'static str = "allSoftwareComponentInstances";
    const QUERY: &'static str = r#"
query GetSoftwareComponents($filter: SoftwareComponentInstanceFilter, $after: String, $first: Int, $orderBy: [SoftwareComponentInstanceOrderBy!]) {
    allSoftwareComponentInstances(filter: $filter, after: $after, first: $first, orderBy: $orderBy) {
        _cursor
        id
        name
        type
        version
        hashes {
            alg
            content
        }
        licenses {
            id
            name
            copyLeft
            isOsiApproved
            url
        }
        softwareIdentifiers {
            cpes
            purl
        }
        absoluteRiskScore
    }
}
"#;

    fn variables(query: &ComponentQuery) -> Map<String, Value> {
        let mut filter = json!({
            "mergedComponentRefId": null,
            "deletedAt": null,
        });
        if let Some(id) = &query.asset_version_id {
            filter["assetVersionRefId"] = json!(id);
        }
        if let Some(kind) = &query.component_type {
            filter["type_in"] = json!([kind]);
        }

        let mut variables = Map::new();
        variables.insert("filter".into(), filter);
        variables.insert("orderBy".into(), json!(["absoluteRiskScore_DESC"]));
        variables
    }
}

/// How [`search_sbom`] matches names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMethod {
    #[default]
    Exact,
    Contains,
}

/// An SBOM search.
#[derive(Debug, Clone, Default)]
pub struct SbomSearch {
    /// Component name to look for.
    pub name: String,
    pub version: Option<String>,
    /// Search one asset version instead of the whole organization.
    pub asset_version_id: Option<String>,
    pub method: SearchMethod,
    /// Only applies to exact matches.
    pub case_sensitive: bool,
}

/// A component located by [`search_sbom`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SbomMatch {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    /// Where the component was found. Present for organization-wide searches.
    #[serde(default)]
    pub asset_version: Option<SbomMatchLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomMatchLocation {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub asset: Option<crate::models::common::EntityRef>,
}

const SEARCH_IN_ASSET_VERSION: &str = r#"
query SearchSbom($filter: SoftwareComponentInstanceFilter, $after: String, $first: Int) {
    allSoftwareComponentInstances(filter: $filter, after: $after, first: $first) {
        _cursor
        id
        name
        version
    }
}
"#;

const SEARCH_ORGANIZATION: &str = r#"
query SearchSbom($filter: SoftwareComponentInstanceFilter, $after: String, $first: Int) {
    allSoftwareComponentInstances(filter: $filter, after: $after, first: $first) {
        _cursor
        id
        name
        version
        assetVersion {
            id
            name
            asset {
                id
                name
            }
        }
    }
}
"#;

impl SbomSearch {
    fn filter(&self) -> Value {
        let mut filter = json!({ "mergedComponentRefId": null });
        if let Some(id) = &self.asset_version_id {
            filter["assetVersionRefId"] = json!(id);
        }

        match self.method {
            SearchMethod::Exact if self.case_sensitive => filter["name"] = json!(self.name),
            SearchMethod::Exact => filter["name_like"] = json!(self.name),
            SearchMethod::Contains => filter["name_contains"] = json!(self.name),
        }

        if let Some(version) = &self.version {
            match self.method {
                SearchMethod::Exact => filter["version"] = json!(version),
                SearchMethod::Contains => filter["version_contains"] = json!(version),
            }
        }
        filter
    }
}

/// Search an SBOM for components by name and optional version.
///
/// # Errors
///
/// Returns [`FiniteStateError::Validation`] if `search.name` is empty.
#[tracing::instrument(skip(client))]
pub async fn search_sbom(client: &FiniteStateClient, search: &SbomSearch) -> Result<Vec<SbomMatch>> {
    if search.name.is_empty() {
        return Err(FiniteStateError::validation("component name is required"));
    }

    let query = if search.asset_version_id.is_some() {
        SEARCH_IN_ASSET_VERSION
    } else {
        SEARCH_ORGANIZATION
    };
    let variables = json!({
        "filter": search.filter(),
        "after": null,
        "first": DEFAULT_PAGE_SIZE,
    });

    pagination::paginate(client, query, variables, SoftwareComponent::FIELD, None).await
}
