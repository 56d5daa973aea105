//! Asset version model and trait implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::models::common::{self, EntityRef, UserRef};
use crate::traits::{require, Create, Get, List};

/// One analyzed revision of an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetVersion {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub created_by: Option<UserRef>,

    #[serde(default)]
    pub relative_risk_score: Option<f64>,

    /// Kinds of tests run against this version.
    #[serde(default)]
    pub unique_test_types: Vec<EntityRef>,

    #[serde(default)]
    pub test_statuses: Vec<String>,

    #[serde(default)]
    pub asset: Option<AssetVersionAsset>,
}

/// The asset an asset version belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetVersionAsset {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<EntityRef>,
}

/// Query parameters for listing asset versions.
#[derive(Debug, Clone, Default)]
pub struct AssetVersionQuery {
    pub asset_version_id: Option<String>,
    pub asset_id: Option<String>,
    pub business_unit_id: Option<String>,
}

impl List for AssetVersion {
    type Query = AssetVersionQuery;
    const FIELD: &'static str = "allAssetVersions";
    const QUERY: &'static str = r#"
query GetAllAssetVersions($filter: AssetVersionFilter!, $after: String, $first: Int) {
    allAssetVersions(filter: $filter, after: $after, first: $first) {
        _cursor
        id
        createdAt
        createdBy {
            id
            email
        }
        name
        relativeRiskScore
        uniqueTestTypes {
            id
            name
        }
        testStatuses
        asset {
            id
            name
            group {
                id
                name
            }
        }
    }
}
"#;

    fn variables(query: &AssetVersionQuery) -> Map<String, Value> {
        common::filter([
            ("id", common::string(&query.asset_version_id)),
            ("asset", common::id_ref(&query.asset_id)),
            ("group", common::id_ref(&query.business_unit_id)),
        ])
    }
}

impl Get for AssetVersion {
    const ENTITY: &'static str = "AssetVersion";

    fn by_id(id: &str) -> AssetVersionQuery {
        AssetVersionQuery {
            asset_version_id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

/// Parameters for creating an asset version on an existing asset.
#[derive(Debug, Clone, Default)]
pub struct CreateAssetVersionParams {
    pub asset_id: String,
    /// Version name, e.g. `1.2.0`.
    pub name: String,
    pub created_by_user_id: Option<String>,
    pub product_id: Option<String>,
}

/// Result of creating an asset version on an asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAssetVersion {
    pub id: String,
    pub asset_version: AssetVersion,
}

impl Create for CreatedAssetVersion {
    type Params = CreateAssetVersionParams;
    const FIELD: &'static str = "createNewAssetVersionOnAsset";
    const MUTATION: &'static str = r#"
mutation CreateAssetVersion($assetVersionName: String!, $assetId: ID!, $createdByUserId: ID, $productId: ID) {
    createNewAssetVersionOnAsset(assetVersionName: $assetVersionName, assetId: $assetId, createdByUserId: $createdByUserId, productId: $productId) {
        id
        assetVersion {
            id
            name
        }
    }
}
"#;

    fn variables(params: &CreateAssetVersionParams) -> Result<Value> {
        require(&params.asset_id, "asset ID")?;
        require(&params.name, "asset version name")?;

        let mut variables = json!({
            "assetVersionName": params.name,
            "assetId": params.asset_id,
        });
        if let Some(user) = &params.created_by_user_id {
            variables["createdByUserId"] = json!(user);
        }
        if let Some(product) = &params.product_id {
            variables["productId"] = json!(product);
        }
        Ok(variables)
    }
}
