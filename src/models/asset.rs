//! Asset model and trait implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;
use crate::models::common::{self, Context, EntityRef, UserRef};
use crate::traits::{require, Create, Get, List};

/// A tracked piece of software.
///
/// Assets belong to a business unit and accumulate asset versions, one
/// per analyzed revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub created_by: Option<UserRef>,

    /// Owning business unit.
    #[serde(default)]
    pub group: Option<EntityRef>,

    #[serde(default)]
    pub ctx: Option<Context>,

    /// Versions of this asset, newest last.
    #[serde(default)]
    pub versions: Vec<AssetVersionSummary>,
}

/// Version entry embedded in an asset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetVersionSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relative_risk_score: Option<f64>,
    #[serde(default)]
    pub test_statuses: Vec<String>,
}

impl Asset {
    /// ID of the owning business unit, if known.
    pub fn business_unit_id(&self) -> Option<&str> {
        self.group.as_ref().map(|g| g.id.as_str())
    }

    /// ID of the creating user, if known.
    pub fn created_by_id(&self) -> Option<&str> {
        self.created_by.as_ref().and_then(|u| u.id.as_deref())
    }

    /// Product IDs from the asset's context.
    pub fn product_ids(&self) -> &[String] {
        self.ctx.as_ref().map(Context::products).unwrap_or_default()
    }
}

/// Query parameters for listing assets.
#[derive(Debug, Clone, Default)]
pub struct AssetQuery {
    pub asset_id: Option<String>,
    pub business_unit_id: Option<String>,
}

impl List for Asset {
    type Query = AssetQuery;
    const FIELD: &'static str = "allAssets";
    const QUERY: &'static str = r#"
query GetAllAssets($filter: AssetFilter!, $after: String, $first: Int) {
    allAssets(filter: $filter, after: $after, first: $first) {
        _cursor
        id
        name
        createdAt
        createdBy {
            id
            email
        }
        group {
            id
            name
        }
        ctx {
            asset
            businessUnits
            products
        }
        versions {
            id
            name
            relativeRiskScore
            testStatuses
        }
    }
}
"#;

    fn variables(query: &AssetQuery) -> Map<String, Value> {
        common::filter([
            ("id", common::string(&query.asset_id)),
            ("group", common::id_ref(&query.business_unit_id)),
        ])
    }
}

impl Get for Asset {
    const ENTITY: &'static str = "Asset";

    fn by_id(id: &str) -> AssetQuery {
        AssetQuery {
            asset_id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

/// Parameters for creating an asset.
#[derive(Debug, Clone, Default)]
pub struct CreateAssetParams {
    pub business_unit_id: String,
    pub created_by_user_id: String,
    pub name: String,
    pub product_ids: Vec<String>,
}

impl Create for Asset {
    type Params = CreateAssetParams;
    const FIELD: &'static str = "createAsset";
    const MUTATION: &'static str = r#"
mutation CreateAsset($input: CreateAssetInput!) {
    createAsset(input: $input) {
        id
        name
        group {
            id
            name
        }
        createdBy {
            id
            email
        }
        ctx {
            asset
            products
            businessUnits
        }
    }
}
"#;

    fn variables(params: &CreateAssetParams) -> Result<Value> {
        require(&params.business_unit_id, "business unit ID")?;
        require(&params.created_by_user_id, "created by user ID")?;
        require(&params.name, "asset name")?;

        let mut input = json!({
            "name": params.name,
            "group": params.business_unit_id,
            "createdBy": params.created_by_user_id,
            "ctx": {
                "businessUnits": [params.business_unit_id]
            }
        });
        if !params.product_ids.is_empty() {
            input["ctx"]["products"] = json!(params.product_ids);
        }
        Ok(json!({ "input": input }))
    }
}
