//! Artifact model and trait implementations.
//!
//! Artifacts are the files under test for an asset version. The list API
//! serves them from the same `allAssets` field as assets, with a smaller
//! selection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::FiniteStateClient;
use crate::error::Result;
use crate::models::common::{self, Context, EntityRef, UserRef};
use crate::traits::{require, Create, Get, List};

/// A file analyzed as part of an asset version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub created_by: Option<UserRef>,

    #[serde(default)]
    pub asset_version: Option<EntityRef>,

    #[serde(default)]
    pub ctx: Option<Context>,
}

/// Query parameters for listing artifacts.
#[derive(Debug, Clone, Default)]
pub struct ArtifactQuery {
    pub artifact_id: Option<String>,
    pub business_unit_id: Option<String>,
}

impl List for Artifact {
    type Query = ArtifactQuery;
    const FIELD: &'static str = "allAssets";
    const QUERY: &'static str = r#"
query GetAllArtifacts($filter: AssetFilter!, $after: String, $first: Int) {
    allAssets(filter: $filter, after: $after, first: $first) {
        _cursor
        id
        name
        createdAt
        ctx {
            asset
            businessUnits
            products
        }
    }
}
"#;

    fn variables(query: &ArtifactQuery) -> Map<String, Value> {
        common::filter([
            ("id", common::string(&query.artifact_id)),
            ("group", common::id_ref(&query.business_unit_id)),
        ])
    }
}

impl Get for Artifact {
    const ENTITY: &'static str = "Artifact";

    fn by_id(id: &str) -> ArtifactQuery {
        ArtifactQuery {
            artifact_id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

/// Access-control context of an artifact.
///
/// # Errors
///
/// Returns [`FiniteStateError::NotFound`](crate::FiniteStateError::NotFound)
/// if no artifact has this ID.
pub async fn get_artifact_context(client: &FiniteStateClient, artifact_id: &str) -> Result<Context> {
    let artifact = Artifact::get(client, artifact_id).await?;
    Ok(artifact.ctx.unwrap_or_default())
}

/// Parameters for creating an artifact.
#[derive(Debug, Clone, Default)]
pub struct CreateArtifactParams {
    pub business_unit_id: String,
    pub created_by_user_id: String,
    pub asset_version_id: String,
    pub name: String,
    pub product_ids: Vec<String>,
}

impl Create for Artifact {
    type Params = CreateArtifactParams;
    const FIELD: &'static str = "createArtifact";
    const MUTATION: &'static str = r#"
mutation CreateArtifact($input: CreateArtifactInput!) {
    createArtifact(input: $input) {
        id
        name
        assetVersion {
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

    fn variables(params: &CreateArtifactParams) -> Result<Value> {
        require(&params.business_unit_id, "business unit ID")?;
        require(&params.created_by_user_id, "created by user ID")?;
        require(&params.asset_version_id, "asset version ID")?;
        require(&params.name, "artifact name")?;

        let mut input = json!({
            "name": params.name,
            "createdBy": params.created_by_user_id,
            "assetVersion": params.asset_version_id,
            "ctx": {
                "asset": params.asset_version_id,
                "businessUnits": [params.business_unit_id]
            }
        });
        if !params.product_ids.is_empty() {
            input["ctx"]["products"] = json!(params.product_ids);
        }
        Ok(json!({ "input": input }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_artifact_variables() {
        let params = CreateArtifactParams {
            business_unit_id: "bu-1".into(),
            created_by_user_id: "u-1".into(),
            asset_version_id: "av-1".into(),
            name: "Router 1.0 - Binary".into(),
            product_ids: vec![],
        };
        let vars = <Artifact as Create>::variables(&params).unwrap();
        assert_eq!(vars["input"]["assetVersion"], "av-1");
        assert_eq!(vars["input"]["ctx"]["asset"], "av-1");
        assert!(vars["input"]["ctx"].get("products").is_none());
    }

    #[test]
    fn test_create_artifact_requires_asset_version() {
        let params = CreateArtifactParams {
            business_unit_id: "bu-1".into(),
            created_by_user_id: "u-1".into(),
            name: "x".into(),
            ..Default::default()
        };
        assert!(<Artifact as Create>::variables(&params).is_err());
    }
}
