//! Product model and trait implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::FiniteStateClient;
use crate::error::Result;
use crate::models::common::{self, EntityRef, UserRef};
use crate::traits::{require, Create, Get, List};

/// A product groups assets that ship together.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
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
    pub vendor: Option<Vendor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Query parameters for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub product_id: Option<String>,
    pub business_unit_id: Option<String>,
}

impl List for Product {
    type Query = ProductQuery;
    const FIELD: &'static str = "allProducts";
    const QUERY: &'static str = r#"
query GetAllProducts($filter: ProductFilter!, $after: String, $first: Int) {
    allProducts(filter: $filter, after: $after, first: $first) {
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
        vendor {
            name
        }
    }
}
"#;

    fn variables(query: &ProductQuery) -> Map<String, Value> {
        common::filter([
            ("id", common::string(&query.product_id)),
            ("group", common::id_ref(&query.business_unit_id)),
        ])
    }
}

impl Get for Product {
    const ENTITY: &'static str = "Product";

    fn by_id(id: &str) -> ProductQuery {
        ProductQuery {
            product_id: Some(id.to_string()),
            ..Default::default()
        }
    }
}

/// An asset version as listed under a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAssetVersion {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relative_risk_score: Option<f64>,
    #[serde(default)]
    pub asset: Option<EntityRef>,
}

#[derive(Debug, Deserialize)]
struct ProductWithAssets {
    #[serde(default)]
    assets: Vec<ProductAssetVersion>,
}

impl List for ProductWithAssets {
    type Query = ProductQuery;
    const FIELD: &'static str = "allProducts";
    const QUERY: &'static str = r#"
query GetProductAssetVersions($filter: ProductFilter!, $after: String, $first: Int) {
    allProducts(filter: $filter, after: $after, first: $first) {
        _cursor
        id
        name
        createdAt
        assets {
            id
            name
            relativeRiskScore
            asset {
                id
                name
            }
        }
    }
}
"#;

    fn variables(query: &ProductQuery) -> Map<String, Value> {
        <Product as List>::variables(query)
    }
}

/// All asset versions attached to a product.
///
/// # Errors
///
/// Returns [`FiniteStateError::Validation`](crate::FiniteStateError::Validation)
/// if `product_id` is empty.
pub async fn get_product_asset_versions(
    client: &FiniteStateClient,
    product_id: &str,
) -> Result<Vec<ProductAssetVersion>> {
    require(product_id, "product ID")?;
    let query = Product::by_id(product_id);
    let products = ProductWithAssets::list_all(client, &query).await?;
    Ok(products.into_iter().flat_map(|p| p.assets).collect())
}

/// Parameters for creating a product.
#[derive(Debug, Clone, Default)]
pub struct CreateProductParams {
    pub business_unit_id: String,
    pub created_by_user_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Link to an existing vendor.
    pub vendor_id: Option<String>,
    /// Create a new vendor with this name and link it.
    pub vendor_name: Option<String>,
}

impl Create for Product {
    type Params = CreateProductParams;
    const FIELD: &'static str = "createProduct";
    const MUTATION: &'static str = r#"
mutation CreateProduct($input: CreateProductInput!) {
    createProduct(input: $input) {
        id
        name
        vendor {
            name
        }
        group {
            id
            name
        }
        createdBy {
            id
            email
        }
    }
}
"#;

    fn variables(params: &CreateProductParams) -> Result<Value> {
        require(&params.business_unit_id, "business unit ID")?;
        require(&params.created_by_user_id, "created by user ID")?;
        require(&params.name, "product name")?;

        let mut input = json!({
            "name": params.name,
            "group": params.business_unit_id,
            "createdBy": params.created_by_user_id,
            "ctx": {
                "businessUnit": params.business_unit_id
            }
        });
        if let Some(description) = &params.description {
            input["description"] = json!(description);
        }
        if let Some(vendor_id) = &params.vendor_id {
            input["vendor"] = json!({ "id": vendor_id });
        }
        if let Some(vendor_name) = &params.vendor_name {
            input["createVendor"] = json!({ "name": vendor_name });
        }
        Ok(json!({ "input": input }))
    }
}
