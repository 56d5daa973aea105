//! GraphQL endpoint handler.
//!
//! Requests are dispatched on the first field of the operation's selection
//! set. Only the fields this crate sends are understood; anything else is
//! answered with a GraphQL error.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

use crate::mock_server::state::MockState;

/// A GraphQL request envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlBody {
    pub query: String,
    #[serde(default)]
    pub variables: Value,
}

/// POST /api/v1/graphql
pub async fn graphql(
    State(state): State<Arc<RwLock<MockState>>>,
    headers: HeaderMap,
    Json(body): Json<GraphQlBody>,
) -> Response {
    let mut state = state.write().await;

    if let Some(required) = &state.required_token {
        let expected = format!("Bearer {required}");
        let authorized = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected);
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"message": "Unauthorized"})),
            )
                .into_response();
        }
    }

    if !headers.contains_key("organization-context") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Organization-Context header is required"})),
        )
            .into_response();
    }

    let Some(field) = root_field(&body.query) else {
        return graphql_error("could not find a root field");
    };

    match resolve(&mut state, field, &body.variables) {
        Ok(value) => {
            let mut data = Map::new();
            data.insert(field.to_string(), value);
            Json(json!({ "data": data })).into_response()
        }
        Err(message) => graphql_error(&message),
    }
}

fn graphql_error(message: &str) -> Response {
    Json(json!({
        "data": null,
        "errors": [{"message": message}],
    }))
    .into_response()
}

/// First field name inside the operation's selection set.
pub(crate) fn root_field(document: &str) -> Option<&str> {
    let start = document.find('{')? + 1;
    let rest = document[start..].trim_start();
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    (end > 0).then(|| &rest[..end])
}

fn resolve(state: &mut MockState, field: &str, vars: &Value) -> Result<Value, String> {
    match field {
        "_allFindingsMeta" => {
            let filter = vars.get("filter").and_then(Value::as_object);
            Ok(json!({ "count": state.list("allFindings", filter).len() }))
        }
        f if f.starts_with("all") => Ok(list_page(state, f, vars)),

        "createAsset" => create_asset(state, &vars["input"]),
        "createNewAssetVersionOnAsset" => create_asset_version(state, vars),
        "createArtifact" => create_artifact(state, &vars["input"]),
        "createProduct" => create_product(state, &vars["input"]),
        "createTest" => create_test(state, &vars["input"]),

        "updateFindingsStatuses" => {
            let ids: Vec<String> = serde_json::from_value(vars["ids"].clone())
                .map_err(|e| format!("ids: {e}"))?;
            let updated = state.update_finding_statuses(&ids, &vars["updateStatusInput"]);
            Ok(json!({ "ids": updated }))
        }

        "startMultipartUploadV2" => {
            let test_id = string_var(vars, "testId")?;
            let (upload_id, key) = state.start_upload(&test_id);
            Ok(json!({"uploadId": upload_id, "key": key}))
        }
        "generateUploadPartUrlV2" => {
            let upload_id = string_var(vars, "uploadId")?;
            let part_number = vars["partNumber"]
                .as_u64()
                .ok_or("partNumber is required")?;
            let upload = state
                .uploads
                .get(&upload_id)
                .ok_or_else(|| format!("unknown upload {upload_id}"))?;
            Ok(json!({
                "key": upload.key,
                "uploadUrl": format!("{}/upload/{upload_id}/{part_number}", state.base_url),
            }))
        }
        "completeMultipartUploadV2" => {
            let upload_id = string_var(vars, "uploadId")?;
            let parts = vars["partData"].as_array().ok_or("partData is required")?;
            let numbers: Vec<u32> = parts
                .iter()
                .filter_map(|p| p["PartNumber"].as_u64())
                .filter_map(|n| u32::try_from(n).ok())
                .collect();
            let key = state
                .complete_upload(&upload_id, &numbers)
                .ok_or_else(|| format!("cannot complete upload {upload_id}"))?;
            Ok(json!({ "key": key }))
        }
        "generateSinglePartUploadUrl" => {
            let test_id = string_var(vars, "testId")?;
            let key = state.next_id(&format!("results-{test_id}"));
            Ok(json!({
                "key": key,
                "uploadUrl": format!("{}/upload/single/{key}", state.base_url),
            }))
        }
        "launchBinaryUploadProcessing" | "launchTestResultProcessing" => {
            let key = string_var(vars, "key")?;
            let test_id = string_var(vars, "testId")?;
            if !state.objects.contains_key(&key) {
                return Err(format!("no object uploaded at {key}"));
            }
            state.processed.push((key.clone(), test_id));
            Ok(json!({ "key": key }))
        }

        "launchArtifactCSVExport" | "launchArtifactPdfExport" | "launchProductCSVExport"
        | "launchProductPdfExport" | "launchCycloneDxExport" | "launchSpdxExport" => {
            let id = state.launch_export(field);
            Ok(json!({ "exportJobId": id }))
        }
        "generateExportDownloadPresignedUrl" => {
            let id = string_var(vars, "exportId")?;
            let (status, link) = state
                .poll_export(&id)
                .ok_or_else(|| format!("unknown export {id}"))?;
            Ok(json!({"status": status, "downloadLink": link}))
        }

        other => Err(format!("Cannot query field \"{other}\"")),
    }
}

fn string_var(vars: &Value, name: &str) -> Result<String, String> {
    vars[name]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("{name} is required"))
}

/// Cursor page over the records of a list field.
///
/// `_cursor` is the record's 1-based position, so `after` is also the
/// index of the next record.
fn list_page(state: &MockState, field: &str, vars: &Value) -> Value {
    let filter = vars.get("filter").and_then(Value::as_object);
    let start = vars["after"]
        .as_str()
        .and_then(|c| c.parse::<usize>().ok())
        .unwrap_or(0);
    let first = vars["first"].as_u64().map_or(100, |n| n as usize);

    let page: Vec<Value> = state
        .list(field, filter)
        .into_iter()
        .enumerate()
        .skip(start)
        .take(first)
        .map(|(i, record)| {
            let mut record = record.clone();
            record["_cursor"] = json!((i + 1).to_string());
            record
        })
        .collect();
    Value::Array(page)
}

fn create_asset(state: &mut MockState, input: &Value) -> Result<Value, String> {
    let id = state.next_id("asset");
    let business_unit = input["group"].clone();
    let mut ctx = input["ctx"].clone();
    ctx["asset"] = json!(id);
    let record = json!({
        "id": id,
        "name": input["name"],
        "group": {"id": business_unit},
        "createdBy": {"id": input["createdBy"]},
        "ctx": ctx,
        "versions": [],
    });
    state.insert("allAssets", record.clone());
    Ok(record)
}

fn create_asset_version(state: &mut MockState, vars: &Value) -> Result<Value, String> {
    let asset_id = string_var(vars, "assetId")?;
    let name = string_var(vars, "assetVersionName")?;
    let id = state.next_id("av");

    let asset = state
        .find_mut("allAssets", &asset_id)
        .ok_or_else(|| format!("unknown asset {asset_id}"))?;
    let asset_name = asset["name"].clone();
    let group = asset["group"].clone();
    if let Some(versions) = asset["versions"].as_array_mut() {
        versions.push(json!({"id": id, "name": name}));
    }

    let record = json!({
        "id": id,
        "name": name,
        "createdBy": {"id": vars["createdByUserId"]},
        "asset": {"id": asset_id, "name": asset_name, "group": group},
    });
    state.insert("allAssetVersions", record.clone());

    if let Some(product_id) = vars["productId"].as_str() {
        if let Some(product) = state.find_mut("allProducts", product_id) {
            if let Some(assets) = product["assets"].as_array_mut() {
                assets.push(json!({"id": id, "name": name}));
            }
        }
    }

    let wrapper_id = state.next_id("avw");
    Ok(json!({"id": wrapper_id, "assetVersion": record}))
}

fn create_artifact(state: &mut MockState, input: &Value) -> Result<Value, String> {
    let asset_version_id = input["assetVersion"]
        .as_str()
        .ok_or("assetVersion is required")?
        .to_string();
    if state.list("allAssetVersions", None).iter().all(|v| v["id"] != asset_version_id.as_str()) {
        return Err(format!("unknown asset version {asset_version_id}"));
    }

    let id = state.next_id("artifact");
    let record = json!({
        "id": id,
        "name": input["name"],
        "createdBy": {"id": input["createdBy"]},
        "assetVersion": {"id": asset_version_id},
        "ctx": input["ctx"],
    });
    state.insert("allAssets", record.clone());
    Ok(record)
}

fn create_product(state: &mut MockState, input: &Value) -> Result<Value, String> {
    let id = state.next_id("product");
    let vendor = match (&input["vendor"], &input["createVendor"]) {
        (Value::Null, Value::Null) => Value::Null,
        (Value::Null, created) => json!({"name": created["name"]}),
        (existing, _) => existing.clone(),
    };
    let record = json!({
        "id": id,
        "name": input["name"],
        "group": {"id": input["group"]},
        "createdBy": {"id": input["createdBy"]},
        "vendor": vendor,
        "assets": [],
    });
    state.insert("allProducts", record.clone());
    Ok(record)
}

fn create_test(state: &mut MockState, input: &Value) -> Result<Value, String> {
    if input["testResultFileFormat"].as_str().map_or(true, str::is_empty) {
        return Err("testResultFileFormat is required".to_string());
    }
    let id = state.next_id("test");
    let record = json!({
        "id": id,
        "name": input["name"],
        "artifactUnderTest": {"id": input["artifactUnderTest"]},
        "createdBy": {"id": input["createdBy"]},
        "ctx": input["ctx"],
        "uploadMethod": input["uploadMethod"],
        "testResultFileFormat": input["testResultFileFormat"],
    });
    state.insert("tests", record.clone());
    Ok(record)
}
