//! Test data fixtures for the mock server.
//!
//! Provides factory functions for creating realistic records in wire shape.

use serde_json::{json, Value};

use super::state::MockState;

/// Collection of fixture factories for test data.
pub struct Fixtures;

impl Fixtures {
    /// A business unit.
    pub fn business_unit(id: &str, name: &str) -> Value {
        json!({"id": id, "name": name})
    }

    /// A user.
    pub fn user(id: &str, email: &str) -> Value {
        json!({"id": id, "email": email})
    }

    /// An asset owned by a business unit and created by a user.
    pub fn asset(id: &str, name: &str, business_unit_id: &str, user_id: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "createdAt": "2024-01-15T10:30:00Z",
            "createdBy": {"id": user_id, "email": format!("{user_id}@example.com")},
            "group": {"id": business_unit_id, "name": "Devices"},
            "ctx": {"asset": id, "businessUnits": [business_unit_id], "products": []},
            "versions": [],
        })
    }

    /// An asset version on an asset.
    pub fn asset_version(id: &str, name: &str, asset_id: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "createdAt": "2024-01-16T08:00:00Z",
            "relativeRiskScore": 42.5,
            "testStatuses": ["COMPLETED"],
            "uniqueTestTypes": [],
            "asset": {"id": asset_id, "name": "Router"},
        })
    }

    /// A product with its asset versions.
    pub fn product(id: &str, name: &str, asset_version_ids: &[&str]) -> Value {
        let assets: Vec<Value> = asset_version_ids
            .iter()
            .map(|av| json!({"id": av, "name": "1.0"}))
            .collect();
        json!({
            "id": id,
            "name": name,
            "vendor": {"name": "Acme"},
            "assets": assets,
        })
    }

    /// A finding on an asset version.
    pub fn finding(id: &str, asset_version_id: &str, severity: &str, category: &str) -> Value {
        json!({
            "id": id,
            "title": format!("CVE-2024-{}", id.trim_start_matches("f-")),
            "severity": severity,
            "category": category,
            "riskScore": 7.5,
            "assetVersionRefId": asset_version_id,
            "affects": [{"id": "c-1", "name": "openssl", "version": "1.1.1"}],
            "currentStatus": null,
            "cwes": [],
            "cves": [],
        })
    }

    /// A software component instance on an asset version.
    pub fn component(id: &str, asset_version_id: &str, name: &str, version: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "version": version,
            "type": "LIBRARY",
            "absoluteRiskScore": 5.0,
            "assetVersionRefId": asset_version_id,
            "assetVersion": {"id": asset_version_id, "name": "1.0", "asset": {"id": "a-1", "name": "Router"}},
            "licenses": [],
            "hashes": [],
        })
    }

    /// A small organization: one business unit, user, asset, asset version
    /// and product, plus findings and components on the asset version.
    pub fn default_scenario() -> MockState {
        let mut asset = Self::asset("a-1", "Router", "bu-1", "u-1");
        asset["ctx"]["products"] = json!(["p-1"]);
        asset["versions"] = json!([{"id": "av-1", "name": "1.0"}]);

        let mut state = MockState::new()
            .with_record("allGroups", Self::business_unit("bu-1", "Devices"))
            .with_record("allUsers", Self::user("u-1", "dev@example.com"))
            .with_record("allOrganizations", json!({"id": "org-1", "name": "Example Org"}))
            .with_record("allAssets", asset)
            .with_record("allAssetVersions", Self::asset_version("av-1", "1.0", "a-1"))
            .with_record("allProducts", Self::product("p-1", "Gateway", &["av-1"]));

        for (id, severity, category) in [
            ("f-1", "CRITICAL", "CVE"),
            ("f-2", "HIGH", "CVE"),
            ("f-3", "LOW", "CREDENTIALS"),
        ] {
            state.insert("allFindings", Self::finding(id, "av-1", severity, category));
        }

        for (id, name, version) in [
            ("c-1", "openssl", "1.1.1"),
            ("c-2", "busybox", "1.36.0"),
            ("c-3", "zlib", "1.2.13"),
        ] {
            state.insert(
                "allSoftwareComponentInstances",
                Self::component(id, "av-1", name, version),
            );
        }

        state
    }
}
