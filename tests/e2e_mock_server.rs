//! E2E tests using the mock Finite State server.
//!
//! These tests exercise full workflows against the mock server,
//! testing realistic scenarios rather than individual endpoints.

#![cfg(feature = "test-server")]

use std::io::Write;
use std::time::Duration;

use finitestate::mock_server::{Fixtures, MockServer, MockState};
use finitestate::{
    count_findings, create_new_asset_version_and_upload_binary,
    create_new_asset_version_and_upload_test_results, download_asset_version_report,
    download_product_report, download_sbom, get_auth_token, get_findings, search_sbom,
    update_finding_statuses, Asset, AssetVersion, AssetVersionQuery, AuthClient, FindingQuery,
    FindingStatus, FindingStatusUpdate, FiniteStateClient, FiniteStateError, List,
    NewAssetVersion, PollPolicy, ReportSubtype, ReportType, SbomSearch, SbomSubtype, SbomType,
    SearchMethod, Severity, TestType, TokenCache, MIN_CHUNK_SIZE,
};

async fn client_for(server: &MockServer) -> FiniteStateClient {
    let config = server.config();
    let token = get_auth_token(&config).await.unwrap();
    FiniteStateClient::from_config(&config, &token).unwrap()
}

fn fast_policy() -> PollPolicy {
    PollPolicy::every(Duration::from_millis(10)).with_max_attempts(20)
}

// =============================================================================
// Server Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_server_starts_on_random_port() {
    let server1 = MockServer::start().await;
    let server2 = MockServer::start().await;

    assert_ne!(server1.url(), server2.url());

    server1.shutdown().await;
    server2.shutdown().await;
}

#[tokio::test]
async fn test_server_shutdown_is_clean() {
    let server = MockServer::start().await;
    let url = server.url().to_string();

    server.shutdown().await;

    let client = reqwest::Client::new();
    let result = client.get(format!("{url}/health")).send().await;

    assert!(result.is_err());
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_token_endpoint_issues_token() {
    let server = MockServer::start().await;

    let token = get_auth_token(&server.config()).await.unwrap();
    assert_eq!(token, "mock-token-test-client");

    server.shutdown().await;
}

#[tokio::test]
async fn test_bad_credentials_rejected() {
    let server = MockServer::start().await;
    let mut config = server.config();
    config.client_secret = String::new();

    let err = get_auth_token(&config).await.unwrap_err();
    assert!(matches!(err, FiniteStateError::Transport { status_code: 401, .. }));

    server.shutdown().await;
}

#[tokio::test]
async fn test_cached_token_survives_server_shutdown() {
    let server = MockServer::start().await;
    let config = server.config();
    let root = tempfile::tempdir().unwrap();

    let auth = AuthClient::new(&config).unwrap();
    let mut cache = TokenCache::with_root(root.path(), &config.organization_context, Some(&config.client_id));
    let first = cache.get_token(&auth).await.unwrap();

    server.shutdown().await;

    // A fresh cache reads the file instead of calling the dead endpoint.
    let mut reopened = TokenCache::with_root(root.path(), &config.organization_context, Some(&config.client_id));
    assert_eq!(reopened.get_token(&auth).await.unwrap(), first);
}

#[tokio::test]
async fn test_required_token_enforced() {
    let server = MockServer::with_state(
        Fixtures::default_scenario().with_required_token("mock-token-test-client"),
    )
    .await;

    let client = client_for(&server).await;
    let assets = Asset::list_all(&client, &Default::default()).await.unwrap();
    assert_eq!(assets.len(), 1);

    server.shutdown().await;
}

// =============================================================================
// Findings Workflow
// =============================================================================

#[tokio::test]
async fn test_findings_filter_and_count() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let all = FindingQuery {
        asset_version_id: Some("av-1".into()),
        ..Default::default()
    };
    assert_eq!(count_findings(&client, &all).await.unwrap(), 3);

    let cves = FindingQuery {
        categories: vec!["CVE".into()],
        ..all.clone()
    };
    assert_eq!(get_findings(&client, &cves).await.unwrap().len(), 2);

    let critical = FindingQuery {
        severity: Some(Severity::Critical),
        ..all.clone()
    };
    let findings = get_findings(&client, &critical).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].id, "f-1");

    server.shutdown().await;
}

#[tokio::test]
async fn test_triage_updates_status() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let update = FindingStatusUpdate {
        user_id: "u-1".into(),
        finding_ids: vec!["f-2".into(), "f-missing".into()],
        status: FindingStatus::Affected,
        justification: None,
        response: None,
        comment: Some("patch scheduled".into()),
    };
    let updated = update_finding_statuses(&client, &update).await.unwrap();
    assert_eq!(updated, ["f-2"]);

    let affected = FindingQuery {
        status: Some(FindingStatus::Affected),
        ..Default::default()
    };
    let findings = get_findings(&client, &affected).await.unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].status(), Some("AFFECTED"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_findings_paginate_across_pages() {
    let mut state = MockState::new();
    for i in 0..250 {
        state.insert(
            "allFindings",
            Fixtures::finding(&format!("f-{i}"), "av-9", "LOW", "CVE"),
        );
    }
    let server = MockServer::with_state(state).await;
    let client = client_for(&server).await;

    let query = FindingQuery {
        asset_version_id: Some("av-9".into()),
        ..Default::default()
    };
    let findings = get_findings(&client, &query).await.unwrap();
    assert_eq!(findings.len(), 250);
    assert_eq!(findings[249].id, "f-249");

    let limited = FindingQuery {
        limit: Some(120),
        ..query
    };
    assert_eq!(get_findings(&client, &limited).await.unwrap().len(), 120);

    server.shutdown().await;
}

// =============================================================================
// SBOM Search
// =============================================================================

#[tokio::test]
async fn test_search_sbom_exact_and_contains() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let exact = SbomSearch {
        name: "OpenSSL".into(),
        ..Default::default()
    };
    let matches = search_sbom(&client, &exact).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "c-1");

    let case_sensitive = SbomSearch {
        case_sensitive: true,
        ..exact
    };
    assert!(search_sbom(&client, &case_sensitive).await.unwrap().is_empty());

    let contains = SbomSearch {
        name: "box".into(),
        method: SearchMethod::Contains,
        asset_version_id: Some("av-1".into()),
        ..Default::default()
    };
    let matches = search_sbom(&client, &contains).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "busybox");

    server.shutdown().await;
}

// =============================================================================
// Exports
// =============================================================================

#[tokio::test]
async fn test_download_sbom_and_reports() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let sbom = dir.path().join("sbom.json");
    download_sbom(&client, SbomType::CycloneDx, SbomSubtype::SbomOnly, "av-1", &sbom, &fast_policy())
        .await
        .unwrap();
    let contents: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&sbom).unwrap()).unwrap();
    assert_eq!(contents["bomFormat"], "CycloneDX");

    let csv = dir.path().join("findings.csv");
    download_asset_version_report(
        &client,
        "av-1",
        ReportType::Csv,
        ReportSubtype::AllFindings,
        &csv,
        &fast_policy(),
    )
    .await
    .unwrap();
    assert!(std::fs::read_to_string(&csv).unwrap().starts_with("id,title,severity"));

    let pdf = dir.path().join("summary.pdf");
    download_product_report(
        &client,
        "p-1",
        ReportType::Pdf,
        ReportSubtype::RiskSummary,
        &pdf,
        &fast_policy(),
    )
    .await
    .unwrap();
    assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));

    server.shutdown().await;
}

#[tokio::test]
async fn test_failed_export_reported() {
    let server = MockServer::with_state(Fixtures::default_scenario().with_export_outcome("FAILED")).await;
    let client = client_for(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("sbom.json");

    let err = download_sbom(&client, SbomType::Spdx, SbomSubtype::SbomOnly, "av-1", &output, &fast_policy())
        .await
        .unwrap_err();

    assert!(matches!(err, FiniteStateError::ExportFailed { .. }));
    assert!(!output.exists());

    server.shutdown().await;
}

#[tokio::test]
async fn test_slow_export_times_out() {
    let server = MockServer::with_state(Fixtures::default_scenario().with_polls_until_ready(50)).await;
    let client = client_for(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let policy = PollPolicy::every(Duration::from_millis(5)).with_max_attempts(3);
    let err = download_sbom(
        &client,
        SbomType::CycloneDx,
        SbomSubtype::SbomOnly,
        "av-1",
        dir.path().join("sbom.json"),
        &policy,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FiniteStateError::ExportTimeout { attempts: 3, .. }));

    server.shutdown().await;
}

// =============================================================================
// Upload Workflows
// =============================================================================

#[tokio::test]
async fn test_upload_binary_creates_entities_and_object() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let len = 2 * MIN_CHUNK_SIZE as usize + 100;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&vec![0xAB; len]).unwrap();

    let target = NewAssetVersion::new("a-1", "2.0");
    let key = create_new_asset_version_and_upload_binary(&client, &target, file.path(), MIN_CHUNK_SIZE, true)
        .await
        .unwrap();

    let versions = AssetVersion::list_all(
        &client,
        &AssetVersionQuery {
            asset_id: Some("a-1".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(versions.iter().any(|v| v.name == "2.0"));

    let state = server.state();
    let state = state.read().await;
    assert_eq!(state.objects[&key].len(), len);
    assert_eq!(state.processed.len(), 1);

    let test = &state.records["tests"][0];
    assert_eq!(test["name"], "Router 2.0 - Finite State Binary Analysis");
    assert_eq!(test["testResultFileFormat"], "finite_state_binary_analysis");
    assert_eq!(state.processed[0].1, test["id"].as_str().unwrap());

    let artifact_names: Vec<&str> = state.records["allAssets"]
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(artifact_names.contains(&"Router 2.0 - Firmware Binary"));

    drop(state);
    server.shutdown().await;
}

#[tokio::test]
async fn test_upload_results_uses_single_part() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(br#"{"bomFormat":"CycloneDX","components":[]}"#).unwrap();

    let target = NewAssetVersion {
        artifact_description: Some("Vendor SBOM".into()),
        ..NewAssetVersion::new("a-1", "2.1")
    };
    let key = create_new_asset_version_and_upload_test_results(
        &client,
        &target,
        &TestType::CycloneDx,
        file.path(),
    )
    .await
    .unwrap();

    let state = server.state();
    let state = state.read().await;
    assert!(state.uploads.is_empty());
    assert!(state.objects[&key].starts_with(b"{\"bomFormat\""));
    assert_eq!(state.records["tests"][0]["name"], "Router 2.1 - cyclonedx");

    drop(state);
    server.shutdown().await;
}

#[tokio::test]
async fn test_upload_to_unknown_asset_creates_nothing() {
    let server = MockServer::start().await;
    let client = client_for(&server).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"scan results").unwrap();

    let err = create_new_asset_version_and_upload_test_results(
        &client,
        &NewAssetVersion::new("a-404", "1.0"),
        &TestType::from("sarif"),
        file.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, FiniteStateError::NotFound { .. }));
    let state = server.state();
    assert!(!state.read().await.records.contains_key("tests"));

    server.shutdown().await;
}
