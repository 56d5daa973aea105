//! Finding model, filters and status updates.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::graphql::GraphQlRequest;
use crate::models::common::UserRef;
use crate::pagination::validate_limit;
use crate::traits::List;

/// A security finding on an asset version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Identifier assigned by the detecting tool, e.g. a CVE ID.
    #[serde(default)]
    pub vuln_id_from_tool: Option<String>,

    #[serde(default)]
    pub severity: Option<String>,

    #[serde(default)]
    pub risk_score: Option<f64>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub subcategory: Option<String>,

    #[serde(default)]
    pub regression: Option<bool>,

    #[serde(default)]
    pub origin: Option<String>,

    /// Components this finding affects.
    #[serde(default)]
    pub affects: Vec<AffectedComponent>,

    #[serde(default)]
    pub current_status: Option<StatusRecord>,

    #[serde(default)]
    pub cwes: Vec<Cwe>,

    #[serde(default)]
    pub cves: Vec<Cve>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffectedComponent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

/// The latest triage decision on a finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub justification: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cwe {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub cwe_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cve {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub cve_id: Option<String>,
    #[serde(default)]
    pub epss: Option<Epss>,
    /// Exploit intelligence as reported by the platform.
    #[serde(default)]
    pub exploits_info: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epss {
    #[serde(default)]
    pub epss_percentile: Option<f64>,
    #[serde(default)]
    pub epss_score: Option<f64>,
}

impl Finding {
    /// Current triage status, if one has been set.
    pub fn status(&self) -> Option<&str> {
        self.current_status.as_ref().and_then(|s| s.status.as_deref())
    }
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FiniteStateError;

            fn from_str(s: &str) -> Result<Self> {
                match s.to_ascii_uppercase().as_str() {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err(FiniteStateError::validation(format!(
                        "unknown {}: {s}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

wire_enum!(
    /// Triage status of a finding.
    FindingStatus {
        Affected => "AFFECTED",
        Fixed => "FIXED",
        NotAffected => "NOT_AFFECTED",
        UnderInvestigation => "UNDER_INVESTIGATION",
    }
);

wire_enum!(
    /// Why a finding is `NOT_AFFECTED`.
    Justification {
        ComponentNotPresent => "COMPONENT_NOT_PRESENT",
        InlineMitigationsAlreadyExist => "INLINE_MITIGATIONS_ALREADY_EXIST",
        VulnerableCodeCannotBeControlledByAdversary => "VULNERABLE_CODE_CANNOT_BE_CONTROLLED_BY_ADVERSARY",
        VulnerableCodeNotInExecutePath => "VULNERABLE_CODE_NOT_IN_EXECUTE_PATH",
        VulnerableCodeNotPresent => "VULNERABLE_CODE_NOT_PRESENT",
    }
);

wire_enum!(
    /// What the vendor will do about an `AFFECTED` finding.
    VendorResponse {
        CannotFix => "CANNOT_FIX",
        RollbackRequired => "ROLLBACK_REQUIRED",
        UpdateRequired => "UPDATE_REQUIRED",
        WillNotFix => "WILL_NOT_FIX",
        WorkaroundAvailable => "WORKAROUND_AVAILABLE",
    }
);

wire_enum!(
    /// Finding severity.
    Severity {
        Critical => "CRITICAL",
        High => "HIGH",
        Medium => "MEDIUM",
        Low => "LOW",
        Info => "INFO",
        Unknown => "UNKNOWN",
    }
);

/// Filter parameters for listing and counting findings.
#[derive(Debug, Clone, Default)]
pub struct FindingQuery {
    pub asset_version_id: Option<String>,
    pub finding_id: Option<String>,
    /// Categories such as `CVE`, `CREDENTIALS`, `SAST_ANALYSIS`.
    pub categories: Vec<String>,
    pub status: Option<FindingStatus>,
    pub severity: Option<Severity>,
    /// Return at most this many findings (1 to 1000).
    pub limit: Option<usize>,
}

impl FindingQuery {
    fn filter(&self) -> Value {
        let mut filter = json!({
            "mergedFindingRefId": null,
            "deletedAt": null,
        });
        if let Some(id) = &self.asset_version_id {
            filter["assetVersionRefId"] = json!(id);
        }
        if let Some(id) = &self.finding_id {
            filter["id"] = json!(id);
        }
        if !self.categories.is_empty() {
            filter["category_in"] = json!(self.categories);
        }
        if let Some(severity) = self.severity {
            filter["severity"] = json!(severity);
        }
        if let Some(status) = self.status {
            filter["currentStatus"] = json!({ "status_in": [status] });
        }
        filter
    }
}

impl List for Finding {
    type Query = FindingQuery;
    const FIELD: &'static str = "allFindings";
    const QUERY: &'static str = r#"
query GetFindings($filter: FindingFilter, $after: String, $first: Int, $orderBy: [FindingOrderBy!]) {
    allFindings(filter: $filter, after: $after, first: $first, orderBy: $orderBy) {
        _cursor
        id
        title
        date
        createdAt
        updatedAt
        vulnIdFromTool
        description
        severity
        riskScore
        affects {
            id
            name
            version
        }
        category
        subcategory
        regression
        currentStatus {
            id
            status
            justification
            comment
            createdBy {
                id
                email
            }
            updatedAt
        }
        cwes {
            id
            cweId
            name
        }
        cves {
            id
            cveId
            epss {
                epssPercentile
                epssScore
            }
            exploitsInfo {
                exploitProofOfConcept
                reportedInTheWild
                weaponized
                exploitedByNamedThreatActors
                exploitedByBotnets
                exploitedByRansomware
            }
        }
        origin
    }
}
"#;

    fn variables(query: &FindingQuery) -> Map<String, Value> {
        let mut variables = Map::new();
        variables.insert("filter".into(), query.filter());
        variables.insert("orderBy".into(), json!(["title_ASC"]));
        variables
    }

    fn limit(query: &FindingQuery) -> Option<usize> {
        query.limit
    }
}

const FINDINGS_COUNT_QUERY: &str = r#"
query GetFindingsCount($filter: FindingFilter) {
    _allFindingsMeta(filter: $filter) {
        count
    }
}
"#;

/// Fetch findings matching `query`.
///
/// # Errors
///
/// Returns [`FiniteStateError::Validation`] if `query.limit` is outside
/// `[1, 1000]`; no request is made in that case.
pub async fn get_findings(client: &FiniteStateClient, query: &FindingQuery) -> Result<Vec<Finding>> {
    validate_limit(query.limit)?;
    Finding::list_all(client, query).await
}

/// Count findings matching `query` without fetching them.
pub async fn count_findings(client: &FiniteStateClient, query: &FindingQuery) -> Result<u64> {
    #[derive(Deserialize)]
    struct Meta {
        count: u64,
    }
    #[derive(Deserialize)]
    struct Response {
        #[serde(rename = "_allFindingsMeta")]
        meta: Meta,
    }

    let request = GraphQlRequest::new(FINDINGS_COUNT_QUERY, json!({ "filter": query.filter() }));
    let response: Response = client.query(&request).await?;
    Ok(response.meta.count)
}

const UPDATE_FINDING_STATUSES: &str = r#"
mutation UpdateFindingsStatuses($ids: [ID!]!, $updateStatusInput: UpdateFindingStatusesInput!) {
    updateFindingsStatuses(ids: $ids, updateStatusInput: $updateStatusInput) {
        ids
    }
}
"#;

/// A triage decision to apply to one or more findings.
#[derive(Debug, Clone)]
pub struct FindingStatusUpdate {
    /// User recorded as making the change.
    pub user_id: String,
    pub finding_ids: Vec<String>,
    pub status: FindingStatus,
    /// Only meaningful with [`FindingStatus::NotAffected`].
    pub justification: Option<Justification>,
    /// Only meaningful with [`FindingStatus::Affected`].
    pub response: Option<VendorResponse>,
    pub comment: Option<String>,
}

impl FindingStatusUpdate {
    fn variables(&self) -> Result<Value> {
        if self.user_id.is_empty() {
            return Err(FiniteStateError::validation("user ID is required"));
        }
        if self.finding_ids.is_empty() {
            return Err(FiniteStateError::validation("at least one finding ID is required"));
        }

        let mut input = json!({
            "status": self.status,
            "updatedBy": self.user_id,
        });
        if let Some(justification) = self.justification {
            input["justification"] = json!(justification);
        }
        if let Some(response) = self.response {
            input["responses"] = json!([response]);
        }
        if let Some(comment) = &self.comment {
            input["comment"] = json!(comment);
        }

        Ok(json!({
            "ids": self.finding_ids,
            "updateStatusInput": input,
        }))
    }
}

/// Apply a status update and return the IDs the server changed.
///
/// # Errors
///
/// Returns [`FiniteStateError::Validation`] for a missing user or empty
/// finding list.
#[tracing::instrument(skip(client, update), fields(count = update.finding_ids.len(), status = %update.status))]
pub async fn update_finding_statuses(
    client: &FiniteStateClient,
    update: &FindingStatusUpdate,
) -> Result<Vec<String>> {
    #[derive(Deserialize)]
    struct Updated {
        #[serde(default)]
        ids: Vec<String>,
    }
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Response {
        update_findings_statuses: Updated,
    }

    let request = GraphQlRequest::new(UPDATE_FINDING_STATUSES, update.variables()?);
    let response: Response = client.query(&request).await?;
    Ok(response.update_findings_statuses.ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_filter() {
        let query = FindingQuery {
            asset_version_id: Some("av-1".into()),
            categories: vec!["CVE".into()],
            status: Some(FindingStatus::UnderInvestigation),
            severity: Some(Severity::High),
            ..Default::default()
        };
        let filter = query.filter();
        assert_eq!(filter["assetVersionRefId"], "av-1");
        assert_eq!(filter["category_in"], json!(["CVE"]));
        assert_eq!(filter["severity"], "HIGH");
        assert_eq!(filter["currentStatus"]["status_in"], json!(["UNDER_INVESTIGATION"]));
        assert!(filter["mergedFindingRefId"].is_null());
    }

    #[test]
    fn test_status_update_variables() {
        let update = FindingStatusUpdate {
            user_id: "u-1".into(),
            finding_ids: vec!["f-1".into(), "f-2".into()],
            status: FindingStatus::NotAffected,
            justification: Some(Justification::ComponentNotPresent),
            response: None,
            comment: Some("not shipped".into()),
        };
        let vars = update.variables().unwrap();
        assert_eq!(vars["ids"], json!(["f-1", "f-2"]));
        assert_eq!(vars["updateStatusInput"]["status"], "NOT_AFFECTED");
        assert_eq!(
            vars["updateStatusInput"]["justification"],
            "COMPONENT_NOT_PRESENT"
        );
        assert!(vars["updateStatusInput"].get("responses").is_none());
    }

    #[test]
    fn test_status_update_requires_ids() {
        let update = FindingStatusUpdate {
            user_id: "u-1".into(),
            finding_ids: vec![],
            status: FindingStatus::Fixed,
            justification: None,
            response: None,
            comment: None,
        };
        assert!(matches!(update.variables(), Err(FiniteStateError::Validation(_))));
    }

    #[test]
    fn test_parse_wire_enums() {
        assert_eq!("not_affected".parse::<FindingStatus>().unwrap(), FindingStatus::NotAffected);
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!(
            "WILL_NOT_FIX".parse::<VendorResponse>().unwrap(),
            VendorResponse::WillNotFix
        );
        assert!("BOGUS".parse::<FindingStatus>().is_err());
    }

    #[test]
    fn test_finding_deserialize() {
        let finding: Finding = serde_json::from_value(json!({
            "_cursor": "c",
            "id": "f-1",
            "title": "CVE-2023-0001",
            "severity": "HIGH",
            "riskScore": 7.5,
            "affects": [{"id": "sc-1", "name": "openssl", "version": "1.1.1"}],
            "currentStatus": {"status": "AFFECTED"},
            "cves": [{"cveId": "CVE-2023-0001", "epss": {"epssScore": 0.2}}]
        }))
        .unwrap();
        assert_eq!(finding.status(), Some("AFFECTED"));
        assert_eq!(finding.cves[0].cve_id.as_deref(), Some("CVE-2023-0001"));
    }
}
