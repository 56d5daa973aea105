//! Mock server state management.
//!
//! Provides the in-memory data store for the mock Finite State server.
//! Records are kept in their wire shape, grouped by the GraphQL list field
//! that serves them (`allAssets`, `allFindings`, ...).

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::sync::RwLock;

/// Progress of a launched export job.
#[derive(Debug, Clone)]
pub struct MockExport {
    /// Which launch field created the job.
    pub kind: String,
    /// Status polls answered so far.
    pub polls: u32,
    /// Final status once polling is done, `COMPLETED` unless overridden.
    pub final_status: String,
}

/// An open multipart upload.
#[derive(Debug, Clone, Default)]
pub struct MockUpload {
    pub test_id: String,
    pub key: String,
    /// Part bytes by part number.
    pub parts: BTreeMap<u32, Vec<u8>>,
}

/// Shared state for the mock server.
///
/// It's wrapped in `Arc<RwLock<_>>` for concurrent access.
#[derive(Debug, Default)]
pub struct MockState {
    /// Records indexed by list field.
    pub records: HashMap<String, Vec<Value>>,

    /// Export jobs by ID.
    pub exports: HashMap<String, MockExport>,

    /// Multipart uploads by upload ID.
    pub uploads: HashMap<String, MockUpload>,

    /// Uploaded objects by key.
    pub objects: HashMap<String, Vec<u8>>,

    /// `(key, test ID)` pairs for every processing launch.
    pub processed: Vec<(String, String)>,

    /// Number of `RUNNING` answers an export gives before finishing.
    pub polls_until_ready: u32,

    /// Status export jobs end in.
    pub export_outcome: String,

    /// Optional authentication token. If set, GraphQL requests must carry it.
    pub required_token: Option<String>,

    /// Base URL used to build presigned links.
    pub base_url: String,

    next_id: u64,
}

impl MockState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self {
            polls_until_ready: 1,
            export_outcome: "COMPLETED".to_string(),
            ..Self::default()
        }
    }

    /// Create state wrapped in Arc<RwLock> for sharing.
    pub fn shared(self) -> Arc<RwLock<Self>> {
        Arc::new(RwLock::new(self))
    }

    /// Add a record served by a list field.
    pub fn with_record(mut self, field: &str, record: Value) -> Self {
        self.insert(field, record);
        self
    }

    /// Set the required authentication token.
    pub fn with_required_token(mut self, token: &str) -> Self {
        self.required_token = Some(token.to_string());
        self
    }

    /// Make exports report `RUNNING` this many times before finishing.
    pub fn with_polls_until_ready(mut self, polls: u32) -> Self {
        self.polls_until_ready = polls;
        self
    }

    /// Make exports end in `status` instead of `COMPLETED`.
    pub fn with_export_outcome(mut self, status: &str) -> Self {
        self.export_outcome = status.to_string();
        self
    }

    /// Store a record under a list field.
    pub fn insert(&mut self, field: &str, record: Value) {
        self.records.entry(field.to_string()).or_default().push(record);
    }

    /// Mint a new ID with the given prefix.
    pub fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    /// Records under `field` matching a GraphQL filter object.
    pub fn list(&self, field: &str, filter: Option<&Map<String, Value>>) -> Vec<&Value> {
        self.records
            .get(field)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| filter.map_or(true, |f| matches_filter(r, f)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find a record by ID under `field`.
    pub fn find_mut(&mut self, field: &str, id: &str) -> Option<&mut Value> {
        self.records
            .get_mut(field)?
            .iter_mut()
            .find(|r| r["id"] == id)
    }

    /// Start an export job and return its ID.
    pub fn launch_export(&mut self, kind: &str) -> String {
        let id = self.next_id("export");
        self.exports.insert(
            id.clone(),
            MockExport {
                kind: kind.to_string(),
                polls: 0,
                final_status: self.export_outcome.clone(),
            },
        );
        id
    }

    /// Answer one status poll: `(status, download link)`.
    pub fn poll_export(&mut self, id: &str) -> Option<(String, Option<String>)> {
        let base_url = self.base_url.clone();
        let ready_after = self.polls_until_ready;
        let export = self.exports.get_mut(id)?;
        export.polls += 1;

        if export.polls <= ready_after {
            return Some(("RUNNING".to_string(), None));
        }
        let link = (export.final_status == "COMPLETED").then(|| format!("{base_url}/download/{id}"));
        Some((export.final_status.clone(), link))
    }

    /// Open a multipart upload: `(upload ID, key)`.
    pub fn start_upload(&mut self, test_id: &str) -> (String, String) {
        let upload_id = self.next_id("upload");
        let key = format!("uploads/{test_id}/{upload_id}");
        self.uploads.insert(
            upload_id.clone(),
            MockUpload {
                test_id: test_id.to_string(),
                key: key.clone(),
                parts: BTreeMap::new(),
            },
        );
        (upload_id, key)
    }

    /// Join the listed parts in order into one object.
    ///
    /// Returns `None` if the upload is unknown or a part was never `PUT`.
    pub fn complete_upload(&mut self, upload_id: &str, part_numbers: &[u32]) -> Option<String> {
        let upload = self.uploads.remove(upload_id)?;
        let mut object = Vec::new();
        for number in part_numbers {
            object.extend_from_slice(upload.parts.get(number)?);
        }
        self.objects.insert(upload.key.clone(), object);
        Some(upload.key)
    }

    /// Record a triage status on findings and return the IDs changed.
    pub fn update_finding_statuses(&mut self, ids: &[String], input: &Value) -> Vec<String> {
        let mut updated = Vec::new();
        for id in ids {
            let status_id = self.next_id("status");
            if let Some(finding) = self.find_mut("allFindings", id) {
                finding["currentStatus"] = json!({
                    "id": status_id,
                    "status": input["status"],
                    "justification": input.get("justification").cloned().unwrap_or(Value::Null),
                    "comment": input.get("comment").cloned().unwrap_or(Value::Null),
                    "createdBy": {"id": input["updatedBy"]},
                });
                updated.push(id.clone());
            }
        }
        updated
    }
}

/// Apply a GraphQL filter object to a record.
///
/// Supports equality, nested objects, and the `_in`, `_contains` and
/// `_like` suffixes. A `null` filter value matches anything.
pub(crate) fn matches_filter(record: &Value, filter: &Map<String, Value>) -> bool {
    filter.iter().all(|(key, expected)| {
        if expected.is_null() {
            return true;
        }
        if let Some(base) = key.strip_suffix("_in") {
            return expected
                .as_array()
                .is_some_and(|options| options.contains(&record[base]));
        }
        if let Some(base) = key.strip_suffix("_contains") {
            return match (record[base].as_str(), expected.as_str()) {
                (Some(actual), Some(needle)) => actual.contains(needle),
                _ => false,
            };
        }
        if let Some(base) = key.strip_suffix("_like") {
            return match (record[base].as_str(), expected.as_str()) {
                (Some(actual), Some(pattern)) => actual.eq_ignore_ascii_case(pattern),
                _ => false,
            };
        }
        match expected {
            Value::Object(nested) => matches_filter(&record[key.as_str()], nested),
            _ => &record[key.as_str()] == expected,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_nested_and_suffixes() {
        let record = json!({
            "id": "f-1",
            "severity": "HIGH",
            "group": {"id": "bu-1"},
            "currentStatus": {"status": "AFFECTED"},
            "name": "OpenSSL",
        });

        let filter = |v: Value| v.as_object().cloned().unwrap();
        assert!(matches_filter(&record, &filter(json!({"group": {"id": "bu-1"}}))));
        assert!(!matches_filter(&record, &filter(json!({"group": {"id": "bu-2"}}))));
        assert!(matches_filter(
            &record,
            &filter(json!({"currentStatus": {"status_in": ["AFFECTED", "FIXED"]}}))
        ));
        assert!(matches_filter(&record, &filter(json!({"name_like": "openssl"}))));
        assert!(matches_filter(&record, &filter(json!({"name_contains": "SSL"}))));
        assert!(matches_filter(&record, &filter(json!({"deletedAt": null}))));
    }

    #[test]
    fn test_export_progresses_to_completed() {
        let mut state = MockState::new().with_polls_until_ready(2);
        state.base_url = "http://mock".to_string();
        let id = state.launch_export("launchCycloneDxExport");

        assert_eq!(state.poll_export(&id).unwrap().0, "RUNNING");
        assert_eq!(state.poll_export(&id).unwrap().0, "RUNNING");
        let (status, link) = state.poll_export(&id).unwrap();
        assert_eq!(status, "COMPLETED");
        assert_eq!(link.unwrap(), format!("http://mock/download/{id}"));
    }

    #[test]
    fn test_complete_upload_joins_parts_in_order() {
        let mut state = MockState::new();
        let (upload_id, key) = state.start_upload("t-1");
        let upload = state.uploads.get_mut(&upload_id).unwrap();
        upload.parts.insert(2, b"world".to_vec());
        upload.parts.insert(1, b"hello ".to_vec());

        assert_eq!(state.complete_upload(&upload_id, &[1, 2]).unwrap(), key);
        assert_eq!(state.objects[&key], b"hello world");
    }
}
