//! Test model and creation.
//!
//! A test is the container an uploaded file is attached to: a binary for
//! Finite State Binary Analysis, or the output of a third-party scanner.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::common::{Context, EntityRef, UserRef};
use crate::traits::{require, Create};

/// How the test results reach the platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadMethod {
    WebAppUi,
    #[default]
    Api,
    GithubIntegration,
    AzureDevopsIntegration,
}

/// The file format a test expects.
///
/// Binary analysis and CycloneDX have dedicated variants. Any other
/// scanner format is passed through by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestType {
    BinaryAnalysis,
    CycloneDx,
    ThirdParty(String),
}

impl TestType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::BinaryAnalysis => "finite_state_binary_analysis",
            Self::CycloneDx => "cyclonedx",
            Self::ThirdParty(name) => name,
        }
    }

    /// Tool entries recorded on the test.
    pub fn tools(&self) -> Vec<Tool> {
        match self {
            Self::BinaryAnalysis => vec![Tool::binary_analysis()],
            _ => Vec::new(),
        }
    }
}

impl From<&str> for TestType {
    fn from(s: &str) -> Self {
        match s {
            "finite_state_binary_analysis" => Self::BinaryAnalysis,
            "cyclonedx" => Self::CycloneDx,
            other => Self::ThirdParty(other.to_string()),
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tool that produced test results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
}

impl Tool {
    pub fn binary_analysis() -> Self {
        Self {
            name: "Finite State Binary Analysis".to_string(),
            description: "SBOM and Vulnerability Analysis from Finite State Binary SCA and Binary SAST."
                .to_string(),
        }
    }
}

/// A test created to receive an upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artifact_under_test: Option<EntityRef>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default)]
    pub ctx: Option<Context>,
    #[serde(default)]
    pub upload_method: Option<UploadMethod>,
}

/// Parameters for creating a test.
#[derive(Debug, Clone)]
pub struct CreateTestParams {
    pub business_unit_id: String,
    pub created_by_user_id: String,
    pub asset_id: String,
    pub artifact_id: String,
    pub name: String,
    pub product_ids: Vec<String>,
    pub test_type: TestType,
    pub upload_method: UploadMethod,
}

impl Create for Test {
    type Params = CreateTestParams;
    const FIELD: &'static str = "createTest";
    const MUTATION: &'static str = r#"
mutation CreateTest($input: CreateTestInput!) {
    createTest(input: $input) {
        id
        name
        artifactUnderTest {
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
        uploadMethod
    }
}
"#;

    fn variables(params: &CreateTestParams) -> Result<Value> {
        require(&params.business_unit_id, "business unit ID")?;
        require(&params.created_by_user_id, "created by user ID")?;
        require(&params.asset_id, "asset ID")?;
        require(&params.artifact_id, "artifact ID")?;
        require(&params.name, "test name")?;
        require(params.test_type.as_str(), "test type")?;

        let mut input = json!({
            "name": params.name,
            "createdBy": params.created_by_user_id,
            "artifactUnderTest": params.artifact_id,
            "testResultFileFormat": params.test_type.as_str(),
            "ctx": {
                "asset": params.asset_id,
                "businessUnits": [params.business_unit_id]
            },
            "tools": params.test_type.tools(),
            "uploadMethod": params.upload_method,
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

    fn params(test_type: TestType) -> CreateTestParams {
        CreateTestParams {
            business_unit_id: "bu-1".into(),
            created_by_user_id: "u-1".into(),
            asset_id: "a-1".into(),
            artifact_id: "art-1".into(),
            name: "Router 1.0 - Finite State Binary Analysis".into(),
            product_ids: vec!["p-1".into()],
            test_type,
            upload_method: UploadMethod::default(),
        }
    }

    #[test]
    fn test_binary_analysis_carries_tool() {
        let vars = Test::variables(&params(TestType::BinaryAnalysis)).unwrap();
        let input = &vars["input"];
        assert_eq!(input["testResultFileFormat"], "finite_state_binary_analysis");
        assert_eq!(input["tools"][0]["name"], "Finite State Binary Analysis");
        assert_eq!(input["uploadMethod"], "API");
        assert_eq!(input["ctx"]["products"], json!(["p-1"]));
    }

    #[test]
    fn test_third_party_has_no_tools() {
        let vars = Test::variables(&params(TestType::from("sarif"))).unwrap();
        assert_eq!(vars["input"]["testResultFileFormat"], "sarif");
        assert_eq!(vars["input"]["tools"], json!([]));
    }

    #[test]
    fn test_empty_third_party_type_rejected() {
        assert!(Test::variables(&params(TestType::ThirdParty(String::new()))).is_err());
    }

    #[test]
    fn test_upload_method_wire_names() {
        assert_eq!(
            serde_json::to_value(UploadMethod::AzureDevopsIntegration).unwrap(),
            "AZURE_DEVOPS_INTEGRATION"
        );
        assert_eq!(serde_json::to_value(UploadMethod::WebAppUi).unwrap(), "WEB_APP_UI");
    }
}
