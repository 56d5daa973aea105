//! Multi-step upload workflows.
//!
//! Each workflow creates a fresh asset version on an existing asset, an
//! artifact and a test under it, then hands the test to an uploader.

use std::path::Path;

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::models::{
    Artifact, Asset, CreateArtifactParams, CreateAssetVersionParams, CreateTestParams,
    CreatedAssetVersion, Test, TestType, UploadMethod,
};
use crate::traits::{require, Create, Get};
use crate::upload;

/// Where and how to create the entities for an upload.
#[derive(Debug, Clone, Default)]
pub struct NewAssetVersion {
    pub asset_id: String,
    /// Name of the new asset version.
    pub version: String,
    /// Defaults to the asset's business unit.
    pub business_unit_id: Option<String>,
    /// Defaults to the asset's creator.
    pub created_by_user_id: Option<String>,
    /// Added to the asset's products when set.
    pub product_id: Option<String>,
    /// Appended to the artifact name.
    pub artifact_description: Option<String>,
    pub upload_method: UploadMethod,
}

impl NewAssetVersion {
    pub fn new(asset_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<()> {
        require(&self.asset_id, "asset ID")?;
        require(&self.version, "version")
    }
}

/// Create an asset version, artifact and test ready to receive a file.
///
/// Returns the new test ID.
///
/// # Errors
///
/// * [`FiniteStateError::Validation`] if the asset ID, version or test type
///   is empty, or the business unit or creator is neither given nor known
///   from the asset
/// * [`FiniteStateError::NotFound`] if the asset does not exist
#[tracing::instrument(skip(client, target), fields(asset_id = %target.asset_id, version = %target.version))]
pub async fn create_new_asset_version_artifact_and_test_for_upload(
    client: &FiniteStateClient,
    target: &NewAssetVersion,
    test_type: &TestType,
) -> Result<String> {
    target.validate()?;
    require(test_type.as_str(), "test type")?;

    let asset = Asset::get(client, &target.asset_id).await?;

    let mut product_ids = asset.product_ids().to_vec();
    if let Some(product_id) = &target.product_id {
        if !product_ids.contains(product_id) {
            product_ids.push(product_id.clone());
        }
    }

    let business_unit_id = target
        .business_unit_id
        .clone()
        .or_else(|| asset.business_unit_id().map(str::to_string))
        .ok_or_else(|| {
            FiniteStateError::validation(
                "business unit ID is required and could not be read from the asset",
            )
        })?;
    let created_by_user_id = target
        .created_by_user_id
        .clone()
        .or_else(|| asset.created_by_id().map(str::to_string))
        .ok_or_else(|| {
            FiniteStateError::validation(
                "created by user ID is required and could not be read from the asset",
            )
        })?;

    let created = CreatedAssetVersion::create(
        client,
        &CreateAssetVersionParams {
            asset_id: target.asset_id.clone(),
            name: target.version.clone(),
            created_by_user_id: Some(created_by_user_id.clone()),
            product_id: target.product_id.clone(),
        },
    )
    .await?;
    let asset_version_id = created.asset_version.id;
    tracing::debug!("Created asset version {}", asset_version_id);

    let description = target.artifact_description.as_deref().unwrap_or(match test_type {
        TestType::BinaryAnalysis => "Binary",
        _ => "Unspecified Artifact",
    });
    let artifact = Artifact::create(
        client,
        &CreateArtifactParams {
            business_unit_id: business_unit_id.clone(),
            created_by_user_id: created_by_user_id.clone(),
            asset_version_id,
            name: format!("{} {} - {}", asset.name, target.version, description),
            product_ids: product_ids.clone(),
        },
    )
    .await?;

    let test_name = match test_type {
        TestType::BinaryAnalysis => {
            format!("{} {} - Finite State Binary Analysis", asset.name, target.version)
        }
        other => format!("{} {} - {}", asset.name, target.version, other),
    };
    let test = Test::create(
        client,
        &CreateTestParams {
            business_unit_id,
            created_by_user_id,
            asset_id: target.asset_id.clone(),
            artifact_id: artifact.id,
            name: test_name,
            product_ids,
            test_type: test_type.clone(),
            upload_method: target.upload_method,
        },
    )
    .await?;

    tracing::info!("Created test {} on asset {}", test.id, target.asset_id);
    Ok(test.id)
}

/// Create a new asset version and upload a binary to it for analysis.
///
/// The artifact description defaults to `Firmware Binary`. Returns the
/// key reported by the processing launch.
///
/// # Errors
///
/// Same as [`create_new_asset_version_artifact_and_test_for_upload`] and
/// [`upload::upload_file_for_binary_analysis`]. The chunk size is checked
/// before anything is created.
pub async fn create_new_asset_version_and_upload_binary(
    client: &FiniteStateClient,
    target: &NewAssetVersion,
    path: impl AsRef<Path>,
    chunk_size: u64,
    quick_scan: bool,
) -> Result<String> {
    target.validate()?;
    upload::ChunkSize::new(chunk_size)?;

    let mut target = target.clone();
    target
        .artifact_description
        .get_or_insert_with(|| "Firmware Binary".to_string());

    let test_id =
        create_new_asset_version_artifact_and_test_for_upload(client, &target, &TestType::BinaryAnalysis)
            .await?;
    upload::upload_file_for_binary_analysis(client, &test_id, path, chunk_size, quick_scan).await
}

/// Create a new asset version and upload third-party scanner results to it.
///
/// Returns the key reported by the processing launch.
///
/// # Errors
///
/// Same as [`create_new_asset_version_artifact_and_test_for_upload`] and
/// [`upload::upload_test_results_file`].
pub async fn create_new_asset_version_and_upload_test_results(
    client: &FiniteStateClient,
    target: &NewAssetVersion,
    test_type: &TestType,
    path: impl AsRef<Path>,
) -> Result<String> {
    let test_id = create_new_asset_version_artifact_and_test_for_upload(client, target, test_type).await?;
    upload::upload_test_results_file(client, &test_id, path).await
}
