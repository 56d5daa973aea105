//! Report and SBOM exports.
//!
//! Exports run as server-side jobs. A launch mutation returns an
//! `exportJobId`, which is then polled until the job completes and a
//! presigned download link is available.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::Instant;

use crate::client::FiniteStateClient;
use crate::error::{FiniteStateError, Result};
use crate::graphql::GraphQlRequest;

const EXPORT_STATUS_QUERY: &str = r#"
query GenerateExportDownloadPresignedUrl($exportId: ID!) {
  generateExportDownloadPresignedUrl(exportId: $exportId) {
    downloadLink
    status
  }
}
"#;

const LAUNCH_ARTIFACT_CSV: &str = r#"
mutation LaunchArtifactCSVExport($artifactCsvSubtype: ArtifactCSVExportSubtype!, $assetVersionId: ID!) {
  launchArtifactCSVExport(artifactCsvSubtype: $artifactCsvSubtype, assetVersionId: $assetVersionId) {
    exportJobId
  }
}
"#;

const LAUNCH_ARTIFACT_PDF: &str = r#"
mutation LaunchArtifactPdfExport($artifactPdfSubtype: ArtifactPdfExportSubtype!, $assetVersionId: ID!) {
  launchArtifactPdfExport(artifactPdfSubtype: $artifactPdfSubtype, assetVersionId: $assetVersionId) {
    exportJobId
  }
}
"#;

const LAUNCH_PRODUCT_CSV: &str = r#"
mutation LaunchProductCSVExport($productCsvSubtype: ProductCSVExportSubtype!, $productId: ID!) {
  launchProductCSVExport(productCsvSubtype: $productCsvSubtype, productId: $productId) {
    exportJobId
  }
}
"#;

const LAUNCH_PRODUCT_PDF: &str = r#"
mutation LaunchProductPdfExport($productPdfSubtype: ProductPdfExportSubtype!, $productId: ID!) {
  launchProductPdfExport(productPdfSubtype: $productPdfSubtype, productId: $productId) {
    exportJobId
  }
}
"#;

const LAUNCH_CYCLONEDX: &str = r#"
mutation LaunchCycloneDxExport($cdxSubtype: CycloneDxExportSubtype!, $assetVersionId: ID!) {
  launchCycloneDxExport(cdxSubtype: $cdxSubtype, assetVersionId: $assetVersionId) {
    exportJobId
  }
}
"#;

const LAUNCH_SPDX: &str = r#"
mutation LaunchSpdxExport($spdxSubtype: SpdxExportSubtype!, $assetVersionId: ID!) {
  launchSpdxExport(spdxSubtype: $spdxSubtype, assetVersionId: $assetVersionId) {
    exportJobId
  }
}
"#;

/// What a report is generated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    /// A single asset version.
    AssetVersion(String),
    /// A product, across its asset versions.
    Product(String),
}

/// File format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportType {
    Csv,
    Pdf,
}

/// Report contents.
///
/// CSV reports support `ALL_FINDINGS`, `ALL_COMPONENTS` and
/// `EXPLOIT_INTELLIGENCE`. PDF reports support `RISK_SUMMARY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportSubtype {
    AllFindings,
    AllComponents,
    ExploitIntelligence,
    RiskSummary,
}

/// SBOM document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SbomType {
    CycloneDx,
    Spdx,
}

/// SBOM contents.
///
/// CycloneDX supports all three. SPDX supports `SBOM_ONLY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SbomSubtype {
    SbomOnly,
    SbomWithVdr,
    VdrOnly,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Pdf => "PDF",
        }
    }

    /// Subtypes this format can render.
    pub fn supported_subtypes(&self) -> &'static [ReportSubtype] {
        match self {
            Self::Csv => &[
                ReportSubtype::AllFindings,
                ReportSubtype::AllComponents,
                ReportSubtype::ExploitIntelligence,
            ],
            Self::Pdf => &[ReportSubtype::RiskSummary],
        }
    }
}

impl ReportSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllFindings => "ALL_FINDINGS",
            Self::AllComponents => "ALL_COMPONENTS",
            Self::ExploitIntelligence => "EXPLOIT_INTELLIGENCE",
            Self::RiskSummary => "RISK_SUMMARY",
        }
    }
}

impl SbomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CycloneDx => "CYCLONEDX",
            Self::Spdx => "SPDX",
        }
    }

    /// Subtypes this format can render.
    pub fn supported_subtypes(&self) -> &'static [SbomSubtype] {
        match self {
            Self::CycloneDx => &[
                SbomSubtype::SbomOnly,
                SbomSubtype::SbomWithVdr,
                SbomSubtype::VdrOnly,
            ],
            Self::Spdx => &[SbomSubtype::SbomOnly],
        }
    }
}

impl SbomSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SbomOnly => "SBOM_ONLY",
            Self::SbomWithVdr => "SBOM_WITH_VDR",
            Self::VdrOnly => "VDR_ONLY",
        }
    }
}

macro_rules! display_from_str {
    ($ty:ty, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = FiniteStateError;

            fn from_str(s: &str) -> Result<Self> {
                let upper = s.to_ascii_uppercase();
                $(
                    if upper == <$ty>::$variant.as_str() {
                        return Ok(<$ty>::$variant);
                    }
                )+
                Err(FiniteStateError::validation(format!(
                    "unknown {}: {s}",
                    stringify!($ty)
                )))
            }
        }
    };
}

display_from_str!(ReportType, [Csv, Pdf]);
display_from_str!(
    ReportSubtype,
    [AllFindings, AllComponents, ExploitIntelligence, RiskSummary]
);
display_from_str!(SbomType, [CycloneDx, Spdx]);
display_from_str!(SbomSubtype, [SbomOnly, SbomWithVdr, VdrOnly]);

/// The launch mutation family, each with its own result field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    ArtifactCsv,
    ArtifactPdf,
    ProductCsv,
    ProductPdf,
    CycloneDx,
    Spdx,
}

impl ExportKind {
    /// Response field carrying the `exportJobId`.
    pub fn launch_field(&self) -> &'static str {
        match self {
            Self::ArtifactCsv => "launchArtifactCSVExport",
            Self::ArtifactPdf => "launchArtifactPdfExport",
            Self::ProductCsv => "launchProductCSVExport",
            Self::ProductPdf => "launchProductPdfExport",
            Self::CycloneDx => "launchCycloneDxExport",
            Self::Spdx => "launchSpdxExport",
        }
    }

    fn mutation(&self) -> &'static str {
        match self {
            Self::ArtifactCsv => LAUNCH_ARTIFACT_CSV,
            Self::ArtifactPdf => LAUNCH_ARTIFACT_PDF,
            Self::ProductCsv => LAUNCH_PRODUCT_CSV,
            Self::ProductPdf => LAUNCH_PRODUCT_PDF,
            Self::CycloneDx => LAUNCH_CYCLONEDX,
            Self::Spdx => LAUNCH_SPDX,
        }
    }
}

/// A validated launch mutation, ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportLaunch {
    kind: ExportKind,
    request: GraphQlRequest,
}

impl ExportLaunch {
    /// Build a report launch.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::Validation`] if the target ID is empty
    /// or the subtype is not offered for the report type.
    pub fn report(
        target: &ReportTarget,
        report_type: ReportType,
        subtype: ReportSubtype,
    ) -> Result<Self> {
        if !report_type.supported_subtypes().contains(&subtype) {
            return Err(FiniteStateError::validation(format!(
                "report subtype {subtype} not supported for {report_type}"
            )));
        }

        let (kind, variables) = match (target, report_type) {
            (ReportTarget::AssetVersion(id), ReportType::Csv) => (
                ExportKind::ArtifactCsv,
                json!({"artifactCsvSubtype": subtype.as_str(), "assetVersionId": require_id(id, "asset version")?}),
            ),
            (ReportTarget::AssetVersion(id), ReportType::Pdf) => (
                ExportKind::ArtifactPdf,
                json!({"artifactPdfSubtype": subtype.as_str(), "assetVersionId": require_id(id, "asset version")?}),
            ),
            (ReportTarget::Product(id), ReportType::Csv) => (
                ExportKind::ProductCsv,
                json!({"productCsvSubtype": subtype.as_str(), "productId": require_id(id, "product")?}),
            ),
            (ReportTarget::Product(id), ReportType::Pdf) => (
                ExportKind::ProductPdf,
                json!({"productPdfSubtype": subtype.as_str(), "productId": require_id(id, "product")?}),
            ),
        };

        Ok(Self {
            kind,
            request: GraphQlRequest::new(kind.mutation(), variables),
        })
    }

    /// Build an SBOM launch for an asset version.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::Validation`] if the asset version ID is
    /// empty or the subtype is not offered for the SBOM type.
    pub fn sbom(sbom_type: SbomType, subtype: SbomSubtype, asset_version_id: &str) -> Result<Self> {
        if !sbom_type.supported_subtypes().contains(&subtype) {
            return Err(FiniteStateError::validation(format!(
                "SBOM subtype {subtype} not supported for {sbom_type}"
            )));
        }
        let id = require_id(asset_version_id, "asset version")?;

        let (kind, variables) = match sbom_type {
            SbomType::CycloneDx => (
                ExportKind::CycloneDx,
                json!({"cdxSubtype": subtype.as_str(), "assetVersionId": id}),
            ),
            SbomType::Spdx => (
                ExportKind::Spdx,
                json!({"spdxSubtype": subtype.as_str(), "assetVersionId": id}),
            ),
        };

        Ok(Self {
            kind,
            request: GraphQlRequest::new(kind.mutation(), variables),
        })
    }

    pub fn kind(&self) -> ExportKind {
        self.kind
    }

    pub fn request(&self) -> &GraphQlRequest {
        &self.request
    }
}

fn require_id<'a>(id: &'a str, what: &str) -> Result<&'a str> {
    if id.trim().is_empty() {
        return Err(FiniteStateError::validation(format!("{what} ID is required")));
    }
    Ok(id)
}

/// Server-reported state of an export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Completed,
    Failed,
    Error,
    Cancelled,
    /// Any non-terminal state (`PENDING`, `RUNNING`, ...).
    InProgress(String),
}

impl ExportStatus {
    /// Whether the job has ended without producing a file.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed | Self::Error | Self::Cancelled)
    }
}

impl From<&str> for ExportStatus {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            "ERROR" => Self::Error,
            "CANCELLED" | "CANCELED" => Self::Cancelled,
            _ => Self::InProgress(s.to_string()),
        }
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("COMPLETED"),
            Self::Failed => f.write_str("FAILED"),
            Self::Error => f.write_str("ERROR"),
            Self::Cancelled => f.write_str("CANCELLED"),
            Self::InProgress(s) => f.write_str(s),
        }
    }
}

/// How long and how often to poll an export job.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Wait between consecutive status polls.
    pub interval: Duration,
    /// Give up after this many polls.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first poll.
    pub max_duration: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: None,
            max_duration: Some(Duration::from_secs(60 * 60)),
        }
    }
}

impl PollPolicy {
    /// Poll every `interval` with no attempt cap and the default duration cap.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    #[must_use]
    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    fn exhausted(&self, attempts: u32, elapsed: Duration) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
            || self.max_duration.is_some_and(|max| elapsed.saturating_add(self.interval) > max)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusResult {
    #[serde(default)]
    download_link: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Handle to a launched export job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub export_job_id: String,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedExport {
    /// Presigned URL of the rendered file.
    pub download_link: String,
    /// Number of status polls issued.
    pub attempts: u32,
    /// Time from the first poll to completion.
    pub elapsed: Duration,
}

/// Send a launch mutation and return the job handle.
///
/// # Errors
///
/// Returns [`FiniteStateError::ExportLaunch`] if the response carries no
/// `exportJobId` under the kind's launch field.
#[tracing::instrument(skip(client, launch), fields(kind = ?launch.kind))]
pub async fn launch_export(client: &FiniteStateClient, launch: &ExportLaunch) -> Result<ExportJob> {
    let data = client.send_graphql(&launch.request).await?;
    let field = launch.kind.launch_field();

    let export_job_id = export_job_id_from(&data, launch.kind)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| FiniteStateError::ExportLaunch(format!("{field}.exportJobId missing")))?;

    tracing::info!("Launched export job {}", export_job_id);
    Ok(ExportJob { export_job_id })
}

impl ExportJob {
    /// Issue one status poll.
    ///
    /// Returns the status and, if present, the download link.
    pub async fn poll(&self, client: &FiniteStateClient) -> Result<(ExportStatus, Option<String>)> {
        let request = GraphQlRequest::new(
            EXPORT_STATUS_QUERY,
            json!({"exportId": self.export_job_id}),
        );
        let data = client.send_graphql(&request).await?;
        let result = data
            .get("generateExportDownloadPresignedUrl")
            .cloned()
            .ok_or_else(|| {
                FiniteStateError::schema("generateExportDownloadPresignedUrl not in response data")
            })?;
        let result: StatusResult = serde_json::from_value(result)
            .map_err(|e| FiniteStateError::schema(format!("export status did not decode: {e}")))?;

        let status = result
            .status
            .as_deref()
            .map_or_else(|| ExportStatus::InProgress(String::new()), ExportStatus::from);
        Ok((status, result.download_link.filter(|l| !l.is_empty())))
    }

    /// Poll until the job completes, fails, or the policy runs out.
    ///
    /// The first poll is issued immediately; `policy.interval` is slept
    /// between polls. A `COMPLETED` status without a download link is
    /// treated as still in progress.
    ///
    /// # Errors
    ///
    /// * [`FiniteStateError::ExportFailed`] on `FAILED`, `ERROR` or `CANCELLED`
    /// * [`FiniteStateError::ExportTimeout`] when the policy is exhausted
    #[tracing::instrument(skip(self, client, policy), fields(export_job_id = %self.export_job_id))]
    pub async fn wait_for_download(
        &self,
        client: &FiniteStateClient,
        policy: &PollPolicy,
    ) -> Result<CompletedExport> {
        let started = Instant::now();
        let mut attempts = 0u32;

        loop {
            let (status, link) = self.poll(client).await?;
            attempts += 1;
            let elapsed = started.elapsed();
            tracing::debug!("Poll {} status {} after {:?}", attempts, status, elapsed);

            if status == ExportStatus::Completed {
                if let Some(download_link) = link {
                    return Ok(CompletedExport {
                        download_link,
                        attempts,
                        elapsed,
                    });
                }
            }

            if status.is_failure() {
                return Err(FiniteStateError::ExportFailed {
                    export_job_id: self.export_job_id.clone(),
                    status: status.to_string(),
                });
            }

            if policy.exhausted(attempts, elapsed) {
                return Err(FiniteStateError::ExportTimeout {
                    export_job_id: self.export_job_id.clone(),
                    attempts,
                    elapsed,
                });
            }

            tokio::time::sleep(policy.interval).await;
        }
    }
}

/// Launch an export and wait for its download link.
///
/// # Errors
///
/// See [`launch_export`] and [`ExportJob::wait_for_download`].
pub async fn generate_download_url(
    client: &FiniteStateClient,
    launch: &ExportLaunch,
    policy: &PollPolicy,
) -> Result<String> {
    let job = launch_export(client, launch).await?;
    let completed = job.wait_for_download(client, policy).await?;
    Ok(completed.download_link)
}

/// Generate a report and return its presigned download URL.
///
/// # Errors
///
/// Validation errors are returned before any request is made.
pub async fn generate_report_download_url(
    client: &FiniteStateClient,
    target: &ReportTarget,
    report_type: ReportType,
    subtype: ReportSubtype,
    policy: &PollPolicy,
) -> Result<String> {
    let launch = ExportLaunch::report(target, report_type, subtype)?;
    generate_download_url(client, &launch, policy).await
}

/// Generate an SBOM and return its presigned download URL.
///
/// # Errors
///
/// Validation errors are returned before any request is made.
pub async fn generate_sbom_download_url(
    client: &FiniteStateClient,
    sbom_type: SbomType,
    subtype: SbomSubtype,
    asset_version_id: &str,
    policy: &PollPolicy,
) -> Result<String> {
    let launch = ExportLaunch::sbom(sbom_type, subtype, asset_version_id)?;
    generate_download_url(client, &launch, policy).await
}

/// Fetch a presigned URL and write the body to `path`.
///
/// Returns the number of bytes written.
pub async fn download_to_file(
    client: &FiniteStateClient,
    url: &str,
    path: impl AsRef<Path>,
) -> Result<u64> {
    let bytes = client.download(url).await?;
    tokio::fs::write(path.as_ref(), &bytes).await?;
    tracing::info!("Wrote {} bytes to {}", bytes.len(), path.as_ref().display());
    Ok(bytes.len() as u64)
}

/// Generate an asset version report and save it to `path`.
pub async fn download_asset_version_report(
    client: &FiniteStateClient,
    asset_version_id: &str,
    report_type: ReportType,
    subtype: ReportSubtype,
    path: impl AsRef<Path>,
    policy: &PollPolicy,
) -> Result<u64> {
    let target = ReportTarget::AssetVersion(asset_version_id.to_string());
    let url = generate_report_download_url(client, &target, report_type, subtype, policy).await?;
    download_to_file(client, &url, path).await
}

/// Generate a product report and save it to `path`.
pub async fn download_product_report(
    client: &FiniteStateClient,
    product_id: &str,
    report_type: ReportType,
    subtype: ReportSubtype,
    path: impl AsRef<Path>,
    policy: &PollPolicy,
) -> Result<u64> {
    let target = ReportTarget::Product(product_id.to_string());
    let url = generate_report_download_url(client, &target, report_type, subtype, policy).await?;
    download_to_file(client, &url, path).await
}

/// Generate an SBOM for an asset version and save it to `path`.
pub async fn download_sbom(
    client: &FiniteStateClient,
    sbom_type: SbomType,
    subtype: SbomSubtype,
    asset_version_id: &str,
    path: impl AsRef<Path>,
    policy: &PollPolicy,
) -> Result<u64> {
    let url = generate_sbom_download_url(client, sbom_type, subtype, asset_version_id, policy).await?;
    download_to_file(client, &url, path).await
}

/// Extract `exportJobId` from a raw launch response for a given kind.
///
/// Exposed for callers that send their own launch documents.
pub fn export_job_id_from(data: &Value, kind: ExportKind) -> Option<&str> {
    data.get(kind.launch_field())?
        .get("exportJobId")?
        .as_str()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_launch_fields() {
        let av = ReportTarget::AssetVersion("av-1".into());
        let product = ReportTarget::Product("p-1".into());

        let launch = ExportLaunch::report(&av, ReportType::Csv, ReportSubtype::AllFindings).unwrap();
        assert_eq!(launch.kind().launch_field(), "launchArtifactCSVExport");
        assert_eq!(launch.request().variables["assetVersionId"], "av-1");
        assert_eq!(launch.request().variables["artifactCsvSubtype"], "ALL_FINDINGS");

        let launch = ExportLaunch::report(&product, ReportType::Pdf, ReportSubtype::RiskSummary).unwrap();
        assert_eq!(launch.kind().launch_field(), "launchProductPdfExport");
        assert_eq!(launch.request().variables["productId"], "p-1");
        assert!(launch.request().is_mutation());
    }

    #[test]
    fn test_unsupported_report_subtype() {
        let av = ReportTarget::AssetVersion("av-1".into());
        let err = ExportLaunch::report(&av, ReportType::Pdf, ReportSubtype::AllFindings).unwrap_err();
        assert!(matches!(err, FiniteStateError::Validation(_)));
    }

    #[test]
    fn test_empty_target_id() {
        let err = ExportLaunch::report(
            &ReportTarget::Product(" ".into()),
            ReportType::Csv,
            ReportSubtype::AllComponents,
        )
        .unwrap_err();
        assert!(matches!(err, FiniteStateError::Validation(_)));
    }

    #[test]
    fn test_sbom_launch() {
        let launch = ExportLaunch::sbom(SbomType::CycloneDx, SbomSubtype::SbomWithVdr, "av-1").unwrap();
        assert_eq!(launch.kind(), ExportKind::CycloneDx);
        assert_eq!(launch.request().variables["cdxSubtype"], "SBOM_WITH_VDR");

        let launch = ExportLaunch::sbom(SbomType::Spdx, SbomSubtype::SbomOnly, "av-1").unwrap();
        assert_eq!(launch.kind().launch_field(), "launchSpdxExport");

        assert!(ExportLaunch::sbom(SbomType::Spdx, SbomSubtype::VdrOnly, "av-1").is_err());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("csv".parse::<ReportType>().unwrap(), ReportType::Csv);
        assert_eq!(
            "exploit_intelligence".parse::<ReportSubtype>().unwrap(),
            ReportSubtype::ExploitIntelligence
        );
        assert_eq!("CYCLONEDX".parse::<SbomType>().unwrap(), SbomType::CycloneDx);
        assert_eq!("sbom_only".parse::<SbomSubtype>().unwrap(), SbomSubtype::SbomOnly);
        assert!("XML".parse::<ReportType>().is_err());
    }

    #[test]
    fn test_export_status() {
        assert_eq!(ExportStatus::from("COMPLETED"), ExportStatus::Completed);
        assert!(ExportStatus::from("FAILED").is_failure());
        assert!(ExportStatus::from("CANCELLED").is_failure());
        assert_eq!(
            ExportStatus::from("RUNNING"),
            ExportStatus::InProgress("RUNNING".into())
        );
        assert!(!ExportStatus::from("PENDING").is_failure());
    }

    #[test]
    fn test_poll_policy_exhaustion() {
        let policy = PollPolicy::every(Duration::from_secs(10)).with_max_attempts(3);
        assert!(!policy.exhausted(2, Duration::from_secs(20)));
        assert!(policy.exhausted(3, Duration::from_secs(20)));

        let policy = PollPolicy::every(Duration::from_secs(10)).with_max_duration(Duration::from_secs(30));
        assert!(!policy.exhausted(1, Duration::from_secs(15)));
        assert!(policy.exhausted(1, Duration::from_secs(25)));
    }

    #[test]
    fn test_poll_policy_huge_interval() {
        let policy = PollPolicy::every(Duration::MAX);
        assert!(policy.exhausted(1, Duration::from_secs(1)));
        assert!(!PollPolicy {
            max_duration: None,
            ..policy
        }
        .exhausted(1, Duration::from_secs(1)));
    }

    #[test]
    fn test_export_job_id_from() {
        let data = json!({"launchSpdxExport": {"exportJobId": "job-7"}});
        assert_eq!(export_job_id_from(&data, ExportKind::Spdx), Some("job-7"));
        assert_eq!(export_job_id_from(&data, ExportKind::CycloneDx), None);
    }
}
