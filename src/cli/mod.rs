//! CLI argument parsing types.
//!
//! This module provides the command-line interface structure for the
//! finitestate binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{ClientConfig, DEFAULT_API_URL, DEFAULT_AUDIENCE, DEFAULT_TOKEN_URL};
use crate::error::{FiniteStateError, Result};
use crate::export::{ReportSubtype, ReportType, SbomSubtype, SbomType};
use crate::models::{FindingStatus, Justification, Severity, VendorResponse};
use crate::upload::DEFAULT_CHUNK_SIZE;

/// Finite State platform command-line interface.
#[derive(Parser, Debug)]
#[command(name = "finitestate", about = "Finite State API CLI", version)]
pub struct Cli {
    /// Output results as JSON instead of a table.
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Log requests and retries to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub credentials: Credentials,

    #[command(subcommand)]
    pub command: Command,
}

/// API credentials and endpoints.
#[derive(Args, Debug, Clone)]
pub struct Credentials {
    #[arg(long, env = "CLIENT_ID", global = true, hide_env_values = true)]
    pub client_id: Option<String>,

    #[arg(long, env = "CLIENT_SECRET", global = true, hide_env_values = true)]
    pub client_secret: Option<String>,

    #[arg(long, env = "ORGANIZATION_CONTEXT", global = true)]
    pub organization_context: Option<String>,

    #[arg(long, env = "FINITE_STATE_API_URL", global = true, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, env = "FINITE_STATE_TOKEN_URL", global = true, default_value = DEFAULT_TOKEN_URL)]
    pub token_url: String,

    #[arg(long, env = "FINITE_STATE_AUDIENCE", global = true, default_value = DEFAULT_AUDIENCE)]
    pub audience: String,

    /// Always request a new token instead of reusing the cached one.
    #[arg(long, global = true)]
    pub no_cache: bool,
}

impl Credentials {
    /// Build a client configuration from the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`FiniteStateError::ConfigMissing`] naming the first missing
    /// credential.
    pub fn to_config(&self) -> Result<ClientConfig> {
        let client_id = required(&self.client_id, "CLIENT_ID")?;
        let client_secret = required(&self.client_secret, "CLIENT_SECRET")?;
        let organization_context = required(&self.organization_context, "ORGANIZATION_CONTEXT")?;

        let mut config = ClientConfig::new(client_id, client_secret, organization_context);
        config.api_url = self.api_url.clone();
        config.token_url = self.token_url.clone();
        config.audience = self.audience.clone();
        Ok(config)
    }
}

fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| FiniteStateError::ConfigMissing(format!("{name} is not set")))
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print an access token, from the cache when still fresh.
    Token,

    /// List entities.
    List {
        /// The type of entity to list.
        entity: Entity,

        /// Restrict to one asset version (components).
        #[arg(long)]
        asset_version: Option<String>,

        /// Restrict to one asset (asset versions).
        #[arg(long)]
        asset: Option<String>,

        /// Restrict to one business unit.
        #[arg(long)]
        business_unit: Option<String>,
    },

    /// List or count findings.
    Findings {
        #[arg(long)]
        asset_version: Option<String>,

        /// Finding category, repeatable (e.g. CVE, CREDENTIALS).
        #[arg(long = "category")]
        categories: Vec<String>,

        #[arg(long)]
        status: Option<FindingStatus>,

        #[arg(long)]
        severity: Option<Severity>,

        /// Return at most this many findings (1 to 1000).
        #[arg(long)]
        limit: Option<usize>,

        /// Print only the number of matching findings.
        #[arg(long)]
        count: bool,
    },

    /// Search SBOM components by name.
    SearchSbom {
        name: String,

        #[arg(long = "component-version")]
        version: Option<String>,

        #[arg(long)]
        asset_version: Option<String>,

        /// Match names containing NAME instead of equal to it.
        #[arg(long)]
        contains: bool,

        #[arg(long)]
        case_sensitive: bool,
    },

    /// Generate a report and save it to a file.
    DownloadReport {
        #[command(flatten)]
        target: ReportTargetArgs,

        /// CSV or PDF.
        #[arg(long)]
        report_type: ReportType,

        /// ALL_FINDINGS, ALL_COMPONENTS or EXPLOIT_INTELLIGENCE for CSV;
        /// RISK_SUMMARY for PDF.
        #[arg(long)]
        subtype: ReportSubtype,

        #[arg(long, short)]
        output: PathBuf,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Generate an SBOM for an asset version and save it to a file.
    DownloadSbom {
        #[arg(long)]
        asset_version: String,

        /// CYCLONEDX or SPDX.
        #[arg(long, default_value = "CYCLONEDX")]
        sbom_type: SbomType,

        /// SBOM_ONLY, SBOM_WITH_VDR or VDR_ONLY.
        #[arg(long, default_value = "SBOM_ONLY")]
        subtype: SbomSubtype,

        #[arg(long, short)]
        output: PathBuf,

        #[command(flatten)]
        poll: PollArgs,
    },

    /// Create a new asset version and upload a binary for analysis.
    UploadBinary {
        #[command(flatten)]
        target: UploadTargetArgs,

        file: PathBuf,

        /// Part size in bytes.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: u64,

        #[arg(long)]
        quick_scan: bool,
    },

    /// Create a new asset version and upload third-party scanner results.
    UploadResults {
        #[command(flatten)]
        target: UploadTargetArgs,

        file: PathBuf,

        /// Scanner format, e.g. `cyclonedx` or `sarif`.
        #[arg(long)]
        test_type: String,
    },

    /// Set the triage status of findings.
    UpdateFindings {
        /// Finding IDs to update.
        #[arg(required = true)]
        ids: Vec<String>,

        #[arg(long)]
        user: String,

        #[arg(long)]
        status: FindingStatus,

        #[arg(long)]
        justification: Option<Justification>,

        #[arg(long)]
        response: Option<VendorResponse>,

        #[arg(long)]
        comment: Option<String>,
    },
}

/// Entity types that can be listed.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    #[value(alias = "assets")]
    Asset,
    #[value(alias = "asset-versions")]
    AssetVersion,
    #[value(alias = "artifacts")]
    Artifact,
    #[value(alias = "products")]
    Product,
    #[value(alias = "business-units")]
    BusinessUnit,
    #[value(alias = "users")]
    User,
    #[value(alias = "organizations")]
    Organization,
    #[value(alias = "components")]
    Component,
}

/// Which entity a report covers. Exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct ReportTargetArgs {
    #[arg(long)]
    pub asset_version: Option<String>,

    #[arg(long)]
    pub product: Option<String>,
}

/// Export polling limits.
#[derive(Args, Debug, Clone)]
pub struct PollArgs {
    /// Seconds between status checks.
    #[arg(long, default_value_t = 10)]
    pub poll_interval: u64,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 3600)]
    pub timeout: u64,
}

/// The asset a new asset version is created on.
#[derive(Args, Debug, Clone)]
pub struct UploadTargetArgs {
    #[arg(long)]
    pub asset: String,

    /// Name of the new asset version.
    #[arg(long = "version-name")]
    pub version: String,

    #[arg(long)]
    pub business_unit: Option<String>,

    #[arg(long)]
    pub created_by: Option<String>,

    #[arg(long)]
    pub product: Option<String>,

    #[arg(long)]
    pub artifact_description: Option<String>,
}
