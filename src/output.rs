//! Output formatting for CLI display.
//!
//! Provides the [`PrettyPrint`] trait for human-readable output of a
//! single record, and [`Tabled`] row types for lists, as alternatives to
//! JSON serialization.

use tabled::Tabled;

use crate::models::{
    Artifact, Asset, AssetVersion, BusinessUnit, Finding, Organization, Product, SbomMatch,
    SoftwareComponent, User,
};

/// Trait for human-readable key-value output.
///
/// Implemented by entity types to provide formatted output
/// suitable for terminal display when `--json` is not specified.
pub trait PrettyPrint {
    /// Returns a formatted string for terminal display.
    fn pretty_print(&self) -> String;
}

fn header(kind: &str, name: &str) -> Vec<String> {
    let header = format!("{kind}: {name}");
    let divider = "─".repeat(header.chars().count().max(30));
    vec![header, divider]
}

impl PrettyPrint for Asset {
    fn pretty_print(&self) -> String {
        let mut lines = header("Asset", &self.name);
        lines.push(format!("ID:             {}", self.id));

        if let Some(ref group) = self.group {
            lines.push(format!(
                "Business Unit:  {}",
                group.name.as_deref().unwrap_or(&group.id)
            ));
        }

        if let Some(ref created) = self.created_at {
            lines.push(format!("Created:        {}", created.format("%Y-%m-%d %H:%M:%S UTC")));
        }

        if !self.versions.is_empty() {
            let names: Vec<&str> = self.versions.iter().map(|v| v.name.as_str()).collect();
            lines.push(format!("Versions:       {}", names.join(", ")));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for AssetVersion {
    fn pretty_print(&self) -> String {
        let mut lines = header("Asset Version", &self.name);
        lines.push(format!("ID:             {}", self.id));

        if let Some(ref asset) = self.asset {
            lines.push(format!(
                "Asset:          {}",
                asset.name.as_deref().unwrap_or(&asset.id)
            ));
        }

        if let Some(score) = self.relative_risk_score {
            lines.push(format!("Risk Score:     {score:.1}"));
        }

        if !self.test_statuses.is_empty() {
            lines.push(format!("Tests:          {}", self.test_statuses.join(", ")));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Product {
    fn pretty_print(&self) -> String {
        let mut lines = header("Product", &self.name);
        lines.push(format!("ID:             {}", self.id));

        if let Some(vendor) = self.vendor.as_ref().and_then(|v| v.name.as_deref()) {
            lines.push(format!("Vendor:         {vendor}"));
        }

        if let Some(ref group) = self.group {
            lines.push(format!(
                "Business Unit:  {}",
                group.name.as_deref().unwrap_or(&group.id)
            ));
        }

        lines.join("\n")
    }
}

impl PrettyPrint for Finding {
    fn pretty_print(&self) -> String {
        let mut lines = header("Finding", &self.title);
        lines.push(format!("ID:             {}", self.id));

        if let Some(ref severity) = self.severity {
            lines.push(format!("Severity:       {severity}"));
        }

        if let Some(ref vuln_id) = self.vuln_id_from_tool {
            lines.push(format!("Identifier:     {vuln_id}"));
        }

        if let Some(status) = self.status() {
            lines.push(format!("Status:         {status}"));
        }

        for component in &self.affects {
            lines.push(format!(
                "Affects:        {} {}",
                component.name.as_deref().unwrap_or(&component.id),
                component.version.as_deref().unwrap_or_default()
            ));
        }

        lines.join("\n")
    }
}

/// A row in the `list assets` table.
#[derive(Tabled)]
pub struct AssetRow {
    pub id: String,
    pub name: String,
    #[tabled(rename = "business unit")]
    pub business_unit: String,
    pub versions: usize,
}

impl From<&Asset> for AssetRow {
    fn from(a: &Asset) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            business_unit: a.business_unit_id().unwrap_or_default().to_string(),
            versions: a.versions.len(),
        }
    }
}

#[derive(Tabled)]
pub struct AssetVersionRow {
    pub id: String,
    pub name: String,
    pub asset: String,
    pub risk: String,
}

impl From<&AssetVersion> for AssetVersionRow {
    fn from(v: &AssetVersion) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone(),
            asset: v
                .asset
                .as_ref()
                .map(|a| a.name.clone().unwrap_or_else(|| a.id.clone()))
                .unwrap_or_default(),
            risk: v
                .relative_risk_score
                .map(|s| format!("{s:.1}"))
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct ArtifactRow {
    pub id: String,
    pub name: String,
    pub asset: String,
}

impl From<&Artifact> for ArtifactRow {
    fn from(a: &Artifact) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            asset: a
                .ctx
                .as_ref()
                .and_then(|c| c.asset.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub vendor: String,
}

impl From<&Product> for ProductRow {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            vendor: p
                .vendor
                .as_ref()
                .and_then(|v| v.name.clone())
                .unwrap_or_default(),
        }
    }
}

/// A row for entities that only carry an ID and a label.
#[derive(Tabled)]
pub struct NamedRow {
    pub id: String,
    pub name: String,
}

impl From<&BusinessUnit> for NamedRow {
    fn from(b: &BusinessUnit) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
        }
    }
}

impl From<&Organization> for NamedRow {
    fn from(o: &Organization) -> Self {
        Self {
            id: o.id.clone(),
            name: o.name.clone(),
        }
    }
}

impl From<&User> for NamedRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.email.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct ComponentRow {
    pub id: String,
    pub name: String,
    pub version: String,
    #[tabled(rename = "type")]
    pub component_type: String,
    pub risk: String,
}

impl From<&SoftwareComponent> for ComponentRow {
    fn from(c: &SoftwareComponent) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            version: c.version.clone().unwrap_or_default(),
            component_type: c.component_type.clone().unwrap_or_default(),
            risk: c
                .absolute_risk_score
                .map(|s| format!("{s:.1}"))
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct SbomMatchRow {
    pub id: String,
    pub name: String,
    pub version: String,
    #[tabled(rename = "asset version")]
    pub asset_version: String,
}

impl From<&SbomMatch> for SbomMatchRow {
    fn from(m: &SbomMatch) -> Self {
        Self {
            id: m.id.clone(),
            name: m.name.clone(),
            version: m.version.clone().unwrap_or_default(),
            asset_version: m
                .asset_version
                .as_ref()
                .map(|v| v.id.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct FindingRow {
    pub id: String,
    pub title: String,
    pub severity: String,
    pub status: String,
}

impl From<&Finding> for FindingRow {
    fn from(f: &Finding) -> Self {
        Self {
            id: f.id.clone(),
            title: f.title.clone(),
            severity: f.severity.clone().unwrap_or_default(),
            status: f.status().unwrap_or_default().to_string(),
        }
    }
}
