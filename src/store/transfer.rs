use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::managed::{ManagedSite, ManagedSites};
use super::namespace::Namespace;
use super::settings::Settings;
use crate::common::errors::{Result, SiteWipeError};
use crate::common::site::validate_domain;

pub const EXPORT_VERSION: &str = "1.0";

/// Backup file written by `export` and read by `import`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub version: String,
    pub export_date: DateTime<Utc>,
    pub managed_sites: Vec<ManagedSite>,
    pub settings: Settings,
}

/// What an import changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
    pub settings_updated: usize,
}

/// Snapshot the managed sites and the current settings
pub fn export(sites: &ManagedSites, sync: &Namespace) -> Result<ExportFile> {
    Ok(ExportFile {
        version: EXPORT_VERSION.to_string(),
        export_date: Utc::now(),
        managed_sites: sites.list()?,
        settings: Settings::load(sync)?,
    })
}

/// Sites in an import file may omit their title or date
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedSite {
    domain: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    date_added: Option<DateTime<Utc>>,
}

fn format_error(message: impl Into<String>) -> SiteWipeError {
    SiteWipeError::ImportFormat {
        message: message.into(),
    }
}

/// Merge an export file into the current state.
///
/// The whole file is validated before anything is written. Existing domains
/// win over imported ones, and settings are shallow-merged.
pub fn import(contents: &str, sites: &ManagedSites, sync: &Namespace) -> Result<ImportSummary> {
    let root: Value =
        serde_json::from_str(contents).map_err(|e| format_error(format!("not JSON: {}", e)))?;
    let object = root
        .as_object()
        .ok_or_else(|| format_error("top level must be an object"))?;
    let entries = object
        .get(ManagedSites::KEY)
        .and_then(Value::as_array)
        .ok_or_else(|| format_error("missing managedSites array"))?;

    let mut incoming = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let site: ImportedSite = serde_json::from_value(entry.clone())
            .map_err(|e| format_error(format!("managedSites[{}]: {}", index, e)))?;
        validate_domain(&site.domain)
            .map_err(|e| format_error(format!("managedSites[{}]: {}", index, e)))?;
        let mut managed = ManagedSite::new(site.domain, site.title.as_deref());
        if let Some(date) = site.date_added {
            managed.date_added = date;
        }
        incoming.push(managed);
    }

    let mut summary = ImportSummary::default();
    let mut current = sites.list()?;
    for site in incoming {
        if current.iter().any(|s| s.domain == site.domain) {
            summary.skipped += 1;
        } else {
            current.push(site);
            summary.added += 1;
        }
    }
    if summary.added > 0 {
        sites.replace(&current)?;
    }

    if let Some(partial) = object.get("settings").and_then(Value::as_object) {
        let mut settings = Settings::load(sync)?;
        summary.settings_updated = settings.apply_partial(partial);
        if summary.settings_updated > 0 {
            settings.save(sync)?;
        }
    }

    info!(
        added = summary.added,
        skipped = summary.skipped,
        settings_updated = summary.settings_updated,
        "import finished"
    );
    Ok(summary)
}
