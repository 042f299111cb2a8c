use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::namespace::Namespace;
use crate::common::errors::{Result, SiteWipeError};
use crate::common::site::validate_domain;

/// A domain the user opted into for bulk and auto clearing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedSite {
    pub domain: String,
    pub title: String,
    pub date_added: DateTime<Utc>,
}

impl ManagedSite {
    pub fn new(domain: impl Into<String>, title: Option<&str>) -> Self {
        let domain = domain.into();
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| domain.clone());
        Self {
            domain,
            title,
            date_added: Utc::now(),
        }
    }
}

/// The managed-site list, kept under `managedSites` in the local namespace.
#[derive(Debug, Clone)]
pub struct ManagedSites {
    ns: Namespace,
}

impl ManagedSites {
    pub const KEY: &'static str = "managedSites";

    pub fn new(ns: Namespace) -> Self {
        Self { ns }
    }

    pub fn list(&self) -> Result<Vec<ManagedSite>> {
        match self.ns.get(Self::KEY)? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| SiteWipeError::Namespace {
                path: self.ns.path().to_path_buf(),
                message: format!("{}: {}", Self::KEY, e),
            }),
        }
    }

    pub fn find(&self, domain: &str) -> Result<Option<ManagedSite>> {
        Ok(self.list()?.into_iter().find(|s| s.domain == domain))
    }

    pub fn contains(&self, domain: &str) -> Result<bool> {
        Ok(self.find(domain)?.is_some())
    }

    pub fn add(&self, domain: &str, title: Option<&str>) -> Result<ManagedSite> {
        validate_domain(domain)?;
        let mut sites = self.list()?;
        if sites.iter().any(|s| s.domain == domain) {
            return Err(SiteWipeError::DuplicateSite {
                domain: domain.to_string(),
            });
        }
        let site = ManagedSite::new(domain, title);
        sites.push(site.clone());
        self.replace(&sites)?;
        info!(domain = %domain, "site added to managed list");
        Ok(site)
    }

    pub fn remove(&self, domain: &str) -> Result<ManagedSite> {
        let mut sites = self.list()?;
        let index = sites
            .iter()
            .position(|s| s.domain == domain)
            .ok_or_else(|| SiteWipeError::SiteNotFound {
                domain: domain.to_string(),
            })?;
        let removed = sites.remove(index);
        self.replace(&sites)?;
        info!(domain = %domain, "site removed from managed list");
        Ok(removed)
    }

    /// Drop every managed site; returns how many there were
    pub fn reset(&self) -> Result<usize> {
        let count = self.list()?.len();
        self.replace(&[])?;
        Ok(count)
    }

    pub(crate) fn replace(&self, sites: &[ManagedSite]) -> Result<()> {
        let mut entries = Map::new();
        entries.insert(Self::KEY.to_string(), serde_json::to_value(sites)?);
        self.ns.set(entries)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sites() -> (tempfile::TempDir, ManagedSites) {
        let dir = tempfile::tempdir().unwrap();
        let sites = ManagedSites::new(Namespace::open(dir.path().join("local.json")));
        (dir, sites)
    }

    #[test]
    fn test_add_defaults_title_to_domain() {
        let (_dir, sites) = sites();
        let site = sites.add("example.com", None).unwrap();
        assert_eq!(site.title, "example.com");
        let titled = sites.add("news.example.com", Some("  News  ")).unwrap();
        assert_eq!(titled.title, "News");
        assert_eq!(sites.list().unwrap().len(), 2);
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let (_dir, sites) = sites();
        sites.add("example.com", None).unwrap();
        let err = sites.add("example.com", Some("again")).unwrap_err();
        assert!(matches!(err, SiteWipeError::DuplicateSite { .. }));
        assert_eq!(sites.list().unwrap().len(), 1);
    }

    #[test]
    fn test_add_rejects_urls() {
        let (_dir, sites) = sites();
        assert!(sites.add("https://example.com", None).is_err());
        assert!(sites.list().unwrap().is_empty());
    }

    #[test]
    fn test_remove_and_reset() {
        let (_dir, sites) = sites();
        sites.add("a.example", None).unwrap();
        sites.add("b.example", None).unwrap();

        assert_eq!(sites.remove("a.example").unwrap().domain, "a.example");
        assert!(!sites.contains("a.example").unwrap());
        assert!(matches!(
            sites.remove("a.example"),
            Err(SiteWipeError::SiteNotFound { .. })
        ));

        assert_eq!(sites.reset().unwrap(), 1);
        assert!(sites.list().unwrap().is_empty());
    }
}
