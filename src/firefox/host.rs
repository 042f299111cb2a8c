use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::cookies;
use super::origin::{FirefoxOrigin, OriginKey};
use super::profile::FirefoxProfile;
use super::dir_size;
use crate::common::errors::{PlatformError, Result, SiteWipeError};
use crate::storage::capabilities::StorageCapabilities;
use crate::storage::page::PageContext;
use crate::storage::privileged::{
    BrowserHost, CookieRecord, CookieRemoval, CookieTarget, RemovalReport, RemovalScope, Tab, TabId,
};

/// Privileged access to an offline profile.
#[derive(Debug, Clone)]
pub struct FirefoxHost {
    profile: FirefoxProfile,
}

impl FirefoxHost {
    /// Refuses a profile a running browser holds unless `force` is set
    pub fn open(profile: FirefoxProfile, force: bool) -> Result<Self> {
        if profile.is_locked() {
            if !force {
                return Err(SiteWipeError::ProfileLocked {
                    path: profile.root().to_path_buf(),
                });
            }
            info!(profile = %profile.root().display(), "profile is locked, continuing anyway");
        }
        Ok(Self { profile })
    }

    pub fn profile(&self) -> &FirefoxProfile {
        &self.profile
    }

    /// Origin directories reachable as "tabs" for a host, in a stable order
    fn tabs_for(&self, host: &str) -> Vec<(Tab, OriginKey, PathBuf)> {
        self.profile
            .origin_dirs()
            .into_iter()
            .enumerate()
            .filter(|(_, (key, _))| key.host == host)
            .map(|(i, (key, dir))| {
                let tab = Tab {
                    id: i as TabId + 1,
                    url: key.url(),
                };
                (tab, key, dir)
            })
            .collect()
    }
}

/// Split a removal URL such as `https://.example.com/app` into host and path
fn split_removal_url(url: &str) -> Option<(&str, &str)> {
    let (_, rest) = url.split_once("://")?;
    match rest.find('/') {
        Some(i) => Some((&rest[..i], &rest[i..])),
        None => Some((rest, "/")),
    }
}

/// Host part of a `*://host/*` match pattern
fn pattern_host(pattern: &str) -> Option<&str> {
    pattern.strip_prefix("*://")?.strip_suffix("/*").filter(|h| !h.is_empty())
}

#[async_trait]
impl BrowserHost for FirefoxHost {
    fn capabilities(&self) -> StorageCapabilities {
        StorageCapabilities::all()
    }

    async fn cookies_for_domain(&self, domain: &str) -> Result<Vec<CookieRecord>, PlatformError> {
        let db = self.profile.cookies_db();
        match cookies::open(&db, true)? {
            Some(conn) => cookies::on_domain(&conn, &db, domain),
            None => Ok(Vec::new()),
        }
    }

    async fn remove_cookie(&self, target: &CookieTarget) -> Result<CookieRemoval, PlatformError> {
        let (host, path) = split_removal_url(&target.url)
            .ok_or_else(|| PlatformError::other(format!("invalid cookie URL '{}'", target.url)))?;
        let db = self.profile.cookies_db();
        let Some(conn) = cookies::open(&db, false)? else {
            return Ok(CookieRemoval::NotFound);
        };
        let removed = cookies::delete(&conn, &db, &target.name, host, path, &target.store_id)?;
        Ok(if removed == 0 {
            CookieRemoval::NotFound
        } else {
            CookieRemoval::Removed
        })
    }

    async fn remove_browsing_data(&self, scope: &RemovalScope) -> Result<RemovalReport, PlatformError> {
        let mut report = RemovalReport::default();
        if scope.is_empty() {
            return Ok(report);
        }

        let wanted = scope
            .origins
            .iter()
            .map(|o| OriginKey::parse_origin(o).ok_or_else(|| PlatformError::other(format!("invalid origin '{}'", o))))
            .collect::<Result<Vec<_>, PlatformError>>()?;

        let mut failed = Vec::new();
        let mut removed = 0usize;
        for (key, dir) in self.profile.origin_dirs() {
            if !wanted.iter().any(|w| w.same_origin(&key)) {
                continue;
            }
            let mut targets = Vec::new();
            if scope.local_storage {
                targets.push(dir.join("ls"));
            }
            if scope.indexed_db {
                targets.push(dir.join("idb"));
            }
            for target in targets.iter().filter(|t| t.exists()) {
                let bytes = dir_size(target);
                let databases = if target.ends_with("idb") { count_databases(target) } else { 0 };
                match std::fs::remove_dir_all(target) {
                    Ok(()) => {
                        report.bytes += bytes;
                        report.databases += databases;
                        removed += 1;
                    }
                    Err(e) => {
                        warn!(path = %target.display(), error = %e, "failed to remove origin data");
                        failed.push(PlatformError::io(target, e).to_string());
                    }
                }
            }
            debug!(origin = %key.dir_name(), "removed browsing data");
        }

        if !failed.is_empty() {
            return Err(PlatformError::other(format!(
                "partial removal ({} removed, {} failed): {}",
                removed,
                failed.len(),
                failed.join("; ")
            )));
        }
        Ok(report)
    }

    async fn query_tabs(&self, pattern: &str) -> Result<Vec<Tab>, PlatformError> {
        let host = pattern_host(pattern)
            .ok_or_else(|| PlatformError::other(format!("unsupported match pattern '{}'", pattern)))?;
        Ok(self.tabs_for(host).into_iter().map(|(tab, _, _)| tab).collect())
    }

    async fn attach(&self, tab: &Tab) -> Result<Box<dyn PageContext>, PlatformError> {
        let target = OriginKey::parse_origin(&tab.url)
            .ok_or_else(|| PlatformError::other(format!("cannot attach to '{}'", tab.url)))?;

        let (_, key, dir) = self
            .tabs_for(&target.host)
            .into_iter()
            .find(|(t, _, _)| t.id == tab.id)
            .ok_or_else(|| PlatformError::NotFound {
                what: format!("tab {}", tab.id),
            })?;
        Ok(Box::new(FirefoxOrigin::new(key, dir, self.profile.cookies_db())))
    }

    async fn reload_tab(&self, tab: TabId) -> Result<(), PlatformError> {
        debug!(tab, "offline profile has no live pages to reload");
        Ok(())
    }
}

fn count_databases(idb: &std::path::Path) -> usize {
    std::fs::read_dir(idb)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("sqlite"))
                .count()
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_removal_url() {
        assert_eq!(split_removal_url("https://.example.com/app"), Some((".example.com", "/app")));
        assert_eq!(split_removal_url("http://example.com"), Some(("example.com", "/")));
        assert_eq!(split_removal_url("example.com"), None);
    }

    #[test]
    fn test_pattern_host() {
        assert_eq!(pattern_host("*://example.com/*"), Some("example.com"));
        assert_eq!(pattern_host("https://example.com/*"), None);
        assert_eq!(pattern_host("*:///*"), None);
    }
}
