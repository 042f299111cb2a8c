//! Privileged-context clearers: run with platform-level, origin-scoped removal APIs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::capabilities::StorageCapabilities;
use super::category::CountOutcome;
use super::page::{self, PageContext};
use crate::common::errors::PlatformError;

/// A cookie as reported by the host's cookie enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieRecord {
    pub name: String,
    /// Host the cookie is set on; domain cookies carry a leading dot
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub store_id: String,
}

impl CookieRecord {
    /// URL the removal API needs to address exactly this cookie
    pub fn removal_url(&self) -> String {
        let scheme = if self.secure { "https:" } else { "http:" };
        format!("{}//{}{}", scheme, self.domain, self.path)
    }
}

/// Arguments of a single cookie removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieTarget {
    pub url: String,
    pub name: String,
    pub store_id: String,
}

impl From<&CookieRecord> for CookieTarget {
    fn from(cookie: &CookieRecord) -> Self {
        Self {
            url: cookie.removal_url(),
            name: cookie.name.clone(),
            store_id: cookie.store_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieRemoval {
    Removed,
    /// Nothing matched; the cookie is already gone
    NotFound,
}

/// One bulk browsing-data removal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalScope {
    pub origins: Vec<String>,
    /// Covers both localStorage and sessionStorage
    pub local_storage: bool,
    pub indexed_db: bool,
}

impl RemovalScope {
    /// Both schemes of the bare domain
    pub fn for_domain(domain: &str, local_storage: bool, indexed_db: bool) -> Self {
        Self {
            origins: vec![format!("https://{}", domain), format!("http://{}", domain)],
            local_storage,
            indexed_db,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.local_storage && !self.indexed_db
    }
}

/// What a bulk removal reports back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalReport {
    /// Databases removed, when the host can count them
    pub databases: usize,
    /// Bytes freed, when the host can measure them
    pub bytes: u64,
}

pub type TabId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
}

/// Platform APIs available to the background context.
#[async_trait]
pub trait BrowserHost: Send + Sync {
    fn capabilities(&self) -> StorageCapabilities;

    /// Cookies stored for `domain`. `.example.com` asks for that domain
    /// cookie host alone; `example.com` also covers its subdomains.
    async fn cookies_for_domain(&self, domain: &str) -> Result<Vec<CookieRecord>, PlatformError>;

    async fn remove_cookie(&self, target: &CookieTarget) -> Result<CookieRemoval, PlatformError>;

    async fn remove_browsing_data(&self, scope: &RemovalScope) -> Result<RemovalReport, PlatformError>;

    /// Tabs whose URL matches a `*://host/*` pattern
    async fn query_tabs(&self, pattern: &str) -> Result<Vec<Tab>, PlatformError>;

    /// Inject into a tab and hand back its page context
    async fn attach(&self, tab: &Tab) -> Result<Box<dyn PageContext>, PlatformError>;

    async fn reload_tab(&self, tab: TabId) -> Result<(), PlatformError>;
}

/// Remove cookies for the domain and its dot-prefixed variant, one by one
pub async fn clear_cookies(host: &dyn BrowserHost, domain: &str) -> CountOutcome {
    let mut outcome = CountOutcome::default();
    let mut cookies = Vec::new();

    for variant in [domain.to_string(), format!(".{}", domain)] {
        match host.cookies_for_domain(&variant).await {
            Ok(found) => cookies.extend(found),
            Err(e) => outcome.errors.push(format!("{}: {}", variant, e)),
        }
    }

    for cookie in &cookies {
        match host.remove_cookie(&CookieTarget::from(cookie)).await {
            Ok(CookieRemoval::Removed) => outcome.cleared += 1,
            Ok(CookieRemoval::NotFound) | Err(PlatformError::NotFound { .. }) => {
                debug!(cookie = %cookie.name, "cookie already removed");
            }
            Err(e) => {
                warn!(cookie = %cookie.name, error = %e, "failed to remove cookie");
                outcome.errors.push(format!("{}: {}", cookie.name, e));
            }
        }
    }
    outcome
}

/// Run the page-context cache clear inside every tab open on the domain
pub async fn clear_cache_storage(host: &dyn BrowserHost, domain: &str) -> CountOutcome {
    let pattern = format!("*://{}/*", domain);
    let tabs = match host.query_tabs(&pattern).await {
        Ok(tabs) => tabs,
        Err(e) => {
            debug!(%pattern, error = %e, "no tabs reachable for cache clearing");
            return CountOutcome::default();
        }
    };

    let mut outcome = CountOutcome::default();
    for tab in &tabs {
        match host.attach(tab).await {
            Ok(page) => {
                let cleared = page::clear_cache_storage(page.as_ref()).await;
                outcome.cleared += cleared.cleared;
                outcome.errors.extend(cleared.errors);
            }
            Err(e) => outcome.errors.push(format!("tab {}: {}", tab.id, e)),
        }
    }
    outcome
}
