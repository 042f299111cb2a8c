//! Page-context clearers: run with direct access to one page's storage objects.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::capabilities::StorageCapabilities;
use super::category::{CountOutcome, DatabaseDeletion, FlagOutcome};
use crate::common::errors::PlatformError;
use crate::common::site::parent_domain;

/// Where an expiring cookie write is scoped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieScope {
    /// `None` writes a host-only cookie
    pub domain: Option<String>,
    pub path: String,
}

impl CookieScope {
    pub fn host_only() -> Self {
        Self {
            domain: None,
            path: "/".to_string(),
        }
    }

    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            path: "/".to_string(),
        }
    }
}

/// Storage objects of a single page.
#[async_trait]
pub trait PageContext: Send + Sync {
    /// Hostname of the page's location
    fn hostname(&self) -> &str;

    fn capabilities(&self) -> StorageCapabilities;

    /// Names of the cookies the document can see
    async fn cookie_names(&self) -> Result<Vec<String>, PlatformError>;

    /// Overwrite a cookie with an already-past expiry
    async fn expire_cookie(&self, name: &str, scope: &CookieScope) -> Result<(), PlatformError>;

    async fn clear_local_storage(&self) -> Result<(), PlatformError>;

    async fn clear_session_storage(&self) -> Result<(), PlatformError>;

    async fn database_names(&self) -> Result<Vec<String>, PlatformError>;

    async fn delete_database(&self, name: &str) -> DatabaseDeletion;

    async fn cache_names(&self) -> Result<Vec<String>, PlatformError>;

    /// Returns false when the cache was already gone
    async fn delete_cache(&self, name: &str) -> Result<bool, PlatformError>;

    /// Reload the page after a successful clear
    async fn reload(&self) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported { operation: "reload" })
    }
}

/// Expire every visible cookie for the path, host and parent-domain variants
pub async fn clear_cookies(page: &dyn PageContext) -> CountOutcome {
    let names = match page.cookie_names().await {
        Ok(names) => names,
        Err(e) => return CountOutcome::failed(e.to_string()),
    };

    let host = page.hostname().to_string();
    let mut scopes = vec![CookieScope::host_only(), CookieScope::domain(host.clone())];
    if let Some(parent) = parent_domain(&host) {
        scopes.push(CookieScope::domain(format!(".{}", parent)));
    }

    let mut outcome = CountOutcome::default();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let mut failure = None;
        for scope in &scopes {
            if let Err(e) = page.expire_cookie(name, scope).await {
                failure = Some(e);
                break;
            }
        }
        match failure {
            None => outcome.cleared += 1,
            Some(e) => outcome.errors.push(format!("{}: {}", name, e)),
        }
    }
    debug!(host = %host, cleared = outcome.cleared, "expired page cookies");
    outcome
}

pub async fn clear_local_storage(page: &dyn PageContext) -> FlagOutcome {
    match page.clear_local_storage().await {
        Ok(()) => FlagOutcome::cleared(),
        Err(e) => FlagOutcome::failed(e.to_string()),
    }
}

pub async fn clear_session_storage(page: &dyn PageContext) -> FlagOutcome {
    match page.clear_session_storage().await {
        Ok(()) => FlagOutcome::cleared(),
        Err(e) => FlagOutcome::failed(e.to_string()),
    }
}

/// Delete every database, one at a time, counting blocked deletes as cleared
pub async fn clear_indexed_db(page: &dyn PageContext) -> CountOutcome {
    let names = match page.database_names().await {
        Ok(names) => names,
        Err(e) => return CountOutcome::failed(e.to_string()),
    };

    let mut outcome = CountOutcome::default();
    for name in names {
        match page.delete_database(&name).await {
            DatabaseDeletion::Completed => outcome.cleared += 1,
            DatabaseDeletion::Blocked => {
                warn!(database = %name, host = page.hostname(), "IndexedDB deletion blocked");
                outcome.cleared += 1;
            }
            DatabaseDeletion::Failed(message) => {
                outcome.errors.push(format!("{}: {}", name, message));
            }
        }
    }
    outcome
}

pub async fn clear_cache_storage(page: &dyn PageContext) -> CountOutcome {
    let names = match page.cache_names().await {
        Ok(names) => names,
        Err(e) => return CountOutcome::failed(e.to_string()),
    };

    let mut outcome = CountOutcome::default();
    for name in names {
        match page.delete_cache(&name).await {
            Ok(true) => outcome.cleared += 1,
            Ok(false) => debug!(cache = %name, "cache already deleted"),
            Err(e) => outcome.errors.push(format!("{}: {}", name, e)),
        }
    }
    outcome
}
