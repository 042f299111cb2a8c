use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::messages::{Request, Response};
use crate::common::errors::{Result, SiteWipeError};
use crate::common::site::domain_from_url;
use crate::storage::orchestrator::{ClearRequest, Notifier, Orchestrator, Surface};
use crate::storage::privileged::{BrowserHost, Tab};
use crate::storage::report::ClearResult;
use crate::store::managed::ManagedSites;
use crate::store::namespace::Namespace;
use crate::store::settings::Settings;

pub const CONTEXT_MENU_ID: &str = "clear-site-storage";
pub const CONTEXT_MENU_TITLE: &str = "Clear storage for this site";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallReason {
    Install,
    Update,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
}

/// One managed site's result within a bulk clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteClear {
    pub domain: String,
    pub result: ClearResult,
}

/// Outcome of clearing managed sites one after another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkClear {
    pub cleared: usize,
    pub failed: usize,
    pub results: Vec<SiteClear>,
}

/// The privileged background context: message handler plus event listeners.
pub struct Background {
    orchestrator: Orchestrator,
    sync: Namespace,
    sites: ManagedSites,
}

impl Background {
    pub fn new(host: Arc<dyn BrowserHost>, sync: Namespace, local: Namespace) -> Self {
        Self {
            orchestrator: Orchestrator::new(Surface::Privileged(host)),
            sync,
            sites: ManagedSites::new(local),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.orchestrator = self.orchestrator.with_notifier(notifier);
        self
    }

    pub fn sites(&self) -> &ManagedSites {
        &self.sites
    }

    pub fn settings(&self) -> Result<Settings> {
        Settings::load(&self.sync)
    }

    /// First install writes the default settings; updates keep the user's
    pub fn on_installed(&self, reason: InstallReason) -> Result<()> {
        if reason == InstallReason::Install {
            Settings::install_defaults(&self.sync)?;
            info!("default settings installed");
        }
        Ok(())
    }

    pub async fn handle_message(&self, request: Request) -> Response {
        match request {
            Request::ClearSite {
                domain,
                url,
                settings,
            } => {
                let request = ClearRequest::new(domain, settings).with_source(url, None);
                Response::from(self.clear_site(&request).await)
            }
            Request::GetSettings => match self.settings() {
                Ok(settings) => Response::Settings { settings },
                Err(e) => {
                    error!(error = %e, "failed to read settings");
                    Response::failed(e.to_string())
                }
            },
            Request::RefreshButton => {
                Response::failed("refreshButton is handled by the content script")
            }
        }
    }

    pub async fn clear_site(&self, request: &ClearRequest) -> ClearResult {
        info!(domain = %request.domain, "clearing site storage");
        self.orchestrator.clear(request).await
    }

    /// Clear one managed site, or every managed site when `domain` is `None`,
    /// with the stored settings. A failing site never stops the rest.
    pub async fn clear_managed(&self, domain: Option<&str>) -> Result<BulkClear> {
        let settings = self.settings()?;
        let sites = match domain {
            Some(domain) => {
                let site = self.sites.find(domain)?.ok_or_else(|| SiteWipeError::SiteNotFound {
                    domain: domain.to_string(),
                })?;
                vec![site]
            }
            None => self.sites.list()?,
        };

        let mut bulk = BulkClear::default();
        for site in sites {
            let request = ClearRequest::new(site.domain.clone(), settings);
            let result = self.clear_site(&request).await;
            if result.success {
                bulk.cleared += 1;
            } else {
                warn!(domain = %site.domain, error = ?result.error, "managed site clear failed");
                bulk.failed += 1;
            }
            bulk.results.push(SiteClear {
                domain: site.domain,
                result,
            });
        }
        info!(cleared = bulk.cleared, failed = bulk.failed, "cleared managed sites");
        Ok(bulk)
    }

    /// Navigation listener: auto-clear managed sites once a page finishes loading
    pub async fn on_tab_updated(&self, tab: &Tab, status: TabStatus) -> Option<ClearResult> {
        if status != TabStatus::Complete || tab.url.is_empty() {
            return None;
        }
        let domain = match domain_from_url(&tab.url) {
            Ok(domain) => domain,
            Err(e) => {
                debug!(url = %tab.url, error = %e, "skipping auto-clear check");
                return None;
            }
        };
        self.check_auto_clear(&domain, Some(tab)).await
    }

    /// Clear `domain` only if auto-clear is on and the domain is managed
    pub async fn check_auto_clear(&self, domain: &str, tab: Option<&Tab>) -> Option<ClearResult> {
        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "auto-clear check failed");
                return None;
            }
        };
        if !settings.auto_clear {
            return None;
        }
        match self.sites.contains(domain) {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                error!(error = %e, "auto-clear check failed");
                return None;
            }
        }

        info!(%domain, "auto-clearing storage for managed site");
        let request = ClearRequest::new(domain, settings)
            .with_source(tab.map(|t| t.url.clone()), tab.map(|t| t.id));
        Some(self.clear_site(&request).await)
    }

    /// Context-menu click: clear with current settings, reload on success
    pub async fn on_menu_clicked(&self, menu_id: &str, tab: &Tab) -> Option<ClearResult> {
        if menu_id != CONTEXT_MENU_ID || tab.url.is_empty() {
            return None;
        }
        let domain = match domain_from_url(&tab.url) {
            Ok(domain) => domain,
            Err(e) => {
                error!(url = %tab.url, error = %e, "cannot clear from context menu");
                return None;
            }
        };
        let settings = match self.settings() {
            Ok(settings) => settings,
            Err(e) => {
                error!(error = %e, "cannot clear from context menu");
                return None;
            }
        };

        let request = ClearRequest::new(domain, settings)
            .with_source(Some(tab.url.clone()), Some(tab.id))
            .reloading(true);
        Some(self.clear_site(&request).await)
    }
}
