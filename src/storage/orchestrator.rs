use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::capabilities::StorageCapabilities;
use super::category::{Category, CategoryOutcome, CountOutcome, FlagOutcome};
use super::page::{self, PageContext};
use super::privileged::{self, BrowserHost, RemovalReport, RemovalScope, TabId};
use super::report::{ClearResult, PerCategory};
use crate::common::errors::PlatformError;
use crate::common::site::validate_domain;
use crate::store::settings::Settings;

/// Where the orchestrator runs, and therefore which clearers it uses.
#[derive(Clone)]
pub enum Surface {
    /// Direct access to one page's storage objects
    Page(Arc<dyn PageContext>),
    /// Origin-scoped bulk removal APIs
    Privileged(Arc<dyn BrowserHost>),
}

impl Surface {
    pub fn capabilities(&self) -> StorageCapabilities {
        match self {
            Surface::Page(page) => page.capabilities(),
            Surface::Privileged(host) => host.capabilities(),
        }
    }
}

/// A completion notice shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn cleared(domain: &str) -> Self {
        Self {
            title: "Storage Cleared".to_string(),
            message: format!("Cleared storage for {}", domain),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<(), PlatformError>;
}

/// Everything a surface adapter hands to the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ClearRequest {
    pub domain: String,
    pub source_url: Option<String>,
    pub settings: Settings,
    /// Tab the request came from, if any
    pub tab: Option<TabId>,
    /// Reload the source page after a successful clear
    pub reload: bool,
}

impl ClearRequest {
    pub fn new(domain: impl Into<String>, settings: Settings) -> Self {
        Self {
            domain: domain.into(),
            source_url: None,
            settings,
            tab: None,
            reload: false,
        }
    }

    pub fn with_source(mut self, url: Option<String>, tab: Option<TabId>) -> Self {
        self.source_url = url;
        self.tab = tab;
        self
    }

    pub fn reloading(mut self, reload: bool) -> Self {
        self.reload = reload;
        self
    }
}

/// Per-category dispatch decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Skip,
    Unavailable,
    Run,
}

impl Slot {
    fn decide(settings: &Settings, caps: &StorageCapabilities, category: Category) -> Self {
        if !settings.clears(category) {
            Slot::Skip
        } else if !caps.supports(category) {
            Slot::Unavailable
        } else {
            Slot::Run
        }
    }
}

/// Await `work` only if the slot says so
async fn dispatch<F>(slot: Slot, category: Category, work: F) -> Option<CategoryOutcome>
where
    F: Future<Output = CategoryOutcome>,
{
    match slot {
        Slot::Skip => None,
        Slot::Unavailable => {
            debug!(%category, "category not available in this context");
            Some(CategoryOutcome::unavailable(category))
        }
        Slot::Run => Some(work.await),
    }
}

/// Clears every enabled storage category for one site.
pub struct Orchestrator {
    surface: Surface,
    capabilities: StorageCapabilities,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Orchestrator {
    pub fn new(surface: Surface) -> Self {
        let capabilities = surface.capabilities();
        Self {
            surface,
            capabilities,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn capabilities(&self) -> StorageCapabilities {
        self.capabilities
    }

    /// Clear all enabled categories for `request.domain`.
    ///
    /// Category failures land in their own result slot; only invalid input
    /// makes the overall result unsuccessful.
    pub async fn clear(&self, request: &ClearRequest) -> ClearResult {
        let domain = request.domain.trim();
        if let Err(e) = validate_domain(domain) {
            error!(domain = %request.domain, error = %e, "refusing to clear");
            return ClearResult::aborted(e.to_string(), PerCategory::default());
        }

        let slots: Vec<(Category, Slot)> = Category::ALL
            .into_iter()
            .map(|c| (c, Slot::decide(&request.settings, &self.capabilities, c)))
            .collect();
        let slot = |category: Category| {
            slots
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, s)| *s)
                .unwrap_or(Slot::Skip)
        };

        debug!(%domain, ?slots, "dispatching category clearers");

        let per_category = match &self.surface {
            Surface::Page(page) => {
                if !page.hostname().eq_ignore_ascii_case(domain) {
                    let message = format!(
                        "page is on '{}', cannot clear '{}' from it",
                        page.hostname(),
                        domain
                    );
                    error!(%message, "refusing to clear");
                    return ClearResult::aborted(message, PerCategory::default());
                }
                clear_page(page.as_ref(), slot).await
            }
            Surface::Privileged(host) => clear_privileged(host.as_ref(), domain, slot).await,
        };

        info!(
            %domain,
            categories = per_category.attempted().len(),
            cleared = per_category.total_cleared(),
            errors = per_category.error_count(),
            "storage cleared"
        );

        let result = ClearResult::completed(per_category);
        self.post_actions(domain, request, &result).await;
        result
    }

    async fn post_actions(&self, domain: &str, request: &ClearRequest, result: &ClearResult) {
        if request.settings.show_notifications {
            match &self.notifier {
                Some(notifier) => {
                    if let Err(e) = notifier.notify(&Notice::cleared(domain)).await {
                        warn!(error = %e, "notification failed");
                    }
                }
                None => debug!("no notifier attached"),
            }
        }

        if request.reload && result.success {
            let reloaded = match (&self.surface, request.tab) {
                (Surface::Page(page), _) => page.reload().await,
                (Surface::Privileged(host), Some(tab)) => host.reload_tab(tab).await,
                (Surface::Privileged(_), None) => {
                    debug!("reload requested without a source tab");
                    Ok(())
                }
            };
            if let Err(e) = reloaded {
                warn!(error = %e, "reload failed");
            }
        }
    }
}

async fn clear_page<S>(ctx: &dyn PageContext, slot: S) -> PerCategory
where
    S: Fn(Category) -> Slot,
{
    let (cookies, local, session, idb, cache) = futures::join!(
        dispatch(slot(Category::Cookies), Category::Cookies, async {
            CategoryOutcome::Cookies(page::clear_cookies(ctx).await)
        }),
        dispatch(slot(Category::LocalStorage), Category::LocalStorage, async {
            CategoryOutcome::LocalStorage(page::clear_local_storage(ctx).await)
        }),
        dispatch(slot(Category::SessionStorage), Category::SessionStorage, async {
            CategoryOutcome::SessionStorage(page::clear_session_storage(ctx).await)
        }),
        dispatch(slot(Category::IndexedDb), Category::IndexedDb, async {
            CategoryOutcome::IndexedDb(page::clear_indexed_db(ctx).await)
        }),
        dispatch(slot(Category::CacheStorage), Category::CacheStorage, async {
            CategoryOutcome::CacheStorage(page::clear_cache_storage(ctx).await)
        }),
    );
    PerCategory::merge([cookies, local, session, idb, cache].into_iter().flatten())
}

async fn clear_privileged<S>(host: &dyn BrowserHost, domain: &str, slot: S) -> PerCategory
where
    S: Fn(Category) -> Slot,
{
    let local_slot = slot(Category::LocalStorage);
    let session_slot = slot(Category::SessionStorage);
    let idb_slot = slot(Category::IndexedDb);

    // localStorage, sessionStorage and IndexedDB share one bulk removal
    let scope = RemovalScope::for_domain(
        domain,
        local_slot == Slot::Run || session_slot == Slot::Run,
        idb_slot == Slot::Run,
    );

    let (cookies, bulk, cache) = futures::join!(
        dispatch(slot(Category::Cookies), Category::Cookies, async {
            CategoryOutcome::Cookies(privileged::clear_cookies(host, domain).await)
        }),
        async {
            if scope.is_empty() {
                None
            } else {
                Some(host.remove_browsing_data(&scope).await)
            }
        },
        dispatch(slot(Category::CacheStorage), Category::CacheStorage, async {
            CategoryOutcome::CacheStorage(privileged::clear_cache_storage(host, domain).await)
        }),
    );

    let bulk = bulk.map(|r| r.map_err(|e| e.to_string()));
    let flag = |slot: Slot, category: Category| -> Option<FlagOutcome> {
        match slot {
            Slot::Skip => None,
            Slot::Unavailable => Some(FlagOutcome::unavailable()),
            Slot::Run => Some(match &bulk {
                Some(Ok(_)) => FlagOutcome::cleared(),
                Some(Err(e)) => FlagOutcome::failed(e.clone()),
                None => FlagOutcome::failed(format!("{} was not part of the removal", category)),
            }),
        }
    };
    let local = flag(local_slot, Category::LocalStorage).map(CategoryOutcome::LocalStorage);
    let session = flag(session_slot, Category::SessionStorage).map(CategoryOutcome::SessionStorage);
    let idb = match idb_slot {
        Slot::Skip => None,
        Slot::Unavailable => Some(CountOutcome::default()),
        Slot::Run => Some(match &bulk {
            Some(Ok(RemovalReport { databases, .. })) => CountOutcome {
                cleared: *databases,
                errors: Vec::new(),
            },
            Some(Err(e)) => CountOutcome::failed(e.clone()),
            None => CountOutcome::default(),
        }),
    }
    .map(CategoryOutcome::IndexedDb);

    PerCategory::merge([cookies, local, session, idb, cache].into_iter().flatten())
}
