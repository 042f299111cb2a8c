//! In-memory surfaces shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use sitewipe::common::errors::PlatformError;
use sitewipe::extension::PageDocument;
use sitewipe::storage::category::{Category, DatabaseDeletion};
use sitewipe::storage::orchestrator::{Notice, Notifier};
use sitewipe::storage::page::{CookieScope, PageContext};
use sitewipe::storage::privileged::{
    BrowserHost, CookieRecord, CookieRemoval, CookieTarget, RemovalReport, RemovalScope, Tab, TabId,
};
use sitewipe::storage::StorageCapabilities;

// ─── Page ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PageState {
    pub cookies: Vec<String>,
    pub local_items: usize,
    pub session_items: usize,
    pub databases: Vec<String>,
    pub caches: Vec<String>,
    pub failing_cookies: Vec<String>,
    pub blocked_databases: Vec<String>,
    pub failing_databases: Vec<(String, String)>,
    pub failing_caches: Vec<String>,
    pub database_list_error: Option<String>,
    pub cache_list_error: Option<String>,
    pub local_error: Option<String>,
    pub expire_calls: Vec<(String, CookieScope)>,
    pub reloads: usize,
}

/// A page whose storage lives in memory. Clones share state, so a handle
/// given to a host's `attach` observes the same storage as the test.
#[derive(Clone)]
pub struct FakePage {
    host: String,
    caps: StorageCapabilities,
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            caps: StorageCapabilities::all(),
            state: Arc::new(Mutex::new(PageState::default())),
        }
    }

    pub fn with_cookies(self, names: &[&str]) -> Self {
        self.state().cookies = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_storage(self, local: usize, session: usize) -> Self {
        {
            let mut state = self.state();
            state.local_items = local;
            state.session_items = session;
        }
        self
    }

    pub fn with_databases(self, names: &[&str]) -> Self {
        self.state().databases = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_caches(self, names: &[&str]) -> Self {
        self.state().caches = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn failing_cookie(self, name: &str) -> Self {
        self.state().failing_cookies.push(name.to_string());
        self
    }

    pub fn blocked_database(self, name: &str) -> Self {
        self.state().blocked_databases.push(name.to_string());
        self
    }

    pub fn failing_database(self, name: &str, message: &str) -> Self {
        self.state().failing_databases.push((name.to_string(), message.to_string()));
        self
    }

    pub fn failing_cache(self, name: &str) -> Self {
        self.state().failing_caches.push(name.to_string());
        self
    }

    pub fn failing_database_list(self, message: &str) -> Self {
        self.state().database_list_error = Some(message.to_string());
        self
    }

    pub fn failing_cache_list(self, message: &str) -> Self {
        self.state().cache_list_error = Some(message.to_string());
        self
    }

    pub fn failing_local_storage(self, message: &str) -> Self {
        self.state().local_error = Some(message.to_string());
        self
    }

    pub fn without(mut self, category: Category) -> Self {
        self.caps = self.caps.without(category);
        self
    }

    pub fn state(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl PageContext for FakePage {
    fn hostname(&self) -> &str {
        &self.host
    }

    fn capabilities(&self) -> StorageCapabilities {
        self.caps
    }

    async fn cookie_names(&self) -> Result<Vec<String>, PlatformError> {
        Ok(self.state().cookies.clone())
    }

    async fn expire_cookie(&self, name: &str, scope: &CookieScope) -> Result<(), PlatformError> {
        let mut state = self.state();
        state.expire_calls.push((name.to_string(), scope.clone()));
        if state.failing_cookies.iter().any(|n| n == name) {
            return Err(PlatformError::other("cookie is locked"));
        }
        state.cookies.retain(|n| n != name);
        Ok(())
    }

    async fn clear_local_storage(&self) -> Result<(), PlatformError> {
        let mut state = self.state();
        if let Some(message) = &state.local_error {
            return Err(PlatformError::other(message.clone()));
        }
        state.local_items = 0;
        Ok(())
    }

    async fn clear_session_storage(&self) -> Result<(), PlatformError> {
        self.state().session_items = 0;
        Ok(())
    }

    async fn database_names(&self) -> Result<Vec<String>, PlatformError> {
        let state = self.state();
        if let Some(message) = &state.database_list_error {
            return Err(PlatformError::other(message.clone()));
        }
        Ok(state.databases.clone())
    }

    async fn delete_database(&self, name: &str) -> DatabaseDeletion {
        let mut state = self.state();
        if let Some((_, message)) = state.failing_databases.iter().find(|(n, _)| n == name) {
            return DatabaseDeletion::Failed(message.clone());
        }
        let blocked = state.blocked_databases.iter().any(|n| n == name);
        state.databases.retain(|n| n != name);
        if blocked {
            DatabaseDeletion::Blocked
        } else {
            DatabaseDeletion::Completed
        }
    }

    async fn cache_names(&self) -> Result<Vec<String>, PlatformError> {
        let state = self.state();
        if let Some(message) = &state.cache_list_error {
            return Err(PlatformError::other(message.clone()));
        }
        Ok(state.caches.clone())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, PlatformError> {
        let mut state = self.state();
        if state.failing_caches.iter().any(|n| n == name) {
            return Err(PlatformError::other("cache entry in use"));
        }
        let before = state.caches.len();
        state.caches.retain(|n| n != name);
        Ok(state.caches.len() < before)
    }

    async fn reload(&self) -> Result<(), PlatformError> {
        self.state().reloads += 1;
        Ok(())
    }
}

// ─── Host ────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct HostState {
    pub cookies: Vec<CookieRecord>,
    pub databases: usize,
    pub bulk_error: Option<String>,
    pub removals: Vec<RemovalScope>,
    pub tabs: Vec<(Tab, FakePage)>,
    pub tab_query_error: bool,
    pub failing_attach: Vec<TabId>,
    pub failing_cookies: Vec<String>,
    pub cookie_queries: Vec<String>,
    pub reloaded: Vec<TabId>,
}

/// A privileged host over an in-memory cookie jar and a set of open tabs.
pub struct FakeHost {
    caps: StorageCapabilities,
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            caps: StorageCapabilities::all(),
            state: Mutex::new(HostState::default()),
        }
    }

    pub fn with_cookie(self, name: &str, domain: &str) -> Self {
        self.state().cookies.push(CookieRecord {
            name: name.to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            secure: true,
            store_id: "0".to_string(),
        });
        self
    }

    pub fn with_databases(self, count: usize) -> Self {
        self.state().databases = count;
        self
    }

    pub fn with_tab(self, id: TabId, url: &str, page: FakePage) -> Self {
        self.state().tabs.push((
            Tab {
                id,
                url: url.to_string(),
            },
            page,
        ));
        self
    }

    pub fn failing_bulk(self, message: &str) -> Self {
        self.state().bulk_error = Some(message.to_string());
        self
    }

    pub fn failing_cookie(self, name: &str) -> Self {
        self.state().failing_cookies.push(name.to_string());
        self
    }

    pub fn failing_tab_query(self) -> Self {
        self.state().tab_query_error = true;
        self
    }

    pub fn failing_attach(self, tab: TabId) -> Self {
        self.state().failing_attach.push(tab);
        self
    }

    pub fn without(mut self, category: Category) -> Self {
        self.caps = self.caps.without(category);
        self
    }

    pub fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().unwrap()
    }

    /// Total calls that touched storage at all
    pub fn storage_calls(&self) -> usize {
        let state = self.state();
        state.cookie_queries.len() + state.removals.len()
    }
}

#[async_trait]
impl BrowserHost for FakeHost {
    fn capabilities(&self) -> StorageCapabilities {
        self.caps
    }

    async fn cookies_for_domain(&self, domain: &str) -> Result<Vec<CookieRecord>, PlatformError> {
        let mut state = self.state();
        state.cookie_queries.push(domain.to_string());
        Ok(state
            .cookies
            .iter()
            .filter(|c| c.domain == domain)
            .cloned()
            .collect())
    }

    async fn remove_cookie(&self, target: &CookieTarget) -> Result<CookieRemoval, PlatformError> {
        let mut state = self.state();
        if state.failing_cookies.contains(&target.name) {
            return Err(PlatformError::other("removal rejected"));
        }
        let before = state.cookies.len();
        state
            .cookies
            .retain(|c| !(c.name == target.name && c.removal_url() == target.url));
        Ok(if state.cookies.len() < before {
            CookieRemoval::Removed
        } else {
            CookieRemoval::NotFound
        })
    }

    async fn remove_browsing_data(&self, scope: &RemovalScope) -> Result<RemovalReport, PlatformError> {
        let mut state = self.state();
        state.removals.push(scope.clone());
        if let Some(message) = &state.bulk_error {
            return Err(PlatformError::other(message.clone()));
        }
        let databases = if scope.indexed_db {
            std::mem::take(&mut state.databases)
        } else {
            0
        };
        Ok(RemovalReport { databases, bytes: 0 })
    }

    async fn query_tabs(&self, pattern: &str) -> Result<Vec<Tab>, PlatformError> {
        let state = self.state();
        if state.tab_query_error {
            return Err(PlatformError::other("tabs permission missing"));
        }
        let host = pattern.trim_start_matches("*://").trim_end_matches("/*");
        Ok(state
            .tabs
            .iter()
            .filter(|(_, page)| page.hostname() == host)
            .map(|(tab, _)| tab.clone())
            .collect())
    }

    async fn attach(&self, tab: &Tab) -> Result<Box<dyn PageContext>, PlatformError> {
        let state = self.state();
        if state.failing_attach.contains(&tab.id) {
            return Err(PlatformError::other("tab was discarded"));
        }
        state
            .tabs
            .iter()
            .find(|(t, _)| t.id == tab.id)
            .map(|(_, page)| Box::new(page.clone()) as Box<dyn PageContext>)
            .ok_or_else(|| PlatformError::NotFound {
                what: format!("tab {}", tab.id),
            })
    }

    async fn reload_tab(&self, tab: TabId) -> Result<(), PlatformError> {
        self.state().reloaded.push(tab);
        Ok(())
    }
}

// ─── Notifier ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeNotifier {
    pub notices: Mutex<Vec<Notice>>,
    pub fail: bool,
}

impl FakeNotifier {
    pub fn failing() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn count(&self) -> usize {
        self.notices.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), PlatformError> {
        self.notices.lock().unwrap().push(notice.clone());
        if self.fail {
            return Err(PlatformError::other("notifications disabled by the OS"));
        }
        Ok(())
    }
}

// ─── Document ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub container: Option<String>,
    pub label: String,
    pub disabled: bool,
}

/// DOM stand-in recording the elements the content script manages.
pub struct FakeDocument {
    pub elements: Mutex<HashMap<String, Element>>,
    pub confirm_answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeDocument {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            elements: Mutex::new(HashMap::new()),
            confirm_answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn element(&self, id: &str) -> Option<Element> {
        self.elements.lock().unwrap().get(id).cloned()
    }

    pub fn element_count(&self) -> usize {
        self.elements.lock().unwrap().len()
    }
}

impl PageDocument for FakeDocument {
    fn has_element(&self, id: &str) -> bool {
        self.elements.lock().unwrap().contains_key(id)
    }

    fn insert_button(&self, container: Option<&str>, id: &str, label: &str) -> Result<(), PlatformError> {
        self.elements.lock().unwrap().insert(
            id.to_string(),
            Element {
                container: container.map(str::to_string),
                label: label.to_string(),
                disabled: false,
            },
        );
        Ok(())
    }

    fn remove_element(&self, id: &str) -> bool {
        self.elements.lock().unwrap().remove(id).is_some()
    }

    fn update_button(&self, id: &str, label: &str, disabled: bool) {
        if let Some(element) = self.elements.lock().unwrap().get_mut(id) {
            element.label = label.to_string();
            element.disabled = disabled;
        }
    }

    fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.confirm_answer
    }
}
