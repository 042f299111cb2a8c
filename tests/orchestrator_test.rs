mod common;

use std::sync::Arc;

use common::{FakeHost, FakeNotifier, FakePage};
use sitewipe::storage::category::{Category, CountOutcome, FlagOutcome};
use sitewipe::storage::orchestrator::{ClearRequest, Orchestrator, Surface};
use sitewipe::storage::page::CookieScope;
use sitewipe::store::Settings;

fn page_orchestrator(page: &FakePage) -> Orchestrator {
    Orchestrator::new(Surface::Page(Arc::new(page.clone())))
}

fn host_orchestrator(host: &Arc<FakeHost>) -> Orchestrator {
    Orchestrator::new(Surface::Privileged(host.clone()))
}

fn all_off() -> Settings {
    Settings::default().only(&[])
}

// ─── Page surface ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_result_keys_match_enabled_categories() {
    let page = FakePage::new("example.com")
        .with_cookies(&["a"])
        .with_storage(2, 1)
        .with_databases(&["db"])
        .with_caches(&["v1"]);
    let settings = Settings::default().only(&[Category::Cookies, Category::IndexedDb]);

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    assert!(result.success);
    assert_eq!(
        result.per_category.attempted(),
        vec![Category::Cookies, Category::IndexedDb]
    );
    let json = serde_json::to_value(&result).unwrap();
    let keys: Vec<&String> = json["perCategory"].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(json["perCategory"].get("indexedDB").is_some());

    // Disabled categories stay untouched
    assert_eq!(page.state().local_items, 2);
    assert_eq!(page.state().caches, vec!["v1"]);
}

#[tokio::test]
async fn test_all_disabled_is_empty_success() {
    let page = FakePage::new("example.com").with_cookies(&["a"]);
    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", all_off()))
        .await;

    assert!(result.success);
    assert!(result.per_category.is_empty());
    assert_eq!(page.state().cookies, vec!["a"]);
}

#[tokio::test]
async fn test_three_cookies_with_cache_disabled() {
    let page = FakePage::new("example.com")
        .with_cookies(&["a", "b", "c"])
        .with_storage(5, 0)
        .with_caches(&["static"]);
    let mut settings = Settings::default();
    settings.clear_cache = false;

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    assert!(result.success);
    let cookies = result.per_category.cookies.as_ref().unwrap();
    assert_eq!(cookies.cleared, 3);
    assert!(cookies.errors.is_empty());
    assert_eq!(result.per_category.local_storage, Some(FlagOutcome::cleared()));
    assert!(result.per_category.cache_storage.is_none());
    assert_eq!(page.state().caches, vec!["static"]);
}

#[tokio::test]
async fn test_cookie_failure_is_isolated() {
    let page = FakePage::new("example.com")
        .with_cookies(&["a", "locked", "c"])
        .with_storage(1, 1)
        .failing_cookie("locked");

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", Settings::default()))
        .await;

    assert!(result.success);
    let cookies = result.per_category.cookies.as_ref().unwrap();
    assert_eq!(cookies.cleared, 2);
    assert_eq!(cookies.errors.len(), 1);
    assert!(cookies.errors[0].starts_with("locked:"));
    assert_eq!(result.per_category.local_storage, Some(FlagOutcome::cleared()));
    assert_eq!(result.per_category.session_storage, Some(FlagOutcome::cleared()));
}

#[tokio::test]
async fn test_cookie_scopes_cover_host_and_parent() {
    let page = FakePage::new("www.example.com").with_cookies(&["sid"]);
    let settings = Settings::default().only(&[Category::Cookies]);

    page_orchestrator(&page)
        .clear(&ClearRequest::new("www.example.com", settings))
        .await;

    let scopes: Vec<CookieScope> = page.state().expire_calls.iter().map(|(_, s)| s.clone()).collect();
    assert_eq!(
        scopes,
        vec![
            CookieScope::host_only(),
            CookieScope::domain("www.example.com"),
            CookieScope::domain(".example.com"),
        ]
    );
}

#[tokio::test]
async fn test_clearing_is_idempotent() {
    let page = FakePage::new("example.com")
        .with_cookies(&["a", "b"])
        .with_databases(&["x", "y"])
        .with_caches(&["v1"]);
    let orchestrator = page_orchestrator(&page);
    let request = ClearRequest::new("example.com", Settings::default());

    let first = orchestrator.clear(&request).await;
    let second = orchestrator.clear(&request).await;

    assert!(first.success && second.success);
    assert_eq!(first.per_category.total_cleared(), 5);
    assert_eq!(second.per_category.total_cleared(), 0);
    assert_eq!(second.per_category.attempted(), first.per_category.attempted());
    assert_eq!(second.per_category.error_count(), 0);
}

#[tokio::test]
async fn test_blocked_database_counts_as_cleared() {
    let page = FakePage::new("example.com")
        .with_databases(&["open-db", "idle-db"])
        .blocked_database("open-db");
    let settings = Settings::default().only(&[Category::IndexedDb]);

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    let idb = result.per_category.indexed_db.unwrap();
    assert_eq!(idb.cleared, 2);
    assert!(idb.errors.is_empty());
}

#[tokio::test]
async fn test_enumeration_failure_reports_single_error() {
    let page = FakePage::new("example.com")
        .with_databases(&["db"])
        .with_caches(&["v1"])
        .failing_database_list("InvalidStateError")
        .failing_cache_list("SecurityError");
    let settings = Settings::default().only(&[Category::IndexedDb, Category::CacheStorage]);

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    assert!(result.success);
    assert_eq!(
        result.per_category.indexed_db,
        Some(CountOutcome {
            cleared: 0,
            errors: vec!["InvalidStateError".to_string()],
        })
    );
    assert_eq!(
        result.per_category.cache_storage,
        Some(CountOutcome {
            cleared: 0,
            errors: vec!["SecurityError".to_string()],
        })
    );
    assert_eq!(page.state().databases, vec!["db"]);
    assert_eq!(page.state().caches, vec!["v1"]);
}

#[tokio::test]
async fn test_failed_items_are_prefixed_with_their_name() {
    let page = FakePage::new("example.com")
        .with_databases(&["broken-db", "app-db"])
        .with_caches(&["stuck", "v2"])
        .failing_database("broken-db", "UnknownError")
        .failing_cache("stuck");
    let settings = Settings::default().only(&[Category::IndexedDb, Category::CacheStorage]);

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    let idb = result.per_category.indexed_db.unwrap();
    assert_eq!(idb.cleared, 1);
    assert_eq!(idb.errors, vec!["broken-db: UnknownError"]);

    let cache = result.per_category.cache_storage.unwrap();
    assert_eq!(cache.cleared, 1);
    assert_eq!(cache.errors, vec!["stuck: cache entry in use"]);
    assert_eq!(page.state().caches, vec!["stuck"]);
}

#[tokio::test]
async fn test_local_storage_failure_recorded_in_slot() {
    let page = FakePage::new("example.com")
        .with_cookies(&["a"])
        .failing_local_storage("SecurityError");

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", Settings::default()))
        .await;

    assert!(result.success);
    let local = result.per_category.local_storage.as_ref().unwrap();
    assert!(!local.success);
    assert!(local.error.as_deref().unwrap().contains("SecurityError"));
    assert_eq!(result.per_category.cookies.as_ref().unwrap().cleared, 1);
}

#[tokio::test]
async fn test_unsupported_category_reports_not_available() {
    let page = FakePage::new("example.com")
        .with_storage(0, 3)
        .without(Category::SessionStorage)
        .without(Category::CacheStorage);

    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("example.com", Settings::default()))
        .await;

    assert!(result.success);
    assert_eq!(result.per_category.session_storage, Some(FlagOutcome::unavailable()));
    let cache = result.per_category.cache_storage.as_ref().unwrap();
    assert_eq!(cache.cleared, 0);
    assert!(cache.errors.is_empty());
    assert_eq!(page.state().session_items, 3);
}

#[tokio::test]
async fn test_page_refuses_other_domain() {
    let page = FakePage::new("example.com").with_cookies(&["a"]);
    let result = page_orchestrator(&page)
        .clear(&ClearRequest::new("other.org", Settings::default()))
        .await;

    assert!(!result.success);
    assert!(result.error.is_some());
    assert!(result.per_category.is_empty());
    assert_eq!(page.state().cookies, vec!["a"]);
}

#[tokio::test]
async fn test_page_reload_after_success() {
    let page = FakePage::new("example.com");
    let request = ClearRequest::new("example.com", Settings::default()).reloading(true);
    page_orchestrator(&page).clear(&request).await;
    assert_eq!(page.state().reloads, 1);
}

// ─── Input validation & post-actions ─────────────────────────────────────────

#[tokio::test]
async fn test_invalid_domain_runs_nothing() {
    let host = Arc::new(FakeHost::new().with_cookie("a", "example.com"));
    let orchestrator = host_orchestrator(&host);

    for bad in ["", "https://example.com", "example.com/path"] {
        let result = orchestrator
            .clear(&ClearRequest::new(bad, Settings::default()))
            .await;
        assert!(!result.success, "{bad:?} should abort");
        assert!(result.error.is_some());
        assert!(result.per_category.is_empty());
    }
    assert_eq!(host.storage_calls(), 0);
}

#[tokio::test]
async fn test_notification_failure_keeps_success() {
    let notifier = Arc::new(FakeNotifier::failing());
    let page = FakePage::new("example.com").with_cookies(&["a"]);
    let orchestrator = page_orchestrator(&page).with_notifier(notifier.clone());

    let result = orchestrator
        .clear(&ClearRequest::new("example.com", Settings::default()))
        .await;

    assert!(result.success);
    assert_eq!(notifier.count(), 1);
}

#[tokio::test]
async fn test_notifications_respect_setting() {
    let notifier = Arc::new(FakeNotifier::default());
    let page = FakePage::new("example.com");
    let orchestrator = page_orchestrator(&page).with_notifier(notifier.clone());

    let mut settings = Settings::default();
    settings.show_notifications = false;
    orchestrator.clear(&ClearRequest::new("example.com", settings)).await;
    assert_eq!(notifier.count(), 0);

    orchestrator
        .clear(&ClearRequest::new("example.com", Settings::default()))
        .await;
    let notices = notifier.notices.lock().unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].title, "Storage Cleared");
    assert_eq!(notices[0].message, "Cleared storage for example.com");
}

// ─── Privileged surface ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_privileged_clears_domain_and_dot_domain_cookies() {
    let host = Arc::new(
        FakeHost::new()
            .with_cookie("a", "example.com")
            .with_cookie("b", ".example.com")
            .with_cookie("other", "other.org"),
    );
    let settings = Settings::default().only(&[Category::Cookies]);

    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    let cookies = result.per_category.cookies.unwrap();
    assert_eq!(cookies.cleared, 2);
    assert!(cookies.errors.is_empty());
    let state = host.state();
    assert_eq!(state.cookie_queries, vec!["example.com", ".example.com"]);
    assert_eq!(state.cookies.len(), 1);
    assert_eq!(state.cookies[0].name, "other");
    assert!(state.removals.is_empty());
}

#[tokio::test]
async fn test_privileged_already_removed_cookie_is_not_an_error() {
    // Two records resolve to the same removal target; the second finds nothing
    let host = Arc::new(
        FakeHost::new()
            .with_cookie("sid", "example.com")
            .with_cookie("sid", "example.com"),
    );
    let settings = Settings::default().only(&[Category::Cookies]);

    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    let cookies = result.per_category.cookies.unwrap();
    assert_eq!(cookies.cleared, 1);
    assert!(cookies.errors.is_empty());
}

#[tokio::test]
async fn test_privileged_cookie_error_recorded() {
    let host = Arc::new(
        FakeHost::new()
            .with_cookie("a", "example.com")
            .with_cookie("b", "example.com")
            .failing_cookie("b"),
    );
    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", Settings::default().only(&[Category::Cookies])))
        .await;

    let cookies = result.per_category.cookies.unwrap();
    assert_eq!(cookies.cleared, 1);
    assert_eq!(cookies.errors.len(), 1);
    assert!(cookies.errors[0].starts_with("b:"));
}

#[tokio::test]
async fn test_privileged_bulk_removal_scope_and_counts() {
    let host = Arc::new(FakeHost::new().with_databases(3));
    let settings = Settings::default().only(&[
        Category::LocalStorage,
        Category::SessionStorage,
        Category::IndexedDb,
    ]);

    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    assert!(result.success);
    assert_eq!(result.per_category.local_storage, Some(FlagOutcome::cleared()));
    assert_eq!(result.per_category.session_storage, Some(FlagOutcome::cleared()));
    assert_eq!(result.per_category.indexed_db.as_ref().unwrap().cleared, 3);

    let state = host.state();
    assert_eq!(state.removals.len(), 1);
    let scope = &state.removals[0];
    assert_eq!(scope.origins, vec!["https://example.com", "http://example.com"]);
    assert!(scope.local_storage && scope.indexed_db);
}

#[tokio::test]
async fn test_privileged_bulk_failure_fills_each_slot() {
    let host = Arc::new(
        FakeHost::new()
            .with_cookie("a", "example.com")
            .failing_bulk("quota manager busy"),
    );
    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", Settings::default()))
        .await;

    assert!(result.success);
    assert_eq!(result.per_category.cookies.as_ref().unwrap().cleared, 1);
    for slot in [&result.per_category.local_storage, &result.per_category.session_storage] {
        let flag = slot.as_ref().unwrap();
        assert!(!flag.success);
        assert!(flag.error.as_deref().unwrap().contains("quota manager busy"));
    }
    let idb = result.per_category.indexed_db.as_ref().unwrap();
    assert_eq!(idb.cleared, 0);
    assert_eq!(idb.errors.len(), 1);
}

#[tokio::test]
async fn test_privileged_cache_cleared_through_open_tabs() {
    let tab_page = FakePage::new("example.com").with_caches(&["v1", "v2"]);
    let host = Arc::new(
        FakeHost::new()
            .with_tab(7, "https://example.com/app", tab_page.clone())
            .with_tab(8, "https://other.org/", FakePage::new("other.org").with_caches(&["keep"])),
    );
    let settings = Settings::default().only(&[Category::CacheStorage]);

    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    assert_eq!(result.per_category.cache_storage.as_ref().unwrap().cleared, 2);
    assert!(tab_page.state().caches.is_empty());
}

#[tokio::test]
async fn test_privileged_tab_query_failure_is_silent() {
    let host = Arc::new(FakeHost::new().failing_tab_query());
    let settings = Settings::default().only(&[Category::CacheStorage]);

    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    let cache = result.per_category.cache_storage.unwrap();
    assert_eq!(cache.cleared, 0);
    assert!(cache.errors.is_empty());
}

#[tokio::test]
async fn test_privileged_attach_failure_skips_only_that_tab() {
    let first = FakePage::new("example.com").with_caches(&["v1"]);
    let second = FakePage::new("example.com").with_caches(&["v1", "v2", "v3"]);
    let host = Arc::new(
        FakeHost::new()
            .with_tab(1, "https://example.com/", first.clone())
            .with_tab(2, "https://example.com/app", second.clone())
            .failing_attach(1),
    );
    let settings = Settings::default().only(&[Category::CacheStorage]);

    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", settings))
        .await;

    let cache = result.per_category.cache_storage.unwrap();
    assert_eq!(cache.cleared, 3);
    assert_eq!(cache.errors, vec!["tab 1: tab was discarded"]);
    assert_eq!(first.state().caches, vec!["v1"]);
    assert!(second.state().caches.is_empty());
}

#[tokio::test]
async fn test_privileged_reload_only_after_success() {
    let host = Arc::new(FakeHost::new());
    let orchestrator = host_orchestrator(&host);

    let ok = ClearRequest::new("example.com", Settings::default())
        .with_source(Some("https://example.com/".into()), Some(4))
        .reloading(true);
    orchestrator.clear(&ok).await;

    let bad = ClearRequest::new("not a domain", Settings::default())
        .with_source(None, Some(5))
        .reloading(true);
    orchestrator.clear(&bad).await;

    assert_eq!(host.state().reloaded, vec![4]);
}

#[tokio::test]
async fn test_privileged_unavailable_category() {
    let host = Arc::new(FakeHost::new().without(Category::CacheStorage));
    let result = host_orchestrator(&host)
        .clear(&ClearRequest::new("example.com", Settings::default()))
        .await;

    let cache = result.per_category.cache_storage.unwrap();
    assert_eq!(cache.cleared, 0);
    assert!(cache.errors.is_empty());
}
