use serde::{Deserialize, Serialize};

/// One storage kind the orchestrator can clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Cookies,
    LocalStorage,
    SessionStorage,
    #[serde(rename = "indexedDB")]
    IndexedDb,
    CacheStorage,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Cookies,
        Category::LocalStorage,
        Category::SessionStorage,
        Category::IndexedDb,
        Category::CacheStorage,
    ];

    /// Key used in the `perCategory` report
    pub fn key(self) -> &'static str {
        match self {
            Category::Cookies => "cookies",
            Category::LocalStorage => "localStorage",
            Category::SessionStorage => "sessionStorage",
            Category::IndexedDb => "indexedDB",
            Category::CacheStorage => "cacheStorage",
        }
    }

    /// Parse a user-facing name (`cookies`, `local`, `indexeddb`, ...)
    pub fn parse(name: &str) -> Option<Category> {
        match name.trim().to_ascii_lowercase().as_str() {
            "cookies" | "cookie" => Some(Category::Cookies),
            "localstorage" | "local" => Some(Category::LocalStorage),
            "sessionstorage" | "session" => Some(Category::SessionStorage),
            "indexeddb" | "idb" => Some(Category::IndexedDb),
            "cachestorage" | "cache" => Some(Category::CacheStorage),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Cookies => write!(f, "Cookies"),
            Category::LocalStorage => write!(f, "localStorage"),
            Category::SessionStorage => write!(f, "sessionStorage"),
            Category::IndexedDb => write!(f, "IndexedDB"),
            Category::CacheStorage => write!(f, "Cache Storage"),
        }
    }
}

/// Outcome shape for categories that remove countable items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountOutcome {
    pub cleared: usize,
    pub errors: Vec<String>,
}

impl CountOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            cleared: 0,
            errors: vec![message.into()],
        }
    }
}

/// Outcome shape for categories cleared in one shot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl FlagOutcome {
    pub fn cleared() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }

    /// Storage object absent in this context: not cleared, but not an error either
    pub fn unavailable() -> Self {
        Self::default()
    }
}

/// The result of running one category clearer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    Cookies(CountOutcome),
    LocalStorage(FlagOutcome),
    SessionStorage(FlagOutcome),
    IndexedDb(CountOutcome),
    CacheStorage(CountOutcome),
}

impl CategoryOutcome {
    pub fn category(&self) -> Category {
        match self {
            CategoryOutcome::Cookies(_) => Category::Cookies,
            CategoryOutcome::LocalStorage(_) => Category::LocalStorage,
            CategoryOutcome::SessionStorage(_) => Category::SessionStorage,
            CategoryOutcome::IndexedDb(_) => Category::IndexedDb,
            CategoryOutcome::CacheStorage(_) => Category::CacheStorage,
        }
    }

    /// What a category reports when the surface cannot reach it at all
    pub fn unavailable(category: Category) -> Self {
        match category {
            Category::Cookies => CategoryOutcome::Cookies(CountOutcome::default()),
            Category::LocalStorage => CategoryOutcome::LocalStorage(FlagOutcome::unavailable()),
            Category::SessionStorage => CategoryOutcome::SessionStorage(FlagOutcome::unavailable()),
            Category::IndexedDb => CategoryOutcome::IndexedDb(CountOutcome::default()),
            Category::CacheStorage => CategoryOutcome::CacheStorage(CountOutcome::default()),
        }
    }
}

/// Completion of a single IndexedDB delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseDeletion {
    Completed,
    /// Other connections hold the database open. Treated as cleared.
    Blocked,
    Failed(String),
}
