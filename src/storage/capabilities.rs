use super::category::Category;

/// Which storage categories an execution context can reach.
///
/// Computed once per surface and consulted before dispatch, so individual
/// clearers never probe for missing storage objects themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageCapabilities {
    pub cookies: bool,
    pub local_storage: bool,
    pub session_storage: bool,
    pub indexed_db: bool,
    pub cache_storage: bool,
}

impl StorageCapabilities {
    pub const fn all() -> Self {
        Self {
            cookies: true,
            local_storage: true,
            session_storage: true,
            indexed_db: true,
            cache_storage: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            cookies: false,
            local_storage: false,
            session_storage: false,
            indexed_db: false,
            cache_storage: false,
        }
    }

    pub fn supports(&self, category: Category) -> bool {
        match category {
            Category::Cookies => self.cookies,
            Category::LocalStorage => self.local_storage,
            Category::SessionStorage => self.session_storage,
            Category::IndexedDb => self.indexed_db,
            Category::CacheStorage => self.cache_storage,
        }
    }

    pub fn without(mut self, category: Category) -> Self {
        match category {
            Category::Cookies => self.cookies = false,
            Category::LocalStorage => self.local_storage = false,
            Category::SessionStorage => self.session_storage = false,
            Category::IndexedDb => self.indexed_db = false,
            Category::CacheStorage => self.cache_storage = false,
        }
        self
    }

    pub fn supported(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.supports(*c))
            .collect()
    }
}

impl Default for StorageCapabilities {
    fn default() -> Self {
        Self::all()
    }
}
