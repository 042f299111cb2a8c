use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::namespace::{Namespace, StorageChange};
use crate::common::errors::{Result, SiteWipeError};
use crate::storage::category::Category;

/// The user's clear configuration, stored flat in the synced namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "enabled")]
    pub clear_cookies: bool,
    #[serde(default = "enabled")]
    pub clear_local_storage: bool,
    #[serde(default = "enabled")]
    pub clear_session_storage: bool,
    #[serde(default = "enabled", rename = "clearIndexedDB")]
    pub clear_indexed_db: bool,
    #[serde(default = "enabled")]
    pub clear_cache: bool,
    #[serde(default = "enabled")]
    pub confirm_before_clear: bool,
    #[serde(default = "enabled")]
    pub show_notifications: bool,
    #[serde(default)]
    pub auto_clear: bool,
    #[serde(default = "enabled")]
    pub show_button: bool,
}

fn enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            clear_cookies: true,
            clear_local_storage: true,
            clear_session_storage: true,
            clear_indexed_db: true,
            clear_cache: true,
            confirm_before_clear: true,
            show_notifications: true,
            auto_clear: false,
            show_button: true,
        }
    }
}

impl Settings {
    /// Stored key names, in display order
    pub const KEYS: [&'static str; 9] = [
        "clearCookies",
        "clearLocalStorage",
        "clearSessionStorage",
        "clearIndexedDB",
        "clearCache",
        "confirmBeforeClear",
        "showNotifications",
        "autoClear",
        "showButton",
    ];

    /// Whether the flag for `category` is on
    pub fn clears(&self, category: Category) -> bool {
        match category {
            Category::Cookies => self.clear_cookies,
            Category::LocalStorage => self.clear_local_storage,
            Category::SessionStorage => self.clear_session_storage,
            Category::IndexedDb => self.clear_indexed_db,
            Category::CacheStorage => self.clear_cache,
        }
    }

    pub fn set_category(&mut self, category: Category, on: bool) {
        match category {
            Category::Cookies => self.clear_cookies = on,
            Category::LocalStorage => self.clear_local_storage = on,
            Category::SessionStorage => self.clear_session_storage = on,
            Category::IndexedDb => self.clear_indexed_db = on,
            Category::CacheStorage => self.clear_cache = on,
        }
    }

    /// Same settings, restricted to the given categories
    pub fn only(mut self, categories: &[Category]) -> Self {
        for category in Category::ALL {
            self.set_category(category, categories.contains(&category));
        }
        self
    }

    pub fn enabled_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.clears(*c))
            .collect()
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        Some(match key {
            "clearCookies" => self.clear_cookies,
            "clearLocalStorage" => self.clear_local_storage,
            "clearSessionStorage" => self.clear_session_storage,
            "clearIndexedDB" => self.clear_indexed_db,
            "clearCache" => self.clear_cache,
            "confirmBeforeClear" => self.confirm_before_clear,
            "showNotifications" => self.show_notifications,
            "autoClear" => self.auto_clear,
            "showButton" => self.show_button,
            _ => return None,
        })
    }

    /// Set one flag by its stored key; false if the key is unknown
    pub fn set(&mut self, key: &str, value: bool) -> bool {
        let slot = match key {
            "clearCookies" => &mut self.clear_cookies,
            "clearLocalStorage" => &mut self.clear_local_storage,
            "clearSessionStorage" => &mut self.clear_session_storage,
            "clearIndexedDB" => &mut self.clear_indexed_db,
            "clearCache" => &mut self.clear_cache,
            "confirmBeforeClear" => &mut self.confirm_before_clear,
            "showNotifications" => &mut self.show_notifications,
            "autoClear" => &mut self.auto_clear,
            "showButton" => &mut self.show_button,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Shallow-merge boolean values of known keys; returns how many changed
    pub fn apply_partial(&mut self, partial: &Map<String, Value>) -> usize {
        let mut changed = 0;
        for (key, value) in partial {
            if let (Some(current), Some(new)) = (self.get(key), value.as_bool()) {
                if current != new && self.set(key, new) {
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Stored values over the defaults
    pub fn load(ns: &Namespace) -> Result<Self> {
        let mut settings = Settings::default();
        settings.apply_partial(&ns.read()?);
        Ok(settings)
    }

    pub fn save(&self, ns: &Namespace) -> Result<Vec<StorageChange>> {
        ns.set(self.to_map()?)
    }

    /// Write the defaults, as on first install
    pub fn install_defaults(ns: &Namespace) -> Result<Vec<StorageChange>> {
        Settings::default().save(ns)
    }

    pub fn to_map(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(SiteWipeError::Namespace {
                path: Default::default(),
                message: format!("settings serialized to {}", other),
            }),
        }
    }
}
