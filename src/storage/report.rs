use serde::{Deserialize, Serialize};

use super::category::{Category, CategoryOutcome, CountOutcome, FlagOutcome};

/// Per-category section of a clear result.
///
/// A `None` slot means the category was not attempted, which is different
/// from "attempted, nothing cleared".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<CountOutcome>,
    #[serde(default, rename = "localStorage", skip_serializing_if = "Option::is_none")]
    pub local_storage: Option<FlagOutcome>,
    #[serde(default, rename = "sessionStorage", skip_serializing_if = "Option::is_none")]
    pub session_storage: Option<FlagOutcome>,
    #[serde(default, rename = "indexedDB", skip_serializing_if = "Option::is_none")]
    pub indexed_db: Option<CountOutcome>,
    #[serde(default, rename = "cacheStorage", skip_serializing_if = "Option::is_none")]
    pub cache_storage: Option<CountOutcome>,
}

impl PerCategory {
    /// Merge outcomes into the fixed category slots, in any order
    pub fn merge<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = CategoryOutcome>,
    {
        let mut report = PerCategory::default();
        for outcome in outcomes {
            report.absorb(outcome);
        }
        report
    }

    /// Fold one outcome into its slot
    pub fn absorb(&mut self, outcome: CategoryOutcome) {
        match outcome {
            CategoryOutcome::Cookies(o) => merge_count(&mut self.cookies, o),
            CategoryOutcome::LocalStorage(o) => merge_flag(&mut self.local_storage, o),
            CategoryOutcome::SessionStorage(o) => merge_flag(&mut self.session_storage, o),
            CategoryOutcome::IndexedDb(o) => merge_count(&mut self.indexed_db, o),
            CategoryOutcome::CacheStorage(o) => merge_count(&mut self.cache_storage, o),
        }
    }

    /// Categories present in the report, in canonical order
    pub fn attempted(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.contains(*c))
            .collect()
    }

    pub fn contains(&self, category: Category) -> bool {
        match category {
            Category::Cookies => self.cookies.is_some(),
            Category::LocalStorage => self.local_storage.is_some(),
            Category::SessionStorage => self.session_storage.is_some(),
            Category::IndexedDb => self.indexed_db.is_some(),
            Category::CacheStorage => self.cache_storage.is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attempted().is_empty()
    }

    /// Items removed across the countable categories
    pub fn total_cleared(&self) -> usize {
        [&self.cookies, &self.indexed_db, &self.cache_storage]
            .into_iter()
            .flatten()
            .map(|o| o.cleared)
            .sum()
    }

    /// Every recorded error, prefixed with its category key
    pub fn errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let counted = [
            (Category::Cookies, &self.cookies),
            (Category::IndexedDb, &self.indexed_db),
            (Category::CacheStorage, &self.cache_storage),
        ];
        for (category, slot) in counted {
            if let Some(outcome) = slot {
                errors.extend(outcome.errors.iter().map(|e| format!("{}: {}", category.key(), e)));
            }
        }
        let flagged = [
            (Category::LocalStorage, &self.local_storage),
            (Category::SessionStorage, &self.session_storage),
        ];
        for (category, slot) in flagged {
            if let Some(FlagOutcome { error: Some(e), .. }) = slot {
                errors.push(format!("{}: {}", category.key(), e));
            }
        }
        errors
    }

    pub fn error_count(&self) -> usize {
        self.errors().len()
    }
}

fn merge_count(slot: &mut Option<CountOutcome>, incoming: CountOutcome) {
    match slot {
        Some(existing) => {
            existing.cleared += incoming.cleared;
            existing.errors.extend(incoming.errors);
        }
        None => *slot = Some(incoming),
    }
}

fn merge_flag(slot: &mut Option<FlagOutcome>, incoming: FlagOutcome) {
    match slot {
        Some(existing) => {
            existing.success = existing.success && incoming.success;
            if existing.error.is_none() {
                existing.error = incoming.error;
            }
        }
        None => *slot = Some(incoming),
    }
}

/// Aggregate result of one orchestration call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResult {
    /// False only when the orchestration glue itself failed
    pub success: bool,
    pub per_category: PerCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClearResult {
    pub fn completed(per_category: PerCategory) -> Self {
        Self {
            success: true,
            per_category,
            error: None,
        }
    }

    pub fn aborted(message: impl Into<String>, per_category: PerCategory) -> Self {
        Self {
            success: false,
            per_category,
            error: Some(message.into()),
        }
    }
}
