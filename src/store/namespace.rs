use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::common::errors::{Result, SiteWipeError};

/// One key change, as delivered to storage-change listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// A flat JSON key-value namespace persisted in one file.
///
/// Every mutation is a read-modify-write of the whole file with no locking:
/// two writers racing on the same namespace resolve as last write wins.
#[derive(Debug, Clone)]
pub struct Namespace {
    path: PathBuf,
}

impl Namespace {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole namespace; a missing file reads as empty
    pub fn read(&self) -> Result<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| SiteWipeError::io(&self.path, e))?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SiteWipeError::Namespace {
                path: self.path.clone(),
                message: "top level is not an object".to_string(),
            }),
            Err(e) => Err(SiteWipeError::Namespace {
                path: self.path.clone(),
                message: e.to_string(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read()?.remove(key))
    }

    /// Merge `entries` into the namespace, returning what actually changed
    pub fn set(&self, entries: Map<String, Value>) -> Result<Vec<StorageChange>> {
        let mut map = self.read()?;
        let mut changes = Vec::new();
        for (key, value) in entries {
            let old = map.insert(key.clone(), value.clone());
            if old.as_ref() != Some(&value) {
                changes.push(StorageChange {
                    key,
                    old_value: old,
                    new_value: Some(value),
                });
            }
        }
        if !changes.is_empty() {
            self.write(&map)?;
        }
        Ok(changes)
    }

    pub fn remove(&self, keys: &[&str]) -> Result<Vec<StorageChange>> {
        let mut map = self.read()?;
        let changes: Vec<StorageChange> = keys
            .iter()
            .filter_map(|key| {
                map.remove(*key).map(|old| StorageChange {
                    key: key.to_string(),
                    old_value: Some(old),
                    new_value: None,
                })
            })
            .collect();
        if !changes.is_empty() {
            self.write(&map)?;
        }
        Ok(changes)
    }

    pub fn clear(&self) -> Result<Vec<StorageChange>> {
        let map = self.read()?;
        let changes = map
            .into_iter()
            .map(|(key, old)| StorageChange {
                key,
                old_value: Some(old),
                new_value: None,
            })
            .collect();
        self.write(&Map::new())?;
        Ok(changes)
    }

    fn write(&self, map: &Map<String, Value>) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| SiteWipeError::io(dir, e))?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|e| SiteWipeError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| SiteWipeError::io(&self.path, e))?;
        Ok(())
    }
}
