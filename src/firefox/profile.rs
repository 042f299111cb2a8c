use std::path::{Path, PathBuf};
use tracing::debug;

use super::origin::OriginKey;
use crate::common::errors::{Result, SiteWipeError};

/// Profile locations relative to the home directory
const PROFILE_GLOBS: &[&str] = &[
    ".mozilla/firefox/*",
    "Library/Application Support/Firefox/Profiles/*",
];

/// A Firefox profile directory on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirefoxProfile {
    root: PathBuf,
}

impl FirefoxProfile {
    /// Open a profile, checking that it actually looks like one
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let root = path.into();
        if !is_profile_dir(&root) {
            return Err(SiteWipeError::ProfileNotFound { path: Some(root) });
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory name, e.g. `abcd1234.default-release`
    pub fn name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    pub fn cookies_db(&self) -> PathBuf {
        self.root.join("cookies.sqlite")
    }

    pub fn origins_dir(&self) -> PathBuf {
        self.root.join("storage").join("default")
    }

    /// True while a browser instance holds the profile
    pub fn is_locked(&self) -> bool {
        std::fs::symlink_metadata(self.root.join("lock")).is_ok()
            || self.root.join("parent.lock").exists()
    }

    /// Every origin directory that parses, sorted by name
    pub fn origin_dirs(&self) -> Vec<(OriginKey, PathBuf)> {
        let dir = self.origins_dir();
        let Ok(entries) = std::fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut origins: Vec<(OriginKey, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                OriginKey::from_dir_name(&name).map(|key| (key, e.path()))
            })
            .collect();
        origins.sort();
        origins
    }

    /// Size of everything stored for sites: cookies plus origin storage
    pub fn data_size(&self) -> u64 {
        let cookies = std::fs::metadata(self.cookies_db()).map(|m| m.len()).unwrap_or(0);
        cookies + super::dir_size(&self.origins_dir())
    }
}

fn is_profile_dir(path: &Path) -> bool {
    path.is_dir() && (path.join("cookies.sqlite").is_file() || path.join("storage").join("default").is_dir())
}

/// Find profiles in the standard locations under the home directory
pub fn discover_profiles() -> Vec<FirefoxProfile> {
    match dirs::home_dir() {
        Some(home) => discover_in(&home),
        None => Vec::new(),
    }
}

/// Profile discovery rooted at an arbitrary home directory
pub fn discover_in(home: &Path) -> Vec<FirefoxProfile> {
    let mut profiles = Vec::new();
    for pattern in PROFILE_GLOBS {
        let full = home.join(pattern);
        let Ok(paths) = glob::glob(&full.to_string_lossy()) else {
            continue;
        };
        for path in paths.filter_map(|p| p.ok()) {
            if let Ok(profile) = FirefoxProfile::open(&path) {
                debug!(profile = %path.display(), "found profile");
                profiles.push(profile);
            }
        }
    }
    profiles.sort_by(|a, b| a.root.cmp(&b.root));
    profiles
}

/// Pick the profile to use when none is configured.
///
/// Prefers `*.default-release`, then `*.default`, then whatever comes first.
pub fn default_profile(profiles: &[FirefoxProfile]) -> Option<&FirefoxProfile> {
    profiles
        .iter()
        .find(|p| p.name().ends_with(".default-release"))
        .or_else(|| profiles.iter().find(|p| p.name().ends_with(".default")))
        .or_else(|| profiles.first())
}
