//! Firefox profile backend.
//!
//! Serves both surfaces from a profile directory on disk: [`FirefoxHost`] is
//! the privileged host, and every persisted origin can be attached to as a
//! [`FirefoxOrigin`] page context.

pub mod cookies;
pub mod host;
pub mod origin;
pub mod profile;

pub use host::FirefoxHost;
pub use origin::{FirefoxOrigin, OriginKey};
pub use profile::{default_profile, discover_in, discover_profiles, FirefoxProfile};

use std::path::Path;
use walkdir::WalkDir;

/// Total size of the regular files under a directory
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .sum()
}
