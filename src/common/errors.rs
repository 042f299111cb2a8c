use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a storage surface (page context or privileged host).
///
/// These never escape the orchestrator: each category clearer turns them
/// into strings inside its own result slot.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The surface has no API for this operation
    #[error("{operation} is not available in this context")]
    Unsupported { operation: &'static str },

    /// The item to remove no longer exists
    #[error("{what} not found")]
    NotFound { what: String },

    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A profile database rejected a query
    #[error("database error in '{}': {source}", path.display())]
    Sqlite {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Anything else the platform reported
    #[error("{message}")]
    Other { message: String },
}

impl PlatformError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlatformError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn sqlite(path: impl Into<PathBuf>, source: rusqlite::Error) -> Self {
        PlatformError::Sqlite {
            path: path.into(),
            source,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        PlatformError::Other {
            message: message.into(),
        }
    }
}

/// Errors from the orchestration glue, persistence and profile handling.
/// We use `anyhow` at the top level for CLI error handling,
/// but these typed errors allow modules to be precise about failures.
#[derive(Debug, Error)]
pub enum SiteWipeError {
    /// Domain is empty, carries a scheme/path, or is otherwise not a hostname
    #[error("invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    /// URL cannot be managed (browser-internal scheme, no host, unparsable)
    #[error("cannot manage '{url}': {reason}")]
    UnmanageableUrl { url: String, reason: String },

    /// Import file does not have the expected shape
    #[error("invalid import file: {message}")]
    ImportFormat { message: String },

    /// Site is already in the managed list
    #[error("'{domain}' is already managed")]
    DuplicateSite { domain: String },

    /// Site is not in the managed list
    #[error("'{domain}' is not a managed site")]
    SiteNotFound { domain: String },

    /// Browser is running with this profile
    #[error("profile '{}' is in use; close the browser or pass --force", path.display())]
    ProfileLocked { path: PathBuf },

    /// No usable profile directory
    #[error("no browser profile found{}", .path.as_ref().map(|p| format!(" at '{}'", p.display())).unwrap_or_default())]
    ProfileNotFound { path: Option<PathBuf> },

    /// A key-value namespace file is corrupt
    #[error("storage namespace '{}' is unreadable: {message}", path.display())]
    Namespace { path: PathBuf, message: String },

    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SiteWipeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SiteWipeError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = SiteWipeError> = std::result::Result<T, E>;
