use async_trait::async_trait;
use rusqlite::{params, Connection, ErrorCode, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use super::cookies;
use crate::common::errors::PlatformError;
use crate::storage::capabilities::StorageCapabilities;
use crate::storage::category::{Category, DatabaseDeletion};
use crate::storage::page::{CookieScope, PageContext};

/// An origin as Firefox names its directory under `storage/default`.
///
/// `https://example.com:8443` in container 1 is stored as
/// `https+++example.com+8443^userContextId=1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct OriginKey {
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    /// Origin attributes suffix, including the leading `^`; empty for the default container
    pub attributes: String,
}

impl OriginKey {
    /// Parse a web origin such as `https://example.com` or `http://localhost:8080`
    pub fn parse_origin(origin: &str) -> Option<Self> {
        let (scheme, rest) = origin.split_once("://")?;
        let rest = rest.trim_end_matches('/');
        if scheme.is_empty() || rest.is_empty() || rest.contains('/') {
            return None;
        }
        let (host, port) = match rest.rsplit_once(':') {
            Some((host, port)) => (host, Some(port.parse().ok()?)),
            None => (rest, None),
        };
        Some(Self {
            scheme: scheme.to_ascii_lowercase(),
            host: host.to_ascii_lowercase(),
            port,
            attributes: String::new(),
        })
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        let (base, attributes) = match name.find('^') {
            Some(i) => (&name[..i], name[i..].to_string()),
            None => (name, String::new()),
        };
        let (scheme, rest) = base.split_once("+++")?;
        if scheme.is_empty() || rest.is_empty() {
            return None;
        }
        let (host, port) = match rest.rsplit_once('+') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => {
                (host, Some(port.parse().ok()?))
            }
            _ => (rest, None),
        };
        Some(Self {
            scheme: scheme.to_string(),
            host: host.to_string(),
            port,
            attributes,
        })
    }

    pub fn dir_name(&self) -> String {
        let mut name = format!("{}+++{}", self.scheme, self.host);
        if let Some(port) = self.port {
            name.push_str(&format!("+{}", port));
        }
        name.push_str(&self.attributes);
        name
    }

    pub fn url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}/", self.scheme, self.host, port),
            None => format!("{}://{}/", self.scheme, self.host),
        }
    }

    /// Same scheme, host and port; container attributes are ignored
    pub fn same_origin(&self, other: &OriginKey) -> bool {
        self.scheme == other.scheme && self.host == other.host && self.port == other.port
    }
}

/// Storage of one origin inside an offline profile, seen as a page would see it.
#[derive(Debug, Clone)]
pub struct FirefoxOrigin {
    key: OriginKey,
    dir: PathBuf,
    cookies_db: PathBuf,
}

impl FirefoxOrigin {
    pub fn new(key: OriginKey, dir: PathBuf, cookies_db: PathBuf) -> Self {
        Self { key, dir, cookies_db }
    }

    pub fn key(&self) -> &OriginKey {
        &self.key
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn idb_dir(&self) -> PathBuf {
        self.dir.join("idb")
    }

    fn cache_db(&self) -> PathBuf {
        self.dir.join("cache").join("caches.sqlite")
    }

    /// Every `idb/*.sqlite` file with the database name it stores
    fn databases(&self) -> Result<Vec<(String, PathBuf)>, PlatformError> {
        let idb = self.idb_dir();
        if !idb.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(&idb).map_err(|e| PlatformError::io(&idb, e))?;
        let mut databases = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sqlite") {
                continue;
            }
            match read_database_name(&path) {
                Ok(name) => databases.push((name, path)),
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable IndexedDB file"),
            }
        }
        databases.sort();
        Ok(databases)
    }
}

fn read_database_name(path: &Path) -> Result<String, PlatformError> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| PlatformError::sqlite(path, e))?;
    conn.query_row("SELECT name FROM database", [], |row| row.get(0))
        .map_err(|e| PlatformError::sqlite(path, e))
}

fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked)
    )
}

/// Cache names are stored as UTF-16LE blobs
fn decode_cache_key(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

pub(crate) fn encode_cache_key(name: &str) -> Vec<u8> {
    name.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
}

fn remove_path(path: &Path) -> Result<(), PlatformError> {
    let result = if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else if path.exists() {
        std::fs::remove_file(path)
    } else {
        return Ok(());
    };
    result.map_err(|e| PlatformError::io(path, e))
}

#[async_trait]
impl PageContext for FirefoxOrigin {
    fn hostname(&self) -> &str {
        &self.key.host
    }

    fn capabilities(&self) -> StorageCapabilities {
        // Firefox keeps sessionStorage in the session file, not per origin
        StorageCapabilities::all().without(Category::SessionStorage)
    }

    async fn cookie_names(&self) -> Result<Vec<String>, PlatformError> {
        match cookies::open(&self.cookies_db, true)? {
            Some(conn) => cookies::visible_names(&conn, &self.cookies_db, &self.key.host, &self.key.attributes),
            None => Ok(Vec::new()),
        }
    }

    async fn expire_cookie(&self, name: &str, scope: &CookieScope) -> Result<(), PlatformError> {
        let Some(conn) = cookies::open(&self.cookies_db, false)? else {
            return Ok(());
        };
        let host = match &scope.domain {
            None => self.key.host.clone(),
            Some(domain) => format!(".{}", domain.trim_start_matches('.')),
        };
        let removed = cookies::delete(&conn, &self.cookies_db, name, &host, &scope.path, &self.key.attributes)?;
        debug!(cookie = %name, %host, removed, "expired cookie");
        Ok(())
    }

    async fn clear_local_storage(&self) -> Result<(), PlatformError> {
        remove_path(&self.dir.join("ls"))
    }

    async fn clear_session_storage(&self) -> Result<(), PlatformError> {
        Err(PlatformError::Unsupported {
            operation: "sessionStorage",
        })
    }

    async fn database_names(&self) -> Result<Vec<String>, PlatformError> {
        Ok(self.databases()?.into_iter().map(|(name, _)| name).collect())
    }

    async fn delete_database(&self, name: &str) -> DatabaseDeletion {
        let path = match self.databases() {
            Ok(dbs) => match dbs.into_iter().find(|(n, _)| n == name) {
                Some((_, path)) => path,
                None => return DatabaseDeletion::Completed,
            },
            Err(e) => return DatabaseDeletion::Failed(e.to_string()),
        };

        // Another connection holding the file means the browser still has it open
        match Connection::open(&path) {
            Ok(conn) => {
                let _ = conn.busy_timeout(Duration::ZERO);
                if let Err(e) = conn.execute_batch("BEGIN EXCLUSIVE; ROLLBACK;") {
                    if is_busy(&e) {
                        return DatabaseDeletion::Blocked;
                    }
                    return DatabaseDeletion::Failed(e.to_string());
                }
            }
            Err(e) => return DatabaseDeletion::Failed(e.to_string()),
        }

        let stem = path.with_extension("");
        let mut doomed = vec![path.clone(), stem.with_extension("files")];
        for suffix in ["-wal", "-shm", "-journal"] {
            let mut sidecar = path.clone().into_os_string();
            sidecar.push(suffix);
            doomed.push(PathBuf::from(sidecar));
        }
        for target in &doomed {
            if let Err(e) = remove_path(target) {
                return DatabaseDeletion::Failed(e.to_string());
            }
        }
        DatabaseDeletion::Completed
    }

    async fn cache_names(&self) -> Result<Vec<String>, PlatformError> {
        let db = self.cache_db();
        if !db.exists() {
            return Ok(Vec::new());
        }
        let conn = Connection::open_with_flags(&db, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| PlatformError::sqlite(&db, e))?;
        let mut stmt = conn
            .prepare("SELECT key FROM storage WHERE namespace = 0 ORDER BY rowid")
            .map_err(|e| PlatformError::sqlite(&db, e))?;
        let keys = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))
            .map_err(|e| PlatformError::sqlite(&db, e))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PlatformError::sqlite(&db, e))?;
        Ok(keys.iter().map(|k| decode_cache_key(k)).collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, PlatformError> {
        let db = self.cache_db();
        if !db.exists() {
            return Ok(false);
        }
        let mut conn = Connection::open(&db).map_err(|e| PlatformError::sqlite(&db, e))?;
        let tx = conn.transaction().map_err(|e| PlatformError::sqlite(&db, e))?;
        let key = encode_cache_key(name);

        let cache_ids: Vec<i64> = {
            let mut stmt = tx
                .prepare("SELECT cache_id FROM storage WHERE namespace = 0 AND key = ?1")
                .map_err(|e| PlatformError::sqlite(&db, e))?;
            let ids = stmt
                .query_map(params![key], |row| row.get(0))
                .map_err(|e| PlatformError::sqlite(&db, e))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| PlatformError::sqlite(&db, e))?;
            ids
        };
        if cache_ids.is_empty() {
            return Ok(false);
        }

        for id in &cache_ids {
            tx.execute("DELETE FROM entries WHERE cache_id = ?1", params![id])
                .map_err(|e| PlatformError::sqlite(&db, e))?;
        }
        tx.execute(
            "DELETE FROM storage WHERE namespace = 0 AND key = ?1",
            params![key],
        )
        .map_err(|e| PlatformError::sqlite(&db, e))?;
        for id in &cache_ids {
            tx.execute("DELETE FROM caches WHERE id = ?1", params![id])
                .map_err(|e| PlatformError::sqlite(&db, e))?;
        }
        tx.commit().map_err(|e| PlatformError::sqlite(&db, e))?;
        Ok(true)
    }
}
