//! Queries against a profile's `cookies.sqlite` (`moz_cookies` table).

use rusqlite::{params, params_from_iter, Connection, OpenFlags};
use std::path::Path;

use crate::common::errors::PlatformError;
use crate::common::site::parent_domain;
use crate::storage::privileged::CookieRecord;

/// Open the cookie jar; `None` when the profile has no cookie database yet
pub fn open(path: &Path, read_only: bool) -> Result<Option<Connection>, PlatformError> {
    if !path.exists() {
        return Ok(None);
    }
    let flags = if read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX
    };
    Connection::open_with_flags(path, flags)
        .map(Some)
        .map_err(|e| PlatformError::sqlite(path, e))
}

/// Cookies stored for `domain`. A dotted domain (`.example.com`) matches
/// only its own domain cookies; a bare one also matches every cookie on its
/// subdomains, leaving `.domain` itself to the dotted query.
pub fn on_domain(conn: &Connection, path: &Path, domain: &str) -> Result<Vec<CookieRecord>, PlatformError> {
    let sql = if domain.starts_with('.') {
        "SELECT name, host, path, isSecure, originAttributes
         FROM moz_cookies WHERE host = ?1 ORDER BY id"
    } else {
        "SELECT name, host, path, isSecure, originAttributes
         FROM moz_cookies
         WHERE host = ?1 OR (host LIKE '%.' || ?1 AND host <> '.' || ?1)
         ORDER BY id"
    };
    let mut stmt = conn.prepare(sql).map_err(|e| PlatformError::sqlite(path, e))?;
    let rows = stmt
        .query_map(params![domain], |row| {
            Ok(CookieRecord {
                name: row.get(0)?,
                domain: row.get(1)?,
                path: row.get(2)?,
                secure: row.get::<_, i64>(3)? != 0,
                store_id: row.get(4)?,
            })
        })
        .map_err(|e| PlatformError::sqlite(path, e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| PlatformError::sqlite(path, e))
}

/// Hosts a page on `host` can expire cookies on: the host itself for
/// host-only cookies, `.host`, and `.parent` when the host has one.
pub fn reachable_hosts(host: &str) -> Vec<String> {
    let mut hosts = vec![host.to_string(), format!(".{}", host)];
    if let Some(parent) = parent_domain(host) {
        hosts.push(format!(".{}", parent));
    }
    hosts
}

/// Distinct root-path cookie names a page on `host` can expire, in one container
pub fn visible_names(
    conn: &Connection,
    path: &Path,
    host: &str,
    origin_attributes: &str,
) -> Result<Vec<String>, PlatformError> {
    let hosts = reachable_hosts(host);
    let placeholders = (0..hosts.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT DISTINCT name FROM moz_cookies
         WHERE originAttributes = ?1 AND path = '/' AND host IN ({}) ORDER BY name",
        placeholders
    );

    let mut values = vec![origin_attributes.to_string()];
    values.extend(hosts);

    let mut stmt = conn.prepare(&sql).map_err(|e| PlatformError::sqlite(path, e))?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| row.get::<_, String>(0))
        .map_err(|e| PlatformError::sqlite(path, e))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| PlatformError::sqlite(path, e))
}

/// Delete one cookie by its identifying columns; returns rows removed
pub fn delete(
    conn: &Connection,
    path: &Path,
    name: &str,
    host: &str,
    cookie_path: &str,
    origin_attributes: &str,
) -> Result<usize, PlatformError> {
    conn.execute(
        "DELETE FROM moz_cookies
         WHERE name = ?1 AND host = ?2 AND path = ?3 AND originAttributes = ?4",
        params![name, host, cookie_path, origin_attributes],
    )
    .map_err(|e| PlatformError::sqlite(path, e))
}
