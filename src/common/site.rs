use url::Url;

use super::errors::{Result, SiteWipeError};

/// Schemes whose pages can never be cleared: browser internals and extensions.
const UNMANAGEABLE_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "moz-extension",
    "edge",
    "about",
    "file",
    "data",
    "view-source",
    "devtools",
];

/// Reason attached to `UnmanageableUrl` for browser-internal pages
pub const INTERNAL_PAGE: &str = "browser-internal page";

/// Check that `domain` is a bare hostname the orchestrator can scope removal to
pub fn validate_domain(domain: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(SiteWipeError::InvalidDomain {
            domain: domain.to_string(),
            reason: reason.to_string(),
        })
    };

    if domain.is_empty() {
        return reject("domain is empty");
    }
    if domain.contains("://") {
        return reject("expected a hostname, not a URL");
    }
    if domain.chars().any(char::is_whitespace) {
        return reject("hostname contains whitespace");
    }
    if domain.contains(['/', '?', '#', '@', ':']) {
        return reject("hostname contains a path, port or credentials");
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return reject("hostname has an empty label");
    }
    Ok(())
}

/// Extract the hostname from a tab URL, refusing browser-internal pages
pub fn domain_from_url(raw: &str) -> Result<String> {
    let unmanageable = |reason: &str| SiteWipeError::UnmanageableUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw).map_err(|e| unmanageable(&e.to_string()))?;
    if UNMANAGEABLE_SCHEMES.contains(&url.scheme()) {
        return Err(unmanageable(INTERNAL_PAGE));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| unmanageable("URL has no host"))?;

    validate_domain(host)?;
    Ok(host.to_string())
}

/// Accept either a URL or a bare domain, as typed by a user
pub fn parse_target(input: &str) -> Result<String> {
    let input = input.trim();
    if input.contains("://") || input.starts_with("about:") || input.starts_with("data:") {
        return domain_from_url(input);
    }
    let domain = input.to_ascii_lowercase();
    validate_domain(&domain)?;
    Ok(domain)
}

/// Registrable-looking parent of a subdomain: the last two labels.
///
/// Returns `None` when the host already has two labels or fewer.
pub fn parent_domain(host: &str) -> Option<String> {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() > 2 {
        Some(parts[parts.len() - 2..].join("."))
    } else {
        None
    }
}
