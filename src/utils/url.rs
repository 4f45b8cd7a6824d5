// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

use crate::error::{AppError, Result};

/// Normalize a URL into its canonical form.
///
/// Requires an absolute http(s) URL. The fragment is dropped, scheme and host
/// are lowercased, default ports removed, and a trailing slash on a non-root
/// path is trimmed.
///
/// # Examples
/// ```
/// use sitewatch::utils::url::normalize_url;
///
/// assert_eq!(
///     normalize_url("HTTPS://Example.COM:443/docs/#intro").unwrap(),
///     "https://example.com/docs"
/// );
/// ```
pub fn normalize_url(raw: &str) -> Result<String> {
    let mut parsed = Url::parse(raw.trim())
        .map_err(|e| AppError::invalid_config(format!("invalid URL '{raw}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::invalid_config(format!(
            "unsupported URL scheme '{}' in {raw}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(AppError::invalid_config(format!("URL has no host: {raw}")));
    }

    parsed.set_fragment(None);

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    let mut normalized = parsed.to_string();
    // `Url` always renders an empty root path as "/".
    if parsed.path() == "/" && parsed.query().is_none() {
        normalized.truncate(normalized.len() - 1);
    }
    Ok(normalized)
}

/// Extract the host from a URL string.
///
/// # Examples
/// ```
/// use sitewatch::utils::url::get_domain;
///
/// assert_eq!(
///     get_domain("https://Example.com/path"),
///     Some("example.com".to_string())
/// );
/// ```
pub fn get_domain(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_lowercase()))
}

/// Number of path segments, used as a depth hint for page importance.
pub fn path_depth(url: &str) -> usize {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).count())
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_fragment_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://example.com/guide/#top").unwrap(),
            "https://example.com/guide"
        );
    }

    #[test]
    fn test_normalize_root() {
        assert_eq!(
            normalize_url("https://Example.com/").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            normalize_url("https://example.com").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn test_normalize_keeps_query() {
        assert_eq!(
            normalize_url("http://example.com/search?q=rust").unwrap(),
            "http://example.com/search?q=rust"
        );
    }

    #[test]
    fn test_normalize_default_port() {
        assert_eq!(
            normalize_url("http://example.com:80/a").unwrap(),
            "http://example.com/a"
        );
        assert_eq!(
            normalize_url("http://example.com:8080/a").unwrap(),
            "http://example.com:8080/a"
        );
    }

    #[test]
    fn test_normalize_rejects_non_http() {
        assert!(matches!(
            normalize_url("ftp://example.com/file"),
            Err(AppError::InvalidConfig(_))
        ));
        assert!(normalize_url("not a url").is_err());
    }

    #[test]
    fn test_get_domain() {
        assert_eq!(
            get_domain("https://Example.COM/path"),
            Some("example.com".to_string())
        );
        assert_eq!(get_domain("invalid-url"), None);
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth("https://example.com"), 0);
        assert_eq!(path_depth("https://example.com/docs/api/v1"), 3);
    }
}
