//! URL normalization for link destinations.
//!
//! The normalized form is what gets stored and signed, so two spellings of the
//! same destination produce the same signature input.

use std::collections::BTreeMap;
use url::Url;
use url::form_urlencoded;

/// Errors that can occur during URL normalization.
#[derive(Debug, thiserror::Error)]
pub enum UrlNormalizationError {
    #[error("Invalid URL format: {0}")]
    InvalidFormat(String),

    #[error("URL has no host")]
    MissingHost,

    #[error("Only HTTP and HTTPS protocols are allowed")]
    UnsupportedProtocol,
}

/// Normalizes a destination URL to a canonical form.
///
/// # Normalization Rules
///
/// 1. **Scheme**: `https://` is prepended when the input has no `http(s)://` prefix
/// 2. **Hostname**: converted to lowercase
/// 3. **Userinfo**: dropped
/// 4. **Default ports**: removed (80 for HTTP, 443 for HTTPS)
/// 5. **Fragments**: removed
/// 6. **Query parameters**: sorted by key; the last value wins for repeated keys
/// 7. **Path**: preserved as written; an absent path stays absent
///
/// # Errors
///
/// Returns [`UrlNormalizationError::InvalidFormat`] for malformed input,
/// [`UrlNormalizationError::MissingHost`] when no host can be found and
/// [`UrlNormalizationError::UnsupportedProtocol`] for non-HTTP(S) schemes.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_url("EXAMPLE.com/a?b=2&a=1").unwrap(), "https://example.com/a?a=1&b=2");
/// assert_eq!(normalize_url("https://example.com:443").unwrap(), "https://example.com");
/// ```
pub fn normalize_url(input: &str) -> Result<String, UrlNormalizationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlNormalizationError::InvalidFormat("empty URL".to_string()));
    }

    let has_scheme = trimmed
        .get(..8)
        .is_some_and(|p| p.eq_ignore_ascii_case("https://"))
        || trimmed
            .get(..7)
            .is_some_and(|p| p.eq_ignore_ascii_case("http://"));

    let candidate = if has_scheme {
        trimmed.to_string()
    } else if trimmed.contains("://") {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    } else {
        format!("https://{}", trimmed)
    };

    let url =
        Url::parse(&candidate).map_err(|e| UrlNormalizationError::InvalidFormat(e.to_string()))?;

    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(UrlNormalizationError::UnsupportedProtocol);
    }

    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or(UrlNormalizationError::MissingHost)?
        .to_ascii_lowercase();

    let mut normalized = format!("{}://{}", scheme, host);
    if let Some(port) = url.port() {
        normalized.push_str(&format!(":{}", port));
    }

    if url.path() != "/" || has_explicit_path(&candidate) {
        normalized.push_str(url.path());
    }

    if url.query().is_some_and(|q| !q.is_empty()) {
        let sorted: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(sorted.iter())
            .finish();
        if !query.is_empty() {
            normalized.push('?');
            normalized.push_str(&query);
        }
    }

    Ok(normalized)
}

/// Returns true if the raw URL spells out a path after the authority.
fn has_explicit_path(raw: &str) -> bool {
    let after_scheme = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority_and_path = after_scheme
        .split(['?', '#'])
        .next()
        .unwrap_or(after_scheme);
    authority_and_path.contains('/')
}

/// Extracts the lowercase host of a URL, or an empty string.
pub fn url_domain(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .unwrap_or_default()
}
