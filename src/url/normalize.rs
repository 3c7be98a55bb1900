use crate::UrlError;
use url::Url;

/// Schemes that can never be fetched and are dropped during href resolution
const UNFETCHABLE_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a URL into the form used as a key throughout the audit
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// The query string is preserved: `/search?q=a` and `/search?q=b` are different pages.
///
/// # Examples
///
/// ```
/// use spider_audit::url::normalize_url;
///
/// let url = normalize_url("https://example.com/page?x=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page?x=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Splits an href at its first `#`
///
/// The fragment is returned raw, without percent-decoding, because it is compared
/// against raw `id` attribute values.
pub fn split_fragment(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((before, fragment)) => (before, Some(fragment)),
        None => (href, None),
    }
}

/// Resolves an href found on `base` into an absolute, fragment-free URL
///
/// Returns `None` for empty hrefs, unfetchable schemes (`javascript:`, `mailto:`,
/// `tel:`, `data:`), hrefs that cannot be joined onto `base`, and results that are not
/// `http`/`https`.
///
/// # Examples
///
/// ```
/// use spider_audit::url::resolve_href;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/docs/intro").unwrap();
/// let resolved = resolve_href("setup?lang=en#install", &base).unwrap();
/// assert_eq!(resolved.as_str(), "https://example.com/docs/setup?lang=en");
/// ```
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if UNFETCHABLE_SCHEMES
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut resolved = base.join(href).ok()?;
    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return None;
    }

    resolved.set_fragment(None);
    Some(resolved)
}
