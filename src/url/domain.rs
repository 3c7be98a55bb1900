use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use spider_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs share a host
///
/// Ports and schemes are not compared; only pages on the crawled host are parsed for
/// links, whichever port they are served from.
pub fn is_same_host(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Returns the root URL (`scheme://host[:port]`) of a seed URL
///
/// This is the value substituted into policy patterns.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use spider_audit::url::root_url;
///
/// let seed = Url::parse("https://localhost:9999/start/here").unwrap();
/// assert_eq!(root_url(&seed), "https://localhost:9999");
/// ```
pub fn root_url(seed: &Url) -> String {
    let host = seed.host_str().unwrap_or_default();
    match seed.port() {
        Some(port) => format!("{}://{}:{}", seed.scheme(), host, port),
        None => format!("{}://{}", seed.scheme(), host),
    }
}
