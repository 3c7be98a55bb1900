use regex::Regex;

/// Placeholder replaced by the crawl's root URL before a pattern is compiled
pub const ROOT_URL_TOKEN: &str = "#{ROOT_URL}";

/// Short form of [`ROOT_URL_TOKEN`]
pub const ROOT_TOKEN: &str = "#{ROOT}";

/// Substitutes every root URL placeholder in `pattern` with `root_url`
///
/// The root URL is inserted verbatim, not regex-escaped.
pub fn substitute_root(pattern: &str, root_url: &str) -> String {
    pattern
        .replace(ROOT_URL_TOKEN, root_url)
        .replace(ROOT_TOKEN, root_url)
}

/// Returns the first pattern in `patterns` whose regular expression matches `url`
///
/// Patterns are tried in list order and the first match wins, so when patterns
/// overlap the one listed earlier decides the outcome. The returned string is the
/// pattern as written, before root URL substitution.
///
/// Patterns that do not compile never match.
///
/// # Arguments
///
/// * `patterns` - Ordered list of regular expression sources
/// * `url` - The URL to test
/// * `root_url` - Value substituted for `#{ROOT_URL}` / `#{ROOT}`
///
/// # Examples
///
/// ```
/// use spider_audit::url::first_matching_pattern;
///
/// let patterns = vec!["^#{ROOT_URL}/lala/$".to_string()];
/// assert_eq!(
///     first_matching_pattern(&patterns, "https://localhost:9999/lala/", "https://localhost:9999"),
///     Some("^#{ROOT_URL}/lala/$")
/// );
/// assert_eq!(first_matching_pattern(&[], "https://example.com", ""), None);
/// ```
pub fn first_matching_pattern<'a>(
    patterns: &'a [String],
    url: &str,
    root_url: &str,
) -> Option<&'a str> {
    patterns.iter().map(String::as_str).find(|pattern| {
        Regex::new(&substitute_root(pattern, root_url))
            .map(|re| re.is_match(url))
            .unwrap_or(false)
    })
}

/// A single pattern with its compiled form
#[derive(Debug, Clone)]
struct CompiledPattern {
    source: String,
    regex: Option<Regex>,
}

/// An ordered list of URL patterns compiled once at the start of a run
///
/// This is the precompiled equivalent of [`first_matching_pattern`]: lookups never
/// re-parse pattern sources, and match order is the order the patterns were given in.
#[derive(Debug, Clone, Default)]
pub struct PatternList {
    patterns: Vec<CompiledPattern>,
}

impl PatternList {
    /// Compiles `sources` with the root URL substituted
    ///
    /// A pattern that fails to compile is kept in the list (so `len()` reflects the
    /// configuration) but never matches. A warning is logged for it.
    pub fn compile(sources: &[String], root_url: &str) -> Self {
        let patterns = sources
            .iter()
            .map(|source| {
                let regex = match Regex::new(&substitute_root(source, root_url)) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!("Ignoring pattern '{}' that does not compile: {}", source, e);
                        None
                    }
                };
                CompiledPattern {
                    source: source.clone(),
                    regex,
                }
            })
            .collect();

        Self { patterns }
    }

    /// Returns the source of the first pattern matching `url`
    pub fn first_match(&self, url: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|p| p.regex.as_ref().is_some_and(|re| re.is_match(url)))
            .map(|p| p.source.as_str())
    }

    /// Returns true if any pattern matches `url`
    pub fn matches(&self, url: &str) -> bool {
        self.first_match(url).is_some()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_pattern_matches() {
        let list = patterns(&[r"https:\/\/example\.com"]);
        assert_eq!(
            first_matching_pattern(&list, "https://example.com", ""),
            Some(list[0].as_str())
        );
    }

    #[test]
    fn test_first_of_several_matches_wins() {
        let list = patterns(&[r"https:\/\/example\.com", "com", "example"]);

        assert_eq!(
            first_matching_pattern(&list, "https://example.com", ""),
            Some(list[0].as_str())
        );
        assert_eq!(
            first_matching_pattern(&list, "https://github.com", ""),
            Some(list[1].as_str())
        );
        assert_eq!(
            first_matching_pattern(&list, "https://example.org", ""),
            Some(list[2].as_str())
        );
    }

    #[test]
    fn test_overlapping_patterns_keep_input_order() {
        let list = patterns(&["a", "b"]);
        assert_eq!(first_matching_pattern(&list, "https://ab.test", ""), Some("a"));

        let reversed = patterns(&["b", "a"]);
        assert_eq!(
            first_matching_pattern(&reversed, "https://ab.test", ""),
            Some("b")
        );
    }

    #[test]
    fn test_no_match() {
        let list = patterns(&[r"https:\/\/example\.com"]);
        assert_eq!(first_matching_pattern(&list, "https://github.com", ""), None);
    }

    #[test]
    fn test_empty_patterns_never_match() {
        assert_eq!(first_matching_pattern(&[], "https://example.com", ""), None);
        assert!(PatternList::default().first_match("https://example.com").is_none());
    }

    #[test]
    fn test_root_url_substitution() {
        let list = patterns(&[r"^#{ROOT_URL}\/lala\/$"]);
        assert_eq!(
            first_matching_pattern(
                &list,
                "https://localhost:9999/lala/",
                "https://localhost:9999"
            ),
            Some(list[0].as_str())
        );
        assert_eq!(
            first_matching_pattern(&list, "https://example.com", "https://localhost:9999"),
            None
        );
    }

    #[test]
    fn test_short_root_token() {
        let list = patterns(&["^#{ROOT}/x/$"]);
        let compiled = PatternList::compile(&list, "https://h:9999");

        assert_eq!(compiled.first_match("https://h:9999/x/"), Some("^#{ROOT}/x/$"));
        assert_eq!(compiled.first_match("https://other.com"), None);
    }

    #[test]
    fn test_every_token_occurrence_substituted() {
        assert_eq!(
            substitute_root("^#{ROOT}/a|^#{ROOT_URL}/b", "https://r"),
            "^https://r/a|^https://r/b"
        );
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        let list = patterns(&["(unclosed", "example"]);

        assert_eq!(
            first_matching_pattern(&list, "https://example.com", ""),
            Some("example")
        );

        let compiled = PatternList::compile(&list, "");
        assert_eq!(compiled.len(), 2);
        assert_eq!(compiled.first_match("https://example.com"), Some("example"));
        assert_eq!(compiled.first_match("(unclosed"), None);
    }

    #[test]
    fn test_compiled_list_matches_function() {
        let list = patterns(&["^#{ROOT_URL}/docs/", "/blog/"]);
        let compiled = PatternList::compile(&list, "https://site.test");

        for url in [
            "https://site.test/docs/intro",
            "https://site.test/blog/post",
            "https://elsewhere.test/docs/",
        ] {
            assert_eq!(
                compiled.first_match(url),
                first_matching_pattern(&list, url, "https://site.test")
            );
        }
    }
}
