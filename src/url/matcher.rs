/// Checks if a URL starts with any of the given prefixes
///
/// Matching is a plain string prefix test against the serialized absolute URL,
/// so `https://example.com` covers the whole domain (and, being a prefix test,
/// also `https://example.com.evil.net`; use a trailing `/` to avoid that).
///
/// # Examples
///
/// ```
/// use harvester::url::matches_any_prefix;
///
/// let prefixes = vec!["https://example.com/docs".to_string()];
/// assert!(matches_any_prefix(&prefixes, "https://example.com/docs/intro"));
/// assert!(!matches_any_prefix(&prefixes, "https://example.com/blog"));
/// assert!(!matches_any_prefix(&[], "https://example.com/"));
/// ```
pub fn matches_any_prefix(prefixes: &[String], candidate: &str) -> bool {
    prefixes
        .iter()
        .any(|prefix| candidate.starts_with(prefix.as_str()))
}
