use url::Url;

/// Resolves an href found on a page to an absolute URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs (`#section`)
/// - hrefs that fail to parse against the base
/// - anything that is not http(s) after resolution
///   (`javascript:`, `mailto:`, `tel:`, `data:`, ...)
///
/// Fragments on regular links are kept as written.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use harvester::url::resolve_link;
///
/// let base = Url::parse("https://example.com/a/b").unwrap();
/// assert_eq!(resolve_link("../c", &base), Some("https://example.com/c".to_string()));
/// assert_eq!(resolve_link("#top", &base), None);
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;

    // Only accept HTTP and HTTPS URLs
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
