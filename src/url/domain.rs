use url::Url;

/// Extracts the host key used to cache per-host state such as robots.txt
///
/// The key is the lowercase host plus the port when the URL carries a
/// non-default one, so `http://127.0.0.1:8080` and `http://127.0.0.1:9090`
/// are distinct hosts.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use harvester::url::host_key;
///
/// let url = Url::parse("https://EXAMPLE.com/path").unwrap();
/// assert_eq!(host_key(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(host_key(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Builds the robots.txt location for the host of `url`
///
/// Returns None for URLs without a host.
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;

    let mut robots = url.clone();
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    // Credentials never belong in a robots.txt request
    let _ = robots.set_username("");
    let _ = robots.set_password(None);
    Some(robots)
}
