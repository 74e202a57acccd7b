use crate::UrlError;
use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Parses the base URL of a crawl target
///
/// Accepts a bare domain (`example.com`) as well as a full URL; `https://`
/// is assumed when no scheme is given.
///
/// # Returns
///
/// * `Ok(Url)` - An http(s) URL with a host
/// * `Err(UrlError)` - Unparseable input, another scheme, or no host
pub fn parse_base_url(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Parse("empty base URL".to_string()));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}

/// Returns true when both URLs belong to the same site
///
/// Hosts are compared case-insensitively with a leading `www.` ignored. The
/// scheme does not matter: `http://` and `https://` on their default ports are
/// one site. Explicit non-default ports must match.
pub fn same_site(a: &Url, b: &Url) -> bool {
    let (Some(host_a), Some(host_b)) = (extract_domain(a), extract_domain(b)) else {
        return false;
    };

    // `Url::port` is None for the scheme's default port
    strip_www(&host_a) == strip_www(&host_b) && a.port() == b.port()
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
