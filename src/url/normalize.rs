use crate::UrlError;
use url::form_urlencoded;
use url::Url;

/// Normalizes a URL according to Site-Audit's deduplication rules
///
/// # Normalization Steps
///
/// 1. Resolve `raw` against `base`; reject if malformed
/// 2. Reject anything that is not http(s)
/// 3. Remove fragment (everything after #)
/// 4. Sort query parameters by key (stable, so equal keys keep their order)
/// 5. Remove empty query string (trailing ?)
/// 6. Remove trailing slashes from the path, except for root /
/// 7. Lowercase the whole result
///
/// Two URLs that differ only in fragment, query parameter order, trailing
/// slash or letter case normalize to the same string.
///
/// # Arguments
///
/// * `raw` - The URL string, absolute or relative
/// * `base` - The URL relative references are resolved against
///
/// # Returns
///
/// * `Ok(String)` - Canonical absolute URL
/// * `Err(UrlError)` - The URL cannot be crawled; callers drop it
///
/// # Examples
///
/// ```
/// use site_audit::url::normalize_url;
/// use url::Url;
///
/// let base = Url::parse("https://a.com/").unwrap();
/// let url = normalize_url("/X/?b=2&a=1#top", &base).unwrap();
/// assert_eq!(url, "https://a.com/x?a=1&b=2");
/// ```
pub fn normalize_url(raw: &str, base: &Url) -> Result<String, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let mut url = base
        .join(raw)
        .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.query().is_some() {
        let params = sorted_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(params)
                .finish();
            url.set_query(Some(&query));
        }
    }

    let path = strip_trailing_slashes(url.path());
    url.set_path(&path);

    Ok(url.as_str().to_lowercase())
}

/// Decodes query parameters and sorts them by (lowercased) key
///
/// Pairs are lowercased before sorting so the order does not change when an
/// already-normalized URL is normalized again.
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
        .collect();

    // `sort_by` is stable: duplicate keys keep their original order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Removes trailing slashes, keeping a lone root `/`
fn strip_trailing_slashes(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
