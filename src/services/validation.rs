use std::sync::LazyLock;

use regex::Regex;
use url::Url;

/// Query parameters that only carry tracking state.
const TRACKING_PARAMS: &[&str] = &["si", "feature", "utm_source", "utm_medium", "utm_campaign"];

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"<[^>]*>").expect("tag pattern is valid")
});

/// Parse a user-supplied URL, accepting only http(s) with a host.
pub fn parse_http_url(raw: &str) -> Result<Url, UrlError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Missing);
    }
    let url = Url::parse(trimmed).map_err(|_| UrlError::Malformed)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(UrlError::Scheme);
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::Malformed);
    }
    Ok(url)
}

/// Validate and strip tracking parameters.
pub fn normalize_url(raw: &str) -> Result<String, UrlError> {
    let mut url = parse_http_url(raw)?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    Ok(url.to_string())
}

/// Remove markup and quote characters from free-form request input.
pub fn sanitize_input(input: &str) -> String {
    HTML_TAG
        .replace_all(input, "")
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '\'' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlError {
    #[error("URL is required")]
    Missing,

    #[error("Invalid URL format")]
    Malformed,

    #[error("Only HTTP and HTTPS URLs are supported")]
    Scheme,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_http() {
        assert_eq!(parse_http_url("ftp://example.com/a"), Err(UrlError::Scheme));
        assert_eq!(parse_http_url("file:///etc/passwd"), Err(UrlError::Scheme));
        assert_eq!(parse_http_url("not a url"), Err(UrlError::Malformed));
        assert_eq!(parse_http_url("  "), Err(UrlError::Missing));
    }

    #[test]
    fn test_strips_tracking_params() {
        let url = normalize_url("https://youtu.be/abc?si=XYZ&t=42&utm_source=share").unwrap();
        assert_eq!(url, "https://youtu.be/abc?t=42");
    }

    #[test]
    fn test_drops_empty_query() {
        let url = normalize_url("https://www.youtube.com/watch?feature=shared").unwrap();
        assert_eq!(url, "https://www.youtube.com/watch");
    }

    #[test]
    fn test_keeps_video_id() {
        let url = normalize_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&utm_campaign=x").unwrap();
        assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_sanitize_input() {
        assert_eq!(sanitize_input(" <b>https://a.com/x</b> "), "https://a.com/x");
        assert_eq!(sanitize_input("mp4\"'"), "mp4");
    }
}
