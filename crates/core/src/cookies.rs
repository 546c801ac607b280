//! Cookie header parsing and URL helpers
//!
//! Forwarded cookies arrive as a single `name=value; name2=value2` string,
//! the same shape as a browser `Cookie` header.

/// Name of the cookie the backend uses to hand out the CSRF token.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// Split a cookie header into `(name, value)` pairs.
///
/// Empty segments and segments without `=` are skipped. Names and values are
/// trimmed; values are returned as-is (not percent-decoded).
pub fn parse_cookie_header(header: &str) -> Vec<(&str, &str)> {
    header
        .split(';')
        .filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name, value.trim()))
        })
        .collect()
}

/// Value of the first cookie called `name`, if present and non-empty.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    parse_cookie_header(header)
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// Join `(name, value)` pairs back into a cookie header.
pub fn join_cookie_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(n, v)| format!("{n}={v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Whether `target` is an absolute `http://` or `https://` URL rather than a
/// path relative to the API base.
pub fn is_absolute_url(target: &str) -> bool {
    let lower = target.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Append a backend path to the base URL.
///
/// The path is appended verbatim, so `/books/` stays `/books/`. A trailing
/// slash on the base is dropped when the path starts with one.
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    } else {
        format!("{base_url}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookie_header() {
        let pairs = parse_cookie_header("JSESSIONID=abc123; XSRF-TOKEN=tok; theme=dark");
        assert_eq!(
            pairs,
            vec![("JSESSIONID", "abc123"), ("XSRF-TOKEN", "tok"), ("theme", "dark")]
        );
    }

    #[test]
    fn test_parse_cookie_header_skips_garbage() {
        let pairs = parse_cookie_header(";; novalue ; =orphan; a=1;");
        assert_eq!(pairs, vec![("a", "1")]);
    }

    #[test]
    fn test_parse_cookie_header_keeps_equals_in_value() {
        let pairs = parse_cookie_header("token=a=b==");
        assert_eq!(pairs, vec![("token", "a=b==")]);
    }

    #[test]
    fn test_cookie_value() {
        let header = "JSESSIONID=abc; XSRF-TOKEN=0f9e";
        assert_eq!(cookie_value(header, XSRF_COOKIE), Some("0f9e"));
        assert_eq!(cookie_value(header, "missing"), None);
        assert_eq!(cookie_value("XSRF-TOKEN=", XSRF_COOKIE), None);
    }

    #[test]
    fn test_join_cookie_pairs() {
        let joined = join_cookie_pairs(vec![("a", "1"), ("b", "2")]);
        assert_eq!(joined, "a=1; b=2");
        assert_eq!(parse_cookie_header(&joined), vec![("a", "1"), ("b", "2")]);
    }

    #[test]
    fn test_is_absolute_url() {
        assert!(is_absolute_url("https://bucket.oss-cn-hangzhou.aliyuncs.com"));
        assert!(is_absolute_url("HTTP://example.com/upload"));
        assert!(!is_absolute_url("/auth/avatar"));
        assert!(!is_absolute_url("books/new/123"));
    }

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:3000/api", "/books/recommendations/"),
            "http://localhost:3000/api/books/recommendations/"
        );
        assert_eq!(
            join_url("http://localhost:3000/api/", "/auth/user"),
            "http://localhost:3000/api/auth/user"
        );
        assert_eq!(
            join_url("http://localhost:3000/api/", "articles/1"),
            "http://localhost:3000/api/articles/1"
        );
    }
}
