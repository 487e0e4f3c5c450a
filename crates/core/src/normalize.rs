use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::types::CanonicalUrl;

/// Patterns excluded from the frontier regardless of host. Mirrors the
/// default exclusion list of the original crawler this is descended from.
static EXCLUDED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(login|logout|signin|signout|auth)").expect("static regex")
});

static EXCLUDED_SUFFIX: &[&str] = &[".css", ".js", ".json", ".xml"];

/// Resolve `link` against `base`, then canonicalize: lowercase the host,
/// strip the fragment, and drop a trailing `/` from the path (unless the
/// path is just `/`).
pub fn normalize_url(link: &str, base: &Url) -> Option<CanonicalUrl> {
    let mut url = base.join(link).ok()?;
    url.set_fragment(None);

    let host = url.host_str()?.to_lowercase();
    url.set_host(Some(&host)).ok()?;

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(CanonicalUrl(url.to_string()))
}

/// True if `url` stays on `domain` and doesn't match an excluded pattern.
/// The XML suffix exclusion does not apply to sitemap fetches, which never
/// go through this validator.
pub fn is_valid_url(url: &Url, domain: &str) -> bool {
    let Some(host) = url.host_str() else { return false };
    if !host.eq_ignore_ascii_case(domain) {
        return false;
    }

    let path_and_query = url.path().to_string()
        + url.query().map(|q| format!("?{q}")).unwrap_or_default().as_str();
    if EXCLUDED_PATTERN.is_match(&path_and_query) {
        return false;
    }

    let path_lower = url.path().to_lowercase();
    if EXCLUDED_SUFFIX.iter().any(|suf| path_lower.ends_with(suf)) {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fragment_and_trailing_slash() {
        let base = Url::parse("https://example.com/a/").unwrap();
        let got = normalize_url("page/?x=1#section", &base).unwrap();
        assert_eq!(got.as_str(), "https://example.com/a/page?x=1");
    }

    #[test]
    fn root_path_keeps_single_slash() {
        let base = Url::parse("https://example.com/").unwrap();
        let got = normalize_url("/", &base).unwrap();
        assert_eq!(got.as_str(), "https://example.com/");
    }

    #[test]
    fn lowercases_host() {
        let base = Url::parse("https://Example.COM/").unwrap();
        let got = normalize_url("/Path", &base).unwrap();
        assert!(got.as_str().starts_with("https://example.com"));
    }

    #[test]
    fn rejects_cross_domain() {
        let url = Url::parse("https://other.com/page").unwrap();
        assert!(!is_valid_url(&url, "example.com"));
    }

    #[test]
    fn rejects_login_paths() {
        let url = Url::parse("https://example.com/user/login").unwrap();
        assert!(!is_valid_url(&url, "example.com"));
    }

    #[test]
    fn rejects_static_asset_suffixes() {
        let url = Url::parse("https://example.com/app.js").unwrap();
        assert!(!is_valid_url(&url, "example.com"));
    }

    #[test]
    fn accepts_plain_page() {
        let url = Url::parse("https://example.com/articles/42").unwrap();
        assert!(is_valid_url(&url, "example.com"));
    }
}
