// src/utils/url.rs

//! URL resolution and normalization.
//!
//! `normalize` is the identity used for frontier deduplication: the
//! normalized form is the `url_norm` key in storage, so changing this
//! function invalidates any existing frontier.

use url::Url;

use crate::error::Result;

/// Resolve a potentially relative `href` against a base URL.
///
/// Fails if either the base or the reference is unparseable.
pub fn resolve(base: &str, href: &str) -> Result<String> {
    let base = Url::parse(base)?;
    Ok(base.join(href)?.to_string())
}

/// Normalize a URL into its canonical frontier key.
///
/// - lowercases scheme and host (the parser already canonicalizes both)
/// - drops the fragment
/// - re-encodes the query, keeping keys in first-appearance order with
///   each key's values sorted
/// - strips trailing slashes unless the path is exactly "/"
pub fn normalize(raw: &str) -> Result<String> {
    let mut u = Url::parse(raw)?;

    u.set_fragment(None);

    let pairs: Vec<(String, String)> = u
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if pairs.is_empty() {
        u.set_query(None);
    } else {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &pairs {
            if !keys.contains(&k.as_str()) {
                keys.push(k.as_str());
            }
        }
        let mut encoded: Vec<(&str, &str)> = Vec::with_capacity(pairs.len());
        for key in keys {
            let mut values: Vec<&str> = pairs
                .iter()
                .filter(|(k, _)| k.as_str() == key)
                .map(|(_, v)| v.as_str())
                .collect();
            values.sort_unstable();
            encoded.extend(values.into_iter().map(|v| (key, v)));
        }
        u.query_pairs_mut().clear().extend_pairs(encoded);
    }

    let path = u.path();
    if path != "/" && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        u.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }

    Ok(u.to_string())
}

/// The lowercased host of a URL.
pub fn hostname(raw: &str) -> Result<String> {
    let u = Url::parse(raw)?;
    Ok(u.host_str().unwrap_or_default().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve("https://example.test/a/b", "c").unwrap(),
            "https://example.test/a/c"
        );
        assert_eq!(
            resolve("https://example.test/a/", "/root").unwrap(),
            "https://example.test/root"
        );
        assert_eq!(
            resolve("https://example.test/", "https://other.test/x").unwrap(),
            "https://other.test/x"
        );
    }

    #[test]
    fn test_resolve_unparseable_base_fails() {
        assert!(resolve("not a url", "page.html").is_err());
    }

    #[test]
    fn test_normalize_lowercases_scheme_and_host() {
        assert_eq!(
            normalize("HTTPS://Example.TEST/Path").unwrap(),
            "https://example.test/Path"
        );
    }

    #[test]
    fn test_normalize_drops_fragment() {
        assert_eq!(
            normalize("https://example.test/a#section").unwrap(),
            "https://example.test/a"
        );
    }

    #[test]
    fn test_normalize_sorts_values_per_key() {
        assert_eq!(
            normalize("https://example.test/?b=2&b=1&a=3").unwrap(),
            "https://example.test/?b=1&b=2&a=3"
        );
    }

    #[test]
    fn test_normalize_strips_trailing_slash() {
        assert_eq!(
            normalize("https://example.test/a/").unwrap(),
            "https://example.test/a"
        );
        assert_eq!(
            normalize("https://example.test/").unwrap(),
            "https://example.test/"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in [
            "https://Example.test/a/b/?z=9&z=1&a=2#frag",
            "https://example.test///",
            "https://example.test/a?x=&x=0",
        ] {
            let once = normalize(raw).unwrap();
            assert_eq!(normalize(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_hostname() {
        assert_eq!(
            hostname("https://Sub.Example.TEST:8080/x").unwrap(),
            "sub.example.test"
        );
    }
}
