//! Request identity: canonical cache keys derived from request URLs

use serde::{Deserialize, Serialize};
use url::Url;

use super::CacheCategory;

/// How a request URL is reduced to a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// Keep only what precedes the first `?`.
    ///
    /// Requests to one endpoint share a single entry regardless of their
    /// query, so two cities looked up through `/forecast` collide.
    PathOnly,
    /// Keep the query too, with parameters sorted by name
    #[default]
    FullUrl,
}

impl KeyPolicy {
    /// Reduces `url` to its canonical cache key under this policy
    pub fn canonicalize(self, url: &str) -> String {
        match self {
            KeyPolicy::PathOnly => url.split_once('?').map_or(url, |(path, _)| path).to_string(),
            KeyPolicy::FullUrl => canonical_full_url(url),
        }
    }
}

/// Sorts query parameters by name and drops any fragment.
///
/// Strings that do not parse as URLs (e.g. `suggestions_osl`) are used as-is.
fn canonical_full_url(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let mut pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    parsed.set_fragment(None);
    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(pairs);
    }

    parsed.to_string()
}

/// A request as the cache sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestKey {
    key: String,
    url: String,
    category: CacheCategory,
}

impl RequestKey {
    /// Builds a key for a request whose kind the caller already knows
    pub fn new(category: CacheCategory, url: impl Into<String>, policy: KeyPolicy) -> Self {
        let url = url.into();
        Self {
            key: policy.canonicalize(&url),
            url,
            category,
        }
    }

    /// Builds a key whose category is inferred from endpoint markers in the URL
    pub fn classify(url: impl Into<String>, policy: KeyPolicy) -> Self {
        let url = url.into();
        let category = CacheCategory::classify(&url);
        Self::new(category, url, policy)
    }

    /// Canonical key used for lookups
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The original request string, query included
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn category(&self) -> CacheCategory {
        self.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_only_strips_query() {
        let key = KeyPolicy::PathOnly.canonicalize("https://api/v1/forecast?lat=10&lon=20");
        assert_eq!(key, "https://api/v1/forecast");
    }

    #[test]
    fn test_path_only_without_query_is_unchanged() {
        assert_eq!(KeyPolicy::PathOnly.canonicalize("suggestions_par"), "suggestions_par");
    }

    #[test]
    fn test_full_url_ignores_parameter_order() {
        let a = KeyPolicy::FullUrl.canonicalize("https://api.open-meteo.com/v1/forecast?latitude=1&longitude=2");
        let b = KeyPolicy::FullUrl.canonicalize("https://api.open-meteo.com/v1/forecast?longitude=2&latitude=1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_full_url_keeps_coordinates_apart() {
        let a = KeyPolicy::FullUrl.canonicalize("https://api/v1/forecast?lat=10&lon=20");
        let b = KeyPolicy::FullUrl.canonicalize("https://api/v1/forecast?lat=99&lon=99");
        assert_ne!(a, b);
    }

    #[test]
    fn test_full_url_drops_fragment() {
        let key = KeyPolicy::FullUrl.canonicalize("https://example.com/a?b=1#section");
        assert_eq!(key, "https://example.com/a?b=1");
    }

    #[test]
    fn test_full_url_passes_through_non_urls() {
        assert_eq!(KeyPolicy::FullUrl.canonicalize("suggestions_lon"), "suggestions_lon");
    }

    #[test]
    fn test_request_key_keeps_original_url() {
        let url = "https://api/v1/forecast?lat=10&lon=20";
        let key = RequestKey::classify(url, KeyPolicy::PathOnly);
        assert_eq!(key.url(), url);
        assert_eq!(key.key(), "https://api/v1/forecast");
        assert_eq!(key.category(), CacheCategory::Weather);
    }

    #[test]
    fn test_explicit_category_is_not_rederived() {
        let key = RequestKey::new(
            CacheCategory::Suggestions,
            "https://geocoding-api.open-meteo.com/v1/search?name=Ro&count=5",
            KeyPolicy::FullUrl,
        );
        assert_eq!(key.category(), CacheCategory::Suggestions);
    }

    #[test]
    fn test_key_policy_deserializes_kebab_case() {
        let policy: KeyPolicy = serde_json::from_str("\"path-only\"").unwrap();
        assert_eq!(policy, KeyPolicy::PathOnly);
        assert_eq!(KeyPolicy::default(), KeyPolicy::FullUrl);
    }
}
