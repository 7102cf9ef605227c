//! HTTP fetch layer in front of the response cache
//!
//! Every JSON request goes through [`FetchGateway::fetch_json`], which answers
//! from the cache when it can and fills the cache after a successful fetch.

use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheCategory, KeyPolicy, RequestKey, ResponseCache};

/// Errors that can occur when fetching API data
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("API request failed with status {status}: {url}")]
    Status { status: StatusCode, url: String },

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(String),

    /// Invalid time format in response
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    /// Geocoding returned no results
    #[error("Location not found: {0}")]
    NotFound(String),

    /// Request parameters the API would reject
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Issues GET requests, consulting the cache first
#[derive(Debug, Clone)]
pub struct FetchGateway {
    client: Client,
    cache: Option<ResponseCache>,
    key_policy: KeyPolicy,
}

impl FetchGateway {
    /// Creates a gateway; `None` disables caching entirely
    pub fn new(cache: Option<ResponseCache>) -> Self {
        Self::with_client(Client::new(), cache)
    }

    /// Creates a gateway with a custom HTTP client
    pub fn with_client(client: Client, cache: Option<ResponseCache>) -> Self {
        let key_policy = cache
            .as_ref()
            .map(|cache| cache.config().key_policy)
            .unwrap_or_default();
        Self {
            client,
            cache,
            key_policy,
        }
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// The cache identity of a request of kind `category` to `url`
    pub fn request_key(&self, category: CacheCategory, url: &str) -> RequestKey {
        RequestKey::new(category, url, self.key_policy)
    }

    /// Fetches `url` as JSON, answering from the cache when fresh
    pub async fn fetch_json(&self, category: CacheCategory, url: &str) -> Result<Value, FetchError> {
        let key = self.request_key(category, url);

        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            return Ok(hit);
        }

        debug!(url, "Fetching fresh data");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                url: url.to_string(),
            });
        }

        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text)?;

        if let Some(cache) = &self.cache {
            cache.put(&key, payload.clone());
        }
        Ok(payload)
    }

    /// Drops cached responses whose key or URL starts with one of `prefixes`
    pub fn invalidate<S: AsRef<str>>(&self, prefixes: &[S]) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| cache.invalidate(prefixes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStorage;
    use crate::config::CacheConfig;
    use serde_json::json;
    use std::sync::Arc;

    fn gateway_with_policy(key_policy: KeyPolicy) -> FetchGateway {
        let config = CacheConfig {
            key_policy,
            ..Default::default()
        };
        let cache = ResponseCache::new(config, Arc::new(MemoryStorage::new()));
        FetchGateway::new(Some(cache))
    }

    #[test]
    fn test_key_policy_follows_cache_config() {
        let gateway = gateway_with_policy(KeyPolicy::PathOnly);
        let key = gateway.request_key(CacheCategory::Weather, "https://api/v1/forecast?lat=1");
        assert_eq!(key.key(), "https://api/v1/forecast");
    }

    #[test]
    fn test_uncached_gateway_uses_default_policy() {
        let gateway = FetchGateway::new(None);
        assert!(gateway.cache().is_none());
        let key = gateway.request_key(CacheCategory::Weather, "https://api/v1/forecast?lat=1");
        assert_eq!(key.key(), "https://api/v1/forecast?lat=1");
        assert_eq!(gateway.invalidate(&["https://api"]), 0);
    }

    #[tokio::test]
    async fn test_fetch_json_answers_from_cache() {
        let gateway = gateway_with_policy(KeyPolicy::FullUrl);
        // Unroutable host: a network attempt would fail the test
        let url = "http://weatherpulse.invalid/v1/forecast?latitude=1&longitude=2";
        let key = gateway.request_key(CacheCategory::Weather, url);
        gateway.cache().unwrap().put(&key, json!({"temp": 5}));

        let payload = gateway
            .fetch_json(CacheCategory::Weather, url)
            .await
            .expect("Should be served from cache");
        assert_eq!(payload, json!({"temp": 5}));
    }

    #[tokio::test]
    async fn test_fetch_json_miss_reports_network_error() {
        let gateway = gateway_with_policy(KeyPolicy::FullUrl);
        let result = gateway
            .fetch_json(CacheCategory::Weather, "http://weatherpulse.invalid/v1/forecast")
            .await;
        assert!(matches!(result, Err(FetchError::RequestFailed(_))));
        assert!(gateway.cache().unwrap().is_empty(), "Failures are not cached");
    }
}
