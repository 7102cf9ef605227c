//! A single cached response

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CacheCategory;

/// Cached API response together with the metadata needed to expire it
///
/// Persisted as `{"url", "payload", "storedAt", "category"}` with `storedAt`
/// in milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Original request string, query included
    pub url: String,
    /// Decoded response body
    pub payload: Value,
    /// When the entry was written
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
    /// Decides the expiration window
    pub category: CacheCategory,
}

impl CacheEntry {
    pub fn new(url: impl Into<String>, payload: Value, category: CacheCategory, now: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            payload,
            stored_at: now,
            category,
        }
    }

    /// Time elapsed since the entry was written
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.stored_at
    }

    /// Whether the entry is still inside its category's expiration window
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.age(now) < self.category.expiration()
    }
}
