//! Response categories and their expiration windows

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Kind of API response held in the cache
///
/// The category decides how long an entry stays fresh. Current conditions go
/// stale quickly, while geocoding results barely change at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheCategory {
    /// Current conditions (the `/forecast` endpoint)
    Weather,
    /// Everything else, e.g. air quality
    Forecast,
    /// City name to coordinates lookups
    Geocoding,
    /// Search-as-you-type suggestions
    Suggestions,
}

impl CacheCategory {
    /// All categories, in display order
    pub const ALL: [CacheCategory; 4] = [
        CacheCategory::Weather,
        CacheCategory::Forecast,
        CacheCategory::Geocoding,
        CacheCategory::Suggestions,
    ];

    /// How long an entry of this category is considered fresh
    pub fn expiration(self) -> Duration {
        match self {
            CacheCategory::Weather => Duration::minutes(5),
            CacheCategory::Forecast => Duration::minutes(30),
            CacheCategory::Geocoding => Duration::hours(24),
            CacheCategory::Suggestions => Duration::hours(1),
        }
    }

    /// Derives a category from a request URL by looking for endpoint markers
    ///
    /// Checks are ordered: a URL containing both `/forecast` and `/search`
    /// is classified as `Weather`. Anything unrecognized lands in `Forecast`.
    pub fn classify(url: &str) -> Self {
        if url.contains("/forecast") {
            CacheCategory::Weather
        } else if url.contains("/search") {
            CacheCategory::Geocoding
        } else if url.contains("suggestions_") {
            CacheCategory::Suggestions
        } else {
            CacheCategory::Forecast
        }
    }

    /// Lowercase name, matching the serialized form
    pub fn as_str(self) -> &'static str {
        match self {
            CacheCategory::Weather => "weather",
            CacheCategory::Forecast => "forecast",
            CacheCategory::Geocoding => "geocoding",
            CacheCategory::Suggestions => "suggestions",
        }
    }
}

impl std::fmt::Display for CacheCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiration_windows() {
        assert_eq!(CacheCategory::Weather.expiration(), Duration::minutes(5));
        assert_eq!(CacheCategory::Forecast.expiration(), Duration::minutes(30));
        assert_eq!(CacheCategory::Geocoding.expiration(), Duration::hours(24));
        assert_eq!(CacheCategory::Suggestions.expiration(), Duration::hours(1));
    }

    #[test]
    fn test_classify_forecast_endpoint_is_weather() {
        assert_eq!(
            CacheCategory::classify("https://api.open-meteo.com/v1/forecast?latitude=1&longitude=2"),
            CacheCategory::Weather
        );
    }

    #[test]
    fn test_classify_search_endpoint_is_geocoding() {
        assert_eq!(
            CacheCategory::classify("https://geocoding-api.open-meteo.com/v1/search?name=Oslo"),
            CacheCategory::Geocoding
        );
    }

    #[test]
    fn test_classify_suggestions_marker() {
        assert_eq!(CacheCategory::classify("suggestions_osl"), CacheCategory::Suggestions);
    }

    #[test]
    fn test_classify_unknown_defaults_to_forecast() {
        assert_eq!(
            CacheCategory::classify("https://air-quality-api.open-meteo.com/v1/air-quality?latitude=1"),
            CacheCategory::Forecast
        );
    }

    #[test]
    fn test_classify_forecast_wins_over_search() {
        assert_eq!(
            CacheCategory::classify("https://example.com/search/forecast"),
            CacheCategory::Weather
        );
    }

    #[test]
    fn test_classify_is_deterministic() {
        let url = "https://geocoding-api.open-meteo.com/v1/search?name=Lima";
        assert_eq!(CacheCategory::classify(url), CacheCategory::classify(url));
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&CacheCategory::Geocoding).unwrap();
        assert_eq!(json, "\"geocoding\"");
        let back: CacheCategory = serde_json::from_str("\"suggestions\"").unwrap();
        assert_eq!(back, CacheCategory::Suggestions);
    }
}
