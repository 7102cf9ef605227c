//! Open-Meteo API client
//!
//! This module builds Open-Meteo request URLs, fetches them through the
//! [`FetchGateway`] and parses the responses into our data structures.

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};
use url::form_urlencoded;

use super::gateway::{FetchError, FetchGateway};
use super::{
    AirQuality, CurrentConditions, FloodDay, ForecastDay, HistoricalDay, Location, WeatherCondition,
};
use crate::cache::CacheCategory;

/// Forecast endpoint, also serving current conditions
pub const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
/// Geocoding base URL
pub const GEOCODING_URL: &str = "https://geocoding-api.open-meteo.com/v1";
/// Air quality endpoint
pub const AIR_QUALITY_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";
/// Historical weather endpoint
pub const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
/// River discharge endpoint
pub const FLOOD_URL: &str = "https://flood-api.open-meteo.com/v1/flood";

/// Number of search suggestions requested
const SUGGESTION_COUNT: u8 = 5;
/// Shorter queries are not worth a request
const MIN_SUGGESTION_QUERY_LEN: usize = 2;
/// Longest daily forecast the forecast endpoint serves
pub const MAX_FORECAST_DAYS: u8 = 16;
/// Longest river discharge forecast the flood endpoint serves
pub const MAX_FLOOD_DAYS: u8 = 210;
/// The archive lags real time by this many days
pub const ARCHIVE_DELAY_DAYS: u64 = 5;

/// URL for current conditions at the given coordinates
pub fn forecast_url(lat: f64, lon: f64) -> String {
    format!(
        "{}?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,apparent_temperature,weather_code,wind_speed_10m,wind_direction_10m&daily=sunrise,sunset,uv_index_max&timezone=auto&forecast_days=1",
        FORECAST_URL, lat, lon
    )
}

/// URL for a `days`-long daily forecast at the given coordinates
pub fn daily_forecast_url(lat: f64, lon: f64, days: u8) -> String {
    format!(
        "{}?latitude={}&longitude={}&daily=weather_code,temperature_2m_max,temperature_2m_min,precipitation_sum,precipitation_probability_max,wind_speed_10m_max&timezone=auto&forecast_days={}",
        FORECAST_URL, lat, lon, days
    )
}

/// URL for a place-name search returning up to `count` results
pub fn geocoding_url(name: &str, count: u8) -> String {
    let name: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!(
        "{}/search?name={}&count={}&language=en&format=json",
        GEOCODING_URL, name, count
    )
}

/// URL for naming a place from its coordinates
///
/// Open-Meteo has no reverse geocoding endpoint, so the coordinates go
/// through the name search as `lat,lon`.
pub fn reverse_geocoding_url(lat: f64, lon: f64) -> String {
    format!(
        "{}/search?name={},{}&count=1&language=en&format=json",
        GEOCODING_URL, lat, lon
    )
}

/// URL for current air quality at the given coordinates
pub fn air_quality_url(lat: f64, lon: f64) -> String {
    format!(
        "{}?latitude={}&longitude={}&current=european_aqi,us_aqi,pm10,pm2_5,ozone,nitrogen_dioxide&timezone=auto",
        AIR_QUALITY_URL, lat, lon
    )
}

/// URL for recorded daily weather between `start` and `end`, inclusive
pub fn historical_url(lat: f64, lon: f64, start: NaiveDate, end: NaiveDate) -> String {
    format!(
        "{}?latitude={}&longitude={}&start_date={}&end_date={}&daily=temperature_2m_max,temperature_2m_min,temperature_2m_mean,precipitation_sum,wind_speed_10m_max&timezone=auto",
        ARCHIVE_URL,
        lat,
        lon,
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    )
}

/// URL for a `days`-long river discharge forecast
pub fn flood_url(lat: f64, lon: f64, days: u8) -> String {
    format!(
        "{}?latitude={}&longitude={}&daily=river_discharge,river_discharge_mean,river_discharge_max&forecast_days={}&timezone=auto",
        FLOOD_URL, lat, lon, days
    )
}

/// URL prefixes of every cached response tied to a location
///
/// Covers forecasts, air quality, history, flood data and the coordinate
/// name lookup. Each prefix ends at the `&` after the longitude so 1.2
/// never matches 1.25.
pub fn location_prefixes(lat: f64, lon: f64) -> Vec<String> {
    vec![
        format!("{}?latitude={}&longitude={}&", FORECAST_URL, lat, lon),
        format!("{}?latitude={}&longitude={}&", AIR_QUALITY_URL, lat, lon),
        format!("{}?latitude={}&longitude={}&", ARCHIVE_URL, lat, lon),
        format!("{}?latitude={}&longitude={}&", FLOOD_URL, lat, lon),
        format!("{}/search?name={},{}&", GEOCODING_URL, lat, lon),
    ]
}

/// Checks an archive request: ordered dates, ending no later than the archive lag allows
pub fn check_history_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Result<(), FetchError> {
    if start > end {
        return Err(FetchError::InvalidRequest(format!(
            "history start {} is after end {}",
            start, end
        )));
    }

    let latest = today
        .checked_sub_days(Days::new(ARCHIVE_DELAY_DAYS))
        .ok_or_else(|| FetchError::InvalidRequest(format!("no archive data before {}", today)))?;
    if end > latest {
        return Err(FetchError::InvalidRequest(format!(
            "history ends {} but the archive only reaches {}",
            end, latest
        )));
    }
    Ok(())
}

fn check_days(what: &str, days: u8, max: u8) -> Result<(), FetchError> {
    if (1..=max).contains(&days) {
        Ok(())
    } else {
        Err(FetchError::InvalidRequest(format!(
            "{} must cover 1 to {} days, got {}",
            what, max, days
        )))
    }
}

/// Client for the Open-Meteo forecast, geocoding, air quality, archive and flood APIs
#[derive(Debug, Clone)]
pub struct WeatherClient {
    gateway: FetchGateway,
}

impl WeatherClient {
    pub fn new(gateway: FetchGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &FetchGateway {
        &self.gateway
    }

    /// Resolves a city name to its best-matching location
    pub async fn geocode(&self, city: &str) -> Result<Location, FetchError> {
        let payload = self
            .gateway
            .fetch_json(CacheCategory::Geocoding, &geocoding_url(city, 1))
            .await?;

        parse_locations(payload)?
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound(city.to_string()))
    }

    /// Names the place at the given coordinates
    ///
    /// Falls back to a name made from the coordinates when the lookup finds
    /// nothing or fails. The coordinates themselves are kept as given.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Location {
        let found = match self
            .gateway
            .fetch_json(CacheCategory::Geocoding, &reverse_geocoding_url(lat, lon))
            .await
            .and_then(parse_locations)
        {
            Ok(locations) => locations.into_iter().next(),
            Err(e) => {
                debug!(error = %e, "Coordinate lookup failed");
                None
            }
        };

        match found {
            Some(place) => Location {
                latitude: lat,
                longitude: lon,
                ..place
            },
            None => Location::from_coordinates(lat, lon),
        }
    }

    /// Places matching a partial name, for search-as-you-type
    ///
    /// Returns no suggestions, without a request, for queries under two characters.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<Location>, FetchError> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGESTION_QUERY_LEN {
            return Ok(Vec::new());
        }

        let payload = self
            .gateway
            .fetch_json(CacheCategory::Suggestions, &geocoding_url(query, SUGGESTION_COUNT))
            .await?;
        parse_locations(payload)
    }

    /// Current conditions at `location`
    pub async fn current_conditions(&self, location: &Location) -> Result<CurrentConditions, FetchError> {
        let payload = self
            .gateway
            .fetch_json(
                CacheCategory::Weather,
                &forecast_url(location.latitude, location.longitude),
            )
            .await?;
        parse_current_conditions(payload)
    }

    /// Daily forecast for the next `days` days (1 to 16)
    pub async fn daily_forecast(&self, location: &Location, days: u8) -> Result<Vec<ForecastDay>, FetchError> {
        check_days("forecast", days, MAX_FORECAST_DAYS)?;
        let payload = self
            .gateway
            .fetch_json(
                CacheCategory::Forecast,
                &daily_forecast_url(location.latitude, location.longitude, days),
            )
            .await?;
        parse_daily_forecast(payload)
    }

    /// Current air quality at `location`
    pub async fn air_quality(&self, location: &Location) -> Result<AirQuality, FetchError> {
        let payload = self
            .gateway
            .fetch_json(
                CacheCategory::Forecast,
                &air_quality_url(location.latitude, location.longitude),
            )
            .await?;
        parse_air_quality(payload)
    }

    /// Recorded daily weather from `start` to `end`, inclusive
    pub async fn historical(
        &self,
        location: &Location,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalDay>, FetchError> {
        check_history_range(start, end, Utc::now().date_naive())?;
        let payload = self
            .gateway
            .fetch_json(
                CacheCategory::Forecast,
                &historical_url(location.latitude, location.longitude, start, end),
            )
            .await?;
        parse_historical(payload)
    }

    /// River discharge forecast for the next `days` days (1 to 210)
    pub async fn flood(&self, location: &Location, days: u8) -> Result<Vec<FloodDay>, FetchError> {
        check_days("flood forecast", days, MAX_FLOOD_DAYS)?;
        let payload = self
            .gateway
            .fetch_json(
                CacheCategory::Forecast,
                &flood_url(location.latitude, location.longitude, days),
            )
            .await?;
        parse_flood(payload)
    }

    /// Drops every cached response for `location`
    pub fn invalidate_location(&self, location: &Location) -> usize {
        self.gateway
            .invalidate(&location_prefixes(location.latitude, location.longitude))
    }

    /// Forces fresh current conditions for `location`
    pub async fn refresh(&self, location: &Location) -> Result<CurrentConditions, FetchError> {
        let removed = self.invalidate_location(location);
        info!(location = %location.display_name(), removed, "Refreshing location");
        self.current_conditions(location).await
    }
}

/// Parse a geocoding search response into locations, best match first
pub fn parse_locations(payload: Value) -> Result<Vec<Location>, FetchError> {
    let response: GeocodingResponse = serde_json::from_value(payload)?;

    Ok(response
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|result| Location {
            name: result.name,
            country: result.country.or(result.admin1).unwrap_or_default(),
            latitude: result.latitude,
            longitude: result.longitude,
        })
        .collect())
}

/// Parse a forecast response into current conditions
pub fn parse_current_conditions(payload: Value) -> Result<CurrentConditions, FetchError> {
    let response: ForecastResponse = serde_json::from_value(payload)?;
    let current = response.current;
    let daily = response.daily;

    // Extract UV index (first day's max)
    let uv_index = daily
        .uv_index_max
        .first()
        .copied()
        .ok_or_else(|| FetchError::MissingField("uv_index_max".to_string()))?;

    let sunrise_str = daily
        .sunrise
        .first()
        .ok_or_else(|| FetchError::MissingField("sunrise".to_string()))?;
    let sunrise = parse_time(sunrise_str)?;

    let sunset_str = daily
        .sunset
        .first()
        .ok_or_else(|| FetchError::MissingField("sunset".to_string()))?;
    let sunset = parse_time(sunset_str)?;

    Ok(CurrentConditions {
        temperature: current.temperature_2m,
        feels_like: current.apparent_temperature,
        condition: weather_code_to_condition(current.weather_code),
        weather_code: current.weather_code,
        humidity: current.relative_humidity_2m.clamp(0.0, 100.0) as u8,
        wind_speed: current.wind_speed_10m,
        wind_direction: current.wind_direction_10m,
        uv_index,
        sunrise,
        sunset,
        fetched_at: Utc::now(),
    })
}

/// Parse a daily forecast response, one entry per day
pub fn parse_daily_forecast(payload: Value) -> Result<Vec<ForecastDay>, FetchError> {
    let daily = serde_json::from_value::<DailyForecastResponse>(payload)?.daily;

    daily
        .time
        .iter()
        .enumerate()
        .map(|(i, &date)| {
            let missing = |field: &str| FetchError::MissingField(format!("{} for {}", field, date));
            let weather_code = daily
                .weather_code
                .get(i)
                .copied()
                .flatten()
                .ok_or_else(|| missing("weather_code"))?;

            Ok(ForecastDay {
                date,
                condition: weather_code_to_condition(weather_code),
                weather_code,
                temperature_max: value_at(&daily.temperature_2m_max, i)
                    .ok_or_else(|| missing("temperature_2m_max"))?,
                temperature_min: value_at(&daily.temperature_2m_min, i)
                    .ok_or_else(|| missing("temperature_2m_min"))?,
                precipitation_sum: value_at(&daily.precipitation_sum, i),
                precipitation_probability_max: value_at(&daily.precipitation_probability_max, i),
                wind_speed_max: value_at(&daily.wind_speed_10m_max, i),
            })
        })
        .collect()
}

/// Parse an archive response, one entry per day
pub fn parse_historical(payload: Value) -> Result<Vec<HistoricalDay>, FetchError> {
    let daily = serde_json::from_value::<HistoricalResponse>(payload)?.daily;

    Ok(daily
        .time
        .iter()
        .enumerate()
        .map(|(i, &date)| HistoricalDay {
            date,
            temperature_max: value_at(&daily.temperature_2m_max, i),
            temperature_min: value_at(&daily.temperature_2m_min, i),
            temperature_mean: value_at(&daily.temperature_2m_mean, i),
            precipitation_sum: value_at(&daily.precipitation_sum, i),
            wind_speed_max: value_at(&daily.wind_speed_10m_max, i),
        })
        .collect())
}

/// Parse a river discharge response, one entry per day
pub fn parse_flood(payload: Value) -> Result<Vec<FloodDay>, FetchError> {
    let daily = serde_json::from_value::<FloodResponse>(payload)?.daily;

    Ok(daily
        .time
        .iter()
        .enumerate()
        .map(|(i, &date)| FloodDay {
            date,
            river_discharge: value_at(&daily.river_discharge, i),
            river_discharge_mean: value_at(&daily.river_discharge_mean, i),
            river_discharge_max: value_at(&daily.river_discharge_max, i),
        })
        .collect())
}

/// Parse an air quality response
pub fn parse_air_quality(payload: Value) -> Result<AirQuality, FetchError> {
    let response: AirQualityResponse = serde_json::from_value(payload)?;
    Ok(response.current)
}

/// Value for day `i` of a daily series; nulls and short series read as `None`
fn value_at(series: &[Option<f64>], i: usize) -> Option<f64> {
    series.get(i).copied().flatten()
}

/// Parse a time string in ISO 8601 format (e.g., "2024-07-15T05:30") to NaiveTime
fn parse_time(time_str: &str) -> Result<NaiveTime, FetchError> {
    // Extract the time portion after 'T'
    let time_part = time_str
        .split('T')
        .nth(1)
        .ok_or_else(|| FetchError::InvalidTimeFormat(time_str.to_string()))?;

    NaiveTime::parse_from_str(time_part, "%H:%M")
        .map_err(|_| FetchError::InvalidTimeFormat(time_str.to_string()))
}

/// Map WMO weather code to WeatherCondition enum
///
/// Only codes Open-Meteo reports are recognized; anything else is `Unknown`.
pub fn weather_code_to_condition(code: u8) -> WeatherCondition {
    match code {
        0 => WeatherCondition::Clear,
        1 => WeatherCondition::MainlyClear,
        2 => WeatherCondition::PartlyCloudy,
        3 => WeatherCondition::Overcast,
        45 | 48 => WeatherCondition::Fog,
        51 | 53 | 55 => WeatherCondition::Drizzle,
        56 | 57 => WeatherCondition::FreezingDrizzle,
        61 | 63 | 65 => WeatherCondition::Rain,
        66 | 67 => WeatherCondition::FreezingRain,
        71 | 73 | 75 | 77 => WeatherCondition::Snow,
        80..=82 => WeatherCondition::RainShowers,
        85 | 86 => WeatherCondition::SnowShowers,
        95 | 96 | 99 => WeatherCondition::Thunderstorm,
        _ => WeatherCondition::Unknown,
    }
}

/// Full WMO description of a weather code, intensity included
pub fn weather_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Open-Meteo geocoding response
#[derive(Debug, Deserialize)]
struct GeocodingResponse {
    /// Absent entirely when nothing matched
    results: Option<Vec<GeocodingResult>>,
}

#[derive(Debug, Deserialize)]
struct GeocodingResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
}

/// Open-Meteo forecast response structure
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
    daily: DailyWeather,
}

/// Current weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    apparent_temperature: f64,
    weather_code: u8,
    wind_speed_10m: f64,
    wind_direction_10m: f64,
}

/// Daily weather data from Open-Meteo
#[derive(Debug, Deserialize)]
struct DailyWeather {
    sunrise: Vec<String>,
    sunset: Vec<String>,
    uv_index_max: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct DailyForecastResponse {
    daily: DailyForecastSeries,
}

/// Parallel per-day series; any value may be null
#[derive(Debug, Deserialize)]
struct DailyForecastSeries {
    time: Vec<NaiveDate>,
    #[serde(default)]
    weather_code: Vec<Option<u8>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    daily: HistoricalSeries,
}

#[derive(Debug, Deserialize)]
struct HistoricalSeries {
    time: Vec<NaiveDate>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_mean: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    wind_speed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct FloodResponse {
    daily: FloodSeries,
}

#[derive(Debug, Deserialize)]
struct FloodSeries {
    time: Vec<NaiveDate>,
    #[serde(default)]
    river_discharge: Vec<Option<f64>>,
    #[serde(default)]
    river_discharge_mean: Vec<Option<f64>>,
    #[serde(default)]
    river_discharge_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AirQualityResponse {
    current: AirQuality,
}
