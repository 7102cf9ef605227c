//! Core data models for WeatherPulse
//!
//! This module contains the types decoded from Open-Meteo responses and the
//! clients that fetch them through the response cache.

pub mod gateway;
pub mod weather;

pub use gateway::{FetchError, FetchGateway};
pub use weather::{weather_code_to_condition, weather_description, WeatherClient};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A named place with coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Human-readable place name
    pub name: String,
    /// Country or first-level region, empty when unknown
    pub country: String,
    /// Latitude coordinate
    pub latitude: f64,
    /// Longitude coordinate
    pub longitude: f64,
}

impl Location {
    /// A location known only by its coordinates, named after them
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        Self {
            name: format!("{:.2}°, {:.2}°", latitude, longitude),
            country: String::new(),
            latitude,
            longitude,
        }
    }

    /// "Name, Country", or just the name when the country is unknown
    pub fn display_name(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }
}

/// Weather conditions at the time of the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Current temperature in Celsius
    pub temperature: f64,
    /// Feels-like temperature in Celsius
    pub feels_like: f64,
    /// Current weather condition
    pub condition: WeatherCondition,
    /// Raw WMO weather code
    pub weather_code: u8,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Wind direction in degrees
    pub wind_direction: f64,
    /// Today's maximum UV index
    pub uv_index: f64,
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
    /// When this data was decoded
    pub fetched_at: DateTime<Utc>,
}

/// Types of weather conditions, grouped from WMO weather codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherCondition {
    Clear,
    MainlyClear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    FreezingDrizzle,
    Rain,
    FreezingRain,
    Snow,
    RainShowers,
    SnowShowers,
    Thunderstorm,
    /// A code outside the WMO table
    Unknown,
}

impl WeatherCondition {
    pub fn label(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "Clear",
            WeatherCondition::MainlyClear => "Mainly clear",
            WeatherCondition::PartlyCloudy => "Partly cloudy",
            WeatherCondition::Overcast => "Overcast",
            WeatherCondition::Fog => "Fog",
            WeatherCondition::Drizzle => "Drizzle",
            WeatherCondition::FreezingDrizzle => "Freezing drizzle",
            WeatherCondition::Rain => "Rain",
            WeatherCondition::FreezingRain => "Freezing rain",
            WeatherCondition::Snow => "Snow",
            WeatherCondition::RainShowers => "Rain showers",
            WeatherCondition::SnowShowers => "Snow showers",
            WeatherCondition::Thunderstorm => "Thunderstorm",
            WeatherCondition::Unknown => "Unknown",
        }
    }
}

/// One day of a multi-day forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub condition: WeatherCondition,
    pub weather_code: u8,
    /// Daily maximum temperature in Celsius
    pub temperature_max: f64,
    /// Daily minimum temperature in Celsius
    pub temperature_min: f64,
    /// Total precipitation in mm
    pub precipitation_sum: Option<f64>,
    /// Highest hourly chance of precipitation, percent
    pub precipitation_probability_max: Option<f64>,
    /// Maximum wind speed in km/h
    pub wind_speed_max: Option<f64>,
}

/// One day of recorded weather from the archive
///
/// Archive values can be missing for recent days or remote areas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDay {
    pub date: NaiveDate,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub temperature_mean: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub wind_speed_max: Option<f64>,
}

/// River discharge forecast for one day, in m³/s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodDay {
    pub date: NaiveDate,
    pub river_discharge: Option<f64>,
    pub river_discharge_mean: Option<f64>,
    pub river_discharge_max: Option<f64>,
}

/// Current air quality readings; any value may be missing for a region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub european_aqi: Option<f64>,
    pub us_aqi: Option<f64>,
    /// Particulate matter under 10 µm, µg/m³
    pub pm10: Option<f64>,
    /// Particulate matter under 2.5 µm, µg/m³
    pub pm2_5: Option<f64>,
    pub ozone: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_coordinates() {
        let location = Location::from_coordinates(49.2743, -123.1544);
        assert_eq!(location.name, "49.27°, -123.15°");
        assert!(location.country.is_empty());
        assert_eq!(location.display_name(), "49.27°, -123.15°");
    }

    #[test]
    fn test_display_name_includes_country() {
        let location = Location {
            name: "Oslo".to_string(),
            country: "Norway".to_string(),
            latitude: 59.91,
            longitude: 10.75,
        };
        assert_eq!(location.display_name(), "Oslo, Norway");
    }

    #[test]
    fn test_conditions_serialization_roundtrip() {
        let conditions = CurrentConditions {
            temperature: 22.5,
            feels_like: 24.0,
            condition: WeatherCondition::PartlyCloudy,
            weather_code: 2,
            humidity: 65,
            wind_speed: 12.5,
            wind_direction: 270.0,
            uv_index: 6.0,
            sunrise: NaiveTime::from_hms_opt(5, 30, 0).unwrap(),
            sunset: NaiveTime::from_hms_opt(21, 15, 0).unwrap(),
            fetched_at: Utc::now(),
        };

        let json = serde_json::to_string(&conditions).expect("Failed to serialize");
        let back: CurrentConditions = serde_json::from_str(&json).expect("Failed to deserialize");

        assert!((back.temperature - 22.5).abs() < 0.01);
        assert_eq!(back.condition, WeatherCondition::PartlyCloudy);
        assert_eq!(back.sunset, conditions.sunset);
    }
}
