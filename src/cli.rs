//! Command-line interface parsing for WeatherPulse
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a validated [`StartupConfig`].

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use thiserror::Error;

use crate::cache::KeyPolicy;
use crate::config::CacheConfig;
use crate::data::weather::{MAX_FLOOD_DAYS, MAX_FORECAST_DAYS};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// A coordinate is outside its valid range
    #[error("Invalid {name}: {value} (must be between -{limit} and {limit})")]
    InvalidCoordinate { name: &'static str, value: f64, limit: f64 },

    /// Only one of --lat / --lon was given
    #[error("--lat and --lon must be given together")]
    IncompleteCoordinates,

    /// Both a city and coordinates were given
    #[error("Give either a city or --lat/--lon, not both")]
    ConflictingTarget,

    /// A flag needs a location to act on
    #[error("{0} needs a city or --lat/--lon")]
    MissingTarget(&'static str),

    #[error("Invalid watch interval: {0} (must be between 1 and {max} minutes)", max = MAX_WATCH_MINUTES)]
    InvalidWatchInterval(u64),

    /// A day count outside what the API serves
    #[error("Invalid {flag}: {value} (must be between 1 and {max})")]
    InvalidDays { flag: &'static str, value: u8, max: u8 },

    /// Only one end of the history range was given
    #[error("--history-from and --history-to must be given together")]
    IncompleteHistory,

    #[error("Invalid history range: {from} is after {to}")]
    InvalidHistoryRange { from: NaiveDate, to: NaiveDate },

    #[error("Invalid cache size: {0} (must be at least 1)")]
    InvalidMaxEntries(usize),

    /// No action requested
    #[error("Nothing to do: give a city, --lat/--lon, --suggest, --cache-stats or --clear-cache")]
    NothingToDo,
}

/// WeatherPulse - current conditions from Open-Meteo with a persistent response cache
#[derive(Parser, Debug)]
#[command(name = "weatherpulse")]
#[command(about = "Current weather from Open-Meteo, cached between runs")]
#[command(version)]
pub struct Cli {
    /// City to look up
    ///
    /// Examples:
    ///   weatherpulse Oslo
    ///   weatherpulse "São Paulo" --air-quality
    ///   weatherpulse --lat 49.27 --lon -123.15 --watch 5
    #[arg(value_name = "CITY")]
    pub city: Option<String>,

    /// Latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Drop cached data for the location before fetching
    #[arg(long)]
    pub refresh: bool,

    /// Keep running and refresh every MINUTES
    #[arg(long, value_name = "MINUTES")]
    pub watch: Option<u64>,

    /// Also show current air quality
    #[arg(long)]
    pub air_quality: bool,

    /// Also show a daily forecast for the next DAYS days (1-16)
    #[arg(long, value_name = "DAYS")]
    pub days: Option<u8>,

    /// First day of recorded weather to show (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub history_from: Option<NaiveDate>,

    /// Last day of recorded weather to show (YYYY-MM-DD, at least 5 days ago)
    #[arg(long, value_name = "DATE")]
    pub history_to: Option<NaiveDate>,

    /// Also show the river discharge forecast for the next DAYS days (1-210)
    #[arg(long, value_name = "DAYS")]
    pub flood: Option<u8>,

    /// List places matching a partial name
    #[arg(long, value_name = "QUERY")]
    pub suggest: Option<String>,

    /// Show what the response cache holds
    #[arg(long)]
    pub cache_stats: bool,

    /// Empty the response cache
    #[arg(long)]
    pub clear_cache: bool,

    /// Bypass the response cache for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Key cached responses by endpoint path only, ignoring query parameters
    #[arg(long)]
    pub path_only_keys: bool,

    /// Maximum number of cached responses
    #[arg(long, value_name = "N", default_value_t = 100)]
    pub max_entries: usize,

    /// Directory for the persisted cache
    #[arg(long, value_name = "DIR", env = "WEATHERPULSE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Largest persisted cache, in bytes; older entries are dropped to fit
    #[arg(long, value_name = "BYTES", env = "WEATHERPULSE_STORAGE_QUOTA")]
    pub storage_quota: Option<usize>,

    /// Log cache hits, misses and persistence
    #[arg(short, long)]
    pub verbose: bool,
}

/// What to look up
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

/// Longest accepted --watch interval, one week
pub const MAX_WATCH_MINUTES: u64 = 7 * 24 * 60;

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub target: Option<Target>,
    pub refresh: bool,
    pub watch: Option<Duration>,
    pub air_quality: bool,
    pub forecast_days: Option<u8>,
    /// Inclusive date range of recorded weather
    pub history: Option<(NaiveDate, NaiveDate)>,
    pub flood_days: Option<u8>,
    pub suggest: Option<String>,
    pub cache_stats: bool,
    pub clear_cache: bool,
    pub cache: CacheConfig,
}

fn check_days(flag: &'static str, value: Option<u8>, max: u8) -> Result<Option<u8>, CliError> {
    match value {
        Some(days) if days == 0 || days > max => Err(CliError::InvalidDays { flag, value: days, max }),
        days => Ok(days),
    }
}

fn check_coordinate(name: &'static str, value: f64, limit: f64) -> Result<f64, CliError> {
    if value.is_finite() && (-limit..=limit).contains(&value) {
        Ok(value)
    } else {
        Err(CliError::InvalidCoordinate { name, value, limit })
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the arguments are inconsistent or out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let coordinates = match (cli.lat, cli.lon) {
            (Some(lat), Some(lon)) => Some(Target::Coordinates {
                lat: check_coordinate("latitude", lat, 90.0)?,
                lon: check_coordinate("longitude", lon, 180.0)?,
            }),
            (None, None) => None,
            _ => return Err(CliError::IncompleteCoordinates),
        };

        let city = cli
            .city
            .as_deref()
            .map(str::trim)
            .filter(|city| !city.is_empty())
            .map(|city| Target::City(city.to_string()));

        let target = match (city, coordinates) {
            (Some(_), Some(_)) => return Err(CliError::ConflictingTarget),
            (city, coordinates) => city.or(coordinates),
        };

        if target.is_none() {
            if cli.refresh {
                return Err(CliError::MissingTarget("--refresh"));
            }
            if cli.watch.is_some() {
                return Err(CliError::MissingTarget("--watch"));
            }
            if cli.air_quality {
                return Err(CliError::MissingTarget("--air-quality"));
            }
            if cli.days.is_some() {
                return Err(CliError::MissingTarget("--days"));
            }
            if cli.history_from.is_some() || cli.history_to.is_some() {
                return Err(CliError::MissingTarget("--history-from/--history-to"));
            }
            if cli.flood.is_some() {
                return Err(CliError::MissingTarget("--flood"));
            }
            if cli.suggest.is_none() && !cli.cache_stats && !cli.clear_cache {
                return Err(CliError::NothingToDo);
            }
        }

        let watch = match cli.watch {
            Some(minutes) if minutes == 0 || minutes > MAX_WATCH_MINUTES => {
                return Err(CliError::InvalidWatchInterval(minutes))
            }
            Some(minutes) => Some(Duration::from_secs(
                minutes
                    .checked_mul(60)
                    .ok_or(CliError::InvalidWatchInterval(minutes))?,
            )),
            None => None,
        };

        let forecast_days = check_days("--days", cli.days, MAX_FORECAST_DAYS)?;
        let flood_days = check_days("--flood", cli.flood, MAX_FLOOD_DAYS)?;

        let history = match (cli.history_from, cli.history_to) {
            (Some(from), Some(to)) if from > to => return Err(CliError::InvalidHistoryRange { from, to }),
            (Some(from), Some(to)) => Some((from, to)),
            (None, None) => None,
            _ => return Err(CliError::IncompleteHistory),
        };

        if cli.max_entries == 0 {
            return Err(CliError::InvalidMaxEntries(0));
        }

        let cache = CacheConfig {
            enabled: !cli.no_cache,
            max_entries: cli.max_entries,
            key_policy: if cli.path_only_keys {
                KeyPolicy::PathOnly
            } else {
                KeyPolicy::FullUrl
            },
            cache_dir: cli.cache_dir.clone(),
            storage_quota_bytes: cli.storage_quota,
            ..CacheConfig::default()
        };

        Ok(StartupConfig {
            target,
            refresh: cli.refresh,
            watch,
            air_quality: cli.air_quality,
            forecast_days,
            history,
            flood_days,
            suggest: cli.suggest.clone(),
            cache_stats: cli.cache_stats,
            clear_cache: cli.clear_cache,
            cache,
        })
    }
}
