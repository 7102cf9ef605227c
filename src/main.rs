//! WeatherPulse - current weather from Open-Meteo
//!
//! A command-line client that looks up current conditions, forecasts, air
//! quality, recorded weather and river discharge, answering repeated requests
//! from a response cache that persists between runs.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use weatherpulse::cache::{CacheStats, DurableStorage, FileStorage, MemoryStorage, ResponseCache};
use weatherpulse::cli::{Cli, StartupConfig, Target};
use weatherpulse::config::CacheConfig;
use weatherpulse::data::{
    weather_description, AirQuality, CurrentConditions, FetchGateway, FloodDay, ForecastDay,
    HistoricalDay, Location, WeatherClient,
};
use weatherpulse::refresh::{RefreshConfig, RefreshHandle, RefreshMessage};

/// Sets up logging to stderr, honouring `RUST_LOG` when present
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "weatherpulse=debug,warn"
    } else {
        "weatherpulse=warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Opens the storage the cache persists to
///
/// Falls back to in-memory storage when no cache directory can be determined.
fn open_storage(config: &CacheConfig) -> Arc<dyn DurableStorage> {
    let storage = match &config.cache_dir {
        Some(dir) => Some(FileStorage::with_dir(dir.clone())),
        None => FileStorage::new(),
    };

    match storage {
        Some(storage) => Arc::new(storage.with_quota(config.storage_quota_bytes)),
        None => {
            warn!("No cache directory available, cached responses will not persist");
            Arc::new(
                config
                    .storage_quota_bytes
                    .map_or_else(MemoryStorage::new, MemoryStorage::with_quota),
            )
        }
    }
}

fn print_conditions(location: &Location, conditions: &CurrentConditions) {
    println!("{}", location.display_name());
    println!(
        "  {}, {:.1}°C (feels like {:.1}°C)",
        weather_description(conditions.weather_code),
        conditions.temperature,
        conditions.feels_like
    );
    println!(
        "  Humidity {}%  Wind {:.1} km/h from {:.0}°  UV {:.1}",
        conditions.humidity, conditions.wind_speed, conditions.wind_direction, conditions.uv_index
    );
    println!(
        "  Sunrise {}  Sunset {}",
        conditions.sunrise.format("%H:%M"),
        conditions.sunset.format("%H:%M")
    );
}

fn print_air_quality(air: &AirQuality) {
    println!(
        "  Air quality: EU AQI {}  US AQI {}  PM2.5 {}  PM10 {}",
        reading(air.european_aqi, 0),
        reading(air.us_aqi, 0),
        reading(air.pm2_5, 0),
        reading(air.pm10, 0)
    );
}

/// Formats an optional reading, `n/a` when missing
fn reading(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", precision, v))
}

fn print_forecast(days: &[ForecastDay]) {
    println!("  Forecast:");
    for day in days {
        println!(
            "    {}  {:>5.1}°C / {:>5.1}°C  rain {} mm ({}%)  {}",
            day.date.format("%a %d %b"),
            day.temperature_max,
            day.temperature_min,
            reading(day.precipitation_sum, 1),
            reading(day.precipitation_probability_max, 0),
            weather_description(day.weather_code)
        );
    }
}

fn print_history(days: &[HistoricalDay]) {
    println!("  Recorded:");
    for day in days {
        println!(
            "    {}  max {}°C  min {}°C  mean {}°C  rain {} mm",
            day.date,
            reading(day.temperature_max, 1),
            reading(day.temperature_min, 1),
            reading(day.temperature_mean, 1),
            reading(day.precipitation_sum, 1)
        );
    }
}

fn print_flood(days: &[FloodDay]) {
    println!("  River discharge (m³/s):");
    for day in days {
        println!(
            "    {}  {}  (mean {}, max {})",
            day.date,
            reading(day.river_discharge, 1),
            reading(day.river_discharge_mean, 1),
            reading(day.river_discharge_max, 1)
        );
    }
}

fn print_stats(stats: &CacheStats) {
    println!(
        "Cache: {}/{} entries ({} fresh, {} stale)",
        stats.entries,
        stats.capacity,
        stats.fresh,
        stats.stale()
    );
    for (category, count) in &stats.by_category {
        println!("  {:<12} {}", category, count);
    }
}

/// Prints refreshed conditions until Ctrl-C
async fn watch(client: WeatherClient, location: Location, interval: Duration) {
    let config = RefreshConfig {
        interval,
        enabled: true,
    };
    let mut handle = RefreshHandle::spawn(config, client, location);
    println!("Refreshing every {} min, press Ctrl-C to stop", interval.as_secs() / 60);

    loop {
        tokio::select! {
            message = handle.receiver.recv() => match message {
                Some(RefreshMessage::ConditionsUpdated { location, conditions }) => {
                    println!();
                    print_conditions(&location, &conditions);
                }
                Some(RefreshMessage::RefreshError(e)) => eprintln!("Refresh failed: {}", e),
                Some(RefreshMessage::RefreshStarted) | Some(RefreshMessage::RefreshCompleted) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    handle.shutdown().await;
}

async fn run(startup: &StartupConfig, cache: &ResponseCache) -> Result<(), Box<dyn Error>> {
    if startup.clear_cache {
        let removed = cache.clear();
        println!("Cleared {} cached responses", removed);
    }

    if startup.cache_stats {
        print_stats(&cache.stats());
    }

    let gateway = FetchGateway::new(startup.cache.enabled.then(|| cache.clone()));
    let client = WeatherClient::new(gateway);

    if let Some(query) = &startup.suggest {
        let places = client.suggestions(query).await?;
        if places.is_empty() {
            println!("No matching places found");
        }
        for place in places {
            println!("{} ({:.2}, {:.2})", place.display_name(), place.latitude, place.longitude);
        }
    }

    let Some(target) = &startup.target else {
        return Ok(());
    };

    let location = match target {
        Target::City(city) => client.geocode(city).await?,
        Target::Coordinates { lat, lon } => client.reverse_geocode(*lat, *lon).await,
    };

    if startup.refresh {
        let removed = client.invalidate_location(&location);
        info!(removed, "Cleared cached data for location");
    }

    if startup.air_quality {
        let (conditions, air) = futures::future::try_join(
            client.current_conditions(&location),
            client.air_quality(&location),
        )
        .await?;
        print_conditions(&location, &conditions);
        print_air_quality(&air);
    } else {
        let conditions = client.current_conditions(&location).await?;
        print_conditions(&location, &conditions);
    }

    if let Some(days) = startup.forecast_days {
        print_forecast(&client.daily_forecast(&location, days).await?);
    }

    if let Some((from, to)) = startup.history {
        print_history(&client.historical(&location, from, to).await?);
    }

    if let Some(days) = startup.flood_days {
        print_flood(&client.flood(&location, days).await?);
    }

    if let Some(interval) = startup.watch {
        watch(client, location, interval).await;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let startup = match StartupConfig::from_cli(&cli) {
        Ok(startup) => startup,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let cache = ResponseCache::load(startup.cache.clone(), open_storage(&startup.cache));
    let result = run(&startup, &cache).await;

    // Persist whatever the debounce window has not written yet
    if let Err(e) = cache.flush() {
        warn!(error = %e, "Failed to persist response cache");
    }

    result
}
