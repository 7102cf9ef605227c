//! WeatherPulse Library
//!
//! Open-Meteo weather client built around a persistent, expiring response cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod refresh;
