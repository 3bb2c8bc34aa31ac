use dotenvy::dotenv;
use forecast::ForecastSettings;
use history_model::{Interval, Period};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use yahoo_api::api::YAHOO_BASE_API_URL;

#[derive(Debug, Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    key: &'static str,
    value: String,
    reason: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub workers: usize,
    pub host: String,
    pub port: u16,
    pub refresh_secs: u64,
    pub default_period: Period,
    pub default_interval: Interval,
    pub yahoo_base_url: String,
    pub forecast: ForecastSettings,
}

impl Config {
    pub fn new() -> Result<Config, ConfigError> {
        dotenv().ok();
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let defaults = ForecastSettings::default();

        let mut workers: usize = parse_var(&lookup, "DASHBOARD_WORKERS", 1)?;
        if workers == 0 {
            workers = 1;
        }

        let mut host = lookup("DASHBOARD_HOST").unwrap_or_default();
        if host.trim().is_empty() {
            host = "0.0.0.0".to_string();
        }

        let mut yahoo_base_url = lookup("YAHOO_BASE_URL").unwrap_or_default();
        if yahoo_base_url.trim().is_empty() {
            yahoo_base_url = YAHOO_BASE_API_URL.to_string();
        }

        let config = Config {
            workers,
            host,
            port: parse_var(&lookup, "DASHBOARD_PORT", 8080)?,
            refresh_secs: parse_var(&lookup, "DASHBOARD_REFRESH_SECS", 60)?,
            default_period: parse_var(&lookup, "DASHBOARD_DEFAULT_PERIOD", Period::OneYear)?,
            default_interval: parse_var(&lookup, "DASHBOARD_DEFAULT_INTERVAL", Interval::OneDay)?,
            yahoo_base_url,
            forecast: ForecastSettings {
                lags: parse_var(&lookup, "FORECAST_LAGS", defaults.lags)?,
                train_ratio: parse_var(&lookup, "FORECAST_TRAIN_RATIO", defaults.train_ratio)?,
                horizon: parse_var(&lookup, "FORECAST_HORIZON", defaults.horizon)?,
            },
        };
        Ok(config)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError {
                key,
                value: value.clone(),
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}
