// src/config.rs
use log::{info, warn};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::DashboardError;

pub const DEFAULT_DATA_URL: &str =
    "https://raw.githubusercontent.com/datasets/covid-19/main/data/time-series-19-covid-combined.csv";
pub const DEFAULT_TITLE: &str = "COVID-19 Dashboard";
pub const DEFAULT_COUNTRIES: &[&str] = &["Czechia", "Slovakia", "Austria", "Germany", "Poland"];

/// Runtime settings, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_url: String,
    /// When set, data is read from this local CSV instead of `data_url`.
    pub data_file: Option<PathBuf>,
    pub title: String,
    pub fetch_timeout: Duration,
    pub fetch_retries: u32,
    pub retry_backoff: Duration,
    pub max_data_age_days: i64,
    pub default_countries: Vec<String>,
    /// Cron expression (with seconds) for the freshness check job.
    pub refresh_schedule: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3030,
            data_url: DEFAULT_DATA_URL.to_string(),
            data_file: None,
            title: DEFAULT_TITLE.to_string(),
            fetch_timeout: Duration::from_secs(30),
            fetch_retries: 3,
            retry_backoff: Duration::from_millis(500),
            max_data_age_days: 1,
            default_countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            refresh_schedule: "0 0 * * * *".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, DashboardError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DashboardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let port = match lookup("PORT") {
            Some(v) => parse_value("PORT", &v)?,
            None => {
                warn!("$PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let data_url = lookup("COVID_DATA_URL").unwrap_or(defaults.data_url);
        let data_file = lookup("COVID_DATA_FILE")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let title = lookup("DASHBOARD_TITLE").unwrap_or(defaults.title);

        let fetch_timeout = match lookup("FETCH_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_value("FETCH_TIMEOUT_SECS", &v)?),
            None => defaults.fetch_timeout,
        };
        let fetch_retries = match lookup("FETCH_RETRIES") {
            Some(v) => parse_value("FETCH_RETRIES", &v)?,
            None => defaults.fetch_retries,
        };
        let retry_backoff = match lookup("RETRY_BACKOFF_MS") {
            Some(v) => Duration::from_millis(parse_value("RETRY_BACKOFF_MS", &v)?),
            None => defaults.retry_backoff,
        };
        let max_data_age_days = match lookup("MAX_DATA_AGE_DAYS") {
            Some(v) => parse_value::<i64>("MAX_DATA_AGE_DAYS", &v)?,
            None => defaults.max_data_age_days,
        };
        if max_data_age_days < 0 {
            return Err(DashboardError::InvalidConfig(
                "MAX_DATA_AGE_DAYS must not be negative".to_string(),
            ));
        }

        let default_countries = match lookup("DEFAULT_COUNTRIES") {
            Some(v) => v
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            None => defaults.default_countries,
        };
        let refresh_schedule = lookup("REFRESH_SCHEDULE").unwrap_or(defaults.refresh_schedule);

        let config = Config {
            port,
            data_url,
            data_file,
            title,
            fetch_timeout,
            fetch_retries,
            retry_backoff,
            max_data_age_days,
            default_countries,
            refresh_schedule,
        };
        info!("Loaded configuration: {:?}", config);
        Ok(config)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, DashboardError> {
    raw.trim()
        .parse()
        .map_err(|_| DashboardError::InvalidConfig(format!("{} must be a number, got '{}'", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 3030);
        assert_eq!(config.data_url, DEFAULT_DATA_URL);
        assert_eq!(config.max_data_age_days, 1);
        assert!(config.data_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("FETCH_RETRIES", "5"),
            ("RETRY_BACKOFF_MS", "20"),
            ("DEFAULT_COUNTRIES", "Italy, Spain,,"),
            ("COVID_DATA_FILE", "data.csv"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.fetch_retries, 5);
        assert_eq!(config.retry_backoff, Duration::from_millis(20));
        assert_eq!(config.default_countries, vec!["Italy", "Spain"]);
        assert_eq!(config.data_file, Some(PathBuf::from("data.csv")));
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = Config::from_lookup(lookup(&[("PORT", "http")])).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));

        let err = Config::from_lookup(lookup(&[("PORT", "1"), ("MAX_DATA_AGE_DAYS", "-2")])).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidConfig(_)));
    }
}
