use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::retry::RetryConfig;

const WEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Optional weather enrichment. Absent key disables it.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
}

fn default_weather_base_url() -> String {
    WEATHER_BASE_URL.to_string()
}

/// Write path tuning for the readings database.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct StoreConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_busy_timeout_ms() -> u64 {
    250
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl StoreConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            delay: Duration::from_millis(self.backoff_ms),
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub weather: WeatherConfig,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let weather = envy::prefixed("TRAFFIC_WEATHER_")
            .from_env::<WeatherConfig>()
            .context("Invalid weather config (TRAFFIC_WEATHER_API_KEY, TRAFFIC_WEATHER_BASE_URL)")?;
        let store = envy::prefixed("TRAFFIC_STORE_")
            .from_env::<StoreConfig>()
            .context("Invalid store config (TRAFFIC_STORE_MAX_ATTEMPTS, TRAFFIC_STORE_BACKOFF_MS, TRAFFIC_STORE_BUSY_TIMEOUT_MS)")?;
        Ok(Config { weather, store })
    }
}
