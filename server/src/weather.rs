use std::time::Duration;

use serde::Deserialize;

use crate::config::WeatherConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct WeatherSample {
    pub temperature: f64,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainBlock,
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

/// OpenWeatherMap current conditions client.
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    /// `None` when no weather key is configured.
    pub fn from_config(config: &WeatherConfig, timeout: Duration) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(None);
        };
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Some(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }))
    }

    /// Enrichment is best effort: any failure yields `None`.
    pub async fn current(&self, latitude: f64, longitude: f64) -> Option<WeatherSample> {
        let url = format!(
            "{}/data/2.5/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url, latitude, longitude, self.api_key
        );

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                log::debug!("Weather API answered {} for ({}, {})", response.status(), latitude, longitude);
                return None;
            }
            Err(e) => {
                log::debug!("Weather request failed: {}", e.without_url());
                return None;
            }
        };

        let body = response.bytes().await.ok()?;
        parse_weather(&body)
    }
}

pub fn parse_weather(body: &[u8]) -> Option<WeatherSample> {
    let response: WeatherResponse = serde_json::from_slice(body).ok()?;
    let description = response.weather.into_iter().next()?.description;
    Some(WeatherSample {
        temperature: response.main.temp,
        description,
    })
}
