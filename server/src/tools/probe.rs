use std::time::Duration;

use chrono::Utc;
use shared::models::{Coordinate, Reading};

use crate::cli::ProbeArgs;
use crate::config::Config;
use crate::congestion::congestion;
use crate::tomtom::{FlowSource, TomTomClient};
use crate::weather::WeatherClient;

/// Fetch one point and print the reading it would produce. Nothing is stored.
pub async fn exec(config: &Config, args: ProbeArgs) -> anyhow::Result<()> {
    let coordinate = match args.label {
        Some(label) => Coordinate::new(label, args.latitude, args.longitude),
        None => Coordinate::unlabeled(args.latitude, args.longitude),
    };
    let timeout = Duration::from_secs(args.api.fetch_timeout_secs);
    let source = TomTomClient::new(&args.api.api_key, &args.api.api_base_url, timeout)?;

    let sample = source
        .fetch(&coordinate)
        .await
        .map_err(|e| anyhow::anyhow!("No flow data for {}: {}", coordinate.label, e))?;
    let congestion_level = congestion(sample.current_speed, sample.free_flow_speed)?;

    let weather = match WeatherClient::from_config(&config.weather, timeout)? {
        Some(client) => client.current(coordinate.latitude, coordinate.longitude).await,
        None => None,
    };

    let reading = Reading {
        location: coordinate.label,
        congestion_level,
        avg_speed: sample.current_speed,
        free_flow_speed: sample.free_flow_speed,
        latitude: coordinate.latitude,
        longitude: coordinate.longitude,
        temperature: weather.as_ref().map(|w| w.temperature),
        weather_description: weather.map(|w| w.description),
        timestamp: Utc::now(),
    };

    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}
