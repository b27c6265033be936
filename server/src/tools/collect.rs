use std::path::Path;
use std::time::Duration;

use tokio::sync::watch;

use crate::cli::CollectArgs;
use crate::collector::{CycleConfig, Collector, Shutdown, StopReason};
use crate::config::Config;
use crate::history::Board;
use crate::server;
use crate::store::ReadingStore;
use crate::tomtom::TomTomClient;
use crate::weather::WeatherClient;

pub async fn exec(database_path: &Path, config: &Config, args: CollectArgs) -> anyhow::Result<()> {
    let coordinates = args.coordinates.load()?;
    let timeout = Duration::from_secs(args.api.fetch_timeout_secs);
    let source = TomTomClient::new(&args.api.api_key, &args.api.api_base_url, timeout)?;
    let weather = WeatherClient::from_config(&config.weather, timeout)?;
    let store = ReadingStore::open(database_path, &config.store)?;

    log::info!(
        "Collecting {} coordinates into {} ({} readings already stored, weather enrichment {})",
        coordinates.len(),
        database_path.display(),
        store.count()?,
        if weather.is_some() { "on" } else { "off" }
    );

    let (board_tx, board_rx) = watch::channel(Board::new(args.history_window));
    if let Some(address) = args.serve {
        server::spawn(address, board_rx, database_path.to_path_buf())?;
    }

    let (shutdown_tx, shutdown) = Shutdown::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Interrupt received, stopping after the current step");
            let _ = shutdown_tx.send(true);
        }
    });

    let cycle_config = CycleConfig {
        iterations: args.iterations,
        interval: Duration::from_secs(args.interval_secs),
    };
    let mut collector = Collector::new(coordinates, source, store, board_tx, shutdown, cycle_config)
        .with_weather(weather);

    let summary = collector.run().await;
    collector.into_store().close()?;

    if summary.stop_reason == StopReason::EmptyCycle {
        println!("No traffic data available.");
    }
    println!(
        "Finished: {} cycles, {} readings stored, {} failed writes.",
        summary.cycles,
        summary.readings.saturating_sub(summary.failed_writes),
        summary.failed_writes
    );
    Ok(())
}
