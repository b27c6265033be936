//! The collection loop: fetch every coordinate, derive congestion, persist,
//! publish, sleep, repeat.
//!
//! Everything runs on one task and in coordinate order. A shutdown request is
//! only looked at between two fetches and between cycles, so a reading that
//! started persisting is always written (or abandoned) before the loop stops.

use std::time::Duration;

use chrono::{DateTime, Utc};
use shared::models::{Batch, Coordinate, Reading, Snapshot};
use tokio::sync::watch;
use tokio::time::sleep;

use crate::congestion::congestion;
use crate::history::Board;
use crate::store::{ReadingSink, WriteOutcome};
use crate::tomtom::{FlowSample, FlowSource};
use crate::weather::{WeatherClient, WeatherSample};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Fetching,
    Computing,
    Persisting,
    Published,
    Terminated,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CycleConfig {
    /// Number of cycles to run, 0 for no limit.
    pub iterations: u32,
    pub interval: Duration,
}

impl Default for CycleConfig {
    fn default() -> Self {
        CycleConfig {
            iterations: 20,
            interval: Duration::from_secs(10),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleWarning {
    /// The database stayed locked for every attempt; the reading was dropped.
    WriteAbandoned { location: String, attempts: u32 },
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CycleReport {
    pub cycle: u32,
    pub readings: usize,
    pub dropped_points: usize,
    pub fatal_writes: usize,
    pub warnings: Vec<CycleWarning>,
}

impl CycleReport {
    pub fn failed_writes(&self) -> usize {
        self.warnings.len() + self.fatal_writes
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum CycleOutcome {
    Published(CycleReport),
    /// No coordinate produced a reading.
    Empty,
    /// Shutdown was requested before anything was fetched.
    Interrupted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    IterationsDone,
    EmptyCycle,
    Shutdown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u32,
    pub readings: usize,
    pub failed_writes: usize,
    pub stop_reason: StopReason,
}

/// Receiving side of the stop signal.
#[derive(Clone, Debug)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn channel() -> (watch::Sender<bool>, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (tx, Shutdown(rx))
    }

    pub fn is_requested(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once a stop is requested. Never resolves if the sender is gone.
    pub async fn requested(&mut self) {
        loop {
            if *self.0.borrow_and_update() {
                return;
            }
            if self.0.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

struct Fetched {
    coordinate: Coordinate,
    sample: FlowSample,
    weather: Option<WeatherSample>,
    fetched_at: DateTime<Utc>,
}

impl Fetched {
    fn into_reading(self, congestion_level: u8) -> Reading {
        let (temperature, weather_description) = match self.weather {
            Some(w) => (Some(w.temperature), Some(w.description)),
            None => (None, None),
        };
        Reading {
            location: self.coordinate.label,
            congestion_level,
            avg_speed: self.sample.current_speed,
            free_flow_speed: self.sample.free_flow_speed,
            latitude: self.coordinate.latitude,
            longitude: self.coordinate.longitude,
            temperature,
            weather_description,
            timestamp: self.fetched_at,
        }
    }
}

pub struct Collector<F, S> {
    coordinates: Vec<Coordinate>,
    source: F,
    weather: Option<WeatherClient>,
    store: S,
    board: watch::Sender<Board>,
    shutdown: Shutdown,
    config: CycleConfig,
    state: CycleState,
}

impl<F: FlowSource, S: ReadingSink> Collector<F, S> {
    pub fn new(
        coordinates: Vec<Coordinate>,
        source: F,
        store: S,
        board: watch::Sender<Board>,
        shutdown: Shutdown,
        config: CycleConfig,
    ) -> Self {
        Collector {
            coordinates,
            source,
            weather: None,
            store,
            board,
            shutdown,
            config,
            state: CycleState::Idle,
        }
    }

    pub fn with_weather(mut self, weather: Option<WeatherClient>) -> Self {
        self.weather = weather;
        self
    }

    #[cfg(test)]
    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn transition(&mut self, state: CycleState) {
        log::debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Run cycles until the iteration cap, an empty cycle or a shutdown request.
    pub async fn run(&mut self) -> RunSummary {
        let mut cycles = 0;
        let mut readings = 0;
        let mut failed_writes = 0;

        let stop_reason = loop {
            if self.shutdown.is_requested() {
                break StopReason::Shutdown;
            }

            cycles += 1;
            match self.run_cycle(cycles).await {
                CycleOutcome::Published(report) => {
                    readings += report.readings;
                    failed_writes += report.failed_writes();
                }
                CycleOutcome::Empty => break StopReason::EmptyCycle,
                CycleOutcome::Interrupted => break StopReason::Shutdown,
            }

            if self.shutdown.is_requested() {
                break StopReason::Shutdown;
            }
            if self.config.iterations != 0 && cycles >= self.config.iterations {
                break StopReason::IterationsDone;
            }

            let interval = self.config.interval;
            let stopped = tokio::select! {
                _ = sleep(interval) => false,
                _ = self.shutdown.requested() => true,
            };
            if stopped {
                break StopReason::Shutdown;
            }
        };

        self.transition(CycleState::Terminated);
        log::info!(
            "Collection stopped ({:?}) after {} cycles: {} readings, {} failed writes",
            stop_reason,
            cycles,
            readings,
            failed_writes
        );

        RunSummary {
            cycles,
            readings,
            failed_writes,
            stop_reason,
        }
    }

    pub async fn run_cycle(&mut self, cycle: u32) -> CycleOutcome {
        self.transition(CycleState::Fetching);
        let started_at = Utc::now();
        let mut fetched = Vec::with_capacity(self.coordinates.len());
        let mut dropped_points = 0;
        let mut interrupted = false;

        for coordinate in &self.coordinates {
            if self.shutdown.is_requested() {
                interrupted = true;
                break;
            }
            match self.source.fetch(coordinate).await {
                Ok(sample) => {
                    let weather = match &self.weather {
                        Some(client) => client.current(coordinate.latitude, coordinate.longitude).await,
                        None => None,
                    };
                    fetched.push(Fetched {
                        coordinate: coordinate.clone(),
                        sample,
                        weather,
                        fetched_at: Utc::now(),
                    });
                }
                Err(e) => {
                    log::debug!("No flow data for {}: {}", coordinate.label, e);
                    dropped_points += 1;
                }
            }
        }

        self.transition(CycleState::Computing);
        let mut readings = Vec::with_capacity(fetched.len());
        for point in fetched {
            match congestion(point.sample.current_speed, point.sample.free_flow_speed) {
                Ok(level) => readings.push(point.into_reading(level)),
                Err(e) => {
                    log::debug!("No congestion for {}: {}", point.coordinate.label, e);
                    dropped_points += 1;
                }
            }
        }

        if readings.is_empty() {
            if interrupted {
                return CycleOutcome::Interrupted;
            }
            log::warn!(
                "No traffic data available in cycle {} ({} points failed)",
                cycle,
                dropped_points
            );
            return CycleOutcome::Empty;
        }

        self.transition(CycleState::Persisting);
        let mut warnings = Vec::new();
        let mut fatal_writes = 0;
        for reading in &readings {
            match self.store.append(reading).await {
                Ok(WriteOutcome::Stored { attempts }) => {
                    if attempts > 1 {
                        log::debug!("Stored {} after {} attempts", reading.location, attempts);
                    }
                }
                Ok(WriteOutcome::Abandoned { attempts }) => {
                    warnings.push(CycleWarning::WriteAbandoned {
                        location: reading.location.clone(),
                        attempts,
                    });
                }
                Err(e) => {
                    log::error!("Skipping reading for {}: {}", reading.location, e);
                    fatal_writes += 1;
                }
            }
        }
        if !warnings.is_empty() {
            log::warn!(
                "Failed to insert {} of {} readings after multiple retries",
                warnings.len(),
                readings.len()
            );
        }

        let report = CycleReport {
            cycle,
            readings: readings.len(),
            dropped_points,
            fatal_writes,
            warnings,
        };
        let batch = Batch {
            cycle,
            started_at,
            readings,
        };
        let snapshot = Snapshot::new(batch, dropped_points, report.failed_writes());
        self.board.send_modify(|board| {
            board.publish(snapshot);
            log::debug!("History holds {} batches", board.history.len());
        });
        self.transition(CycleState::Published);

        log::info!(
            "Cycle {}: {} readings, {} points dropped, {} writes failed",
            report.cycle,
            report.readings,
            report.dropped_points,
            report.failed_writes()
        );
        CycleOutcome::Published(report)
    }
}
