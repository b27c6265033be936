use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sampled point. Identity is the label.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Coordinate {
    pub label: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(label: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            label: label.into(),
            latitude,
            longitude,
        }
    }

    /// Coordinate without a name, labelled by its own position.
    pub fn unlabeled(latitude: f64, longitude: f64) -> Self {
        Self::new(format!("({}, {})", latitude, longitude), latitude, longitude)
    }
}

/// One persisted observation of a coordinate.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Reading {
    pub location: String,
    pub congestion_level: u8,
    pub avg_speed: f64,
    pub free_flow_speed: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: Option<f64>,
    pub weather_description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn map_point(&self) -> MapPoint {
        MapPoint {
            location: self.location.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            congestion_level: self.congestion_level,
        }
    }

    pub fn trend_points(&self) -> [TrendPoint; 2] {
        [
            TrendPoint {
                timestamp: self.timestamp,
                metric: Metric::AvgSpeed,
                value: self.avg_speed,
            },
            TrendPoint {
                timestamp: self.timestamp,
                metric: Metric::CongestionLevel,
                value: self.congestion_level as f64,
            },
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    AvgSpeed,
    CongestionLevel,
}

/// Map layer entry, keyed by position.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MapPoint {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub congestion_level: u8,
}

/// Long-form time series row: one metric value at one instant.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub metric: Metric,
    pub value: f64,
}

/// Aggregate of stored readings over one time bucket.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TrendBucket {
    pub bucket: String,
    pub mean_congestion: f64,
    pub mean_speed: f64,
    pub samples: i64,
}

/// Readings produced by one collection cycle, in coordinate order.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Batch {
    pub cycle: u32,
    pub started_at: DateTime<Utc>,
    pub readings: Vec<Reading>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn map_points(&self) -> Vec<MapPoint> {
        self.readings.iter().map(Reading::map_point).collect()
    }

    /// Location with the highest congestion; the first one wins on ties.
    pub fn most_congested(&self) -> Option<&Reading> {
        self.readings.iter().fold(None, |best: Option<&Reading>, r| match best {
            Some(b) if b.congestion_level >= r.congestion_level => Some(b),
            _ => Some(r),
        })
    }

    pub fn mean_speed(&self) -> Option<f64> {
        if self.readings.is_empty() {
            return None;
        }
        let total: f64 = self.readings.iter().map(|r| r.avg_speed).sum();
        Some(total / self.readings.len() as f64)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct BatchSummary {
    pub most_congested: Option<String>,
    pub mean_speed: Option<f64>,
    pub readings: usize,
    pub dropped_points: usize,
    pub failed_writes: usize,
}

/// What gets published to the presentation layer after each cycle.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Snapshot {
    pub batch: Batch,
    pub summary: BatchSummary,
}

impl Snapshot {
    pub fn new(batch: Batch, dropped_points: usize, failed_writes: usize) -> Self {
        let summary = BatchSummary {
            most_congested: batch.most_congested().map(|r| r.location.clone()),
            mean_speed: batch.mean_speed(),
            readings: batch.readings.len(),
            dropped_points,
            failed_writes,
        };
        Self { batch, summary }
    }
}
