use std::str::FromStr;

use rusqlite::{params, Connection, Row};
use shared::models::{Reading, TrendBucket};

use super::{format_timestamp, parse_timestamp};

/// Time key used to group readings in trend queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
    Minute,
    Hour,
    Day,
}

impl Bucket {
    /// Length of the timestamp prefix identifying the bucket,
    /// e.g. `2024-01-15T08:42` for minutes.
    fn prefix_len(self) -> i64 {
        match self {
            Bucket::Minute => 16,
            Bucket::Hour => 13,
            Bucket::Day => 10,
        }
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Bucket, String> {
        match s {
            "minute" => Ok(Bucket::Minute),
            "hour" => Ok(Bucket::Hour),
            "day" => Ok(Bucket::Day),
            other => Err(format!(
                "unknown bucket '{}', expected minute, hour or day",
                other
            )),
        }
    }
}

pub fn init_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS traffic (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location TEXT NOT NULL,
            congestion_level INTEGER NOT NULL,
            avg_speed REAL NOT NULL,
            free_flow_speed REAL NOT NULL,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            temperature REAL,
            weather_description TEXT,
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_traffic_timestamp ON traffic(timestamp);
        ",
    )
}

pub fn drop_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("DROP TABLE IF EXISTS traffic")
}

/// Append one reading. Never updates an existing row.
pub fn insert(conn: &Connection, reading: &Reading) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO traffic (location, congestion_level, avg_speed, free_flow_speed, lat, lon, temperature, weather_description, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            reading.location,
            reading.congestion_level,
            reading.avg_speed,
            reading.free_flow_speed,
            reading.latitude,
            reading.longitude,
            reading.temperature,
            reading.weather_description,
            format_timestamp(&reading.timestamp),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const SELECT_READINGS: &str = "SELECT location, congestion_level, avg_speed, free_flow_speed, lat, lon, temperature, weather_description, timestamp
     FROM traffic";

fn from_row(row: &Row) -> rusqlite::Result<Reading> {
    let timestamp: String = row.get(8)?;
    Ok(Reading {
        location: row.get(0)?,
        congestion_level: row.get(1)?,
        avg_speed: row.get(2)?,
        free_flow_speed: row.get(3)?,
        latitude: row.get(4)?,
        longitude: row.get(5)?,
        temperature: row.get(6)?,
        weather_description: row.get(7)?,
        timestamp: parse_timestamp(8, &timestamp)?,
    })
}

/// Every stored reading in insertion order.
pub fn list_all(conn: &Connection) -> rusqlite::Result<Vec<Reading>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_READINGS))?;
    let readings = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(readings)
}

/// The `limit` most recent readings, oldest first.
pub fn list_recent(conn: &Connection, limit: u32) -> rusqlite::Result<Vec<Reading>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY id DESC LIMIT ?1", SELECT_READINGS))?;
    let mut readings = stmt
        .query_map(params![limit], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    readings.reverse();
    Ok(readings)
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM traffic", [], |row| row.get(0))
}

/// Mean congestion and speed per time bucket, oldest bucket first.
pub fn trend(conn: &Connection, bucket: Bucket) -> rusqlite::Result<Vec<TrendBucket>> {
    let mut stmt = conn.prepare(
        "SELECT substr(timestamp, 1, ?1) AS bucket, AVG(congestion_level), AVG(avg_speed), COUNT(*)
         FROM traffic
         GROUP BY bucket
         ORDER BY bucket",
    )?;

    let buckets = stmt
        .query_map(params![bucket.prefix_len()], |row| {
            Ok(TrendBucket {
                bucket: row.get(0)?,
                mean_congestion: row.get(1)?,
                mean_speed: row.get(2)?,
                samples: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(buckets)
}
