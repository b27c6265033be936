use std::path::Path;

use crate::db;
use crate::repos::readings::{self, Bucket};

/// Mean congestion and speed per time bucket.
pub fn trend(database_path: &Path, bucket: Bucket) -> anyhow::Result<()> {
    let conn = db::open_read_only(database_path)?;
    let buckets = readings::trend(&conn, bucket)?;

    if buckets.is_empty() {
        println!("No readings stored yet.");
        return Ok(());
    }

    println!("{:<20} {:>10} {:>10} {:>8}", "bucket", "congestion", "speed", "samples");
    for b in buckets {
        println!(
            "{:<20} {:>9.1}% {:>10.2} {:>8}",
            b.bucket, b.mean_congestion, b.mean_speed, b.samples
        );
    }
    Ok(())
}

pub fn recent(database_path: &Path, limit: u32) -> anyhow::Result<()> {
    let conn = db::open_read_only(database_path)?;
    let rows = readings::list_recent(&conn, limit)?;

    if rows.is_empty() {
        println!("No readings stored yet.");
        return Ok(());
    }

    println!(
        "{:<28} {:<40} {:>10} {:>8} {:>8}",
        "timestamp", "location", "congestion", "speed", "free"
    );
    for r in rows {
        println!(
            "{:<28} {:<40} {:>9}% {:>8.1} {:>8.1}",
            r.timestamp.to_rfc3339(),
            r.location,
            r.congestion_level,
            r.avg_speed,
            r.free_flow_speed
        );
    }
    Ok(())
}

/// Dump every stored reading as one JSON object per line.
pub fn export(database_path: &Path) -> anyhow::Result<()> {
    let conn = db::open_read_only(database_path)?;
    for reading in readings::list_all(&conn)? {
        println!("{}", serde_json::to_string(&reading)?);
    }
    Ok(())
}
