use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};

use crate::repos;

/// Open (creating if needed) the readings database and make sure the schema exists.
///
/// `busy_timeout` is how long SQLite itself waits on a lock before reporting
/// the database as busy.
pub fn open(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    conn.busy_timeout(busy_timeout)?;
    repos::readings::init_table(&conn)?;
    Ok(conn)
}

/// Read-only connection for queries running beside the collector.
pub fn open_read_only(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open database at {}", path.display()))?;
    conn.busy_timeout(Duration::from_secs(2))?;
    Ok(conn)
}

pub fn reset(conn: &Connection) -> Result<()> {
    repos::readings::drop_table(conn)?;
    repos::readings::init_table(conn)?;
    Ok(())
}
