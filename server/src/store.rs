use std::path::Path;

use anyhow::Result;
use rusqlite::Connection;
use shared::models::Reading;

use crate::config::StoreConfig;
use crate::db;
use crate::error::StoreError;
use crate::repos::readings;
use crate::retry::{with_retry, RetryConfig, RetryError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored { attempts: u32 },
    /// Every attempt hit a locked database; the reading was not written.
    Abandoned { attempts: u32 },
}

/// Destination of the readings produced by a collection cycle.
pub trait ReadingSink {
    /// Append one reading. Lock contention is retried and reported as
    /// `WriteOutcome::Abandoned` once exhausted; any other storage failure is
    /// returned as an error for this reading only.
    async fn append(&mut self, reading: &Reading) -> Result<WriteOutcome, StoreError>;
}

/// Handle on the durable readings table. The connection is closed when the
/// handle is dropped or `close`d.
pub struct ReadingStore {
    conn: Connection,
    retry: RetryConfig,
}

impl ReadingStore {
    pub fn open(path: &Path, config: &StoreConfig) -> Result<Self> {
        let conn = db::open(path, config.busy_timeout())?;
        Ok(ReadingStore {
            conn,
            retry: config.retry(),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory(retry: RetryConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        readings::init_table(&conn)?;
        Ok(ReadingStore { conn, retry })
    }

    pub fn count(&self) -> Result<i64> {
        Ok(readings::count(&self.conn)?)
    }

    pub fn reset(&self) -> Result<()> {
        db::reset(&self.conn)
    }

    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| anyhow::anyhow!("Failed to close database: {}", e))
    }
}

impl ReadingSink for ReadingStore {
    async fn append(&mut self, reading: &Reading) -> Result<WriteOutcome, StoreError> {
        let conn = &self.conn;
        append_with_retry(|| readings::insert(conn, reading).map(|_| ()), &self.retry).await
    }
}

/// Run `insert` until it succeeds, fails for a reason other than lock
/// contention, or runs out of attempts.
pub async fn append_with_retry<F>(mut insert: F, retry: &RetryConfig) -> Result<WriteOutcome, StoreError>
where
    F: FnMut() -> rusqlite::Result<()>,
{
    let mut attempts = 0;
    let result = with_retry(
        || {
            attempts += 1;
            insert().map_err(|e| {
                let err = StoreError::from(e);
                if err.is_contention() {
                    RetryError::Retryable(err)
                } else {
                    RetryError::NonRetryable(err)
                }
            })
        },
        retry,
    )
    .await;

    match result {
        Ok(()) => Ok(WriteOutcome::Stored { attempts }),
        Err(RetryError::Retryable(err)) => {
            log::debug!("Giving up after {} attempts: {}", attempts, err);
            Ok(WriteOutcome::Abandoned { attempts })
        }
        Err(RetryError::NonRetryable(err)) => Err(err),
    }
}
