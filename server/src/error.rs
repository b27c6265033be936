use rusqlite::ErrorCode;
use thiserror::Error;

/// Why a coordinate produced no reading this cycle.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FetchFailure {
    #[error("flow API answered with status {0}")]
    Status(u16),
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed flow payload: {0}")]
    Malformed(String),
    #[error("unusable speeds (current={current}, free flow={free_flow})")]
    InvalidSpeed { current: f64, free_flow: f64 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite reported the database as busy or locked by another connection.
    #[error("database is locked: {0}")]
    Contention(#[source] rusqlite::Error),
    #[error("storage error: {0}")]
    Fatal(#[source] rusqlite::Error),
}

impl StoreError {
    pub fn is_contention(&self) -> bool {
        matches!(self, StoreError::Contention(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                StoreError::Contention(err)
            }
            _ => StoreError::Fatal(err),
        }
    }
}
