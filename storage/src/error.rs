//! Storage error types.
//!
//! Returned by the pool, pooled connections and [`crate::StoreClient`].

use relay_core::{BoxError, Interrupted, RelayError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Every connection is checked out and the exhaustion policy gave up waiting.
    #[error("Connection pool exhausted: all {size} connections are in use")]
    PoolExhausted { size: usize },

    #[error("Connection pool is closed")]
    PoolClosed,

    #[error("Connection setup failed: {0}")]
    ConnectionSetupFailed(#[source] BoxError),

    #[error("Query failed: {0}")]
    QueryFailed(#[source] BoxError),

    #[error("Exec failed: {0}")]
    ExecFailed(#[source] BoxError),

    /// The statement ran and matched nothing. Not a fault.
    #[error("Query returned no rows")]
    NoRows,

    #[error(transparent)]
    Interrupted(#[from] Interrupted),
}

impl StoreError {
    pub fn is_no_rows(&self) -> bool {
        matches!(self, StoreError::NoRows)
    }

    /// Exhaustion and setup failures are worth retrying with backoff. Statement failures are
    /// not: whether a statement is idempotent is the caller's call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::PoolExhausted { .. }
                | StoreError::ConnectionSetupFailed(_)
                | StoreError::Interrupted(Interrupted::DeadlineExceeded)
        )
    }
}

impl From<StoreError> for RelayError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Interrupted(i) => RelayError::Interrupted(i),
            other => RelayError::Store(Box::new(other)),
        }
    }
}
