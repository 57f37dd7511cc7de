//! Backend seam: a [`Connector`] opens [`Session`]s against the store.
//!
//! The pool only ever talks to these traits, so swapping the store backend means
//! providing another `Connector`. [`crate::SqlConnector`] is the sqlx-backed one.

use async_trait::async_trait;
use relay_core::BoxError;

use crate::models::{Query, Row};

/// One open session. Used by a single caller at a time; the pool guarantees that.
#[async_trait]
pub trait Session: Send {
    /// Runs `query` and collects every row. No rows are returned on error.
    async fn fetch_all(&mut self, query: &Query) -> Result<Vec<Row>, BoxError>;

    /// Runs `query`, discards any rows, returns the affected-row count when the backend reports one.
    async fn execute(&mut self, query: &Query) -> Result<u64, BoxError>;

    /// Gracefully ends the session.
    async fn close(self: Box<Self>) -> Result<(), BoxError>;

    /// True once the session has seen a transport-level failure and must not be reused.
    fn is_broken(&self) -> bool {
        false
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Session>, BoxError>;

    /// Where sessions go, with credentials masked. For logs.
    fn endpoint(&self) -> String;
}
