//! Store client: one pooled connection per operation.
//!
//! Each call acquires a connection, runs one statement, and releases the connection before
//! returning, on success, failure or interruption alike.

use std::sync::Arc;

use relay_core::RelayContext;
use tracing::info;

use crate::error::StoreError;
use crate::models::{Query, ResultSet, Row};
use crate::pool::{ConnectionPool, PoolStatus, PooledConnection};
use crate::settings::StoreSettings;
use crate::sql_connector::SqlConnector;

#[derive(Clone)]
pub struct StoreClient {
    pool: ConnectionPool,
}

impl StoreClient {
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Opens a pool over [`SqlConnector`] for the configured URL.
    pub async fn connect(settings: &StoreSettings, ctx: &RelayContext) -> Result<Self, StoreError> {
        let connector = Arc::new(SqlConnector::new(settings.connection_url()));
        let pool = ConnectionPool::open(connector, settings.pool_options(), ctx).await?;
        info!(parent: ctx.span(), endpoint = %pool.endpoint(), "Store client ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Checks out a connection for a multi-statement unit of work. Release or drop it when done.
    pub async fn connection(&self, ctx: &RelayContext) -> Result<PooledConnection, StoreError> {
        self.pool.acquire(ctx).await
    }

    /// All rows of `query`; `QueryFailed` on error, never a partial result.
    pub async fn query(&self, ctx: &RelayContext, query: &Query) -> Result<ResultSet, StoreError> {
        let mut conn = self.pool.acquire(ctx).await?;
        let result = conn.query(ctx, query).await;
        conn.release();
        result
    }

    /// First row of `query`, or `NoRows` when it matched nothing.
    pub async fn query_one(&self, ctx: &RelayContext, query: &Query) -> Result<Row, StoreError> {
        let mut conn = self.pool.acquire(ctx).await?;
        let result = conn.query_one(ctx, query).await;
        conn.release();
        result
    }

    /// Runs `query` for its effect; rows, if any, are discarded.
    pub async fn exec(&self, ctx: &RelayContext, query: &Query) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire(ctx).await?;
        let result = conn.exec(ctx, query).await;
        conn.release();
        result
    }

    /// Best-effort close of one session; failures are logged, not returned.
    pub async fn close(&self, ctx: &RelayContext, conn: PooledConnection) {
        conn.close(ctx).await;
    }

    /// Tears down the pool.
    pub async fn shutdown(&self, ctx: &RelayContext) {
        self.pool.close(ctx).await;
    }
}
