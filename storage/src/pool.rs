//! Bounded pool of store sessions.
//!
//! At most `max_size` sessions are checked out at once; a semaphore permit travels with
//! every [`PooledConnection`]. When all permits are taken, [`ExhaustionPolicy`] decides
//! whether `acquire` waits (up to `acquire_timeout`) or fails immediately. Either way the
//! outcome on giving up is [`StoreError::PoolExhausted`]; the pool never opens an extra session.
//!
//! A connection goes back to the pool when it is released or dropped. Sessions that were
//! interrupted mid-statement or reported a transport failure are discarded instead.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use relay_core::RelayContext;
use serde::{Deserialize, Serialize};
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, debug_span, info, warn, Instrument};

use crate::connection::{Connector, Session};
use crate::error::StoreError;
use crate::models::{Query, Row};

/// What `acquire` does when every connection is checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Wait for a release, up to `acquire_timeout`, then fail with `PoolExhausted`.
    Wait,
    /// Fail with `PoolExhausted` straight away.
    Fail,
}

impl FromStr for ExhaustionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wait" | "block" => Ok(ExhaustionPolicy::Wait),
            "fail" | "fail_fast" => Ok(ExhaustionPolicy::Fail),
            other => Err(format!("unknown exhaustion policy '{}', expected wait or fail", other)),
        }
    }
}

impl fmt::Display for ExhaustionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionPolicy::Wait => f.write_str("wait"),
            ExhaustionPolicy::Fail => f.write_str("fail"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Upper bound on sessions checked out at once. Values below 1 are treated as 1.
    pub max_size: usize,
    /// Sessions opened by [`ConnectionPool::open`] before it returns.
    pub min_connections: usize,
    pub on_exhausted: ExhaustionPolicy,
    /// How long `Wait` waits for a free connection.
    pub acquire_timeout: Duration,
    /// Bound on opening one session.
    pub connect_timeout: Duration,
    /// Bound on one statement, on top of the caller's deadline.
    pub statement_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_connections: 1,
            on_exhausted: ExhaustionPolicy::Wait,
            acquire_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(10),
            statement_timeout: Duration::from_secs(30),
        }
    }
}

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub size: usize,
    pub in_use: usize,
    pub idle: usize,
    pub closed: bool,
}

struct Shared {
    connector: Arc<dyn Connector>,
    options: PoolOptions,
    permits: Arc<Semaphore>,
    idle: Mutex<Vec<Box<dyn Session>>>,
    in_use: AtomicUsize,
    closed: AtomicBool,
}

impl Shared {
    fn idle(&self) -> MutexGuard<'_, Vec<Box<dyn Session>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn open_session(&self, ctx: &RelayContext) -> Result<Box<dyn Session>, StoreError> {
        let limit = self.options.connect_timeout;
        let attempt = tokio::time::timeout(limit, self.connector.connect());
        match ctx.run(attempt).await? {
            Ok(Ok(session)) => {
                debug!(parent: ctx.span(), endpoint = %self.connector.endpoint(), "Opened store session");
                Ok(session)
            }
            Ok(Err(e)) => {
                warn!(parent: ctx.span(), endpoint = %self.connector.endpoint(), error = %e, "Store session setup failed");
                Err(StoreError::ConnectionSetupFailed(e))
            }
            Err(_) => {
                warn!(parent: ctx.span(), endpoint = %self.connector.endpoint(), timeout = ?limit, "Store session setup timed out");
                Err(StoreError::ConnectionSetupFailed(
                    format!("no session within {:?}", limit).into(),
                ))
            }
        }
    }
}

/// Shared handle to the pool; clones refer to the same pool.
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<Shared>,
}

impl ConnectionPool {
    /// Creates a pool that opens sessions lazily, on first demand.
    pub fn new(connector: Arc<dyn Connector>, mut options: PoolOptions) -> Self {
        options.max_size = options.max_size.max(1);
        let permits = Arc::new(Semaphore::new(options.max_size));
        Self {
            shared: Arc::new(Shared {
                connector,
                options,
                permits,
                idle: Mutex::new(Vec::new()),
                in_use: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Creates a pool and opens `min_connections` sessions up front, so an unreachable
    /// store is reported here as `ConnectionSetupFailed`.
    pub async fn open(
        connector: Arc<dyn Connector>,
        options: PoolOptions,
        ctx: &RelayContext,
    ) -> Result<Self, StoreError> {
        let pool = Self::new(connector, options);
        let shared = &pool.shared;
        let warm = shared.options.min_connections.min(shared.options.max_size);
        info!(
            parent: ctx.span(),
            endpoint = %shared.connector.endpoint(),
            pool_size = shared.options.max_size,
            warm,
            policy = %shared.options.on_exhausted,
            "Opening connection pool"
        );

        let mut opened = Vec::with_capacity(warm);
        for _ in 0..warm {
            match shared.open_session(ctx).await {
                Ok(session) => opened.push(session),
                Err(e) => {
                    for session in opened {
                        if let Err(close_err) = session.close().await {
                            warn!(parent: ctx.span(), error = %close_err, "Connection closing failed");
                        }
                    }
                    return Err(e);
                }
            }
        }
        shared.idle().extend(opened);
        Ok(pool)
    }

    /// Checks out one connection. See the module docs for exhaustion behaviour.
    pub async fn acquire(&self, ctx: &RelayContext) -> Result<PooledConnection, StoreError> {
        let shared = &self.shared;
        if shared.closed.load(Ordering::SeqCst) {
            return Err(StoreError::PoolClosed);
        }
        ctx.check()?;
        let size = shared.options.max_size;

        let permit = match shared.options.on_exhausted {
            ExhaustionPolicy::Fail => match shared.permits.clone().try_acquire_owned() {
                Ok(permit) => permit,
                Err(TryAcquireError::NoPermits) => {
                    warn!(parent: ctx.span(), pool_size = size, "Connection pool exhausted");
                    return Err(StoreError::PoolExhausted { size });
                }
                Err(TryAcquireError::Closed) => return Err(StoreError::PoolClosed),
            },
            ExhaustionPolicy::Wait => {
                let wait = shared.options.acquire_timeout;
                let acquire = tokio::time::timeout(wait, shared.permits.clone().acquire_owned());
                match ctx.run(acquire).await? {
                    Ok(Ok(permit)) => permit,
                    Ok(Err(_)) => return Err(StoreError::PoolClosed),
                    Err(_) => {
                        warn!(parent: ctx.span(), pool_size = size, waited = ?wait, "Connection pool exhausted");
                        return Err(StoreError::PoolExhausted { size });
                    }
                }
            }
        };

        let reused = shared.idle().pop();
        let (session, reused) = match reused {
            Some(session) => (session, true),
            None => (shared.open_session(ctx).await?, false),
        };
        let in_use = shared.in_use.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(parent: ctx.span(), in_use, pool_size = size, reused, "Connection acquired");

        Ok(PooledConnection {
            session: Some(session),
            permit: Some(permit),
            shared: self.shared.clone(),
            broken: false,
        })
    }

    /// Returns a connection. Same as dropping it.
    pub fn release(&self, conn: PooledConnection) {
        conn.release();
    }

    /// Tears the pool down: later acquires fail with `PoolClosed`, idle sessions are closed,
    /// and connections still checked out are discarded when they come back.
    /// Close failures are logged, not returned.
    pub async fn close(&self, ctx: &RelayContext) {
        let shared = &self.shared;
        if shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        shared.permits.close();
        let idle = std::mem::take(&mut *shared.idle());
        info!(
            parent: ctx.span(),
            closing = idle.len(),
            in_use = shared.in_use.load(Ordering::SeqCst),
            "Closing connection pool"
        );
        for session in idle {
            match ctx.run_with_timeout(shared.options.connect_timeout, session.close()).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(parent: ctx.span(), error = %e, "Connection closing failed"),
                Err(i) => warn!(parent: ctx.span(), error = %i, "Connection closing abandoned"),
            }
        }
    }

    pub fn status(&self) -> PoolStatus {
        let shared = &self.shared;
        PoolStatus {
            size: shared.options.max_size,
            in_use: shared.in_use.load(Ordering::SeqCst),
            idle: shared.idle().len(),
            closed: shared.closed.load(Ordering::SeqCst),
        }
    }

    pub fn options(&self) -> &PoolOptions {
        &self.shared.options
    }

    pub fn endpoint(&self) -> String {
        self.shared.connector.endpoint()
    }
}

/// A checked-out session. Exclusively owned; goes back to the pool on
/// [`release`](Self::release) or drop, exactly once.
pub struct PooledConnection {
    session: Option<Box<dyn Session>>,
    permit: Option<OwnedSemaphorePermit>,
    shared: Arc<Shared>,
    broken: bool,
}

impl PooledConnection {
    /// Runs `query` and returns every row, or nothing on error.
    pub async fn query(&mut self, ctx: &RelayContext, query: &Query) -> Result<Vec<Row>, StoreError> {
        let limit = self.shared.options.statement_timeout;
        let span = debug_span!(parent: ctx.span(), "store.query", statement = %query.statement());
        debug!(parent: &span, params = ?query.params(), "Querying");

        let session = self.session.as_mut().ok_or(StoreError::PoolClosed)?;
        // Stays set if the caller drops this future mid-statement.
        let was_broken = std::mem::replace(&mut self.broken, true);
        let outcome = ctx
            .run_with_timeout(limit, session.fetch_all(query))
            .instrument(span.clone())
            .await;
        match outcome {
            Ok(Ok(rows)) => {
                self.broken = was_broken || session.is_broken();
                debug!(parent: &span, rows = rows.len(), "Query done");
                Ok(rows)
            }
            Ok(Err(e)) => {
                self.broken = was_broken || session.is_broken();
                Err(StoreError::QueryFailed(e))
            }
            Err(i) => {
                warn!(parent: &span, error = %i, "Query interrupted");
                Err(i.into())
            }
        }
    }

    /// First row of `query`; [`StoreError::NoRows`] when there is none.
    pub async fn query_one(&mut self, ctx: &RelayContext, query: &Query) -> Result<Row, StoreError> {
        self.query(ctx, query)
            .await?
            .into_iter()
            .next()
            .ok_or(StoreError::NoRows)
    }

    /// Runs `query` for its effect and returns the affected-row count.
    pub async fn exec(&mut self, ctx: &RelayContext, query: &Query) -> Result<u64, StoreError> {
        let limit = self.shared.options.statement_timeout;
        let span = debug_span!(parent: ctx.span(), "store.exec", statement = %query.statement());
        debug!(parent: &span, params = ?query.params(), "Executing");

        let session = self.session.as_mut().ok_or(StoreError::PoolClosed)?;
        // Stays set if the caller drops this future mid-statement.
        let was_broken = std::mem::replace(&mut self.broken, true);
        let outcome = ctx
            .run_with_timeout(limit, session.execute(query))
            .instrument(span.clone())
            .await;
        match outcome {
            Ok(Ok(affected)) => {
                self.broken = was_broken || session.is_broken();
                Ok(affected)
            }
            Ok(Err(e)) => {
                self.broken = was_broken || session.is_broken();
                Err(StoreError::ExecFailed(e))
            }
            Err(i) => {
                warn!(parent: &span, error = %i, "Exec interrupted");
                Err(i.into())
            }
        }
    }

    /// True when the session will be discarded rather than reused.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Hands the session back to the pool.
    pub fn release(mut self) {
        self.give_back();
    }

    /// Closes the session instead of returning it. The slot is freed either way;
    /// a close failure is logged and swallowed.
    pub async fn close(mut self, ctx: &RelayContext) {
        if let Some(session) = self.session.take() {
            let limit = self.shared.options.connect_timeout;
            match ctx.run_with_timeout(limit, session.close()).await {
                Ok(Ok(())) => debug!(parent: ctx.span(), "Connection closed"),
                Ok(Err(e)) => warn!(parent: ctx.span(), error = %e, "Connection closing failed"),
                Err(i) => warn!(parent: ctx.span(), error = %i, "Connection closing abandoned"),
            }
        }
        self.give_back();
    }

    fn give_back(&mut self) {
        let Some(permit) = self.permit.take() else {
            return;
        };
        self.shared.in_use.fetch_sub(1, Ordering::SeqCst);

        if let Some(session) = self.session.take() {
            let discard = self.broken || session.is_broken() || self.shared.closed.load(Ordering::SeqCst);
            if discard {
                debug!(broken = self.broken, "Discarding store session");
                close_detached(session);
            } else {
                self.shared.idle().push(session);
            }
        }
        // The session is back in `idle` before the permit frees up for the next waiter.
        drop(permit);
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("checked_out", &self.permit.is_some())
            .field("broken", &self.broken)
            .finish()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        self.give_back();
    }
}

/// Closes a discarded session in the background when a runtime is available.
fn close_detached(session: Box<dyn Session>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = session.close().await {
                    warn!(error = %e, "Connection closing failed");
                }
            });
        }
        Err(_) => drop(session),
    }
}
