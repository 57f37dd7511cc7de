//! In-memory [`storage::Connector`] for pool tests.
//!
//! Statements select behaviour: `HANG` never completes, `FAIL` errors, `BREAK` errors and
//! marks the session broken, `EMPTY` returns no rows, `SLOW` sleeps briefly; anything else
//! returns one row `n = 1`. Counters record sessions opened, live, closed, and the peak
//! number of statements running at once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::BoxError;
use storage::{Connector, Query, Row, Session, Value};

#[derive(Default)]
pub struct FakeStats {
    pub opened: AtomicUsize,
    pub live: AtomicUsize,
    pub max_live: AtomicUsize,
    pub closed: AtomicUsize,
    pub running: AtomicUsize,
    pub max_running: AtomicUsize,
}

impl FakeStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub stats: Arc<FakeStats>,
    /// When set, `connect` fails.
    pub refuse: AtomicBool,
    /// When set, `connect` never completes.
    pub stall: AtomicBool,
    /// When set, `close` fails.
    pub fail_close: Arc<AtomicBool>,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self) -> Result<Box<dyn Session>, BoxError> {
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.refuse.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.max_live.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            stats: self.stats.clone(),
            fail_close: self.fail_close.clone(),
            broken: false,
        }))
    }

    fn endpoint(&self) -> String {
        "fake://store".to_string()
    }
}

struct FakeSession {
    stats: Arc<FakeStats>,
    fail_close: Arc<AtomicBool>,
    broken: bool,
}

/// Decrements `running` when the statement finishes or is dropped mid-flight.
struct Running(Arc<FakeStats>);

impl Running {
    fn start(stats: &Arc<FakeStats>) -> Self {
        let now = stats.running.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_running.fetch_max(now, Ordering::SeqCst);
        Running(stats.clone())
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeSession {
    async fn run(&mut self, query: &Query) -> Result<Vec<Row>, BoxError> {
        let _running = Running::start(&self.stats);
        match query.statement() {
            "HANG" => {
                std::future::pending::<()>().await;
                unreachable!()
            }
            "FAIL" => Err("syntax error".into()),
            "BREAK" => {
                self.broken = true;
                Err("connection reset by peer".into())
            }
            "EMPTY" => Ok(Vec::new()),
            "SLOW" => {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(vec![one()])
            }
            _ => Ok(vec![one()]),
        }
    }
}

fn one() -> Row {
    Row::new(vec!["n".to_string()].into(), vec![Value::Int(1)])
}

#[async_trait]
impl Session for FakeSession {
    async fn fetch_all(&mut self, query: &Query) -> Result<Vec<Row>, BoxError> {
        self.run(query).await
    }

    async fn execute(&mut self, query: &Query) -> Result<u64, BoxError> {
        self.run(query).await.map(|rows| rows.len() as u64)
    }

    async fn close(self: Box<Self>) -> Result<(), BoxError> {
        self.stats.closed.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err("close failed".into());
        }
        Ok(())
    }

    fn is_broken(&self) -> bool {
        self.broken
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.stats.live.fetch_sub(1, Ordering::SeqCst);
    }
}
