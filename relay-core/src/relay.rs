//! Relay service seam: the handler that fulfils one queued event, and the worker fan-out
//! that feeds it. Deciding what to forward to whom lives in the handler implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, Instrument};

use crate::context::RelayContext;
use crate::error::Result;

/// Fulfils one event. Each call makes its own store and messenger calls; nothing
/// (in particular no store connection) is shared between events.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle(&self, ctx: &RelayContext, event: E) -> Result<()>;
}

/// Starts `workers` tasks that take events from `rx` one at a time and pass each to `handler`
/// under a child context. Handler failures are logged and the worker moves on.
/// Workers exit when the channel closes or `ctx` is cancelled.
pub fn spawn_workers<E, H>(
    rx: mpsc::Receiver<E>,
    handler: Arc<H>,
    workers: usize,
    ctx: &RelayContext,
) -> Vec<JoinHandle<()>>
where
    E: Send + 'static,
    H: EventHandler<E> + ?Sized + 'static,
{
    let rx = Arc::new(Mutex::new(rx));
    let sequence = Arc::new(AtomicU64::new(0));

    (0..workers.max(1))
        .map(|worker| {
            let rx = rx.clone();
            let handler = handler.clone();
            let sequence = sequence.clone();
            let ctx = ctx.clone();
            let span = info_span!(parent: ctx.span(), "relay.worker", worker);
            tokio::spawn(
                async move {
                    info!("Worker started");
                    loop {
                        let next = {
                            let mut rx = rx.lock().await;
                            tokio::select! {
                                biased;
                                _ = ctx.cancellation_token().cancelled() => None,
                                event = rx.recv() => event,
                            }
                        };
                        let Some(event) = next else {
                            break;
                        };

                        let seq = sequence.fetch_add(1, Ordering::Relaxed);
                        let event_span = info_span!(parent: ctx.span(), "relay.event", worker, seq);
                        let event_ctx = ctx.child().with_span(event_span);
                        if let Err(e) = handler.handle(&event_ctx, event).await {
                            error!(parent: event_ctx.span(), error = %e, seq, "Event handling failed");
                        }
                    }
                    info!("Worker stopped");
                }
                .instrument(span),
            )
        })
        .collect()
}
