//! Per-call context: logging span, deadline and cancellation.
//!
//! Every store and messenger operation takes a `&RelayContext` instead of reading
//! process-wide logger state. The span carries the base fields (service, event id, ...)
//! that child spans inherit; the deadline and cancellation token bound every suspension point.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::error::Interrupted;

#[derive(Debug, Clone)]
pub struct RelayContext {
    span: Span,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RelayContext {
    /// Creates a root context logging under `span`, with no deadline.
    pub fn new(span: Span) -> Self {
        Self {
            span,
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Root context with a disabled span. Used by tools and tests.
    pub fn background() -> Self {
        Self::new(Span::none())
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Same cancellation and deadline, different span.
    pub fn with_span(&self, span: Span) -> Self {
        Self {
            span,
            cancel: self.cancel.clone(),
            deadline: self.deadline,
        }
    }

    /// Context whose deadline is the earlier of the current one and `now + timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, at: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= at => current,
            _ => at,
        };
        Self {
            span: self.span.clone(),
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Child context: cancelled when this one is, but can be cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            span: self.span.clone(),
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Fails fast if the context is already cancelled or past its deadline.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(at) if at <= Instant::now() => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drives `fut` until it completes, the context is cancelled, or the deadline passes.
    /// On interruption `fut` is dropped.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        self.run_until(self.deadline, fut).await
    }

    /// Like [`run`](Self::run) with an extra per-call limit; whichever expires first wins.
    pub async fn run_with_timeout<F: Future>(
        &self,
        limit: Duration,
        fut: F,
    ) -> Result<F::Output, Interrupted> {
        let local = Instant::now() + limit;
        let deadline = match self.deadline {
            Some(at) if at <= local => at,
            _ => local,
        };
        self.run_until(Some(deadline), fut).await
    }

    async fn run_until<F: Future>(
        &self,
        deadline: Option<Instant>,
        fut: F,
    ) -> Result<F::Output, Interrupted> {
        self.check()?;
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            _ = expired => Err(Interrupted::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}

impl Default for RelayContext {
    fn default() -> Self {
        Self::background()
    }
}
