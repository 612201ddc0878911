//! The read side of a promise.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::context::Context;
use crate::error::FutureError;
use crate::outcome::Outcome;
use crate::promise::Shared;

enum Inner<T> {
    /// Always complete. No latch, no task.
    Fixed(Outcome<T>),
    Promise(Arc<Shared<T>>),
    /// Completes when a context is done. Never carries a value.
    Signal { ctx: Context, report_error: bool },
}

/// A read-only handle to a value and error that become available once.
///
/// Clones are cheap and observe the same completion. Any number of tasks
/// may wait on a future concurrently.
pub struct Future<T> {
    inner: Inner<T>,
}

impl<T: Clone> Clone for Future<T> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            Inner::Fixed(outcome) => Inner::Fixed(outcome.clone()),
            Inner::Promise(shared) => Inner::Promise(Arc::clone(shared)),
            Inner::Signal { ctx, report_error } => Inner::Signal {
                ctx: ctx.clone(),
                report_error: *report_error,
            },
        };
        Self { inner }
    }
}

impl<T> Future<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub(crate) fn from_shared(shared: Arc<Shared<T>>) -> Self {
        Self {
            inner: Inner::Promise(shared),
        }
    }

    /// An already-completed future.
    pub fn fixture(value: Option<T>, error: Option<FutureError>) -> Self {
        Self {
            inner: Inner::Fixed(Outcome::new(value, error)),
        }
    }

    pub fn from_value(value: T) -> Self {
        Self::fixture(Some(value), None)
    }

    pub fn from_error(error: FutureError) -> Self {
        Self::fixture(None, Some(error))
    }

    /// Completed with neither value nor error.
    pub fn nil() -> Self {
        Self::fixture(None, None)
    }

    /// Completes when `ctx` is done, reporting the context's error.
    pub fn await_context(ctx: Context) -> Self {
        Self {
            inner: Inner::Signal {
                ctx,
                report_error: true,
            },
        }
    }

    /// Completes when `token` is canceled, reporting [`FutureError::Canceled`].
    pub fn await_token(token: CancellationToken) -> Self {
        Self::await_context(Context::from_token(token))
    }

    /// Completes when `token` is canceled, reporting no error at all.
    pub fn await_token_no_error(token: CancellationToken) -> Self {
        Self {
            inner: Inner::Signal {
                ctx: Context::from_token(token),
                report_error: false,
            },
        }
    }

    /// Wait for completion.
    pub async fn done(&self) {
        match &self.inner {
            Inner::Fixed(_) => {}
            Inner::Promise(shared) => shared.done_token().cancelled().await,
            Inner::Signal { ctx, .. } => {
                ctx.done().await;
            }
        }
    }

    pub fn is_done(&self) -> bool {
        match &self.inner {
            Inner::Fixed(_) => true,
            Inner::Promise(shared) => shared.is_done(),
            Inner::Signal { ctx, .. } => ctx.is_done(),
        }
    }

    /// The terminal outcome, or `None` while pending.
    pub fn outcome(&self) -> Option<Outcome<T>> {
        match &self.inner {
            Inner::Fixed(outcome) => Some(outcome.clone()),
            Inner::Promise(shared) => shared.outcome(),
            Inner::Signal { ctx, report_error } => {
                let err = ctx.err()?;
                Some(Outcome::new(None, (*report_error).then_some(err)))
            }
        }
    }

    /// The value, once complete.
    pub fn value(&self) -> Option<T> {
        self.outcome().and_then(|o| o.value)
    }

    /// The error, once complete.
    pub fn err(&self) -> Option<FutureError> {
        self.outcome().and_then(|o| o.error)
    }

    /// Wait for completion or for `cancel`, whichever comes first.
    ///
    /// If both are ready, completion wins. A canceled wait yields
    /// `Outcome { value: None, error: Some(Canceled) }`; the future itself is
    /// unaffected.
    pub async fn block(&self, cancel: &CancellationToken) -> Outcome<T> {
        tokio::select! {
            biased;
            _ = self.done() => self.outcome().unwrap_or_default(),
            _ = cancel.cancelled() => self.preempted(FutureError::Canceled),
        }
    }

    /// Like [`block`](Self::block), bounded by a [`Context`]. A preempted wait
    /// reports the context's error.
    pub async fn block_context(&self, ctx: &Context) -> Outcome<T> {
        tokio::select! {
            biased;
            _ = self.done() => self.outcome().unwrap_or_default(),
            err = ctx.done() => self.preempted(err),
        }
    }

    fn preempted(&self, err: FutureError) -> Outcome<T> {
        self.outcome().unwrap_or_else(|| Outcome::err(err))
    }

    /// A context that is canceled once this future completes.
    ///
    /// Canceling the returned context does not affect the future.
    pub fn to_context(&self) -> Context {
        match &self.inner {
            Inner::Fixed(_) => {
                let ctx = Context::background();
                ctx.cancel();
                ctx
            }
            Inner::Promise(shared) => Context::from_token(shared.done_token().child_token()),
            Inner::Signal { ctx, .. } => ctx.with_cancel(),
        }
    }
}

impl<T> fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.inner {
            Inner::Fixed(_) => "fixed",
            Inner::Promise(_) => "promise",
            Inner::Signal { .. } => "signal",
        };
        f.debug_struct("Future").field("kind", &kind).finish()
    }
}
