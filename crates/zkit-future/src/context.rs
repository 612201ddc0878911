//! Cancellation contexts: a cancellation token plus an optional deadline.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::FutureError;

/// Scopes a wait. Cloning shares the same token and deadline.
///
/// Derived contexts ([`with_cancel`](Context::with_cancel),
/// [`with_timeout`](Context::with_timeout)) are canceled with their parent,
/// never the other way around.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless canceled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A child that can be canceled independently of `self`.
    pub fn with_cancel(&self) -> Self {
        Self {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// A child whose deadline is the earlier of `deadline` and the parent's.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) if parent < deadline => parent,
            _ => deadline,
        };
        Self {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context is done, or `None` while it is live.
    pub fn err(&self) -> Option<FutureError> {
        if self.token.is_cancelled() {
            return Some(FutureError::Canceled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(FutureError::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Wait until the context is done and return why.
    pub async fn done(&self) -> FutureError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => FutureError::Canceled,
                _ = tokio::time::sleep_until(deadline) => FutureError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                FutureError::Canceled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_live() {
        let ctx = Context::background();
        assert!(!ctx.is_done());
        assert_eq!(ctx.err(), None);
        ctx.cancel();
        assert_eq!(ctx.err(), Some(FutureError::Canceled));
    }

    #[test]
    fn cancellation_flows_to_children_only() {
        let parent = Context::background();
        let child = parent.with_cancel();
        child.cancel();
        assert!(!parent.is_done());

        let child = parent.with_cancel();
        parent.cancel();
        assert!(child.is_done());
    }

    #[test]
    fn child_deadline_never_extends_parent() {
        let parent = Context::background().with_timeout(Duration::from_secs(1));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }

    #[test]
    fn expired_deadline() {
        let ctx = Context::background().with_deadline(Instant::now());
        assert_eq!(ctx.err(), Some(FutureError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn done_reports_reason() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        assert_eq!(ctx.done().await, FutureError::DeadlineExceeded);

        let ctx = Context::background();
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.done().await });
        ctx.cancel();
        assert_eq!(handle.await.unwrap(), FutureError::Canceled);
    }
}
