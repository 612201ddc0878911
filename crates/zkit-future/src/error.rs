use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Terminal errors carried by a [`Future`](crate::Future).
///
/// Cheap to clone: every waiter of a future observes the same error value.
#[derive(Debug, Clone, Error)]
pub enum FutureError {
    /// The wait (or the work) was canceled.
    #[error("context canceled")]
    Canceled,

    /// A deadline passed before completion.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// [`flatten`](crate::flatten) was given a plain value where a future was
    /// expected.
    #[error("cannot flatten non-Future value")]
    InvalidFlatten,

    /// Any other error, shared between waiters.
    #[error("{0}")]
    Other(Arc<dyn StdError + Send + Sync>),
}

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

impl FutureError {
    pub fn other<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        FutureError::Other(Arc::new(error))
    }

    /// An [`Other`](FutureError::Other) error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::other(Message(message.into()))
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, FutureError::Canceled)
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, FutureError::DeadlineExceeded)
    }

    pub fn is_invalid_flatten(&self) -> bool {
        matches!(self, FutureError::InvalidFlatten)
    }
}

/// `Other` errors compare by identity; the rest compare by kind.
impl PartialEq for FutureError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FutureError::Canceled, FutureError::Canceled)
            | (FutureError::DeadlineExceeded, FutureError::DeadlineExceeded)
            | (FutureError::InvalidFlatten, FutureError::InvalidFlatten) => true,
            (FutureError::Other(a), FutureError::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Result alias for fallible helpers in this crate.
pub type Result<T> = std::result::Result<T, FutureError>;
