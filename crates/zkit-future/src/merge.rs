//! Reducers that fold many outcomes into one.

use crate::error::FutureError;
use crate::outcome::Outcome;

/// Folds the outcomes of several futures into an accumulated outcome.
///
/// [`block`](crate::block) and friends call `merge` once per future and never
/// concurrently, so implementations may keep plain mutable state. The last
/// returned outcome is the merged result.
pub trait Merger<T, A>: Send {
    fn merge(&mut self, outcome: Outcome<T>) -> Outcome<A>;
}

impl<T, A, F> Merger<T, A> for F
where
    F: FnMut(Outcome<T>) -> Outcome<A> + Send,
{
    fn merge(&mut self, outcome: Outcome<T>) -> Outcome<A> {
        self(outcome)
    }
}

/// Ignores everything; the merged result is always nil.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl<T, A> Merger<T, A> for Discard {
    fn merge(&mut self, _outcome: Outcome<T>) -> Outcome<A> {
        Outcome::nil()
    }
}

/// Keeps the first error it is given and drops all values.
#[derive(Clone, Debug, Default)]
pub struct FirstError {
    first: Option<FutureError>,
}

impl FirstError {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&FutureError> {
        self.first.as_ref()
    }
}

impl<T, A> Merger<T, A> for FirstError {
    fn merge(&mut self, outcome: Outcome<T>) -> Outcome<A> {
        if self.first.is_none() {
            self.first = outcome.error;
        }
        Outcome::new(None, self.first.clone())
    }
}
