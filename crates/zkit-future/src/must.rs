//! Assertion helpers for results that can only fail through programmer error.

use std::fmt;
use std::sync::OnceLock;

/// Unwrap `result`, panicking with the error otherwise.
///
/// Reserve this for invariants (a constant that must parse, a fixture that
/// must build). It is not a recovery path.
#[track_caller]
pub fn must<T, E>(result: Result<T, E>) -> T
where
    E: fmt::Display,
{
    match result {
        Ok(value) => value,
        Err(e) => panic!("must: {e}"),
    }
}

/// Computes a value on first use and caches it.
pub struct Lazy<T, F = fn() -> T> {
    cell: OnceLock<T>,
    factory: F,
}

impl<T, F> Lazy<T, F>
where
    F: Fn() -> T,
{
    pub const fn new(factory: F) -> Self {
        Self {
            cell: OnceLock::new(),
            factory,
        }
    }

    /// The cached value, running the factory at most once.
    pub fn get(&self) -> &T {
        self.cell.get_or_init(&self.factory)
    }
}

impl<T: fmt::Debug, F> fmt::Debug for Lazy<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lazy").field(&self.cell.get()).finish()
    }
}
