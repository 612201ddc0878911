//! The terminal state of a future.

use crate::error::FutureError;

/// A value and an error, either or both of which may be present.
///
/// Completing with both is allowed: a partial result alongside the reason it
/// is partial.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: Option<T>,
    pub error: Option<FutureError>,
}

impl<T> Outcome<T> {
    pub fn new(value: Option<T>, error: Option<FutureError>) -> Self {
        Self { value, error }
    }

    /// A successful outcome.
    pub fn ok(value: T) -> Self {
        Self::new(Some(value), None)
    }

    /// A failed outcome with no value.
    pub fn err(error: FutureError) -> Self {
        Self::new(None, Some(error))
    }

    /// Neither value nor error.
    pub fn nil() -> Self {
        Self::new(None, None)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Transform the value, keeping the error.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        Outcome {
            value: self.value.map(f),
            error: self.error,
        }
    }

    /// The error if there is one, otherwise the (possibly absent) value.
    pub fn into_result(self) -> Result<Option<T>, FutureError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}

impl<T> Default for Outcome<T> {
    fn default() -> Self {
        Self::nil()
    }
}

impl<T> From<Result<T, FutureError>> for Outcome<T> {
    fn from(result: Result<T, FutureError>) -> Self {
        match result {
            Ok(v) => Self::ok(v),
            Err(e) => Self::err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        assert_eq!(Outcome::ok(1), Outcome::new(Some(1), None));
        assert_eq!(Outcome::<i32>::err(FutureError::Canceled).value, None);
        assert_eq!(Outcome::<i32>::default(), Outcome::nil());
    }

    #[test]
    fn into_result_prefers_error() {
        let both = Outcome::new(Some(1), Some(FutureError::Canceled));
        assert_eq!(both.into_result(), Err(FutureError::Canceled));
        assert_eq!(Outcome::<i32>::nil().into_result(), Ok(None));
    }

    #[test]
    fn map_keeps_error() {
        let mapped = Outcome::new(Some(2), Some(FutureError::InvalidFlatten)).map(|v| v * 10);
        assert_eq!(mapped.value, Some(20));
        assert_eq!(mapped.error, Some(FutureError::InvalidFlatten));
        assert_eq!(Outcome::from(Ok::<_, FutureError>(3)), Outcome::ok(3));
    }
}
