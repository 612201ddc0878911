use crate::error::StoreResult;
use crate::ident::{Ident, Item, Location};

/// Versioned item storage.
///
/// Absence is not an error: reads return `Ok(None)` and deletes return
/// `Ok(false)` when the target does not exist. Mutations honor the ident's
/// [`Version`](crate::Version) and fail with
/// [`StoreError::VersionConflict`](crate::StoreError::VersionConflict) when it
/// no longer matches.
pub trait ItemStore: Send + Sync {
    /// Create or update an item. Returns the ident carrying the version the
    /// backend assigned to this write.
    fn put(&self, item: &Item) -> StoreResult<Ident>;

    /// Read an item, with its current version filled in.
    fn get(&self, ident: &Ident) -> StoreResult<Option<Item>>;

    /// Names of the variants stored under an item, sorted.
    fn versions(&self, location: &Location) -> StoreResult<Option<Vec<String>>>;

    /// Delete a variant, or an item together with all of its variants.
    ///
    /// Returns `Ok(true)` if the target existed and was deleted.
    fn delete(&self, ident: &Ident) -> StoreResult<bool>;

    /// Every item in a category, sorted by name.
    fn list(&self, category: &str) -> StoreResult<Option<Vec<Location>>>;

    /// Release the underlying connection. Later calls fail with
    /// [`StoreError::Closed`](crate::StoreError::Closed).
    fn close(&self) -> StoreResult<()>;
}
