//! The [`Connection`] trait defining the coordination-service interface.
//!
//! Any backend (a real ensemble client, the in-memory cluster, a fault
//! injecting wrapper) implements this trait to give higher layers primitive
//! node operations.

use crate::error::Result;
use crate::types::{Acl, CreateMode, Stat};

/// Version value meaning "do not check the version".
pub const ANY_VERSION: i32 = -1;

/// A live session against a hierarchical coordination service.
///
/// Implementations must be thread-safe (`Send + Sync`): one connection
/// handle is shared by every caller of a store. Paths are absolute
/// (`/a/b/c`). Versioned operations accept [`ANY_VERSION`] to skip the
/// version check.
pub trait Connection: Send + Sync {
    /// Create a node at `path` holding `data`.
    ///
    /// The parent must already exist. Returns the path actually created,
    /// which differs from `path` for sequential modes.
    fn create(&self, path: &str, data: &[u8], mode: CreateMode, acl: &[Acl]) -> Result<String>;

    /// Overwrite the data at `path` if its version equals `expected_version`.
    fn set(&self, path: &str, data: &[u8], expected_version: i32) -> Result<Stat>;

    /// Read the data and stat of the node at `path`.
    fn get(&self, path: &str) -> Result<(Vec<u8>, Stat)>;

    /// Check whether a node exists. Returns its stat if it does.
    fn exists(&self, path: &str) -> Result<Option<Stat>>;

    /// List the names (not paths) of the immediate children of `path`.
    ///
    /// No ordering is guaranteed.
    fn children(&self, path: &str) -> Result<Vec<String>>;

    /// Delete the node at `path` if its version equals `expected_version`.
    fn delete(&self, path: &str, expected_version: i32) -> Result<()>;

    /// Attach authentication credentials to the session.
    fn add_auth(&self, scheme: &str, auth: &[u8]) -> Result<()>;

    /// End the session. Further operations fail with `Closed`.
    fn close(&self);
}
