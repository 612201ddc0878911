//! Error types for coordination-service operations.

use thiserror::Error;

/// Errors reported by a coordination-service connection.
///
/// `NoNode` and `BadVersion` are the sentinels that higher layers translate
/// into their own vocabulary; everything else is surfaced as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// The addressed node does not exist.
    #[error("node does not exist: {path}")]
    NoNode { path: String },

    /// A node already exists at the path being created.
    #[error("node already exists: {path}")]
    NodeExists { path: String },

    /// The expected version did not match the node's current version.
    #[error("version conflict on {path}: expected {expected}, actual {actual}")]
    BadVersion {
        path: String,
        expected: i32,
        actual: i32,
    },

    /// The node still has children and cannot be deleted.
    #[error("node has children: {path}")]
    NotEmpty { path: String },

    /// Ephemeral nodes may not have children.
    #[error("ephemeral node may not have children: {path}")]
    NoChildrenForEphemerals { path: String },

    /// The ACL list was empty or malformed.
    #[error("invalid ACL for {path}")]
    InvalidAcl { path: String },

    /// The path is not a valid absolute node path.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The session has been closed.
    #[error("connection closed")]
    Closed,

    /// Authentication was rejected by the service.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// Dialing or talking to the cluster failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Configuration could not be parsed or was invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error while reading configuration.
    #[error("io error: {0}")]
    Io(String),
}

impl CoordError {
    /// Returns `true` for the "no such node" sentinel.
    pub fn is_no_node(&self) -> bool {
        matches!(self, CoordError::NoNode { .. })
    }

    /// Returns `true` for the "bad version" sentinel.
    pub fn is_bad_version(&self) -> bool {
        matches!(self, CoordError::BadVersion { .. })
    }

    /// Returns `true` when a create raced with another creator.
    pub fn is_node_exists(&self) -> bool {
        matches!(self, CoordError::NodeExists { .. })
    }
}

impl From<std::io::Error> for CoordError {
    fn from(e: std::io::Error) -> Self {
        CoordError::Io(e.to_string())
    }
}

/// Convenience type alias for coordination operations.
pub type Result<T> = std::result::Result<T, CoordError>;
