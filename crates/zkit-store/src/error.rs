use thiserror::Error;
use zkit_coord::CoordError;

/// Why a location, ident, item, or category was rejected.
///
/// Nested variants record which field failed, so a caller can tell a bad
/// location from a bad variant by matching rather than by reading text:
/// `Location(Name(Blank))` displays as
/// `"invalid location: invalid name: cannot be blank"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid location: {0}")]
    Location(Box<ValidationError>),

    #[error("invalid variant: {0}")]
    Variant(Box<ValidationError>),

    #[error("invalid name: {0}")]
    Name(Box<ValidationError>),

    #[error("invalid category: {0}")]
    Category(Box<ValidationError>),

    #[error("cannot be blank")]
    Blank,

    #[error("leading or trailing spaces not allowed")]
    Whitespace,

    #[error("must match {pattern}")]
    Pattern { pattern: &'static str },

    #[error("data is greater than 1MB ({size} bytes)")]
    DataTooLarge { size: usize },

    #[error("category may not end with the buckets node name")]
    ReservedCategory,
}

/// A store option or configuration value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("basePath must start with /")]
    BasePath,

    #[error("numBuckets must be positive")]
    NumBuckets,

    #[error("ACL required")]
    Acl,

    #[error("invalid buckets node name: {0}")]
    BucketsNodeName(ValidationError),

    #[error("failed to parse store config: {0}")]
    Parse(String),

    #[error("failed to read store config: {0}")]
    Io(String),
}

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Malformed input, detected before any backend I/O.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Invalid store configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An optimistic-concurrency check failed. Re-read the item and retry
    /// with its fresh version.
    #[error("version conflict at {path}")]
    VersionConflict { path: String },

    /// The configured hash produced fewer than 8 bytes.
    #[error("digest too short for bucketing: {len} bytes")]
    DigestTooShort { len: usize },

    /// Any other failure from the coordination service.
    #[error("backend error at {path}: {source}")]
    Backend {
        path: String,
        #[source]
        source: CoordError,
    },

    /// The connector could not provide or release a connection.
    #[error("connection error: {0}")]
    Connect(#[source] CoordError),

    /// The store has been closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Returns `true` for optimistic-concurrency failures.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }

    /// Returns `true` for input validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Validation(_))
    }

    pub(crate) fn backend(path: &str, source: CoordError) -> Self {
        StoreError::Backend {
            path: path.to_string(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
