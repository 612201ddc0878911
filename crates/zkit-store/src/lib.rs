//! Hash-bucketed, versioned item storage for zkit.
//!
//! Items are small blobs (at most [`MAX_DATA_SIZE`]) addressed by a category,
//! a name and an optional variant. Each item maps to one node of a
//! coordination service and inherits that node's version counter, which
//! callers use for optimistic concurrency.
//!
//! # Layout
//!
//! ```text
//! {base}/{category}/{buckets}/{bucket}/{name}[/{variant}]
//! ```
//!
//! `bucket` is a stable hash of the name modulo the configured bucket count,
//! so no single node accumulates an unbounded number of children.
//!
//! # Design Rules
//!
//! 1. Input is validated before any backend I/O.
//! 2. Absence is not an error: reads return `None`, deletes return `false`.
//! 3. A stale version always surfaces as [`StoreError::VersionConflict`].
//! 4. Item deletion is not atomic, but re-running it converges.
//!
//! # Modules
//!
//! - [`ident`] -- [`Location`], [`Version`], [`Ident`], [`Item`]
//! - [`validate`] -- Name and category syntax
//! - [`hashing`] -- [`HashProvider`] and the built-in algorithms
//! - [`options`] -- [`StoreOption`] and resolved [`Settings`]
//! - [`config`] -- TOML-backed [`StoreConfig`]
//! - [`traits`] -- The [`ItemStore`] trait
//! - [`store`] -- [`Store`], the coordination-service implementation

pub mod config;
pub mod error;
pub mod hashing;
pub mod ident;
pub mod options;
pub mod store;
pub mod traits;
pub mod validate;

pub use config::StoreConfig;
pub use error::{ConfigError, StoreError, StoreResult, ValidationError};
pub use hashing::{BucketHasher, DigestHasher, HashAlgorithm, HashProvider};
pub use ident::{Ident, Item, Location, Version, MAX_DATA_SIZE};
pub use options::{
    fixed_bucket, BucketFn, Settings, StoreOption, DEFAULT_BUCKETS_NODE_NAME, DEFAULT_NUM_BUCKETS,
};
pub use store::Store;
pub use traits::ItemStore;
