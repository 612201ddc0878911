//! Coordination-service primitives for zkit.
//!
//! This crate describes the narrow slice of a ZooKeeper-style coordination
//! service that higher layers build on: a tree of nodes addressed by absolute
//! paths, each holding opaque bytes and a version that increments on every
//! write.
//!
//! # Architecture
//!
//! - **Connections** expose primitive create/set/get/exists/children/delete
//!   operations. Conditional writes take an expected version, with
//!   [`ANY_VERSION`] disabling the check.
//! - **Connectors** decide where a connection comes from: dialing a cluster
//!   ([`ClusterConnector`]) or wrapping one the caller already holds
//!   ([`ExistingConnection`]).
//! - **The in-memory cluster** ([`InMemoryCluster`]) implements the same
//!   semantics in-process for tests and embedding.
//!
//! # Modules
//!
//! - [`error`] -- Error types for coordination operations
//! - [`types`] -- [`Stat`], [`Acl`], [`CreateMode`]
//! - [`traits`] -- The [`Connection`] trait
//! - [`path`] -- Node path validation and joining
//! - [`memory`] -- [`InMemoryCluster`] and [`InMemorySession`]
//! - [`connector`] -- [`Connector`], [`Dialer`] and their implementations
//! - [`config`] -- [`ClusterConfig`] and credential parsing

pub mod config;
pub mod connector;
pub mod error;
pub mod memory;
pub mod path;
pub mod traits;
pub mod types;

pub use config::{ClusterConfig, SchemeAuth, SchemeId, DEFAULT_ADDR};
pub use connector::{ClusterConnector, Connector, Dialer, ExistingConnection};
pub use error::{CoordError, Result};
pub use memory::{InMemoryCluster, InMemorySession};
pub use traits::{Connection, ANY_VERSION};
pub use types::{auth_acl, digest_acl, perms, world_acl, Acl, CreateMode, Stat};
