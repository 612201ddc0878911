//! Core node types: stats, ACLs, and creation modes.
//!
//! These mirror the vocabulary of ZooKeeper-style coordination services. A
//! node carries opaque data, a data version that increments on every write,
//! and a child version that increments whenever its child set changes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// Permission bits used in an [`Acl`].
pub mod perms {
    pub const READ: i32 = 1 << 0;
    pub const WRITE: i32 = 1 << 1;
    pub const CREATE: i32 = 1 << 2;
    pub const DELETE: i32 = 1 << 3;
    pub const ADMIN: i32 = 1 << 4;
    pub const ALL: i32 = READ | WRITE | CREATE | DELETE | ADMIN;
}

/// Metadata describing a node at the time it was read or written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Transaction id that created the node.
    pub czxid: i64,
    /// Transaction id that last modified the node's data.
    pub mzxid: i64,
    /// Data version; starts at 0 and increments on every set.
    pub version: i32,
    /// Child version; increments whenever a child is added or removed.
    pub cversion: i32,
    /// Length of the node's data in bytes.
    pub data_length: i32,
    /// Number of immediate children.
    pub num_children: i32,
    /// Session id owning the node if it is ephemeral, else 0.
    pub ephemeral_owner: i64,
}

/// An access-control entry: permission bits granted to an identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Acl {
    pub perms: i32,
    pub scheme: String,
    pub id: String,
}

impl Acl {
    pub fn new(perms: i32, scheme: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            perms,
            scheme: scheme.into(),
            id: id.into(),
        }
    }
}

/// An ACL list granting `perms` to anyone at all.
pub fn world_acl(perms: i32) -> Vec<Acl> {
    vec![Acl::new(perms, "world", "anyone")]
}

/// An ACL list granting `perms` to any authenticated user.
pub fn auth_acl(perms: i32) -> Vec<Acl> {
    vec![Acl::new(perms, "auth", "")]
}

/// An ACL list granting `perms` to `user` authenticated with `password`
/// under the `digest` scheme.
///
/// The id is `user:base64(sha1("user:password"))`, the form the service
/// compares digest credentials against.
pub fn digest_acl(perms: i32, user: &str, password: &str) -> Vec<Acl> {
    let digest = Sha1::digest(format!("{user}:{password}").as_bytes());
    let id = format!("{user}:{}", STANDARD.encode(digest));
    vec![Acl::new(perms, "digest", id)]
}

/// How a node is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreateMode {
    /// Survives the creating session.
    #[default]
    Persistent,
    /// Removed when the creating session closes.
    Ephemeral,
    /// Persistent, with a monotonically increasing suffix appended to the name.
    Sequential,
    /// Ephemeral and sequential.
    EphemeralSequential,
}

impl CreateMode {
    /// Returns `true` if nodes created in this mode die with their session.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, CreateMode::Ephemeral | CreateMode::EphemeralSequential)
    }

    /// Returns `true` if the service appends a sequence suffix.
    pub fn is_sequential(&self) -> bool {
        matches!(self, CreateMode::Sequential | CreateMode::EphemeralSequential)
    }
}
