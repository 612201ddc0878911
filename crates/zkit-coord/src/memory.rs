//! In-memory coordination service for testing and ephemeral use.
//!
//! [`InMemoryCluster`] holds a node tree behind a `RwLock`. Each call to
//! [`InMemoryCluster::session`] opens an [`InMemorySession`] that implements
//! the full [`Connection`] trait against that shared tree, so several
//! sessions observe each other's writes the way clients of one ensemble do.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{CoordError, Result};
use crate::path::{base_name, parent, validate_path};
use crate::traits::{Connection, ANY_VERSION};
use crate::types::{Acl, CreateMode, Stat};

#[derive(Clone, Debug)]
struct Node {
    data: Vec<u8>,
    stat: Stat,
    acl: Vec<Acl>,
    children: BTreeSet<String>,
}

impl Node {
    fn new(data: &[u8], acl: &[Acl], zxid: i64, owner: i64) -> Self {
        Self {
            data: data.to_vec(),
            stat: Stat {
                czxid: zxid,
                mzxid: zxid,
                data_length: data.len() as i32,
                ephemeral_owner: owner,
                ..Stat::default()
            },
            acl: acl.to_vec(),
            children: BTreeSet::new(),
        }
    }
}

#[derive(Debug)]
struct Tree {
    nodes: HashMap<String, Node>,
    zxid: i64,
    last_session: i64,
}

impl Tree {
    fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert("/".to_string(), Node::new(&[], &[], 0, 0));
        Self {
            nodes,
            zxid: 0,
            last_session: 0,
        }
    }

    fn next_zxid(&mut self) -> i64 {
        self.zxid += 1;
        self.zxid
    }

    fn node(&self, path: &str) -> Result<&Node> {
        self.nodes.get(path).ok_or_else(|| CoordError::NoNode {
            path: path.to_string(),
        })
    }

    fn node_mut(&mut self, path: &str) -> Result<&mut Node> {
        self.nodes.get_mut(path).ok_or_else(|| CoordError::NoNode {
            path: path.to_string(),
        })
    }

    /// Unlink a childless node from the tree and its parent.
    fn remove(&mut self, path: &str) {
        if self.nodes.remove(path).is_none() {
            return;
        }
        if let Some(parent_path) = parent(path) {
            if let Some(parent) = self.nodes.get_mut(parent_path) {
                parent.children.remove(base_name(path));
                parent.stat.cversion += 1;
                parent.stat.num_children = parent.children.len() as i32;
            }
        }
    }
}

/// A shared in-memory node tree that sessions connect to.
///
/// Cloning the cluster yields another handle to the same tree.
#[derive(Clone, Debug)]
pub struct InMemoryCluster {
    tree: Arc<RwLock<Tree>>,
}

impl InMemoryCluster {
    /// Create a cluster containing only the root node.
    pub fn new() -> Self {
        Self {
            tree: Arc::new(RwLock::new(Tree::new())),
        }
    }

    /// Open a new session against this cluster.
    pub fn session(&self) -> InMemorySession {
        let id = match self.tree.write() {
            Ok(mut tree) => {
                tree.last_session += 1;
                tree.last_session
            }
            Err(poisoned) => {
                let mut tree = poisoned.into_inner();
                tree.last_session += 1;
                tree.last_session
            }
        };
        debug!(session = id, "in-memory session opened");
        InMemorySession {
            id,
            tree: Arc::clone(&self.tree),
            closed: AtomicBool::new(false),
            auth: RwLock::new(Vec::new()),
        }
    }

    /// Number of nodes in the tree, including the root.
    pub fn node_count(&self) -> usize {
        self.tree.read().map(|t| t.nodes.len()).unwrap_or_default()
    }
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

/// One client session against an [`InMemoryCluster`].
///
/// Ephemeral nodes created through a session are removed when it closes.
#[derive(Debug)]
pub struct InMemorySession {
    id: i64,
    tree: Arc<RwLock<Tree>>,
    closed: AtomicBool,
    auth: RwLock<Vec<(String, Vec<u8>)>>,
}

impl InMemorySession {
    /// The session id assigned by the cluster.
    pub fn session_id(&self) -> i64 {
        self.id
    }

    /// Whether [`Connection::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Schemes of the credentials attached through `add_auth`.
    pub fn auth_schemes(&self) -> Vec<String> {
        self.auth
            .read()
            .map(|a| a.iter().map(|(scheme, _)| scheme.clone()).collect())
            .unwrap_or_default()
    }

    /// The ACL a node was created with.
    pub fn acl(&self, path: &str) -> Result<Vec<Acl>> {
        validate_path(path)?;
        Ok(self.read()?.node(path)?.acl.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tree>> {
        if self.is_closed() {
            return Err(CoordError::Closed);
        }
        self.tree
            .read()
            .map_err(|e| CoordError::Connection(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tree>> {
        if self.is_closed() {
            return Err(CoordError::Closed);
        }
        self.tree
            .write()
            .map_err(|e| CoordError::Connection(format!("lock poisoned: {e}")))
    }
}

impl Connection for InMemorySession {
    fn create(&self, path: &str, data: &[u8], mode: CreateMode, acl: &[Acl]) -> Result<String> {
        validate_path(path)?;
        if acl.is_empty() {
            return Err(CoordError::InvalidAcl {
                path: path.to_string(),
            });
        }
        let parent_path = parent(path).ok_or_else(|| CoordError::NodeExists {
            path: path.to_string(),
        })?;

        let mut tree = self.write()?;
        let parent = tree.node(parent_path).map_err(|_| CoordError::NoNode {
            path: path.to_string(),
        })?;
        if parent.stat.ephemeral_owner != 0 {
            return Err(CoordError::NoChildrenForEphemerals {
                path: path.to_string(),
            });
        }

        let actual = if mode.is_sequential() {
            format!("{path}{:010}", parent.stat.cversion)
        } else {
            path.to_string()
        };
        if tree.nodes.contains_key(&actual) {
            return Err(CoordError::NodeExists { path: actual });
        }

        let zxid = tree.next_zxid();
        let owner = if mode.is_ephemeral() { self.id } else { 0 };
        tree.nodes
            .insert(actual.clone(), Node::new(data, acl, zxid, owner));
        let parent = tree.node_mut(parent_path)?;
        parent.children.insert(base_name(&actual).to_string());
        parent.stat.cversion += 1;
        parent.stat.num_children = parent.children.len() as i32;

        Ok(actual)
    }

    fn set(&self, path: &str, data: &[u8], expected_version: i32) -> Result<Stat> {
        validate_path(path)?;
        let mut tree = self.write()?;
        let zxid = tree.zxid + 1;
        let node = tree.node_mut(path)?;
        if expected_version != ANY_VERSION && expected_version != node.stat.version {
            return Err(CoordError::BadVersion {
                path: path.to_string(),
                expected: expected_version,
                actual: node.stat.version,
            });
        }
        node.data = data.to_vec();
        node.stat.version += 1;
        node.stat.mzxid = zxid;
        node.stat.data_length = data.len() as i32;
        let stat = node.stat;
        tree.zxid = zxid;
        Ok(stat)
    }

    fn get(&self, path: &str) -> Result<(Vec<u8>, Stat)> {
        validate_path(path)?;
        let tree = self.read()?;
        let node = tree.node(path)?;
        Ok((node.data.clone(), node.stat))
    }

    fn exists(&self, path: &str) -> Result<Option<Stat>> {
        validate_path(path)?;
        let tree = self.read()?;
        Ok(tree.nodes.get(path).map(|n| n.stat))
    }

    fn children(&self, path: &str) -> Result<Vec<String>> {
        validate_path(path)?;
        let tree = self.read()?;
        Ok(tree.node(path)?.children.iter().cloned().collect())
    }

    fn delete(&self, path: &str, expected_version: i32) -> Result<()> {
        validate_path(path)?;
        if path == "/" {
            return Err(CoordError::InvalidPath {
                path: path.to_string(),
                reason: "cannot delete the root node".into(),
            });
        }
        let mut tree = self.write()?;
        let node = tree.node(path)?;
        if expected_version != ANY_VERSION && expected_version != node.stat.version {
            return Err(CoordError::BadVersion {
                path: path.to_string(),
                expected: expected_version,
                actual: node.stat.version,
            });
        }
        if !node.children.is_empty() {
            return Err(CoordError::NotEmpty {
                path: path.to_string(),
            });
        }
        tree.remove(path);
        tree.next_zxid();
        Ok(())
    }

    fn add_auth(&self, scheme: &str, auth: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(CoordError::Closed);
        }
        if scheme.is_empty() {
            return Err(CoordError::AuthFailed("scheme must not be empty".into()));
        }
        let mut creds = self
            .auth
            .write()
            .map_err(|e| CoordError::Connection(format!("lock poisoned: {e}")))?;
        creds.push((scheme.to_string(), auth.to_vec()));
        Ok(())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut tree = match self.tree.write() {
            Ok(tree) => tree,
            Err(poisoned) => poisoned.into_inner(),
        };
        let owned: Vec<String> = tree
            .nodes
            .iter()
            .filter(|(_, n)| n.stat.ephemeral_owner == self.id)
            .map(|(p, _)| p.clone())
            .collect();
        for path in &owned {
            tree.remove(path);
        }
        debug!(session = self.id, ephemerals = owned.len(), "in-memory session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{perms, world_acl};

    fn acl() -> Vec<Acl> {
        world_acl(perms::ALL)
    }

    fn create(conn: &InMemorySession, path: &str, data: &[u8]) -> String {
        conn.create(path, data, CreateMode::Persistent, &acl()).unwrap()
    }

    #[test]
    fn create_and_get() {
        let conn = InMemoryCluster::new().session();
        assert_eq!(create(&conn, "/a", b"hello"), "/a");

        let (data, stat) = conn.get("/a").unwrap();
        assert_eq!(data, b"hello");
        assert_eq!(stat.version, 0);
        assert_eq!(stat.data_length, 5);
    }

    #[test]
    fn create_requires_parent() {
        let conn = InMemoryCluster::new().session();
        let err = conn
            .create("/a/b", b"", CreateMode::Persistent, &acl())
            .unwrap_err();
        assert!(err.is_no_node(), "expected NoNode, got: {err}");
    }

    #[test]
    fn create_existing_fails() {
        let conn = InMemoryCluster::new().session();
        create(&conn, "/a", b"");
        let err = conn
            .create("/a", b"", CreateMode::Persistent, &acl())
            .unwrap_err();
        assert!(err.is_node_exists());
    }

    #[test]
    fn acl_is_recorded() {
        let conn = InMemoryCluster::new().session();
        let read_only = world_acl(perms::READ);
        conn.create("/a", b"", CreateMode::Persistent, &read_only).unwrap();
        assert_eq!(conn.acl("/a").unwrap(), read_only);
        assert!(conn.acl("/missing").unwrap_err().is_no_node());
    }

    #[test]
    fn create_rejects_empty_acl() {
        let conn = InMemoryCluster::new().session();
        let err = conn.create("/a", b"", CreateMode::Persistent, &[]).unwrap_err();
        assert!(matches!(err, CoordError::InvalidAcl { .. }));
    }

    #[test]
    fn set_bumps_version() {
        let conn = InMemoryCluster::new().session();
        create(&conn, "/a", b"v0");
        assert_eq!(conn.set("/a", b"v1", ANY_VERSION).unwrap().version, 1);
        assert_eq!(conn.set("/a", b"v2", 1).unwrap().version, 2);
        assert_eq!(conn.get("/a").unwrap().0, b"v2");
    }

    #[test]
    fn set_with_stale_version_fails() {
        let conn = InMemoryCluster::new().session();
        create(&conn, "/a", b"v0");
        conn.set("/a", b"v1", 0).unwrap();

        let err = conn.set("/a", b"stale", 0).unwrap_err();
        assert!(err.is_bad_version());
        assert_eq!(conn.get("/a").unwrap().0, b"v1");
    }

    #[test]
    fn set_missing_node() {
        let conn = InMemoryCluster::new().session();
        assert!(conn.set("/nope", b"", ANY_VERSION).unwrap_err().is_no_node());
    }

    #[test]
    fn children_and_cversion() {
        let conn = InMemoryCluster::new().session();
        create(&conn, "/p", b"");
        create(&conn, "/p/b", b"");
        create(&conn, "/p/a", b"");

        let mut kids = conn.children("/p").unwrap();
        kids.sort();
        assert_eq!(kids, vec!["a", "b"]);

        let stat = conn.exists("/p").unwrap().unwrap();
        assert_eq!(stat.num_children, 2);
        assert_eq!(stat.cversion, 2);
    }

    #[test]
    fn delete_semantics() {
        let conn = InMemoryCluster::new().session();
        create(&conn, "/p", b"");
        create(&conn, "/p/c", b"");

        assert!(matches!(
            conn.delete("/p", ANY_VERSION).unwrap_err(),
            CoordError::NotEmpty { .. }
        ));
        assert!(conn.delete("/p/c", 3).unwrap_err().is_bad_version());

        conn.delete("/p/c", 0).unwrap();
        conn.delete("/p", ANY_VERSION).unwrap();
        assert!(conn.exists("/p").unwrap().is_none());
        assert!(conn.delete("/p", ANY_VERSION).unwrap_err().is_no_node());
        assert!(conn.delete("/", ANY_VERSION).is_err());
    }

    #[test]
    fn sequential_nodes_get_suffix() {
        let conn = InMemoryCluster::new().session();
        create(&conn, "/q", b"");
        let first = conn
            .create("/q/item-", b"", CreateMode::Sequential, &acl())
            .unwrap();
        let second = conn
            .create("/q/item-", b"", CreateMode::Sequential, &acl())
            .unwrap();
        assert_eq!(first, "/q/item-0000000000");
        assert_eq!(second, "/q/item-0000000001");
    }

    #[test]
    fn ephemerals_die_with_session() {
        let cluster = InMemoryCluster::new();
        let owner = cluster.session();
        let observer = cluster.session();

        owner
            .create("/lock", b"", CreateMode::Ephemeral, &acl())
            .unwrap();
        assert!(observer.exists("/lock").unwrap().is_some());

        let err = owner
            .create("/lock/child", b"", CreateMode::Persistent, &acl())
            .unwrap_err();
        assert!(matches!(err, CoordError::NoChildrenForEphemerals { .. }));

        owner.close();
        assert!(observer.exists("/lock").unwrap().is_none());
    }

    #[test]
    fn closed_session_rejects_operations() {
        let conn = InMemoryCluster::new().session();
        conn.close();
        assert!(conn.is_closed());
        assert_eq!(conn.get("/").unwrap_err(), CoordError::Closed);
        assert_eq!(conn.add_auth("digest", b"u:p").unwrap_err(), CoordError::Closed);
    }

    #[test]
    fn sessions_share_tree() {
        let cluster = InMemoryCluster::new();
        let a = cluster.session();
        let b = cluster.session();
        assert_ne!(a.session_id(), b.session_id());

        create(&a, "/shared", b"x");
        assert_eq!(b.get("/shared").unwrap().0, b"x");
        assert_eq!(cluster.node_count(), 2);
    }

    #[test]
    fn invalid_paths_rejected() {
        let conn = InMemoryCluster::new().session();
        assert!(matches!(
            conn.get("relative").unwrap_err(),
            CoordError::InvalidPath { .. }
        ));
    }

    #[test]
    fn add_auth_records_scheme() {
        let conn = InMemoryCluster::new().session();
        conn.add_auth("digest", b"user:pass").unwrap();
        assert_eq!(conn.auth_schemes(), vec!["digest"]);
        assert!(conn.add_auth("", b"x").is_err());
    }
}
