//! Connectors: how a store obtains and releases its connection.
//!
//! [`ClusterConnector`] dials an ensemble through a [`Dialer`] and owns the
//! resulting session. [`ExistingConnection`] wraps a connection the caller
//! already opened; closing it is left to the caller.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::config::ClusterConfig;
use crate::error::{CoordError, Result};
use crate::memory::InMemoryCluster;
use crate::traits::Connection;

/// Obtains and releases a coordination-service connection.
pub trait Connector: Send + Sync {
    /// Return a live connection, opening it if necessary.
    fn connect(&self) -> Result<Arc<dyn Connection>>;

    /// Release whatever `connect` acquired.
    fn close(&self) -> Result<()>;
}

/// Opens sessions against a cluster described by a [`ClusterConfig`].
pub trait Dialer: Send + Sync {
    fn dial(&self, config: &ClusterConfig) -> Result<Arc<dyn Connection>>;
}

impl Dialer for InMemoryCluster {
    fn dial(&self, _config: &ClusterConfig) -> Result<Arc<dyn Connection>> {
        Ok(Arc::new(self.session()))
    }
}

/// Connector that dials a cluster and owns the resulting session.
///
/// The first `connect` dials and authenticates; later calls return the same
/// session until `close` releases it.
pub struct ClusterConnector {
    config: ClusterConfig,
    dialer: Box<dyn Dialer>,
    conn: Mutex<Option<Arc<dyn Connection>>>,
}

impl ClusterConnector {
    /// Create a connector. The configuration is validated up front.
    pub fn new(config: ClusterConfig, dialer: impl Dialer + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dialer: Box::new(dialer),
            conn: Mutex::new(None),
        })
    }

    /// The configuration this connector dials with.
    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }
}

impl fmt::Debug for ClusterConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConnector")
            .field("servers", &self.config.servers)
            .finish_non_exhaustive()
    }
}

impl Connector for ClusterConnector {
    fn connect(&self) -> Result<Arc<dyn Connection>> {
        let mut slot = self
            .conn
            .lock()
            .map_err(|e| CoordError::Connection(format!("lock poisoned: {e}")))?;
        if let Some(conn) = slot.as_ref() {
            return Ok(Arc::clone(conn));
        }

        let conn = self.dialer.dial(&self.config)?;
        if let Some(auth) = self.config.scheme_auth()? {
            if let Err(e) = conn.add_auth(&auth.scheme, auth.auth.as_bytes()) {
                conn.close();
                return Err(CoordError::AuthFailed(e.to_string()));
            }
        }
        info!(servers = ?self.config.servers, "connected to coordination cluster");
        *slot = Some(Arc::clone(&conn));
        Ok(conn)
    }

    fn close(&self) -> Result<()> {
        let mut slot = self
            .conn
            .lock()
            .map_err(|e| CoordError::Connection(format!("lock poisoned: {e}")))?;
        if let Some(conn) = slot.take() {
            conn.close();
            debug!("cluster session closed");
        }
        Ok(())
    }
}

/// Connector over a connection the caller already owns.
///
/// `close` does nothing: the caller closes the wrapped connection itself.
#[derive(Clone)]
pub struct ExistingConnection {
    conn: Arc<dyn Connection>,
}

impl ExistingConnection {
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        Self { conn }
    }
}

impl fmt::Debug for ExistingConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExistingConnection").finish_non_exhaustive()
    }
}

impl Connector for ExistingConnection {
    fn connect(&self) -> Result<Arc<dyn Connection>> {
        Ok(Arc::clone(&self.conn))
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySession;
    use crate::types::{perms, world_acl, CreateMode};

    struct FailingDialer;

    impl Dialer for FailingDialer {
        fn dial(&self, config: &ClusterConfig) -> Result<Arc<dyn Connection>> {
            Err(CoordError::Connection(format!(
                "no route to {}",
                config.servers.join(",")
            )))
        }
    }

    #[test]
    fn cluster_connector_reuses_session() {
        let cluster = InMemoryCluster::new();
        let connector = ClusterConnector::new(ClusterConfig::default(), cluster.clone()).unwrap();

        let a = connector.connect().unwrap();
        let b = connector.connect().unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        a.create("/x", b"", CreateMode::Persistent, &world_acl(perms::ALL))
            .unwrap();
        assert!(cluster.session().exists("/x").unwrap().is_some());
    }

    #[test]
    fn cluster_connector_close_ends_session() {
        let cluster = InMemoryCluster::new();
        let connector = ClusterConnector::new(ClusterConfig::default(), cluster).unwrap();

        let conn = connector.connect().unwrap();
        connector.close().unwrap();
        assert_eq!(conn.get("/").unwrap_err(), CoordError::Closed);

        // closing twice is harmless, and a fresh connect dials again
        connector.close().unwrap();
        assert!(connector.connect().unwrap().get("/").is_ok());
    }

    #[test]
    fn cluster_connector_applies_auth() {
        let config = ClusterConfig {
            auth: Some("digest:ops:secret".into()),
            ..ClusterConfig::default()
        };
        let connector = ClusterConnector::new(config, InMemoryCluster::new()).unwrap();
        assert!(connector.connect().is_ok());
    }

    #[test]
    fn cluster_connector_surfaces_dial_errors() {
        let connector = ClusterConnector::new(ClusterConfig::default(), FailingDialer).unwrap();
        let err = connector.connect().err().unwrap();
        assert!(matches!(err, CoordError::Connection(_)));
    }

    #[test]
    fn cluster_connector_rejects_invalid_config() {
        let config = ClusterConfig {
            servers: vec![],
            ..ClusterConfig::default()
        };
        assert!(ClusterConnector::new(config, InMemoryCluster::new()).is_err());
    }

    #[test]
    fn existing_connection_does_not_close() {
        let session: Arc<InMemorySession> = Arc::new(InMemoryCluster::new().session());
        let connector = ExistingConnection::new(session.clone());

        let conn = connector.connect().unwrap();
        connector.close().unwrap();
        assert!(conn.get("/").is_ok());
        assert!(!session.is_closed());
    }
}
