//! The coordination-service backed [`Store`].
//!
//! Items live at
//! `{base}/{category}/{buckets}/{bucket}/{name}[/{variant}]`, where `bucket`
//! is derived from a hash of the item name. Spreading names over a fixed
//! number of buckets keeps every child list short no matter how many items a
//! category holds.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};
use zkit_coord::path::{self, join};
use zkit_coord::{Connection, Connector, CoordError, CreateMode, Stat};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult, ValidationError};
use crate::ident::{Ident, Item, Location};
use crate::options::{BucketFn, Settings, StoreOption};
use crate::traits::ItemStore;
use crate::validate::validate_category;

/// Hash-bucketed, versioned item store.
pub struct Store {
    settings: Settings,
    conn: Arc<dyn Connection>,
    connector: Box<dyn Connector>,
    closed: AtomicBool,
}

impl Store {
    /// Apply `options` over the defaults, then connect.
    ///
    /// Option errors are reported before the connector is touched.
    pub fn new<C, I>(connector: C, options: I) -> StoreResult<Self>
    where
        C: Connector + 'static,
        I: IntoIterator<Item = StoreOption>,
    {
        let mut settings = Settings::default();
        settings.apply(options)?;
        let conn = connector.connect().map_err(StoreError::Connect)?;
        info!(
            base_path = %settings.base_path,
            num_buckets = settings.num_buckets,
            "store opened"
        );
        Ok(Self {
            settings,
            conn,
            connector: Box::new(connector),
            closed: AtomicBool::new(false),
        })
    }

    /// Open a store from file-based configuration.
    pub fn from_config<C>(connector: C, config: &StoreConfig) -> StoreResult<Self>
    where
        C: Connector + 'static,
    {
        Self::new(connector, config.options())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace (or with `None`, remove) the bucket override.
    pub fn set_bucket_override(&mut self, f: Option<BucketFn>) {
        self.settings.bucket_override = f;
    }

    /// The bucket `name` is stored in.
    ///
    /// The first eight digest bytes are read as a little-endian signed
    /// integer; its remainder modulo the bucket count, made non-negative, is
    /// the bucket.
    pub fn bucket_for(&self, name: &str) -> StoreResult<u32> {
        if let Some(f) = &self.settings.bucket_override {
            return f(name);
        }
        let digest = self.settings.hash_provider.hash(name.as_bytes());
        let head: [u8; 8] = digest
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .ok_or(StoreError::DigestTooShort { len: digest.len() })?;
        let value = i64::from_le_bytes(head);
        let bucket = (value % i64::from(self.settings.num_buckets)).abs();
        // |bucket| < num_buckets, which fits in u32.
        Ok(bucket as u32)
    }

    /// Full node path of `ident`.
    pub fn ident_path(&self, ident: &Ident) -> StoreResult<String> {
        let buckets = self.buckets_path(&ident.location.category)?;
        let bucket = self.bucket_for(&ident.location.name)?.to_string();
        Ok(join([
            buckets.as_str(),
            bucket.as_str(),
            ident.location.name.as_str(),
            ident.variant.as_str(),
        ]))
    }

    /// Path of the node holding the numbered buckets of `category`.
    fn buckets_path(&self, category: &str) -> StoreResult<String> {
        let last = category.split('/').rfind(|s| !s.is_empty());
        if last == Some(self.settings.buckets_node_name.as_str()) {
            return Err(ValidationError::ReservedCategory.into());
        }
        Ok(join([
            self.settings.base_path.as_str(),
            category,
            self.settings.buckets_node_name.as_str(),
        ]))
    }

    fn conn(&self) -> StoreResult<&dyn Connection> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(self.conn.as_ref())
    }

    /// Create every missing node along `path`, then write the payload.
    fn set_fully(&self, conn: &dyn Connection, path: &str, item: &Item) -> StoreResult<()> {
        let variant_parent = if item.ident.has_variant() {
            path::parent(path)
        } else {
            None
        };
        let version = item.ident.actual_version();

        for prefix in path::prefixes(path) {
            let is_leaf = prefix == path;
            if conn
                .exists(&prefix)
                .map_err(|e| StoreError::backend(&prefix, e))?
                .is_some()
            {
                if is_leaf {
                    conn.set(&prefix, &item.data, version)
                        .map_err(|e| write_error(&prefix, e))?;
                }
                continue;
            }
            if is_leaf && item.ident.version.is_set() {
                return Err(StoreError::VersionConflict { path: prefix });
            }

            let data: &[u8] = if is_leaf || variant_parent == Some(prefix.as_str()) {
                &item.data
            } else {
                &[]
            };
            match conn.create(&prefix, data, CreateMode::Persistent, &self.settings.acl) {
                Ok(_) => debug!(path = %prefix, "created node"),
                Err(e) if e.is_node_exists() && is_leaf => {
                    conn.set(&prefix, &item.data, version)
                        .map_err(|e| write_error(&prefix, e))?;
                }
                Err(e) if e.is_node_exists() => {
                    debug!(path = %prefix, "node created concurrently");
                }
                Err(e) => return Err(StoreError::backend(&prefix, e)),
            }
        }
        Ok(())
    }

    fn stat(&self, conn: &dyn Connection, path: &str) -> StoreResult<Stat> {
        match conn.exists(path) {
            Ok(Some(stat)) => Ok(stat),
            Ok(None) => Err(StoreError::backend(
                path,
                CoordError::NoNode {
                    path: path.to_string(),
                },
            )),
            Err(e) => Err(StoreError::backend(path, e)),
        }
    }

    fn delete_item(&self, conn: &dyn Connection, path: &str, version: i32) -> StoreResult<bool> {
        let variants = match conn.children(path) {
            Ok(children) => children,
            Err(e) if e.is_no_node() => return Ok(false),
            Err(e) => return Err(StoreError::backend(path, e)),
        };
        for variant in &variants {
            let child = join([path, variant.as_str()]);
            match conn.delete(&child, zkit_coord::ANY_VERSION) {
                Ok(()) => debug!(path = %child, "deleted variant"),
                Err(e) if e.is_no_node() => {}
                Err(e) => return Err(StoreError::backend(&child, e)),
            }
        }
        delete_node(conn, path, version)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("settings", &self.settings)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn write_error(path: &str, e: CoordError) -> StoreError {
    if e.is_bad_version() {
        StoreError::VersionConflict {
            path: path.to_string(),
        }
    } else {
        StoreError::backend(path, e)
    }
}

fn delete_node(conn: &dyn Connection, path: &str, version: i32) -> StoreResult<bool> {
    match conn.delete(path, version) {
        Ok(()) => {
            debug!(%path, "deleted node");
            Ok(true)
        }
        Err(e) if e.is_no_node() => Ok(false),
        Err(e) => Err(write_error(path, e)),
    }
}

impl ItemStore for Store {
    fn put(&self, item: &Item) -> StoreResult<Ident> {
        item.validate()?;
        let path = self.ident_path(&item.ident)?;
        let conn = self.conn()?;

        let stat = match conn.set(&path, &item.data, item.ident.actual_version()) {
            Ok(stat) => stat,
            Err(e) if e.is_bad_version() => {
                return Err(StoreError::VersionConflict { path });
            }
            Err(e) if e.is_no_node() => {
                if item.ident.version.is_set() {
                    return Err(StoreError::VersionConflict { path });
                }
                self.set_fully(conn, &path, item)?;
                self.stat(conn, &path)?
            }
            Err(e) => return Err(StoreError::backend(&path, e)),
        };

        debug!(%path, version = stat.version, size = item.data.len(), "put item");
        let mut ident = item.ident.clone();
        ident.set_version(stat.version);
        Ok(ident)
    }

    fn get(&self, ident: &Ident) -> StoreResult<Option<Item>> {
        ident.validate()?;
        let path = self.ident_path(ident)?;
        match self.conn()?.get(&path) {
            Ok((data, stat)) => {
                let mut ident = ident.clone();
                ident.set_version(stat.version);
                Ok(Some(Item { ident, data }))
            }
            Err(e) if e.is_no_node() => Ok(None),
            Err(e) => Err(StoreError::backend(&path, e)),
        }
    }

    fn versions(&self, location: &Location) -> StoreResult<Option<Vec<String>>> {
        location
            .validate()
            .map_err(|e| ValidationError::Location(Box::new(e)))?;
        let path = self.ident_path(&Ident::new(location.clone()))?;
        match self.conn()?.children(&path) {
            Ok(mut children) => {
                children.sort();
                Ok(Some(children))
            }
            Err(e) if e.is_no_node() => Ok(None),
            Err(e) => Err(StoreError::backend(&path, e)),
        }
    }

    fn delete(&self, ident: &Ident) -> StoreResult<bool> {
        ident.validate()?;
        let path = self.ident_path(ident)?;
        let conn = self.conn()?;
        let deleted = if ident.has_variant() {
            delete_node(conn, &path, ident.actual_version())?
        } else {
            self.delete_item(conn, &path, ident.actual_version())?
        };
        if deleted {
            info!(%path, "deleted item");
        }
        Ok(deleted)
    }

    fn list(&self, category: &str) -> StoreResult<Option<Vec<Location>>> {
        validate_category(category).map_err(|e| ValidationError::Category(Box::new(e)))?;
        let buckets_path = self.buckets_path(category)?;
        let conn = self.conn()?;

        let buckets = match conn.children(&buckets_path) {
            Ok(buckets) => buckets,
            Err(e) if e.is_no_node() => return Ok(None),
            Err(e) => return Err(StoreError::backend(&buckets_path, e)),
        };

        let mut names = Vec::new();
        for bucket in &buckets {
            let bucket_path = join([buckets_path.as_str(), bucket.as_str()]);
            match conn.children(&bucket_path) {
                Ok(children) => names.extend(children),
                Err(e) if e.is_no_node() => {
                    warn!(path = %bucket_path, "bucket vanished during list");
                }
                Err(e) => return Err(StoreError::backend(&bucket_path, e)),
            }
        }
        names.sort();
        names.dedup();
        debug!(%category, buckets = buckets.len(), items = names.len(), "listed category");

        Ok(Some(
            names
                .into_iter()
                .map(|name| Location::new(category, name))
                .collect(),
        ))
    }

    fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.connector.close().map_err(StoreError::Connect)?;
        info!(base_path = %self.settings.base_path, "store closed");
        Ok(())
    }
}
