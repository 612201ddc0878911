//! Store construction options.
//!
//! Each [`StoreOption`] is validated independently when applied, so a bad
//! option is rejected with a descriptive [`ConfigError`] before the store is
//! usable.

use std::fmt;
use std::sync::Arc;

use zkit_coord::{perms, world_acl, Acl};

use crate::error::{ConfigError, StoreResult};
use crate::hashing::HashProvider;
use crate::validate::validate_named;

/// Bucket count used when none is configured.
pub const DEFAULT_NUM_BUCKETS: u32 = 256;

/// Name of the node holding the numbered buckets under each category.
pub const DEFAULT_BUCKETS_NODE_NAME: &str = "buckets";

/// Replaces hashing when picking a bucket for a name.
pub type BucketFn = Arc<dyn Fn(&str) -> StoreResult<u32> + Send + Sync>;

/// Resolved store settings.
#[derive(Clone)]
pub struct Settings {
    pub(crate) base_path: String,
    pub(crate) num_buckets: u32,
    pub(crate) acl: Vec<Acl>,
    pub(crate) hash_provider: HashProvider,
    pub(crate) buckets_node_name: String,
    pub(crate) bucket_override: Option<BucketFn>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            num_buckets: DEFAULT_NUM_BUCKETS,
            acl: world_acl(perms::ALL),
            hash_provider: HashProvider::default(),
            buckets_node_name: DEFAULT_BUCKETS_NODE_NAME.to_string(),
            bucket_override: None,
        }
    }
}

impl Settings {
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    pub fn acl(&self) -> &[Acl] {
        &self.acl
    }

    pub fn buckets_node_name(&self) -> &str {
        &self.buckets_node_name
    }

    /// Apply options in order, stopping at the first rejection.
    pub fn apply<I>(&mut self, options: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = StoreOption>,
    {
        options.into_iter().try_for_each(|opt| opt.apply(self))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("base_path", &self.base_path)
            .field("num_buckets", &self.num_buckets)
            .field("acl", &self.acl)
            .field("buckets_node_name", &self.buckets_node_name)
            .field("bucket_override", &self.bucket_override.is_some())
            .finish()
    }
}

/// A single configuration knob for [`Store::new`](crate::Store::new).
pub enum StoreOption {
    /// Root path prepended to everything the store reads or writes. An empty
    /// string leaves the default (the service root) in place.
    BasePath(String),

    /// Number of buckets per category.
    ///
    /// Changing this after data is written makes existing items unreachable.
    NumHashBuckets(u32),

    /// ACL applied to every node the store creates.
    Acl(Vec<Acl>),

    /// Hash used to map item names to buckets.
    HashProvider(HashProvider),

    /// Name of the node that contains the numbered buckets.
    BucketsNodeName(String),

    /// Bypass hashing and choose buckets with the given function.
    BucketOverride(BucketFn),
}

impl StoreOption {
    pub fn apply(self, settings: &mut Settings) -> Result<(), ConfigError> {
        match self {
            StoreOption::BasePath(path) => {
                if path.is_empty() {
                    return Ok(());
                }
                if !path.starts_with('/') {
                    return Err(ConfigError::BasePath);
                }
                settings.base_path = path;
            }
            StoreOption::NumHashBuckets(n) => {
                if n == 0 {
                    return Err(ConfigError::NumBuckets);
                }
                settings.num_buckets = n;
            }
            StoreOption::Acl(acl) => {
                if acl.is_empty() {
                    return Err(ConfigError::Acl);
                }
                settings.acl = acl;
            }
            StoreOption::HashProvider(provider) => settings.hash_provider = provider,
            StoreOption::BucketsNodeName(name) => {
                validate_named(&name, true).map_err(ConfigError::BucketsNodeName)?;
                settings.buckets_node_name = name;
            }
            StoreOption::BucketOverride(f) => settings.bucket_override = Some(f),
        }
        Ok(())
    }
}

impl fmt::Debug for StoreOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreOption::BasePath(p) => f.debug_tuple("BasePath").field(p).finish(),
            StoreOption::NumHashBuckets(n) => f.debug_tuple("NumHashBuckets").field(n).finish(),
            StoreOption::Acl(acl) => f.debug_tuple("Acl").field(acl).finish(),
            StoreOption::HashProvider(_) => f.write_str("HashProvider(..)"),
            StoreOption::BucketsNodeName(n) => f.debug_tuple("BucketsNodeName").field(n).finish(),
            StoreOption::BucketOverride(_) => f.write_str("BucketOverride(..)"),
        }
    }
}

/// Always place items in `bucket`. Makes node paths predictable in tests.
pub fn fixed_bucket(bucket: u32) -> StoreOption {
    StoreOption::BucketOverride(Arc::new(move |_| Ok(bucket)))
}
