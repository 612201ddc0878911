//! File-based store configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use zkit_coord::{perms, world_acl, Acl};

use crate::error::ConfigError;
use crate::hashing::HashAlgorithm;
use crate::options::{StoreOption, DEFAULT_BUCKETS_NODE_NAME, DEFAULT_NUM_BUCKETS};

/// Serializable store settings, typically read from TOML.
///
/// ```toml
/// base_path = "/storage"
/// num_hash_buckets = 64
/// hash_algorithm = "sha1"
///
/// [[acl]]
/// perms = 31
/// scheme = "world"
/// id = "anyone"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub base_path: String,
    pub num_hash_buckets: u32,
    pub buckets_node_name: String,
    pub hash_algorithm: HashAlgorithm,
    pub acl: Vec<Acl>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            num_hash_buckets: DEFAULT_NUM_BUCKETS,
            buckets_node_name: DEFAULT_BUCKETS_NODE_NAME.to_string(),
            hash_algorithm: HashAlgorithm::default(),
            acl: world_acl(perms::ALL),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&text)
    }

    /// The equivalent option list; validation happens when the options are
    /// applied.
    pub fn options(&self) -> Vec<StoreOption> {
        vec![
            StoreOption::BasePath(self.base_path.clone()),
            StoreOption::NumHashBuckets(self.num_hash_buckets),
            StoreOption::BucketsNodeName(self.buckets_node_name.clone()),
            StoreOption::HashProvider(self.hash_algorithm.provider()),
            StoreOption::Acl(self.acl.clone()),
        ]
    }
}
