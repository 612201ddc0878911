//! Cluster connection configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoordError, Result};
use crate::types::Acl;

/// Default address of a local coordination service.
pub const DEFAULT_ADDR: &str = "127.0.0.1:2181";

/// Authentication credentials in `scheme:auth` form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeAuth {
    pub scheme: String,
    pub auth: String,
}

impl SchemeAuth {
    /// Parse `"scheme:auth"`. Both halves are required.
    pub fn parse(input: &str) -> Result<Self> {
        match input.split_once(':') {
            Some((scheme, auth)) if !scheme.is_empty() && !auth.is_empty() => Ok(Self {
                scheme: scheme.to_string(),
                auth: auth.to_string(),
            }),
            _ => Err(CoordError::Config(
                "scheme auth expected format is 'scheme:auth'".into(),
            )),
        }
    }
}

/// An ACL identity in `scheme:id` form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeId {
    pub scheme: String,
    pub id: String,
}

impl SchemeId {
    /// Parse `"scheme:id"`. The id may be empty (as for the `auth` scheme).
    pub fn parse(input: &str) -> Result<Self> {
        match input.split_once(':') {
            Some((scheme, id)) if !scheme.is_empty() => Ok(Self {
                scheme: scheme.to_string(),
                id: id.to_string(),
            }),
            _ => Err(CoordError::Config(
                "scheme id expected format is 'scheme:id'".into(),
            )),
        }
    }
}

impl Default for SchemeId {
    fn default() -> Self {
        Self {
            scheme: "world".into(),
            id: "anyone".into(),
        }
    }
}

/// Settings for dialing a coordination cluster.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// `host:port` addresses of the ensemble members.
    pub servers: Vec<String>,
    /// Session timeout negotiated with the ensemble.
    #[serde(with = "millis")]
    pub session_timeout: Duration,
    /// Optional credentials (`scheme:auth`) added right after connecting.
    pub auth: Option<String>,
    /// Identity (`scheme:id`) used by [`ClusterConfig::default_acl`].
    pub default_id: Option<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            servers: vec![DEFAULT_ADDR.to_string()],
            session_timeout: Duration::from_secs(1),
            auth: None,
            default_id: None,
        }
    }
}

impl ClusterConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input).map_err(|e| CoordError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the servers list is usable and the credential strings parse.
    pub fn validate(&self) -> Result<()> {
        if self.servers.is_empty() || self.servers.iter().any(|s| s.trim().is_empty()) {
            return Err(CoordError::Config("at least one server address is required".into()));
        }
        if self.session_timeout.is_zero() {
            return Err(CoordError::Config("session timeout must be positive".into()));
        }
        self.scheme_auth()?;
        self.scheme_id()?;
        Ok(())
    }

    /// The parsed `auth` credentials, if configured.
    pub fn scheme_auth(&self) -> Result<Option<SchemeAuth>> {
        self.auth.as_deref().map(SchemeAuth::parse).transpose()
    }

    /// The parsed default identity, falling back to `world:anyone`.
    pub fn scheme_id(&self) -> Result<SchemeId> {
        Ok(self
            .default_id
            .as_deref()
            .map(SchemeId::parse)
            .transpose()?
            .unwrap_or_default())
    }

    /// A single-entry ACL list granting `perms` to the default identity.
    pub fn default_acl(&self, perms: i32) -> Result<Vec<Acl>> {
        let id = self.scheme_id()?;
        Ok(vec![Acl::new(perms, id.scheme, id.id)])
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
