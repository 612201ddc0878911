//! Hash providers used to map item names onto buckets.
//!
//! A [`HashProvider`] is a factory: the store asks it for a fresh
//! [`BucketHasher`] per lookup, so no hasher state is ever shared between
//! calls or threads.

use std::fmt;
use std::sync::Arc;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha512};

/// An incremental hash whose digest drives bucket selection.
pub trait BucketHasher: Send {
    fn update(&mut self, data: &[u8]);

    /// Consume the hasher and return the digest bytes.
    fn finish(self: Box<Self>) -> Vec<u8>;
}

/// Adapter from any RustCrypto [`Digest`] to [`BucketHasher`].
#[derive(Clone, Debug, Default)]
pub struct DigestHasher<D>(D);

impl<D: Digest + Send> BucketHasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        let DigestHasher(digest) = *self;
        Digest::finalize(digest).to_vec()
    }
}

impl BucketHasher for blake3::Hasher {
    fn update(&mut self, data: &[u8]) {
        blake3::Hasher::update(self, data);
    }

    fn finish(self: Box<Self>) -> Vec<u8> {
        self.finalize().as_bytes().to_vec()
    }
}

/// Factory producing a fresh hasher for every bucket computation.
#[derive(Clone)]
pub struct HashProvider(Arc<dyn Fn() -> Box<dyn BucketHasher> + Send + Sync>);

impl HashProvider {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn BucketHasher> + Send + Sync + 'static,
    {
        Self(Arc::new(factory))
    }

    /// Provider for any default-constructible RustCrypto digest.
    pub fn digest<D>() -> Self
    where
        D: Digest + Default + Send + 'static,
    {
        Self::new(|| Box::new(DigestHasher(D::default())))
    }

    pub fn hasher(&self) -> Box<dyn BucketHasher> {
        (self.0)()
    }

    /// Hash `data` with a fresh hasher.
    pub fn hash(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finish()
    }
}

impl Default for HashProvider {
    fn default() -> Self {
        HashAlgorithm::default().provider()
    }
}

impl fmt::Debug for HashProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HashProvider(..)")
    }
}

/// Built-in hash algorithms, selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha1,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub fn provider(self) -> HashProvider {
        match self {
            HashAlgorithm::Md5 => HashProvider::digest::<Md5>(),
            HashAlgorithm::Sha1 => HashProvider::digest::<Sha1>(),
            HashAlgorithm::Sha512 => HashProvider::digest::<Sha512>(),
            HashAlgorithm::Blake3 => HashProvider::new(|| Box::new(blake3::Hasher::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_lengths() {
        assert_eq!(HashAlgorithm::Md5.provider().hash(b"x").len(), 16);
        assert_eq!(HashAlgorithm::Sha1.provider().hash(b"x").len(), 20);
        assert_eq!(HashAlgorithm::Sha512.provider().hash(b"x").len(), 64);
        assert_eq!(HashAlgorithm::Blake3.provider().hash(b"x").len(), 32);
    }

    #[test]
    fn md5_known_vector() {
        let digest = HashAlgorithm::Md5.provider().hash(b"");
        assert_eq!(hex::encode(digest), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn incremental_matches_one_shot() {
        let provider = HashProvider::default();
        let mut hasher = provider.hasher();
        hasher.update(b"name-");
        hasher.update(b"42");
        assert_eq!(hasher.finish(), provider.hash(b"name-42"));
    }

    #[test]
    fn fresh_hasher_per_call() {
        let provider = HashAlgorithm::Sha1.provider();
        assert_eq!(provider.hash(b"same"), provider.hash(b"same"));
    }

    #[test]
    fn algorithm_from_config_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            algo: HashAlgorithm,
        }
        let w: Wrapper = toml::from_str("algo = \"sha512\"").unwrap();
        assert_eq!(w.algo, HashAlgorithm::Sha512);
    }
}
