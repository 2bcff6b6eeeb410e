//! Content-derived file identities
//!
//! Every piece of per-file state (dataset, annotations, last page) is
//! partitioned by a [`FileIdentity`]. The identity is built from the file
//! name, the byte length and a digest of the content, so re-importing the
//! same bytes under the same name finds the same state again.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Digest value used when no content digest is available.
pub const NO_DIGEST: &str = "no-crypto";

/// Reserved identity for state recorded while no file is loaded.
pub const GLOBAL_KEY: &str = "global";

/// Stable partition key for all per-file state
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileIdentity(String);

impl FileIdentity {
    /// Wrap an already-formed key, e.g. one read back from a store
    pub fn from_key(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The identity used when no file has been imported
    pub fn global() -> Self {
        Self(GLOBAL_KEY.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_KEY
    }

    /// Whether this identity was built without a content digest.
    ///
    /// Degraded identities only distinguish files by name and size.
    pub fn is_degraded(&self) -> bool {
        self.0.ends_with(&format!("_{NO_DIGEST}"))
    }
}

impl fmt::Display for FileIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A digest primitive over raw file content
pub trait ContentDigest: Send + Sync {
    /// Lowercase hex digest of `content`
    fn hex_digest(&self, content: &[u8]) -> String;
}

/// SHA-256 content digest
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Digest;

impl ContentDigest for Sha256Digest {
    fn hex_digest(&self, content: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content);
        hex::encode(hasher.finalize())
    }
}

/// Turns raw file content into a [`FileIdentity`]
pub struct IdentityResolver {
    digest: Option<Box<dyn ContentDigest>>,
}

impl Default for IdentityResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityResolver {
    /// Resolver backed by SHA-256
    pub fn new() -> Self {
        Self::with_digest(Box::new(Sha256Digest))
    }

    pub fn with_digest(digest: Box<dyn ContentDigest>) -> Self {
        Self { digest: Some(digest) }
    }

    /// Resolver for runtimes without a digest primitive.
    ///
    /// Identities degrade to name+size granularity.
    pub fn without_digest() -> Self {
        Self { digest: None }
    }

    /// Resolve the identity of a file.
    ///
    /// `size` is the declared byte length of the file.
    pub fn resolve(&self, name: &str, size: u64, content: &[u8]) -> FileIdentity {
        let hash = match &self.digest {
            Some(digest) => digest.hex_digest(content),
            None => {
                warn!(file = name, "No content digest available, identity degraded to name and size");
                NO_DIGEST.to_string()
            }
        };

        FileIdentity(format!("{}_{}_{}", name, size, hash))
    }
}
