//! Coordination-store clients.
//!
//! A [`ConfigStore`] returns a full snapshot of the configuration tree
//! below a root path, keyed by logical path relative to that root
//! (`"tenants/acme.yaml"`). The monitor turns successive snapshots into
//! change notifications; stores know nothing about listeners.
//!
//! Provides [`MemoryStore`] and [`DirectoryStore`], plus a Redis store
//! gated by the `redis` feature.

pub mod directory;
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_store;

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::error::ConfigGateError;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

pub type Snapshot = BTreeMap<String, Bytes>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigVersion {
    Hash(String),
}

impl ConfigVersion {
    /// First eight hex characters, for logs and health output.
    #[must_use]
    pub fn short(&self) -> &str {
        match self {
            Self::Hash(h) => h.get(..8).unwrap_or(h),
        }
    }
}

// async_trait is required here because ConfigStore is used as Arc<dyn ConfigStore>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Verify the store is reachable and `root` exists.
    async fn check(&self, _root: &str) -> Result<(), ConfigGateError> {
        Ok(())
    }

    async fn snapshot(&self, root: &str) -> Result<Snapshot, ConfigGateError>;
}

/// Strip leading and trailing slashes: `"/services/demo/"` -> `"services/demo"`.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

/// SHA-256 over every `(path, content)` pair in key order.
#[must_use]
pub fn snapshot_version(snapshot: &Snapshot) -> ConfigVersion {
    let mut hasher = Sha256::new();
    for (path, data) in snapshot {
        hasher.update((path.len() as u64).to_be_bytes());
        hasher.update(path.as_bytes());
        hasher.update((data.len() as u64).to_be_bytes());
        hasher.update(data);
    }
    ConfigVersion::Hash(format!("{:x}", hasher.finalize()))
}
