//! In-process coordination store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use super::{normalize_path, ConfigStore, Snapshot};
use crate::error::ConfigGateError;

/// Keys are full paths (`"services/demo/app.yaml"`); leading and trailing
/// slashes are ignored.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, data: impl Into<Bytes>) {
        self.entries
            .write()
            .insert(normalize_path(key).to_string(), data.into());
    }

    pub fn remove(&self, key: &str) -> Option<Bytes> {
        self.entries.write().remove(normalize_path(key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn snapshot(&self, root: &str) -> Result<Snapshot, ConfigGateError> {
        let root = normalize_path(root);
        let entries = self.entries.read();
        if root.is_empty() {
            return Ok(entries.clone());
        }

        let prefix = format!("{root}/");
        Ok(entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, data)| (key[prefix.len()..].to_string(), data.clone()))
            .collect())
    }
}
