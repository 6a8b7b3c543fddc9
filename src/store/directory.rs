//! Directory tree as a coordination store.
//!
//! [`DirectoryStore`] treats `<base>/<root>` as the configuration tree:
//! every regular file below it is one entry, keyed by its `/`-joined path
//! relative to the root. Hidden files and directories (leading `.`) are
//! skipped so editor swap files never surface as configuration.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::{normalize_path, ConfigStore, Snapshot};
use crate::error::ConfigGateError;

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    base: PathBuf,
}

impl DirectoryStore {
    #[must_use]
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    #[must_use]
    pub fn root_dir(&self, root: &str) -> PathBuf {
        let root = normalize_path(root);
        if root.is_empty() {
            self.base.clone()
        } else {
            self.base.join(root)
        }
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

fn logical_path(root_dir: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(root_dir).ok()?;
    let parts: Option<Vec<&str>> = relative.components().map(|c| c.as_os_str().to_str()).collect();
    Some(parts?.join("/"))
}

#[async_trait]
impl ConfigStore for DirectoryStore {
    fn name(&self) -> &'static str {
        "directory"
    }

    async fn check(&self, root: &str) -> Result<(), ConfigGateError> {
        let dir = self.root_dir(root);
        match tokio::fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ConfigGateError::StoreUnavailable {
                store: "directory",
                reason: format!("{} is not a directory", dir.display()),
            }),
            Err(e) => Err(ConfigGateError::StoreUnavailable {
                store: "directory",
                reason: format!("{}: {e}", dir.display()),
            }),
        }
    }

    async fn snapshot(&self, root: &str) -> Result<Snapshot, ConfigGateError> {
        let root_dir = self.root_dir(root);
        let mut snapshot = Snapshot::new();
        let mut pending = vec![root_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                if is_hidden(&entry.file_name()) {
                    continue;
                }
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    let Some(key) = logical_path(&root_dir, &path) else {
                        tracing::warn!(path = %path.display(), "skipping non UTF-8 configuration path");
                        continue;
                    };
                    let data = tokio::fs::read(&path).await?;
                    snapshot.insert(key, Bytes::from(data));
                }
            }
        }

        Ok(snapshot)
    }
}
