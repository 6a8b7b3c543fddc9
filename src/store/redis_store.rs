//! Redis-backed coordination store.
//!
//! [`RedisStore`] keeps one key per configuration entry, named
//! `{root}/{path}`, and reads a snapshot with a `SCAN MATCH {root}/*`
//! followed by one `GET` per key over a multiplexed Tokio connection.

use async_trait::async_trait;
use bytes::Bytes;
use redis::AsyncCommands;
use tokio::sync::Mutex;

use super::{normalize_path, ConfigStore, Snapshot};
use crate::error::ConfigGateError;

/// Escape the glob metacharacters `SCAN MATCH` understands.
fn escape_pattern(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Logical path of `key` below `prefix`, or `None` if the key lies outside it.
fn logical_path(prefix: &str, key: &str) -> Option<String> {
    let relative = normalize_path(key.strip_prefix(prefix)?);
    (!relative.is_empty()).then(|| relative.to_string())
}

fn redis_error(e: redis::RedisError) -> ConfigGateError {
    ConfigGateError::Store {
        backend: "redis",
        source: Box::new(e),
    }
}

pub struct RedisStore {
    connection: Mutex<redis::aio::MultiplexedConnection>,
}

impl RedisStore {
    pub async fn new(url: &str) -> Result<Self, ConfigGateError> {
        let client = redis::Client::open(url).map_err(redis_error)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(redis_error)?;

        Ok(Self {
            connection: Mutex::new(connection),
        })
    }
}

#[async_trait]
impl ConfigStore for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn check(&self, _root: &str) -> Result<(), ConfigGateError> {
        let mut conn = self.connection.lock().await;
        let _: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(redis_error)?;
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    async fn snapshot(&self, root: &str) -> Result<Snapshot, ConfigGateError> {
        let root = normalize_path(root);
        let prefix = if root.is_empty() {
            String::new()
        } else {
            format!("{root}/")
        };

        let mut conn = self.connection.lock().await;
        let mut keys: Vec<String> = Vec::new();
        {
            let mut iter = conn
                .scan_match::<_, String>(format!("{}*", escape_pattern(&prefix)))
                .await
                .map_err(redis_error)?;
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
        }

        let mut snapshot = Snapshot::new();
        for key in keys {
            let Some(path) = logical_path(&prefix, &key) else {
                tracing::debug!(key = %key, prefix = %prefix, "skipping key outside configuration root");
                continue;
            };
            let value: Option<Vec<u8>> = conn.get(&key).await.map_err(redis_error)?;
            // Deleted between SCAN and GET.
            let Some(value) = value else { continue };
            snapshot.insert(path, Bytes::from(value));
        }
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::{escape_pattern, logical_path};

    #[test]
    fn plain_roots_are_unchanged() {
        assert_eq!(escape_pattern("services/orders/"), "services/orders/");
    }

    #[test]
    fn glob_characters_are_escaped() {
        assert_eq!(escape_pattern("svc*/"), "svc\\*/");
        assert_eq!(escape_pattern("a?[b]"), "a\\?\\[b\\]");
        assert_eq!(escape_pattern("x\\y"), "x\\\\y");
    }

    #[test]
    fn keys_outside_the_prefix_are_skipped() {
        assert_eq!(
            logical_path("services/orders/", "services/orders/tenants/acme.yaml").as_deref(),
            Some("tenants/acme.yaml")
        );
        assert_eq!(logical_path("svc*/", "svc/"), None);
        assert_eq!(logical_path("svc*/", "svcx/app.yaml"), None);
        assert_eq!(logical_path("services/orders/", "services/orders/"), None);
    }
}
