//! Polling configuration monitor over a [`ConfigStore`].
//!
//! [`StoreMonitor`] implements [`ConfigurationMonitor`]. Once started it
//! runs a background task that snapshots the store every poll interval.
//! The first successful snapshot is delivered to listeners as one
//! `added` event per path followed by a single cache-initialized signal;
//! later snapshots are diffed against the cache and only changed paths are
//! reported. A failed poll keeps the current cache and is retried on the
//! next tick.

mod diff;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::configuration::{ConfigurationListener, ConfigurationMonitor, MonitorFactory};
use crate::error::ConfigGateError;
use crate::lifecycle::{ComponentStatus, LifecycleComponent};
use crate::store::{normalize_path, snapshot_version, ConfigStore, ConfigVersion, Snapshot};
use diff::{diff, Change};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

struct WatchTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct MonitorInner {
    name: String,
    store: Arc<dyn ConfigStore>,
    root: String,
    poll_interval: Duration,
    cache: RwLock<Snapshot>,
    version: RwLock<Option<ConfigVersion>>,
    listeners: RwLock<Vec<Arc<dyn ConfigurationListener>>>,
    cache_initialized: AtomicBool,
}

pub struct StoreMonitor {
    inner: Arc<MonitorInner>,
    status: Mutex<ComponentStatus>,
    task: Mutex<Option<WatchTask>>,
}

impl StoreMonitor {
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>, root: &str, poll_interval: Duration) -> Self {
        let root = normalize_path(root).to_string();
        Self {
            inner: Arc::new(MonitorInner {
                name: format!("configuration monitor ({}:/{root})", store.name()),
                store,
                root,
                poll_interval,
                cache: RwLock::new(Snapshot::new()),
                version: RwLock::new(None),
                listeners: RwLock::new(Vec::new()),
                cache_initialized: AtomicBool::new(false),
            }),
            status: Mutex::new(ComponentStatus::Created),
            task: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn status(&self) -> ComponentStatus {
        *self.status.lock()
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.inner.root
    }

    #[must_use]
    pub fn version(&self) -> Option<ConfigVersion> {
        self.inner.version.read().clone()
    }

    #[must_use]
    pub fn cached_paths(&self) -> Vec<String> {
        self.inner.cache.read().keys().cloned().collect()
    }

    /// Move from one of `allowed` to `next`, or report the current status.
    fn transition(
        &self,
        action: &'static str,
        allowed: &[ComponentStatus],
        next: ComponentStatus,
    ) -> Result<(), ConfigGateError> {
        let mut status = self.status.lock();
        if !allowed.contains(&*status) {
            return Err(ConfigGateError::InvalidComponentState {
                component: self.inner.name.clone(),
                action,
                status: *status,
            });
        }
        *status = next;
        Ok(())
    }
}

#[async_trait]
impl LifecycleComponent for StoreMonitor {
    fn component_name(&self) -> &str {
        &self.inner.name
    }

    async fn initialize(&self) -> Result<(), ConfigGateError> {
        self.transition(
            "initialize",
            &[ComponentStatus::Created],
            ComponentStatus::Initializing,
        )?;
        match self.inner.store.check(&self.inner.root).await {
            Ok(()) => {
                *self.status.lock() = ComponentStatus::Initialized;
                tracing::debug!(monitor = %self.inner.name, "configuration monitor initialized");
                Ok(())
            }
            Err(e) => {
                *self.status.lock() = ComponentStatus::Error;
                Err(e)
            }
        }
    }

    async fn start(&self) -> Result<(), ConfigGateError> {
        self.transition(
            "start",
            &[ComponentStatus::Initialized, ComponentStatus::Stopped],
            ComponentStatus::Started,
        )?;

        let (shutdown, shutdown_rx) = watch::channel(false);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            watch_loop(inner, shutdown_rx).await;
        });
        *self.task.lock() = Some(WatchTask { shutdown, handle });

        tracing::info!(
            monitor = %self.inner.name,
            poll_interval_secs = self.inner.poll_interval.as_secs(),
            "configuration monitor started"
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), ConfigGateError> {
        let task = self.task.lock().take();
        let Some(task) = task else {
            tracing::debug!(monitor = %self.inner.name, "configuration monitor not running");
            return Ok(());
        };

        *self.status.lock() = ComponentStatus::Stopping;
        task.shutdown.send_replace(true);
        if let Err(e) = task.handle.await {
            tracing::error!(monitor = %self.inner.name, error = %e, "configuration watch task failed");
        }
        *self.status.lock() = ComponentStatus::Stopped;
        tracing::info!(monitor = %self.inner.name, "configuration monitor stopped");
        Ok(())
    }

    async fn terminate(&self) -> Result<(), ConfigGateError> {
        if self.status() == ComponentStatus::Terminated {
            return Ok(());
        }
        self.stop().await?;

        self.inner.cache_initialized.store(false, Ordering::Release);
        self.inner.cache.write().clear();
        *self.inner.version.write() = None;
        self.inner.listeners.write().clear();
        *self.status.lock() = ComponentStatus::Terminated;
        tracing::debug!(monitor = %self.inner.name, "configuration monitor terminated");
        Ok(())
    }
}

impl ConfigurationMonitor for StoreMonitor {
    fn add_listener(&self, listener: Arc<dyn ConfigurationListener>) {
        self.inner.listeners.write().push(listener);
    }

    fn configuration_data_for(&self, path: &str) -> Result<Bytes, ConfigGateError> {
        if !self.inner.cache_initialized.load(Ordering::Acquire) {
            return Err(ConfigGateError::ConfigurationNotReady);
        }
        let path = normalize_path(path);
        self.inner
            .cache
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ConfigGateError::ConfigurationPathNotFound {
                path: path.to_string(),
            })
    }
}

impl MonitorInner {
    async fn sync(&self) -> Result<(), ConfigGateError> {
        let snapshot = self.store.snapshot(&self.root).await?;
        let version = snapshot_version(&snapshot);

        if !self.cache_initialized.load(Ordering::Acquire) {
            let changes: Vec<Change> = snapshot
                .iter()
                .map(|(path, data)| Change::Added(path.clone(), data.clone()))
                .collect();
            let paths = changes.len();
            *self.cache.write() = snapshot;
            tracing::info!(
                monitor = %self.name,
                paths,
                version = version.short(),
                "initial configuration snapshot loaded"
            );
            *self.version.write() = Some(version);

            self.dispatch(&changes);
            self.cache_initialized.store(true, Ordering::Release);
            for listener in self.listeners() {
                listener.on_configuration_cache_initialized();
            }
            return Ok(());
        }

        if self.version.read().as_ref() == Some(&version) {
            return Ok(());
        }

        let changes = {
            let mut cache = self.cache.write();
            let changes = diff(&cache, &snapshot);
            *cache = snapshot;
            changes
        };
        tracing::debug!(
            monitor = %self.name,
            changes = changes.len(),
            version = version.short(),
            "configuration snapshot changed"
        );
        *self.version.write() = Some(version);
        self.dispatch(&changes);
        Ok(())
    }

    fn listeners(&self) -> Vec<Arc<dyn ConfigurationListener>> {
        self.listeners.read().clone()
    }

    fn dispatch(&self, changes: &[Change]) {
        if changes.is_empty() {
            return;
        }
        let listeners = self.listeners();
        for change in changes {
            for listener in &listeners {
                match change {
                    Change::Added(path, data) => listener.on_configuration_added(path, data),
                    Change::Updated(path, data) => listener.on_configuration_updated(path, data),
                    Change::Deleted(path) => listener.on_configuration_deleted(path),
                }
            }
        }
    }
}

async fn watch_loop(inner: Arc<MonitorInner>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(inner.poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => {
                tracing::debug!(monitor = %inner.name, "configuration watch loop shutting down");
                return;
            }
        }

        if let Err(e) = inner.sync().await {
            tracing::warn!(monitor = %inner.name, error = %e, "configuration poll failed, keeping current cache");
        }
    }
}

/// Builds a [`StoreMonitor`] for a fixed store and instance root.
pub struct StoreMonitorFactory {
    store: Arc<dyn ConfigStore>,
    root: String,
    poll_interval: Duration,
}

impl StoreMonitorFactory {
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>, root: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            store,
            root: root.into(),
            poll_interval,
        }
    }
}

impl MonitorFactory for StoreMonitorFactory {
    fn create(&self) -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError> {
        Ok(Arc::new(StoreMonitor::new(
            self.store.clone(),
            &self.root,
            self.poll_interval,
        )))
    }
}
