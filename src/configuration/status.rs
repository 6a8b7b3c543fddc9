//! Shared readiness record and the listener that feeds it.
//!
//! [`ConfigurationStatus`] publishes the configuration state, the
//! cache-ready flag and counters of observed changes through atomics, so
//! the monitor's callback thread and any number of readers never share a
//! lock. [`ReadinessListener`] is the value registered with the monitor:
//! it flips cache-ready once and suppresses mutation events until then.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::state::{ConfigurationState, StateCell};
use super::ConfigurationListener;
use crate::error::ConfigGateError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: u64,
    pub updated: u64,
    pub deleted: u64,
}

#[derive(Debug, Default)]
pub struct ConfigurationStatus {
    state: StateCell,
    cache_ready: AtomicBool,
    added: AtomicU64,
    updated: AtomicU64,
    deleted: AtomicU64,
}

impl ConfigurationStatus {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: StateCell::new(),
            cache_ready: AtomicBool::new(false),
            added: AtomicU64::new(0),
            updated: AtomicU64::new(0),
            deleted: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> ConfigurationState {
        self.state.load()
    }

    pub fn set_state(
        &self,
        next: ConfigurationState,
    ) -> Result<ConfigurationState, ConfigGateError> {
        self.state.transition(next)
    }

    #[must_use]
    pub fn is_cache_ready(&self) -> bool {
        self.cache_ready.load(Ordering::Acquire)
    }

    /// Returns `true` only for the call that actually flipped the flag.
    pub fn mark_cache_ready(&self) -> bool {
        self.cache_ready
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    #[must_use]
    pub fn changes(&self) -> ChangeCounts {
        ChangeCounts {
            added: self.added.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
        }
    }
}

pub struct ReadinessListener {
    service: String,
    status: Arc<ConfigurationStatus>,
}

impl ReadinessListener {
    #[must_use]
    pub fn new(service: impl Into<String>, status: Arc<ConfigurationStatus>) -> Self {
        Self {
            service: service.into(),
            status,
        }
    }
}

impl ConfigurationListener for ReadinessListener {
    fn on_configuration_cache_initialized(&self) {
        if !self.status.mark_cache_ready() {
            tracing::debug!(service = %self.service, "duplicate cache initialized signal ignored");
            return;
        }
        tracing::info!(service = %self.service, "configuration cache initialized");

        // Cache populated but content not yet judged. A judge may already
        // have settled the state; the transition check rejects that case.
        if let Err(e) = self.status.set_state(ConfigurationState::Loading) {
            tracing::debug!(service = %self.service, error = %e, "configuration state already settled");
        }
    }

    fn on_configuration_added(&self, path: &str, data: &Bytes) {
        if self.status.is_cache_ready() {
            self.status.added.fetch_add(1, Ordering::Relaxed);
            tracing::info!(service = %self.service, path, bytes = data.len(), "configuration added");
        }
    }

    fn on_configuration_updated(&self, path: &str, data: &Bytes) {
        if self.status.is_cache_ready() {
            self.status.updated.fetch_add(1, Ordering::Relaxed);
            tracing::info!(service = %self.service, path, bytes = data.len(), "configuration updated");
        }
    }

    fn on_configuration_deleted(&self, path: &str) {
        if self.status.is_cache_ready() {
            self.status.deleted.fetch_add(1, Ordering::Relaxed);
            tracing::info!(service = %self.service, path, "configuration deleted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener() -> (ReadinessListener, Arc<ConfigurationStatus>) {
        let status = Arc::new(ConfigurationStatus::new());
        (ReadinessListener::new("test", status.clone()), status)
    }

    #[test]
    fn mutations_before_cache_ready_are_ignored() {
        let (listener, status) = listener();
        let data = Bytes::from_static(b"x");
        for _ in 0..5 {
            listener.on_configuration_added("a", &data);
            listener.on_configuration_updated("a", &data);
            listener.on_configuration_deleted("a");
        }
        assert!(!status.is_cache_ready());
        assert_eq!(status.changes(), ChangeCounts::default());
        assert_eq!(status.state(), ConfigurationState::NotStarted);
    }

    #[test]
    fn mutations_after_cache_ready_are_counted_once_each() {
        let (listener, status) = listener();
        let data = Bytes::from_static(b"x");
        listener.on_configuration_cache_initialized();
        listener.on_configuration_added("a", &data);
        listener.on_configuration_updated("a", &data);
        listener.on_configuration_updated("a", &data);
        listener.on_configuration_deleted("a");

        assert_eq!(
            status.changes(),
            ChangeCounts {
                added: 1,
                updated: 2,
                deleted: 1
            }
        );
    }

    #[test]
    fn cache_initialized_moves_to_loading_once() {
        let (listener, status) = listener();
        listener.on_configuration_cache_initialized();
        assert!(status.is_cache_ready());
        assert_eq!(status.state(), ConfigurationState::Loading);

        status.set_state(ConfigurationState::Succeeded).unwrap();
        listener.on_configuration_cache_initialized();
        assert!(status.is_cache_ready());
        assert_eq!(status.state(), ConfigurationState::Succeeded);
    }

    #[test]
    fn cache_initialized_keeps_terminal_state() {
        let (listener, status) = listener();
        status.set_state(ConfigurationState::Failed).unwrap();
        listener.on_configuration_cache_initialized();
        assert!(status.is_cache_ready());
        assert_eq!(status.state(), ConfigurationState::Failed);
    }

    #[test]
    fn cache_initialized_after_judge_succeeded_keeps_success() {
        let (listener, status) = listener();
        status.set_state(ConfigurationState::Succeeded).unwrap();
        listener.on_configuration_cache_initialized();
        assert!(status.is_cache_ready());
        assert_eq!(status.state(), ConfigurationState::Succeeded);
        assert!(status.set_state(ConfigurationState::Loading).is_err());
    }

    #[test]
    fn mark_cache_ready_flips_exactly_once() {
        let status = ConfigurationStatus::new();
        assert!(status.mark_cache_ready());
        assert!(!status.mark_cache_ready());
        assert!(status.is_cache_ready());
    }
}
