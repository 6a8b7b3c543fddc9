//! Configuration readiness core.
//!
//! Defines the [`ConfigurationListener`] callback surface and the
//! [`ConfigurationMonitor`] collaborator contract, the readiness
//! [`state`] machine, the shared [`status`] record fed by listener
//! callbacks, and the [`ConfigurableMicroservice`] orchestrator that ties
//! them to the lifecycle engine.

pub mod microservice;
pub mod state;
pub mod status;
pub mod validation;

use std::sync::Arc;

use bytes::Bytes;

use crate::error::ConfigGateError;
use crate::lifecycle::LifecycleComponent;

pub use microservice::{ConfigurableMicroservice, MonitorFactory, ReadinessSettings};
pub use state::ConfigurationState;
pub use status::{ChangeCounts, ConfigurationStatus, ReadinessListener};

/// Receives change notifications from a [`ConfigurationMonitor`].
///
/// Callbacks run on the monitor's watch task and may be concurrent with
/// any other thread in the service. Implementations must not block.
pub trait ConfigurationListener: Send + Sync {
    /// First full synchronization with the coordination store finished.
    fn on_configuration_cache_initialized(&self);
    fn on_configuration_added(&self, path: &str, data: &Bytes);
    fn on_configuration_updated(&self, path: &str, data: &Bytes);
    fn on_configuration_deleted(&self, path: &str);
}

/// Watches the coordination store and mirrors it into a local cache.
pub trait ConfigurationMonitor: LifecycleComponent {
    /// Listeners must be added before the monitor is started to see the
    /// cache-initialized signal.
    fn add_listener(&self, listener: Arc<dyn ConfigurationListener>);

    /// Cached content for a logical path, relative to the monitor root.
    fn configuration_data_for(&self, path: &str) -> Result<Bytes, ConfigGateError>;
}
