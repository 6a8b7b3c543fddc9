//! Orchestrator that gates a service on its distributed configuration.
//!
//! [`ConfigurableMicroservice`] owns one configuration monitor and the
//! shared [`ConfigurationStatus`]. `initialize` creates the monitor,
//! registers a [`ReadinessListener`] with it and runs the ordered
//! init-then-start sequence; `terminate` stops and tears the monitor down.
//! Callers block startup on [`wait_for_configuration_ready`], a bounded
//! poll of the configuration state.
//!
//! [`wait_for_configuration_ready`]: ConfigurableMicroservice::wait_for_configuration_ready

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::time::Instant;

use super::state::ConfigurationState;
use super::status::{ChangeCounts, ConfigurationStatus, ReadinessListener};
use super::ConfigurationMonitor;
use crate::error::ConfigGateError;
use crate::lifecycle::{
    ComponentLifecycleStep, ComponentStatus, CompositeLifecycleStep, LifecycleComponent,
    LifecycleStep,
};

/// Max wait time for configuration.
pub const MAX_CONFIGURATION_WAIT: Duration = Duration::from_secs(30);

/// Interval between configuration state checks while waiting.
pub const CONFIGURATION_POLL_INTERVAL: Duration = Duration::from_secs(1);

const MONITOR_LABEL: &str = "Configuration Monitor";

/// Creates the configuration monitor during `initialize`.
pub trait MonitorFactory: Send + Sync {
    fn create(&self) -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError>;
}

impl<F> MonitorFactory for F
where
    F: Fn() -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError> + Send + Sync,
{
    fn create(&self) -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError> {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSettings {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            max_wait: MAX_CONFIGURATION_WAIT,
            poll_interval: CONFIGURATION_POLL_INTERVAL,
        }
    }
}

pub struct ConfigurableMicroservice {
    name: String,
    factory: Box<dyn MonitorFactory>,
    monitor: RwLock<Option<Arc<dyn ConfigurationMonitor>>>,
    status: Arc<ConfigurationStatus>,
    lifecycle: Mutex<ComponentStatus>,
    readiness: ReadinessSettings,
    cancel: watch::Sender<bool>,
}

impl ConfigurableMicroservice {
    #[must_use]
    pub fn new(name: impl Into<String>, factory: impl MonitorFactory + 'static) -> Self {
        Self::with_readiness(name, factory, ReadinessSettings::default())
    }

    #[must_use]
    pub fn with_readiness(
        name: impl Into<String>,
        factory: impl MonitorFactory + 'static,
        readiness: ReadinessSettings,
    ) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            name: name.into(),
            factory: Box::new(factory),
            monitor: RwLock::new(None),
            status: Arc::new(ConfigurationStatus::new()),
            lifecycle: Mutex::new(ComponentStatus::Created),
            readiness,
            cancel,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn status(&self) -> ComponentStatus {
        *self.lifecycle.lock()
    }

    #[must_use]
    pub fn configuration_state(&self) -> ConfigurationState {
        self.status.state()
    }

    /// Record the judgment on the loaded configuration. Terminal states
    /// are final; see [`ConfigurationState::can_transition_to`].
    pub fn set_configuration_state(
        &self,
        state: ConfigurationState,
    ) -> Result<ConfigurationState, ConfigGateError> {
        let previous = self.status.set_state(state)?;
        if previous != state {
            tracing::info!(service = %self.name, from = %previous, to = %state, "configuration state changed");
        }
        Ok(previous)
    }

    #[must_use]
    pub fn is_configuration_cache_ready(&self) -> bool {
        self.status.is_cache_ready()
    }

    #[must_use]
    pub fn configuration_changes(&self) -> ChangeCounts {
        self.status.changes()
    }

    #[must_use]
    pub fn configuration_monitor(&self) -> Option<Arc<dyn ConfigurationMonitor>> {
        self.monitor.read().clone()
    }

    pub fn configuration_data_for(&self, path: &str) -> Result<Bytes, ConfigGateError> {
        if !self.is_configuration_cache_ready() {
            return Err(ConfigGateError::ConfigurationNotReady);
        }
        let monitor = self
            .configuration_monitor()
            .ok_or(ConfigGateError::MonitorNotCreated)?;
        monitor.configuration_data_for(path)
    }

    /// Create, initialize and start the configuration monitor.
    ///
    /// Fails with [`ConfigGateError::LifecycleStepFailed`] if either monitor
    /// step fails; a failed initialize never attempts the start step.
    pub async fn initialize(&self) -> Result<(), ConfigGateError> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if *lifecycle != ComponentStatus::Created {
                return Err(ConfigGateError::InvalidComponentState {
                    component: self.name.clone(),
                    action: "initialize",
                    status: *lifecycle,
                });
            }
            *lifecycle = ComponentStatus::Initializing;
        }
        tracing::info!(service = %self.name, "initializing microservice");

        let result = self.initialize_configuration_monitor().await;
        *self.lifecycle.lock() = if result.is_ok() {
            ComponentStatus::Initialized
        } else {
            ComponentStatus::Error
        };
        result
    }

    async fn initialize_configuration_monitor(&self) -> Result<(), ConfigGateError> {
        let monitor: Arc<dyn LifecycleComponent> = self.create_configuration_monitor()?;

        let mut initialize = CompositeLifecycleStep::new(format!("Initialize {}", self.name));
        initialize
            .add_step(ComponentLifecycleStep::initialize(
                monitor.clone(),
                MONITOR_LABEL,
                "Unable to initialize configuration monitor",
                true,
            ))
            .add_step(ComponentLifecycleStep::start(
                monitor,
                MONITOR_LABEL,
                "Unable to start configuration monitor",
                true,
            ));

        initialize.execute().await
    }

    fn create_configuration_monitor(
        &self,
    ) -> Result<Arc<dyn ConfigurationMonitor>, ConfigGateError> {
        let monitor = self.factory.create()?;
        monitor.add_listener(Arc::new(ReadinessListener::new(
            self.name.clone(),
            self.status.clone(),
        )));
        *self.monitor.write() = Some(monitor.clone());
        Ok(monitor)
    }

    /// Stop then terminate the configuration monitor.
    ///
    /// Safe on an instance that was never initialized or never loaded any
    /// configuration, and safe to call twice. Also cancels any pending
    /// [`wait_for_configuration_ready`](Self::wait_for_configuration_ready).
    pub async fn terminate(&self) -> Result<(), ConfigGateError> {
        *self.lifecycle.lock() = ComponentStatus::Stopping;
        self.cancel_wait();

        let monitor = self.monitor.write().take();
        let Some(monitor) = monitor else {
            tracing::debug!(service = %self.name, "no configuration monitor to terminate");
            *self.lifecycle.lock() = ComponentStatus::Terminated;
            return Ok(());
        };
        let monitor: Arc<dyn LifecycleComponent> = monitor;

        let mut stop = CompositeLifecycleStep::new(format!("Stop {}", self.name));
        stop.add_step(ComponentLifecycleStep::stop(monitor.clone(), MONITOR_LABEL));
        let result = match stop.execute().await {
            Ok(()) => monitor.terminate().await,
            Err(e) => Err(e),
        };

        *self.lifecycle.lock() = if result.is_ok() {
            ComponentStatus::Terminated
        } else {
            ComponentStatus::Error
        };
        tracing::info!(service = %self.name, "microservice terminated");
        result
    }

    /// Make a pending or future readiness wait return `Ok(())` immediately.
    pub fn cancel_wait(&self) {
        self.cancel.send_replace(true);
    }

    /// Block until configuration is known-good, known-failed, or the
    /// deadline passes.
    ///
    /// Returns `Ok(())` on [`ConfigurationState::Succeeded`], and also when
    /// the wait is cancelled through [`cancel_wait`](Self::cancel_wait):
    /// a cancelled wait means the service is shutting down.
    pub async fn wait_for_configuration_ready(&self) -> Result<(), ConfigGateError> {
        let mut cancelled = self.cancel.subscribe();
        if *cancelled.borrow_and_update() {
            tracing::info!(service = %self.name, "configuration wait cancelled");
            return Ok(());
        }

        tracing::info!(
            service = %self.name,
            max_wait_secs = self.readiness.max_wait.as_secs(),
            "waiting for configuration to be loaded"
        );
        let started = Instant::now();
        let deadline = started + self.readiness.max_wait;

        loop {
            // A failure recorded before the deadline wins over the timeout.
            let state = self.configuration_state();
            if state == ConfigurationState::Failed {
                return Err(ConfigGateError::ConfigurationFailed);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ConfigGateError::ConfigurationTimeout {
                    waited: started.elapsed(),
                });
            }
            if state == ConfigurationState::Succeeded {
                tracing::info!(service = %self.name, "configuration loaded successfully");
                return Ok(());
            }

            let nap = self.readiness.poll_interval.min(deadline - now);
            tokio::select! {
                () = tokio::time::sleep(nap) => {}
                _ = cancelled.changed() => {
                    tracing::info!(service = %self.name, "configuration wait cancelled");
                    return Ok(());
                }
            }
        }
    }
}
