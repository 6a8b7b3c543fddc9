//! Named, failable startup/shutdown steps composed into ordered sequences.
//!
//! A [`LifecycleComponent`] is anything with an init/start/stop/terminate
//! lifecycle (the configuration monitor, for one). Work against components
//! is expressed as [`LifecycleStep`]s: [`ComponentLifecycleStep`] drives a
//! single transition of a single component, and [`CompositeLifecycleStep`]
//! runs a list of steps in order, stopping at the first required failure.

mod composite;
mod step;

pub use composite::CompositeLifecycleStep;
pub use step::{ComponentAction, ComponentLifecycleStep};

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ConfigGateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Created,
    Initializing,
    Initialized,
    Started,
    Stopping,
    Stopped,
    Terminated,
    Error,
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Terminated => "terminated",
            Self::Error => "in error",
        };
        f.write_str(label)
    }
}

// async_trait is required here because components are held as
// Arc<dyn LifecycleComponent> and native async fn in traits does not
// support dyn dispatch.
#[async_trait]
pub trait LifecycleComponent: Send + Sync {
    fn component_name(&self) -> &str;
    async fn initialize(&self) -> Result<(), ConfigGateError>;
    async fn start(&self) -> Result<(), ConfigGateError>;
    async fn stop(&self) -> Result<(), ConfigGateError>;
    async fn terminate(&self) -> Result<(), ConfigGateError>;
}

#[async_trait]
pub trait LifecycleStep: Send + Sync {
    fn name(&self) -> &str;
    async fn execute(&self) -> Result<(), ConfigGateError>;
}
