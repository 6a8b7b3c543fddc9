use std::sync::Arc;

use async_trait::async_trait;

use super::{LifecycleComponent, LifecycleStep};
use crate::error::ConfigGateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentAction {
    Initialize,
    Start,
    Stop,
}

impl ComponentAction {
    const fn verb(self) -> &'static str {
        match self {
            Self::Initialize => "Initialize",
            Self::Start => "Start",
            Self::Stop => "Stop",
        }
    }
}

/// One lifecycle transition of one component.
///
/// A required step turns a component failure into
/// [`ConfigGateError::LifecycleStepFailed`]; an optional step logs the
/// failure and reports success so the surrounding sequence continues.
pub struct ComponentLifecycleStep {
    component: Arc<dyn LifecycleComponent>,
    action: ComponentAction,
    name: String,
    error_message: String,
    required: bool,
}

impl ComponentLifecycleStep {
    #[must_use]
    pub fn new(
        component: Arc<dyn LifecycleComponent>,
        action: ComponentAction,
        label: &str,
        error_message: &str,
        required: bool,
    ) -> Self {
        Self {
            component,
            action,
            name: format!("{} {label}", action.verb()),
            error_message: error_message.to_string(),
            required,
        }
    }

    #[must_use]
    pub fn initialize(
        component: Arc<dyn LifecycleComponent>,
        label: &str,
        error_message: &str,
        required: bool,
    ) -> Self {
        Self::new(component, ComponentAction::Initialize, label, error_message, required)
    }

    #[must_use]
    pub fn start(
        component: Arc<dyn LifecycleComponent>,
        label: &str,
        error_message: &str,
        required: bool,
    ) -> Self {
        Self::new(component, ComponentAction::Start, label, error_message, required)
    }

    /// Stop steps are optional: shutdown keeps going past a component that
    /// fails to stop.
    #[must_use]
    pub fn stop(component: Arc<dyn LifecycleComponent>, label: &str) -> Self {
        let message = format!("Unable to stop {}", label.to_lowercase());
        Self::new(component, ComponentAction::Stop, label, &message, false)
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

#[async_trait]
impl LifecycleStep for ComponentLifecycleStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<(), ConfigGateError> {
        let result = match self.action {
            ComponentAction::Initialize => self.component.initialize().await,
            ComponentAction::Start => self.component.start().await,
            ComponentAction::Stop => self.component.stop().await,
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if self.required => Err(ConfigGateError::LifecycleStepFailed {
                step: self.name.clone(),
                message: self.error_message.clone(),
                source: Box::new(e),
            }),
            Err(e) => {
                tracing::warn!(
                    step = %self.name,
                    component = self.component.component_name(),
                    error = %e,
                    "{}", self.error_message
                );
                Ok(())
            }
        }
    }
}
