use async_trait::async_trait;

use super::LifecycleStep;
use crate::error::ConfigGateError;

/// Ordered, fail-fast sequence of steps. Nests, since it is a step itself.
pub struct CompositeLifecycleStep {
    name: String,
    steps: Vec<Box<dyn LifecycleStep>>,
}

impl CompositeLifecycleStep {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn add_step(&mut self, step: impl LifecycleStep + 'static) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[async_trait]
impl LifecycleStep for CompositeLifecycleStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self) -> Result<(), ConfigGateError> {
        let total = self.steps.len();
        for (i, step) in self.steps.iter().enumerate() {
            tracing::debug!(
                operation = %self.name,
                step = i + 1,
                total,
                "{}", step.name()
            );
            if let Err(e) = step.execute().await {
                tracing::error!(
                    operation = %self.name,
                    step = step.name(),
                    error = %e,
                    "lifecycle step failed, aborting remaining steps"
                );
                return Err(e);
            }
        }
        tracing::debug!(operation = %self.name, total, "lifecycle steps completed");
        Ok(())
    }
}
