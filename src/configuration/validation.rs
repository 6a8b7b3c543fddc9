//! Required-path check that settles the configuration state.
//!
//! [`check_required_paths`] reports every required path that is missing or
//! empty in the configuration cache. [`settle_configuration_state`] waits
//! for the cache, runs the check and records `Succeeded` or `Failed` on
//! the microservice. Content is never parsed here.

use std::time::Duration;

use super::microservice::ConfigurableMicroservice;
use super::state::ConfigurationState;
use crate::error::{format_errors, ConfigGateError, ValidationError};

pub fn check_required_paths(
    service: &ConfigurableMicroservice,
    required: &[String],
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    for path in required {
        match service.configuration_data_for(path) {
            Ok(data) if data.is_empty() => errors.push(ValidationError {
                scope: "configuration".into(),
                field: path.clone(),
                message: "configuration is empty".into(),
                suggestion: None,
            }),
            Ok(_) => {}
            Err(ConfigGateError::ConfigurationPathNotFound { .. }) => {
                errors.push(ValidationError {
                    scope: "configuration".into(),
                    field: path.clone(),
                    message: "required configuration is missing".into(),
                    suggestion: Some(format!(
                        "create '{}' below the instance root",
                        path.trim_start_matches('/')
                    )),
                });
            }
            Err(e) => errors.push(ValidationError {
                scope: "configuration".into(),
                field: path.clone(),
                message: e.to_string(),
                suggestion: None,
            }),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Wait for the cache, then record whether the required paths are present.
///
/// Returns the state the microservice ends up in. If the state was already
/// terminal, it is left untouched.
pub async fn settle_configuration_state(
    service: &ConfigurableMicroservice,
    required: &[String],
    poll_interval: Duration,
) -> ConfigurationState {
    while !service.is_configuration_cache_ready() {
        tokio::time::sleep(poll_interval).await;
    }

    let verdict = match check_required_paths(service, required) {
        Ok(()) => {
            tracing::info!(
                service = service.name(),
                required = required.len(),
                "required configuration present"
            );
            ConfigurationState::Succeeded
        }
        Err(errors) => {
            tracing::error!(
                service = service.name(),
                "configuration rejected:\n{}",
                format_errors(&errors)
            );
            ConfigurationState::Failed
        }
    };

    if let Err(e) = service.set_configuration_state(verdict) {
        tracing::warn!(service = service.name(), error = %e, "configuration state already settled");
    }
    service.configuration_state()
}
