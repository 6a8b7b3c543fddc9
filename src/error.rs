//! Unified error types for configgate.
//!
//! Defines [`ConfigGateError`] (the main crate error enum) and
//! [`ValidationError`] for settings and required-path validation
//! failures. Both use `thiserror`-style `Display` output. Error messages
//! include contextual hints to guide the operator toward a fix.

use std::path::PathBuf;
use std::time::Duration;

use crate::configuration::state::ConfigurationState;
use crate::lifecycle::ComponentStatus;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub scope: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {} - {}", self.scope, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

pub(crate) fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigGateError {
    #[error("Microservice not configured within allowable timeframe ({}s).", waited.as_secs())]
    ConfigurationTimeout { waited: Duration },

    #[error("Microservice configuration failed.")]
    ConfigurationFailed,

    #[error("Configuration cache not initialized.")]
    ConfigurationNotReady,

    #[error("{message} (step '{step}'): {source}")]
    LifecycleStepFailed {
        step: String,
        message: String,
        #[source]
        source: Box<ConfigGateError>,
    },

    #[error("Invalid configuration state transition: {from} -> {to}")]
    InvalidStateTransition {
        from: ConfigurationState,
        to: ConfigurationState,
    },

    #[error("No configuration found for path '{path}'")]
    ConfigurationPathNotFound { path: String },

    #[error("Configuration monitor has not been created (call initialize first)")]
    MonitorNotCreated,

    #[error("Cannot {action} {component} while it is {status}")]
    InvalidComponentState {
        component: String,
        action: &'static str,
        status: ComponentStatus,
    },

    #[error("Configuration store '{store}' is unavailable: {reason}")]
    StoreUnavailable { store: &'static str, reason: String },

    #[error("Configuration store error ({backend}): {source}")]
    Store {
        backend: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("No configuration store selected.\n\n  {hint}")]
    NoConfigStore { hint: String },

    #[error("Settings file not found: {}", path.display())]
    SettingsFileNotFound { path: PathBuf },

    #[error("Settings parse error in {path}:\n  {source}")]
    SettingsParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Settings validation failed:\n{}", format_errors(.errors))]
    SettingsValidation { errors: Vec<ValidationError> },

    #[error("Unsupported settings format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display_includes_suggestion() {
        let err = ValidationError {
            scope: "settings".into(),
            field: "root".into(),
            message: "root must start with '/'".into(),
            suggestion: Some("did you mean '/services/demo'?".into()),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("root must start with '/'"));
        assert!(rendered.ends_with("(did you mean '/services/demo'?)"));
    }

    #[test]
    fn lifecycle_step_failure_carries_cause() {
        let err = ConfigGateError::LifecycleStepFailed {
            step: "Initialize Configuration Monitor".into(),
            message: "Unable to initialize configuration monitor".into(),
            source: Box::new(ConfigGateError::StoreUnavailable {
                store: "directory",
                reason: "missing".into(),
            }),
        };
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(
            source.as_deref(),
            Some("Configuration store 'directory' is unavailable: missing")
        );
        assert!(err
            .to_string()
            .starts_with("Unable to initialize configuration monitor"));
    }

    #[test]
    fn timeout_reports_whole_seconds() {
        let err = ConfigGateError::ConfigurationTimeout {
            waited: Duration::from_millis(30_400),
        };
        assert!(err.to_string().contains("(30s)"));
    }
}
