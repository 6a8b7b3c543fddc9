//! Settings validation with detailed error reporting.
//!
//! The [`validate`] function checks parsed [`Settings`] for problems such
//! as a relative root path, zero intervals, a readiness deadline shorter
//! than its poll interval, duplicate required paths and malformed store
//! URLs. Returns a list of [`ValidationError`] values with suggestions.

use std::collections::HashSet;

use url::Url;

use super::model::{Settings, StoreSettings};
use crate::error::ValidationError;

/// Validate the instance root path. Returns `Ok(())` or a human-readable error.
pub fn validate_root(root: &str) -> Result<(), String> {
    if root.is_empty() {
        return Err("root cannot be empty (use '/' for the store root)".into());
    }
    if !root.starts_with('/') {
        return Err(format!("root must start with '/' (did you mean '/{root}'?)"));
    }
    if root.split('/').any(|segment| segment == "..") {
        return Err("root cannot contain '..' segments".into());
    }
    Ok(())
}

/// Validate a Redis connection URL. Returns `Ok(())` or a human-readable error.
pub fn validate_redis_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => match parsed.scheme() {
            "redis" | "rediss" | "redis+unix" => Ok(()),
            scheme => Err(format!(
                "unsupported scheme '{scheme}' (expected redis or rediss)"
            )),
        },
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

fn error(field: &str, message: impl Into<String>, suggestion: Option<String>) -> ValidationError {
    ValidationError {
        scope: "settings".into(),
        field: field.into(),
        message: message.into(),
        suggestion,
    }
}

pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.name.trim().is_empty() {
        errors.push(error("name", "service name cannot be empty", None));
    }

    if let Err(msg) = validate_root(&settings.root) {
        let suggestion = (!settings.root.is_empty() && !settings.root.starts_with('/'))
            .then(|| format!("did you mean '/{}'?", settings.root));
        errors.push(error("root", msg, suggestion));
    }

    if settings.poll_interval_secs == 0 {
        errors.push(error(
            "poll_interval_secs",
            "poll interval must be at least 1 second",
            None,
        ));
    }

    let readiness = &settings.readiness;
    if readiness.poll_interval_secs == 0 {
        errors.push(error(
            "readiness.poll_interval_secs",
            "readiness poll interval must be at least 1 second",
            None,
        ));
    }
    if readiness.max_wait_secs < readiness.poll_interval_secs {
        errors.push(error(
            "readiness.max_wait_secs",
            format!(
                "max wait ({}s) is shorter than the poll interval ({}s)",
                readiness.max_wait_secs, readiness.poll_interval_secs
            ),
            Some("the default is 30 seconds".into()),
        ));
    }

    let mut seen = HashSet::new();
    for (i, path) in settings.required_paths.iter().enumerate() {
        let field = format!("required_paths[{i}]");
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            errors.push(error(&field, "required path cannot be empty", None));
        } else if !seen.insert(trimmed) {
            errors.push(error(&field, format!("duplicate required path '{path}'"), None));
        }
    }

    match &settings.store {
        StoreSettings::Directory { path } if path.as_os_str().is_empty() => {
            errors.push(error("store.path", "directory path cannot be empty", None));
        }
        StoreSettings::Redis { url } => {
            if let Err(msg) = validate_redis_url(url) {
                errors.push(error("store.url", msg, None));
            }
            if !cfg!(feature = "redis") {
                errors.push(error(
                    "store.type",
                    "redis store requested but this build has no redis support",
                    Some("rebuild with --features redis".into()),
                ));
            }
        }
        StoreSettings::Directory { .. } | StoreSettings::Memory => {}
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, settings: &Settings) -> String {
    let mut lines = vec![
        format!("  service:   {}", settings.name),
        format!("  store:     {}", describe_store(&settings.store)),
        format!("  root:      {}", settings.root),
        format!("  poll:      every {}s", settings.poll_interval_secs),
        format!(
            "  readiness: up to {}s, checked every {}s",
            settings.readiness.max_wait_secs, settings.readiness.poll_interval_secs
        ),
    ];
    if settings.required_paths.is_empty() {
        lines.push("  required:  (none)".into());
    } else {
        lines.push(format!("  required:  {}", settings.required_paths.join(", ")));
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}

fn describe_store(store: &StoreSettings) -> String {
    match store {
        StoreSettings::Directory { path } => format!("directory {}", path.display()),
        StoreSettings::Memory => "memory".into(),
        StoreSettings::Redis { url } => format!("redis {url}"),
    }
}
