//! Process settings: file loading, CLI overrides and validation.
//!
//! Settings come from an optional YAML, JSON or TOML file (format chosen
//! by extension and gated by feature flags), auto-detected in the working
//! directory when no path is given. Command-line flags are applied on top
//! by the `run` command.

pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use crate::error::ConfigGateError;
use model::Settings;

const CANDIDATES: [&str; 4] = [
    "configgate.yaml",
    "configgate.yml",
    "configgate.json",
    "configgate.toml",
];

/// Parse a settings string based on file extension.
pub fn parse_settings_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Settings, ConfigGateError> {
    let parse_error = |source: Box<dyn std::error::Error + Send + Sync>| {
        ConfigGateError::SettingsParse {
            path: path_display.to_string(),
            source,
        }
    };

    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| parse_error(Box::new(e))),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| parse_error(Box::new(e))),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| parse_error(Box::new(e))),

        other => Err(ConfigGateError::UnsupportedFormat(other.to_string())),
    }
}

/// Read, parse and validate a settings file.
pub async fn load_file(path: &Path) -> Result<Settings, ConfigGateError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigGateError::SettingsFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigGateError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let settings = parse_settings_str(ext, &content, &path.display().to_string())?;
    validation::validate(&settings)
        .map_err(|errors| ConfigGateError::SettingsValidation { errors })?;
    Ok(settings)
}

/// Load `explicit` if given, else the first auto-detected candidate, else
/// defaults.
pub async fn resolve(explicit: Option<&Path>) -> Result<Settings, ConfigGateError> {
    if let Some(path) = explicit {
        return load_file(path).await;
    }

    for name in &CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected settings file");
            return load_file(&path).await;
        }
    }

    Ok(Settings::default())
}
