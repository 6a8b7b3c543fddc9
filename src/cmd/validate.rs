//! `configgate validate` -- check a settings file for errors.
//!
//! Parses and validates the settings file, reporting results in either
//! human-readable text or machine-readable JSON format.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::error::ConfigGateError;
use crate::settings::{parse_settings_str, validation};

pub async fn execute(args: &ValidateArgs) -> Result<(), ConfigGateError> {
    let path = &args.settings;

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigGateError::SettingsFileNotFound { path: path.clone() }
        } else {
            ConfigGateError::Io(e)
        }
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let settings = parse_settings_str(ext, &content, &path.display().to_string())?;

    if let Err(errors) = validation::validate(&settings) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => {
                let json_errors: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "field": e.field,
                            "message": e.message,
                            "suggestion": e.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": false,
                        "errors": json_errors,
                    })
                );
            }
        }
        return Err(ConfigGateError::SettingsValidation { errors });
    }

    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &settings)
            );
        }
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "name": settings.name,
                    "store": settings.store.kind(),
                    "root": settings.root,
                    "required_paths": settings.required_paths,
                })
            );
        }
    }

    Ok(())
}
