//! JSON and TOML trainer config files.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::overrides::apply_json_overrides;
use crate::trainer_args::TrainerArgs;

/// On-disk encoding of a trainer config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Toml => "toml",
        }
    }

    /// Infers the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            _ => bail!(
                "unsupported config file extension for {}; expected .json or .toml",
                path.display()
            ),
        }
    }
}

/// Parses config text into a flat JSON object of overrides.
pub fn parse_config_text(raw: &str, format: ConfigFormat) -> Result<Value> {
    let value = match format {
        ConfigFormat::Json => {
            serde_json::from_str::<Value>(raw).context("failed to parse JSON config")?
        }
        ConfigFormat::Toml => toml::from_str::<Value>(raw).context("failed to parse TOML config")?,
    };
    if !value.is_object() {
        bail!("{} config must be a table of fields", format.as_str());
    }
    Ok(value)
}

/// Reads a config file into a flat JSON object of overrides.
pub fn read_config_overrides(path: &Path) -> Result<Value> {
    let format = ConfigFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config_text(&raw, format)
        .with_context(|| format!("invalid config file {}", path.display()))
}

/// Loads, validates, and reports advisories for a trainer config file.
#[tracing::instrument(level = "debug")]
pub fn load_trainer_config<T: TrainerArgs>(path: &Path) -> Result<T> {
    let overrides = read_config_overrides(path)?;
    let config = apply_json_overrides(&T::default(), &overrides)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("config file {} failed validation", path.display()))?;

    for advisory in config.advisories() {
        tracing::warn!(
            trainer = T::TRAINER_NAME,
            advisory = advisory.as_str(),
            "{}",
            advisory.message()
        );
    }
    tracing::debug!(
        trainer = T::TRAINER_NAME,
        path = %path.display(),
        "loaded trainer config"
    );
    Ok(config)
}

/// Renders a config as pretty JSON or TOML.
pub fn render_config<T: TrainerArgs>(config: &T, format: ConfigFormat) -> Result<String> {
    match format {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).context("failed to render config as JSON")
        }
        ConfigFormat::Toml => {
            // TOML has no null. Omitted fields reload from `T::default()`, so a
            // null is only dropped when the default is null as well.
            let mut value = serde_json::to_value(config).context("failed to serialize config")?;
            let defaults =
                serde_json::to_value(T::default()).context("failed to serialize defaults")?;
            if let Some(object) = value.as_object_mut() {
                for (name, field) in object.iter() {
                    let default = defaults.get(name).unwrap_or(&Value::Null);
                    if field.is_null() && !default.is_null() {
                        bail!(
                            "field '{name}' is unset but defaults to {default}; TOML cannot encode this, render as JSON instead"
                        );
                    }
                }
                object.retain(|_, field| !field.is_null());
            }
            toml::to_string_pretty(&value).context("failed to render config as TOML")
        }
    }
}
