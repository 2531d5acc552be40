//! Flat JSON override merging onto an existing configuration value.

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// Applies a flat JSON object of field overrides onto `base`.
///
/// Keys must name serialized fields of `T`; unknown keys are rejected so a
/// misspelled hyperparameter never silently falls back to its default.
#[tracing::instrument(level = "debug", skip(base, overrides))]
pub fn apply_json_overrides<T>(base: &T, overrides: &Value) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let overrides = overrides
        .as_object()
        .context("config overrides must be a JSON object")?;
    let mut merged = serde_json::to_value(base).context("failed to serialize base config")?;
    let fields = merged
        .as_object_mut()
        .context("config must serialize as a JSON object")?;

    for (key, value) in overrides {
        if !fields.contains_key(key) {
            bail!("unknown config field '{key}'");
        }
        tracing::trace!(field = key.as_str(), "applying config override");
        fields.insert(key.clone(), value.clone());
    }

    serde_json::from_value(merged).context("config overrides have invalid field values")
}

/// Parses a `key=value` assignment into a one-field override.
///
/// The value is read as JSON and falls back to a plain string, so
/// `tau=0.8`, `use_q_centering=false` and `output_dir=runs/a` all work.
pub fn parse_key_value_override(raw: &str) -> Result<(String, Value)> {
    let (key, value) = split_assignment(raw)?;
    Ok((key.to_string(), parse_override_value(value)))
}

/// Applies `key=value` assignments onto `base`, later assignments winning.
///
/// Fields that currently hold a string take the raw text verbatim unless it
/// is itself a quoted JSON string, so `output_dir=123` stays a path.
#[tracing::instrument(level = "debug", skip(base))]
pub fn apply_key_value_overrides<T>(base: &T, assignments: &[String]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let current = serde_json::to_value(base).context("failed to serialize base config")?;
    let mut fields = Map::new();
    for raw in assignments {
        let (key, text) = split_assignment(raw)?;
        let value = match current.get(key) {
            Some(Value::String(_)) => match serde_json::from_str::<Value>(text) {
                Ok(Value::String(quoted)) => Value::String(quoted),
                _ => Value::String(text.to_string()),
            },
            _ => parse_override_value(text),
        };
        fields.insert(key.to_string(), value);
    }
    apply_json_overrides(base, &Value::Object(fields))
}

fn split_assignment(raw: &str) -> Result<(&str, &str)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("override '{raw}' must use key=value form"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("override '{raw}' has an empty key");
    }
    Ok((key, value.trim()))
}

fn parse_override_value(text: &str) -> Value {
    serde_json::from_str::<Value>(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
