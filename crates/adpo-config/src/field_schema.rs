//! Field help tables rendered by the CLI and checked against serialized defaults.

use serde::Serialize;
use serde_json::Value;

/// Semantic type of a configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Float,
    Integer,
    Bool,
    String,
    Enum,
    OptionalFloat,
    OptionalInteger,
    FloatList,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Float => "float",
            FieldKind::Integer => "integer",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Enum => "enum",
            FieldKind::OptionalFloat => "optional_float",
            FieldKind::OptionalInteger => "optional_integer",
            FieldKind::FloatList => "float_list",
        }
    }
}

/// Name, type, default, and help text for one configuration field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: Value,
    pub help: &'static str,
}

/// Static help entry: field name, kind, and help text.
pub(crate) type FieldHelp = (&'static str, FieldKind, &'static str);

/// Joins static help entries with the serialized defaults of a config.
///
/// Entries whose name is missing from `defaults` get a `null` default; the
/// per-config tests keep the two in sync.
pub(crate) fn build_field_specs(entries: &[FieldHelp], defaults: &Value) -> Vec<FieldSpec> {
    entries
        .iter()
        .map(|&(name, kind, help)| FieldSpec {
            name,
            kind,
            default: defaults.get(name).cloned().unwrap_or(Value::Null),
            help,
        })
        .collect()
}

/// Renders specs as an aligned plain-text table.
pub fn render_field_table(specs: &[FieldSpec]) -> String {
    let rows = specs
        .iter()
        .map(|spec| {
            (
                spec.name,
                spec.kind.as_str(),
                render_default(&spec.default),
                spec.help,
            )
        })
        .collect::<Vec<_>>();
    let name_width = rows
        .iter()
        .map(|row| row.0.len())
        .max()
        .unwrap_or(0)
        .max("field".len());
    let kind_width = rows
        .iter()
        .map(|row| row.1.len())
        .max()
        .unwrap_or(0)
        .max("type".len());
    let default_width = rows
        .iter()
        .map(|row| row.2.len())
        .max()
        .unwrap_or(0)
        .max("default".len());

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(format!(
        "{:<name_width$}  {:<kind_width$}  {:<default_width$}  help",
        "field", "type", "default"
    ));
    for (name, kind, default, help) in rows {
        lines.push(format!(
            "{name:<name_width$}  {kind:<kind_width$}  {default:<default_width$}  {help}"
        ));
    }
    lines.join("\n")
}

fn render_default(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
