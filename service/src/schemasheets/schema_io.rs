//! Reading and writing schema documents

use super::config::OutputFormat;
use schemasheets_core::{Result, SchemaModel, SchemaSheetsError, Value};
use serde_json::Map;
use std::path::Path;

/// Load a schema from a YAML or JSON file
///
/// # Errors
///
/// Returns an IO error if the file cannot be read and a parse error if it
/// is not a schema document
pub fn load_schema(path: &Path) -> Result<SchemaModel> {
    let text = std::fs::read_to_string(path)?;
    parse_schema(&text).map_err(|e| match e {
        SchemaSheetsError::Parse { message, .. } => {
            SchemaSheetsError::parse_at(message, path.display().to_string())
        }
        other => other,
    })
}

/// Parse a schema from YAML or JSON text
///
/// # Errors
///
/// Returns a parse error if the text is not a schema document
pub fn parse_schema(text: &str) -> Result<SchemaModel> {
    let value: Value = serde_yaml::from_str(text)
        .map_err(|e| SchemaSheetsError::parse(format!("Cannot parse schema: {e}")))?;
    SchemaModel::from_value(&value)
}

/// Render a schema document
///
/// # Errors
///
/// Returns `SchemaSheetsError::Serialization` if rendering fails
pub fn render_schema(model: &SchemaModel, format: OutputFormat, sort_keys: bool) -> Result<String> {
    let mut value = model.to_value();
    if sort_keys {
        value = sorted(value);
    }
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(&value)?),
        OutputFormat::Json => {
            let mut text = serde_json::to_string_pretty(&value)?;
            text.push('\n');
            Ok(text)
        }
    }
}

/// Recursively sort mapping keys
fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sorted(v)))
                    .collect::<Map<String, Value>>(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
