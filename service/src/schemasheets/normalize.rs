//! Cell value normalization
//!
//! Turns a raw cell into the JSON value merged onto the schema model, given
//! the column's settings and the metamodel field it targets. The result
//! depends on nothing but its inputs.

use super::column::ColumnConfig;
use schemasheets_core::{FieldMeta, RangeKind, Result, SchemaSheetsError, Value};
use tracing::{error, warn};

/// Cell contents that mean "no value"
pub const SENTINELS: [&str; 3] = ["", ".", "n/a"];

/// Default separator of multivalued cells
pub const DEFAULT_SEPARATOR: &str = "|";

/// Normalize a raw cell for a column
///
/// Returns `Ok(None)` when the cell is empty after normalization. For
/// multivalued targets the cell is split on the column's separator, or on
/// `default_separator`, and each piece is normalized on its own.
///
/// # Errors
///
/// Returns `SchemaSheetsError::Value` if a keyed field (such as
/// `annotations`) without an inner key receives something that is not a
/// mapping
pub fn normalize(raw: &str, column: &ColumnConfig, default_separator: &str) -> Result<Option<Value>> {
    let field = column.resolved_field();
    let has_inner_key = column.settings.inner_key.is_some();

    if let Some(field) = field.filter(|f| f.range == RangeKind::Keyed && !has_inner_key) {
        return keyed_mapping(raw, field);
    }

    let target = column.inner_key_field.as_ref().or(field);
    let multivalued = match (&column.inner_key_field, has_inner_key) {
        (Some(inner), true) => inner.multivalued || column.settings.internal_separator.is_some(),
        (None, true) => column.settings.internal_separator.is_some(),
        (_, false) => field.is_some_and(|f| f.multivalued),
    };

    if multivalued {
        let separator = column.separator(default_separator);
        let items: Vec<Value> = raw
            .split(separator)
            .filter_map(|piece| normalize_text(piece, column))
            .map(|text| coerce(text, target))
            .collect();
        return Ok((!items.is_empty()).then_some(Value::Array(items)));
    }
    Ok(normalize_text(raw, column).map(|text| coerce(text, target)))
}

/// Apply the textual rules to one value: sentinels, whitespace, regex
/// extraction, CURIE prefix, literal prefix and suffix, value substitution
#[must_use]
pub fn normalize_text(raw: &str, column: &ColumnConfig) -> Option<String> {
    if SENTINELS.contains(&raw) {
        return None;
    }
    let trimmed = raw.trim();
    if SENTINELS.contains(&trimmed) {
        return None;
    }
    if trimmed.len() != raw.len() {
        warn!("Stripping whitespace from '{}' in column '{}'", raw, column.name);
    }
    let mut value = trimmed.to_string();

    if let Some(regex) = column.matcher() {
        let Some(captures) = regex.captures(&value) else {
            error!(
                "Value '{}' in column '{}' does not match {}",
                value,
                column.name,
                regex.as_str()
            );
            return None;
        };
        value = captures
            .get(1)
            .or_else(|| captures.get(0))
            .map_or_else(String::new, |m| m.as_str().to_string());
    }

    let settings = &column.settings;
    if let Some(curie_prefix) = &settings.curie_prefix {
        if value.contains(':') {
            warn!(
                "Value '{}' in column '{}' is already a CURIE, not adding prefix {}",
                value, column.name, curie_prefix
            );
        } else {
            value = format!("{curie_prefix}:{value}");
        }
    }
    if let Some(prefix) = &settings.prefix {
        value = format!("{prefix}{value}");
    }
    if let Some(suffix) = &settings.suffix {
        value.push_str(suffix);
    }
    if let Some(vmap) = &settings.vmap {
        match vmap.lookup(&value) {
            Some(mapped) => value = mapped.to_string(),
            None => warn!(
                "No mapping for '{}' in column '{}', passing it through",
                value, column.name
            ),
        }
    }
    Some(value)
}

/// Coerce text to the target field's range
fn coerce(text: String, target: Option<&FieldMeta>) -> Value {
    match target.map(|f| f.range) {
        Some(RangeKind::Boolean) => Value::Bool(parse_bool(&text)),
        Some(RangeKind::Integer) => text
            .parse::<i64>()
            .map_or(Value::String(text), |n| Value::Number(n.into())),
        _ => Value::String(text),
    }
}

/// `yes`/`true` and `no`/`false` in any case; anything else non-empty is true
#[must_use]
pub fn parse_bool(text: &str) -> bool {
    match text.to_ascii_lowercase().as_str() {
        "yes" | "true" => true,
        "no" | "false" => false,
        other => !other.is_empty(),
    }
}

fn keyed_mapping(raw: &str, field: &FieldMeta) -> Result<Option<Value>> {
    let trimmed = raw.trim();
    if SENTINELS.contains(&trimmed) {
        return Ok(None);
    }
    let parsed: serde_yaml::Value = serde_yaml::from_str(trimmed).map_err(|e| {
        SchemaSheetsError::value(format!("Cannot parse {} value '{trimmed}': {e}", field.name))
    })?;
    match serde_json::to_value(parsed)? {
        Value::Object(map) => Ok((!map.is_empty()).then_some(Value::Object(map))),
        _ => Err(SchemaSheetsError::value(format!(
            "{} needs a mapping such as {{key: value}}, got '{trimmed}'",
            field.name
        ))),
    }
}
