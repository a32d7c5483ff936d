//! Merging normalized cell values onto focal elements
//!
//! Scalar fields are write-once: a second, different value for a field that
//! already holds a meaningful value is a conflict. Schema, prefix and setting
//! elements may be overwritten. List fields accumulate without duplicates.

use super::cardinality::CardinalityResolver;
use super::column::{ColumnConfig, Descriptor};
use super::normalize::{normalize, normalize_text};
use super::session::SessionOptions;
use schemasheets_core::{
    ElementId, FieldMeta, RangeKind, Result, SchemaModel, SchemaSheetsError, Value,
};
use serde_json::Map;

/// Name given to a schema that has not been named yet
pub const PLACEHOLDER_NAME: &str = "TEMP";

/// Applies one column of a row to a focal element
pub struct SchemaMergeEngine<'a> {
    cardinality: CardinalityResolver<'a>,
    default_separator: &'a str,
}

impl<'a> SchemaMergeEngine<'a> {
    /// Create an engine using the session's vocabulary and separator
    #[must_use]
    pub fn new(options: &'a SessionOptions) -> Self {
        Self {
            cardinality: CardinalityResolver::new(&options.cardinality),
            default_separator: &options.default_separator,
        }
    }

    /// Normalize `raw` for `column` and merge it onto `focal`
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Value` if the field does not apply to the
    /// element or the value has the wrong shape,
    /// `SchemaSheetsError::ConflictingValue` if a write-once field would
    /// change, and a cardinality error for an unknown cardinality token
    pub fn apply(
        &self,
        model: &mut SchemaModel,
        focal: ElementId,
        column: &ColumnConfig,
        raw: &str,
    ) -> Result<()> {
        match &column.descriptor {
            Descriptor::Cardinality => match normalize_text(raw, column) {
                Some(token) => self.cardinality.apply(model, focal, &token),
                None => Ok(()),
            },
            Descriptor::Field(field) => {
                let Some(value) = normalize(raw, column, self.default_separator)? else {
                    return Ok(());
                };
                let element = model.element(focal);
                if !field.applies_to(element.kind()) {
                    return Err(SchemaSheetsError::value(format!(
                        "{} does not apply to {} '{}' (column '{}')",
                        field.name,
                        element.kind(),
                        element.name(),
                        column.name
                    )));
                }
                match column.settings.inner_key.as_deref() {
                    Some(path) if field.range == RangeKind::Object && field.multivalued => {
                        self.set_object_list(model, focal, column, field, path, value)
                    }
                    Some(path) => set_path(model, focal, field, path, value),
                    None => merge_value(model, focal, field, value),
                }
            }
            Descriptor::Element(_) | Descriptor::Metatype | Descriptor::Ignore => Ok(()),
        }
    }

    /// `any_of: {inner_key: range}` with `a|b` becomes `[{range: a}, {range: b}]`
    fn set_object_list(
        &self,
        model: &mut SchemaModel,
        focal: ElementId,
        column: &ColumnConfig,
        field: &FieldMeta,
        path: &str,
        value: Value,
    ) -> Result<()> {
        let separator = column.separator(self.default_separator);
        let items = match value {
            Value::Array(items) => items,
            Value::String(text) => text
                .split(separator)
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .map(|piece| Value::String(piece.to_string()))
                .collect(),
            other => vec![other],
        };
        let objects: Vec<Value> = items.into_iter().map(|item| nest(path, item)).collect();
        let key = field.key();
        match model.element(focal).get(key) {
            Some(Value::Array(existing)) if !existing.is_empty() => {
                if *existing == objects {
                    return Ok(());
                }
                if !model.element(focal).kind().accepts_overwrites() {
                    return Err(SchemaSheetsError::conflict(
                        &field.name,
                        display(&Value::Array(existing.clone())),
                        display(&Value::Array(objects)),
                    ));
                }
                model.set(focal, key, Value::Array(objects));
            }
            _ => model.set(focal, key, Value::Array(objects)),
        }
        Ok(())
    }
}

fn merge_value(model: &mut SchemaModel, focal: ElementId, field: &FieldMeta, value: Value) -> Result<()> {
    let key = field.key();
    match value {
        Value::Array(items) => {
            let wrap = match field.name.as_str() {
                "examples" => Some("value"),
                "structured_aliases" => Some("literal_form"),
                _ => None,
            };
            let items = items.into_iter().map(|item| match (wrap, item) {
                (Some(inner), Value::String(text)) => nest(inner, Value::String(text)),
                (_, item) => item,
            });
            model.append(focal, key, items);
            Ok(())
        }
        Value::Object(entries) => {
            let mut merged = match model.element(focal).get(key) {
                Some(Value::Object(existing)) => existing.clone(),
                _ => Map::new(),
            };
            for (k, v) in entries {
                merged.insert(k, v);
            }
            model.set(focal, key, Value::Object(merged));
            Ok(())
        }
        scalar => set_once(model, focal, field, scalar),
    }
}

fn set_once(model: &mut SchemaModel, focal: ElementId, field: &FieldMeta, value: Value) -> Result<()> {
    let key = field.key();
    if let Some(current) = model.value(focal, key) {
        if current == value {
            return Ok(());
        }
        if !is_unset(&current) && !model.element(focal).kind().accepts_overwrites() {
            return Err(SchemaSheetsError::conflict(
                &field.name,
                display(&current),
                display(&value),
            ));
        }
    }
    model.set(focal, key, value);
    Ok(())
}

/// Set `path` (dotted) inside the object held by `field`
fn set_path(
    model: &mut SchemaModel,
    focal: ElementId,
    field: &FieldMeta,
    path: &str,
    value: Value,
) -> Result<()> {
    let key = field.key();
    let mut root = match model.element(focal).get(key) {
        Some(Value::Object(existing)) => existing.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            return Err(SchemaSheetsError::value(format!(
                "{} holds {}, cannot set {path} inside it",
                field.name,
                display(other)
            )));
        }
    };
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };
    let mut cursor = &mut root;
    for segment in parents {
        cursor = match cursor
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(inner) => inner,
            other => {
                return Err(SchemaSheetsError::value(format!(
                    "{}.{segment} holds {}, cannot set {path} inside it",
                    field.name,
                    display(other)
                )));
            }
        };
    }

    let slot = match cursor.get_mut(*last) {
        Some(Value::Object(tagged)) if field.range == RangeKind::Keyed && tagged.contains_key("value") => {
            tagged.get_mut("value")
        }
        other => other,
    };
    match slot {
        Some(current) if *current == value => return Ok(()),
        Some(current) => {
            if !is_unset(current) && !model.element(focal).kind().accepts_overwrites() {
                return Err(SchemaSheetsError::conflict(
                    format!("{}.{path}", field.name),
                    display(current),
                    display(&value),
                ));
            }
            *current = value;
        }
        None => {
            cursor.insert((*last).to_string(), value);
        }
    }
    model.set(focal, key, Value::Object(root));
    Ok(())
}

/// Wrap `value` in objects along a dotted path
fn nest(path: &str, value: Value) -> Value {
    path.rsplit('.').fold(value, |inner, segment| {
        let mut map = Map::new();
        map.insert(segment.to_string(), inner);
        Value::Object(map)
    })
}

/// Values a later row may still fill in
fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty() || text == PLACEHOLDER_NAME,
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemasheets::settings::ColumnSettings;
    use pretty_assertions::assert_eq;
    use schemasheets_core::{ElementKind, ErrorCategory, LinkmlMetamodel};
    use serde_json::json;

    fn column(maps_to: &str, settings: ColumnSettings) -> ColumnConfig {
        let mm = LinkmlMetamodel::new();
        let mut column = ColumnConfig::new(maps_to, maps_to, &mm).unwrap();
        column.merge_settings(settings, &mm).unwrap();
        column
    }

    fn plain(maps_to: &str) -> ColumnConfig {
        column(maps_to, ColumnSettings::default())
    }

    fn inner(maps_to: &str, key: &str) -> ColumnConfig {
        column(
            maps_to,
            ColumnSettings {
                inner_key: Some(key.to_string()),
                ..ColumnSettings::default()
            },
        )
    }

    fn setup() -> (SchemaModel, ElementId, SessionOptions) {
        let mut model = SchemaModel::new("s");
        let slot = model.top_level(ElementKind::Slot, "age");
        (model, slot, SessionOptions::default())
    }

    #[test]
    fn test_scalar_write_once() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        let desc = plain("description");
        engine.apply(&mut model, slot, &desc, "age in years").unwrap();
        engine.apply(&mut model, slot, &desc, "age in years").unwrap();
        let err = engine.apply(&mut model, slot, &desc, "other").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot reset value for description, was age in years, now other"
        );
    }

    #[test]
    fn test_false_may_become_true() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        let identifier = plain("identifier");
        engine.apply(&mut model, slot, &identifier, "no").unwrap();
        engine.apply(&mut model, slot, &identifier, "yes").unwrap();
        assert_eq!(model.element(slot).get("identifier"), Some(&json!(true)));
        assert!(engine.apply(&mut model, slot, &identifier, "no").is_err());
    }

    #[test]
    fn test_schema_fields_overwrite() {
        let mut model = SchemaModel::new("s");
        let root = model.root();
        let options = SessionOptions::default();
        let engine = SchemaMergeEngine::new(&options);
        let desc = plain("description");
        engine.apply(&mut model, root, &desc, "first").unwrap();
        engine.apply(&mut model, root, &desc, "second").unwrap();
        assert_eq!(model.element(root).get("description"), Some(&json!("second")));
    }

    #[test]
    fn test_lists_accumulate() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        let aliases = plain("aliases");
        engine.apply(&mut model, slot, &aliases, "a|b").unwrap();
        engine.apply(&mut model, slot, &aliases, "b|c").unwrap();
        assert_eq!(model.element(slot).get("aliases"), Some(&json!(["a", "b", "c"])));
    }

    #[test]
    fn test_examples_wrapped() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        engine.apply(&mut model, slot, &plain("examples"), "33|44").unwrap();
        assert_eq!(
            model.element(slot).get("examples"),
            Some(&json!([{"value": "33"}, {"value": "44"}]))
        );
    }

    #[test]
    fn test_inner_key_object() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        engine
            .apply(&mut model, slot, &inner("structured_pattern", "syntax"), "{x}-{y}")
            .unwrap();
        engine
            .apply(&mut model, slot, &inner("structured_pattern", "interpolated"), "yes")
            .unwrap();
        assert_eq!(
            model.element(slot).get("structured_pattern"),
            Some(&json!({"syntax": "{x}-{y}", "interpolated": true}))
        );
        let err = engine
            .apply(&mut model, slot, &inner("structured_pattern", "syntax"), "other")
            .unwrap_err();
        assert!(matches!(err, SchemaSheetsError::ConflictingValue { .. }));
    }

    #[test]
    fn test_dotted_inner_key() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        engine
            .apply(&mut model, slot, &inner("annotations", "display.hint"), "compact")
            .unwrap();
        assert_eq!(
            model.element(slot).get("annotations"),
            Some(&json!({"display": {"hint": "compact"}}))
        );
    }

    #[test]
    fn test_any_of_splits_into_objects() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        let any_of = inner("any_of", "range");
        engine.apply(&mut model, slot, &any_of, "decimal|integer").unwrap();
        assert_eq!(
            model.element(slot).get("any_of"),
            Some(&json!([{"range": "decimal"}, {"range": "integer"}]))
        );
        engine.apply(&mut model, slot, &any_of, "decimal|integer").unwrap();
        assert!(engine.apply(&mut model, slot, &any_of, "string").is_err());
    }

    #[test]
    fn test_annotations_mapping_merges_keys() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        let annotations = plain("annotations");
        engine.apply(&mut model, slot, &annotations, "{a: 1}").unwrap();
        engine.apply(&mut model, slot, &annotations, "{b: 2}").unwrap();
        assert_eq!(
            model.element(slot).get("annotations"),
            Some(&json!({"a": 1, "b": 2}))
        );
    }

    #[test]
    fn test_field_must_apply_to_kind() {
        let mut model = SchemaModel::new("s");
        let class = model.top_level(ElementKind::Class, "Person");
        let options = SessionOptions::default();
        let engine = SchemaMergeEngine::new(&options);
        let err = engine.apply(&mut model, class, &plain("range"), "string").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Value);
    }

    #[test]
    fn test_cardinality_column() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        engine.apply(&mut model, slot, &plain("cardinality"), "1..*").unwrap();
        assert_eq!(model.element(slot).get("required"), Some(&json!(true)));
        assert_eq!(model.element(slot).get("multivalued"), Some(&json!(true)));
    }

    #[test]
    fn test_placeholder_replaced() {
        let (mut model, slot, options) = setup();
        let engine = SchemaMergeEngine::new(&options);
        model.set(slot, "range", json!(PLACEHOLDER_NAME));
        engine.apply(&mut model, slot, &plain("range"), "integer").unwrap();
        assert_eq!(model.element(slot).get("range"), Some(&json!("integer")));
    }
}
