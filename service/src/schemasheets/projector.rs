//! Projection of a finished schema back into sheet rows
//!
//! Each element with a primary-key column in the table becomes one row.
//! Slot usages and attributes are keyed by slot and class, permissible
//! values by value and enum. Values go through the inverse of the
//! normalization rules: the CURIE prefix and literal affixes are stripped and
//! lists are joined with the column separator.

use super::cardinality::render;
use super::column::{ColumnConfig, Descriptor};
use super::sheet::Row;
use super::table::TableConfig;
use schemasheets_core::{ElementId, ElementKind, FieldMeta, RangeKind, SchemaModel, Value};
use std::collections::HashMap;

/// Produces sheet rows from a schema model
pub struct SchemaProjector<'a> {
    table: &'a TableConfig,
    default_separator: &'a str,
}

impl<'a> SchemaProjector<'a> {
    /// Create a projector for one table
    #[must_use]
    pub fn new(table: &'a TableConfig, default_separator: &'a str) -> Self {
        Self {
            table,
            default_separator,
        }
    }

    /// Rows for every element the table can key
    #[must_use]
    pub fn project(&self, model: &SchemaModel) -> Vec<Row> {
        let mut rows = Vec::new();
        let schema_only = self
            .table
            .element_columns()
            .all(|(kind, _)| kind == ElementKind::Schema);
        if schema_only {
            rows.extend(self.element_row(model, model.root()).map(|(row, _)| row));
        }

        for kind in [
            ElementKind::Prefix,
            ElementKind::Setting,
            ElementKind::Subset,
            ElementKind::Type,
        ] {
            for id in model.top_level_of(kind) {
                rows.extend(self.element_row(model, id).map(|(row, _)| row));
            }
        }

        for id in model.top_level_of(ElementKind::Enum) {
            let children = self.child_rows(model, id, &[ElementKind::PermissibleValue]);
            self.push_parent(&mut rows, model, id, children);
        }

        let referenced: Vec<&str> = model
            .top_level_of(ElementKind::Class)
            .into_iter()
            .filter_map(|class| model.element(class).get("slots"))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(Value::as_str)
            .collect();
        for id in model.top_level_of(ElementKind::Slot) {
            if let Some((row, bare)) = self.element_row(model, id) {
                if !(bare && referenced.contains(&model.element(id).name())) {
                    rows.push(row);
                }
            }
        }

        for id in model.top_level_of(ElementKind::Class) {
            let children =
                self.child_rows(model, id, &[ElementKind::Attribute, ElementKind::Slot]);
            self.push_parent(&mut rows, model, id, children);
        }
        rows
    }

    fn child_rows(&self, model: &SchemaModel, parent: ElementId, kinds: &[ElementKind]) -> Vec<Row> {
        kinds
            .iter()
            .flat_map(|kind| model.children(parent, *kind))
            .filter_map(|child| self.element_row(model, child).map(|(row, _)| row))
            .collect()
    }

    /// A parent row is implied by its child rows unless it carries values
    fn push_parent(&self, rows: &mut Vec<Row>, model: &SchemaModel, id: ElementId, children: Vec<Row>) {
        if let Some((row, bare)) = self.element_row(model, id) {
            if !(bare && !children.is_empty()) {
                rows.push(row);
            }
        }
        rows.extend(children);
    }

    /// The element's row and whether it holds nothing but its key
    fn element_row(&self, model: &SchemaModel, id: ElementId) -> Option<(Row, bool)> {
        let keys = self.key_cells(model, id)?;
        let mut row = Row::new();
        let mut bare = true;
        for column in self.table.columns() {
            if let Some(key) = keys.get(column.name.as_str()) {
                row.insert(column.name.clone(), key.clone());
                continue;
            }
            if let Some(value) = self.cell(model, id, column) {
                bare = false;
                row.insert(column.name.clone(), value);
            }
        }
        Some((row, bare))
    }

    /// Primary-key cells, or `None` if the table cannot key this element
    fn key_cells(&self, model: &SchemaModel, id: ElementId) -> Option<HashMap<&'a str, String>> {
        let element = model.element(id);
        let name = element.name().to_string();
        let owner = element.owner().map(|o| model.element(o).name().to_string());
        let table = self.table;
        let mut keys = HashMap::new();
        match element.kind() {
            ElementKind::Slot if element.owner() != Some(model.root()) => {
                keys.insert(table.column_for_kind(ElementKind::Slot)?, name);
                keys.insert(table.column_for_kind(ElementKind::Class)?, owner?);
            }
            ElementKind::Attribute => {
                let column = table
                    .column_for_kind(ElementKind::Attribute)
                    .or_else(|| table.column_for_kind(ElementKind::Slot))?;
                keys.insert(column, name);
                keys.insert(table.column_for_kind(ElementKind::Class)?, owner?);
            }
            ElementKind::PermissibleValue => {
                keys.insert(table.column_for_kind(ElementKind::PermissibleValue)?, name);
                keys.insert(table.column_for_kind(ElementKind::Enum)?, owner?);
            }
            kind @ (ElementKind::Class | ElementKind::Slot) => {
                if let Some(column) = table.column_for_kind(kind) {
                    keys.insert(column, name);
                } else {
                    keys.insert(table.metatype_column()?, kind.tag().to_string());
                    keys.insert(table.name_column()?, name);
                }
            }
            kind @ (ElementKind::Schema
            | ElementKind::Enum
            | ElementKind::Type
            | ElementKind::Subset
            | ElementKind::Prefix
            | ElementKind::Setting) => {
                keys.insert(table.column_for_kind(kind)?, name);
            }
        }
        Some(keys)
    }

    fn cell(&self, model: &SchemaModel, id: ElementId, column: &ColumnConfig) -> Option<String> {
        let target = match &column.settings.applies_to_class {
            Some(class) => {
                let element = model.element(id);
                if element.kind() != ElementKind::Slot || element.owner() != Some(model.root()) {
                    return None;
                }
                let class = model.find_top_level(ElementKind::Class, class)?;
                model.find(ElementKind::Slot, class, element.name())?
            }
            None => id,
        };
        let element = model.element(target);
        match &column.descriptor {
            Descriptor::Cardinality => {
                if !element.kind().is_slot_like() {
                    return None;
                }
                let flag = |key: &str| element.get(key).and_then(Value::as_bool);
                render(flag("required"), flag("multivalued"))
            }
            Descriptor::Field(field) => {
                if !field.applies_to(element.kind()) {
                    return None;
                }
                self.field_text(model.value(target, field.key())?, column, field)
            }
            Descriptor::Element(_) | Descriptor::Metatype | Descriptor::Ignore => None,
        }
    }

    fn field_text(&self, value: Value, column: &ColumnConfig, field: &FieldMeta) -> Option<String> {
        let value = match column.settings.inner_key.as_deref() {
            Some(path) => match value {
                Value::Array(items) => Value::Array(
                    items
                        .iter()
                        .filter_map(|item| read_path(item, path, field))
                        .collect(),
                ),
                other => read_path(&other, path, field)?,
            },
            None => match (field.name.as_str(), value) {
                ("examples", Value::Array(items)) => unwrap_items(items, "value"),
                ("structured_aliases", Value::Array(items)) => unwrap_items(items, "literal_form"),
                (_, other) => other,
            },
        };

        let pieces: Vec<String> = match value {
            Value::Array(items) => items.iter().filter_map(text).collect(),
            other => text(&other).into_iter().collect(),
        };
        let settings = &column.settings;
        let pieces: Vec<String> = pieces
            .into_iter()
            .filter_map(|piece| {
                let piece = match &settings.curie_prefix {
                    Some(prefix) => piece.strip_prefix(&format!("{prefix}:"))?.to_string(),
                    None => piece,
                };
                let piece = settings
                    .prefix
                    .as_deref()
                    .and_then(|p| piece.strip_prefix(p))
                    .unwrap_or(&piece);
                let piece = settings
                    .suffix
                    .as_deref()
                    .and_then(|s| piece.strip_suffix(s))
                    .unwrap_or(piece);
                (!piece.is_empty()).then(|| piece.to_string())
            })
            .collect();
        if pieces.is_empty() {
            return None;
        }
        Some(pieces.join(column.separator(self.default_separator)))
    }
}

/// Follow a dotted path; a keyed entry holding `value` yields that value
fn read_path(value: &Value, path: &str, field: &FieldMeta) -> Option<Value> {
    let mut cursor = value;
    for segment in path.split('.') {
        cursor = cursor.get(segment)?;
    }
    match cursor {
        Value::Object(tagged) if field.range == RangeKind::Keyed => tagged.get("value").cloned(),
        other => Some(other.clone()),
    }
}

fn unwrap_items(items: Vec<Value>, key: &str) -> Value {
    Value::Array(
        items
            .into_iter()
            .map(|item| match item {
                Value::Object(mut map) if map.contains_key(key) => {
                    map.remove(key).unwrap_or(Value::Null)
                }
                other => other,
            })
            .collect(),
    )
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemasheets::header::HeaderInterpreter;
    use pretty_assertions::assert_eq;
    use schemasheets_core::LinkmlMetamodel;
    use serde_json::json;

    fn table(columns: &[&str], descriptors: &[&str]) -> TableConfig {
        let mm = LinkmlMetamodel::new();
        let mut line: Vec<String> = descriptors.iter().map(ToString::to_string).collect();
        line[0] = format!(">{}", line[0]);
        HeaderInterpreter::interpret(&mm, columns.iter().map(ToString::to_string).collect(), &[line])
            .unwrap()
    }

    fn row(cells: &[(&str, &str)]) -> Row {
        cells
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_slot_usage_rows() {
        let mut model = SchemaModel::new("s");
        let person = model.top_level(ElementKind::Class, "Person");
        model.set(person, "slots", json!(["age"]));
        model.top_level(ElementKind::Slot, "age");
        let usage = model.get_or_create(ElementKind::Slot, person, "age");
        model.set(usage, "required", json!(false));
        model.set(usage, "multivalued", json!(false));
        model.set(usage, "range", json!("decimal"));

        let table = table(&["class", "slot", "card", "range"], &["class", "slot", "cardinality", "range"]);
        let rows = SchemaProjector::new(&table, "|").project(&model);
        assert_eq!(
            rows,
            vec![row(&[("class", "Person"), ("slot", "age"), ("card", "0..1"), ("range", "decimal")])]
        );
    }

    #[test]
    fn test_class_with_values_kept() {
        let mut model = SchemaModel::new("s");
        let person = model.top_level(ElementKind::Class, "Person");
        model.set(person, "description", json!("a person"));
        model.get_or_create(ElementKind::Attribute, person, "age");

        let table = table(&["class", "slot", "desc"], &["class", "slot", "description"]);
        let rows = SchemaProjector::new(&table, "|").project(&model);
        assert_eq!(
            rows,
            vec![
                row(&[("class", "Person"), ("desc", "a person")]),
                row(&[("class", "Person"), ("slot", "age")]),
            ]
        );
    }

    #[test]
    fn test_curie_prefix_stripped_and_joined() {
        let mut model = SchemaModel::new("s");
        let person = model.top_level(ElementKind::Class, "Person");
        model.set(
            person,
            "exact_mappings",
            json!(["sdo:Person", "wd:Q5", "sdo:Human"]),
        );
        let table = table(
            &["class", "schema.org"],
            &["class", "exact_mappings: {curie_prefix: sdo}"],
        );
        let rows = SchemaProjector::new(&table, "|").project(&model);
        assert_eq!(
            rows,
            vec![row(&[("class", "Person"), ("schema.org", "Person|Human")])]
        );
    }

    #[test]
    fn test_enum_values_and_inner_key() {
        let mut model = SchemaModel::new("s");
        let color = model.top_level(ElementKind::Enum, "Color");
        let red = model.get_or_create(ElementKind::PermissibleValue, color, "RED");
        model.set(red, "meaning", json!("ex:red"));
        let slot = model.top_level(ElementKind::Slot, "range_any");
        model.set(slot, "any_of", json!([{"range": "a"}, {"range": "b"}]));

        let enums = table(&["enum", "pv", "meaning"], &["enum", "permissible_value", "meaning"]);
        assert_eq!(
            SchemaProjector::new(&enums, "|").project(&model),
            vec![row(&[("enum", "Color"), ("pv", "RED"), ("meaning", "ex:red")])]
        );

        let mm = LinkmlMetamodel::new();
        let slots = HeaderInterpreter::interpret(
            &mm,
            vec!["slot".to_string(), "any".to_string()],
            &[
                vec![">slot".to_string(), "any_of".to_string()],
                vec![">".to_string(), "inner_key: range".to_string()],
            ],
        )
        .unwrap();
        assert_eq!(
            SchemaProjector::new(&slots, "|").project(&model),
            vec![row(&[("slot", "range_any"), ("any", "a|b")])]
        );
    }

    #[test]
    fn test_metatype_table() {
        let mut model = SchemaModel::new("s");
        let person = model.top_level(ElementKind::Class, "Person");
        model.set(person, "description", json!("a person"));
        let age = model.top_level(ElementKind::Slot, "age");
        model.set(age, "description", json!("years"));
        let table = table(&["type", "name", "desc"], &["metatype", "name", "description"]);
        assert_eq!(
            SchemaProjector::new(&table, "|").project(&model),
            vec![
                row(&[("type", "slot"), ("name", "age"), ("desc", "years")]),
                row(&[("type", "class"), ("name", "Person"), ("desc", "a person")]),
            ]
        );
    }
}
