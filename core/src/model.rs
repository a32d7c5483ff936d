//! In-memory schema object model
//!
//! Elements live in an arena owned by [`SchemaModel`] and are addressed by
//! [`ElementId`] handles. Each element is indexed by `(kind, owner, name)`,
//! so asking for the same element twice yields the same handle and
//! properties written through one lookup are visible through the next.
//!
//! Field values are kept as JSON values keyed by metamodel field name; the
//! nested `LinkML` YAML/JSON layout is produced by [`SchemaModel::to_value`]
//! and read back by [`SchemaModel::from_value`].
//!
//! Mutations made between [`SchemaModel::begin`] and
//! [`SchemaModel::commit`] are journaled and can be undone with
//! [`SchemaModel::rollback`].

use crate::element::ElementKind;
use crate::error::{Result, SchemaSheetsError};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

/// Handle to an element in a [`SchemaModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

impl ElementId {
    /// Arena position of the element
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// One schema element
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    name: String,
    owner: Option<ElementId>,
    fields: IndexMap<String, Value>,
    children: Vec<ElementId>,
    inapplicable: bool,
    detached: bool,
}

impl Element {
    /// Kind of the element
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Identifying name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning element; `None` only for the schema root
    #[must_use]
    pub fn owner(&self) -> Option<ElementId> {
        self.owner
    }

    /// Field values in insertion order
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Value of a field
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Whether a cardinality marked the element as not applicable
    #[must_use]
    pub fn is_inapplicable(&self) -> bool {
        self.inapplicable
    }
}

type ElementKey = (ElementKind, Option<ElementId>, String);

#[derive(Debug, Clone)]
enum Undo {
    Created(ElementId),
    Field {
        id: ElementId,
        key: String,
        previous: Option<Value>,
    },
    Renamed {
        id: ElementId,
        previous: String,
    },
    Inapplicable {
        id: ElementId,
        previous: bool,
    },
}

/// Arena of schema elements rooted at a single schema element
#[derive(Debug, Clone)]
pub struct SchemaModel {
    elements: Vec<Element>,
    index: HashMap<ElementKey, ElementId>,
    journal: Option<Vec<Undo>>,
}

/// Top-level collections in serialization order
const TOP_LEVEL_ORDER: [ElementKind; 7] = [
    ElementKind::Prefix,
    ElementKind::Setting,
    ElementKind::Subset,
    ElementKind::Type,
    ElementKind::Enum,
    ElementKind::Slot,
    ElementKind::Class,
];

const ROOT: ElementId = ElementId(0);

impl SchemaModel {
    /// Create a model holding only a schema element named `name`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let root = Element {
            kind: ElementKind::Schema,
            name: name.into(),
            owner: None,
            fields: IndexMap::new(),
            children: Vec::new(),
            inapplicable: false,
            detached: false,
        };
        Self {
            elements: vec![root],
            index: HashMap::new(),
            journal: None,
        }
    }

    /// Handle of the schema element
    #[must_use]
    pub fn root(&self) -> ElementId {
        ROOT
    }

    /// Name of the schema
    #[must_use]
    pub fn schema_name(&self) -> &str {
        &self.elements[ROOT.0].name
    }

    /// Borrow an element
    #[must_use]
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    /// Find an element without creating it
    #[must_use]
    pub fn find(&self, kind: ElementKind, owner: ElementId, name: &str) -> Option<ElementId> {
        if kind == ElementKind::Schema {
            return Some(ROOT);
        }
        self.index
            .get(&(kind, Some(owner), name.to_string()))
            .copied()
    }

    /// Find a top-level element without creating it
    #[must_use]
    pub fn find_top_level(&self, kind: ElementKind, name: &str) -> Option<ElementId> {
        self.find(kind, ROOT, name)
    }

    /// Return the element `(kind, owner, name)`, creating a stub on first use
    pub fn get_or_create(&mut self, kind: ElementKind, owner: ElementId, name: &str) -> ElementId {
        if let Some(id) = self.find(kind, owner, name) {
            return id;
        }
        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            kind,
            name: name.to_string(),
            owner: Some(owner),
            fields: IndexMap::new(),
            children: Vec::new(),
            inapplicable: false,
            detached: false,
        });
        self.elements[owner.0].children.push(id);
        self.index.insert((kind, Some(owner), name.to_string()), id);
        self.record(Undo::Created(id));
        id
    }

    /// Return the top-level element `(kind, name)`, creating a stub on first use
    pub fn top_level(&mut self, kind: ElementKind, name: &str) -> ElementId {
        self.get_or_create(kind, ROOT, name)
    }

    /// Rename the schema element
    pub fn rename_schema(&mut self, name: &str) {
        let root = &mut self.elements[ROOT.0];
        if root.name == name {
            return;
        }
        let previous = std::mem::replace(&mut root.name, name.to_string());
        self.record(Undo::Renamed { id: ROOT, previous });
    }

    /// Current value of a field, treating the kind's key field as the name
    #[must_use]
    pub fn value(&self, id: ElementId, key: &str) -> Option<Value> {
        let element = self.element(id);
        if key == element.kind.key_field() {
            return Some(Value::String(element.name.clone()));
        }
        element.fields.get(key).cloned()
    }

    /// Set a field value
    pub fn set(&mut self, id: ElementId, key: &str, value: Value) {
        if key == self.element(id).kind.key_field() {
            if let (ElementKind::Schema, Value::String(name)) = (self.element(id).kind, &value) {
                let name = name.clone();
                self.rename_schema(&name);
            }
            return;
        }
        let previous = self.elements[id.0].fields.insert(key.to_string(), value);
        self.record(Undo::Field {
            id,
            key: key.to_string(),
            previous,
        });
    }

    /// Set a field only if it has no value yet
    pub fn set_default(&mut self, id: ElementId, key: &str, value: Value) {
        if self.element(id).get(key).is_none() {
            self.set(id, key, value);
        }
    }

    /// Append to a list field, skipping items already present
    pub fn append(&mut self, id: ElementId, key: &str, items: impl IntoIterator<Item = Value>) {
        let mut list = match self.element(id).get(key) {
            Some(Value::Array(existing)) => existing.clone(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![other.clone()],
        };
        let before = list.len();
        for item in items {
            if !list.contains(&item) {
                list.push(item);
            }
        }
        if list.len() != before || self.element(id).get(key).is_none() {
            self.set(id, key, Value::Array(list));
        }
    }

    /// Mark an element as not applicable; the tidy step detaches it
    pub fn mark_inapplicable(&mut self, id: ElementId) {
        let previous = self.elements[id.0].inapplicable;
        self.elements[id.0].inapplicable = true;
        self.record(Undo::Inapplicable { id, previous });
    }

    /// Remove an element and its children from the model
    pub fn detach(&mut self, id: ElementId) {
        let Some(owner) = self.elements[id.0].owner else {
            return;
        };
        self.elements[owner.0].children.retain(|c| *c != id);
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            let element = &mut self.elements[next.0];
            element.detached = true;
            pending.extend(element.children.iter().copied());
            let key = (element.kind, element.owner, element.name.clone());
            self.index.remove(&key);
        }
    }

    /// Live children of `owner` of the given kind, in creation order
    #[must_use]
    pub fn children(&self, owner: ElementId, kind: ElementKind) -> Vec<ElementId> {
        self.element(owner)
            .children
            .iter()
            .copied()
            .filter(|c| self.elements[c.0].kind == kind)
            .collect()
    }

    /// Live top-level elements of the given kind, in creation order
    #[must_use]
    pub fn top_level_of(&self, kind: ElementKind) -> Vec<ElementId> {
        self.children(ROOT, kind)
    }

    /// All live elements in creation order, the schema first
    pub fn iter(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.detached)
            .map(|(i, _)| ElementId(i))
    }

    /// Number of live elements including the schema
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the model holds nothing but the schema element
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 1
    }

    /// Start journaling mutations
    pub fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Keep journaled mutations and stop journaling
    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every mutation since [`SchemaModel::begin`] and stop journaling
    pub fn rollback(&mut self) {
        let Some(journal) = self.journal.take() else {
            return;
        };
        debug!("rolling back {} changes", journal.len());
        for undo in journal.into_iter().rev() {
            match undo {
                Undo::Created(id) => {
                    let element = self.elements.remove(id.0);
                    if let Some(owner) = element.owner {
                        self.elements[owner.0].children.retain(|c| *c != id);
                    }
                    self.index
                        .remove(&(element.kind, element.owner, element.name));
                }
                Undo::Field { id, key, previous } => {
                    let fields = &mut self.elements[id.0].fields;
                    match previous {
                        Some(value) => {
                            fields.insert(key, value);
                        }
                        None => {
                            fields.shift_remove(&key);
                        }
                    }
                }
                Undo::Renamed { id, previous } => self.elements[id.0].name = previous,
                Undo::Inapplicable { id, previous } => {
                    self.elements[id.0].inapplicable = previous;
                }
            }
        }
    }

    fn record(&mut self, undo: Undo) {
        if let Some(journal) = self.journal.as_mut() {
            journal.push(undo);
        }
    }

    /// Copy in every top-level element of `other` this model does not define
    pub fn merge_missing(&mut self, other: &SchemaModel) {
        for kind in TOP_LEVEL_ORDER {
            for id in other.top_level_of(kind) {
                let name = other.element(id).name();
                if self.find_top_level(kind, name).is_none() {
                    debug!("copying {} {} from {}", kind.tag(), name, other.schema_name());
                    self.copy_subtree(other, id, ROOT);
                }
            }
        }
    }

    fn copy_subtree(&mut self, other: &SchemaModel, source: ElementId, owner: ElementId) {
        let element = other.element(source);
        let id = self.get_or_create(element.kind, owner, &element.name);
        for (key, value) in &element.fields {
            self.set(id, key, value.clone());
        }
        for child in &element.children {
            if !other.elements[child.0].detached {
                self.copy_subtree(other, *child, id);
            }
        }
    }

    /// Serialize to the nested `LinkML` layout
    #[must_use]
    pub fn to_value(&self) -> Value {
        let root = self.element(ROOT);
        let mut out = Map::new();
        out.insert("name".to_string(), Value::String(root.name.clone()));
        for (key, value) in &root.fields {
            out.insert(key.clone(), value.clone());
        }
        for kind in TOP_LEVEL_ORDER {
            let ids = self.top_level_of(kind);
            if ids.is_empty() {
                continue;
            }
            let mut collection = Map::new();
            for id in ids {
                let element = self.element(id);
                collection.insert(element.name.clone(), self.element_value(id));
            }
            out.insert(kind.collection().to_string(), Value::Object(collection));
        }
        Value::Object(out)
    }

    fn element_value(&self, id: ElementId) -> Value {
        let element = self.element(id);
        match element.kind {
            ElementKind::Prefix => {
                return element
                    .get("prefix_reference")
                    .cloned()
                    .unwrap_or(Value::Null);
            }
            ElementKind::Setting => {
                return element.get("setting_value").cloned().unwrap_or(Value::Null);
            }
            _ => {}
        }
        let mut out = Map::new();
        out.insert(
            element.kind.key_field().to_string(),
            Value::String(element.name.clone()),
        );
        for (key, value) in &element.fields {
            out.insert(key.clone(), value.clone());
        }
        for (child_kind, collection) in nested_collections(element.kind) {
            let ids = self.children(id, *child_kind);
            if ids.is_empty() {
                continue;
            }
            let mut map = Map::new();
            for child in ids {
                map.insert(self.element(child).name.clone(), self.element_value(child));
            }
            out.insert((*collection).to_string(), Value::Object(map));
        }
        Value::Object(out)
    }

    /// Build a model from the nested `LinkML` layout
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Parse` if the document is not a mapping or
    /// a collection has an unexpected shape
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(doc) = value else {
            return Err(SchemaSheetsError::parse("schema document must be a mapping"));
        };
        let name = doc
            .get("name")
            .or_else(|| doc.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| SchemaSheetsError::parse("schema document has no name"))?;
        let mut model = Self::new(name);
        for (key, body) in doc {
            if key == "name" {
                continue;
            }
            match TOP_LEVEL_ORDER.iter().find(|k| k.collection() == key) {
                Some(kind) => model.load_collection(*kind, ROOT, body)?,
                None => model.set(ROOT, key, body.clone()),
            }
        }
        Ok(model)
    }

    fn load_collection(&mut self, kind: ElementKind, owner: ElementId, body: &Value) -> Result<()> {
        match body {
            Value::Null => Ok(()),
            Value::Object(entries) => {
                for (name, element) in entries {
                    self.load_element(kind, owner, name, element)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                for item in items {
                    let name = match item {
                        Value::String(s) => s.clone(),
                        Value::Object(map) => map
                            .get(kind.key_field())
                            .and_then(Value::as_str)
                            .ok_or_else(|| {
                                SchemaSheetsError::parse_at(
                                    format!("entry without {}", kind.key_field()),
                                    kind.collection(),
                                )
                            })?
                            .to_string(),
                        _ => {
                            return Err(SchemaSheetsError::parse_at(
                                "unexpected list entry",
                                kind.collection(),
                            ));
                        }
                    };
                    let element = if item.is_object() { item } else { &Value::Null };
                    self.load_element(kind, owner, &name, element)?;
                }
                Ok(())
            }
            _ => Err(SchemaSheetsError::parse_at(
                "collection must be a mapping or a list",
                kind.collection(),
            )),
        }
    }

    fn load_element(
        &mut self,
        kind: ElementKind,
        owner: ElementId,
        name: &str,
        body: &Value,
    ) -> Result<()> {
        let id = self.get_or_create(kind, owner, name);
        let value_key = match kind {
            ElementKind::Prefix => Some("prefix_reference"),
            ElementKind::Setting => Some("setting_value"),
            _ => None,
        };
        match (body, value_key) {
            (Value::Object(fields), _) => {
                for (key, value) in fields {
                    if key == kind.key_field() {
                        continue;
                    }
                    match nested_collections(kind).iter().find(|(_, c)| c == key) {
                        Some((child_kind, _)) => self.load_collection(*child_kind, id, value)?,
                        None => self.set(id, key, value.clone()),
                    }
                }
            }
            (Value::Null, _) => {}
            (scalar, Some(key)) => self.set(id, key, scalar.clone()),
            (Value::String(description), None) if kind == ElementKind::PermissibleValue => {
                self.set(id, "description", Value::String(description.clone()));
            }
            (_, None) => {
                return Err(SchemaSheetsError::parse_at(
                    "element body must be a mapping",
                    format!("{}.{name}", kind.collection()),
                ));
            }
        }
        Ok(())
    }
}

/// Child collections nested inside an element of `kind`
fn nested_collections(kind: ElementKind) -> &'static [(ElementKind, &'static str)] {
    match kind {
        ElementKind::Class => &[
            (ElementKind::Slot, "slot_usage"),
            (ElementKind::Attribute, "attributes"),
        ],
        ElementKind::Enum => &[(ElementKind::PermissibleValue, "permissible_values")],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut model = SchemaModel::new("test");
        let first = model.top_level(ElementKind::Class, "Person");
        model.set(first, "description", json!("a person"));
        let second = model.top_level(ElementKind::Class, "Person");
        assert_eq!(first, second);
        assert_eq!(
            model.element(second).get("description"),
            Some(&json!("a person"))
        );
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_same_name_different_kind_or_owner() {
        let mut model = SchemaModel::new("test");
        let class = model.top_level(ElementKind::Class, "age");
        let slot = model.top_level(ElementKind::Slot, "age");
        let usage = model.get_or_create(ElementKind::Slot, class, "age");
        assert_ne!(class, slot);
        assert_ne!(slot, usage);
        assert_eq!(model.children(class, ElementKind::Slot), vec![usage]);
    }

    #[test]
    fn test_rollback_restores_state() {
        let mut model = SchemaModel::new("test");
        let person = model.top_level(ElementKind::Class, "Person");
        model.set(person, "description", json!("kept"));

        model.begin();
        model.set(person, "description", json!("dropped"));
        model.set(person, "is_a", json!("Thing"));
        let usage = model.get_or_create(ElementKind::Slot, person, "age");
        model.mark_inapplicable(usage);
        model.rename_schema("renamed");
        model.rollback();

        assert_eq!(model.schema_name(), "test");
        assert_eq!(model.element(person).get("description"), Some(&json!("kept")));
        assert_eq!(model.element(person).get("is_a"), None);
        assert!(model.children(person, ElementKind::Slot).is_empty());
        assert_eq!(model.find(ElementKind::Slot, person, "age"), None);
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn test_detach_removes_from_index() {
        let mut model = SchemaModel::new("test");
        let person = model.top_level(ElementKind::Class, "Person");
        let usage = model.get_or_create(ElementKind::Slot, person, "age");
        model.detach(usage);
        assert_eq!(model.find(ElementKind::Slot, person, "age"), None);
        assert!(model.children(person, ElementKind::Slot).is_empty());
    }

    #[test]
    fn test_nested_layout() {
        let mut model = SchemaModel::new("personinfo");
        let root = model.root();
        model.set(root, "id", json!("https://w3id.org/personinfo"));
        let pfx = model.top_level(ElementKind::Prefix, "sdo");
        model.set(pfx, "prefix_reference", json!("http://schema.org/"));
        let person = model.top_level(ElementKind::Class, "Person");
        model.append(person, "slots", [json!("age")]);
        let usage = model.get_or_create(ElementKind::Slot, person, "age");
        model.set(usage, "range", json!("decimal"));
        let status = model.top_level(ElementKind::Enum, "Status");
        model.get_or_create(ElementKind::PermissibleValue, status, "ALIVE");

        assert_eq!(
            model.to_value(),
            json!({
                "name": "personinfo",
                "id": "https://w3id.org/personinfo",
                "prefixes": {"sdo": "http://schema.org/"},
                "enums": {
                    "Status": {
                        "name": "Status",
                        "permissible_values": {"ALIVE": {"text": "ALIVE"}}
                    }
                },
                "classes": {
                    "Person": {
                        "name": "Person",
                        "slots": ["age"],
                        "slot_usage": {"age": {"name": "age", "range": "decimal"}}
                    }
                }
            })
        );
    }

    #[test]
    fn test_load_round_trip() {
        let doc = json!({
            "name": "s",
            "id": "http://example.org/s",
            "prefixes": {"ex": {"prefix_prefix": "ex", "prefix_reference": "http://example.org/"}},
            "classes": {
                "A": {"attributes": {"x": null}},
                "B": null
            },
            "enums": {"E": {"permissible_values": ["one", {"text": "two", "description": "2"}]}}
        });
        let model = SchemaModel::from_value(&doc).unwrap();
        let a = model.find_top_level(ElementKind::Class, "A").unwrap();
        assert!(model.find(ElementKind::Attribute, a, "x").is_some());
        assert!(model.find_top_level(ElementKind::Class, "B").is_some());
        let e = model.find_top_level(ElementKind::Enum, "E").unwrap();
        let two = model.find(ElementKind::PermissibleValue, e, "two").unwrap();
        assert_eq!(model.element(two).get("description"), Some(&json!("2")));
        let ex = model.find_top_level(ElementKind::Prefix, "ex").unwrap();
        assert_eq!(
            model.element(ex).get("prefix_reference"),
            Some(&json!("http://example.org/"))
        );
        let again = SchemaModel::from_value(&model.to_value()).unwrap();
        assert_eq!(again.to_value(), model.to_value());
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut model = SchemaModel::new("main");
        let person = model.top_level(ElementKind::Class, "Person");
        model.set(person, "description", json!("mine"));

        let base = SchemaModel::from_value(&json!({
            "name": "base",
            "classes": {
                "Person": {"description": "theirs"},
                "Place": {"attributes": {"lat": {"range": "float"}}}
            }
        }))
        .unwrap();
        model.merge_missing(&base);

        assert_eq!(model.element(person).get("description"), Some(&json!("mine")));
        let place = model.find_top_level(ElementKind::Class, "Place").unwrap();
        let lat = model.find(ElementKind::Attribute, place, "lat").unwrap();
        assert_eq!(model.element(lat).get("range"), Some(&json!("float")));
    }
}
