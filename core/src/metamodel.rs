//! Metamodel field lookup
//!
//! The mapping engine decides how to coerce and merge a cell by asking the
//! metamodel about the field a column targets: its range, whether it is
//! multivalued, and which element kinds carry it. [`MetamodelProvider`] is
//! the seam; [`LinkmlMetamodel`] is the built-in table of `LinkML` meta
//! slots. Providers are constructed explicitly and passed in, so two
//! sessions never share hidden lookup state.

use crate::element::ElementKind;
use crate::error::{Result, SchemaSheetsError};
use indexmap::IndexMap;

/// Value range of a metamodel field, as far as coercion is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    /// Free text
    String,
    /// `true`/`false`
    Boolean,
    /// Whole number
    Integer,
    /// URI or CURIE
    Uri,
    /// Name of another schema element
    Reference,
    /// Compound object addressed through an inner key
    Object,
    /// Mapping keyed by tag, such as annotations
    Keyed,
}

/// Description of one metamodel field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Canonical field name
    pub name: String,
    /// Key used when the field is serialized, if it differs from the name
    pub alias: Option<String>,
    /// Range of the field
    pub range: RangeKind,
    /// Whether the field holds a list
    pub multivalued: bool,
    /// Whether the metamodel requires the field
    pub required: bool,
    /// Element kinds the field can be set on; empty for fields only
    /// reachable inside compound values
    pub domain: Vec<ElementKind>,
}

impl FieldMeta {
    /// Key the field is stored and serialized under
    #[must_use]
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Whether the field range is boolean
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.range == RangeKind::Boolean
    }

    /// Whether elements of `kind` carry this field
    #[must_use]
    pub fn applies_to(&self, kind: ElementKind) -> bool {
        self.domain.contains(&kind)
    }
}

/// Read-only access to metamodel field definitions
pub trait MetamodelProvider: Send + Sync {
    /// Look up a field by canonical name or legacy alias
    fn field(&self, name: &str) -> Option<&FieldMeta>;

    /// All known fields
    fn fields(&self) -> Vec<&FieldMeta>;

    /// Fields carried by elements of `kind`
    fn fields_for(&self, kind: ElementKind) -> Vec<&FieldMeta> {
        self.fields()
            .into_iter()
            .filter(|f| f.applies_to(kind))
            .collect()
    }

    /// Look up a field, treating a miss as a configuration error
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::UnknownField` if the name is not a field
    fn lookup(&self, name: &str) -> Result<&FieldMeta> {
        self.field(name)
            .ok_or_else(|| SchemaSheetsError::unknown_field(name))
    }
}

use ElementKind::{Attribute, Class, Enum, PermissibleValue, Prefix, Schema, Setting, Slot, Subset, Type};

const DESCRIBED: &[ElementKind] = &[Schema, Class, Slot, Attribute, Enum, PermissibleValue, Type, Subset];
const DEFINITIONS: &[ElementKind] = &[Class, Slot, Attribute, Enum];
const HIERARCHY: &[ElementKind] = &[Class, Slot, Attribute, Enum, PermissibleValue];
const SLOTS: &[ElementKind] = &[Slot, Attribute];
const SLOTS_AND_TYPES: &[ElementKind] = &[Slot, Attribute, Type];
const EXPRESSIONS: &[ElementKind] = &[Class, Slot, Attribute, Type];
const CLASSES: &[ElementKind] = &[Class];
const CLASSES_AND_SLOTS: &[ElementKind] = &[Class, Slot, Attribute];
const CLASSES_SLOTS_TYPES: &[ElementKind] = &[Class, Slot, Attribute, Type];
const ENUMS: &[ElementKind] = &[Enum];
const VALUES: &[ElementKind] = &[PermissibleValue];
const TYPES: &[ElementKind] = &[Type];
const SCHEMAS: &[ElementKind] = &[Schema];
const PREFIXES: &[ElementKind] = &[Prefix];
const SETTINGS: &[ElementKind] = &[Setting];
const NESTED: &[ElementKind] = &[];

#[derive(Clone, Copy)]
enum Card {
    One,
    Many,
    Required,
}

use Card::{Many, One, Required};
use RangeKind::{Boolean, Integer, Keyed, Object, Reference, String as Text, Uri};

#[rustfmt::skip]
const LINKML_FIELDS: &[(&str, RangeKind, Card, &[ElementKind])] = &[
    // identity
    ("name", Text, Required, DESCRIBED),
    ("id", Uri, One, SCHEMAS),
    ("text", Text, Required, VALUES),
    ("prefix_prefix", Text, Required, PREFIXES),
    ("prefix_reference", Uri, Required, PREFIXES),
    ("setting_key", Text, Required, SETTINGS),
    ("setting_value", Text, Required, SETTINGS),
    // common metadata
    ("description", Text, One, DESCRIBED),
    ("title", Text, One, DESCRIBED),
    ("deprecated", Text, One, DESCRIBED),
    ("todos", Text, Many, DESCRIBED),
    ("notes", Text, Many, DESCRIBED),
    ("comments", Text, Many, DESCRIBED),
    ("examples", Object, Many, DESCRIBED),
    ("in_subset", Reference, Many, DESCRIBED),
    ("from_schema", Uri, One, DESCRIBED),
    ("imported_from", Text, One, DESCRIBED),
    ("source", Uri, One, DESCRIBED),
    ("in_language", Text, One, DESCRIBED),
    ("see_also", Uri, Many, DESCRIBED),
    ("deprecated_element_has_exact_replacement", Uri, One, DESCRIBED),
    ("deprecated_element_has_possible_replacement", Uri, One, DESCRIBED),
    ("aliases", Text, Many, DESCRIBED),
    ("structured_aliases", Object, Many, DESCRIBED),
    ("mappings", Uri, Many, DESCRIBED),
    ("exact_mappings", Uri, Many, DESCRIBED),
    ("close_mappings", Uri, Many, DESCRIBED),
    ("related_mappings", Uri, Many, DESCRIBED),
    ("narrow_mappings", Uri, Many, DESCRIBED),
    ("broad_mappings", Uri, Many, DESCRIBED),
    ("created_by", Uri, One, DESCRIBED),
    ("contributors", Uri, Many, DESCRIBED),
    ("created_on", Text, One, DESCRIBED),
    ("last_updated_on", Text, One, DESCRIBED),
    ("modified_by", Uri, One, DESCRIBED),
    ("status", Uri, One, DESCRIBED),
    ("rank", Integer, One, DESCRIBED),
    ("categories", Uri, Many, DESCRIBED),
    ("keywords", Text, Many, DESCRIBED),
    ("annotations", Keyed, Many, DESCRIBED),
    ("extensions", Keyed, Many, DESCRIBED),
    ("alt_descriptions", Keyed, Many, DESCRIBED),
    ("local_names", Keyed, Many, DESCRIBED),
    ("id_prefixes", Text, Many, DEFINITIONS),
    ("id_prefixes_are_closed", Boolean, One, DEFINITIONS),
    ("definition_uri", Uri, One, DEFINITIONS),
    ("conforms_to", Text, One, DESCRIBED),
    ("implements", Uri, Many, HIERARCHY),
    ("instantiates", Uri, Many, HIERARCHY),
    // definitions
    ("is_a", Reference, One, HIERARCHY),
    ("mixins", Reference, Many, HIERARCHY),
    ("abstract", Boolean, One, DEFINITIONS),
    ("mixin", Boolean, One, DEFINITIONS),
    ("apply_to", Reference, Many, DEFINITIONS),
    ("values_from", Uri, Many, DEFINITIONS),
    ("string_serialization", Text, One, DEFINITIONS),
    // classes
    ("slots", Reference, Many, CLASSES),
    ("class_uri", Uri, One, CLASSES),
    ("subclass_of", Uri, One, CLASSES),
    ("tree_root", Boolean, One, CLASSES),
    ("unique_keys", Keyed, Many, CLASSES),
    ("rules", Object, Many, CLASSES),
    ("classification_rules", Object, Many, CLASSES),
    ("slot_names_unique", Boolean, One, &[Schema, Class]),
    ("represents_relationship", Boolean, One, CLASSES),
    ("defining_slots", Reference, Many, CLASSES),
    ("union_of", Reference, Many, CLASSES_SLOTS_TYPES),
    ("disjoint_with", Reference, Many, CLASSES_AND_SLOTS),
    ("children_are_mutually_disjoint", Boolean, One, CLASSES_AND_SLOTS),
    ("any_of", Object, Many, EXPRESSIONS),
    ("exactly_one_of", Object, Many, EXPRESSIONS),
    ("none_of", Object, Many, EXPRESSIONS),
    ("all_of", Object, Many, EXPRESSIONS),
    // slots
    ("singular_name", Text, One, SLOTS),
    ("domain", Reference, One, SLOTS),
    ("slot_uri", Uri, One, SLOTS),
    ("multivalued", Boolean, One, SLOTS),
    ("array", Object, One, SLOTS),
    ("inherited", Boolean, One, SLOTS),
    ("readonly", Text, One, SLOTS),
    ("ifabsent", Text, One, SLOTS),
    ("list_elements_unique", Boolean, One, SLOTS),
    ("list_elements_ordered", Boolean, One, SLOTS),
    ("shared", Boolean, One, SLOTS),
    ("key", Boolean, One, SLOTS),
    ("identifier", Boolean, One, SLOTS),
    ("designates_type", Boolean, One, SLOTS),
    ("alias", Text, One, SLOTS),
    ("owner", Reference, One, SLOTS),
    ("domain_of", Reference, Many, SLOTS),
    ("subproperty_of", Reference, One, SLOTS),
    ("symmetric", Boolean, One, SLOTS),
    ("reflexive", Boolean, One, SLOTS),
    ("locally_reflexive", Boolean, One, SLOTS),
    ("irreflexive", Boolean, One, SLOTS),
    ("asymmetric", Boolean, One, SLOTS),
    ("transitive", Boolean, One, SLOTS),
    ("inverse", Reference, One, SLOTS),
    ("is_class_field", Boolean, One, SLOTS),
    ("transitive_form_of", Reference, One, SLOTS),
    ("reflexive_transitive_form_of", Reference, One, SLOTS),
    ("role", Text, One, SLOTS),
    ("is_usage_slot", Boolean, One, SLOTS),
    ("usage_slot_name", Text, One, SLOTS),
    ("relational_role", Text, One, SLOTS),
    ("slot_group", Reference, One, SLOTS),
    ("is_grouping_slot", Boolean, One, SLOTS),
    ("path_rule", Object, One, SLOTS),
    ("type_mappings", Reference, Many, SLOTS),
    ("range", Reference, One, SLOTS),
    ("range_expression", Object, One, SLOTS),
    ("enum_range", Object, One, SLOTS),
    ("bindings", Object, Many, SLOTS),
    ("required", Boolean, One, SLOTS),
    ("recommended", Boolean, One, SLOTS),
    ("inlined", Boolean, One, SLOTS),
    ("inlined_as_list", Boolean, One, SLOTS),
    ("minimum_value", Text, One, SLOTS_AND_TYPES),
    ("maximum_value", Text, One, SLOTS_AND_TYPES),
    ("pattern", Text, One, SLOTS_AND_TYPES),
    ("structured_pattern", Object, One, SLOTS_AND_TYPES),
    ("unit", Object, One, &[Slot, Attribute, Type, PermissibleValue]),
    ("implicit_prefix", Text, One, SLOTS_AND_TYPES),
    ("value_presence", Text, One, SLOTS),
    ("equals_string", Text, One, SLOTS_AND_TYPES),
    ("equals_string_in", Text, Many, SLOTS_AND_TYPES),
    ("equals_number", Integer, One, SLOTS_AND_TYPES),
    ("equals_expression", Text, One, SLOTS),
    ("exact_cardinality", Integer, One, SLOTS),
    ("minimum_cardinality", Integer, One, SLOTS),
    ("maximum_cardinality", Integer, One, SLOTS),
    ("has_member", Object, One, SLOTS),
    ("all_members", Object, One, SLOTS),
    // enums and permissible values
    ("enum_uri", Uri, One, ENUMS),
    ("code_set", Uri, One, ENUMS),
    ("code_set_tag", Text, One, ENUMS),
    ("code_set_version", Text, One, ENUMS),
    ("pv_formula", Text, One, ENUMS),
    ("include", Object, Many, ENUMS),
    ("minus", Object, Many, ENUMS),
    ("inherits", Reference, Many, ENUMS),
    ("reachable_from", Object, One, ENUMS),
    ("matches", Object, One, ENUMS),
    ("concepts", Uri, Many, ENUMS),
    ("meaning", Uri, One, VALUES),
    // types
    ("typeof", Reference, One, TYPES),
    ("base", Text, One, TYPES),
    ("repr", Text, One, TYPES),
    // schema
    ("version", Text, One, SCHEMAS),
    ("imports", Uri, Many, SCHEMAS),
    ("license", Text, One, SCHEMAS),
    ("emit_prefixes", Text, Many, SCHEMAS),
    ("default_curi_maps", Text, Many, SCHEMAS),
    ("default_prefix", Text, One, SCHEMAS),
    ("default_range", Reference, One, SCHEMAS),
    ("metamodel_version", Text, One, SCHEMAS),
    ("source_file", Text, One, SCHEMAS),
    ("source_file_date", Text, One, SCHEMAS),
    ("source_file_size", Integer, One, SCHEMAS),
    ("generation_date", Text, One, SCHEMAS),
    // fields reached through inner keys
    ("value", Text, One, NESTED),
    ("tag", Text, One, NESTED),
    ("syntax", Text, One, NESTED),
    ("interpolated", Boolean, One, NESTED),
    ("partial_match", Boolean, One, NESTED),
    ("symbol", Text, One, NESTED),
    ("exact_value", Text, One, NESTED),
    ("object", Text, One, NESTED),
    ("literal_form", Text, One, NESTED),
    ("predicate", Text, One, NESTED),
    ("binds_value_of", Text, One, NESTED),
    ("obligation_level", Text, One, NESTED),
    ("source_ontology", Uri, One, NESTED),
    ("relationship_types", Uri, Many, NESTED),
    ("is_direct", Boolean, One, NESTED),
    ("include_self", Boolean, One, NESTED),
    ("traverse_up", Boolean, One, NESTED),
    ("source_nodes", Uri, Many, NESTED),
    ("ucum_code", Text, One, NESTED),
    ("iec61360code", Text, One, NESTED),
];

/// Fields whose name in a header differs from the canonical field name
const LEGACY_ALIASES: &[(&str, &str)] = &[("uri", "type_uri")];

/// The `LinkML` metamodel fields known to the mapping engine
#[derive(Debug, Clone)]
pub struct LinkmlMetamodel {
    fields: IndexMap<String, FieldMeta>,
}

impl LinkmlMetamodel {
    /// Build the field table
    #[must_use]
    pub fn new() -> Self {
        let mut fields = IndexMap::with_capacity(LINKML_FIELDS.len() + 1);
        for &(name, range, card, domain) in LINKML_FIELDS {
            fields.insert(
                name.to_string(),
                FieldMeta {
                    name: name.to_string(),
                    alias: None,
                    range,
                    multivalued: matches!(card, Many),
                    required: matches!(card, Required),
                    domain: domain.to_vec(),
                },
            );
        }
        fields.insert(
            "type_uri".to_string(),
            FieldMeta {
                name: "type_uri".to_string(),
                alias: Some("uri".to_string()),
                range: Uri,
                multivalued: false,
                required: false,
                domain: TYPES.to_vec(),
            },
        );
        Self { fields }
    }

    /// Add or replace a field definition
    pub fn insert(&mut self, field: FieldMeta) {
        self.fields.insert(field.name.clone(), field);
    }
}

impl Default for LinkmlMetamodel {
    fn default() -> Self {
        Self::new()
    }
}

impl MetamodelProvider for LinkmlMetamodel {
    fn field(&self, name: &str) -> Option<&FieldMeta> {
        let canonical = LEGACY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == name)
            .map_or(name, |(_, target)| *target);
        self.fields.get(canonical)
    }

    fn fields(&self) -> Vec<&FieldMeta> {
        self.fields.values().collect()
    }
}
