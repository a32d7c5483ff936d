//! Focal element resolution
//!
//! Works out which schema elements a data row describes. The element kind
//! columns populated in the row select exactly one [`RowShape`]; every shape
//! lists the kind columns it tolerates, and any other populated kind column
//! is an error.

use super::column::ColumnConfig;
use super::normalize::normalize_text;
use super::session::SessionOptions;
use super::sheet::Row;
use super::table::TableConfig;
use bitflags::bitflags;
use indexmap::IndexMap;
use schemasheets_core::{ElementId, ElementKind, Result, SchemaModel, SchemaSheetsError, Value};
use std::fmt;

/// Separator between several element names in one kind column
pub const NAME_SEPARATOR: char = '|';

bitflags! {
    /// Set of element kinds
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct KindSet: u16 {
        /// Schema
        const SCHEMA = 1;
        /// Class
        const CLASS = 1 << 1;
        /// Slot
        const SLOT = 1 << 2;
        /// Attribute
        const ATTRIBUTE = 1 << 3;
        /// Enum
        const ENUM = 1 << 4;
        /// Permissible value
        const PERMISSIBLE_VALUE = 1 << 5;
        /// Type
        const TYPE = 1 << 6;
        /// Subset
        const SUBSET = 1 << 7;
        /// Prefix
        const PREFIX = 1 << 8;
        /// Setting
        const SETTING = 1 << 9;
    }
}

impl From<ElementKind> for KindSet {
    fn from(kind: ElementKind) -> Self {
        match kind {
            ElementKind::Schema => Self::SCHEMA,
            ElementKind::Class => Self::CLASS,
            ElementKind::Slot => Self::SLOT,
            ElementKind::Attribute => Self::ATTRIBUTE,
            ElementKind::Enum => Self::ENUM,
            ElementKind::PermissibleValue => Self::PERMISSIBLE_VALUE,
            ElementKind::Type => Self::TYPE,
            ElementKind::Subset => Self::SUBSET,
            ElementKind::Prefix => Self::PREFIX,
            ElementKind::Setting => Self::SETTING,
        }
    }
}

/// The combinations of kind columns a row may populate, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Slot or attribute in the context of one or more classes
    SlotInClass,
    /// Top-level slot
    Slot,
    /// One or more classes
    Class,
    /// Enum, optionally with permissible values
    Enum,
    /// Prefix declaration
    Prefix,
    /// One or more types
    Type,
    /// One or more subsets
    Subset,
    /// Schema setting
    Setting,
    /// The schema itself
    Schema,
}

impl RowShape {
    /// Pick the shape for the populated kinds
    #[must_use]
    pub fn classify(present: KindSet) -> Option<Self> {
        let shape = if present.intersects(KindSet::SLOT | KindSet::ATTRIBUTE) {
            if present.contains(KindSet::CLASS) {
                Self::SlotInClass
            } else {
                Self::Slot
            }
        } else if present.contains(KindSet::CLASS) {
            Self::Class
        } else if present.contains(KindSet::ENUM) {
            Self::Enum
        } else if present.contains(KindSet::PREFIX) {
            Self::Prefix
        } else if present.contains(KindSet::TYPE) {
            Self::Type
        } else if present.contains(KindSet::SUBSET) {
            Self::Subset
        } else if present.contains(KindSet::SETTING) {
            Self::Setting
        } else if present.contains(KindSet::SCHEMA) {
            Self::Schema
        } else {
            return None;
        };
        Some(shape)
    }

    /// Kinds a row of this shape may populate; the schema column is always
    /// tolerated
    #[must_use]
    pub fn allowed(self) -> KindSet {
        let own = match self {
            Self::SlotInClass => KindSet::SLOT | KindSet::ATTRIBUTE | KindSet::CLASS,
            Self::Slot => KindSet::SLOT | KindSet::ATTRIBUTE,
            Self::Class => KindSet::CLASS,
            Self::Enum => KindSet::ENUM | KindSet::PERMISSIBLE_VALUE,
            Self::Prefix => KindSet::PREFIX,
            Self::Type => KindSet::TYPE,
            Self::Subset => KindSet::SUBSET,
            Self::Setting => KindSet::SETTING,
            Self::Schema => KindSet::SCHEMA,
        };
        own | KindSet::SCHEMA
    }
}

impl fmt::Display for RowShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::SlotInClass => "slot-in-class",
            Self::Slot => "slot",
            Self::Class => "class",
            Self::Enum => "enum",
            Self::Prefix => "prefix",
            Self::Type => "type",
            Self::Subset => "subset",
            Self::Setting => "setting",
            Self::Schema => "schema",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Default)]
struct KindEntry {
    columns: Vec<String>,
    names: Vec<String>,
}

/// Resolves data rows to the elements they describe
pub struct FocalElementResolver<'a> {
    table: &'a TableConfig,
    options: &'a SessionOptions,
}

impl<'a> FocalElementResolver<'a> {
    /// Create a resolver for one table
    #[must_use]
    pub fn new(table: &'a TableConfig, options: &'a SessionOptions) -> Self {
        Self { table, options }
    }

    /// Resolve a row to its focal elements, creating them as needed
    ///
    /// With a `context` column carrying `applies_to_class`, that class is
    /// used as the row's class.
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::RowInterpretation` if no focal element
    /// can be found, unexpected kind columns are populated, or a kind column
    /// holds the wrong number of names
    pub fn resolve(
        &self,
        model: &mut SchemaModel,
        row: &Row,
        context: Option<&ColumnConfig>,
    ) -> Result<Vec<ElementId>> {
        let entries = self.collect(row, context)?;
        let present = entries
            .keys()
            .fold(KindSet::empty(), |acc, kind| acc | KindSet::from(*kind));
        let shape = RowShape::classify(present).ok_or_else(|| {
            SchemaSheetsError::row_interpretation("Could not find a focal element for row")
        })?;
        check_excess(shape, present, &entries)?;

        if let Some(schema) = entries.get(&ElementKind::Schema) {
            let name = single(ElementKind::Schema, schema)?;
            model.rename_schema(name);
        }
        self.materialize(model, shape, present, &entries)
    }

    fn collect(
        &self,
        row: &Row,
        context: Option<&ColumnConfig>,
    ) -> Result<IndexMap<ElementKind, KindEntry>> {
        let mut entries: IndexMap<ElementKind, KindEntry> = IndexMap::new();

        if let Some(metatype_column) = self.table.metatype_column() {
            if let Some(metatype) = self.cell(row, metatype_column) {
                let kind = match metatype.as_str() {
                    "class" => ElementKind::Class,
                    "slot" => ElementKind::Slot,
                    other => {
                        return Err(SchemaSheetsError::row_interpretation(format!(
                            "Unknown metatype '{other}' in column '{metatype_column}', expected class or slot"
                        )));
                    }
                };
                let name_column = self.table.name_column().ok_or_else(|| {
                    SchemaSheetsError::config("Metatype column requires a name column")
                })?;
                let name = self.cell(row, name_column).ok_or_else(|| {
                    SchemaSheetsError::row_interpretation(format!(
                        "Row has metatype '{metatype}' but no name in column '{name_column}'"
                    ))
                })?;
                let entry = entries.entry(kind).or_default();
                entry.columns.push(metatype_column.to_string());
                entry.names.push(name);
            }
        }

        for (kind, column_name) in self.table.element_columns() {
            let (Some(raw), Some(column)) = (row.get(column_name), self.table.column(column_name))
            else {
                continue;
            };
            let names: Vec<String> = raw
                .split(NAME_SEPARATOR)
                .filter_map(|piece| normalize_text(piece, column))
                .collect();
            if names.is_empty() {
                continue;
            }
            let entry = entries.entry(kind).or_default();
            entry.columns.push(column_name.to_string());
            entry.names.extend(names);
        }

        if let Some(class) = context.and_then(|c| c.settings.applies_to_class.as_ref().map(|cls| (c, cls))) {
            let (column, class_name) = class;
            if let Some(existing) = entries.get(&ElementKind::Class) {
                return Err(SchemaSheetsError::row_interpretation(format!(
                    "Cannot use applies_to_class of column '{}' in a row that names a class in column '{}'",
                    column.name,
                    existing.columns.join(", ")
                )));
            }
            entries.insert(
                ElementKind::Class,
                KindEntry {
                    columns: vec![column.name.clone()],
                    names: vec![class_name.clone()],
                },
            );
        }
        Ok(entries)
    }

    fn cell(&self, row: &Row, column_name: &str) -> Option<String> {
        let raw = row.get(column_name)?;
        let column = self.table.column(column_name)?;
        normalize_text(raw, column)
    }

    fn materialize(
        &self,
        model: &mut SchemaModel,
        shape: RowShape,
        present: KindSet,
        entries: &IndexMap<ElementKind, KindEntry>,
    ) -> Result<Vec<ElementId>> {
        let entry = |kind: ElementKind| entries.get(&kind).map_or(&[][..], |e| e.names.as_slice());
        let mut focal = Vec::new();
        match shape {
            RowShape::SlotInClass | RowShape::Slot => {
                if present.contains(KindSet::SLOT | KindSet::ATTRIBUTE) {
                    return Err(SchemaSheetsError::row_interpretation(
                        "Cannot have both slot and attribute columns populated in one row",
                    ));
                }
                let kind = if present.contains(KindSet::ATTRIBUTE) {
                    ElementKind::Attribute
                } else {
                    ElementKind::Slot
                };
                let name = single(kind, &entries[&kind])?;
                if shape == RowShape::Slot {
                    if kind == ElementKind::Attribute {
                        return Err(SchemaSheetsError::row_interpretation(format!(
                            "Attribute '{name}' needs a class"
                        )));
                    }
                    focal.push(model.top_level(ElementKind::Slot, name));
                } else {
                    for class_name in entry(ElementKind::Class) {
                        let class = model.top_level(ElementKind::Class, class_name);
                        let id = if kind == ElementKind::Attribute || self.options.use_attributes {
                            model.get_or_create(ElementKind::Attribute, class, name)
                        } else {
                            model.append(class, "slots", [Value::String(name.to_string())]);
                            let slot = model.top_level(ElementKind::Slot, name);
                            if self.options.unique_slots {
                                slot
                            } else {
                                model.get_or_create(ElementKind::Slot, class, name)
                            }
                        };
                        if !focal.contains(&id) {
                            focal.push(id);
                        }
                    }
                }
            }
            RowShape::Class => {
                for name in entry(ElementKind::Class) {
                    focal.push(model.top_level(ElementKind::Class, name));
                }
            }
            RowShape::Enum => {
                let name = single(ElementKind::Enum, &entries[&ElementKind::Enum])?;
                let enum_id = model.top_level(ElementKind::Enum, name);
                let values = entry(ElementKind::PermissibleValue);
                if values.is_empty() {
                    focal.push(enum_id);
                }
                for value in values {
                    focal.push(model.get_or_create(ElementKind::PermissibleValue, enum_id, value));
                }
            }
            RowShape::Prefix | RowShape::Setting => {
                let kind = if shape == RowShape::Prefix {
                    ElementKind::Prefix
                } else {
                    ElementKind::Setting
                };
                let name = single(kind, &entries[&kind])?;
                focal.push(model.top_level(kind, name));
            }
            RowShape::Type | RowShape::Subset => {
                let kind = if shape == RowShape::Type {
                    ElementKind::Type
                } else {
                    ElementKind::Subset
                };
                for name in entry(kind) {
                    focal.push(model.top_level(kind, name));
                }
            }
            RowShape::Schema => focal.push(model.root()),
        }
        Ok(focal)
    }
}

fn check_excess(
    shape: RowShape,
    present: KindSet,
    entries: &IndexMap<ElementKind, KindEntry>,
) -> Result<()> {
    let excess = present.difference(shape.allowed());
    if excess.is_empty() {
        return Ok(());
    }
    let columns_of = |wanted: bool| -> Vec<String> {
        entries
            .iter()
            .filter(|(kind, _)| excess.contains(KindSet::from(**kind)) == wanted)
            .flat_map(|(_, e)| e.columns.iter().map(|c| format!("'{c}'")))
            .collect()
    };
    Err(SchemaSheetsError::row_interpretation(format!(
        "Unexpected element columns {} in a {shape} row that also populates {}",
        columns_of(true).join(", "),
        columns_of(false).join(", ")
    )))
}

fn single(kind: ElementKind, entry: &KindEntry) -> Result<&str> {
    match entry.names.as_slice() {
        [name] => Ok(name),
        names => Err(SchemaSheetsError::row_interpretation(format!(
            "Expected exactly one {kind} in column {}, got {}: {}",
            entry.columns.join(", "),
            names.len(),
            names.join("|")
        ))),
    }
}
