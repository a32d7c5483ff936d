//! Table configuration: the ordered set of column configurations of a sheet

use super::column::{ColumnConfig, Descriptor};
use super::settings::flow_scalar;
use indexmap::IndexMap;
use schemasheets_core::{ElementKind, Result, SchemaSheetsError};

/// Column configurations plus the role indexes derived from them
#[derive(Debug, Clone, Default)]
pub struct TableConfig {
    columns: IndexMap<String, ColumnConfig>,
    column_by_element_kind: IndexMap<ElementKind, String>,
    metatype_column: Option<String>,
    name_column: Option<String>,
}

impl TableConfig {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column and register the roles it claims
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Config` if the column is already present
    /// or another column already holds one of its roles
    pub fn add_column(&mut self, column: ColumnConfig) -> Result<()> {
        if self.columns.contains_key(&column.name) {
            return Err(SchemaSheetsError::config_at(
                format!("Column '{}' configured twice", column.name),
                column.name.clone(),
            ));
        }
        match &column.descriptor {
            Descriptor::Element(kind) => {
                claim(&mut self.column_by_element_kind.get(kind).cloned(), &column.name, kind.tag())?;
                self.column_by_element_kind
                    .insert(*kind, column.name.clone());
            }
            Descriptor::Metatype => {
                claim(&mut self.metatype_column, &column.name, "metatype")?;
            }
            Descriptor::Field(_) if column.is_name_column() => {
                claim(&mut self.name_column, &column.name, "name")?;
            }
            Descriptor::Field(_) | Descriptor::Cardinality | Descriptor::Ignore => {}
        }
        self.columns.insert(column.name.clone(), column);
        Ok(())
    }

    /// Check cross-column constraints once all columns are known
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Config` if a metatype column has no
    /// companion name column
    pub fn validate(&self) -> Result<()> {
        if let (Some(metatype), None) = (&self.metatype_column, &self.name_column) {
            return Err(SchemaSheetsError::config_at(
                format!("Metatype column '{metatype}' requires a name column"),
                metatype.clone(),
            ));
        }
        Ok(())
    }

    /// Look up a column by name
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnConfig> {
        self.columns.get(name)
    }

    /// Mutable access to a column
    pub fn column_mut(&mut self, name: &str) -> Option<&mut ColumnConfig> {
        self.columns.get_mut(name)
    }

    /// Columns in sheet order
    pub fn columns(&self) -> impl Iterator<Item = &ColumnConfig> {
        self.columns.values()
    }

    /// Column names in sheet order
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Number of configured columns
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether no column is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column naming elements of `kind`
    #[must_use]
    pub fn column_for_kind(&self, kind: ElementKind) -> Option<&str> {
        self.column_by_element_kind.get(&kind).map(String::as_str)
    }

    /// Element kind discriminator columns, in the order they were declared
    pub fn element_columns(&self) -> impl Iterator<Item = (ElementKind, &str)> {
        self.column_by_element_kind
            .iter()
            .map(|(kind, name)| (*kind, name.as_str()))
    }

    /// Column holding `class`/`slot` metatypes
    #[must_use]
    pub fn metatype_column(&self) -> Option<&str> {
        self.metatype_column.as_deref()
    }

    /// Column holding element names in a metatype table
    #[must_use]
    pub fn name_column(&self) -> Option<&str> {
        self.name_column.as_deref()
    }

    /// One descriptor line reproducing this configuration, first cell marked
    #[must_use]
    pub fn descriptor_line(&self, marker: char) -> Vec<String> {
        self.columns
            .values()
            .enumerate()
            .map(|(i, column)| {
                let cell = if column.settings.is_empty() {
                    flow_scalar(&column.maps_to)
                } else {
                    column.descriptor_cell()
                };
                if i == 0 { format!("{marker}{cell}") } else { cell }
            })
            .collect()
    }
}

fn claim(holder: &mut Option<String>, column: &str, role: &str) -> Result<()> {
    match holder {
        Some(existing) if existing != column => Err(SchemaSheetsError::config_at(
            format!("Ambiguous table: columns '{existing}' and '{column}' both claim {role}"),
            column.to_string(),
        )),
        _ => {
            *holder = Some(column.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemasheets_core::LinkmlMetamodel;

    fn column(name: &str, maps_to: &str) -> ColumnConfig {
        ColumnConfig::new(name, maps_to, &LinkmlMetamodel::new()).unwrap()
    }

    #[test]
    fn test_roles_are_registered() {
        let mut table = TableConfig::new();
        table.add_column(column("record", "class")).unwrap();
        table.add_column(column("field", "slot")).unwrap();
        table.add_column(column("desc", "description")).unwrap();
        assert_eq!(table.column_for_kind(ElementKind::Class), Some("record"));
        assert_eq!(table.column_for_kind(ElementKind::Slot), Some("field"));
        assert_eq!(table.column_for_kind(ElementKind::Enum), None);
        assert_eq!(table.column_names(), vec!["record", "field", "desc"]);
    }

    #[test]
    fn test_duplicate_role_rejected() {
        let mut table = TableConfig::new();
        table.add_column(column("a", "class")).unwrap();
        let err = table.add_column(column("b", "class")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("'a'") && message.contains("'b'"));

        let mut table = TableConfig::new();
        table.add_column(column("t1", "metatype")).unwrap();
        assert!(table.add_column(column("t2", "metatype")).is_err());
    }

    #[test]
    fn test_metatype_requires_name() {
        let mut table = TableConfig::new();
        table.add_column(column("kind", "metatype")).unwrap();
        assert!(table.validate().is_err());
        table.add_column(column("name", "name")).unwrap();
        assert!(table.validate().is_ok());
        assert_eq!(table.name_column(), Some("name"));
    }

    #[test]
    fn test_descriptor_line() {
        let mut table = TableConfig::new();
        table.add_column(column("record", "class")).unwrap();
        let mut mapped = column("schema.org", "exact_mappings");
        mapped.settings.curie_prefix = Some("sdo".to_string());
        table.add_column(mapped).unwrap();
        assert_eq!(
            table.descriptor_line('>'),
            vec![">class", "exact_mappings: {curie_prefix: sdo}"]
        );
    }
}
