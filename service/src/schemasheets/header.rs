//! Header interpretation
//!
//! Descriptor lines sit between the column-name line and the data. Their
//! first cell starts with a marker (`>` by default). Each cell holds either
//! a bare descriptor (`description`) or a one-key mapping whose value holds
//! settings (`exact_mappings: {curie_prefix: sdo}`). The first line a column
//! appears in fixes its descriptor; later lines and table configuration
//! files only add settings.

use super::column::ColumnConfig;
use super::settings::ColumnSettings;
use super::table::TableConfig;
use schemasheets_core::{MetamodelProvider, Result, SchemaSheetsError};
use serde_yaml::Value as YamlValue;
use std::path::Path;
use tracing::debug;

/// Default marker character of descriptor lines
pub const DEFAULT_MARKER: char = '>';

/// Builds a [`TableConfig`] from descriptor lines and table config files
pub struct HeaderInterpreter<'m> {
    metamodel: &'m dyn MetamodelProvider,
    marker: char,
    columns: Vec<String>,
    table: TableConfig,
    lines_seen: usize,
}

impl<'m> HeaderInterpreter<'m> {
    /// Create an interpreter for a sheet with the given column names
    #[must_use]
    pub fn new(metamodel: &'m dyn MetamodelProvider, columns: Vec<String>) -> Self {
        Self {
            metamodel,
            marker: DEFAULT_MARKER,
            columns,
            table: TableConfig::new(),
            lines_seen: 0,
        }
    }

    /// Use a different descriptor marker
    #[must_use]
    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }

    /// Interpret all descriptor lines of a sheet in one go
    ///
    /// # Errors
    ///
    /// Returns a configuration error for any uninterpretable cell or
    /// inconsistent table
    pub fn interpret(
        metamodel: &'m dyn MetamodelProvider,
        columns: Vec<String>,
        lines: &[Vec<String>],
    ) -> Result<TableConfig> {
        let mut interpreter = Self::new(metamodel, columns);
        for line in lines {
            interpreter.add_line(line)?;
        }
        interpreter.finish()
    }

    /// Whether a raw line is a descriptor line
    #[must_use]
    pub fn is_descriptor_line(cells: &[String], marker: char) -> bool {
        cells.first().is_some_and(|c| c.trim_start().starts_with(marker))
    }

    /// Interpret one descriptor line, cells aligned with the column names
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Config` if a cell cannot be interpreted,
    /// or a column is left without a descriptor on the first line
    pub fn add_line(&mut self, cells: &[String]) -> Result<()> {
        self.lines_seen += 1;
        let first_line = self.lines_seen == 1;
        let columns = self.columns.clone();
        for (i, column) in columns.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            let raw = cells.get(i).map_or("", String::as_str);
            let text = raw.trim().trim_start_matches(self.marker).trim();
            if text.is_empty() {
                if first_line && self.table.column(column).is_none() {
                    return Err(SchemaSheetsError::config_at(
                        format!("Enter an interpretation for column '{column}'"),
                        column.clone(),
                    ));
                }
                continue;
            }
            let parsed: YamlValue = serde_yaml::from_str(text).map_err(|e| {
                SchemaSheetsError::config_at(
                    format!("Cannot parse descriptor '{text}' of column '{column}': {e}"),
                    column.clone(),
                )
            })?;
            self.add_descriptor(column, &parsed)?;
        }
        Ok(())
    }

    /// Apply one descriptor or settings entry to a column
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the entry cannot be interpreted
    pub fn add_descriptor(&mut self, column: &str, entry: &YamlValue) -> Result<()> {
        if self.table.column(column).is_some() {
            let settings = match entry {
                YamlValue::Mapping(_) => ColumnSettings::from_yaml(entry),
                _ => Err(SchemaSheetsError::config(format!(
                    "Column '{column}' already has a descriptor; expected settings"
                ))),
            }
            .map_err(|e| with_column(e, column))?;
            let metamodel = self.metamodel;
            if let Some(config) = self.table.column_mut(column) {
                config.merge_settings(settings, metamodel)?;
            }
            return Ok(());
        }

        let (maps_to, settings) = match entry {
            YamlValue::String(descriptor) => (descriptor.clone(), ColumnSettings::default()),
            YamlValue::Mapping(map) if map.len() == 1 => {
                let Some((key, value)) = map.iter().next() else {
                    return Err(SchemaSheetsError::config_at("empty descriptor", column));
                };
                let Some(maps_to) = key.as_str() else {
                    return Err(SchemaSheetsError::config_at(
                        format!("Descriptor of column '{column}' must be a name"),
                        column,
                    ));
                };
                let settings = ColumnSettings::from_yaml(value).map_err(|e| with_column(e, column))?;
                (maps_to.to_string(), settings)
            }
            _ => {
                return Err(SchemaSheetsError::config_at(
                    format!(
                        "Descriptor of column '{column}' must be a name or a single `name: {{settings}}` entry"
                    ),
                    column,
                ));
            }
        };
        let mut config = ColumnConfig::new(column, maps_to.trim(), self.metamodel)?;
        config.merge_settings(settings, self.metamodel)?;
        debug!("column '{}' maps to {:?}", column, config.descriptor);
        self.table.add_column(config)
    }

    /// Apply a table configuration document: column name to a descriptor
    /// or a list of descriptor and settings entries
    ///
    /// Columns the sheet does not have are skipped; a document applied to
    /// an interpreter without columns defines them.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an entry cannot be interpreted
    pub fn apply_table_config(&mut self, doc: &YamlValue) -> Result<()> {
        let doc = doc.get("columns").unwrap_or(doc);
        let YamlValue::Mapping(entries) = doc else {
            return Err(SchemaSheetsError::config(
                "Table configuration must map column names to descriptors",
            ));
        };
        let define_columns = self.columns.is_empty();
        for (key, entry) in entries {
            let Some(column) = key.as_str() else {
                return Err(SchemaSheetsError::config(
                    "Table configuration keys must be column names",
                ));
            };
            if define_columns {
                self.columns.push(column.to_string());
            } else if !self.columns.iter().any(|c| c == column) {
                debug!("table configuration names unknown column '{}'", column);
                continue;
            }
            match entry {
                YamlValue::Sequence(items) => {
                    for item in items {
                        self.add_descriptor(column, item)?;
                    }
                }
                other => self.add_descriptor(column, other)?,
            }
        }
        Ok(())
    }

    /// Read and apply a table configuration file
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a configuration
    /// error if it cannot be interpreted
    pub fn apply_table_config_file(&mut self, path: &Path) -> Result<()> {
        let doc = load_table_config(path)?;
        self.apply_table_config(&doc)
    }

    /// Finish interpretation and validate the table
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Config` if a named column has no
    /// interpretation or the table violates a role constraint
    pub fn finish(self) -> Result<TableConfig> {
        if let Some(missing) = self
            .columns
            .iter()
            .find(|c| !c.is_empty() && self.table.column(c).is_none())
        {
            return Err(SchemaSheetsError::config_at(
                format!("No interpretation for column '{missing}'"),
                missing.clone(),
            ));
        }
        self.table.validate()?;
        Ok(self.table)
    }
}

/// Parse a table configuration file
///
/// # Errors
///
/// Returns an IO error if the file cannot be read, or a configuration error
/// if it is not YAML
pub fn load_table_config(path: &Path) -> Result<YamlValue> {
    let text = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|e| {
        SchemaSheetsError::config(format!(
            "Cannot parse table configuration {}: {e}",
            path.display()
        ))
    })
}

fn with_column(err: SchemaSheetsError, column: &str) -> SchemaSheetsError {
    match err {
        SchemaSheetsError::Config { message, column: None } => SchemaSheetsError::config_at(
            format!("{message} (column '{column}')"),
            column,
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemasheets::column::Descriptor;
    use schemasheets_core::{ElementKind, LinkmlMetamodel};

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_single_descriptor_line() {
        let mm = LinkmlMetamodel::new();
        let table = HeaderInterpreter::interpret(
            &mm,
            cells(&["record", "field", "desc", "schema.org"]),
            &[cells(&[">class", "slot", "description", "exact_mappings: {curie_prefix: sdo}"])],
        )
        .unwrap();
        assert_eq!(table.column_for_kind(ElementKind::Class), Some("record"));
        assert_eq!(table.column_for_kind(ElementKind::Slot), Some("field"));
        let mappings = table.column("schema.org").unwrap();
        assert_eq!(mappings.settings.curie_prefix.as_deref(), Some("sdo"));
        assert!(mappings.resolved_field().unwrap().multivalued);
    }

    #[test]
    fn test_second_line_adds_settings_without_override() {
        let mm = LinkmlMetamodel::new();
        let table = HeaderInterpreter::interpret(
            &mm,
            cells(&["record", "wd"]),
            &[
                cells(&[">class", "exact_mappings: {curie_prefix: wikidata}"]),
                cells(&[">", "curie_prefix: wd"]),
                cells(&[">", "internal_separator: ';'"]),
            ],
        )
        .unwrap();
        let wd = table.column("wd").unwrap();
        assert_eq!(wd.settings.curie_prefix.as_deref(), Some("wikidata"));
        assert_eq!(wd.settings.internal_separator.as_deref(), Some(";"));
    }

    #[test]
    fn test_inner_key_on_later_line() {
        let mm = LinkmlMetamodel::new();
        let table = HeaderInterpreter::interpret(
            &mm,
            cells(&["slot", "syntax"]),
            &[
                cells(&[">slot", "structured_pattern"]),
                cells(&[">", "inner_key: syntax"]),
            ],
        )
        .unwrap();
        let column = table.column("syntax").unwrap();
        assert_eq!(column.inner_key_field.as_ref().unwrap().name, "syntax");
    }

    #[test]
    fn test_empty_first_line_cell_is_error() {
        let mm = LinkmlMetamodel::new();
        let err = HeaderInterpreter::interpret(
            &mm,
            cells(&["record", "info"]),
            &[cells(&[">class", ""])],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Enter an interpretation for column 'info'"));
    }

    #[test]
    fn test_unknown_descriptor_is_error() {
        let mm = LinkmlMetamodel::new();
        let err = HeaderInterpreter::interpret(
            &mm,
            cells(&["record", "info"]),
            &[cells(&[">class", "frobnicate"])],
        )
        .unwrap_err();
        assert_eq!(
            err.category(),
            schemasheets_core::ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_table_config_document() {
        let mm = LinkmlMetamodel::new();
        let doc: YamlValue = serde_yaml::from_str(
            "record: class\nfield: slot\nkey:\n  - identifier\n  - vmap: {Y: 'true'}\nunused: description\n",
        )
        .unwrap();
        let mut interpreter =
            HeaderInterpreter::new(&mm, cells(&["record", "field", "key"]));
        interpreter.apply_table_config(&doc).unwrap();
        let table = interpreter.finish().unwrap();
        assert_eq!(table.len(), 3);
        let key = table.column("key").unwrap();
        assert!(matches!(&key.descriptor, Descriptor::Field(f) if f.name == "identifier"));
        assert_eq!(key.settings.vmap.as_ref().unwrap().lookup("Y"), Some("true"));
    }

    #[test]
    fn test_unconfigured_column_is_error() {
        let mm = LinkmlMetamodel::new();
        let interpreter = HeaderInterpreter::new(&mm, cells(&["record"]));
        assert!(interpreter.finish().is_err());
    }

    #[test]
    fn test_descriptor_line_detection() {
        assert!(HeaderInterpreter::is_descriptor_line(&cells(&["> class", "x"]), '>'));
        assert!(!HeaderInterpreter::is_descriptor_line(&cells(&["Person", "x"]), '>'));
    }
}
