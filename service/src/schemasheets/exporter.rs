//! Exporting a schema into a sheet shaped by a template
//!
//! The template is an ordinary sheet: its column names and descriptor lines
//! are written unchanged and its data rows are ignored.

use super::config::SchemaSheetsConfig;
use super::projector::SchemaProjector;
use super::sheet::{SchemaSheet, SheetReader, write_delimited};
use schemasheets_core::{LinkmlMetamodel, MetamodelProvider, Result, SchemaModel, SchemaSheetsError};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Writes schemas as sheets
pub struct SchemaExporter {
    metamodel: Arc<dyn MetamodelProvider>,
    config: SchemaSheetsConfig,
}

impl SchemaExporter {
    /// Create an exporter with the built-in `LinkML` metamodel
    #[must_use]
    pub fn new(config: SchemaSheetsConfig) -> Self {
        Self {
            metamodel: Arc::new(LinkmlMetamodel::new()),
            config,
        }
    }

    /// Use a different metamodel provider
    #[must_use]
    pub fn with_metamodel(mut self, metamodel: Arc<dyn MetamodelProvider>) -> Self {
        self.metamodel = metamodel;
        self
    }

    /// Read a template sheet
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be read or its header cannot
    /// be interpreted; workbooks must hold exactly one worksheet
    pub fn read_template(&self, path: &Path) -> Result<SchemaSheet> {
        let reader = SheetReader::new(self.metamodel.as_ref())
            .with_marker(self.config.sheet.descriptor_marker)
            .with_delimiter(self.config.sheet.delimiter_for(path)?);
        let mut sheets = reader.read_path(path)?;
        if sheets.len() != 1 {
            return Err(SchemaSheetsError::config(format!(
                "Template {} must hold exactly one sheet, found {}",
                path.display(),
                sheets.len()
            )));
        }
        let template = sheets.remove(0);
        if !template.rows.is_empty() {
            warn!(
                "ignoring {} data rows in template {}",
                template.rows.len(),
                template.name
            );
        }
        Ok(template)
    }

    /// Write `model` as rows of `template`
    ///
    /// # Errors
    ///
    /// Returns an IO or serialization error if writing fails
    pub fn export<W: Write>(
        &self,
        model: &SchemaModel,
        template: &SchemaSheet,
        writer: W,
        delimiter: u8,
    ) -> Result<usize> {
        let projector =
            SchemaProjector::new(&template.table, &self.config.maker.default_separator);
        let rows = projector.project(model);
        let descriptor_lines = if template.descriptor_lines.is_empty() {
            vec![template.table.descriptor_line(self.config.sheet.descriptor_marker)]
        } else {
            template.descriptor_lines.clone()
        };
        write_delimited(writer, &template.columns, &descriptor_lines, &rows, delimiter)?;
        info!("wrote {} rows for {}", rows.len(), model.schema_name());
        Ok(rows.len())
    }

    /// Export to a file, or to `writer` when no output path is given
    ///
    /// The delimiter follows the output file, else the template.
    ///
    /// # Errors
    ///
    /// Returns the first template, IO or serialization error
    pub fn export_with_template<W: Write>(
        &self,
        model: &SchemaModel,
        template_path: &Path,
        output: Option<&Path>,
        writer: W,
    ) -> Result<usize> {
        let template = self.read_template(template_path)?;
        match output {
            Some(path) => {
                let delimiter = self.config.sheet.delimiter_for(path)?;
                let file = std::fs::File::create(path).map_err(|e| {
                    SchemaSheetsError::io_error(format!("Cannot create {}: {e}", path.display()))
                })?;
                self.export(model, &template, file, delimiter)
            }
            None => {
                let delimiter = self.config.sheet.delimiter_for(template_path)?;
                self.export(model, &template, writer, delimiter)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemasheets_core::ElementKind;
    use serde_json::json;
    use std::fs;

    fn person_model() -> SchemaModel {
        let mut model = SchemaModel::new("personinfo");
        let person = model.top_level(ElementKind::Class, "Person");
        model.set(person, "description", json!("a person"));
        model
    }

    #[test]
    fn test_export_keeps_template_header() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.tsv");
        fs::write(&template, "class\tdesc\n>class\tdescription\nIgnored\tx\n").unwrap();

        let exporter = SchemaExporter::new(SchemaSheetsConfig::default());
        let mut out = Vec::new();
        let count = exporter
            .export_with_template(&person_model(), &template, None, &mut out)
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "class\tdesc\n>class\tdescription\nPerson\ta person\n"
        );
    }

    #[test]
    fn test_export_to_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.tsv");
        fs::write(&template, "class\tdesc\n>class\tdescription\n").unwrap();
        let output = dir.path().join("out.csv");

        let exporter = SchemaExporter::new(SchemaSheetsConfig::default());
        exporter
            .export_with_template(&person_model(), &template, Some(&output), std::io::sink())
            .unwrap();
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "class,desc\n>class,description\nPerson,a person\n"
        );
    }
}
