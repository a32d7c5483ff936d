//! Building a schema from sheet files
//!
//! The maker reads each sheet, merges it into one session in order,
//! finalizes the schema against the optional base schema and repairs
//! undeclared prefixes and subsets.

use super::config::SchemaSheetsConfig;
use super::header::load_table_config;
use super::repair::RepairPass;
use super::schema_io::load_schema;
use super::session::SchemaSession;
use super::sheet::{SchemaSheet, SheetReader};
use schemasheets_core::{LinkmlMetamodel, MetamodelProvider, Result, SchemaModel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Creates schemas from sheets
pub struct SchemaMaker {
    metamodel: Arc<dyn MetamodelProvider>,
    config: SchemaSheetsConfig,
}

impl SchemaMaker {
    /// Create a maker with the built-in `LinkML` metamodel
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

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &SchemaSheetsConfig {
        &self.config
    }

    /// Read sheet files; workbooks contribute every worksheet
    ///
    /// # Errors
    ///
    /// Returns an IO, parse or configuration error for the first sheet that
    /// cannot be read
    pub fn read_sheets(&self, paths: &[PathBuf]) -> Result<Vec<SchemaSheet>> {
        let table_config = self
            .config
            .maker
            .table_config_path
            .as_deref()
            .map(load_table_config)
            .transpose()?;
        let mut sheets = Vec::new();
        for path in paths {
            let mut reader = SheetReader::new(self.metamodel.as_ref())
                .with_marker(self.config.sheet.descriptor_marker)
                .with_delimiter(self.config.sheet.delimiter_for(path)?);
            if let Some(doc) = &table_config {
                reader = reader.with_table_config(doc.clone());
            }
            info!("READING {}", path.display());
            sheets.extend(reader.read_path(path)?);
        }
        Ok(sheets)
    }

    /// Create a schema from sheet files
    ///
    /// # Errors
    ///
    /// Returns the first reading, header or row error
    pub fn create_schema(&self, paths: &[PathBuf]) -> Result<SchemaModel> {
        let sheets = self.read_sheets(paths)?;
        self.merge_sheets(&sheets)
    }

    /// Create a schema from sheets already read
    ///
    /// # Errors
    ///
    /// Returns the first row error, or an error loading the base schema or
    /// the cardinality vocabulary
    pub fn merge_sheets(&self, sheets: &[SchemaSheet]) -> Result<SchemaModel> {
        let maker = &self.config.maker;
        let base = maker
            .base_schema_path
            .as_deref()
            .map(load_base)
            .transpose()?;
        let name = maker
            .schema_name
            .as_deref()
            .or_else(|| base.as_ref().map(SchemaModel::schema_name));
        let mut session =
            SchemaSession::new(name, Arc::clone(&self.metamodel), maker.session_options()?);
        for sheet in sheets {
            session.merge_sheet(sheet)?;
        }
        let mut model = session.finalize(base.as_ref());
        if maker.repair {
            let report = RepairPass::new().run(&mut model);
            info!(
                "repair declared {} prefixes and {} subsets",
                report.prefixes_added.len(),
                report.subsets_added.len()
            );
        }
        Ok(model)
    }
}

fn load_base(path: &Path) -> Result<SchemaModel> {
    info!("merging base schema {}", path.display());
    load_schema(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemasheets::config::MakerConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_create_schema_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let classes = dir.path().join("classes.tsv");
        fs::write(
            &classes,
            "class\tdesc\tmappings\n>class\tdescription\texact_mappings\nPerson\ta person\tschema:Person\n",
        )
        .unwrap();
        let slots = dir.path().join("slots.csv");
        fs::write(&slots, "class,slot,range\n>class,slot,range\nPerson,age,integer\n").unwrap();

        let config = SchemaSheetsConfig {
            maker: MakerConfig {
                schema_name: Some("personinfo".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let model = SchemaMaker::new(config).create_schema(&[classes, slots]).unwrap();
        let doc = model.to_value();
        assert_eq!(doc["name"], json!("personinfo"));
        assert_eq!(doc["classes"]["Person"]["description"], json!("a person"));
        assert_eq!(doc["classes"]["Person"]["slot_usage"]["age"]["range"], json!("integer"));
        assert_eq!(doc["prefixes"]["schema"], json!("http://schema.org/"));
        assert_eq!(doc["prefixes"]["personinfo"], json!("https://example.org/personinfo/"));
    }

    #[test]
    fn test_base_schema_supplies_name() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.yaml");
        fs::write(&base, "name: core\nclasses:\n  Thing:\n    description: anything\n").unwrap();
        let sheet = dir.path().join("s.tsv");
        fs::write(&sheet, "class\n>class\nPerson\n").unwrap();

        let mut config = SchemaSheetsConfig::default();
        config.maker.base_schema_path = Some(base);
        let doc = SchemaMaker::new(config).create_schema(&[sheet]).unwrap().to_value();
        assert_eq!(doc["name"], json!("core"));
        assert_eq!(doc["classes"]["Thing"]["description"], json!("anything"));
        assert!(doc["classes"].get("Person").is_some());
    }
}
