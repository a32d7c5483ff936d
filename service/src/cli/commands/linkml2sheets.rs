//! `linkml2sheets` command implementation

use crate::schemasheets::config::SchemaSheetsConfig;
use crate::schemasheets::exporter::SchemaExporter;
use crate::schemasheets::schema_io::load_schema;
use schemasheets_core::Result;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Command for writing a schema as a sheet
pub struct Linkml2SheetsCommand {
    /// Schema file
    pub schema: PathBuf,
    /// Template sheet
    pub template: PathBuf,
    /// Output sheet; stdout when unset
    pub output: Option<PathBuf>,
    /// Conversion settings
    pub config: SchemaSheetsConfig,
}

impl Linkml2SheetsCommand {
    /// Create a command with default settings
    #[must_use]
    pub fn new(schema: PathBuf, template: PathBuf, output: Option<PathBuf>) -> Self {
        Self {
            schema,
            template,
            output,
            config: SchemaSheetsConfig::default(),
        }
    }

    /// Use these settings
    #[must_use]
    pub fn with_config(mut self, config: SchemaSheetsConfig) -> Self {
        self.config = config;
        self
    }

    /// Execute the command, writing to stdout when there is no output file
    ///
    /// # Errors
    ///
    /// Returns an error if the schema or template cannot be read or the
    /// sheet cannot be written
    pub fn execute(&self) -> Result<()> {
        let stdout = std::io::stdout();
        self.execute_to(stdout.lock())
    }

    /// Execute the command, writing to `writer` when there is no output file
    ///
    /// # Errors
    ///
    /// Returns an error if the schema or template cannot be read or the
    /// sheet cannot be written
    pub fn execute_to<W: Write>(&self, writer: W) -> Result<()> {
        let model = load_schema(&self.schema)?;
        let rows = SchemaExporter::new(self.config.clone()).export_with_template(
            &model,
            &self.template,
            self.output.as_deref(),
            writer,
        )?;
        info!("exported {} rows from {}", rows, self.schema.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_export_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("s.yaml");
        fs::write(
            &schema,
            "name: s\nenums:\n  Color:\n    permissible_values:\n      red: {}\n",
        )
        .unwrap();
        let template = dir.path().join("t.tsv");
        fs::write(&template, "enum\tvalue\n>enum\tpermissible_value\n").unwrap();

        let mut out = Vec::new();
        Linkml2SheetsCommand::new(schema, template, None)
            .execute_to(&mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "enum\tvalue\n>enum\tpermissible_value\nColor\tred\n"
        );
    }
}
