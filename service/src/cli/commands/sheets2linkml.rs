//! `sheets2linkml` command implementation
//!
//! Reads sheets, merges them into one schema and writes the schema document.

use crate::schemasheets::config::{OutputFormat, SchemaSheetsConfig};
use crate::schemasheets::maker::SchemaMaker;
use crate::schemasheets::schema_io::render_schema;
use schemasheets_core::{Result, SchemaSheetsError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Command for building a schema from sheets
pub struct Sheets2LinkmlCommand {
    /// Sheet files, merged in order
    pub sheets: Vec<PathBuf>,
    /// Output schema file; stdout when unset
    pub output: Option<PathBuf>,
    /// Conversion settings
    pub config: SchemaSheetsConfig,
}

impl Sheets2LinkmlCommand {
    /// Create a command with default settings
    #[must_use]
    pub fn new(sheets: Vec<PathBuf>, output: Option<PathBuf>) -> Self {
        Self {
            sheets,
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

    /// Set the schema name
    #[must_use]
    pub fn with_schema_name(mut self, name: String) -> Self {
        self.config.maker.schema_name = Some(name);
        self
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.config.output.format = format;
        self
    }

    /// Execute the command, writing to stdout when there is no output file
    ///
    /// # Errors
    ///
    /// Returns the first reading, row or writing error
    pub fn execute(&self) -> Result<()> {
        let stdout = std::io::stdout();
        self.execute_to(stdout.lock())
    }

    /// Execute the command, writing to `writer` when there is no output file
    ///
    /// # Errors
    ///
    /// Returns the first reading, row or writing error
    pub fn execute_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for sheet in &self.sheets {
            if !sheet.exists() {
                return Err(SchemaSheetsError::io_error(format!(
                    "Sheet not found: {}",
                    sheet.display()
                )));
            }
        }
        let model = SchemaMaker::new(self.config.clone()).create_schema(&self.sheets)?;
        let text = render_schema(&model, self.config.output.format, self.config.output.sort_keys)?;
        match &self.output {
            Some(path) => {
                write_file(path, &text)?;
                info!("wrote schema {} to {}", model.schema_name(), path.display());
            }
            None => writer.write_all(text.as_bytes())?,
        }
        Ok(())
    }
}

/// Format implied by an output file extension
#[must_use]
pub fn format_for(path: &Path) -> Option<OutputFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => Some(OutputFormat::Json),
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            Some(OutputFormat::Yaml)
        }
        _ => None,
    }
}

fn write_file(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|e| {
        SchemaSheetsError::io_error(format!("Cannot write {}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_writes_schema_to_writer() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = dir.path().join("classes.tsv");
        fs::write(&sheet, "class\tdesc\n>class\tdescription\nPerson\ta person\n").unwrap();

        let mut out = Vec::new();
        Sheets2LinkmlCommand::new(vec![sheet], None)
            .with_schema_name("personinfo".to_string())
            .execute_to(&mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("name: personinfo\n"));
        assert!(text.contains("description: a person"));
    }

    #[test]
    fn test_missing_sheet() {
        let err = Sheets2LinkmlCommand::new(vec![PathBuf::from("/nonexistent/s.tsv")], None)
            .execute_to(std::io::sink())
            .unwrap_err();
        assert!(err.to_string().contains("Sheet not found"));
    }

    #[test]
    fn test_format_for_extension() {
        assert_eq!(format_for(Path::new("s.json")), Some(OutputFormat::Json));
        assert_eq!(format_for(Path::new("s.yml")), Some(OutputFormat::Yaml));
        assert_eq!(format_for(Path::new("s.txt")), None);
    }
}
