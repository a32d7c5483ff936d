//! Configuration for schemasheets conversions
//!
//! Every section falls back to its defaults, so a configuration file only
//! needs to name what it changes. Command-line flags override file values.

use super::cardinality::CardinalityVocabulary;
use super::header::DEFAULT_MARKER;
use super::normalize::DEFAULT_SEPARATOR;
use super::session::SessionOptions;
use super::sheet::delimiter_for;
use schemasheets_core::{Result, SchemaSheetsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for schemasheets conversions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaSheetsConfig {
    /// Schema construction
    pub maker: MakerConfig,

    /// Sheet file format
    pub sheet: SheetConfig,

    /// Schema output
    pub output: OutputConfig,
}

/// Settings for building a schema from sheets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MakerConfig {
    /// Schema name; the base schema's name or `TEMP` when unset
    pub schema_name: Option<String>,

    /// Class+slot rows create attributes instead of slot usages
    pub use_attributes: bool,

    /// Class+slot rows adorn the top-level slot
    pub unique_slots: bool,

    /// Declare missing prefixes and subsets after merging
    pub repair: bool,

    /// Notation cardinality codes are matched in
    pub cardinality_notation: String,

    /// Cardinality vocabulary replacing the built-in one
    pub cardinality_vocabulary_path: Option<PathBuf>,

    /// Separator of multivalued cells without their own
    pub default_separator: String,

    /// Table configuration applied to every sheet
    pub table_config_path: Option<PathBuf>,

    /// Schema whose elements fill in what the sheets leave undefined
    pub base_schema_path: Option<PathBuf>,
}

impl Default for MakerConfig {
    fn default() -> Self {
        Self {
            schema_name: None,
            use_attributes: false,
            unique_slots: false,
            repair: true,
            cardinality_notation: "code".to_string(),
            cardinality_vocabulary_path: None,
            default_separator: DEFAULT_SEPARATOR.to_string(),
            table_config_path: None,
            base_schema_path: None,
        }
    }
}

impl MakerConfig {
    /// Session options described by this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the cardinality vocabulary file cannot be loaded
    pub fn session_options(&self) -> Result<SessionOptions> {
        let vocabulary = match &self.cardinality_vocabulary_path {
            Some(path) => CardinalityVocabulary::from_file(path)?,
            None => CardinalityVocabulary::standard(),
        };
        Ok(SessionOptions {
            use_attributes: self.use_attributes,
            unique_slots: self.unique_slots,
            default_separator: self.default_separator.clone(),
            cardinality: vocabulary.with_notation(self.cardinality_notation.clone()),
        })
    }
}

/// Sheet file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Field delimiter; chosen from the file extension when unset
    pub delimiter: Option<char>,

    /// First character of descriptor lines
    pub descriptor_marker: char,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            descriptor_marker: DEFAULT_MARKER,
        }
    }
}

impl SheetConfig {
    /// Delimiter byte for a file
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Config` if the configured delimiter is not
    /// a single-byte character
    pub fn delimiter_for(&self, path: &Path) -> Result<u8> {
        match self.delimiter {
            Some(c) => u8::try_from(c).map_err(|_| {
                SchemaSheetsError::config(format!("Delimiter '{c}' is not a single-byte character"))
            }),
            None => Ok(delimiter_for(path)),
        }
    }
}

/// Schema output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// YAML document
    #[default]
    Yaml,
    /// JSON document
    Json,
}

/// Schema output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Document format
    pub format: OutputFormat,

    /// Sort mapping keys recursively
    pub sort_keys: bool,
}
