//! # Schemasheets Service
//!
//! Conversion between `LinkML` schemas and schema sheets: tables whose
//! descriptor lines map columns onto schema elements and metamodel fields.
//!
//! ## Quick Start
//!
//! ```no_run
//! use schemasheets_service::schemasheets::{SchemaMaker, SchemaSheetsConfig, render_schema};
//! use std::path::PathBuf;
//!
//! # fn main() -> schemasheets_core::Result<()> {
//! let mut config = SchemaSheetsConfig::default();
//! config.maker.schema_name = Some("personinfo".to_string());
//! let format = config.output.format;
//!
//! let maker = SchemaMaker::new(config);
//! let schema = maker.create_schema(&[PathBuf::from("classes.tsv"), PathBuf::from("slots.tsv")])?;
//! print!("{}", render_schema(&schema, format, false)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`schemasheets`]: header interpretation, row resolution, merging,
//!   projection and repair
//! - [`config`]: configuration file loading
//! - [`cli`]: the `schemasheets` command-line tool

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)] // LinkML, CURIE and friends are proper nouns
#![allow(clippy::missing_panics_doc)]

/// Command-line interface
pub mod cli;

/// Configuration loading
pub mod config;

/// Schema sheet conversion
pub mod schemasheets;

pub use schemasheets::{
    SchemaExporter, SchemaMaker, SchemaProjector, SchemaSession, SchemaSheetsConfig,
};
pub use schemasheets_core::{Result, SchemaModel, SchemaSheetsError};
