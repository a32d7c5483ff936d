//! Command-line tools for schema sheets
//!
//! `sheets2linkml` builds a schema from sheets; `linkml2sheets` writes a
//! schema back out through a template sheet.

mod app;
pub mod commands;
mod types;

pub use app::SchemaSheetsApp;
pub use types::{FormatArg, SchemaSheetsCli, SchemaSheetsCommand};

/// Main entry point for the CLI
///
/// # Errors
///
/// Returns the error of the failing command
pub fn run() -> schemasheets_core::Result<()> {
    SchemaSheetsApp::from_args().run()
}
