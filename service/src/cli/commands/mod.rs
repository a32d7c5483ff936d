//! Command implementations

pub mod linkml2sheets;
pub mod sheets2linkml;

pub use linkml2sheets::Linkml2SheetsCommand;
pub use sheets2linkml::Sheets2LinkmlCommand;
