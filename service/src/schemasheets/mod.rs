//! `SchemaSheets`: `LinkML` schemas authored as tables
//!
//! A schema sheet is a table whose first line names the columns and whose
//! following descriptor lines (marked with `>`) say what each column maps
//! to: an element kind, a metamodel field, a cardinality code, or nothing.
//! Every data row after that adorns one or more focal elements of the schema.
//!
//! ```text
//! class    slot   cardinality   range     desc
//! >class   slot   cardinality   range     description
//! Person                                  a person
//! Person   age    0..1          integer   age in years
//! ```
//!
//! Reading goes sheet → [`HeaderInterpreter`] → [`FocalElementResolver`] →
//! [`SchemaMergeEngine`] inside a [`SchemaSession`], then [`RepairPass`].
//! Writing goes schema → [`SchemaProjector`] → a template's header.

pub mod cardinality;
pub mod column;
pub mod config;
pub mod exporter;
pub mod header;
pub mod maker;
pub mod merge;
pub mod normalize;
pub mod projector;
pub mod repair;
pub mod resolver;
pub mod schema_io;
pub mod session;
pub mod settings;
pub mod sheet;
pub mod table;

pub use cardinality::{CardinalityResolver, CardinalityVocabulary};
pub use column::{ColumnConfig, Descriptor};
pub use config::{MakerConfig, OutputConfig, OutputFormat, SchemaSheetsConfig, SheetConfig};
pub use exporter::SchemaExporter;
pub use header::HeaderInterpreter;
pub use maker::SchemaMaker;
pub use merge::SchemaMergeEngine;
pub use projector::SchemaProjector;
pub use repair::{RepairPass, RepairReport};
pub use resolver::{FocalElementResolver, RowShape};
pub use schema_io::{load_schema, parse_schema, render_schema};
pub use session::{SchemaSession, SessionOptions};
pub use settings::{ColumnSettings, ValueMap};
pub use sheet::{Row, SchemaSheet, SheetReader, SheetRow};
pub use table::TableConfig;
