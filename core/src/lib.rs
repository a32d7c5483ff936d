//! # Schemasheets Core
//!
//! Schema object model and metamodel lookup used by the schemasheets mapping
//! engine.
//!
//! - [`element::ElementKind`] is the closed set of schema element kinds.
//! - [`metamodel::MetamodelProvider`] answers questions about metamodel
//!   fields; [`metamodel::LinkmlMetamodel`] is the built-in table.
//! - [`model::SchemaModel`] is an arena of elements addressed by handle and
//!   indexed by kind, owner and name.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Error types for schemasheets operations
pub mod error;

/// Schema element kinds
pub mod element;

/// Metamodel field lookup
pub mod metamodel;

/// Arena-backed schema object model
pub mod model;

pub use element::ElementKind;
pub use error::{ErrorCategory, Result, SchemaSheetsError};
pub use metamodel::{FieldMeta, LinkmlMetamodel, MetamodelProvider, RangeKind};
pub use model::{Element, ElementId, SchemaModel};
pub use serde_json::Value;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::element::ElementKind;
    pub use crate::error::{Result, SchemaSheetsError};
    pub use crate::metamodel::{FieldMeta, LinkmlMetamodel, MetamodelProvider, RangeKind};
    pub use crate::model::{ElementId, SchemaModel};
    pub use serde_json::Value;
}
