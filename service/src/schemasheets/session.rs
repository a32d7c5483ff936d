//! Schema session: one schema under construction across several sheets
//!
//! Sheets are merged strictly in order, row by row. A failing row is rolled
//! back before the error is returned, so earlier rows stay intact.

use super::cardinality::CardinalityVocabulary;
use super::merge::{PLACEHOLDER_NAME, SchemaMergeEngine};
use super::normalize::DEFAULT_SEPARATOR;
use super::resolver::FocalElementResolver;
use super::sheet::{Row, SchemaSheet};
use super::table::TableConfig;
use schemasheets_core::{
    ElementKind, MetamodelProvider, Result, SchemaModel, SchemaSheetsError, Value,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Prefix declared by every finished schema
pub const LINKML_PREFIX: (&str, &str) = ("linkml", "https://w3id.org/linkml/");

/// Import added to every finished schema
pub const LINKML_TYPES_IMPORT: &str = "linkml:types";

/// Options fixed for the lifetime of a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Class+slot rows create attributes instead of slot usages
    pub use_attributes: bool,
    /// Class+slot rows adorn the top-level slot instead of a slot usage
    pub unique_slots: bool,
    /// Separator for multivalued cells without their own
    pub default_separator: String,
    /// Vocabulary for cardinality tokens
    pub cardinality: CardinalityVocabulary,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            use_attributes: false,
            unique_slots: false,
            default_separator: DEFAULT_SEPARATOR.to_string(),
            cardinality: CardinalityVocabulary::standard(),
        }
    }
}

/// Accumulates sheets into one schema
pub struct SchemaSession {
    model: SchemaModel,
    metamodel: Arc<dyn MetamodelProvider>,
    options: SessionOptions,
}

impl SchemaSession {
    /// Start a session for a schema named `name`, or `TEMP` until a schema
    /// row names it
    #[must_use]
    pub fn new(
        name: Option<&str>,
        metamodel: Arc<dyn MetamodelProvider>,
        options: SessionOptions,
    ) -> Self {
        let name = name.unwrap_or(PLACEHOLDER_NAME);
        let mut model = SchemaModel::new(name);
        let root = model.root();
        model.set(root, "id", Value::String(name.to_string()));
        model.set(root, "default_prefix", Value::String(name.to_string()));
        model.set(root, "default_range", Value::String("string".to_string()));
        Self {
            model,
            metamodel,
            options,
        }
    }

    /// Metamodel used to interpret headers
    #[must_use]
    pub fn metamodel(&self) -> &dyn MetamodelProvider {
        self.metamodel.as_ref()
    }

    /// Shared handle to the metamodel
    #[must_use]
    pub fn metamodel_handle(&self) -> Arc<dyn MetamodelProvider> {
        Arc::clone(&self.metamodel)
    }

    /// Session options
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Model built so far
    #[must_use]
    pub fn model(&self) -> &SchemaModel {
        &self.model
    }

    /// Merge every row of a sheet
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Row` wrapping the first failing row's
    /// error with its line number and content
    pub fn merge_sheet(&mut self, sheet: &SchemaSheet) -> Result<()> {
        info!("merging sheet {} ({} rows)", sheet.name, sheet.rows.len());
        for row in &sheet.rows {
            self.merge_row(&sheet.table, &row.cells).map_err(|e| {
                let content = serde_json::to_string(&row.cells).unwrap_or_default();
                SchemaSheetsError::in_row(row.line, content, e)
            })?;
        }
        Ok(())
    }

    /// Merge one data row; on error the row leaves no trace in the model
    ///
    /// # Errors
    ///
    /// Returns the row interpretation, value or cardinality error that
    /// stopped the row
    pub fn merge_row(&mut self, table: &TableConfig, row: &Row) -> Result<()> {
        self.model.begin();
        match self.apply_row(table, row) {
            Ok(()) => {
                self.model.commit();
                Ok(())
            }
            Err(e) => {
                self.model.rollback();
                Err(e)
            }
        }
    }

    fn apply_row(&mut self, table: &TableConfig, row: &Row) -> Result<()> {
        let resolver = FocalElementResolver::new(table, &self.options);
        let engine = SchemaMergeEngine::new(&self.options);
        let focal = resolver.resolve(&mut self.model, row, None)?;
        debug!("row resolved to {} element(s)", focal.len());

        for column in table.columns() {
            if column.is_element_discriminator() {
                continue;
            }
            let Some(raw) = row.get(&column.name).filter(|raw| !raw.trim().is_empty()) else {
                continue;
            };
            if column.settings.applies_to_class.is_some() {
                for id in resolver.resolve(&mut self.model, row, Some(column))? {
                    engine.apply(&mut self.model, id, column, raw)?;
                }
            } else {
                for id in &focal {
                    engine.apply(&mut self.model, *id, column, raw)?;
                }
            }
        }
        Ok(())
    }

    /// Finish the schema: standard import and prefix, removal of slots
    /// marked not applicable, default prefix declaration, then elements of
    /// `base` this session did not define
    #[must_use]
    pub fn finalize(mut self, base: Option<&SchemaModel>) -> SchemaModel {
        let model = &mut self.model;
        let root = model.root();
        model.append(root, "imports", [Value::String(LINKML_TYPES_IMPORT.to_string())]);
        let (linkml, linkml_uri) = LINKML_PREFIX;
        let prefix = model.top_level(ElementKind::Prefix, linkml);
        model.set_default(prefix, "prefix_reference", Value::String(linkml_uri.to_string()));

        tidy_inapplicable(model);

        if let Some(Value::String(default_prefix)) = model.element(root).get("default_prefix").cloned() {
            if model.find_top_level(ElementKind::Prefix, &default_prefix).is_none() {
                error!("Prefix {} not declared: using default", default_prefix);
                let id = model.top_level(ElementKind::Prefix, &default_prefix);
                model.set(
                    id,
                    "prefix_reference",
                    Value::String(format!("https://example.org/{default_prefix}/")),
                );
            }
        }

        if let Some(base) = base {
            model.merge_missing(base);
        }
        self.model
    }
}

/// Detach slot usages and attributes marked not applicable, and drop them
/// from their class's slot list
fn tidy_inapplicable(model: &mut SchemaModel) {
    for class in model.top_level_of(ElementKind::Class) {
        let marked: Vec<_> = [ElementKind::Slot, ElementKind::Attribute]
            .into_iter()
            .flat_map(|kind| model.children(class, kind))
            .filter(|id| model.element(*id).is_inapplicable())
            .collect();
        if marked.is_empty() {
            continue;
        }
        let names: Vec<String> = marked
            .iter()
            .map(|id| model.element(*id).name().to_string())
            .collect();
        debug!("removing {:?} from class {}", names, model.element(class).name());
        for id in marked {
            model.detach(id);
        }
        if let Some(Value::Array(slots)) = model.element(class).get("slots").cloned() {
            let kept: Vec<Value> = slots
                .into_iter()
                .filter(|s| !s.as_str().is_some_and(|s| names.iter().any(|n| n == s)))
                .collect();
            model.set(class, "slots", Value::Array(kept));
        }
    }
}
