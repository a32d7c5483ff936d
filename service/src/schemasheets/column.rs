//! Column interpretation
//!
//! Every column maps to exactly one [`Descriptor`]: a metamodel field, an
//! element kind discriminator, or one of the engine's own pseudo-fields.

use super::settings::ColumnSettings;
use regex::Regex;
use schemasheets_core::{ElementKind, FieldMeta, MetamodelProvider, Result, SchemaSheetsError};

/// Descriptor prefix that forces interpretation as a metamodel field
pub const METASLOT_PREFIX: &str = "metaslot.";

/// What a column's values mean
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// Value of a metamodel field on the focal element
    Field(FieldMeta),
    /// Names elements of this kind
    Element(ElementKind),
    /// Cardinality token, resolved to required/multivalued/recommended
    Cardinality,
    /// `class` or `slot`, paired with the name column
    Metatype,
    /// Column is not read
    Ignore,
}

impl Descriptor {
    /// Interpret a descriptor as written in a header
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::UnknownField` for a `metaslot.` descriptor
    /// naming no field, and `SchemaSheetsError::Config` for anything else
    /// that is neither a field, an element kind nor a pseudo-field
    pub fn interpret(maps_to: &str, metamodel: &dyn MetamodelProvider) -> Result<Self> {
        if let Some(field) = maps_to.strip_prefix(METASLOT_PREFIX) {
            return Ok(Self::Field(metamodel.lookup(field)?.clone()));
        }
        if maps_to != "type" {
            if let Some(field) = metamodel.field(maps_to) {
                return Ok(Self::Field(field.clone()));
            }
        }
        if let Some(kind) = ElementKind::from_tag(maps_to) {
            return Ok(Self::Element(kind));
        }
        match maps_to {
            "cardinality" => Ok(Self::Cardinality),
            "metatype" => Ok(Self::Metatype),
            "ignore" => Ok(Self::Ignore),
            _ => Err(SchemaSheetsError::config(format!(
                "Cannot interpret '{maps_to}': not a metamodel field, element kind or shortcut"
            ))),
        }
    }
}

/// Configuration of one sheet column
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    /// Column name as written in the sheet header
    pub name: String,
    /// Descriptor text as written
    pub maps_to: String,
    /// Interpretation of `maps_to`
    pub descriptor: Descriptor,
    /// Accumulated settings
    pub settings: ColumnSettings,
    /// Metamodel field addressed by the inner key, if it names one
    pub inner_key_field: Option<FieldMeta>,
    matcher: Option<Regex>,
}

impl ColumnConfig {
    /// Create a column from its descriptor
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be interpreted
    pub fn new(
        name: impl Into<String>,
        maps_to: impl Into<String>,
        metamodel: &dyn MetamodelProvider,
    ) -> Result<Self> {
        let name = name.into();
        let maps_to = maps_to.into();
        let descriptor = Descriptor::interpret(&maps_to, metamodel).map_err(|e| match e {
            SchemaSheetsError::Config { message, .. } => SchemaSheetsError::config_at(
                format!("{message} (column '{name}')"),
                name.clone(),
            ),
            other => other,
        })?;
        Ok(Self {
            name,
            maps_to,
            descriptor,
            settings: ColumnSettings::default(),
            inner_key_field: None,
            matcher: None,
        })
    }

    /// Merge further settings, keeping those already set
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Config` if the regular expression does not
    /// compile
    pub fn merge_settings(
        &mut self,
        settings: ColumnSettings,
        metamodel: &dyn MetamodelProvider,
    ) -> Result<()> {
        self.settings.merge(settings);
        if self.inner_key_field.is_none() {
            if let Some(inner_key) = &self.settings.inner_key {
                let leaf = inner_key.rsplit('.').next().unwrap_or(inner_key);
                self.inner_key_field = metamodel.field(leaf).cloned();
            }
        }
        if self.matcher.is_none() {
            if let Some(pattern) = &self.settings.regular_expression_match {
                let regex = Regex::new(pattern).map_err(|e| {
                    SchemaSheetsError::config_at(
                        format!("invalid regular_expression_match in column '{}': {e}", self.name),
                        self.name.clone(),
                    )
                })?;
                self.matcher = Some(regex);
            }
        }
        Ok(())
    }

    /// Metamodel field targeted by the column
    #[must_use]
    pub fn resolved_field(&self) -> Option<&FieldMeta> {
        match &self.descriptor {
            Descriptor::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Element kind named by the column
    #[must_use]
    pub fn element_kind(&self) -> Option<ElementKind> {
        match self.descriptor {
            Descriptor::Element(kind) => Some(kind),
            _ => None,
        }
    }

    /// Whether the column names elements rather than describing them
    #[must_use]
    pub fn is_element_discriminator(&self) -> bool {
        self.element_kind().is_some()
    }

    /// Whether the column holds element names, `name` in a metatype table
    #[must_use]
    pub fn is_name_column(&self) -> bool {
        self.resolved_field().is_some_and(|f| f.name == "name")
    }

    /// Compiled `regular_expression_match`
    #[must_use]
    pub fn matcher(&self) -> Option<&Regex> {
        self.matcher.as_ref()
    }

    /// Separator for multivalued cells
    #[must_use]
    pub fn separator<'a>(&'a self, default: &'a str) -> &'a str {
        self.settings.internal_separator.as_deref().unwrap_or(default)
    }

    /// Header cell that reproduces this column's configuration
    #[must_use]
    pub fn descriptor_cell(&self) -> String {
        if self.settings.is_empty() {
            self.maps_to.clone()
        } else {
            format!("{}: {}", self.maps_to, self.settings.to_flow())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemasheets_core::LinkmlMetamodel;

    #[test]
    fn test_interpretations() {
        let mm = LinkmlMetamodel::new();
        assert!(matches!(
            Descriptor::interpret("description", &mm).unwrap(),
            Descriptor::Field(f) if f.name == "description"
        ));
        assert_eq!(
            Descriptor::interpret("class", &mm).unwrap(),
            Descriptor::Element(ElementKind::Class)
        );
        assert_eq!(
            Descriptor::interpret("type", &mm).unwrap(),
            Descriptor::Element(ElementKind::Type)
        );
        assert_eq!(
            Descriptor::interpret("cardinality", &mm).unwrap(),
            Descriptor::Cardinality
        );
        assert!(matches!(
            Descriptor::interpret("uri", &mm).unwrap(),
            Descriptor::Field(f) if f.name == "type_uri"
        ));
    }

    #[test]
    fn test_metaslot_prefix() {
        let mm = LinkmlMetamodel::new();
        assert!(matches!(
            Descriptor::interpret("metaslot.range", &mm).unwrap(),
            Descriptor::Field(f) if f.name == "range"
        ));
        assert!(matches!(
            Descriptor::interpret("metaslot.bogus", &mm).unwrap_err(),
            SchemaSheetsError::UnknownField { .. }
        ));
    }

    #[test]
    fn test_uninterpretable_descriptor_names_column() {
        let mm = LinkmlMetamodel::new();
        let err = ColumnConfig::new("Info", "frobnicate", &mm).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("frobnicate"));
        assert!(message.contains("Info"));
    }

    #[test]
    fn test_inner_key_field_and_regex() {
        let mm = LinkmlMetamodel::new();
        let mut column = ColumnConfig::new("interp", "structured_pattern", &mm).unwrap();
        let settings = ColumnSettings {
            inner_key: Some("interpolated".to_string()),
            regular_expression_match: Some(r"^(\w+)".to_string()),
            ..ColumnSettings::default()
        };
        column.merge_settings(settings, &mm).unwrap();
        assert!(column.inner_key_field.as_ref().unwrap().is_boolean());
        assert!(column.matcher().is_some());
    }

    #[test]
    fn test_bad_regex_is_config_error() {
        let mm = LinkmlMetamodel::new();
        let mut column = ColumnConfig::new("id", "identifier", &mm).unwrap();
        let settings = ColumnSettings {
            regular_expression_match: Some("(".to_string()),
            ..ColumnSettings::default()
        };
        let err = column.merge_settings(settings, &mm).unwrap_err();
        assert_eq!(
            err.category(),
            schemasheets_core::ErrorCategory::Configuration
        );
    }
}
