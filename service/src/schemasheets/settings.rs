//! Per-column settings read from sheet header lines
//!
//! Settings accumulate across header lines and table configuration files.
//! A setting that is already present is never replaced by a later source.

use indexmap::IndexMap;
use schemasheets_core::{Result, SchemaSheetsError};
use serde::Serialize;
use serde_yaml::Value as YamlValue;

/// Wildcard key of a value substitution table
pub const WILDCARD: &str = "*";

/// Ordered value substitution table, with an optional `*` fallback
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValueMap(IndexMap<String, String>);

impl ValueMap {
    /// Build a table from key/value pairs
    pub fn new<K: Into<String>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Substitute a value: exact key first, then the wildcard
    #[must_use]
    pub fn lookup(&self, value: &str) -> Option<&str> {
        self.0
            .get(value)
            .or_else(|| self.0.get(WILDCARD))
            .map(String::as_str)
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Accepts `{key: value}`, `{key: {map_value: value}}` or
    /// `[{map_key: key, map_value: value}]`
    fn from_yaml(value: &YamlValue) -> Result<Self> {
        let mut entries = IndexMap::new();
        match value {
            YamlValue::Mapping(map) => {
                for (key, target) in map {
                    let key = scalar(key)?.unwrap_or_default();
                    let target = match target {
                        YamlValue::Mapping(inner) => inner
                            .get("map_value")
                            .map(scalar)
                            .transpose()?
                            .flatten(),
                        other => scalar(other)?,
                    };
                    entries.insert(key, target.unwrap_or_default());
                }
            }
            YamlValue::Sequence(items) => {
                for item in items {
                    let key = item.get("map_key").map(scalar).transpose()?.flatten();
                    let target = item.get("map_value").map(scalar).transpose()?.flatten();
                    match (key, target) {
                        (Some(k), Some(v)) => {
                            entries.insert(k, v);
                        }
                        _ => {
                            return Err(SchemaSheetsError::config(
                                "vmap entries need map_key and map_value",
                            ));
                        }
                    }
                }
            }
            YamlValue::Null => {}
            _ => return Err(SchemaSheetsError::config("vmap must be a mapping or a list")),
        }
        Ok(Self(entries))
    }
}

/// Settings attached to one column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnSettings {
    /// Prefix prepended as `prefix:value` unless the value is already a CURIE
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curie_prefix: Option<String>,
    /// Literal text prepended to the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Literal text appended to the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Free-form template, carried for consumers of the table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Value substitution table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vmap: Option<ValueMap>,
    /// Regular expression whose first group replaces the value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular_expression_match: Option<String>,
    /// Path into a compound field, dot separated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_key: Option<String>,
    /// Class the column's values apply to, regardless of the row's class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to_class: Option<String>,
    /// Slot the column's values apply to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to_slot: Option<String>,
    /// Free-form tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Separator for multivalued cells, overriding the session default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_separator: Option<String>,
}

macro_rules! keep_first {
    ($target:expr, $source:expr, $($field:ident),+ $(,)?) => {
        $(
            if $target.$field.is_none() {
                $target.$field = $source.$field;
            }
        )+
    };
}

impl ColumnSettings {
    /// Parse a settings mapping from a header cell or table config entry
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Config` for unknown setting names and
    /// values that are not scalars
    pub fn from_yaml(value: &YamlValue) -> Result<Self> {
        let mut settings = Self::default();
        let map = match value {
            YamlValue::Null => return Ok(settings),
            YamlValue::Mapping(map) => map,
            other => {
                return Err(SchemaSheetsError::config(format!(
                    "Expected a mapping of column settings, got {}",
                    describe(other)
                )));
            }
        };
        for (key, setting) in map {
            let key = scalar(key)?.unwrap_or_default();
            let slot = match key.as_str() {
                "vmap" => {
                    settings.vmap = Some(ValueMap::from_yaml(setting)?);
                    continue;
                }
                "curie_prefix" => &mut settings.curie_prefix,
                "prefix" => &mut settings.prefix,
                "suffix" => &mut settings.suffix,
                "template" => &mut settings.template,
                "regular_expression_match" => &mut settings.regular_expression_match,
                "inner_key" => &mut settings.inner_key,
                "applies_to_class" => &mut settings.applies_to_class,
                "applies_to_slot" => &mut settings.applies_to_slot,
                "tag" => &mut settings.tag,
                "internal_separator" => &mut settings.internal_separator,
                _ => {
                    return Err(SchemaSheetsError::config(format!(
                        "Unknown column setting '{key}'"
                    )));
                }
            };
            *slot = scalar(setting)?;
        }
        Ok(settings)
    }

    /// Fill every unset setting from `other`
    pub fn merge(&mut self, other: ColumnSettings) {
        keep_first!(
            self,
            other,
            curie_prefix,
            prefix,
            suffix,
            template,
            vmap,
            regular_expression_match,
            inner_key,
            applies_to_class,
            applies_to_slot,
            tag,
            internal_separator,
        );
    }

    /// Whether no setting is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Render as a single-line YAML flow mapping, e.g. `{curie_prefix: sdo}`
    #[must_use]
    pub fn to_flow(&self) -> String {
        let mut parts = Vec::new();
        let mut push = |key: &str, value: &Option<String>| {
            if let Some(v) = value {
                parts.push(format!("{key}: {}", flow_scalar(v)));
            }
        };
        push("curie_prefix", &self.curie_prefix);
        push("prefix", &self.prefix);
        push("suffix", &self.suffix);
        push("template", &self.template);
        push("regular_expression_match", &self.regular_expression_match);
        push("inner_key", &self.inner_key);
        push("applies_to_class", &self.applies_to_class);
        push("applies_to_slot", &self.applies_to_slot);
        push("tag", &self.tag);
        push("internal_separator", &self.internal_separator);
        if let Some(vmap) = &self.vmap {
            let entries: Vec<String> = vmap
                .iter()
                .map(|(k, v)| format!("{}: {}", flow_scalar(k), flow_scalar(v)))
                .collect();
            parts.push(format!("vmap: {{{}}}", entries.join(", ")));
        }
        format!("{{{}}}", parts.join(", "))
    }
}

/// Quote a scalar for a YAML flow context unless it is plainly safe
pub(crate) fn flow_scalar(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/'))
        && !matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "null" | "yes" | "no" | "~"
        );
    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

fn scalar(value: &YamlValue) -> Result<Option<String>> {
    match value {
        YamlValue::Null => Ok(None),
        YamlValue::String(s) => Ok(Some(s.clone())),
        YamlValue::Bool(b) => Ok(Some(b.to_string())),
        YamlValue::Number(n) => Ok(Some(n.to_string())),
        other => Err(SchemaSheetsError::config(format!(
            "Expected a scalar setting value, got {}",
            describe(other)
        ))),
    }
}

fn describe(value: &YamlValue) -> &'static str {
    match value {
        YamlValue::Null => "null",
        YamlValue::Bool(_) => "a boolean",
        YamlValue::Number(_) => "a number",
        YamlValue::String(_) => "a string",
        YamlValue::Sequence(_) => "a list",
        YamlValue::Mapping(_) => "a mapping",
        YamlValue::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(text: &str) -> YamlValue {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_parse_settings() {
        let settings =
            ColumnSettings::from_yaml(&yaml("{curie_prefix: sdo, internal_separator: '|'}")).unwrap();
        assert_eq!(settings.curie_prefix.as_deref(), Some("sdo"));
        assert_eq!(settings.internal_separator.as_deref(), Some("|"));
        assert_eq!(settings.prefix, None);
    }

    #[test]
    fn test_unknown_setting_rejected() {
        let err = ColumnSettings::from_yaml(&yaml("{colour: red}")).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn test_merge_is_first_write_wins() {
        let mut first = ColumnSettings::from_yaml(&yaml("{prefix: a_}")).unwrap();
        let second = ColumnSettings::from_yaml(&yaml("{prefix: b_, suffix: _z}")).unwrap();
        first.merge(second);
        assert_eq!(first.prefix.as_deref(), Some("a_"));
        assert_eq!(first.suffix.as_deref(), Some("_z"));
    }

    #[test]
    fn test_vmap_forms() {
        let inline = ColumnSettings::from_yaml(&yaml("{vmap: {Y: 'yes', '*': 'no'}}")).unwrap();
        let vmap = inline.vmap.unwrap();
        assert_eq!(vmap.lookup("Y"), Some("yes"));
        assert_eq!(vmap.lookup("anything"), Some("no"));

        let nested = ColumnSettings::from_yaml(&yaml("{vmap: {M: {map_value: mandatory}}}")).unwrap();
        assert_eq!(nested.vmap.unwrap().lookup("M"), Some("mandatory"));

        let listed =
            ColumnSettings::from_yaml(&yaml("{vmap: [{map_key: O, map_value: optional}]}")).unwrap();
        let vmap = listed.vmap.unwrap();
        assert_eq!(vmap.lookup("O"), Some("optional"));
        assert_eq!(vmap.lookup("X"), None);
    }

    #[test]
    fn test_flow_rendering_parses_back() {
        let settings = ColumnSettings {
            curie_prefix: Some("sdo".to_string()),
            internal_separator: Some("|".to_string()),
            vmap: Some(ValueMap::new([("Y", "true")])),
            ..ColumnSettings::default()
        };
        let flow = settings.to_flow();
        assert_eq!(
            flow,
            "{curie_prefix: sdo, internal_separator: '|', vmap: {Y: 'true'}}"
        );
        assert_eq!(ColumnSettings::from_yaml(&yaml(&flow)).unwrap(), settings);
    }
}
