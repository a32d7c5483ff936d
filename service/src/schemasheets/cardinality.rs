//! Cardinality notations
//!
//! A cardinality cell is either UML-style (`0..1`, `1..*`, with `1` and `*`
//! as shortcuts) or a term from a controlled vocabulary, matched by its code
//! under the selected notation or by its name.

use indexmap::IndexMap;
use schemasheets_core::{ElementId, Result, SchemaModel, SchemaSheetsError, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the vocabulary term that removes a slot from a class
pub const NOT_APPLICABLE: &str = "not_applicable";

/// Flags a cardinality sets on a slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardinalityFlags {
    /// `required`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// `multivalued`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multivalued: Option<bool>,
    /// `recommended`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<bool>,
    /// Slot does not apply to the class and is removed from it
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub not_applicable: bool,
}

/// One term of a cardinality vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardinalityTerm {
    /// Canonical term name
    pub text: String,
    /// Human description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Code of the term per notation
    #[serde(default)]
    pub codes: IndexMap<String, String>,
    /// Flags the term sets
    #[serde(default)]
    pub maps_to: CardinalityFlags,
}

impl CardinalityTerm {
    fn new(text: &str, code: Option<&str>, maps_to: CardinalityFlags) -> Self {
        Self {
            text: text.to_string(),
            description: None,
            codes: code
                .map(|c| IndexMap::from([("code".to_string(), c.to_string())]))
                .unwrap_or_default(),
            maps_to: CardinalityFlags {
                not_applicable: text == NOT_APPLICABLE,
                ..maps_to
            },
        }
    }
}

/// Controlled vocabulary of cardinality terms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardinalityVocabulary {
    /// Notation whose codes are matched
    #[serde(default = "default_notation")]
    pub notation: String,
    /// Terms
    pub terms: Vec<CardinalityTerm>,
}

fn default_notation() -> String {
    "code".to_string()
}

const fn flags(required: Option<bool>, multivalued: Option<bool>, recommended: Option<bool>) -> CardinalityFlags {
    CardinalityFlags {
        required,
        multivalued,
        recommended,
        not_applicable: false,
    }
}

impl CardinalityVocabulary {
    /// The built-in vocabulary
    #[must_use]
    pub fn standard() -> Self {
        let t = CardinalityTerm::new;
        Self {
            notation: default_notation(),
            terms: vec![
                t("mandatory", Some("M"), flags(Some(true), None, None)),
                t("optional", Some("O"), flags(Some(false), None, None)),
                t("recommended", Some("R"), flags(None, None, Some(true))),
                t("not_recommended", Some("NR"), flags(None, None, Some(false))),
                t("applicable", Some("A"), flags(None, None, None)),
                t(NOT_APPLICABLE, Some("-"), flags(None, None, None)),
                t("conditional", Some("C"), flags(None, None, None)),
                t("unconditional", Some("U"), flags(None, None, None)),
                t("conditional_mandatory", Some("CM"), flags(None, None, None)),
                t("zero_or_one", None, flags(Some(false), Some(false), None)),
                t("exactly_one", None, flags(Some(true), Some(false), None)),
                t("zero_to_many", None, flags(Some(false), Some(true), None)),
                t("one_to_many", None, flags(Some(true), Some(true), None)),
                t("single_valued", None, flags(None, Some(false), None)),
                t("multi_valued", None, flags(None, Some(true), None)),
            ],
        }
    }

    /// Select the notation whose codes are matched
    #[must_use]
    pub fn with_notation(mut self, notation: impl Into<String>) -> Self {
        self.notation = notation.into();
        self
    }

    /// Load a vocabulary from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or a configuration
    /// error if it does not describe a vocabulary
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|e| {
            SchemaSheetsError::config(format!(
                "Cannot read cardinality vocabulary {}: {e}",
                path.display()
            ))
        })
    }

    /// Find the single term matching `token` by code or name
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Cardinality` if no term or more than one
    /// term matches
    pub fn lookup(&self, token: &str) -> Result<&CardinalityTerm> {
        let matches: Vec<&CardinalityTerm> = self
            .terms
            .iter()
            .filter(|term| {
                term.text == token
                    || term.codes.get(&self.notation).is_some_and(|code| code == token)
            })
            .collect();
        match matches.as_slice() {
            [term] => Ok(term),
            [] => Err(SchemaSheetsError::cardinality(token, "no matching term")),
            several => Err(SchemaSheetsError::cardinality(
                token,
                format!(
                    "ambiguous, matches {}",
                    several
                        .iter()
                        .map(|t| t.text.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )),
        }
    }
}

impl Default for CardinalityVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

/// Parse UML-style `min..max`, with `1` and `*` as shortcuts
///
/// Returns `None` if the token is not in that notation.
///
/// # Errors
///
/// Returns `SchemaSheetsError::Cardinality` if a bound is not a number
pub fn parse_range(token: &str) -> Option<Result<CardinalityFlags>> {
    let expanded = match token {
        "1" => "1..1",
        "*" => "0..*",
        other => other,
    };
    let (min, max) = expanded.split_once("..")?;
    Some(range_flags(token, min.trim(), max.trim()))
}

fn range_flags(token: &str, min: &str, max: &str) -> Result<CardinalityFlags> {
    let min: u64 = min
        .parse()
        .map_err(|_| SchemaSheetsError::cardinality(token, "minimum is not a number"))?;
    let multivalued = if max == "*" {
        true
    } else {
        let max: u64 = max
            .parse()
            .map_err(|_| SchemaSheetsError::cardinality(token, "maximum is not a number or '*'"))?;
        if max < min {
            return Err(SchemaSheetsError::cardinality(token, "maximum is below minimum"));
        }
        max > 1
    };
    Ok(flags(Some(min > 0), Some(multivalued), None))
}

/// UML-style rendering of required/multivalued flags
#[must_use]
pub fn render(required: Option<bool>, multivalued: Option<bool>) -> Option<String> {
    if required.is_none() && multivalued.is_none() {
        return None;
    }
    let token = match (required.unwrap_or(false), multivalued.unwrap_or(false)) {
        (true, false) => "1",
        (false, false) => "0..1",
        (false, true) => "0..*",
        (true, true) => "1..*",
    };
    Some(token.to_string())
}

/// Applies cardinality tokens to slots
pub struct CardinalityResolver<'v> {
    vocabulary: &'v CardinalityVocabulary,
}

impl<'v> CardinalityResolver<'v> {
    /// Create a resolver over a vocabulary
    #[must_use]
    pub fn new(vocabulary: &'v CardinalityVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Translate a token into flags
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Cardinality` if the token is unparseable
    /// or ambiguous
    pub fn resolve(&self, token: &str) -> Result<CardinalityFlags> {
        let token = token.trim();
        if let Some(range) = parse_range(token) {
            return range;
        }
        Ok(self.vocabulary.lookup(token)?.maps_to)
    }

    /// Apply a token to a slot-like element
    ///
    /// # Errors
    ///
    /// Returns `SchemaSheetsError::Value` if the element is not a slot, or a
    /// cardinality error if the token cannot be resolved
    pub fn apply(&self, model: &mut SchemaModel, id: ElementId, token: &str) -> Result<()> {
        let element = model.element(id);
        if !element.kind().is_slot_like() {
            return Err(SchemaSheetsError::value(format!(
                "cardinality applies to slots, not {} '{}'",
                element.kind(),
                element.name()
            )));
        }
        let flags = self.resolve(token)?;
        for (key, flag) in [
            ("required", flags.required),
            ("multivalued", flags.multivalued),
            ("recommended", flags.recommended),
        ] {
            if let Some(flag) = flag {
                model.set(id, key, Value::Bool(flag));
            }
        }
        if flags.not_applicable {
            model.mark_inapplicable(id);
        }
        Ok(())
    }
}
