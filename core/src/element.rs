//! Schema element kinds
//!
//! The closed set of element categories a sheet column can discriminate on.
//! Every decision that depends on "what sort of element is this" matches on
//! [`ElementKind`] so adding a kind is a compile error everywhere it matters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of schema element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    /// The schema itself
    Schema,
    /// Class definition
    Class,
    /// Slot definition, top level or as a slot usage inside a class
    Slot,
    /// Slot owned by a single class
    Attribute,
    /// Enumeration
    Enum,
    /// Permissible value of an enumeration
    PermissibleValue,
    /// Type definition
    Type,
    /// Subset definition
    Subset,
    /// Prefix declaration
    Prefix,
    /// Free-form schema setting
    Setting,
}

impl ElementKind {
    /// All kinds, in the order descriptor columns are examined
    pub const ALL: [ElementKind; 10] = [
        ElementKind::Schema,
        ElementKind::Class,
        ElementKind::Slot,
        ElementKind::Attribute,
        ElementKind::Enum,
        ElementKind::PermissibleValue,
        ElementKind::Type,
        ElementKind::Subset,
        ElementKind::Prefix,
        ElementKind::Setting,
    ];

    /// Descriptor tag used in sheet headers
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Class => "class",
            Self::Slot => "slot",
            Self::Attribute => "attribute",
            Self::Enum => "enum",
            Self::PermissibleValue => "permissible_value",
            Self::Type => "type",
            Self::Subset => "subset",
            Self::Prefix => "prefix",
            Self::Setting => "setting",
        }
    }

    /// Parse a descriptor tag
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    /// Key under which elements of this kind are collected in their owner
    #[must_use]
    pub const fn collection(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Class => "classes",
            Self::Slot => "slots",
            Self::Attribute => "attributes",
            Self::Enum => "enums",
            Self::PermissibleValue => "permissible_values",
            Self::Type => "types",
            Self::Subset => "subsets",
            Self::Prefix => "prefixes",
            Self::Setting => "settings",
        }
    }

    /// Field that carries the element's identifying name
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::PermissibleValue => "text",
            Self::Prefix => "prefix_prefix",
            Self::Setting => "setting_key",
            _ => "name",
        }
    }

    /// Whether scalar writes on this kind are exempt from the write-once check
    #[must_use]
    pub const fn accepts_overwrites(self) -> bool {
        matches!(self, Self::Schema | Self::Prefix | Self::Setting)
    }

    /// Whether the kind describes a slot
    #[must_use]
    pub const fn is_slot_like(self) -> bool {
        matches!(self, Self::Slot | Self::Attribute)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
