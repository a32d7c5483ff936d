//! Post-merge repair of a finished schema
//!
//! Declares prefixes that mappings and URIs use but the schema never
//! declared, and subsets that elements are placed in but that were never
//! defined.

use schemasheets_core::{ElementKind, SchemaModel, Value};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Fields whose values are CURIEs
const CURIE_FIELDS: [&str; 12] = [
    "mappings",
    "exact_mappings",
    "close_mappings",
    "related_mappings",
    "narrow_mappings",
    "broad_mappings",
    "class_uri",
    "slot_uri",
    "enum_uri",
    "meaning",
    "uri",
    "see_also",
];

/// Well-known prefix expansions
const KNOWN_PREFIXES: &[(&str, &str)] = &[
    ("bibo", "http://purl.org/ontology/bibo/"),
    ("biolink", "https://w3id.org/biolink/vocab/"),
    ("CHEBI", "http://purl.obolibrary.org/obo/CHEBI_"),
    ("CL", "http://purl.obolibrary.org/obo/CL_"),
    ("dcat", "http://www.w3.org/ns/dcat#"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("dc", "http://purl.org/dc/elements/1.1/"),
    ("ENVO", "http://purl.obolibrary.org/obo/ENVO_"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("GO", "http://purl.obolibrary.org/obo/GO_"),
    ("HP", "http://purl.obolibrary.org/obo/HP_"),
    ("IAO", "http://purl.obolibrary.org/obo/IAO_"),
    ("linkml", "https://w3id.org/linkml/"),
    ("MONDO", "http://purl.obolibrary.org/obo/MONDO_"),
    ("NCBITaxon", "http://purl.obolibrary.org/obo/NCBITaxon_"),
    ("NCIT", "http://purl.obolibrary.org/obo/NCIT_"),
    ("OBI", "http://purl.obolibrary.org/obo/OBI_"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("PATO", "http://purl.obolibrary.org/obo/PATO_"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("qudt", "http://qudt.org/schema/qudt/"),
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("RO", "http://purl.obolibrary.org/obo/RO_"),
    ("schema", "http://schema.org/"),
    ("sdo", "http://schema.org/"),
    ("sh", "http://www.w3.org/ns/shacl#"),
    ("SIO", "http://semanticscience.org/resource/SIO_"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("SO", "http://purl.obolibrary.org/obo/SO_"),
    ("UBERON", "http://purl.obolibrary.org/obo/UBERON_"),
    ("UO", "http://purl.obolibrary.org/obo/UO_"),
    ("wd", "http://www.wikidata.org/entity/"),
    ("wikidata", "http://www.wikidata.org/entity/"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
];

/// What a repair run added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Prefixes declared, with their expansion
    pub prefixes_added: Vec<(String, String)>,
    /// Subsets defined
    pub subsets_added: Vec<String>,
}

/// Repairs prefixes and subsets in place
#[derive(Debug, Clone, Copy, Default)]
pub struct RepairPass;

impl RepairPass {
    /// Create a repair pass
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Expansion for a well-known prefix
    #[must_use]
    pub fn guess_prefix_expansion(prefix: &str) -> Option<&'static str> {
        KNOWN_PREFIXES
            .iter()
            .find(|(known, _)| *known == prefix)
            .map(|(_, expansion)| *expansion)
    }

    /// Repair the model
    pub fn run(&self, model: &mut SchemaModel) -> RepairReport {
        let mut report = RepairReport::default();

        let mut used_prefixes = BTreeSet::new();
        let mut used_subsets = BTreeSet::new();
        for id in model.iter() {
            let element = model.element(id);
            for field in CURIE_FIELDS {
                for text in strings(element.get(field)) {
                    if let Some(prefix) = curie_prefix(text) {
                        used_prefixes.insert(prefix.to_string());
                    }
                }
            }
            for subset in strings(element.get("in_subset")) {
                used_subsets.insert(subset.to_string());
            }
        }

        for prefix in used_prefixes {
            if model.find_top_level(ElementKind::Prefix, &prefix).is_some() {
                continue;
            }
            debug!("Guessing prefix expansion: {}", prefix);
            let expansion = Self::guess_prefix_expansion(&prefix)
                .map_or_else(|| format!("http://example.org/{prefix}/"), str::to_string);
            warn!("Filling in missing prefix for: {} => {}", prefix, expansion);
            let id = model.top_level(ElementKind::Prefix, &prefix);
            model.set(id, "prefix_reference", Value::String(expansion.clone()));
            report.prefixes_added.push((prefix, expansion));
        }

        for subset in used_subsets {
            if model.find_top_level(ElementKind::Subset, &subset).is_none() {
                model.top_level(ElementKind::Subset, &subset);
                report.subsets_added.push(subset);
            }
        }
        report
    }
}

fn strings(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(text)) => vec![text.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Prefix of a CURIE; URLs and plain names have none
fn curie_prefix(text: &str) -> Option<&str> {
    let (prefix, local) = text.split_once(':')?;
    if prefix.is_empty() || local.starts_with("//") || prefix.contains(char::is_whitespace) {
        return None;
    }
    Some(prefix)
}
