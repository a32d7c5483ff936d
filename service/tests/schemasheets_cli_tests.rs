//! CLI integration tests for the `schemasheets` commands
//!
//! Commands are parsed from argument lists and run against files in a
//! temporary directory.

use clap::Parser;
use pretty_assertions::assert_eq;
use schemasheets_core::ErrorCategory;
use schemasheets_service::cli::{SchemaSheetsApp, SchemaSheetsCli};
use schemasheets_service::schemasheets::load_schema;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CLASSES: &str = "\
class\tmappings\tdesc
>class\texact_mappings\tdescription
Person\tschema:Person\ta person
";

const SLOTS: &str = "\
class,slot,cardinality,range
>class,slot,cardinality,range
Person,age,0..1,integer
Person,name,1,
";

fn run(args: &[&str]) -> schemasheets_core::Result<()> {
    let mut argv = vec!["schemasheets", "--quiet"];
    argv.extend_from_slice(args);
    SchemaSheetsApp::new(SchemaSheetsCli::parse_from(argv)).run()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn write_sheets(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
    let classes = dir.path().join("classes.tsv");
    fs::write(&classes, CLASSES).unwrap();
    let slots = dir.path().join("slots.csv");
    fs::write(&slots, SLOTS).unwrap();
    (classes, slots)
}

#[test]
fn test_sheets2linkml_writes_schema() {
    let dir = TempDir::new().unwrap();
    let (classes, slots) = write_sheets(&dir);
    let output = dir.path().join("personinfo.yaml");

    run(&[
        "sheets2linkml",
        path_str(&classes),
        path_str(&slots),
        "-n",
        "personinfo",
        "-o",
        path_str(&output),
    ])
    .unwrap();

    let doc = load_schema(&output).unwrap().to_value();
    assert_eq!(doc["name"], json!("personinfo"));
    assert_eq!(doc["classes"]["Person"]["slots"], json!(["age", "name"]));
    assert_eq!(doc["classes"]["Person"]["slot_usage"]["name"]["required"], json!(true));
    assert_eq!(doc["prefixes"]["schema"], json!("http://schema.org/"));
}

#[test]
fn test_sheets2linkml_json_from_extension() {
    let dir = TempDir::new().unwrap();
    let (classes, _) = write_sheets(&dir);
    let output = dir.path().join("personinfo.json");

    run(&["sheets2linkml", path_str(&classes), "-o", path_str(&output)]).unwrap();

    let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["name"], json!("TEMP"));
    assert_eq!(doc["classes"]["Person"]["description"], json!("a person"));
}

#[test]
fn test_sheets2linkml_with_table_config() {
    let dir = TempDir::new().unwrap();
    let sheet = dir.path().join("records.tsv");
    fs::write(&sheet, "record\tinfo\nPerson\ta person\n").unwrap();
    let table_config = dir.path().join("table.yaml");
    fs::write(&table_config, "record: class\ninfo: description\n").unwrap();
    let output = dir.path().join("out.yaml");

    run(&[
        "sheets2linkml",
        path_str(&sheet),
        "-C",
        path_str(&table_config),
        "-o",
        path_str(&output),
    ])
    .unwrap();

    let doc = load_schema(&output).unwrap().to_value();
    assert_eq!(doc["classes"]["Person"]["description"], json!("a person"));
}

#[test]
fn test_sheets2linkml_reports_row_errors() {
    let dir = TempDir::new().unwrap();
    let sheet = dir.path().join("bad.tsv");
    fs::write(&sheet, "class\tcard\n>class\tcardinality\nPerson\t1\n").unwrap();
    let output = dir.path().join("out.yaml");

    let err = run(&["sheets2linkml", path_str(&sheet), "-o", path_str(&output)]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Value);
    assert!(err.to_string().contains("Error in line 3"));
    assert!(!output.exists());
}

#[test]
fn test_linkml2sheets_uses_template() {
    let dir = TempDir::new().unwrap();
    let (classes, slots) = write_sheets(&dir);
    let schema = dir.path().join("personinfo.yaml");
    run(&[
        "sheets2linkml",
        path_str(&classes),
        path_str(&slots),
        "-n",
        "personinfo",
        "-o",
        path_str(&schema),
    ])
    .unwrap();

    let output = dir.path().join("exported.csv");
    run(&[
        "linkml2sheets",
        path_str(&schema),
        "-s",
        path_str(&slots),
        "-o",
        path_str(&output),
    ])
    .unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "class,slot,cardinality,range\n>class,slot,cardinality,range\nPerson,age,0..1,integer\nPerson,name,1,\n"
    );
}
