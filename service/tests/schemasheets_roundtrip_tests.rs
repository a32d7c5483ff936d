//! Roundtrip tests for schema sheets
//!
//! Merging a sheet and projecting the schema back through the same table
//! reproduces the sheet's rows.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use schemasheets_core::LinkmlMetamodel;
use schemasheets_service::schemasheets::{
    Row, SchemaMaker, SchemaProjector, SchemaSheet, SchemaSheetsConfig, SheetReader,
};

fn sheet(text: &str) -> SchemaSheet {
    SheetReader::new(&LinkmlMetamodel::new())
        .read_delimited("sheet.tsv", text.as_bytes(), b'\t')
        .unwrap()
}

fn roundtrip(sheet: &SchemaSheet) -> Vec<Row> {
    let mut config = SchemaSheetsConfig::default();
    config.maker.schema_name = Some("roundtrip".to_string());
    let model = SchemaMaker::new(config)
        .merge_sheets(std::slice::from_ref(sheet))
        .unwrap();
    SchemaProjector::new(&sheet.table, "|").project(&model)
}

fn rows(sheet: &SchemaSheet) -> Vec<Row> {
    sheet.rows.iter().map(|r| r.cells.clone()).collect()
}

#[test]
fn test_class_and_slot_usage_rows() {
    let sheet = sheet(
        "\
class\tslot\tcardinality\trange\tdesc
>class\tslot\tcardinality\trange\tdescription
Person\t\t\t\ta person
Person\tid\t1\tstring\t
Person\taliases\t0..*\t\t
Person\tage\t0..1\tinteger\tage in years
",
    );
    assert_eq!(roundtrip(&sheet), rows(&sheet));
}

#[test]
fn test_enum_rows() {
    let sheet = sheet(
        "\
enum\tvalue\tdesc
>enum\tpermissible_value\tdescription
Color\t\tprimary colors
Color\tred\tthe color red
Color\tblue\t
",
    );
    assert_eq!(roundtrip(&sheet), rows(&sheet));
}

#[test]
fn test_curie_prefix_column() {
    let sheet = sheet(
        "\
class\tschema.org
>class\texact_mappings
>\tcurie_prefix: schema
Person\tPerson
Place\tPlace|Landform
",
    );
    assert_eq!(roundtrip(&sheet), rows(&sheet));
}

#[test]
fn test_top_level_slot_rows() {
    let sheet = sheet(
        "\
slot\trange\tdesc
>slot\trange\tdescription
age\tinteger\tage in years
name\t\tfull name
",
    );
    assert_eq!(roundtrip(&sheet), rows(&sheet));
}

proptest! {
    #[test]
    fn multivalued_cells_split_and_join(
        aliases in prop::collection::btree_set("[a-z]{1,8}", 1..6)
    ) {
        let joined = aliases.into_iter().collect::<Vec<_>>().join("|");
        let text = format!("class\taliases\n>class\taliases\nPerson\t{joined}\n");
        let projected = roundtrip(&sheet(&text));
        prop_assert_eq!(projected.len(), 1);
        prop_assert_eq!(projected[0].get("aliases"), Some(&joined));
    }
}
