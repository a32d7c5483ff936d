//! Reading and writing schema sheets
//!
//! A sheet is a column-name line, descriptor lines, then data rows. TSV and
//! CSV files are read with `csv`; spreadsheet workbooks with `calamine`, one
//! sheet per worksheet.

use super::header::{DEFAULT_MARKER, HeaderInterpreter};
use super::table::TableConfig;
use calamine::{Data, Reader, open_workbook_auto};
use indexmap::IndexMap;
use schemasheets_core::{MetamodelProvider, Result, SchemaSheetsError};
use serde_yaml::Value as YamlValue;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// A data row: column name to raw cell, blank cells omitted
pub type Row = IndexMap<String, String>;

/// A data row with its 1-based physical line number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetRow {
    /// Line in the source file
    pub line: usize,
    /// Cells by column name
    pub cells: Row,
}

/// A parsed sheet
#[derive(Debug, Clone)]
pub struct SchemaSheet {
    /// File or worksheet name
    pub name: String,
    /// Column names in order
    pub columns: Vec<String>,
    /// Descriptor lines as written
    pub descriptor_lines: Vec<Vec<String>>,
    /// Interpreted column configuration
    pub table: TableConfig,
    /// Data rows
    pub rows: Vec<SheetRow>,
}

/// Field delimiter for a sheet file: comma for `.csv`, tab otherwise
#[must_use]
pub fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => b',',
        _ => b'\t',
    }
}

fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            ["xlsx", "xlsm", "xlsb", "xls", "ods"]
                .iter()
                .any(|w| ext.eq_ignore_ascii_case(w))
        })
}

/// Reads sheets and interprets their headers
pub struct SheetReader<'m> {
    metamodel: &'m dyn MetamodelProvider,
    delimiter: Option<u8>,
    marker: char,
    table_config: Option<YamlValue>,
}

impl<'m> SheetReader<'m> {
    /// Create a reader using the file extension to pick the delimiter
    #[must_use]
    pub fn new(metamodel: &'m dyn MetamodelProvider) -> Self {
        Self {
            metamodel,
            delimiter: None,
            marker: DEFAULT_MARKER,
            table_config: None,
        }
    }

    /// Always use this delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Use a different descriptor marker
    #[must_use]
    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }

    /// Apply a table configuration document to every sheet read
    #[must_use]
    pub fn with_table_config(mut self, doc: YamlValue) -> Self {
        self.table_config = Some(doc);
        self
    }

    /// Read a sheet file; workbooks yield one sheet per non-empty worksheet
    ///
    /// # Errors
    ///
    /// Returns an IO or parse error if the file cannot be read, and a
    /// configuration error if a header cannot be interpreted
    pub fn read_path(&self, path: &Path) -> Result<Vec<SchemaSheet>> {
        if is_workbook(path) {
            return self.read_workbook(path);
        }
        let file = std::fs::File::open(path).map_err(|e| {
            SchemaSheetsError::io_error(format!("Cannot open {}: {e}", path.display()))
        })?;
        let delimiter = self.delimiter.unwrap_or_else(|| delimiter_for(path));
        let name = path.display().to_string();
        Ok(vec![self.read_delimited(&name, file, delimiter)?])
    }

    /// Read delimited text
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed records and a configuration error
    /// if the header cannot be interpreted
    pub fn read_delimited<R: Read>(&self, name: &str, reader: R, delimiter: u8) -> Result<SchemaSheet> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(reader);
        let mut records = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = result.map_err(|e| SchemaSheetsError::parse_at(e.to_string(), name))?;
            let line = record
                .position()
                .and_then(|p| usize::try_from(p.line()).ok())
                .unwrap_or(i + 1);
            records.push((line, record.iter().map(str::to_string).collect()));
        }
        self.build(name, records)
    }

    fn read_workbook(&self, path: &Path) -> Result<Vec<SchemaSheet>> {
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            SchemaSheetsError::parse_at(format!("Cannot open workbook: {e}"), path.display().to_string())
        })?;
        let mut sheets = Vec::new();
        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                SchemaSheetsError::parse_at(format!("Cannot read worksheet: {e}"), sheet_name.clone())
            })?;
            if range.is_empty() {
                debug!("skipping empty worksheet {}", sheet_name);
                continue;
            }
            let first_line = range
                .start()
                .and_then(|(row, _)| usize::try_from(row).ok())
                .unwrap_or(0);
            let records = range
                .rows()
                .enumerate()
                .map(|(i, cells)| (first_line + i + 1, cells.iter().map(cell_text).collect()))
                .collect();
            sheets.push(self.build(&sheet_name, records)?);
        }
        Ok(sheets)
    }

    fn build(&self, name: &str, records: Vec<(usize, Vec<String>)>) -> Result<SchemaSheet> {
        let mut records = records.into_iter();
        let Some((_, header)) = records.next() else {
            return Err(SchemaSheetsError::parse_at("sheet has no column names", name));
        };
        let columns: Vec<String> = header.iter().map(|c| c.trim().to_string()).collect();

        let mut descriptor_lines = Vec::new();
        let mut rows = Vec::new();
        for (line, cells) in records {
            if HeaderInterpreter::is_descriptor_line(&cells, self.marker) {
                if !rows.is_empty() {
                    return Err(SchemaSheetsError::config(format!(
                        "Descriptor line {line} of {name} follows data rows"
                    )));
                }
                descriptor_lines.push(cells);
                continue;
            }
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let cells: Row = columns
                .iter()
                .zip(cells)
                .filter(|(column, cell)| !column.is_empty() && !cell.is_empty())
                .map(|(column, cell)| (column.clone(), cell))
                .collect();
            rows.push(SheetRow { line, cells });
        }

        let mut interpreter =
            HeaderInterpreter::new(self.metamodel, columns.clone()).with_marker(self.marker);
        for line in &descriptor_lines {
            interpreter.add_line(line)?;
        }
        if let Some(doc) = &self.table_config {
            interpreter.apply_table_config(doc)?;
        } else if descriptor_lines.is_empty() {
            warn!("No descriptor line found in {}", name);
        }
        let table = interpreter.finish()?;
        debug!("{}: {} columns, {} rows", name, table.len(), rows.len());
        Ok(SchemaSheet {
            name: name.to_string(),
            columns,
            descriptor_lines,
            table,
            rows,
        })
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Write a sheet: column names, descriptor lines, then rows
///
/// # Errors
///
/// Returns an IO or serialization error if writing fails
pub fn write_delimited<W: Write>(
    writer: W,
    columns: &[String],
    descriptor_lines: &[Vec<String>],
    rows: &[Row],
    delimiter: u8,
) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_writer(writer);
    let csv_error = |e: csv::Error| SchemaSheetsError::serialization(e.to_string());
    out.write_record(columns).map_err(csv_error)?;
    for line in descriptor_lines {
        out.write_record(line).map_err(csv_error)?;
    }
    for row in rows {
        out.write_record(columns.iter().map(|c| row.get(c).map_or("", String::as_str)))
            .map_err(csv_error)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemasheets_core::{ElementKind, LinkmlMetamodel};

    const PERSON_TSV: &str = "class\tslot\tdesc\n>class\tslot\tdescription\nPerson\t\ta person\n\t\t\nPerson\tage\tyears\n";

    #[test]
    fn test_read_tsv() {
        let mm = LinkmlMetamodel::new();
        let sheet = SheetReader::new(&mm)
            .read_delimited("person.tsv", PERSON_TSV.as_bytes(), b'\t')
            .unwrap();
        assert_eq!(sheet.columns, vec!["class", "slot", "desc"]);
        assert_eq!(sheet.descriptor_lines.len(), 1);
        assert_eq!(sheet.table.column_for_kind(ElementKind::Slot), Some("slot"));
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].line, 3);
        assert_eq!(sheet.rows[1].line, 5);
        assert_eq!(sheet.rows[0].cells.get("slot"), None);
        assert_eq!(sheet.rows[1].cells.get("slot").map(String::as_str), Some("age"));
    }

    #[test]
    fn test_blank_column_dropped() {
        let mm = LinkmlMetamodel::new();
        let text = "class,,desc\n>class,,description\nPerson,junk,a person\n";
        let sheet = SheetReader::new(&mm)
            .read_delimited("p.csv", text.as_bytes(), b',')
            .unwrap();
        assert_eq!(sheet.table.len(), 2);
        assert_eq!(sheet.rows[0].cells.len(), 2);
    }

    #[test]
    fn test_descriptor_after_data_rejected() {
        let mm = LinkmlMetamodel::new();
        let text = "class\n>class\nPerson\n>slot\n";
        assert!(SheetReader::new(&mm)
            .read_delimited("p.tsv", text.as_bytes(), b'\t')
            .is_err());
    }

    #[test]
    fn test_table_config_without_descriptor_lines() {
        let mm = LinkmlMetamodel::new();
        let doc: YamlValue = serde_yaml::from_str("record: class\ninfo: description\n").unwrap();
        let sheet = SheetReader::new(&mm)
            .with_table_config(doc)
            .read_delimited("p.tsv", "record\tinfo\nPerson\ta person\n".as_bytes(), b'\t')
            .unwrap();
        assert_eq!(sheet.table.column_for_kind(ElementKind::Class), Some("record"));
        assert_eq!(sheet.rows[0].line, 2);
    }

    #[test]
    fn test_delimiter_for_extension() {
        assert_eq!(delimiter_for(Path::new("a.csv")), b',');
        assert_eq!(delimiter_for(Path::new("a.CSV")), b',');
        assert_eq!(delimiter_for(Path::new("a.tsv")), b'\t');
        assert!(is_workbook(Path::new("a.xlsx")));
    }

    #[test]
    fn test_write_delimited() {
        let columns = vec!["class".to_string(), "desc".to_string()];
        let lines = vec![vec![">class".to_string(), "description".to_string()]];
        let mut row = Row::new();
        row.insert("class".to_string(), "Person".to_string());
        let mut out = Vec::new();
        write_delimited(&mut out, &columns, &lines, &[row], b'\t').unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "class\tdesc\n>class\tdescription\nPerson\t\n"
        );
    }
}
