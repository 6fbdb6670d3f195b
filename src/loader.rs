//! Reads delimited-text and spreadsheet files into a [`Table`].
//!
//! The loader never coerces types: delimited-text cells stay strings and
//! workbook cells keep whatever type the workbook recorded. Empty cells become
//! nulls. Any read or decode failure is reported as
//! [`MapperError::UnreadableFile`] carrying the file's display name.

use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::NaiveTime;
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::{
    data::{Cell, Value},
    error::{MapperError, MapperResult},
    frame::Table,
    io_utils,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited,
    Workbook,
}

impl TableFormat {
    pub fn for_path(path: &Path) -> Self {
        if io_utils::is_workbook_path(path) {
            TableFormat::Workbook
        } else {
            TableFormat::Delimited
        }
    }
}

/// Options for delimited-text input; workbook input ignores them.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
        }
    }
}

pub fn load_table(path: &Path, options: &LoadOptions) -> MapperResult<Table> {
    let format = TableFormat::for_path(path);
    debug!("Loading {:?} as {:?}", path, format);
    let table = match format {
        TableFormat::Delimited => read_delimited(path, options),
        TableFormat::Workbook => read_workbook(path),
    }
    .map_err(|err| MapperError::unreadable(io_utils::display_name(path), err))?;
    info!(
        "Loaded {} column(s) and {} row(s) from {:?}",
        table.columns().len(),
        table.row_count(),
        path
    );
    Ok(table)
}

fn read_delimited(path: &Path, options: &LoadOptions) -> Result<Table> {
    let delimiter = io_utils::resolve_delimiter(path, options.delimiter);
    let mut reader = io_utils::open_csv_reader_from_path(path, delimiter)?;
    let headers = io_utils::reader_headers(&mut reader, options.encoding)
        .with_context(|| format!("Reading header row of {path:?}"))?;
    let headers = headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| if name.is_empty() { unnamed(idx) } else { name })
        .collect::<Vec<_>>();
    let width = headers.len();
    let mut table = Table::empty(headers);

    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        if record.len() > width {
            bail!(
                "Row {} has {} field(s) but the header defines {}",
                row_idx + 2,
                record.len(),
                width
            );
        }
        let decoded = io_utils::decode_record(&record, options.encoding)
            .with_context(|| format!("Decoding row {}", row_idx + 2))?;
        table.push_row(decoded.into_iter().map(text_cell).collect());
    }
    Ok(table)
}

fn text_cell(raw: String) -> Cell {
    if raw.is_empty() {
        None
    } else {
        Some(Value::String(raw))
    }
}

fn read_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook has no worksheets"))??;

    // The range starts at the first used cell; columns left of it still count from A.
    let leading = range.start().map_or(0, |(_, col)| col as usize);
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Table::default());
    };
    let headers = (0..leading)
        .map(unnamed)
        .chain(
            header_row
                .iter()
                .enumerate()
                .map(|(idx, cell)| header_name(leading + idx, cell)),
        )
        .collect::<Vec<_>>();
    if leading > 0 {
        debug!("Worksheet starts at column {leading}; padding with empty columns");
    }

    let table = Table::from_rows(
        headers,
        rows.map(|row| {
            std::iter::repeat_n(None, leading)
                .chain(row.iter().map(workbook_cell))
                .collect()
        }),
    );
    Ok(table)
}

fn unnamed(index: usize) -> String {
    format!("Unnamed: {index}")
}

fn header_name(index: usize, cell: &Data) -> String {
    match cell {
        Data::Empty => unnamed(index),
        Data::String(s) if s.is_empty() => unnamed(index),
        Data::String(s) => s.clone(),
        other => workbook_cell(other)
            .map(|value| value.as_display())
            .unwrap_or_else(|| unnamed(index)),
    }
}

fn workbook_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::Integer(*i)),
        Data::Float(f) => Some(Value::Float(*f)),
        Data::Bool(b) => Some(Value::Boolean(*b)),
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) if dt.time() == NaiveTime::default() => Some(Value::Date(dt.date())),
            Some(dt) => Some(Value::DateTime(dt)),
            None => Some(Value::String(cell.to_string())),
        },
        Data::DurationIso(s) => Some(Value::String(s.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn delimited_rows_keep_strings_and_null_empty_fields() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("people.csv");
        fs::write(&path, "Name,Age\nJohn,25\nJane,\n").expect("write csv");

        let table = load_table(&path, &LoadOptions::default()).expect("load");
        assert_eq!(table.columns(), &["Name".to_string(), "Age".to_string()]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("Age").unwrap(),
            &[Some(Value::from("25")), None]
        );
    }

    #[test]
    fn tsv_extension_uses_tab_delimiter() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("people.tsv");
        fs::write(&path, "Name\tAge\nJohn\t25\n").expect("write tsv");

        let table = load_table(&path, &LoadOptions::default()).expect("load");
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn overlong_rows_are_unreadable() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.csv");
        fs::write(&path, "a,b\n1,2,3\n").expect("write csv");

        let err = load_table(&path, &LoadOptions::default()).unwrap_err();
        match err {
            MapperError::UnreadableFile { file, .. } => assert_eq!(file, "broken.csv"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("latin.csv");
        fs::write(&path, b"name\nJos\xe9\n").expect("write csv");

        assert!(matches!(
            load_table(&path, &LoadOptions::default()),
            Err(MapperError::UnreadableFile { .. })
        ));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("absent.xlsx");
        assert!(matches!(
            load_table(&path, &LoadOptions::default()),
            Err(MapperError::UnreadableFile { .. })
        ));
    }

    #[test]
    fn workbook_cells_convert_by_type() {
        assert_eq!(workbook_cell(&Data::Empty), None);
        assert_eq!(workbook_cell(&Data::Int(7)), Some(Value::Integer(7)));
        assert_eq!(workbook_cell(&Data::Float(2.5)), Some(Value::Float(2.5)));
        assert_eq!(workbook_cell(&Data::Bool(true)), Some(Value::Boolean(true)));
        assert_eq!(workbook_cell(&Data::String(String::new())), None);
        assert_eq!(header_name(2, &Data::Empty), "Unnamed: 2");
    }

    #[test]
    fn workbook_datetimes_split_into_dates_and_datetimes() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 6).unwrap();
        assert_eq!(
            workbook_cell(&Data::DateTimeIso("2024-05-06T00:00:00".into())),
            Some(Value::Date(day))
        );
        assert_eq!(
            workbook_cell(&Data::DateTimeIso("2024-05-06T14:30:00".into())),
            Some(Value::DateTime(day.and_hms_opt(14, 30, 0).unwrap()))
        );
    }

    #[test]
    fn empty_csv_headers_are_named_by_position() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("unnamed.csv");
        fs::write(&path, ",Age\nJohn,25\n").expect("write csv");

        let table = load_table(&path, &LoadOptions::default()).expect("load");
        assert_eq!(table.columns(), &["Unnamed: 0".to_string(), "Age".to_string()]);
        assert_eq!(table.column("Unnamed: 0").unwrap(), &[Some(Value::from("John"))]);
    }

    #[test]
    fn worksheet_starting_past_column_a_keeps_leading_columns() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("offset.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 1, "Name").unwrap();
        sheet.write_string(0, 3, "Age").unwrap();
        sheet.write_string(1, 1, "John").unwrap();
        sheet.write_number(1, 3, 25.0).unwrap();
        workbook.save(&path).unwrap();

        let table = load_table(&path, &LoadOptions::default()).expect("load");
        assert_eq!(
            table.columns(),
            &["Unnamed: 0", "Name", "Unnamed: 2", "Age"].map(String::from)
        );
        assert_eq!(
            table.row(0).unwrap(),
            vec![None, Some(Value::from("John")), None, Some(Value::Float(25.0))]
        );
    }
}
