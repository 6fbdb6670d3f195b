//! Writes an output table as delimited text or as a single-sheet workbook,
//! chosen by the output path's extension.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, Worksheet, XlsxError};

use crate::{
    data::{Value, cell_display},
    error::{MapperError, MapperResult},
    frame::Table,
    io_utils,
    loader::TableFormat,
};

const SHEET_NAME: &str = "Sheet1";
const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

struct DateFormats {
    date: Format,
    datetime: Format,
}

pub fn save_table(table: &Table, path: &Path, delimiter: Option<u8>) -> MapperResult<()> {
    let result = match TableFormat::for_path(path) {
        TableFormat::Delimited => write_delimited(table, path, delimiter),
        TableFormat::Workbook => write_workbook(table, path),
    };
    result.map_err(|err| MapperError::OutputWrite {
        path: path.to_path_buf(),
        source: err.into(),
    })?;
    info!(
        "Wrote {} row(s) across {} column(s) to {:?}",
        table.row_count(),
        table.columns().len(),
        path
    );
    Ok(())
}

fn write_delimited(table: &Table, path: &Path, delimiter: Option<u8>) -> Result<()> {
    let delimiter = io_utils::resolve_delimiter(path, delimiter);
    let mut writer = io_utils::create_csv_writer(path, delimiter)?;
    writer
        .write_record(table.columns())
        .with_context(|| "Writing output headers")?;
    for (idx, row) in table.rows().enumerate() {
        writer
            .write_record(row.iter().map(cell_display))
            .with_context(|| format!("Writing row {}", idx + 2))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

fn write_workbook(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let formats = DateFormats {
        date: Format::new().set_num_format(DATE_FORMAT),
        datetime: Format::new().set_num_format(DATETIME_FORMAT),
    };
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        for (col, name) in table.columns().iter().enumerate() {
            sheet.write_string(0, column_index(col)?, name)?;
        }
        for (row_idx, row) in table.rows().enumerate() {
            let sheet_row = u32::try_from(row_idx + 1).context("Too many rows for a worksheet")?;
            for (col, cell) in row.iter().enumerate() {
                if let Some(value) = cell {
                    write_value(sheet, sheet_row, column_index(col)?, value, &formats)?;
                }
            }
        }
    }
    workbook
        .save(path)
        .with_context(|| format!("Saving workbook {path:?}"))?;
    Ok(())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).context("Too many columns for a worksheet")
}

fn write_value(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    formats: &DateFormats,
) -> Result<(), XlsxError> {
    match value {
        Value::Integer(i) => sheet.write_number(row, col, *i as f64)?,
        Value::Float(f) => sheet.write_number(row, col, *f)?,
        Value::Boolean(b) => sheet.write_boolean(row, col, *b)?,
        Value::Date(date) => match excel_date(date) {
            Some(excel) => sheet.write_datetime_with_format(row, col, &excel, &formats.date)?,
            None => sheet.write_string(row, col, value.as_display())?,
        },
        Value::DateTime(datetime) => match excel_datetime(datetime) {
            Some(excel) => {
                sheet.write_datetime_with_format(row, col, &excel, &formats.datetime)?
            }
            None => sheet.write_string(row, col, value.as_display())?,
        },
        Value::String(text) => sheet.write_string(row, col, text)?,
    };
    Ok(())
}

/// `None` for dates Excel cannot represent; callers fall back to text.
fn excel_date(date: &NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

fn excel_datetime(datetime: &NaiveDateTime) -> Option<ExcelDateTime> {
    excel_date(&datetime.date())?
        .and_hms(
            datetime.hour() as u16,
            datetime.minute() as u8,
            f64::from(datetime.second()),
        )
        .ok()
}
