use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Days, NaiveDate};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::frame::{Cell, Frame};

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Workbook has no sheets")]
    NoSheets,
}

/// Header fragments that mark a sheet as holding transactions.
const TRANSACTION_HEADER_HINTS: &[&str] = &["date", "debit", "credit", "balance"];

/// Decode every sheet of an `xls`/`xlsx`/`ods` workbook. The first row of each
/// sheet becomes its header.
pub fn read_sheets(data: Vec<u8>) -> Result<Vec<(String, Frame)>, WorkbookError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
    let names = workbook.sheet_names();

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = workbook.worksheet_range(&name)?;
        let mut rows = range.rows();
        let headers = rows
            .next()
            .map(|r| r.iter().map(|c| data_to_cell(c).to_string()).collect())
            .unwrap_or_default();
        let mut frame = Frame::new(headers);
        for row in rows {
            let cells: Vec<Cell> = row.iter().map(data_to_cell).collect();
            if cells.iter().all(Cell::is_empty) {
                continue;
            }
            frame.push_row(cells);
        }
        debug!(sheet = %name, rows = frame.len(), "decoded worksheet");
        sheets.push((name, frame));
    }
    Ok(sheets)
}

/// The first sheet whose headers look transactional, else the first sheet.
pub fn select_transaction_sheet(sheets: Vec<(String, Frame)>) -> Option<(String, Frame)> {
    let pick = sheets.iter().position(|(_, frame)| {
        frame.headers.iter().any(|h| {
            let lower = h.to_lowercase();
            TRANSACTION_HEADER_HINTS.iter().any(|hint| lower.contains(hint))
        })
    });
    sheets.into_iter().nth(pick.unwrap_or(0))
}

/// Decode a workbook and return its transaction sheet.
pub fn read_transaction_frame(data: Vec<u8>) -> Result<Frame, WorkbookError> {
    select_transaction_sheet(read_sheets(data)?)
        .map(|(_, frame)| frame)
        .ok_or(WorkbookError::NoSheets)
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => Decimal::from_f64(*f).map(Cell::Number).unwrap_or(Cell::Empty),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(_) => Cell::Empty,
    }
}

/// Excel serial day number (1900 date system) to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.trunc() as u64))
}
