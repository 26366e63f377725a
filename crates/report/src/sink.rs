use std::fs;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, ColNum, ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use thiserror::Error;
use tracing::debug;

use crate::assembler::ReportStructure;
use crate::grid::{CellStyle, CellValue, GridCell, Sheet, CURRENCY_FORMAT, DATE_FORMAT, HEADER_FILL};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("XLSX error: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Persists an assembled report. `base` is the output path without extension;
/// the files actually written are returned.
pub trait ReportSink: Send + Sync {
    fn write(&self, report: &ReportStructure, base: &Path) -> Result<Vec<PathBuf>, ReportError>;
}

/// The whole structure as one pretty-printed `<base>.json`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSink;

impl ReportSink for JsonSink {
    fn write(&self, report: &ReportStructure, base: &Path) -> Result<Vec<PathBuf>, ReportError> {
        let path = base.with_extension("json");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, report)?;
        debug!(path = %path.display(), "wrote json report");
        Ok(vec![path])
    }
}

/// One `<sheet>.csv` per sheet inside the `<base>` directory, each a dense
/// grid from A1 with amounts in display format.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvSink;

impl ReportSink for CsvSink {
    fn write(&self, report: &ReportStructure, base: &Path) -> Result<Vec<PathBuf>, ReportError> {
        fs::create_dir_all(base)?;
        let mut written = Vec::with_capacity(report.sheets.len());
        for sheet in &report.sheets {
            let path = base.join(format!("{}.csv", sheet.name));
            let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
            for row in sheet.dense_rows() {
                writer.write_record(&row)?;
            }
            writer.flush()?;
            debug!(path = %path.display(), "wrote sheet");
            written.push(path);
        }
        Ok(written)
    }
}

/// A styled `<base>.xlsx` workbook, one worksheet per sheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxSink;

impl ReportSink for XlsxSink {
    fn write(&self, report: &ReportStructure, base: &Path) -> Result<Vec<PathBuf>, ReportError> {
        let path = base.with_extension("xlsx");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut workbook = Workbook::new();
        for sheet in &report.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;
            fill_worksheet(worksheet, sheet)?;
        }
        workbook.save(&path)?;
        debug!(path = %path.display(), "wrote xlsx report");
        Ok(vec![path])
    }
}

fn column_index(col: u32) -> Result<ColNum, XlsxError> {
    ColNum::try_from(col.saturating_sub(1)).map_err(|_| XlsxError::RowColumnLimitError)
}

fn fill_worksheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    for (col, width) in sheet.column_widths() {
        worksheet.set_column_width(column_index(col)?, width)?;
    }
    for cell in sheet.cells() {
        write_cell(worksheet, cell)?;
    }
    Ok(())
}

fn cell_format(style: CellStyle, value: &CellValue) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if style.header {
        format = format
            .set_background_color(Color::RGB(HEADER_FILL))
            .set_font_color(Color::White);
    }
    if style.currency {
        format = format.set_num_format(CURRENCY_FORMAT);
    }
    if matches!(value, CellValue::Date(_)) {
        format = format.set_num_format(DATE_FORMAT);
    }
    format
}

fn write_cell(worksheet: &mut Worksheet, cell: &GridCell) -> Result<(), XlsxError> {
    let row = cell.row.saturating_sub(1);
    let col = column_index(cell.col)?;
    let format = cell_format(cell.style, &cell.value);
    match &cell.value {
        CellValue::Empty => worksheet.write_blank(row, col, &format)?,
        CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, &format)?,
        CellValue::Integer(n) => worksheet.write_number_with_format(row, col, f64::from(*n), &format)?,
        CellValue::Amount(m) => {
            let value = m.as_decimal().to_f64().unwrap_or_default();
            worksheet.write_number_with_format(row, col, value, &format)?
        }
        CellValue::Date(d) => {
            let date = ExcelDateTime::from_ymd(d.year() as u16, d.month() as u8, d.day() as u8)?;
            worksheet.write_datetime_with_format(row, col, &date, &format)?
        }
    };
    Ok(())
}
