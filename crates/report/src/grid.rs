//! Library-neutral spreadsheet model: positioned, styled cells per sheet.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use sorter_core::{Money, TransactionDate};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Empty,
    Text(String),
    Integer(u32),
    Amount(Money),
    Date(NaiveDate),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    /// Parsed dates stay dates; raw text is carried as text.
    pub fn from_date(date: Option<&TransactionDate>) -> Self {
        match date {
            Some(TransactionDate::Parsed(d)) => CellValue::Date(*d),
            Some(TransactionDate::Raw(s)) => CellValue::Text(s.clone()),
            None => CellValue::Empty,
        }
    }

    pub fn as_amount(&self) -> Option<Money> {
        match self {
            CellValue::Amount(m) => Some(*m),
            _ => None,
        }
    }
}

/// Header cells: bold white text on this RGB fill.
pub const HEADER_FILL: u32 = 0x4472C4;
pub const CURRENCY_FORMAT: &str = "#,##0.00";
pub const DATE_FORMAT: &str = "dd-mm-yyyy";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CellStyle {
    pub bold: bool,
    /// Filled header cell (white bold text on [`HEADER_FILL`]).
    pub header: bool,
    /// Rendered with [`CURRENCY_FORMAT`].
    pub currency: bool,
}

impl CellStyle {
    pub const PLAIN: CellStyle = CellStyle { bold: false, header: false, currency: false };
    pub const BOLD: CellStyle = CellStyle { bold: true, header: false, currency: false };
    pub const HEADER: CellStyle = CellStyle { bold: true, header: true, currency: false };
    pub const CURRENCY: CellStyle = CellStyle { bold: false, header: false, currency: true };
    pub const BOLD_CURRENCY: CellStyle = CellStyle { bold: true, header: false, currency: true };
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridCell {
    /// A1-style address, e.g. `D4`.
    pub address: String,
    pub row: u32,
    pub col: u32,
    pub value: CellValue,
    pub style: CellStyle,
}

impl GridCell {
    /// Display text as a spreadsheet would show it.
    pub fn display(&self) -> String {
        match &self.value {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(n) => n.to_string(),
            CellValue::Amount(m) if self.style.currency => m.grouped(),
            CellValue::Amount(m) => m.to_string(),
            CellValue::Date(d) => d.format("%d-%m-%Y").to_string(),
        }
    }
}

/// Spreadsheet column letters for a 1-based index: 1 → `A`, 27 → `AA`.
pub fn column_name(col: u32) -> String {
    let mut n = col;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// `D4` → `(4, 4)`; rows and columns are 1-based.
pub fn parse_address(address: &str) -> Option<(u32, u32)> {
    let split = address.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = address.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    let col = letters
        .bytes()
        .fold(0u32, |acc, b| acc * 26 + u32::from(b - b'A' + 1));
    let row = digits.parse().ok().filter(|r| *r > 0)?;
    Some((row, col))
}

fn cells_in_order<S: Serializer>(
    cells: &BTreeMap<(u32, u32), GridCell>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(cells.values())
}

fn widths_by_letter<S: Serializer>(
    widths: &BTreeMap<u32, f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(widths.iter().map(|(col, w)| (column_name(*col), w)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    #[serde(serialize_with = "cells_in_order")]
    cells: BTreeMap<(u32, u32), GridCell>,
    #[serde(serialize_with = "widths_by_letter")]
    column_widths: BTreeMap<u32, f64>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            column_widths: BTreeMap::new(),
        }
    }

    /// Write a cell, replacing whatever was there.
    pub fn set(&mut self, row: u32, col: u32, value: CellValue, style: CellStyle) {
        let address = format!("{}{row}", column_name(col));
        self.cells.insert(
            (row, col),
            GridCell { address, row, col, value, style },
        );
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&GridCell> {
        self.cells.get(&(row, col))
    }

    pub fn at(&self, address: &str) -> Option<&GridCell> {
        let (row, col) = parse_address(address)?;
        self.cell(row, col)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.cells.values()
    }

    pub fn set_width(&mut self, col: u32, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn width(&self, col: u32) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    /// `(col, width)` for every column given an explicit width.
    pub fn column_widths(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.column_widths.iter().map(|(col, w)| (*col, *w))
    }

    /// `(rows, cols)` of the smallest grid anchored at A1 holding every cell.
    pub fn extent(&self) -> (u32, u32) {
        self.cells
            .keys()
            .fold((0, 0), |(r, c), (row, col)| (r.max(*row), c.max(*col)))
    }

    /// Every position from A1 to [`Sheet::extent`], rendered for display.
    pub fn dense_rows(&self) -> Vec<Vec<String>> {
        let (rows, cols) = self.extent();
        (1..=rows)
            .map(|row| {
                (1..=cols)
                    .map(|col| self.cell(row, col).map(GridCell::display).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
