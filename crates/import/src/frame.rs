use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single decoded spreadsheet/CSV value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(Decimal),
    Date(NaiveDate),
}

impl Cell {
    /// Whitespace-only text is treated as an absent value.
    pub fn text(s: &str) -> Cell {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(trimmed.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Date(d) => write!(f, "{}", d.format("%d-%m-%Y")),
        }
    }
}

static EMPTY: Cell = Cell::Empty;

/// Ordered rows of named columns, as handed over by a spreadsheet/CSV decoder
/// or a table-extraction collaborator.
///
/// Header names need not be unique. Lookup by name resolves to the right-most
/// column carrying that name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(headers: Vec<String>) -> Self {
        Frame { headers, rows: Vec::new() }
    }

    pub fn with_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Frame { headers, rows }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().rposition(|h| h == name)
    }

    /// Cell at `row` under column `name`; missing columns and short rows read as empty.
    pub fn get(&self, row: usize, name: &str) -> &Cell {
        self.column_index(name)
            .and_then(|col| self.rows.get(row)?.get(col))
            .unwrap_or(&EMPTY)
    }
}
