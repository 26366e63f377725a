use serde::{Deserialize, Serialize};
use std::io::Read;
use thiserror::Error;

use crate::frame::{Cell, Frame};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvReadOptions {
    pub has_header: bool,
    pub delimiter: String,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: ",".to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum CsvError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("CSV input has no header row")]
    MissingHeader,
}

/// Decode CSV into a [`Frame`]. Blank cells become [`Cell::Empty`], every
/// other value is kept as trimmed text; rows may be ragged.
pub fn read_frame<R: Read>(data: R, options: &CsvReadOptions) -> Result<Frame, CsvError> {
    let delimiter = options
        .delimiter
        .as_bytes()
        .first()
        .copied()
        .unwrap_or(b',');
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data);

    let mut records = reader.records();

    let mut frame = if options.has_header {
        let header = records.next().ok_or(CsvError::MissingHeader)??;
        Frame::new(header.iter().map(|h| h.trim().to_string()).collect())
    } else {
        Frame::default()
    };

    for result in records {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        frame.push_row(record.iter().map(Cell::text).collect());
    }

    // Headerless input gets positional column names.
    if !options.has_header {
        let width = frame.rows.iter().map(Vec::len).max().unwrap_or(0);
        frame.headers = (0..width).map(|i| i.to_string()).collect();
    }

    Ok(frame)
}

pub fn read_frame_from_bytes(data: &[u8]) -> Result<Frame, CsvError> {
    read_frame(data, &CsvReadOptions::default())
}
