use sorter_import::{Cell, Frame};

use crate::document::StatementDocument;
use crate::extract::ExtractError;

/// Last-resort collaborator that lifts a statement table straight out of a
/// document. `Ok(None)` means no table was found.
pub trait TableExtractor: Send + Sync {
    fn extract_table(&self, document: &dyn StatementDocument) -> Result<Option<Frame>, ExtractError>;
}

/// Reads fixed-width tables from the text layer.
///
/// The first line naming a date column plus an amount column is the header;
/// runs of two or more spaces separate columns. Each later line's fields are
/// placed under the header column they overlap most, so right-aligned amounts
/// with blank neighbours still land in the right column.
#[derive(Debug, Default, Clone, Copy)]
pub struct ColumnarTextExtractor;

const AMOUNT_HEADER_HINTS: &[&str] = &["debit", "credit", "balance", "withdrawal", "deposit"];

/// A field and its `[start, end)` char span within the line.
struct Field<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

fn split_fields(line: &str) -> Vec<Field<'_>> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut fields = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].1.is_whitespace() {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i;
        while end < chars.len() {
            let gap = chars[end].1.is_whitespace()
                && chars.get(end + 1).map_or(true, |(_, c)| c.is_whitespace());
            if gap {
                break;
            }
            end += 1;
        }
        let byte_start = chars[start].0;
        let byte_end = chars.get(end).map_or(line.len(), |(b, _)| *b);
        fields.push(Field {
            start,
            end,
            text: line[byte_start..byte_end].trim(),
        });
        i = end;
    }
    fields
}

fn is_header_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("date") && AMOUNT_HEADER_HINTS.iter().any(|h| lower.contains(h))
}

struct Layout {
    /// Column start offsets; column `i` spans `starts[i]..starts[i + 1]`.
    starts: Vec<usize>,
}

impl Layout {
    fn span(&self, column: usize) -> (usize, usize) {
        let end = self.starts.get(column + 1).copied().unwrap_or(usize::MAX);
        (self.starts[column], end)
    }

    fn column_for(&self, field: &Field<'_>) -> usize {
        (0..self.starts.len())
            .max_by_key(|&col| {
                let (lo, hi) = self.span(col);
                let overlap = field.end.min(hi).saturating_sub(field.start.max(lo));
                // Prefer the leftmost column on ties.
                (overlap, std::cmp::Reverse(col))
            })
            .unwrap_or(0)
    }

    fn place(&self, fields: &[Field<'_>]) -> Vec<Cell> {
        let mut values: Vec<String> = vec![String::new(); self.starts.len()];
        for field in fields {
            let slot = &mut values[self.column_for(field)];
            if !slot.is_empty() {
                slot.push(' ');
            }
            slot.push_str(field.text);
        }
        values.iter().map(|v| Cell::text(v)).collect()
    }
}

impl TableExtractor for ColumnarTextExtractor {
    fn extract_table(&self, document: &dyn StatementDocument) -> Result<Option<Frame>, ExtractError> {
        let mut table: Option<(Layout, Frame)> = None;

        for index in 0..document.page_count() {
            let text = document.page_text(index)?;
            for line in text.lines().map(str::trim_end) {
                if line.trim().is_empty() {
                    continue;
                }
                // Repeated page headers are skipped once a table is open.
                if is_header_line(line) {
                    if table.is_none() {
                        let fields = split_fields(line);
                        let layout = Layout {
                            starts: fields.iter().map(|f| f.start).collect(),
                        };
                        let frame = Frame::new(fields.iter().map(|f| f.text.to_string()).collect());
                        table = Some((layout, frame));
                    }
                    continue;
                }
                let Some((layout, frame)) = table.as_mut() else {
                    continue;
                };
                let fields = split_fields(line);
                if fields.len() >= 2 {
                    frame.push_row(layout.place(&fields));
                }
            }
        }

        Ok(table.map(|(_, frame)| frame).filter(|f| !f.is_empty()))
    }
}

/// Never finds a table.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTables;

impl TableExtractor for NoTables {
    fn extract_table(&self, _document: &dyn StatementDocument) -> Result<Option<Frame>, ExtractError> {
        Ok(None)
    }
}
