pub mod assembler;
pub mod grid;
pub mod sink;

pub use assembler::{
    group_by_category, CategoryGroup, ReportAssembler, ReportStructure, DEPOSITS_SHEET,
    SUMMARY_SHEET, WITHDRAWALS_SHEET,
};
pub use grid::{CellStyle, CellValue, GridCell, Sheet, CURRENCY_FORMAT, DATE_FORMAT, HEADER_FILL};
pub use sink::{CsvSink, JsonSink, ReportError, ReportSink, XlsxSink};
