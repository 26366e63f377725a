pub mod account_info;
pub mod csv;
pub mod frame;
pub mod normalize;
pub mod processor;
pub mod rules;
pub mod statement;
pub(crate) mod util;
pub mod workbook;

pub use account_info::extract_account_info;
pub use self::csv::{CsvError, CsvReadOptions};
pub use frame::{Cell, Frame};
pub use normalize::{normalize_columns, CanonicalColumn};
pub use processor::{StatementRow, TransactionProcessor};
pub use rules::{CategoryRule, CategoryRuleTable, Classifier, RulesError};
pub use statement::parse_statement;
pub use util::{dedupe_preserving_order, parse_date, resolve_date, DATE_FORMATS};
pub use workbook::WorkbookError;

pub mod import {
    use crate::*;

    pub fn import_csv(data: &[u8]) -> Result<Frame, CsvError> {
        crate::csv::read_frame_from_bytes(data)
    }

    pub fn import_workbook(data: Vec<u8>) -> Result<Frame, WorkbookError> {
        crate::workbook::read_transaction_frame(data)
    }
}
