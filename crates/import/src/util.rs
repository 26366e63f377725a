use std::collections::HashSet;

use chrono::NaiveDate;
use sorter_core::{Money, TransactionDate};

use crate::frame::Cell;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        pub(crate) fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub(crate) use re;

re!(re_amount_token, r"[\d,]+\.\d{2}");
re!(re_amount_and_tail, r"[\d,]+\.\d{2}.*");
re!(re_trailing_dr, r"\bDR$");

/// Keywords whose presence in an upper-cased description marks a withdrawal.
const WITHDRAWAL_KEYWORDS: &[&str] = &[
    "WDL",
    "WITHDRAWAL",
    "TO INTEREST",
    "DIRECT DR",
    "DEBIT",
    "LEVY",
    "ATM",
];

/// Date formats tried, in order, for textual date cells.
pub const DATE_FORMATS: &[&str] = &["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d", "%d-%b-%Y"];

// ── Amount tokens ────────────────────────────────────────────────────────────

/// Every amount token (`1,234.56` shaped) in `text`, left to right.
pub fn find_amounts(text: &str) -> Vec<String> {
    re_amount_token()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// `text` with every amount token removed, trimmed.
pub fn strip_amounts(text: &str) -> String {
    re_amount_token().replace_all(text, "").trim().to_string()
}

/// Text preceding the first amount token, trimmed.
pub fn text_before_amounts(text: &str) -> String {
    re_amount_and_tail().replace(text, "").trim().to_string()
}

/// Order-preserving deduplication: the first occurrence of each token wins.
pub fn dedupe_preserving_order(tokens: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .iter()
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

/// Cell value as an amount: numbers as-is, text with grouping stripped,
/// anything unparseable or absent as zero.
pub fn clean_amount(cell: &Cell) -> Money {
    match cell {
        Cell::Number(n) => Money::from_decimal(*n),
        Cell::Text(s) => Money::parse(s).unwrap_or_else(Money::zero),
        Cell::Empty | Cell::Date(_) => Money::zero(),
    }
}

// ── Keywords ─────────────────────────────────────────────────────────────────

/// Case-insensitive withdrawal keyword test shared by the line parser and the
/// transaction processor.
pub fn indicates_withdrawal(description: &str) -> bool {
    let upper = description.trim().to_uppercase();
    WITHDRAWAL_KEYWORDS.iter().any(|kw| upper.contains(kw)) || re_trailing_dr().is_match(&upper)
}

// ── Dates ────────────────────────────────────────────────────────────────────

/// First format in [`DATE_FORMATS`] that parses `text`.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Never fails: unparseable text is carried through untouched.
pub fn resolve_date(text: &str) -> TransactionDate {
    match parse_date(text) {
        Some(date) => TransactionDate::Parsed(date),
        None => TransactionDate::Raw(text.to_string()),
    }
}
