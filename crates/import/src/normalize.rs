use serde::{Deserialize, Serialize};
use std::fmt;

use crate::frame::Frame;

/// The canonical statement columns every input is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalColumn {
    PostDate,
    ValueDate,
    Date,
    Description,
    Debit,
    Credit,
    Balance,
    Reference,
}

impl CanonicalColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalColumn::PostDate => "Post_Date",
            CanonicalColumn::ValueDate => "Value_Date",
            CanonicalColumn::Date => "Date",
            CanonicalColumn::Description => "Description",
            CanonicalColumn::Debit => "Debit",
            CanonicalColumn::Credit => "Credit",
            CanonicalColumn::Balance => "Balance",
            CanonicalColumn::Reference => "Reference",
        }
    }

    /// Canonical column for a source header, if any rule matches.
    /// Rules are checked in a fixed order; the first hit wins.
    pub fn for_header(header: &str) -> Option<Self> {
        let h = header.trim().to_lowercase();
        let h = h.as_str();

        if h.contains("post") && h.contains("date") {
            Some(CanonicalColumn::PostDate)
        } else if h.contains("value") && h.contains("date") {
            Some(CanonicalColumn::ValueDate)
        } else if matches!(h, "date" | "txn date" | "transaction date") {
            Some(CanonicalColumn::Date)
        } else if matches!(h, "description" | "narration" | "particulars" | "remarks") {
            Some(CanonicalColumn::Description)
        } else if matches!(h, "debit" | "debit amount" | "withdrawal" | "dr") {
            Some(CanonicalColumn::Debit)
        } else if matches!(h, "credit" | "credit amount" | "deposit" | "cr") {
            Some(CanonicalColumn::Credit)
        } else if matches!(h, "balance" | "closing balance" | "running balance") {
            Some(CanonicalColumn::Balance)
        } else if h.contains("cheque") || h.contains("ref") {
            Some(CanonicalColumn::Reference)
        } else {
            None
        }
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rename headers onto the canonical set. Cell values are untouched and
/// unmatched headers pass through as-is.
///
/// Two source headers may map to the same canonical name; both columns are
/// kept and name lookups on the result resolve to the later one.
pub fn normalize_columns(frame: Frame) -> Frame {
    let Frame { headers, rows } = frame;
    let headers = headers
        .into_iter()
        .map(|h| match CanonicalColumn::for_header(&h) {
            Some(col) => col.as_str().to_string(),
            None => h,
        })
        .collect();
    Frame { headers, rows }
}
