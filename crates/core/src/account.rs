use serde::{Deserialize, Serialize};

pub const DEFAULT_BANK: &str = "SBI";

/// The three header fields printed at the top of every report sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub name: String,
    pub bank: String,
    pub account_no: String,
}

impl AccountInfo {
    pub fn new(name: &str, bank: &str, account_no: &str) -> Self {
        AccountInfo {
            name: name.to_string(),
            bank: bank.to_string(),
            account_no: account_no.to_string(),
        }
    }

    /// Label/value pairs in sheet order (rows 1-3).
    pub fn header_rows(&self) -> [(&'static str, &str); 3] {
        [
            ("Name", self.name.as_str()),
            ("Bank", self.bank.as_str()),
            ("Account NO", self.account_no.as_str()),
        ]
    }

    /// Fill any blank field from `other`.
    pub fn or(self, other: AccountInfo) -> AccountInfo {
        let pick = |a: String, b: String| if a.trim().is_empty() { b } else { a };
        AccountInfo {
            name: pick(self.name, other.name),
            bank: pick(self.bank, other.bank),
            account_no: pick(self.account_no, other.account_no),
        }
    }
}

impl Default for AccountInfo {
    fn default() -> Self {
        AccountInfo::new("", DEFAULT_BANK, "")
    }
}
