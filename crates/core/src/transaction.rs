use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::money::Money;

pub const OTHER_DEPOSIT: &str = "Other Deposit";
pub const OTHER_WITHDRAWAL: &str = "Other Withdrawal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
}

impl TransactionType {
    pub fn from_withdrawal_flag(is_withdrawal: bool) -> Self {
        if is_withdrawal {
            TransactionType::Withdrawal
        } else {
            TransactionType::Deposit
        }
    }

    pub fn is_withdrawal(self) -> bool {
        self == TransactionType::Withdrawal
    }

    /// Category used when no rule matches a description.
    pub fn fallback_category(self) -> &'static str {
        match self {
            TransactionType::Deposit => OTHER_DEPOSIT,
            TransactionType::Withdrawal => OTHER_WITHDRAWAL,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionType::Deposit => write!(f, "Deposit"),
            TransactionType::Withdrawal => write!(f, "Withdrawal"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown transaction type: '{0}'")]
pub struct UnknownTransactionType(pub String);

impl std::str::FromStr for TransactionType {
    type Err = UnknownTransactionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            other => Err(UnknownTransactionType(other.to_string())),
        }
    }
}

/// One transaction reconstructed from statement text.
///
/// Only built when the description is non-empty and either `debit` or
/// `credit` is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// `DD-MM-YYYY`, verbatim from the statement.
    pub post_date: String,
    /// Falls back to `post_date` when the statement line has no value date.
    pub value_date: String,
    pub description: String,
    /// Unique amount tokens in first-seen order.
    pub amounts: Vec<String>,
    pub debit: Money,
    pub credit: Money,
    /// Last amount token on the record, kept verbatim.
    pub balance: String,
}

/// Best-effort date: parsed when one of the known formats matched,
/// otherwise the source text untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionDate {
    Parsed(NaiveDate),
    Raw(String),
}

impl fmt::Display for TransactionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionDate::Parsed(d) => write!(f, "{}", d.format("%d-%m-%Y")),
            TransactionDate::Raw(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    /// `None` only when the source row carried no date in any date column.
    pub date: Option<TransactionDate>,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Money,
    pub debit: Money,
    pub credit: Money,
    pub balance: String,
}

impl CanonicalTransaction {
    pub fn is_deposit(&self) -> bool {
        self.kind == TransactionType::Deposit
    }

    pub fn is_withdrawal(&self) -> bool {
        self.kind == TransactionType::Withdrawal
    }
}
