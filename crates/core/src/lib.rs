pub mod account;
pub mod money;
pub mod transaction;

pub use account::{AccountInfo, DEFAULT_BANK};
pub use money::Money;
pub use transaction::{
    CanonicalTransaction, RawTransaction, TransactionDate, TransactionType,
    UnknownTransactionType, OTHER_DEPOSIT, OTHER_WITHDRAWAL,
};
