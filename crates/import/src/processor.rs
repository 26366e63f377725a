use sorter_core::{CanonicalTransaction, Money, RawTransaction, TransactionDate, TransactionType};
use tracing::debug;

use crate::frame::{Cell, Frame};
use crate::normalize::{normalize_columns, CanonicalColumn};
use crate::rules::Classifier;
use crate::util::{clean_amount, indicates_withdrawal, resolve_date};

/// One input row in canonical shape. Absent and blank cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementRow {
    pub date: Option<Cell>,
    pub post_date: Option<Cell>,
    pub value_date: Option<Cell>,
    pub description: Option<String>,
    pub debit: Money,
    pub credit: Money,
    pub balance: String,
}

fn present(cell: &Cell) -> Option<Cell> {
    (!cell.is_empty()).then(|| cell.clone())
}

impl StatementRow {
    /// Row `index` of a frame whose headers are already canonical.
    pub fn from_frame(frame: &Frame, index: usize) -> Self {
        let cell = |col: CanonicalColumn| frame.get(index, col.as_str());
        StatementRow {
            date: present(cell(CanonicalColumn::Date)),
            post_date: present(cell(CanonicalColumn::PostDate)),
            value_date: present(cell(CanonicalColumn::ValueDate)),
            description: present(cell(CanonicalColumn::Description)).map(|c| c.to_string()),
            debit: clean_amount(cell(CanonicalColumn::Debit)).non_negative(),
            credit: clean_amount(cell(CanonicalColumn::Credit)).non_negative(),
            balance: cell(CanonicalColumn::Balance).to_string(),
        }
    }

    /// First present of `Date`, `Post_Date`, `Value_Date`.
    fn date_cell(&self) -> Option<&Cell> {
        self.date
            .as_ref()
            .or(self.post_date.as_ref())
            .or(self.value_date.as_ref())
    }
}

impl From<&RawTransaction> for StatementRow {
    fn from(tx: &RawTransaction) -> Self {
        StatementRow {
            date: None,
            post_date: present(&Cell::text(&tx.post_date)),
            value_date: present(&Cell::text(&tx.value_date)),
            description: Some(tx.description.clone()).filter(|d| !d.is_empty()),
            debit: tx.debit.non_negative(),
            credit: tx.credit.non_negative(),
            balance: tx.balance.clone(),
        }
    }
}

fn resolve_cell_date(cell: &Cell) -> TransactionDate {
    match cell {
        Cell::Date(d) => TransactionDate::Parsed(*d),
        Cell::Text(s) => resolve_date(s),
        other => TransactionDate::Raw(other.to_string()),
    }
}

/// Turns normalized rows into categorized [`CanonicalTransaction`]s.
#[derive(Debug, Clone, Default)]
pub struct TransactionProcessor {
    classifier: Classifier,
}

impl TransactionProcessor {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    /// Normalize headers, then process every row in order.
    pub fn process_frame(&self, frame: Frame) -> Vec<CanonicalTransaction> {
        let frame = normalize_columns(frame);
        let rows: Vec<StatementRow> = (0..frame.len())
            .map(|i| StatementRow::from_frame(&frame, i))
            .collect();
        self.process_rows(&rows)
    }

    /// Records produced by the statement line parser.
    pub fn process_raw(&self, transactions: &[RawTransaction]) -> Vec<CanonicalTransaction> {
        let rows: Vec<StatementRow> = transactions.iter().map(StatementRow::from).collect();
        self.process_rows(&rows)
    }

    pub fn process_rows(&self, rows: &[StatementRow]) -> Vec<CanonicalTransaction> {
        let processed: Vec<CanonicalTransaction> =
            rows.iter().filter_map(|row| self.process_row(row)).collect();
        debug!(rows = rows.len(), kept = processed.len(), "processed rows");
        processed
    }

    /// `None` for header/blank artifacts with neither description nor date.
    pub fn process_row(&self, row: &StatementRow) -> Option<CanonicalTransaction> {
        if row.description.is_none() && row.date.is_none() {
            return None;
        }

        let description = row.description.as_deref();
        let (kind, amount) = if row.credit.is_positive() {
            (TransactionType::Deposit, row.credit)
        } else if row.debit.is_positive() {
            (TransactionType::Withdrawal, row.debit)
        } else {
            let inferred = description.is_some_and(indicates_withdrawal);
            (TransactionType::from_withdrawal_flag(inferred), Money::zero())
        };

        let category = self.classifier.classify(description, kind.is_withdrawal());
        let (debit, credit) = match kind {
            TransactionType::Deposit => (Money::zero(), amount),
            TransactionType::Withdrawal => (amount, Money::zero()),
        };

        Some(CanonicalTransaction {
            date: row.date_cell().map(resolve_cell_date),
            description: description.unwrap_or_default().to_string(),
            category,
            kind,
            amount,
            debit,
            credit,
            balance: row.balance.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use sorter_core::{OTHER_DEPOSIT, OTHER_WITHDRAWAL};

    fn processor() -> TransactionProcessor {
        TransactionProcessor::default()
    }

    fn frame(headers: &[&str], rows: &[&[&str]]) -> Frame {
        Frame::with_rows(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| Cell::text(c)).collect())
                .collect(),
        )
    }

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    // ── type inference ────────────────────────────────────────────────────────

    #[test]
    fn credit_column_makes_deposit() {
        let out = processor().process_frame(frame(
            &["Txn Date", "Narration", "Debit", "Credit", "Balance"],
            &[&["01-04-2024", "NEFT CR FROM XYZ", "", "1,500.00", "11,500.00"]],
        ));
        assert_eq!(out.len(), 1);
        let t = &out[0];
        assert_eq!(t.kind, TransactionType::Deposit);
        assert_eq!(t.amount, money("1500.00"));
        assert_eq!(t.credit, money("1500.00"));
        assert_eq!(t.debit, Money::zero());
        assert_eq!(t.category, "NEFT/RTGS");
        assert_eq!(t.balance, "11,500.00");
    }

    #[test]
    fn debit_column_makes_withdrawal() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Debit", "Credit"],
            &[&["02-04-2024", "UPI/DR/998/SHOP", "250.00", "0"]],
        ));
        assert_eq!(out[0].kind, TransactionType::Withdrawal);
        assert_eq!(out[0].debit, money("250.00"));
        assert_eq!(out[0].credit, Money::zero());
        assert_eq!(out[0].category, "UPI Payment");
    }

    #[test]
    fn zero_amounts_infer_from_keywords() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Debit", "Credit"],
            &[&["03-04-2024", "ATM CASH WDL", "0", "0"]],
        ));
        let t = &out[0];
        assert_eq!(t.kind, TransactionType::Withdrawal);
        assert_eq!(t.category, "ATM Withdrawal");
        assert_eq!(t.amount, Money::zero());
        assert_eq!(t.debit, Money::zero());
        assert_eq!(t.credit, Money::zero());
    }

    #[test]
    fn zero_amounts_without_keyword_default_to_deposit() {
        let out = processor().process_frame(frame(
            &["Date", "Description"],
            &[&["03-04-2024", "SOMETHING ELSE"]],
        ));
        assert_eq!(out[0].kind, TransactionType::Deposit);
        assert_eq!(out[0].category, OTHER_DEPOSIT);
    }

    #[test]
    fn credit_wins_when_both_present() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Debit", "Credit"],
            &[&["04-04-2024", "MIXED", "10.00", "20.00"]],
        ));
        assert_eq!(out[0].kind, TransactionType::Deposit);
        assert_eq!(out[0].amount, money("20.00"));
        assert_eq!(out[0].debit, Money::zero());
    }

    #[test]
    fn negative_and_garbage_amounts_count_as_zero() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Debit", "Credit"],
            &[&["05-04-2024", "MISC CHARGES", "-40.00", "n/a"]],
        ));
        assert_eq!(out[0].amount, Money::zero());
        assert_eq!(out[0].category, OTHER_DEPOSIT);
    }

    #[test]
    fn fallback_category_matches_type() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Debit"],
            &[&["06-04-2024", "MISC CHARGES", "75.00"]],
        ));
        assert_eq!(out[0].category, OTHER_WITHDRAWAL);
    }

    // ── row filtering ─────────────────────────────────────────────────────────

    #[test]
    fn rows_without_description_and_date_skipped() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Credit"],
            &[&["", "", "99.00"], &["07-04-2024", "", "5.00"], &["", "ONLY DESC", "1.00"]],
        ));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "");
        assert_eq!(out[1].description, "ONLY DESC");
        assert_eq!(out[1].date, None);
    }

    #[test]
    fn input_order_preserved() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Credit"],
            &[&["01-04-2024", "B", "1.00"], &["02-04-2024", "A", "2.00"], &["03-04-2024", "C", "3.00"]],
        ));
        let descs: Vec<_> = out.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descs, vec!["B", "A", "C"]);
    }

    // ── dates ─────────────────────────────────────────────────────────────────

    #[test]
    fn date_fallback_order() {
        let out = processor().process_frame(frame(
            &["Post Date", "Value Date", "Description", "Credit"],
            &[&["", "09/04/2024", "NEFT IN", "1.00"], &["10-04-2024", "11-04-2024", "NEFT IN", "1.00"]],
        ));
        let d = |day| TransactionDate::Parsed(NaiveDate::from_ymd_opt(2024, 4, day).unwrap());
        assert_eq!(out[0].date, Some(d(9)));
        assert_eq!(out[1].date, Some(d(10)));
    }

    #[test]
    fn unparseable_date_kept_verbatim() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Credit"],
            &[&["Apr 1st", "NEFT IN", "1.00"]],
        ));
        assert_eq!(out[0].date, Some(TransactionDate::Raw("Apr 1st".into())));
    }

    #[test]
    fn typed_cells_resolve() {
        let date = NaiveDate::from_ymd_opt(2024, 4, 12).unwrap();
        let mut f = Frame::new(vec!["Date".into(), "Description".into(), "Credit".into()]);
        f.push_row(vec![Cell::Date(date), Cell::text("CASH DEP"), Cell::Number(Decimal::new(5000, 2))]);
        f.push_row(vec![Cell::Number(Decimal::from(45383)), Cell::text("CASH DEP"), Cell::Empty]);
        let out = processor().process_frame(f);
        assert_eq!(out[0].date, Some(TransactionDate::Parsed(date)));
        assert_eq!(out[0].amount, money("50.00"));
        assert_eq!(out[1].date, Some(TransactionDate::Raw("45383".into())));
    }

    // ── invariants ────────────────────────────────────────────────────────────

    #[test]
    fn never_both_debit_and_credit() {
        let out = processor().process_frame(frame(
            &["Date", "Description", "Debit", "Credit"],
            &[
                &["01-04-2024", "A", "10.00", "20.00"],
                &["02-04-2024", "B", "10.00", ""],
                &["03-04-2024", "C", "", ""],
            ],
        ));
        for t in &out {
            assert!(!(t.debit.is_positive() && t.credit.is_positive()));
            assert!(!t.category.is_empty());
        }
    }

    // ── parser records ────────────────────────────────────────────────────────

    #[test]
    fn raw_transactions_flow_through() {
        let raw = crate::statement::parse_statement(
            "01-04-2024  01-04-2024  NEFT/RTGS CR FROM XYZ 500.00 10,500.00\n\
             02-04-2024 02-04-2024 ATM CASH WDL 200.00 10,300.00",
        );
        let out = processor().process_raw(&raw);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].category, "NEFT/RTGS");
        assert_eq!(out[0].credit, money("500.00"));
        assert_eq!(out[0].balance, "10,500.00");
        assert_eq!(
            out[0].date,
            Some(TransactionDate::Parsed(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()))
        );
        assert_eq!(out[1].kind, TransactionType::Withdrawal);
        assert_eq!(out[1].category, "ATM Withdrawal");
    }
}
