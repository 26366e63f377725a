use serde::Serialize;
use sorter_core::{AccountInfo, CanonicalTransaction, Money, TransactionType};
use tracing::debug;

use crate::grid::{CellStyle, CellValue, Sheet};

pub const DEPOSITS_SHEET: &str = "Deposits";
pub const WITHDRAWALS_SHEET: &str = "withdrawals";
pub const SUMMARY_SHEET: &str = "summary";

/// Category blocks start in this column (B) and advance by [`BLOCK_STRIDE`].
const FIRST_BLOCK_COL: u32 = 2;
/// Date, Amount, spacer.
const BLOCK_STRIDE: u32 = 3;
const CATEGORY_ROW: u32 = 4;
const BLOCK_HEADER_ROW: u32 = 5;
const FIRST_DATA_ROW: u32 = 6;
const CATEGORY_COL_WIDTH: f64 = 15.0;

// Summary table columns (D..G).
const SL_COL: u32 = 4;
const PARTICULARS_COL: u32 = 5;
const DEPOSITS_COL: u32 = 6;
const WITHDRAWALS_COL: u32 = 7;
const SUMMARY_HEADER_ROW: u32 = 4;
const SUMMARY_WIDTHS: [(u32, f64); 4] = [
    (SL_COL, 8.0),
    (PARTICULARS_COL, 35.0),
    (DEPOSITS_COL, 15.0),
    (WITHDRAWALS_COL, 15.0),
];

/// Transactions of one category, in input order.
#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub transactions: Vec<&'a CanonicalTransaction>,
}

impl CategoryGroup<'_> {
    pub fn total(&self) -> Money {
        self.transactions.iter().map(|t| t.amount).sum()
    }
}

/// Groups of `kind`, ordered by each category's first appearance.
pub fn group_by_category(
    transactions: &[CanonicalTransaction],
    kind: TransactionType,
) -> Vec<CategoryGroup<'_>> {
    let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
    for t in transactions.iter().filter(|t| t.kind == kind) {
        match groups.iter_mut().find(|g| g.category == t.category) {
            Some(group) => group.transactions.push(t),
            None => groups.push(CategoryGroup {
                category: &t.category,
                transactions: vec![t],
            }),
        }
    }
    groups
}

/// The three sheets of a statement summary report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportStructure {
    pub sheets: Vec<Sheet>,
}

impl ReportStructure {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Lays canonical transactions out as category-grouped sheets plus a summary.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    account: AccountInfo,
}

impl ReportAssembler {
    pub fn new(account: AccountInfo) -> Self {
        Self { account }
    }

    pub fn assemble(&self, transactions: &[CanonicalTransaction]) -> ReportStructure {
        let deposits = group_by_category(transactions, TransactionType::Deposit);
        let withdrawals = group_by_category(transactions, TransactionType::Withdrawal);
        debug!(
            deposit_categories = deposits.len(),
            withdrawal_categories = withdrawals.len(),
            "assembling report"
        );

        ReportStructure {
            sheets: vec![
                self.category_sheet(DEPOSITS_SHEET, &deposits),
                self.category_sheet(WITHDRAWALS_SHEET, &withdrawals),
                self.summary_sheet(&deposits, &withdrawals),
            ],
        }
    }

    /// Rows 1-3, columns A/B.
    fn write_account_header(&self, sheet: &mut Sheet) {
        for (row, (label, value)) in (1..).zip(self.account.header_rows()) {
            sheet.set(row, 1, CellValue::text(label), CellStyle::PLAIN);
            sheet.set(row, 2, CellValue::text(value), CellStyle::PLAIN);
        }
    }

    fn category_sheet(&self, name: &str, groups: &[CategoryGroup<'_>]) -> Sheet {
        let mut sheet = Sheet::new(name);
        self.write_account_header(&mut sheet);

        let mut col = FIRST_BLOCK_COL;
        for group in groups {
            sheet.set(CATEGORY_ROW, col, CellValue::text(group.category), CellStyle::BOLD);
            sheet.set(BLOCK_HEADER_ROW, col, CellValue::text("Date"), CellStyle::HEADER);
            sheet.set(BLOCK_HEADER_ROW, col + 1, CellValue::text("Amount"), CellStyle::HEADER);

            let mut row = FIRST_DATA_ROW;
            for t in &group.transactions {
                sheet.set(row, col, CellValue::from_date(t.date.as_ref()), CellStyle::PLAIN);
                sheet.set(row, col + 1, CellValue::Amount(t.amount), CellStyle::CURRENCY);
                row += 1;
            }

            sheet.set(row, col, CellValue::text("Total"), CellStyle::BOLD);
            sheet.set(row, col + 1, CellValue::Amount(group.total()), CellStyle::BOLD_CURRENCY);
            col += BLOCK_STRIDE;
        }

        for c in 1..=col {
            sheet.set_width(c, CATEGORY_COL_WIDTH);
        }
        sheet
    }

    fn summary_sheet(&self, deposits: &[CategoryGroup<'_>], withdrawals: &[CategoryGroup<'_>]) -> Sheet {
        let mut sheet = Sheet::new(SUMMARY_SHEET);
        self.write_account_header(&mut sheet);

        for (col, label) in [
            (SL_COL, "SL No"),
            (PARTICULARS_COL, "Particulars"),
            (DEPOSITS_COL, "Deposits"),
            (WITHDRAWALS_COL, "Withdrawals"),
        ] {
            sheet.set(SUMMARY_HEADER_ROW, col, CellValue::text(label), CellStyle::HEADER);
        }

        let mut row = SUMMARY_HEADER_ROW + 1;
        let mut sl_no = 1;

        sheet.set(row, SL_COL, CellValue::Integer(sl_no), CellStyle::PLAIN);
        sheet.set(row, PARTICULARS_COL, CellValue::text("Opening Balance"), CellStyle::PLAIN);
        sheet.set(row, DEPOSITS_COL, CellValue::Empty, CellStyle::PLAIN);
        sheet.set(row, WITHDRAWALS_COL, CellValue::Empty, CellStyle::PLAIN);
        row += 1;
        sl_no += 1;

        let sections = [(deposits, DEPOSITS_COL), (withdrawals, WITHDRAWALS_COL)];
        for (groups, amount_col) in sections {
            for group in groups {
                sheet.set(row, SL_COL, CellValue::Integer(sl_no), CellStyle::PLAIN);
                sheet.set(row, PARTICULARS_COL, CellValue::text(group.category), CellStyle::PLAIN);
                sheet.set(row, amount_col, CellValue::Amount(group.total()), CellStyle::CURRENCY);
                row += 1;
                sl_no += 1;
            }
        }

        // One blank row before the grand total.
        row += 1;
        let deposit_total: Money = deposits.iter().map(CategoryGroup::total).sum();
        let withdrawal_total: Money = withdrawals.iter().map(CategoryGroup::total).sum();
        sheet.set(row, PARTICULARS_COL, CellValue::text("Total"), CellStyle::BOLD);
        sheet.set(row, DEPOSITS_COL, CellValue::Amount(deposit_total), CellStyle::BOLD_CURRENCY);
        sheet.set(row, WITHDRAWALS_COL, CellValue::Amount(withdrawal_total), CellStyle::BOLD_CURRENCY);

        for (col, width) in SUMMARY_WIDTHS {
            sheet.set_width(col, width);
        }
        sheet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sorter_core::TransactionDate;

    fn tx(day: u32, category: &str, kind: TransactionType, amount: &str) -> CanonicalTransaction {
        let amount = Money::parse(amount).unwrap();
        let (debit, credit) = match kind {
            TransactionType::Deposit => (Money::zero(), amount),
            TransactionType::Withdrawal => (amount, Money::zero()),
        };
        CanonicalTransaction {
            date: Some(TransactionDate::Parsed(NaiveDate::from_ymd_opt(2024, 4, day).unwrap())),
            description: format!("{category} {day}"),
            category: category.to_string(),
            kind,
            amount,
            debit,
            credit,
            balance: String::new(),
        }
    }

    fn sample() -> Vec<CanonicalTransaction> {
        use TransactionType::*;
        vec![
            tx(1, "Salary", Deposit, "50000.00"),
            tx(2, "ATM Withdrawal", Withdrawal, "2000.00"),
            tx(3, "NEFT/RTGS", Deposit, "500.00"),
            tx(4, "Salary", Deposit, "1000.00"),
            tx(5, "UPI Payment", Withdrawal, "150.25"),
            tx(6, "ATM Withdrawal", Withdrawal, "500.00"),
        ]
    }

    fn report() -> ReportStructure {
        ReportAssembler::new(AccountInfo::new("ASHA RAO", "SBI", "1122334455")).assemble(&sample())
    }

    fn text(sheet: &Sheet, address: &str) -> String {
        sheet.at(address).map(|c| c.display()).unwrap_or_default()
    }

    fn amount(sheet: &Sheet, address: &str) -> Money {
        sheet.at(address).and_then(|c| c.value.as_amount()).unwrap()
    }

    // ── grouping ──────────────────────────────────────────────────────────────

    #[test]
    fn groups_follow_first_appearance() {
        let txs = sample();
        let groups = group_by_category(&txs, TransactionType::Deposit);
        let names: Vec<_> = groups.iter().map(|g| g.category).collect();
        assert_eq!(names, vec!["Salary", "NEFT/RTGS"]);
        assert_eq!(groups[0].transactions.len(), 2);
        assert_eq!(groups[0].total(), Money::parse("51000").unwrap());
    }

    #[test]
    fn sheet_names_and_order() {
        let names: Vec<_> = report().sheets.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["Deposits", "withdrawals", "summary"]);
    }

    // ── category sheets ───────────────────────────────────────────────────────

    #[test]
    fn account_header_on_every_sheet() {
        let report = report();
        for sheet in &report.sheets {
            assert_eq!(text(sheet, "A1"), "Name");
            assert_eq!(text(sheet, "B1"), "ASHA RAO");
            assert_eq!(text(sheet, "A2"), "Bank");
            assert_eq!(text(sheet, "B2"), "SBI");
            assert_eq!(text(sheet, "A3"), "Account NO");
            assert_eq!(text(sheet, "B3"), "1122334455");
        }
    }

    #[test]
    fn deposit_blocks_are_positioned() {
        let report = report();
        let sheet = report.sheet(DEPOSITS_SHEET).unwrap();

        // Salary block at B/C.
        assert_eq!(text(sheet, "B4"), "Salary");
        assert!(sheet.at("B4").unwrap().style.bold);
        assert_eq!(text(sheet, "B5"), "Date");
        assert_eq!(text(sheet, "C5"), "Amount");
        assert!(sheet.at("C5").unwrap().style.header);
        assert_eq!(text(sheet, "B6"), "01-04-2024");
        assert_eq!(text(sheet, "C6"), "50,000.00");
        assert_eq!(text(sheet, "B7"), "04-04-2024");
        assert_eq!(text(sheet, "B8"), "Total");
        assert_eq!(amount(sheet, "C8"), Money::parse("51000").unwrap());
        assert!(sheet.at("C8").unwrap().style.bold);

        // NEFT block three columns right, at E/F.
        assert_eq!(text(sheet, "E4"), "NEFT/RTGS");
        assert_eq!(text(sheet, "F6"), "500.00");
        assert_eq!(text(sheet, "E7"), "Total");
        assert!(sheet.at("D4").is_none());
    }

    #[test]
    fn category_column_widths() {
        let report = report();
        let sheet = report.sheet(WITHDRAWALS_SHEET).unwrap();
        // Two blocks: columns 1..=8 sized.
        for col in 1..=8 {
            assert_eq!(sheet.width(col), Some(15.0));
        }
        assert_eq!(sheet.width(9), None);
    }

    #[test]
    fn empty_partition_has_header_only() {
        let deposits_only: Vec<_> = sample().into_iter().filter(|t| t.is_deposit()).collect();
        let report = ReportAssembler::new(AccountInfo::default()).assemble(&deposits_only);
        let sheet = report.sheet(WITHDRAWALS_SHEET).unwrap();
        assert_eq!(sheet.extent(), (3, 2));
    }

    // ── summary ───────────────────────────────────────────────────────────────

    #[test]
    fn summary_layout() {
        let report = report();
        let sheet = report.sheet(SUMMARY_SHEET).unwrap();

        assert_eq!(text(sheet, "D4"), "SL No");
        assert_eq!(text(sheet, "E4"), "Particulars");
        assert_eq!(text(sheet, "F4"), "Deposits");
        assert_eq!(text(sheet, "G4"), "Withdrawals");
        assert!(sheet.at("G4").unwrap().style.header);

        assert_eq!(text(sheet, "D5"), "1");
        assert_eq!(text(sheet, "E5"), "Opening Balance");

        assert_eq!(text(sheet, "E6"), "Salary");
        assert_eq!(text(sheet, "F6"), "51,000.00");
        assert_eq!(text(sheet, "E7"), "NEFT/RTGS");
        assert_eq!(text(sheet, "E8"), "ATM Withdrawal");
        assert_eq!(text(sheet, "G8"), "2,500.00");
        assert!(sheet.at("F8").is_none());
        assert_eq!(text(sheet, "D9"), "5");
        assert_eq!(text(sheet, "E9"), "UPI Payment");

        // Row 10 left blank, totals on 11.
        assert!(sheet.at("E10").is_none());
        assert_eq!(text(sheet, "E11"), "Total");
        assert_eq!(amount(sheet, "F11"), Money::parse("51500").unwrap());
        assert_eq!(amount(sheet, "G11"), Money::parse("2650.25").unwrap());

        assert_eq!(sheet.width(4), Some(8.0));
        assert_eq!(sheet.width(5), Some(35.0));
    }

    #[test]
    fn totals_agree_across_sheets() {
        let txs = sample();
        let report = ReportAssembler::new(AccountInfo::default()).assemble(&txs);
        let summary = report.sheet(SUMMARY_SHEET).unwrap();

        let all_deposits: Money = txs.iter().filter(|t| t.is_deposit()).map(|t| t.amount).sum();
        let all_withdrawals: Money = txs.iter().filter(|t| t.is_withdrawal()).map(|t| t.amount).sum();

        let block_totals = |name: &str| -> Money {
            report
                .sheet(name)
                .unwrap()
                .cells()
                .filter(|c| c.style.bold)
                .filter_map(|c| c.value.as_amount())
                .sum()
        };

        assert_eq!(block_totals(DEPOSITS_SHEET), all_deposits);
        assert_eq!(block_totals(WITHDRAWALS_SHEET), all_withdrawals);
        assert_eq!(amount(summary, "F11"), all_deposits);
        assert_eq!(amount(summary, "G11"), all_withdrawals);
    }

    #[test]
    fn empty_input_still_has_totals() {
        let report = ReportAssembler::new(AccountInfo::default()).assemble(&[]);
        let summary = report.sheet(SUMMARY_SHEET).unwrap();
        assert_eq!(text(summary, "E5"), "Opening Balance");
        assert_eq!(amount(summary, "F7"), Money::zero());
    }
}
