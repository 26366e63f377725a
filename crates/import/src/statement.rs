//! Reconstructs transactions from the raw text of a bank statement.
//!
//! Statement text (text-layer or OCR) arrives as loosely aligned lines. A
//! transaction starts on a line that begins with `DD-MM-YYYY [DD-MM-YYYY]`;
//! its narration and amounts may spill onto the next one or two lines.

use sorter_core::{Money, RawTransaction};
use tracing::debug;

use crate::util::{
    dedupe_preserving_order, find_amounts, indicates_withdrawal, re, strip_amounts,
    text_before_amounts,
};

re!(re_date_line, r"^(\d{2}-\d{2}-\d{4})\s+(\d{2}-\d{2}-\d{4})?\s*(.*)");
re!(re_starts_with_date, r"^\d{2}-\d{2}-\d{4}");

/// Continuation lines considered after a date line.
pub const MAX_CONTINUATION_LINES: usize = 2;

/// Characters OCR tends to hallucinate from table rules.
const OCR_ARTIFACTS: &[char] = &['|'];

/// Page footers, repeated column headers and carry-forward rows.
pub fn is_noise_line(line: &str) -> bool {
    line.contains("Page no") || line.contains("Post Date") || line.to_uppercase().contains("BROUGHT FORWARD")
}

/// Single forward pass over `text`, returning transactions in statement order.
pub fn parse_statement(text: &str) -> Vec<RawTransaction> {
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let mut transactions = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.is_empty() || is_noise_line(line) {
            i += 1;
            continue;
        }

        let Some(caps) = re_date_line().captures(line) else {
            i += 1;
            continue;
        };

        let post_date = caps[1].to_string();
        let value_date = caps
            .get(2)
            .map_or_else(|| post_date.clone(), |m| m.as_str().to_string());
        let rest = caps.get(3).map_or("", |m| m.as_str()).trim();

        let mut amounts = find_amounts(rest);
        let mut fragments = Vec::new();
        let head = text_before_amounts(rest);
        if !head.is_empty() {
            fragments.push(head);
        }

        // Lookahead for continuation lines.
        let mut next = i + 1;
        while next < lines.len() && next <= i + MAX_CONTINUATION_LINES {
            let candidate = lines[next];
            if candidate.is_empty()
                || is_noise_line(candidate)
                || re_starts_with_date().is_match(candidate)
            {
                break;
            }
            amounts.extend(find_amounts(candidate));
            let residue = strip_amounts(candidate);
            if is_meaningful_fragment(&residue) {
                fragments.push(residue);
            }
            next += 1;
        }

        if let Some(tx) = build_transaction(post_date, value_date, &fragments, &amounts) {
            transactions.push(tx);
        }

        i = next;
    }

    debug!(count = transactions.len(), lines = lines.len(), "parsed statement text");
    transactions
}

/// Continuation text worth keeping: longer than two characters and not just
/// digits/punctuation left over from OCR noise.
fn is_meaningful_fragment(text: &str) -> bool {
    text.chars().count() > 2
        && !text
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_punctuation() || c.is_whitespace())
}

fn clean_description(fragments: &[String]) -> String {
    fragments
        .join(" ")
        .replace(OCR_ARTIFACTS, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn build_transaction(
    post_date: String,
    value_date: String,
    fragments: &[String],
    amounts: &[String],
) -> Option<RawTransaction> {
    let description = clean_description(fragments);
    if description.is_empty() {
        return None;
    }

    let unique = dedupe_preserving_order(amounts);
    let is_withdrawal = indicates_withdrawal(&description);

    // [amount, ..., balance]; a lone figure is a balance with no movement.
    let (debit, credit, balance) = match unique.as_slice() {
        [first, .., last] => {
            let amount = Money::parse(first).unwrap_or_else(Money::zero);
            if is_withdrawal {
                (amount, Money::zero(), last.clone())
            } else {
                (Money::zero(), amount, last.clone())
            }
        }
        [only] => (Money::zero(), Money::zero(), only.clone()),
        [] => (Money::zero(), Money::zero(), String::new()),
    };

    if !debit.is_positive() && !credit.is_positive() {
        return None;
    }

    Some(RawTransaction {
        post_date,
        value_date,
        description,
        amounts: unique,
        debit,
        credit,
        balance,
    })
}
