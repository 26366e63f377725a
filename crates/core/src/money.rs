use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// A non-currency-tagged amount with two decimal places of precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    pub fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    pub fn from_decimal(decimal: Decimal) -> Self {
        Money(decimal.round_dp(2))
    }

    /// Parse a statement amount token such as `10,500.00`.
    /// Grouping commas and blanks are ignored; anything else that is not a
    /// decimal number yields `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let clean = token.replace([',', ' '], "");
        if clean.is_empty() {
            return None;
        }
        Decimal::from_str(&clean)
            .or_else(|_| Decimal::from_scientific(&clean))
            .ok()
            .map(Money::from_decimal)
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Negative values collapse to zero.
    pub fn non_negative(self) -> Self {
        if self.0.is_sign_negative() {
            Money::zero()
        } else {
            self
        }
    }

    /// Spreadsheet `#,##0.00` rendering, e.g. `1234567.5` -> `1,234,567.50`.
    pub fn grouped(self) -> String {
        let plain = format!("{:.2}", self.0.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.0.is_sign_negative() && !self.0.is_zero() { "-" } else { "" };
        format!("{sign}{grouped}.{frac_part}")
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |a, b| a + b)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_grouped_token() {
        assert_eq!(Money::parse("10,500.00").unwrap().to_string(), "10500.00");
        assert_eq!(Money::parse("500.00").unwrap().to_string(), "500.00");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Money::parse("").is_none());
        assert!(Money::parse("abc").is_none());
        assert!(Money::parse(" , ").is_none());
    }

    #[test]
    fn parse_rounds_to_cents() {
        assert_eq!(Money::parse("1.005").unwrap().to_string(), "1.00");
        assert_eq!(Money::parse("7").unwrap().to_string(), "7.00");
    }

    #[test]
    fn grouped_formatting() {
        assert_eq!(Money::parse("0").unwrap().grouped(), "0.00");
        assert_eq!(Money::parse("999.5").unwrap().grouped(), "999.50");
        assert_eq!(Money::parse("1000").unwrap().grouped(), "1,000.00");
        assert_eq!(Money::parse("1234567.891").unwrap().grouped(), "1,234,567.89");
        assert_eq!(Money::parse("-2500").unwrap().grouped(), "-2,500.00");
    }

    #[test]
    fn currency_symbol_is_not_a_number() {
        assert!(Money::parse("₹1,234.00").is_none());
        assert_eq!(Money::parse(" 1 234.00 ").unwrap().to_string(), "1234.00");
    }

    #[test]
    fn sum_and_sign_helpers() {
        let total: Money = ["1.10", "2.20", "3.30"]
            .iter()
            .filter_map(|s| Money::parse(s))
            .sum();
        assert_eq!(total.to_string(), "6.60");
        assert!(total.is_positive());
        assert_eq!(Money::parse("-4").unwrap().non_negative(), Money::zero());
    }
}
