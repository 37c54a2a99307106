//! Amount helpers shared by the ledger and the presentation layers.
//!
//! Amounts are plain `f64` values in major units. Derived amounts are rounded
//! when stored: USD equivalents of expenses to 2 decimals ([`USD_DECIMALS`]),
//! USDT equivalents of incomes and exchanges to 4 ([`USDT_DECIMALS`]).
//!
//! # Examples
//!
//! ```rust
//! use engine::money::{format_amount, parse_amount, round_to};
//!
//! assert_eq!(round_to(22000.0 / 36.5, 2), 602.74);
//! assert_eq!(parse_amount("10,5"), Some(10.5));
//! assert_eq!(format_amount(27000.0, 2), "27,000.00");
//! ```

use crate::{EngineError, ResultEngine};

pub const USD_DECIMALS: u32 = 2;
pub const USDT_DECIMALS: u32 = 4;

/// Rounds half away from zero to `decimals` fractional digits.
#[must_use]
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Parses user input accepting `.` or `,` as decimal separator.
#[must_use]
pub fn parse_amount(input: &str) -> Option<f64> {
    let normalized = input.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rejects zero, negative and non-finite amounts.
pub(crate) fn ensure_positive(amount: f64) -> ResultEngine<f64> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )))
    }
}

/// A rate is usable only when present, finite and strictly positive.
pub(crate) fn usable_rate(rate: Option<f64>) -> Option<f64> {
    rate.filter(|r| r.is_finite() && *r > 0.0)
}

/// `spent / budget * 100`, defined as 0 for a zero budget.
#[must_use]
pub fn usage_percent(spent: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        spent * 100.0 / budget
    } else {
        0.0
    }
}

/// Relative change from `previous` to `current` in percent, 0 when `previous`
/// is not positive.
#[must_use]
pub fn delta_percent(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) * 100.0 / previous
    } else {
        0.0
    }
}

/// Formats with thousands separators, e.g. `1234567.891` → `1,234,567.89`.
#[must_use]
pub fn format_amount(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(raw.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && raw.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{grouped}.{frac}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Same as [`format_amount`] but always carries a sign (`+1,000.00`).
#[must_use]
pub fn format_signed(value: f64, decimals: usize) -> String {
    let formatted = format_amount(value, decimals);
    if formatted.starts_with('-') {
        formatted
    } else {
        format!("+{formatted}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_usd_and_usdt_equivalents() {
        assert_eq!(round_to(22000.0 / 36.5, USD_DECIMALS), 602.74);
        assert_eq!(round_to(10000.0 / 42.0, USDT_DECIMALS), 238.0952);
        assert_eq!(round_to(120000.0 / 40.0, USDT_DECIMALS), 3000.0);
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!(parse_amount("22000"), Some(22000.0));
        assert_eq!(parse_amount("36,50"), Some(36.5));
        assert_eq!(parse_amount(" 1.25 "), Some(1.25));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn usage_percent_guards_zero_budget() {
        assert_eq!(usage_percent(450.0, 500.0), 90.0);
        assert_eq!(usage_percent(450.0, 0.0), 0.0);
    }

    #[test]
    fn delta_percent_guards_zero_previous() {
        assert_eq!(delta_percent(150.0, 100.0), 50.0);
        assert_eq!(delta_percent(150.0, 0.0), 0.0);
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(format_amount(0.0, 2), "0.00");
        assert_eq!(format_amount(999.5, 2), "999.50");
        assert_eq!(format_amount(1000.0, 2), "1,000.00");
        assert_eq!(format_amount(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_amount(-27000.0, 2), "-27,000.00");
        assert_eq!(format_amount(238.0952, 4), "238.0952");
        assert_eq!(format_amount(-0.001, 2), "0.00");
    }

    #[test]
    fn signed_format_always_has_sign() {
        assert_eq!(format_signed(1500.0, 2), "+1,500.00");
        assert_eq!(format_signed(-20.0, 1), "-20.0");
    }
}
