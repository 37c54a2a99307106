use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Calendar year-month (`YYYY-MM`) used to scope every per-period record.
///
/// The string form sorts chronologically, so ordered maps keyed by
/// `MonthKey` iterate from the oldest month to the newest.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonthKey(String);

impl MonthKey {
    /// Month containing the given wall-clock instant.
    #[must_use]
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self::from_date(at.date())
    }

    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m").to_string())
    }

    /// Parses a `YYYY-MM` string, rejecting anything that is not a real month.
    pub fn parse(value: &str) -> Option<Self> {
        let (year, month) = value.trim().split_once('-')?;
        if year.len() != 4 || month.len() != 2 {
            return None;
        }
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, 1).map(Self::from_date)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First day of the month, `None` if the key was loaded malformed.
    #[must_use]
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&format!("{}-01", self.0), "%Y-%m-%d").ok()
    }

    /// The month right before this one.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        let first = self.first_day()?;
        first.pred_opt().map(Self::from_date)
    }

    /// Number of calendar days in the month.
    #[must_use]
    pub fn days_in_month(&self) -> Option<u32> {
        let first = self.first_day()?;
        let next = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
        };
        u32::try_from(next.signed_duration_since(first).num_days()).ok()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn key_from_date_is_zero_padded() {
        assert_eq!(MonthKey::from_date(date(2025, 3, 9)).as_str(), "2025-03");
    }

    #[test]
    fn previous_crosses_year_boundary() {
        let key = MonthKey::parse("2025-01").unwrap();
        assert_eq!(key.previous().unwrap().as_str(), "2024-12");
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(MonthKey::parse("2024-02").unwrap().days_in_month(), Some(29));
        assert_eq!(MonthKey::parse("2025-02").unwrap().days_in_month(), Some(28));
        assert_eq!(MonthKey::parse("2025-12").unwrap().days_in_month(), Some(31));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(MonthKey::parse("2025-13").is_none());
        assert!(MonthKey::parse("25-01").is_none());
        assert!(MonthKey::parse("enero").is_none());
    }

    #[test]
    fn keys_sort_chronologically() {
        let mut keys = vec![
            MonthKey::parse("2025-10").unwrap(),
            MonthKey::parse("2024-12").unwrap(),
            MonthKey::parse("2025-02").unwrap(),
        ];
        keys.sort();
        let keys: Vec<&str> = keys.iter().map(MonthKey::as_str).collect();
        assert_eq!(keys, ["2024-12", "2025-02", "2025-10"]);
    }
}
