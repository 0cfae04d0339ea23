//! Inclusive calendar-day window over commit timestamps.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive `[from, to]` date range; commit timestamps are compared by UTC date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Window {
    /// Create a window, rejecting `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(Error::config(format!(
                "from_date {from} is after to_date {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// Parse both boundaries from `YYYY-MM-DD` strings.
    pub fn parse(from: &str, to: &str) -> Result<Self> {
        let from = parse_date("from_date", from)?;
        let to = parse_date("to_date", to)?;
        Self::new(from, to)
    }

    /// Whether a unix timestamp falls on a day inside the window.
    pub fn contains(&self, timestamp: i64) -> bool {
        match DateTime::<Utc>::from_timestamp(timestamp, 0) {
            Some(dt) => {
                let day = dt.date_naive();
                day >= self.from && day <= self.to
            }
            None => false,
        }
    }

    /// Lower bound formatted for `git log --since`.
    pub fn since_arg(&self) -> String {
        format!("{} 00:00:00 +0000", self.from.format(DATE_FORMAT))
    }

    /// Upper bound formatted for `git log --until`.
    pub fn until_arg(&self) -> String {
        format!("{} 23:59:59 +0000", self.to.format(DATE_FORMAT))
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{}",
            self.from.format(DATE_FORMAT),
            self.to.format(DATE_FORMAT)
        )
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| Error::invalid_date(field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32, h: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap().timestamp()
    }

    #[test]
    fn test_parse_window() {
        let window = Window::parse("2024-01-01", "2024-03-31").unwrap();
        assert_eq!(window.from, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(window.to, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(window.to_string(), "2024-01-01..2024-03-31");
    }

    #[test]
    fn test_parse_rejects_malformed_dates() {
        let err = Window::parse("2024/01/01", "2024-03-31").unwrap_err();
        assert!(matches!(err, Error::InvalidDate { field: "from_date", .. }));

        let err = Window::parse("2024-01-01", "yesterday").unwrap_err();
        assert!(matches!(err, Error::InvalidDate { field: "to_date", .. }));
    }

    #[test]
    fn test_parse_rejects_inverted_window() {
        let err = Window::parse("2024-02-01", "2024-01-01").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_contains_is_inclusive_on_both_days() {
        let window = Window::parse("2024-01-10", "2024-01-20").unwrap();
        assert!(window.contains(ts(2024, 1, 10, 0)));
        assert!(window.contains(ts(2024, 1, 20, 23)));
        assert!(!window.contains(ts(2024, 1, 9, 23)));
        assert!(!window.contains(ts(2024, 1, 21, 0)));
    }

    #[test]
    fn test_git_bounds() {
        let window = Window::parse("2024-01-10", "2024-01-20").unwrap();
        assert_eq!(window.since_arg(), "2024-01-10 00:00:00 +0000");
        assert_eq!(window.until_arg(), "2024-01-20 23:59:59 +0000");
    }
}
