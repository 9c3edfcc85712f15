//! Billing period (month, year) and its calendar date range

use chrono::{Datelike, Months, NaiveDate};
use shared::error::{AppError, AppResult, ErrorCode};

/// A (month, year) billing cycle covering `[first_day, last_day]` inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BillingPeriod {
    first_day: NaiveDate,
    last_day: NaiveDate,
}

impl BillingPeriod {
    pub fn new(month: i32, year: i32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(
                AppError::with_message(
                    ErrorCode::InvalidPeriod,
                    format!("month must be between 1 and 12, got {month}"),
                )
                .with_detail("field", "month"),
            );
        }
        if !(1..=9999).contains(&year) {
            return Err(
                AppError::with_message(
                    ErrorCode::InvalidPeriod,
                    format!("year must be a positive four-digit year, got {year}"),
                )
                .with_detail("field", "year"),
            );
        }

        let invalid = || AppError::new(ErrorCode::InvalidPeriod);
        let first_day = NaiveDate::from_ymd_opt(year, month as u32, 1).ok_or_else(invalid)?;
        // Last day = day 0 of the following month
        let last_day = first_day
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .ok_or_else(invalid)?;

        Ok(Self {
            first_day,
            last_day,
        })
    }

    /// Build from optional request fields, naming whichever is missing
    pub fn from_parts(month: Option<i32>, year: Option<i32>) -> AppResult<Self> {
        let month = month.ok_or_else(|| AppError::required("month"))?;
        let year = year.ok_or_else(|| AppError::required("year"))?;
        Self::new(month, year)
    }

    pub fn month(&self) -> i32 {
        self.first_day.month() as i32
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last_day
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first_day <= date && date <= self.last_day
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_covers_whole_month() {
        let period = BillingPeriod::new(3, 2025).unwrap();
        assert_eq!(period.first_day(), date(2025, 3, 1));
        assert_eq!(period.last_day(), date(2025, 3, 31));
        assert_eq!(period.month(), 3);
        assert_eq!(period.year(), 2025);
    }

    #[test]
    fn february_respects_leap_years() {
        assert_eq!(BillingPeriod::new(2, 2024).unwrap().last_day(), date(2024, 2, 29));
        assert_eq!(BillingPeriod::new(2, 2025).unwrap().last_day(), date(2025, 2, 28));
    }

    #[test]
    fn december_rolls_into_next_year() {
        let period = BillingPeriod::new(12, 2025).unwrap();
        assert_eq!(period.last_day(), date(2025, 12, 31));
    }

    #[test]
    fn contains_is_inclusive() {
        let period = BillingPeriod::new(4, 2025).unwrap();
        assert!(period.contains(date(2025, 4, 1)));
        assert!(period.contains(date(2025, 4, 30)));
        assert!(!period.contains(date(2025, 5, 1)));
        assert!(!period.contains(date(2025, 3, 31)));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            BillingPeriod::new(13, 2025).unwrap_err().code,
            ErrorCode::InvalidPeriod
        );
        assert_eq!(
            BillingPeriod::new(0, 2025).unwrap_err().code,
            ErrorCode::InvalidPeriod
        );
        assert_eq!(
            BillingPeriod::new(5, 0).unwrap_err().code,
            ErrorCode::InvalidPeriod
        );
    }

    #[test]
    fn missing_parts_are_required_fields() {
        let err = BillingPeriod::from_parts(None, Some(2025)).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.message, "month is required");

        let err = BillingPeriod::from_parts(Some(1), None).unwrap_err();
        assert_eq!(err.message, "year is required");
    }

    #[test]
    fn display_is_year_month() {
        assert_eq!(BillingPeriod::new(3, 2025).unwrap().to_string(), "2025-03");
    }
}
