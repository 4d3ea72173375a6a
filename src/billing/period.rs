use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::error::{AppError, AppResult};

/// An inclusive date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BillingPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl BillingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> AppResult<Self> {
        if end < start {
            return Err(AppError::invalid(format!(
                "end date {end} is before start date {start}"
            )));
        }
        Ok(BillingPeriod { start, end })
    }

    /// The whole calendar month. Only checks that the month exists; year
    /// bounds are a billing policy concern.
    pub fn month(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::invalid("Month must be between 1 and 12."));
        }
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::invalid(format!("{year}-{month:02} is not a valid month")))?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let end = next_month
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| AppError::invalid(format!("{year}-{month:02} is not a valid month")))?;

        Ok(BillingPeriod { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn total_days(&self) -> u32 {
        // start <= end, so the difference is non-negative
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start <= end && start <= self.end
    }

    /// `(year, month)` of the first day, used for month-level policy checks.
    pub fn first_month(&self) -> (i32, u32) {
        (self.start.year(), self.start.month())
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let end = self.end;
        (0..u64::from(self.total_days()))
            .filter_map(move |offset| self.start.checked_add_days(Days::new(offset)))
            .take_while(move |day| *day <= end)
    }
}
