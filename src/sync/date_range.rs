use crate::error::AdpulseError;
use chrono::{Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "startDate")]
    pub start: NaiveDate,
    #[serde(rename = "endDate")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AdpulseError> {
        if start > end {
            return Err(AdpulseError::InvalidRequest(format!(
                "startDate {start} is after endDate {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The `days` days ending at (and including) `today`.
    pub fn trailing_days(days: u32, today: NaiveDate) -> Self {
        let span = u64::from(days.max(1) - 1);
        let start = today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    /// Trailing window ending today (UTC).
    pub fn lookback(days: u32) -> Self {
        Self::trailing_days(days, Utc::now().date_naive())
    }

    /// From the same day `years` years ago through `today`.
    pub fn years_back(years: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_months(Months::new(years.saturating_mul(12)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Split into consecutive windows of at most `chunk_days` days, oldest first.
    pub fn chunks(&self, chunk_days: u32) -> Vec<DateRange> {
        let step = u64::from(chunk_days.max(1));
        let mut out = Vec::new();
        let mut cursor = self.start;
        while cursor <= self.end {
            let window_end = cursor
                .checked_add_days(Days::new(step - 1))
                .map_or(self.end, |d| d.min(self.end));
            out.push(DateRange {
                start: cursor,
                end: window_end,
            });
            match window_end.checked_add_days(Days::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        out
    }
}
