//! Calendar-date handling for the frame timeline.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};

/// An inclusive range of calendar days, one frame per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> ViewerResult<Self> {
        if end < start {
            return Err(ViewerError::InvalidRange(format!(
                "end date {} precedes start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse from two `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> ViewerResult<Self> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        Self::new(start, end)
    }

    /// Number of days in the range, inclusive of both endpoints.
    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    /// Iterate every day from start to end inclusive, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let end = self.end;
        std::iter::successors(Some(start), move |d| {
            d.checked_add_days(Days::new(1)).filter(|next| *next <= end)
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> ViewerResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ViewerError::InvalidRange(format!("invalid date: {}", s)))
}

/// Format a frame date for display, e.g. "15 Oct 2024".
pub fn display_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// A labelled window of dates whose frames get an annotation suffix
/// (e.g. a festival week with elevated particulate levels).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl HighlightWindow {
    /// Display label for a frame date, annotated when inside the window.
    pub fn annotate(&self, date: NaiveDate) -> String {
        let formatted = display_date(date);
        if date >= self.start && date <= self.end {
            format!("{} - {}", formatted, self.label)
        } else {
            formatted
        }
    }
}
