//! Calendar date boundaries for reporting windows.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// Computes dates relative to a fixed "today".
///
/// The anchor is read once from the local clock, so every boundary of a
/// run agrees on what today is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRangeCalculator {
    today: NaiveDate,
}

impl DateRangeCalculator {
    /// Anchor on the process's local date.
    pub fn from_local_clock() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }

    /// Anchor on an explicit date.
    pub fn anchored(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// The calendar date `n` days before today.
    pub fn days_ago(&self, n: u32) -> NaiveDate {
        self.today
            .checked_sub_days(Days::new(u64::from(n)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Current and previous windows of `window_days` each.
    ///
    /// Current is `[days_ago(w), today]`, previous is
    /// `[days_ago(2w), days_ago(w)]`; the boundary day belongs to both.
    pub fn trailing_windows(&self, window_days: u32) -> ReportingWindows {
        let one = self.days_ago(window_days);
        let two = self.days_ago(window_days.saturating_mul(2));
        ReportingWindows {
            current: DateRange {
                start: one,
                end: self.today,
            },
            previous: DateRange {
                start: two,
                end: one,
            },
        }
    }
}

/// Inclusive calendar range, `start <= end`.
///
/// Deserialization goes through [`DateRange::new`], so inverted bounds are
/// rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = PipelineError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PipelineResult<Self> {
        if start > end {
            return Err(PipelineError::config(format!(
                "date range start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// The two periods compared month over month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportingWindows {
    pub current: DateRange,
    pub previous: DateRange,
}
