//! Analysis windows.
//!
//! A window of `N` days is the rolling range `[now - N days, now]`. The
//! comparison window is the `N` days immediately before it, half-open
//! (`[now - 2N days, now - N days)`) so the two never share an instant and
//! always have the same length.
//!
//! Calendar days are only used for the daily trend: it runs from the local
//! date of `start` through the local date of `now`, which is `N + 1` dates.

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

/// Longest window accepted, in days.
pub const MAX_WINDOW_DAYS: u32 = 3_650;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Window length in days
    pub days: u32,
    /// `end - days`, inclusive
    pub start: DateTime<Utc>,
    /// The "as of" instant, inclusive
    pub end: DateTime<Utc>,
    /// Start of the comparison window (`start - days`)
    pub previous_start: DateTime<Utc>,
    /// Zone used for every date, hour and weekday bucket
    pub tz: FixedOffset,
}

impl Window {
    /// Build the window of `days` days ending at `now`.
    pub fn ending_at(now: DateTime<Utc>, days: u32, tz: FixedOffset) -> Result<Self> {
        if days == 0 {
            return Err(Error::InvalidParameter(
                "days must be at least 1".to_string(),
            ));
        }
        if days > MAX_WINDOW_DAYS {
            return Err(Error::InvalidParameter(format!(
                "days must be at most {}, got {}",
                MAX_WINDOW_DAYS, days
            )));
        }

        let length = Duration::days(i64::from(days));
        let underflow =
            || Error::InvalidParameter(format!("window of {} days underflows", days));
        let start = now.checked_sub_signed(length).ok_or_else(underflow)?;
        let previous_start = start.checked_sub_signed(length).ok_or_else(underflow)?;

        Ok(Self {
            days,
            start,
            end: now,
            previous_start,
            tz,
        })
    }

    /// Local calendar day of `start`.
    pub fn first_day(&self) -> NaiveDate {
        self.local(self.start).date_naive()
    }

    /// Local calendar day of `end`, i.e. today.
    pub fn last_day(&self) -> NaiveDate {
        self.local(self.end).date_naive()
    }

    /// Every local calendar day the window touches, oldest first.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |d| *d <= last)
    }

    /// Whether `ts` falls inside `[start, end]`.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// Whether `ts` falls inside the comparison window `[previous_start, start)`.
    pub fn in_previous(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.previous_start && ts < self.start
    }

    /// Convert an instant to the window's zone.
    pub fn local(&self, ts: DateTime<Utc>) -> DateTime<FixedOffset> {
        ts.with_timezone(&self.tz)
    }
}
