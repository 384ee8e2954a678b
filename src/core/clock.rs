//! Wall Clock
//!
//! The engine reads the calendar in exactly two places: the daily seed
//! and leaderboard timestamps. Everything else runs on scheduler time.

use chrono::{DateTime, Datelike, Local, NaiveDate, Utc};

/// Source of the current time and calendar date.
pub trait Clock {
    /// Current instant.
    fn now(&self) -> DateTime<Utc>;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate;

    /// Daily challenge key for today.
    fn today_key(&self) -> String {
        date_key(self.today())
    }
}

/// Format a date as `{year}-{month}-{day}`, no zero padding.
///
/// This string seeds the daily challenge; changing the format changes
/// every daily sequence.
pub fn date_key(date: NaiveDate) -> String {
    format!("{}-{}-{}", date.year(), date.month(), date.day())
}

/// Clock backed by the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock frozen at a given instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    now: DateTime<Utc>,
}

impl FixedClock {
    /// Freeze at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    /// Freeze at midday UTC on the given date.
    pub fn on_date(year: i32, month: u32, day: u32) -> Option<Self> {
        let now = NaiveDate::from_ymd_opt(year, month, day)?
            .and_hms_opt(12, 0, 0)?
            .and_utc();
        Some(Self { now })
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}
