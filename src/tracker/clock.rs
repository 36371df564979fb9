//! Calendar source for day-boundary decisions.
//!
//! Streak rules only ever compare calendar dates, so the stores ask a
//! [`Clock`] for "today" instead of reading the wall clock directly.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

pub trait Clock: Send + Sync {
    /// Current local calendar date.
    fn today(&self) -> NaiveDate;

    /// Current instant, used for badge and audit timestamps.
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn yesterday(&self) -> NaiveDate {
        self.today() - Duration::days(1)
    }
}

/// Local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a settable date.
#[derive(Debug)]
pub struct FixedClock {
    today: Mutex<NaiveDate>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Mutex::new(today),
        }
    }

    pub fn set_today(&self, day: NaiveDate) {
        if let Ok(mut guard) = self.today.lock() {
            *guard = day;
        }
    }

    pub fn advance_days(&self, days: i64) {
        if let Ok(mut guard) = self.today.lock() {
            *guard += Duration::days(days);
        }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        match self.today.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}
