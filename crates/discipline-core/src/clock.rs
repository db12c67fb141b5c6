//! Wall-clock source.
//!
//! The engine never reads the system time directly; everything goes through
//! a [`Clock`] so sweeps can be driven at arbitrary instants in tests and
//! from the CLI `--at` override.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::time_of_day::TimeOfDay;

pub trait Clock {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Current minutes since local midnight.
    fn minute_of_day(&self) -> u16 {
        minute_of_day(self.now())
    }

    /// Partition key of the current day's log.
    fn day_key(&self) -> String {
        day_key(self.now().date())
    }
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock frozen at a given instant. Can be moved with [`FixedClock::set`].
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: NaiveDateTime,
}

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self { at }
    }

    /// Clock on `date` at the given time of day.
    pub fn on(date: NaiveDate, time: TimeOfDay) -> Self {
        Self::new(date.and_time(time_of(time)))
    }

    pub fn set(&mut self, time: TimeOfDay) {
        self.at = self.at.date().and_time(time_of(time));
    }

    pub fn set_minute(&mut self, minute: u16) {
        if let Some(t) = TimeOfDay::from_minutes(minute) {
            self.set(t);
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.at
    }
}

pub fn minute_of_day(at: NaiveDateTime) -> u16 {
    (at.hour() * 60 + at.minute()) as u16
}

/// ISO calendar date, `YYYY-MM-DD`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn time_of(t: TimeOfDay) -> NaiveTime {
    NaiveTime::from_hms_opt(u32::from(t.hour()), u32::from(t.minute()), 0)
        .unwrap_or(NaiveTime::MIN)
}
